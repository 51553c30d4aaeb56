use serde::{Deserialize, Serialize};

/// Identity resolved from a bearer token by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
}
