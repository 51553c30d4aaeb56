use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::payments::CheckoutClient;
use crate::store::OrderStore;

/// Application state: injected collaborators plus the configuration the
/// handlers need at request time. Everything behind the trait objects is a
/// remote service; tests swap in in-process doubles.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OrderStore>,
    pub checkout: Arc<dyn CheckoutClient>,
    pub identity: Arc<dyn IdentityProvider>,
    /// Shared secret for verifying `creem-signature` headers
    pub webhook_secret: String,
    /// Origin the post-payment success redirect points back to
    pub frontend_base_url: String,
}
