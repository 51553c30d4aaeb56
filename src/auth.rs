//! Identity gate: resolves bearer tokens against Supabase Auth.
//!
//! Stateless per-request check. No caching, no token refresh; any transport
//! failure, non-200 response, or response without a user id collapses to
//! `Unauthorized`.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::AuthUser;
use crate::util::extract_bearer_token;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer token to a user identity, or `Unauthorized`.
    async fn resolve(&self, token: &str) -> Result<AuthUser>;
}

/// Resolve the caller from the `Authorization` header. Handlers behind
/// bearer auth call this first; a missing or malformed header short-circuits
/// without an upstream round trip.
pub async fn require_user(
    identity: &dyn IdentityProvider,
    headers: &HeaderMap,
) -> Result<AuthUser> {
    let token = extract_bearer_token(headers).ok_or(AppError::Unauthorized)?;
    identity.resolve(token).await
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SupabaseIdentity {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseIdentity {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("reqwest client"),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn resolve(&self, token: &str) -> Result<AuthUser> {
        let url = format!("{}/auth/v1/user", self.base_url);

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("Identity provider unreachable: {}", e);
                AppError::Unauthorized
            })?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(AppError::Unauthorized);
        }

        let payload: UserInfoResponse = response.json().await.map_err(|e| {
            tracing::debug!("Identity provider returned malformed body: {}", e);
            AppError::Unauthorized
        })?;

        let id = match payload.id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(AppError::Unauthorized),
        };

        Ok(AuthUser {
            id,
            email: payload.email.unwrap_or_default(),
        })
    }
}
