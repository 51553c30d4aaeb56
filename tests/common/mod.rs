//! Test utilities and fixtures for Tollbooth integration tests

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;

pub use tollbooth::crypto::{hmac_sha256_hex, sha256_hex};
pub use tollbooth::error::{AppError, Result};
pub use tollbooth::models::*;
pub use tollbooth::payments::{CheckoutClient, CheckoutMetadata, CheckoutSession};
pub use tollbooth::state::AppState;
pub use tollbooth::store::{MemoryStore, OrderStore};

use tollbooth::auth::IdentityProvider;
use tollbooth::handlers;

pub const TEST_WEBHOOK_SECRET: &str = "test_webhook_secret";
pub const GOOD_TOKEN: &str = "good-token";
pub const TEST_USER_ID: &str = "user_test";
pub const TEST_USER_EMAIL: &str = "user@example.com";
pub const TEST_PRODUCT_ID: &str = "prod_starter";

/// Identity double: one known-good token, everything else rejected.
pub struct FakeIdentity;

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn resolve(&self, token: &str) -> Result<AuthUser> {
        if token == GOOD_TOKEN {
            Ok(AuthUser {
                id: TEST_USER_ID.to_string(),
                email: TEST_USER_EMAIL.to_string(),
            })
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

/// How the fake payment processor behaves for a test.
#[derive(Clone, Copy)]
pub enum CheckoutMode {
    /// Session `chk_test` with `https://checkout.test/{request_id}`
    Success,
    /// Transport-level failure
    Unavailable,
    /// 200 response whose body has no usable checkout URL
    MissingUrl,
}

pub struct FakeCheckoutClient {
    pub mode: CheckoutMode,
}

#[async_trait]
impl CheckoutClient for FakeCheckoutClient {
    async fn create_checkout(
        &self,
        _creem_product_id: &str,
        request_id: &str,
        _success_url: &str,
        _customer_email: &str,
        _metadata: &CheckoutMetadata,
    ) -> Result<CheckoutSession> {
        match self.mode {
            CheckoutMode::Success => Ok(CheckoutSession {
                id: Some("chk_test".to_string()),
                checkout_url: Some(format!("https://checkout.test/{}", request_id)),
            }),
            CheckoutMode::Unavailable => {
                Err(AppError::Upstream("Failed to create checkout".to_string()))
            }
            CheckoutMode::MissingUrl => Ok(CheckoutSession {
                id: Some("chk_test".to_string()),
                checkout_url: None,
            }),
        }
    }
}

pub fn test_product() -> Product {
    Product {
        id: TEST_PRODUCT_ID.to_string(),
        name: "Starter Pack".to_string(),
        price_cents: Some(1500),
        currency: Some("USD".to_string()),
        creem_product_id: "creem_prod_test".to_string(),
        active: true,
    }
}

/// In-memory store seeded with the standard active test product.
pub fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.insert_product(test_product());
    Arc::new(store)
}

pub fn test_state(store: Arc<MemoryStore>, mode: CheckoutMode) -> AppState {
    AppState {
        store,
        checkout: Arc::new(FakeCheckoutClient { mode }),
        identity: Arc::new(FakeIdentity),
        webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
        frontend_base_url: "http://localhost:5173".to_string(),
    }
}

pub fn test_app(state: AppState) -> Router {
    handlers::router().with_state(state)
}

/// Signature Creem would send for this raw body under the test secret.
pub fn sign(raw: &[u8]) -> String {
    hmac_sha256_hex(TEST_WEBHOOK_SECRET, raw)
}

/// Read a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should be readable");
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}
