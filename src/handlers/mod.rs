//! HTTP entry points.
//!
//! `checkout` and `webhooks` are the two real entry points; `me` and
//! `health` are thin. Handlers hold no state across calls - every request
//! is a fresh read/compute/write against the order store.

pub mod checkout;
pub mod health;
pub mod me;
pub mod webhooks;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/me", get(me::me))
        .route("/checkout", post(checkout::create_checkout))
        .route("/webhooks/creem", post(webhooks::creem_webhook))
}
