//! Order store: the durable state behind both entry points.
//!
//! Checkout and webhook handling are stateless request handlers; everything
//! they agree on goes through this contract. Each operation is one atomic
//! round trip against the backing store. Two implementations exist: the
//! Supabase-backed store used in production and an in-memory store with the
//! same idempotency semantics for deterministic tests.

mod memory;
mod supabase;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Order, Product};

/// Backing-store failure: transport error or unexpected response status.
/// Carries the failing operation name for diagnostics. Not expected in
/// normal operation; surfaces to callers as a 5xx.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store request failed for {action}: {source}")]
    Transport {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("store request failed for {action} (status={status}, detail={detail})")]
    Status {
        action: &'static str,
        status: u16,
        detail: String,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch a product by id. Returns `None` for unknown or inactive ids.
    async fn get_product(&self, product_id: &str) -> StoreResult<Option<Product>>;

    /// Insert a new order with status `pending`. Called before any external
    /// checkout call so a crash mid-checkout leaves a visible record.
    async fn create_order_pending(
        &self,
        user_id: &str,
        product_id: &str,
        request_id: &str,
    ) -> StoreResult<Order>;

    /// Flip an order to `failed`. No-op for unknown request ids.
    async fn update_order_failed(&self, request_id: &str) -> StoreResult<()>;

    /// Record the Creem checkout session id on an order.
    async fn update_order_checkout_ids(
        &self,
        request_id: &str,
        creem_checkout_id: Option<&str>,
    ) -> StoreResult<()>;

    async fn get_order_by_request_id(&self, request_id: &str) -> StoreResult<Option<Order>>;

    /// Flip an order to `paid` and fill in the payment fields. No-op for
    /// unknown request ids. A repeated application re-writes the same
    /// fields; callers rely on the webhook dedup ledger to avoid it.
    async fn mark_order_paid(
        &self,
        request_id: &str,
        creem_checkout_id: Option<&str>,
        creem_order_id: Option<&str>,
        amount_cents: Option<i64>,
        currency: Option<&str>,
    ) -> StoreResult<()>;

    /// Grant `(user_id, product_id)`. Set semantics: a duplicate grant is
    /// swallowed, not an error.
    async fn grant_entitlement(&self, user_id: &str, product_id: &str) -> StoreResult<()>;

    /// Whether a webhook event key has already been processed.
    async fn webhook_event_seen(&self, event_key: &str) -> StoreResult<bool>;

    /// Record an event key as processed. A single conditional insert backed
    /// by a uniqueness guarantee: exactly one of two concurrent callers
    /// performs the insert. Returns `true` for the caller that did; the
    /// loser gets `false` and must skip effect application.
    async fn webhook_event_mark_seen(&self, event_key: &str) -> StoreResult<bool>;
}
