use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Failed => "failed",
        }
    }
}

/// An order tracks one checkout attempt from creation through webhook
/// reconciliation. `request_id` is the idempotency key: generated at
/// checkout time, passed to Creem as metadata, and matched back when the
/// completion webhook arrives.
///
/// Status only moves `pending -> paid` or `pending -> failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub request_id: String,
    pub status: OrderStatus,
    /// Creem checkout session id, set once session creation succeeds
    pub creem_checkout_id: Option<String>,
    /// Creem order id, set when the completion webhook is applied
    pub creem_order_id: Option<String>,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}
