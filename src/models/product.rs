use serde::{Deserialize, Serialize};

/// Catalog entry. Rows are managed out-of-band (admin tooling writes the
/// products table directly); this service only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Display price in cents (the processor holds the billable price)
    pub price_cents: Option<i64>,
    /// Currency code (e.g., "USD")
    pub currency: Option<String>,
    /// Creem product reference used when creating checkout sessions
    pub creem_product_id: String,
    pub active: bool,
}
