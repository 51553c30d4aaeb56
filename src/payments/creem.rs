//! Creem checkout-session client.
//!
//! One outbound call: create a checkout session for a product, carrying the
//! locally generated request id both as a top-level field and inside
//! metadata so the completion webhook can be correlated back to the pending
//! order. No retries; a single failure is terminal for that request id.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{msg, AppError, Result};

/// Checkout creation gets a longer deadline than the row-level store calls;
/// the processor does real work before answering.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Correlation metadata echoed back by the completion webhook.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutMetadata {
    pub user_id: String,
    pub product_id: String,
    pub request_id: String,
}

/// The slice of Creem's checkout response this service consumes. A missing
/// `checkout_url` means the session is unusable; the orchestrator treats it
/// as an upstream failure.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub checkout_url: Option<String>,
}

#[async_trait]
pub trait CheckoutClient: Send + Sync {
    async fn create_checkout(
        &self,
        creem_product_id: &str,
        request_id: &str,
        success_url: &str,
        customer_email: &str,
        metadata: &CheckoutMetadata,
    ) -> Result<CheckoutSession>;
}

#[derive(Debug, Serialize)]
struct CreateCheckoutRequest<'a> {
    product_id: &'a str,
    request_id: &'a str,
    success_url: &'a str,
    customer: Customer<'a>,
    metadata: &'a CheckoutMetadata,
}

#[derive(Debug, Serialize)]
struct Customer<'a> {
    email: &'a str,
}

#[derive(Debug, Clone)]
pub struct CreemClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl CreemClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("reqwest client"),
            api_key: config.creem_api_key.clone(),
            base_url: config.creem_api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CheckoutClient for CreemClient {
    async fn create_checkout(
        &self,
        creem_product_id: &str,
        request_id: &str,
        success_url: &str,
        customer_email: &str,
        metadata: &CheckoutMetadata,
    ) -> Result<CheckoutSession> {
        // An unconfigured key can never succeed; fail before the round trip.
        if self.api_key.is_empty() {
            return Err(AppError::Upstream("Creem unavailable".to_string()));
        }

        let payload = CreateCheckoutRequest {
            product_id: creem_product_id,
            request_id,
            success_url,
            customer: Customer {
                email: customer_email,
            },
            metadata,
        };

        let url = format!("{}/v1/checkouts", self.base_url);
        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Creem checkout request failed: {}", e);
                AppError::Upstream(msg::CHECKOUT_FAILED.to_string())
            })?;

        if response.status().as_u16() >= 400 {
            tracing::warn!(
                "Creem checkout returned status {} for request {}",
                response.status(),
                request_id
            );
            return Err(AppError::Upstream(msg::CHECKOUT_FAILED.to_string()));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Malformed Creem response: {}", e)))
    }
}
