//! Checkout orchestration.
//!
//! The ordering here is the correctness guarantee: the pending order is
//! persisted before the external checkout call, so a crash or upstream
//! failure after that point leaves a record that gets failed explicitly
//! instead of vanishing. One store insert, one external call, one store
//! update - no retries. A caller that wants to retry issues a new checkout,
//! which gets a new request id.

use axum::extract::State;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::require_user;
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::Json;
use crate::payments::CheckoutMetadata;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub product_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
}

pub async fn create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let user = require_user(state.identity.as_ref(), &headers).await?;

    let product = state
        .store
        .get_product(&request.product_id)
        .await?
        .or_not_found(msg::PRODUCT_NOT_FOUND)?;

    // Fresh idempotency key. It correlates the local order with the Creem
    // session: Creem echoes it back in the completion webhook.
    let request_id = Uuid::new_v4().as_simple().to_string();

    state
        .store
        .create_order_pending(&user.id, &request.product_id, &request_id)
        .await?;

    let success_url = format!(
        "{}/success",
        state.frontend_base_url.trim_end_matches('/')
    );
    let metadata = CheckoutMetadata {
        user_id: user.id.clone(),
        product_id: request.product_id.clone(),
        request_id: request_id.clone(),
    };

    let session = match state
        .checkout
        .create_checkout(
            &product.creem_product_id,
            &request_id,
            &success_url,
            &user.email,
            &metadata,
        )
        .await
    {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Checkout creation failed for request {}: {}", request_id, e);
            state.store.update_order_failed(&request_id).await?;
            return Err(AppError::Upstream(msg::CHECKOUT_FAILED.to_string()));
        }
    };

    state
        .store
        .update_order_checkout_ids(&request_id, session.id.as_deref())
        .await?;

    let Some(checkout_url) = session.checkout_url.filter(|u| !u.is_empty()) else {
        state.store.update_order_failed(&request_id).await?;
        return Err(AppError::Upstream(msg::CHECKOUT_FAILED.to_string()));
    };

    Ok(Json(CheckoutResponse { checkout_url }))
}
