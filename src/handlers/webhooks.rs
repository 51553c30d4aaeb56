//! Creem webhook reconciliation.
//!
//! Protocol, in order: verify the HMAC signature over the raw body, parse,
//! dedup on the event key, then apply the paid-effect for
//! `checkout.completed` events that match a local order. The dedup ledger
//! makes the endpoint safe under at-least-once delivery: a replayed event
//! acknowledges success without reapplying anything.
//!
//! Only authenticity and parsing failures are 4xx. Unknown orders and
//! irrelevant event types acknowledge `{ok:true}` - the sender cannot act
//! on them, and answering an error would only provoke redelivery.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Serialize;
use serde_json::Value;

use crate::crypto::{hmac_sha256_hex, secure_compare, sha256_hex};
use crate::error::{msg, AppError, Result};
use crate::extractors::Json;
use crate::state::AppState;
use crate::store::OrderStore;

#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

pub async fn creem_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Ack>> {
    let provided_signature = headers
        .get("creem-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest(msg::MISSING_SIGNATURE.to_string()))?;

    // HMAC over the raw, unparsed bytes; constant-time compare.
    let expected_signature = hmac_sha256_hex(&state.webhook_secret, &body);
    if !secure_compare(&expected_signature, provided_signature) {
        return Err(AppError::BadRequest(msg::INVALID_SIGNATURE.to_string()));
    }

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest(msg::INVALID_PAYLOAD.to_string()))?;

    let event_key = event_key(&payload, &body);

    if state.store.webhook_event_seen(&event_key).await? {
        tracing::debug!("Webhook event {} already processed, skipping", event_key);
        return Ok(Json(Ack { ok: true }));
    }

    // Marked before effect application, unconditionally: an event of an
    // irrelevant type is still consumed. Losing the insert means a
    // concurrent delivery of the same event got there first.
    if !state.store.webhook_event_mark_seen(&event_key).await? {
        tracing::debug!("Webhook event {} claimed by a concurrent delivery", event_key);
        return Ok(Json(Ack { ok: true }));
    }

    if payload.get("eventType").and_then(Value::as_str) == Some("checkout.completed") {
        apply_checkout_completed(state.store.as_ref(), &payload).await?;
    }

    Ok(Json(Ack { ok: true }))
}

/// Dedup key: the provider's event id when present, else a content hash of
/// the raw body so redeliveries of id-less events still collapse.
fn event_key(payload: &Value, raw: &[u8]) -> String {
    for field in ["id", "eventId"] {
        match payload.get(field) {
            Some(Value::String(s)) if !s.is_empty() => return s.clone(),
            Some(Value::Number(n)) => return n.to_string(),
            _ => {}
        }
    }
    sha256_hex(raw)
}

async fn apply_checkout_completed(store: &dyn OrderStore, payload: &Value) -> Result<()> {
    let obj = payload.get("object").unwrap_or(&Value::Null);
    let order_obj = obj.get("order").unwrap_or(&Value::Null);

    let request_id = obj
        .get("request_id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());
    let paid = order_obj.get("status").and_then(Value::as_str) == Some("paid");

    let request_id = match request_id {
        Some(id) if paid => id,
        // Nothing to reconcile; acknowledged upstream regardless.
        _ => return Ok(()),
    };

    let Some(local_order) = store.get_order_by_request_id(request_id).await? else {
        tracing::warn!("Webhook for unknown request_id {}, ignoring", request_id);
        return Ok(());
    };

    let creem_order_id = non_empty_str(order_obj.get("id"));
    let creem_checkout_id =
        non_empty_str(obj.get("id")).or_else(|| non_empty_str(obj.get("checkout_id")));
    let amount_cents = order_obj
        .get("amount")
        .and_then(to_cents)
        .or_else(|| order_obj.get("amount_cents").and_then(to_cents));
    let currency = non_empty_str(order_obj.get("currency"));

    store
        .mark_order_paid(
            request_id,
            creem_checkout_id.as_deref(),
            creem_order_id.as_deref(),
            amount_cents,
            currency.as_deref(),
        )
        .await?;
    store
        .grant_entitlement(&local_order.user_id, &local_order.product_id)
        .await?;

    tracing::info!(
        "Order {} marked paid, entitlement granted to user {} for product {}",
        request_id,
        local_order.user_id,
        local_order.product_id
    );

    Ok(())
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Coerce a JSON amount to integer cents. Numbers truncate; numeric strings
/// parse; everything else is null rather than an error.
fn to_cents(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
