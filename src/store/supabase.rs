//! Durable store backed by Supabase's PostgREST interface.
//!
//! Every operation is one HTTP round trip: filtered reads
//! (`?col=eq.{value}&limit=1`), filtered writes (`PATCH ?request_id=eq.{v}`),
//! and conditional inserts (`on_conflict` + `Prefer: ignore-duplicates`).
//! Uniqueness constraints on `orders.request_id`, `entitlements(user_id,
//! product_id)`, and `webhook_events.event_key` provide the atomicity the
//! reconciliation protocol needs; no transactions span calls.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::{json, Value};

use super::{OrderStore, StoreError, StoreResult};
use crate::config::Config;
use crate::models::{Order, Product};

/// PostgREST requests that outlive this are treated as store failures.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How much of an error body to keep in diagnostics.
const DETAIL_LIMIT: usize = 300;

#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    service_role_key: String,
}

impl SupabaseStore {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("reqwest client"),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_role_key: config.supabase_service_role_key.clone(),
        }
    }

    fn now_iso() -> String {
        Utc::now().to_rfc3339()
    }

    async fn request(
        &self,
        action: &'static str,
        method: Method,
        table: &str,
        params: &[(&str, String)],
        payload: Option<&Value>,
        prefer: Option<&str>,
    ) -> StoreResult<Response> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);

        let mut req = self
            .client
            .request(method, url)
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .query(params);
        if let Some(prefer) = prefer {
            req = req.header("Prefer", prefer);
        }
        if let Some(payload) = payload {
            req = req.json(payload);
        }

        req.send()
            .await
            .map_err(|source| StoreError::Transport { action, source })
    }

    async fn ensure_success(action: &'static str, response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            let detail: String = body.chars().take(DETAIL_LIMIT).collect();
            return Err(StoreError::Status {
                action,
                status: status.as_u16(),
                detail,
            });
        }
        Ok(response)
    }

    /// Filtered read returning the first matching row, if any.
    async fn select_one<T: serde::de::DeserializeOwned>(
        &self,
        action: &'static str,
        table: &str,
        params: &[(&str, String)],
    ) -> StoreResult<Option<T>> {
        let response = self
            .request(action, Method::GET, table, params, None, None)
            .await?;
        let response = Self::ensure_success(action, response).await?;

        let mut rows: Vec<T> = response
            .json()
            .await
            .map_err(|source| StoreError::Transport { action, source })?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }

    /// Insert that treats a uniqueness conflict as success. PostgREST
    /// answers `ignore-duplicates` upserts with 2xx, but a 409 can still
    /// surface without the `on_conflict` target; both mean "row exists".
    async fn insert_ignore_duplicates(
        &self,
        action: &'static str,
        table: &str,
        on_conflict: &str,
        payload: Value,
    ) -> StoreResult<()> {
        let response = self
            .request(
                action,
                Method::POST,
                table,
                &[("on_conflict", on_conflict.to_string())],
                Some(&payload),
                Some("resolution=ignore-duplicates,return=minimal"),
            )
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Ok(());
        }
        Self::ensure_success(action, response).await?;
        Ok(())
    }

    /// PATCH rows matching `request_id`. Zero matched rows is a success;
    /// the filter simply selected nothing.
    async fn patch_order(
        &self,
        action: &'static str,
        request_id: &str,
        payload: Value,
    ) -> StoreResult<()> {
        let response = self
            .request(
                action,
                Method::PATCH,
                "orders",
                &[("request_id", format!("eq.{}", request_id))],
                Some(&payload),
                None,
            )
            .await?;
        Self::ensure_success(action, response).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for SupabaseStore {
    async fn get_product(&self, product_id: &str) -> StoreResult<Option<Product>> {
        self.select_one(
            "select products",
            "products",
            &[
                ("select", "*".to_string()),
                ("id", format!("eq.{}", product_id)),
                ("active", "eq.true".to_string()),
                ("limit", "1".to_string()),
            ],
        )
        .await
    }

    async fn create_order_pending(
        &self,
        user_id: &str,
        product_id: &str,
        request_id: &str,
    ) -> StoreResult<Order> {
        let action = "insert orders";
        let payload = json!({
            "user_id": user_id,
            "product_id": product_id,
            "status": "pending",
            "request_id": request_id,
        });

        let response = self
            .request(
                action,
                Method::POST,
                "orders",
                &[],
                Some(&payload),
                Some("return=representation"),
            )
            .await?;
        let response = Self::ensure_success(action, response).await?;

        let mut rows: Vec<Order> = response
            .json()
            .await
            .map_err(|source| StoreError::Transport { action, source })?;
        if rows.is_empty() {
            return Err(StoreError::Status {
                action,
                status: 200,
                detail: "insert returned no representation".to_string(),
            });
        }
        Ok(rows.remove(0))
    }

    async fn update_order_failed(&self, request_id: &str) -> StoreResult<()> {
        self.patch_order(
            "update orders failed",
            request_id,
            json!({
                "status": "failed",
                "updated_at": Self::now_iso(),
            }),
        )
        .await
    }

    async fn update_order_checkout_ids(
        &self,
        request_id: &str,
        creem_checkout_id: Option<&str>,
    ) -> StoreResult<()> {
        self.patch_order(
            "update orders checkout id",
            request_id,
            json!({
                "creem_checkout_id": creem_checkout_id,
                "updated_at": Self::now_iso(),
            }),
        )
        .await
    }

    async fn get_order_by_request_id(&self, request_id: &str) -> StoreResult<Option<Order>> {
        self.select_one(
            "select orders",
            "orders",
            &[
                ("select", "*".to_string()),
                ("request_id", format!("eq.{}", request_id)),
                ("limit", "1".to_string()),
            ],
        )
        .await
    }

    async fn mark_order_paid(
        &self,
        request_id: &str,
        creem_checkout_id: Option<&str>,
        creem_order_id: Option<&str>,
        amount_cents: Option<i64>,
        currency: Option<&str>,
    ) -> StoreResult<()> {
        self.patch_order(
            "mark order paid",
            request_id,
            json!({
                "status": "paid",
                "creem_checkout_id": creem_checkout_id,
                "creem_order_id": creem_order_id,
                "amount_cents": amount_cents,
                "currency": currency,
                "updated_at": Self::now_iso(),
            }),
        )
        .await
    }

    async fn grant_entitlement(&self, user_id: &str, product_id: &str) -> StoreResult<()> {
        self.insert_ignore_duplicates(
            "upsert entitlements",
            "entitlements",
            "user_id,product_id",
            json!({
                "user_id": user_id,
                "product_id": product_id,
            }),
        )
        .await
    }

    async fn webhook_event_seen(&self, event_key: &str) -> StoreResult<bool> {
        let row: Option<Value> = self
            .select_one(
                "select webhook_events",
                "webhook_events",
                &[
                    ("select", "id".to_string()),
                    ("event_key", format!("eq.{}", event_key)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(row.is_some())
    }

    async fn webhook_event_mark_seen(&self, event_key: &str) -> StoreResult<bool> {
        let action = "insert webhook event";
        // `return=representation` makes the win/lose visible: an ignored
        // duplicate comes back as an empty row set.
        let payload = json!({ "event_key": event_key });
        let response = self
            .request(
                action,
                Method::POST,
                "webhook_events",
                &[("on_conflict", "event_key".to_string())],
                Some(&payload),
                Some("resolution=ignore-duplicates,return=representation"),
            )
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Ok(false);
        }
        let response = Self::ensure_success(action, response).await?;

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|source| StoreError::Transport { action, source })?;
        Ok(!rows.is_empty())
    }
}
