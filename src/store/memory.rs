//! In-memory store for deterministic tests.
//!
//! Mirrors every externally observable edge of the Supabase store: inactive
//! products read as missing, updates against unknown request ids are
//! no-ops, and the entitlement/webhook-event inserts are idempotent. All
//! state sits behind one mutex, so `webhook_event_mark_seen` is the same
//! single conditional insert the unique constraint gives the durable store.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::{OrderStore, StoreResult};
use crate::models::{Order, OrderStatus, Product};

#[derive(Default)]
struct Inner {
    products: HashMap<String, Product>,
    orders_by_request: HashMap<String, Order>,
    entitlements: HashSet<(String, String)>,
    webhook_events: HashSet<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a catalog row. Products are read-only to the service itself.
    pub fn insert_product(&self, product: Product) {
        let mut inner = self.inner.lock().unwrap();
        inner.products.insert(product.id.clone(), product);
    }

    pub fn order_count(&self) -> usize {
        self.inner.lock().unwrap().orders_by_request.len()
    }

    pub fn entitlement_count(&self) -> usize {
        self.inner.lock().unwrap().entitlements.len()
    }

    pub fn is_entitled(&self, user_id: &str, product_id: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .entitlements
            .contains(&(user_id.to_string(), product_id.to_string()))
    }

    /// The single order in the store, for tests that create exactly one.
    pub fn sole_order(&self) -> Option<Order> {
        let inner = self.inner.lock().unwrap();
        if inner.orders_by_request.len() == 1 {
            inner.orders_by_request.values().next().cloned()
        } else {
            None
        }
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn get_product(&self, product_id: &str) -> StoreResult<Option<Product>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .products
            .get(product_id)
            .filter(|p| p.active)
            .cloned())
    }

    async fn create_order_pending(
        &self,
        user_id: &str,
        product_id: &str,
        request_id: &str,
    ) -> StoreResult<Order> {
        let order = Order {
            id: Uuid::new_v4().as_simple().to_string(),
            user_id: user_id.to_string(),
            product_id: product_id.to_string(),
            request_id: request_id.to_string(),
            status: OrderStatus::Pending,
            creem_checkout_id: None,
            creem_order_id: None,
            amount_cents: None,
            currency: None,
            updated_at: None,
        };

        let mut inner = self.inner.lock().unwrap();
        inner
            .orders_by_request
            .insert(request_id.to_string(), order.clone());
        Ok(order)
    }

    async fn update_order_failed(&self, request_id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(order) = inner.orders_by_request.get_mut(request_id) {
            order.status = OrderStatus::Failed;
        }
        Ok(())
    }

    async fn update_order_checkout_ids(
        &self,
        request_id: &str,
        creem_checkout_id: Option<&str>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(order) = inner.orders_by_request.get_mut(request_id) {
            order.creem_checkout_id = creem_checkout_id.map(String::from);
        }
        Ok(())
    }

    async fn get_order_by_request_id(&self, request_id: &str) -> StoreResult<Option<Order>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.orders_by_request.get(request_id).cloned())
    }

    async fn mark_order_paid(
        &self,
        request_id: &str,
        creem_checkout_id: Option<&str>,
        creem_order_id: Option<&str>,
        amount_cents: Option<i64>,
        currency: Option<&str>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(order) = inner.orders_by_request.get_mut(request_id) {
            order.status = OrderStatus::Paid;
            order.creem_checkout_id = creem_checkout_id.map(String::from);
            order.creem_order_id = creem_order_id.map(String::from);
            order.amount_cents = amount_cents;
            order.currency = currency.map(String::from);
        }
        Ok(())
    }

    async fn grant_entitlement(&self, user_id: &str, product_id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .entitlements
            .insert((user_id.to_string(), product_id.to_string()));
        Ok(())
    }

    async fn webhook_event_seen(&self, event_key: &str) -> StoreResult<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.webhook_events.contains(event_key))
    }

    async fn webhook_event_mark_seen(&self, event_key: &str) -> StoreResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.webhook_events.insert(event_key.to_string()))
    }
}
