use std::{collections::HashMap, fmt::Debug, sync::Arc};

use log::*;
use tokio::sync::RwLock;

use super::{orders, webhooks};
use crate::{
    db_types::{FinalStatus, Order, OrderId, WebhookRecord},
    traits::{FinalizeOrderResult, OrderManagement, StoreError, WebhookManagement},
};

/// Process-lifetime key-value stores for orders and webhook results.
///
/// Clones share the same underlying maps, so a single instance can be handed to every server worker.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    webhooks: Arc<RwLock<HashMap<OrderId, WebhookRecord>>>,
}

impl Debug for MemoryDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemoryDatabase")
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

impl OrderManagement for MemoryDatabase {
    async fn insert_order(&self, order: Order) -> Result<Order, StoreError> {
        let mut orders = self.orders.write().await;
        let order = orders::insert_order(order, &mut orders)?;
        debug!("🗃️ Order {} has been saved", order.order_id);
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders::fetch_order(order_id, &orders))
    }

    /// The write lock is held across the status check, the decision and the update, so that concurrent callers
    /// observe a single outcome.
    async fn finalize_order<F>(&self, order_id: &OrderId, decide: F) -> Result<FinalizeOrderResult, StoreError>
    where F: FnOnce() -> FinalStatus + Send {
        let mut orders = self.orders.write().await;
        let result = orders::finalize_order(order_id, decide, &mut orders)?;
        if let FinalizeOrderResult::Finalized(order) = &result {
            debug!("🗃️ Order {} is now final with status {}", order.order_id, order.status);
        }
        Ok(result)
    }
}

impl WebhookManagement for MemoryDatabase {
    async fn save_webhook_result(
        &self,
        order_id: &OrderId,
        record: WebhookRecord,
    ) -> Result<Option<WebhookRecord>, StoreError> {
        let mut hooks = self.webhooks.write().await;
        let previous = webhooks::save_webhook_result(order_id, record, &mut hooks);
        trace!("🗃️ Webhook result for {order_id} saved");
        Ok(previous)
    }

    async fn fetch_webhook_result(&self, order_id: &OrderId) -> Result<Option<WebhookRecord>, StoreError> {
        let hooks = self.webhooks.read().await;
        Ok(webhooks::fetch_webhook_result(order_id, &hooks))
    }
}
