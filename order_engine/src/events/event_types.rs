use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{FinalStatus, Order, OrderId};

/// Emitted when the status simulator persists a terminal outcome for an order. It is emitted exactly once per order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResolvedEvent {
    pub order: Order,
}

impl OrderResolvedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Emitted when a verified webhook carrying a terminal status has been stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookReceivedEvent {
    pub order_id: OrderId,
    pub status: FinalStatus,
    pub received_at: DateTime<Utc>,
    /// The status this webhook replaced, if the processor had already reported on the order.
    pub replaced: Option<FinalStatus>,
}

impl WebhookReceivedEvent {
    pub fn new(order_id: OrderId, status: FinalStatus, received_at: DateTime<Utc>) -> Self {
        Self { order_id, status, received_at, replaced: None }
    }

    pub fn with_replaced(mut self, replaced: Option<FinalStatus>) -> Self {
        self.replaced = replaced;
        self
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self.replaced, Some(s) if s != self.status)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventType {
    OrderResolved(OrderResolvedEvent),
    WebhookReceived(WebhookReceivedEvent),
}
