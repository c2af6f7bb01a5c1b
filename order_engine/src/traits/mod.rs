//! # Storage and environment contracts
//!
//! This module defines the interfaces that order and webhook store *backends* must implement, plus the clock
//! abstraction the engine reads time through.
//!
//! * [`OrderManagement`] is the order store. Orders are inserted once, read many times, and finalised at most once.
//! * [`WebhookManagement`] is the webhook result store. It holds the final statuses reported by the payment processor.
//! * [`Clock`] supplies the current time, so that elapsed-time logic can be tested without waiting.
//!
//! The two stores are independent. A single backend (e.g. [`crate::MemoryDatabase`]) may implement both, but nothing
//! in the engine relies on that.
mod clock;
mod order_management;
mod webhook_management;

use thiserror::Error;

use crate::db_types::OrderId;

pub use clock::{Clock, ManualClock, SystemClock};
pub use order_management::{FinalizeOrderResult, OrderManagement};
pub use webhook_management::WebhookManagement;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    BackendError(String),
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
}
