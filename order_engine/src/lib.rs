//! ElementPay Order Engine
//!
//! This library contains the core logic for the ElementPay demo order flow. It is independent of the HTTP framework
//! that serves it.
//!
//! The library is divided into the following sections:
//! 1. Storage ([`mod@traits`] and the in-memory backend, [`MemoryDatabase`]). Orders and webhook results live in two
//!    independently owned key-value stores. Handlers never touch a backend directly; they go through the public API.
//! 2. The engine public API ([`mod@engine_api`]). [`OrderFlowApi`] creates orders and resolves their displayed status
//!    via the mock status simulator. [`WebhookApi`] records and reports the final statuses pushed by the payment
//!    processor.
//! 3. Helpers ([`mod@helpers`]), most importantly the signed webhook verifier.
//!
//! The engine also provides a set of events that can be subscribed to. For example, when the simulator settles an
//! order, an `OrderResolvedEvent` is emitted.
mod db;

pub mod db_types;
pub mod engine_api;
pub mod events;
pub mod helpers;
pub mod traits;

pub use db::memory::MemoryDatabase;
pub use engine_api::{
    errors::OrderFlowError,
    order_flow_api::OrderFlowApi,
    order_objects,
    status_simulator,
    webhook_api::WebhookApi,
};
pub use traits::{OrderManagement, StoreError, WebhookManagement};
