//! # Order engine public API
//!
//! The `engine_api` module exposes the programmatic API for the order flow. It is split in two, mirroring the two
//! independently owned stores:
//!
//! * [`order_flow_api`] creates orders and resolves their displayed status using the [`status_simulator`].
//! * [`webhook_api`] records and reports the final statuses pushed by the payment processor.
//!
//! # API usage
//!
//! An API instance is created by supplying a backend that implements the store trait the API needs.
//!
//! ```rust,ignore
//! use order_engine::{db_types::NewOrder, events::EventProducers, MemoryDatabase, OrderFlowApi};
//! let db = MemoryDatabase::new();
//! let api = OrderFlowApi::new(db, EventProducers::default());
//! let order = api.create_order(NewOrder::new(100.0, "KES", "USDC")).await?;
//! let view = api.resolve_order_status(&order.order_id).await?;
//! ```

pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod status_simulator;
pub mod webhook_api;
