//! # ordertools
//!
//! Client side of the ElementPay demo order flow.
//!
//! * [`client`] talks to the order server over HTTP.
//! * [`reconciler`] polls the server until an order resolves, merging the webhook and simulator statuses into one.
//! * [`session`] holds the state of an order form, from input validation through tracking to reset.
//! * [`config`] reads the tool configuration from the environment.
pub mod client;
pub mod config;
pub mod reconciler;
pub mod session;
