//! # ElementPay demo order server
//! This crate hosts the HTTP server for the demo order flow. It is responsible for:
//! * Accepting new orders and reporting their (simulated) status.
//! * Receiving signed webhook calls from the payment processor, and reporting what they said.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /orders`: Create a new order.
//! * `GET /orders/{order_id}`: The displayed status of an order. This evaluates the status simulator.
//! * `GET /orders/webhook-status?id=`: The final status reported by the payment processor, if any.
//! * `POST /webhooks/elementpay`: The signed webhook endpoint for the payment processor.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
