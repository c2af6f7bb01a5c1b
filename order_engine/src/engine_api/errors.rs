use thiserror::Error;

use crate::{db_types::OrderId, traits::StoreError};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
}
