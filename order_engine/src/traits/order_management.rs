use crate::{
    db_types::{FinalStatus, Order, OrderId},
    traits::StoreError,
};

/// The outcome of [`OrderManagement::finalize_order`].
#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeOrderResult {
    /// This call decided the outcome. The order carries the newly stored terminal status.
    Finalized(Order),
    /// The order was already terminal. The stored order is returned unchanged and the decision closure was not called.
    AlreadyFinal(Order),
}

impl FinalizeOrderResult {
    pub fn order(&self) -> &Order {
        match self {
            Self::Finalized(o) | Self::AlreadyFinal(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            Self::Finalized(o) | Self::AlreadyFinal(o) => o,
        }
    }
}

/// The `OrderManagement` trait defines behaviour for storing orders.
///
/// Apart from insertion, the only mutation is [`Self::finalize_order`], which must be an atomic check-and-set per
/// order: of any number of concurrent calls for the same order, exactly one may run its `decide` closure and store a
/// result, and every call must return that same result.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a brand-new order. If an order with the same id exists, [`StoreError::OrderAlreadyExists`] is returned
    /// and the existing order is left untouched.
    async fn insert_order(&self, order: Order) -> Result<Order, StoreError>;

    /// Fetches the order with the given id. If no such order exists, `None` is returned.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// Moves the order into a terminal status, unless it is already terminal.
    ///
    /// `decide` is only called when the stored status is not yet terminal, and then exactly once.
    async fn finalize_order<F>(&self, order_id: &OrderId, decide: F) -> Result<FinalizeOrderResult, StoreError>
    where F: FnOnce() -> FinalStatus + Send;
}
