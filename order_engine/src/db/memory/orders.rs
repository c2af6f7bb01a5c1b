use std::collections::HashMap;

use log::trace;

use crate::{
    db_types::{FinalStatus, Order, OrderId, OrderStatusType},
    traits::{FinalizeOrderResult, StoreError},
};

pub fn insert_order(order: Order, orders: &mut HashMap<OrderId, Order>) -> Result<Order, StoreError> {
    if orders.contains_key(&order.order_id) {
        return Err(StoreError::OrderAlreadyExists(order.order_id));
    }
    orders.insert(order.order_id.clone(), order.clone());
    Ok(order)
}

pub fn fetch_order(order_id: &OrderId, orders: &HashMap<OrderId, Order>) -> Option<Order> {
    orders.get(order_id).cloned()
}

/// Not atomic on its own. The caller must hold exclusive access to `orders` for the duration of the call.
pub fn finalize_order<F>(
    order_id: &OrderId,
    decide: F,
    orders: &mut HashMap<OrderId, Order>,
) -> Result<FinalizeOrderResult, StoreError>
where
    F: FnOnce() -> FinalStatus,
{
    let order = orders.get_mut(order_id).ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
    if order.status.is_terminal() {
        trace!("🗃️ Order {order_id} is already final ({})", order.status);
        return Ok(FinalizeOrderResult::AlreadyFinal(order.clone()));
    }
    order.status = OrderStatusType::from(decide());
    Ok(FinalizeOrderResult::Finalized(order.clone()))
}
