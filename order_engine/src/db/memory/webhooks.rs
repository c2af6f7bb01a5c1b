use std::collections::HashMap;

use crate::db_types::{OrderId, WebhookRecord};

pub fn save_webhook_result(
    order_id: &OrderId,
    record: WebhookRecord,
    hooks: &mut HashMap<OrderId, WebhookRecord>,
) -> Option<WebhookRecord> {
    hooks.insert(order_id.clone(), record)
}

pub fn fetch_webhook_result(order_id: &OrderId, hooks: &HashMap<OrderId, WebhookRecord>) -> Option<WebhookRecord> {
    hooks.get(order_id).cloned()
}
