use crate::{
    db_types::{OrderId, WebhookRecord},
    traits::StoreError,
};

/// The `WebhookManagement` trait defines behaviour for storing the final statuses pushed by the payment processor.
///
/// Only terminal statuses are ever stored. Records are never deleted.
#[allow(async_fn_in_trait)]
pub trait WebhookManagement {
    /// Stores the record for the given order, replacing any previous record. The replaced record, if any, is returned.
    async fn save_webhook_result(
        &self,
        order_id: &OrderId,
        record: WebhookRecord,
    ) -> Result<Option<WebhookRecord>, StoreError>;

    /// Fetches the record for the given order, or `None` if the processor has not reported on it.
    async fn fetch_webhook_result(&self, order_id: &OrderId) -> Result<Option<WebhookRecord>, StoreError>;
}
