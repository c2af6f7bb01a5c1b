use mockall::mock;
use order_engine::{
    db_types::{OrderId, WebhookRecord},
    traits::{StoreError, WebhookManagement},
};

mock! {
    pub WebhookStore {}
    impl WebhookManagement for WebhookStore {
        async fn save_webhook_result(&self, order_id: &OrderId, record: WebhookRecord) -> Result<Option<WebhookRecord>, StoreError>;
        async fn fetch_webhook_result(&self, order_id: &OrderId) -> Result<Option<WebhookRecord>, StoreError>;
    }
}
