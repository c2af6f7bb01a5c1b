use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    db_types::{FinalStatus, OrderId, WebhookRecord},
    engine_api::{
        errors::OrderFlowError,
        order_objects::{WebhookPayload, WebhookStatus},
    },
    events::{EventProducers, WebhookReceivedEvent},
    traits::{Clock, SystemClock, WebhookManagement},
};

/// Records and reports the final statuses pushed by the payment processor.
///
/// Callers are responsible for authenticating the payload before handing it to this API.
pub struct WebhookApi<B> {
    db: B,
    clock: Arc<dyn Clock>,
    producers: EventProducers,
}

impl<B> Debug for WebhookApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WebhookApi")
    }
}

impl<B> WebhookApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, clock: Arc::new(SystemClock), producers }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl<B> WebhookApi<B>
where B: WebhookManagement
{
    /// Stores the status carried by a verified webhook payload.
    ///
    /// Only `settled` and `failed` are stored; any other status is ignored and `None` is returned. A later webhook for
    /// the same order replaces an earlier one. If that changes the status, the conflict is logged.
    pub async fn record_webhook_result(&self, payload: &WebhookPayload) -> Result<Option<FinalStatus>, OrderFlowError> {
        let order_id = &payload.data.order_id;
        let Some(status) = payload.final_status() else {
            info!("🔐️ Ignoring webhook for {order_id} with non-final status '{}'", payload.data.status);
            return Ok(None);
        };
        let record = WebhookRecord::new(status, self.clock.now());
        let received_at = record.received_at;
        let replaced = self.db.save_webhook_result(order_id, record).await?.map(|r| r.status);
        match replaced {
            Some(previous) if previous != status => {
                warn!("🔐️ Webhook for {order_id} changed its final status from {previous} to {status}");
            },
            Some(_) => debug!("🔐️ Duplicate webhook for {order_id} ({status})"),
            None => info!("🔐️ Webhook for {order_id} recorded as {status}"),
        }
        let event = WebhookReceivedEvent::new(order_id.clone(), status, received_at).with_replaced(replaced);
        self.call_webhook_received_hook(event).await;
        Ok(Some(status))
    }

    /// What the payment processor has reported for the order, or [`WebhookStatus::Unknown`] if nothing yet.
    pub async fn webhook_status(&self, order_id: &OrderId) -> Result<WebhookStatus, OrderFlowError> {
        let record = self.db.fetch_webhook_result(order_id).await?;
        Ok(WebhookStatus::from(record.map(|r| r.status)))
    }

    async fn call_webhook_received_hook(&self, event: WebhookReceivedEvent) {
        for emitter in &self.producers.webhook_received_producer {
            debug!("📬️ Notifying webhook received hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}
