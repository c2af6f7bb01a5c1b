use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderResolvedEvent, WebhookReceivedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_resolved_producer: Vec<EventProducer<OrderResolvedEvent>>,
    pub webhook_received_producer: Vec<EventProducer<WebhookReceivedEvent>>,
}

pub struct EventHandlers {
    pub on_order_resolved: Option<EventHandler<OrderResolvedEvent>>,
    pub on_webhook_received: Option<EventHandler<WebhookReceivedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_resolved = hooks.on_order_resolved.map(|f| EventHandler::new(buffer_size, f));
        let on_webhook_received = hooks.on_webhook_received.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_resolved, on_webhook_received }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_resolved {
            result.order_resolved_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_webhook_received {
            result.webhook_received_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_resolved {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_webhook_received {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_resolved: Option<Handler<OrderResolvedEvent>>,
    pub on_webhook_received: Option<Handler<WebhookReceivedEvent>>,
}

impl EventHooks {
    pub fn on_order_resolved<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderResolvedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_resolved = Some(Arc::new(f));
        self
    }

    pub fn on_webhook_received<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(WebhookReceivedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_webhook_received = Some(Arc::new(f));
        self
    }
}
