use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    db_types::{NewOrder, Order, OrderId},
    engine_api::{
        errors::OrderFlowError,
        order_objects::OrderStatusView,
        status_simulator::{displayed_status, elapsed_secs, simulated_phase, OutcomeSource, RandomOutcome},
    },
    events::{EventProducers, OrderResolvedEvent},
    traits::{Clock, FinalizeOrderResult, OrderManagement, StoreError, SystemClock},
};

/// How many fresh identifiers to try before giving up on an order insert.
const MAX_ID_ATTEMPTS: usize = 5;

/// `OrderFlowApi` is the primary API for creating orders and resolving their status.
///
/// Time and randomness are injected, defaulting to the system clock and a [`RandomOutcome`] with the default settle
/// probability.
pub struct OrderFlowApi<B> {
    db: B,
    clock: Arc<dyn Clock>,
    outcomes: Arc<dyn OutcomeSource>,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, clock: Arc::new(SystemClock), outcomes: Arc::new(RandomOutcome::default()), producers }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_outcome_source(mut self, outcomes: Arc<dyn OutcomeSource>) -> Self {
        self.outcomes = outcomes;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Validates and stores a brand-new order with status `created`.
    ///
    /// A fresh identifier is generated for the order. In the unlikely event of a collision with an existing order, a
    /// new identifier is tried.
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        order.validate().map_err(OrderFlowError::InvalidOrder)?;
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = Order::new(OrderId::random(), order.clone(), self.clock.now());
            match self.db.insert_order(candidate).await {
                Ok(order) => {
                    info!("🔄️📦️ Order {} created for {} {} via {}", order.order_id, order.amount, order.currency, order.token);
                    return Ok(order);
                },
                Err(StoreError::OrderAlreadyExists(id)) => {
                    warn!("🔄️📦️ Generated order id {id} is already taken. Trying another.");
                },
                Err(e) => return Err(e.into()),
            }
        }
        error!("🔄️📦️ Could not find a free order id after {MAX_ID_ATTEMPTS} attempts");
        Err(StoreError::BackendError("Could not generate a unique order id".into()).into())
    }

    /// Fetches the order exactly as it is stored. This never changes the order.
    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        self.db.fetch_order(order_id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))
    }

    /// Evaluates the status simulator for the order and returns its displayed status.
    ///
    /// Once the order is old enough, a terminal outcome is drawn and persisted. The draw happens inside the store's
    /// check-and-set, so concurrent callers agree on the outcome and it never changes afterwards. An
    /// [`OrderResolvedEvent`] is published by the caller that made the draw.
    pub async fn resolve_order_status(&self, order_id: &OrderId) -> Result<OrderStatusView, OrderFlowError> {
        let order = self.fetch_order(order_id).await?;
        let elapsed = elapsed_secs(order.created_at, self.clock.now());
        let phase = simulated_phase(elapsed);
        if let Some(status) = displayed_status(order.status, phase) {
            trace!("🎲️ Order {order_id} is {status} after {elapsed}s");
            return Ok(OrderStatusView::new(order, status));
        }
        let outcomes = &self.outcomes;
        let result = self.db.finalize_order(order_id, || outcomes.draw()).await.map_err(|e| match e {
            StoreError::OrderNotFound(id) => OrderFlowError::OrderNotFound(id),
            e => e.into(),
        })?;
        let order = match result {
            FinalizeOrderResult::Finalized(order) => {
                info!("🎲️ Order {order_id} resolved to {} after {elapsed}s", order.status);
                self.call_order_resolved_hook(&order).await;
                order
            },
            FinalizeOrderResult::AlreadyFinal(order) => order,
        };
        Ok(OrderStatusView::from(order))
    }

    async fn call_order_resolved_hook(&self, order: &Order) {
        for emitter in &self.producers.order_resolved_producer {
            debug!("🔄️📦️ Notifying order resolved hook subscribers");
            emitter.publish_event(OrderResolvedEvent::new(order.clone())).await;
        }
    }
}
