//! # Order status reconciliation
//!
//! Once an order has been created, two sources may report how it ended:
//!
//! * the payment processor, whose verified webhook result the server reports on `/orders/webhook-status`, and
//! * the server's status simulator, reported on `/orders/{order_id}`.
//!
//! [`Reconciler`] polls both on a fixed interval and merges them into one [`TrackedStatus`]. On every tick the webhook
//! result is consulted first. If it is final, it is adopted and the simulator is not asked at all. Otherwise whatever
//! the simulator reports is adopted. If nothing final has turned up once the polling budget is used up, the order is
//! given up on as [`TrackedStatus::Timeout`].
//!
//! Elapsed time is counted in ticks, so a tick that fails still uses up its share of the budget. A poll that has not
//! been answered by the end of its interval counts as failed. Once the tracked status is terminal, further ticks do
//! nothing and make no requests.
use std::{fmt::Display, time::Duration};

use anyhow::Result;
use log::*;
use order_engine::{
    db_types::{FinalStatus, NewOrder, Order, OrderId, OrderStatusType},
    order_objects::{OrderStatusView, WebhookStatus},
};
use tokio::time::{interval_at, timeout, Instant, Interval, MissedTickBehavior};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_POLL_BUDGET: Duration = Duration::from_secs(60);

//--------------------------------------     TrackedStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedStatus {
    Created,
    Processing,
    Settled,
    Failed,
    /// Nothing final was heard within the polling budget.
    Timeout,
}

impl TrackedStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled | Self::Failed | Self::Timeout)
    }
}

impl From<OrderStatusType> for TrackedStatus {
    fn from(value: OrderStatusType) -> Self {
        match value {
            OrderStatusType::Created => Self::Created,
            OrderStatusType::Processing => Self::Processing,
            OrderStatusType::Settled => Self::Settled,
            OrderStatusType::Failed => Self::Failed,
        }
    }
}

impl From<FinalStatus> for TrackedStatus {
    fn from(value: FinalStatus) -> Self {
        OrderStatusType::from(value).into()
    }
}

impl Display for TrackedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Processing => write!(f, "processing"),
            Self::Settled => write!(f, "settled"),
            Self::Failed => write!(f, "failed"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

//--------------------------------------     PollingPolicy     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingPolicy {
    pub interval: Duration,
    /// Total time to wait for a final status before timing out.
    pub budget: Duration,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self { interval: DEFAULT_POLL_INTERVAL, budget: DEFAULT_POLL_BUDGET }
    }
}

impl PollingPolicy {
    pub fn new(interval: Duration, budget: Duration) -> Self {
        Self { interval, budget }
    }

    /// The number of unresolved ticks after which the order times out.
    pub fn max_ticks(&self) -> u32 {
        if self.interval.is_zero() {
            return 1;
        }
        let ticks = self.budget.as_nanos().div_ceil(self.interval.as_nanos());
        u32::try_from(ticks).unwrap_or(u32::MAX).max(1)
    }
}

//--------------------------------------        Seams          ---------------------------------------------------------
/// The status sources the reconciler polls. [`crate::client::OrderServerClient`] is the production implementation.
#[allow(async_fn_in_trait)]
pub trait OrderBackend {
    async fn create_order(&self, order: &NewOrder) -> Result<Order>;
    async fn order_status(&self, order_id: &OrderId) -> Result<OrderStatusView>;
    async fn webhook_status(&self, order_id: &OrderId) -> Result<WebhookStatus>;
}

/// Paces the polling loop.
#[allow(async_fn_in_trait)]
pub trait Ticker {
    /// Completes when the next poll is due.
    async fn tick(&mut self);
}

/// Ticks every `period`, starting one period from now. A late tick delays the ones after it, so ticks never bunch up.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

//--------------------------------------      Reconciler       ---------------------------------------------------------
pub struct Reconciler<'a, B> {
    backend: &'a B,
    order_id: OrderId,
    policy: PollingPolicy,
    status: TrackedStatus,
    ticks: u32,
    finalized: bool,
}

impl<'a, B: OrderBackend> Reconciler<'a, B> {
    pub fn new(backend: &'a B, order_id: OrderId, policy: PollingPolicy) -> Self {
        Self { backend, order_id, policy, status: TrackedStatus::Created, ticks: 0, finalized: false }
    }

    pub fn status(&self) -> TrackedStatus {
        self.status
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// Time accounted for so far, one interval per completed tick.
    pub fn elapsed(&self) -> Duration {
        self.policy.interval.saturating_mul(self.ticks)
    }

    /// Stops polling. The status is left as it is.
    pub fn stop(&mut self) {
        self.finalized = true;
    }

    /// Performs one poll cycle and returns the tracked status afterwards.
    pub async fn tick(&mut self) -> TrackedStatus {
        if self.finalized {
            trace!("🔁️ Order {} is already {}. Ignoring tick.", self.order_id, self.status);
            return self.status;
        }
        // A poll may not outlast its interval
        match timeout(self.policy.interval, self.poll()).await {
            Ok(Some(status)) => self.status = status,
            Ok(None) => {},
            Err(_) => warn!("🔁️ No answer about order {} within {:?}", self.order_id, self.policy.interval),
        }
        if self.status.is_terminal() {
            info!("🔁️ Order {} is {}", self.order_id, self.status);
            self.finalized = true;
            return self.status;
        }
        self.ticks = self.ticks.saturating_add(1);
        if self.ticks >= self.policy.max_ticks() {
            warn!("🔁️ Order {} did not resolve within {:?}", self.order_id, self.elapsed());
            self.status = TrackedStatus::Timeout;
            self.finalized = true;
        }
        self.status
    }

    /// Runs poll cycles, paced by `ticker`, until the status is terminal. `on_change` is called with every new status.
    pub async fn run<T, F>(&mut self, ticker: &mut T, mut on_change: F) -> TrackedStatus
    where
        T: Ticker,
        F: FnMut(TrackedStatus),
    {
        while !self.finalized {
            ticker.tick().await;
            let before = self.status;
            let after = self.tick().await;
            if after != before {
                on_change(after);
            }
        }
        self.status
    }

    /// The status reported this cycle, if any source answered. A final webhook result wins over the simulator.
    async fn poll(&self) -> Option<TrackedStatus> {
        match self.backend.webhook_status(&self.order_id).await {
            Ok(status) => {
                if let Some(status) = status.final_status() {
                    debug!("🔁️ Webhook reports order {} as {status}", self.order_id);
                    return Some(status.into());
                }
            },
            Err(e) => warn!("🔁️ Could not fetch the webhook status for order {}. {e}", self.order_id),
        }
        match self.backend.order_status(&self.order_id).await {
            Ok(view) => {
                trace!("🔁️ Server reports order {} as {}", self.order_id, view.status);
                Some(view.status.into())
            },
            Err(e) => {
                warn!("🔁️ Could not fetch the status of order {}. {e}", self.order_id);
                None
            },
        }
    }
}
