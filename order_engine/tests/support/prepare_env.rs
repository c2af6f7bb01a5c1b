use std::sync::Arc;

use chrono::{TimeZone, Utc};
use log::*;
use order_engine::{
    db_types::FinalStatus,
    events::EventProducers,
    status_simulator::{FixedOutcome, OutcomeSource},
    traits::ManualClock,
    MemoryDatabase,
    OrderFlowApi,
    WebhookApi,
};

pub fn prepare_test_env() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
}

/// A clock pinned to a fixed instant, so that test output is stable.
pub fn test_clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap())
}

#[allow(dead_code)]
pub fn order_api_with(
    db: MemoryDatabase,
    clock: &ManualClock,
    outcomes: Arc<dyn OutcomeSource>,
    producers: EventProducers,
) -> OrderFlowApi<MemoryDatabase> {
    OrderFlowApi::new(db, producers).with_clock(Arc::new(clock.clone())).with_outcome_source(outcomes)
}

#[allow(dead_code)]
pub fn order_api(clock: &ManualClock, outcome: FinalStatus) -> OrderFlowApi<MemoryDatabase> {
    order_api_with(MemoryDatabase::new(), clock, Arc::new(FixedOutcome(outcome)), EventProducers::default())
}

#[allow(dead_code)]
pub fn webhook_api(db: MemoryDatabase, clock: &ManualClock, producers: EventProducers) -> WebhookApi<MemoryDatabase> {
    WebhookApi::new(db, producers).with_clock(Arc::new(clock.clone()))
}
