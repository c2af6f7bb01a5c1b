//! # Mock status simulator
//!
//! Stands in for a real payment processor by deriving an order's displayed status from the time since it was
//! created:
//!
//! | Elapsed (whole seconds) | Displayed status                         |
//! |-------------------------|------------------------------------------|
//! | `< 8`                   | `created`                                |
//! | `8..18`                 | `processing`                             |
//! | `>= 18`                 | a terminal outcome, drawn once and kept |
//!
//! The drawing of the terminal outcome is delegated to an [`OutcomeSource`], so that tests can fix it.
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use log::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::db_types::{FinalStatus, OrderStatusType};

pub const PROCESSING_AFTER_SECS: i64 = 8;
pub const RESOLVE_AFTER_SECS: i64 = 18;
pub const DEFAULT_SETTLE_PROBABILITY: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedPhase {
    Created,
    Processing,
    /// The order is old enough to be given a terminal outcome.
    Resolvable,
}

/// Elapsed whole seconds between `created_at` and `now`. Clock skew that puts `now` before `created_at` counts as 0.
pub fn elapsed_secs(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_seconds().max(0)
}

pub fn simulated_phase(elapsed_secs: i64) -> SimulatedPhase {
    match elapsed_secs {
        s if s < PROCESSING_AFTER_SECS => SimulatedPhase::Created,
        s if s < RESOLVE_AFTER_SECS => SimulatedPhase::Processing,
        _ => SimulatedPhase::Resolvable,
    }
}

/// The displayed status for a stored status at the given phase, or `None` if a terminal outcome must be decided.
pub fn displayed_status(stored: OrderStatusType, phase: SimulatedPhase) -> Option<OrderStatusType> {
    if stored.is_terminal() {
        return Some(stored);
    }
    match phase {
        SimulatedPhase::Created => Some(OrderStatusType::Created),
        SimulatedPhase::Processing => Some(OrderStatusType::Processing),
        SimulatedPhase::Resolvable => None,
    }
}

/// Decides how an order ends.
pub trait OutcomeSource: Send + Sync {
    fn draw(&self) -> FinalStatus;
}

/// Settles with a fixed probability and fails otherwise.
pub struct RandomOutcome {
    rng: Mutex<StdRng>,
    settle_probability: f64,
}

impl RandomOutcome {
    pub fn new(settle_probability: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), settle_probability)
    }

    /// A reproducible source. Two sources with the same seed and probability draw the same sequence.
    pub fn seeded(seed: u64, settle_probability: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), settle_probability)
    }

    fn with_rng(rng: StdRng, settle_probability: f64) -> Self {
        let p = if settle_probability.is_nan() { DEFAULT_SETTLE_PROBABILITY } else { settle_probability.clamp(0.0, 1.0) };
        Self { rng: Mutex::new(rng), settle_probability: p }
    }

    pub fn settle_probability(&self) -> f64 {
        self.settle_probability
    }
}

impl Default for RandomOutcome {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_PROBABILITY)
    }
}

impl OutcomeSource for RandomOutcome {
    fn draw(&self) -> FinalStatus {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let outcome = if rng.gen_bool(self.settle_probability) { FinalStatus::Settled } else { FinalStatus::Failed };
        trace!("🎲️ Drew {outcome}");
        outcome
    }
}

/// Always draws the same outcome.
#[derive(Debug, Clone, Copy)]
pub struct FixedOutcome(pub FinalStatus);

impl OutcomeSource for FixedOutcome {
    fn draw(&self) -> FinalStatus {
        self.0
    }
}
