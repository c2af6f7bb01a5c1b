use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use chrono::Duration;
use order_engine::{
    db_types::{FinalStatus, NewOrder, OrderStatusType},
    events::EventProducers,
    status_simulator::{OutcomeSource, RandomOutcome},
    traits::Clock,
    MemoryDatabase,
    OrderFlowError,
};

use crate::support::prepare_env::{order_api, order_api_with, prepare_test_env, test_clock};

mod support;

/// Counts draws, and alternates between outcomes so that a second draw would be visible.
#[derive(Default)]
struct CountingOutcome {
    draws: AtomicUsize,
}

impl OutcomeSource for CountingOutcome {
    fn draw(&self) -> FinalStatus {
        match self.draws.fetch_add(1, Ordering::SeqCst) % 2 {
            0 => FinalStatus::Settled,
            _ => FinalStatus::Failed,
        }
    }
}

#[tokio::test]
async fn order_lifecycle() {
    prepare_test_env();
    let clock = test_clock();
    let api = order_api(&clock, FinalStatus::Settled);
    let order = api.create_order(NewOrder::new(100.0, "KES", "USDC")).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Created);
    assert_eq!(order.created_at, clock.now());
    let id = order.order_id.clone();

    let view = api.resolve_order_status(&id).await.unwrap();
    assert_eq!(view.status, OrderStatusType::Created);
    assert_eq!(view.amount, 100.0);
    assert_eq!(view.currency, "KES");
    assert_eq!(view.token, "USDC");

    clock.advance(Duration::seconds(10));
    assert_eq!(api.resolve_order_status(&id).await.unwrap().status, OrderStatusType::Processing);

    clock.advance(Duration::seconds(10));
    assert_eq!(api.resolve_order_status(&id).await.unwrap().status, OrderStatusType::Settled);
    // Stable on repeat, however much later we ask
    clock.advance(Duration::days(3));
    assert_eq!(api.resolve_order_status(&id).await.unwrap().status, OrderStatusType::Settled);
}

#[tokio::test]
async fn the_terminal_draw_happens_once() {
    prepare_test_env();
    let clock = test_clock();
    let outcomes = Arc::new(CountingOutcome::default());
    let api = order_api_with(MemoryDatabase::new(), &clock, outcomes.clone(), EventProducers::default());
    let order = api.create_order(NewOrder::new(5.0, "KES", "USDC")).await.unwrap();
    clock.advance(Duration::seconds(18));
    let first = api.resolve_order_status(&order.order_id).await.unwrap().status;
    for _ in 0..10 {
        assert_eq!(api.resolve_order_status(&order.order_id).await.unwrap().status, first);
    }
    assert_eq!(outcomes.draws.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_resolution_agrees() {
    prepare_test_env();
    let clock = test_clock();
    let outcomes = Arc::new(CountingOutcome::default());
    let api = order_api_with(MemoryDatabase::new(), &clock, outcomes.clone(), EventProducers::default());
    let order = api.create_order(NewOrder::new(5.0, "KES", "USDC")).await.unwrap();
    clock.advance(Duration::seconds(18));
    let id = &order.order_id;
    let (a, b, c) = tokio::join!(api.resolve_order_status(id), api.resolve_order_status(id), api.resolve_order_status(id));
    let (a, b, c) = (a.unwrap().status, b.unwrap().status, c.unwrap().status);
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert!(a.is_terminal());
    assert_eq!(outcomes.draws.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn status_never_goes_backwards() {
    prepare_test_env();
    let clock = test_clock();
    let api = order_api_with(
        MemoryDatabase::new(),
        &clock,
        Arc::new(RandomOutcome::seeded(99, 0.5)),
        EventProducers::default(),
    );
    let order = api.create_order(NewOrder::new(1.0, "KES", "USDC")).await.unwrap();
    let rank = |s: OrderStatusType| match s {
        OrderStatusType::Created => 0,
        OrderStatusType::Processing => 1,
        OrderStatusType::Settled | OrderStatusType::Failed => 2,
    };
    let mut last = OrderStatusType::Created;
    for _ in 0..40 {
        let status = api.resolve_order_status(&order.order_id).await.unwrap().status;
        assert!(rank(status) >= rank(last), "{last} -> {status}");
        if last.is_terminal() {
            assert_eq!(status, last);
        }
        last = status;
        clock.advance(Duration::seconds(1));
    }
    assert!(last.is_terminal());
}

#[tokio::test]
async fn invalid_orders_are_rejected() {
    prepare_test_env();
    let clock = test_clock();
    let api = order_api(&clock, FinalStatus::Settled);
    for order in [
        NewOrder::new(0.0, "KES", "USDC"),
        NewOrder::new(-1.0, "KES", "USDC"),
        NewOrder::new(f64::INFINITY, "KES", "USDC"),
        NewOrder::new(10.0, "", "USDC"),
        NewOrder::new(10.0, "KES", ""),
    ] {
        let err = api.create_order(order).await.unwrap_err();
        assert!(matches!(err, OrderFlowError::InvalidOrder(_)));
    }
    assert_eq!(api.db().order_count().await, 0);
}

#[tokio::test]
async fn notes_are_kept() {
    prepare_test_env();
    let clock = test_clock();
    let api = order_api(&clock, FinalStatus::Settled);
    let order = api.create_order(NewOrder::new(12.5, "KES", "USDC").with_note("coffee")).await.unwrap();
    let stored = api.fetch_order(&order.order_id).await.unwrap();
    assert_eq!(stored.note.as_deref(), Some("coffee"));
}
