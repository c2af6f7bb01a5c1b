use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use chrono::Duration;
use order_engine::{
    db_types::{FinalStatus, WebhookRecord},
    events::EventProducers,
    traits::StoreError,
    WebhookApi,
};
use serde_json::json;

use super::{
    helpers::{assert_error, json, send, TestContext},
    mocks::MockWebhookStore,
};
use crate::routes::WebhookStatusRoute;

fn new_order(body: serde_json::Value) -> actix_http::Request {
    TestRequest::post().uri("/orders").set_json(body).to_request()
}

#[actix_web::test]
async fn health_endpoint() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let (status, body) = send(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn create_order() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let (status, body) = send(&app, new_order(json!({"amount": 100, "currency": "KES", "token": "USDC"}))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order = json(&body);
    let id = order["order_id"].as_str().unwrap();
    assert!(id.starts_with("ord_") && id.len() == 12, "{id}");
    assert_eq!(order["status"], "created");
    assert_eq!(order["amount"], 100.0);
    assert_eq!(order["currency"], "KES");
    assert_eq!(order["token"], "USDC");
    assert_eq!(order["created_at"], "2023-11-14T22:13:20Z");
    assert!(order.get("note").is_none());
    assert_eq!(ctx.db.order_count().await, 1);
}

#[actix_web::test]
async fn create_order_with_note() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let req = new_order(json!({"amount": 2.5, "currency": "KES", "token": "USDC", "note": "lunch"}));
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json(&body)["note"], "lunch");
}

#[actix_web::test]
async fn invalid_orders() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let cases = [
        (json!({"amount": 0, "currency": "KES", "token": "USDC"}), "Amount must be greater than 0"),
        (json!({"amount": -10, "currency": "KES", "token": "USDC"}), "Amount must be greater than 0"),
        (json!({"amount": 10, "currency": "", "token": "USDC"}), "Currency is required"),
        (json!({"amount": 10, "currency": "KES", "token": ""}), "Token is required"),
        (json!({"amount": 10, "currency": "USD", "token": "USDC"}), "Unsupported currency: USD"),
        (json!({"amount": 10, "currency": "KES", "token": "DAI"}), "Unsupported token: DAI"),
        (json!({"amount": "ten", "currency": "KES", "token": "USDC"}), ""),
        (json!({"currency": "KES", "token": "USDC"}), ""),
    ];
    for (body, expected) in cases {
        let response = send(&app, new_order(body.clone())).await;
        let message = assert_error(&response, StatusCode::BAD_REQUEST, "invalid_request");
        assert!(message.contains(expected), "{body}: {message}");
    }
    assert_eq!(ctx.db.order_count().await, 0);
}

#[actix_web::test]
async fn malformed_json() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"amount\": 10,")
        .to_request();
    let response = send(&app, req).await;
    assert_error(&response, StatusCode::BAD_REQUEST, "invalid_request");
}

#[actix_web::test]
async fn order_status_follows_the_simulator() {
    let ctx = TestContext::new().with_outcome(FinalStatus::Failed);
    let app = ctx.app().await;
    let (_, body) = send(&app, new_order(json!({"amount": 100, "currency": "KES", "token": "USDC"}))).await;
    let id = json(&body)["order_id"].as_str().unwrap().to_string();
    let get = |id: &str| TestRequest::get().uri(&format!("/orders/{id}")).to_request();

    let (status, body) = send(&app, get(&id)).await;
    assert_eq!(status, StatusCode::OK);
    let view = json(&body);
    assert_eq!(view["status"], "created");
    assert_eq!(view["order_id"], id.as_str());
    assert_eq!(view["amount"], 100.0);
    assert!(view.get("note").is_none());

    ctx.clock.advance(Duration::seconds(10));
    let (_, body) = send(&app, get(&id)).await;
    assert_eq!(json(&body)["status"], "processing");

    ctx.clock.advance(Duration::seconds(10));
    let (_, body) = send(&app, get(&id)).await;
    assert_eq!(json(&body)["status"], "failed");
    ctx.clock.advance(Duration::seconds(100));
    let (_, body) = send(&app, get(&id)).await;
    assert_eq!(json(&body)["status"], "failed");
}

#[actix_web::test]
async fn unknown_order() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let response = send(&app, TestRequest::get().uri("/orders/ord_deadbeef").to_request()).await;
    let message = assert_error(&response, StatusCode::NOT_FOUND, "order_not_found");
    assert!(message.contains("ord_deadbeef"));
}

#[actix_web::test]
async fn webhook_status_requires_an_id() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    for uri in ["/orders/webhook-status", "/orders/webhook-status?id=", "/orders/webhook-status?other=1"] {
        let response = send(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_error(&response, StatusCode::BAD_REQUEST, "missing_id");
    }
}

#[actix_web::test]
async fn webhook_status_defaults_to_unknown() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let (status, body) = send(&app, TestRequest::get().uri("/orders/webhook-status?id=ord_1").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"unknown"}"#);
}

#[actix_web::test]
async fn webhook_status_backend_failure() {
    let _ = env_logger::try_init();
    let mut store = MockWebhookStore::new();
    store.expect_fetch_webhook_result().returning(|_| Err(StoreError::BackendError("disk on fire".into())));
    store.expect_save_webhook_result().never();
    let api = WebhookApi::new(store, EventProducers::default());
    let app = test::init_service(
        App::new().app_data(web::Data::new(api)).service(WebhookStatusRoute::<MockWebhookStore>::new()),
    )
    .await;
    let response = send(&app, TestRequest::get().uri("/orders/webhook-status?id=ord_1").to_request()).await;
    let message = assert_error(&response, StatusCode::INTERNAL_SERVER_ERROR, "server_error");
    assert!(message.contains("disk on fire"));
}

#[actix_web::test]
async fn webhook_status_reads_the_store() {
    let _ = env_logger::try_init();
    let mut store = MockWebhookStore::new();
    store
        .expect_fetch_webhook_result()
        .withf(|id| id.as_str() == "ord_7")
        .returning(|_| Ok(Some(WebhookRecord::new(FinalStatus::Failed, chrono::Utc::now()))));
    let api = WebhookApi::new(store, EventProducers::default());
    let app = test::init_service(
        App::new().app_data(web::Data::new(api)).service(WebhookStatusRoute::<MockWebhookStore>::new()),
    )
    .await;
    let (status, body) = send(&app, TestRequest::get().uri("/orders/webhook-status?id=ord_7").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"failed"}"#);
}
