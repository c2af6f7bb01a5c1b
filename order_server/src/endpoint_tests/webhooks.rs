use actix_http::Request;
use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test::TestRequest,
    Error,
};
use order_engine::{db_types::OrderId, helpers::signature_header, traits::WebhookManagement};

use super::helpers::{
    assert_error,
    json,
    send,
    signed_webhook,
    webhook_body,
    webhook_request,
    TestContext,
    SECRET,
    T0,
};

async fn webhook_status<S, B>(app: &S, id: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = TestRequest::get().uri(&format!("/orders/webhook-status?id={id}")).to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    json(&body)["status"].as_str().unwrap().to_string()
}

#[actix_web::test]
async fn valid_webhook_is_recorded() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let body = webhook_body("ord_1", "settled");
    let (status, response) = send(&app, signed_webhook(&body, T0)).await;
    assert_eq!(status, StatusCode::OK, "{response}");
    assert_eq!(response, r#"{"success":true}"#);
    assert_eq!(webhook_status(&app, "ord_1").await, "settled");
    let record = ctx.db.fetch_webhook_result(&OrderId::new("ord_1")).await.unwrap().unwrap();
    assert_eq!(record.received_at.timestamp(), T0);
}

#[actix_web::test]
async fn later_webhooks_replace_earlier_ones() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    send(&app, signed_webhook(&webhook_body("ord_1", "settled"), T0)).await;
    let (status, _) = send(&app, signed_webhook(&webhook_body("ord_1", "failed"), T0)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(webhook_status(&app, "ord_1").await, "failed");
}

#[actix_web::test]
async fn non_final_statuses_are_acknowledged_and_ignored() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let (status, response) = send(&app, signed_webhook(&webhook_body("ord_1", "pending"), T0)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, r#"{"success":true}"#);
    assert_eq!(webhook_status(&app, "ord_1").await, "unknown");
}

#[actix_web::test]
async fn missing_signature() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let response = send(&app, webhook_request(&webhook_body("ord_1", "settled"), None)).await;
    assert_error(&response, StatusCode::BAD_REQUEST, "missing_signature");
    assert_eq!(webhook_status(&app, "ord_1").await, "unknown");
}

#[actix_web::test]
async fn malformed_signature() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let body = webhook_body("ord_1", "settled");
    for header in ["garbage", "t=abc,v1=xyz", "t=1700000000", "v1=abc", "t=1700000000,v1="] {
        let response = send(&app, webhook_request(&body, Some(header))).await;
        assert_error(&response, StatusCode::BAD_REQUEST, "invalid_signature_format");
    }
}

#[actix_web::test]
async fn expired_signature() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let body = webhook_body("ord_1", "settled");
    let response = send(&app, signed_webhook(&body, T0 - 400)).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "signature_expired");
    let response = send(&app, signed_webhook(&body, T0 + 301)).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "signature_expired");
    let (status, _) = send(&app, signed_webhook(&body, T0 - 300)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn tampered_body() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let body = webhook_body("ord_1", "failed");
    let header = signature_header(SECRET, T0, body.as_bytes()).unwrap();
    let tampered = webhook_body("ord_1", "settled");
    let response = send(&app, webhook_request(&tampered, Some(&header))).await;
    assert_error(&response, StatusCode::FORBIDDEN, "invalid_signature");
    assert_eq!(webhook_status(&app, "ord_1").await, "unknown");
}

#[actix_web::test]
async fn wrong_secret() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    let body = webhook_body("ord_1", "settled");
    let header = signature_header("not the secret", T0, body.as_bytes()).unwrap();
    let response = send(&app, webhook_request(&body, Some(&header))).await;
    assert_error(&response, StatusCode::FORBIDDEN, "invalid_signature");
}

#[actix_web::test]
async fn missing_secret() {
    let ctx = TestContext::new().without_secret();
    let app = ctx.app().await;
    let response = send(&app, signed_webhook(&webhook_body("ord_1", "settled"), T0)).await;
    assert_error(&response, StatusCode::INTERNAL_SERVER_ERROR, "missing_secret");
}

#[actix_web::test]
async fn signed_but_unreadable_body() {
    let ctx = TestContext::new();
    let app = ctx.app().await;
    for body in ["not json", r#"{"data":{"order_id":"ord_1"}}"#, r#"{"order_id":"ord_1","status":"settled"}"#] {
        let response = send(&app, signed_webhook(body, T0)).await;
        assert_error(&response, StatusCode::BAD_REQUEST, "invalid_request");
    }
}
