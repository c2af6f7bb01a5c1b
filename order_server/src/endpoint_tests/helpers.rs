use std::sync::Arc;

use actix_http::Request;
use actix_web::{
    body::{to_bytes, MessageBody},
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test,
    App,
    Error,
};
use chrono::{TimeZone, Utc};
use log::debug;
use order_engine::{
    db_types::FinalStatus,
    events::EventProducers,
    helpers::{signature_header, Secret, SIGNATURE_HEADER},
    status_simulator::FixedOutcome,
    traits::ManualClock,
    MemoryDatabase,
    OrderFlowApi,
    WebhookApi,
};
use serde_json::Value;

use crate::{config::AssetAllowList, middleware::WebhookSignatureMiddlewareFactory, server::configure_service};

pub const SECRET: &str = "whsec_endpoint_tests";
/// The time on the test clock when a test starts.
pub const T0: i64 = 1_700_000_000;

pub struct TestContext {
    pub clock: ManualClock,
    pub db: MemoryDatabase,
    pub secret: Option<String>,
    pub outcome: FinalStatus,
}

impl TestContext {
    pub fn new() -> Self {
        let _ = env_logger::try_init();
        let start = Utc.timestamp_opt(T0, 0).unwrap();
        Self {
            clock: ManualClock::new(start),
            db: MemoryDatabase::new(),
            secret: Some(SECRET.to_string()),
            outcome: FinalStatus::Settled,
        }
    }

    pub fn without_secret(mut self) -> Self {
        self.secret = None;
        self
    }

    pub fn with_outcome(mut self, outcome: FinalStatus) -> Self {
        self.outcome = outcome;
        self
    }

    pub async fn app(
        &self,
    ) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
        let clock = Arc::new(self.clock.clone());
        let orders_api = OrderFlowApi::new(self.db.clone(), EventProducers::default())
            .with_clock(clock.clone())
            .with_outcome_source(Arc::new(FixedOutcome(self.outcome)));
        let webhook_api = WebhookApi::new(self.db.clone(), EventProducers::default()).with_clock(clock.clone());
        let secret = self.secret.clone().map(Secret::new);
        let signatures = WebhookSignatureMiddlewareFactory::new(secret).with_clock(clock);
        let assets = AssetAllowList::default();
        test::init_service(
            App::new().configure(move |cfg| configure_service(cfg, orders_api, webhook_api, assets, signatures)),
        )
        .await
    }
}

/// Calls the service and returns the status and body, whether the request was handled or refused by a middleware.
pub async fn send<S, B>(app: &S, req: Request) -> (StatusCode, String)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    debug!("Making request");
    match test::try_call_service(app, req).await {
        Ok(res) => {
            let status = res.status();
            let body = to_bytes(res.into_body()).await.map(|b| b.to_vec()).unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = to_bytes(res.into_body()).await.map(|b| b.to_vec()).unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Not JSON ({e}): {body}"))
}

/// Asserts that the response is an error with the given status and code, and returns the error message.
pub fn assert_error(response: &(StatusCode, String), status: StatusCode, code: &str) -> String {
    assert_eq!(response.0, status, "body: {}", response.1);
    let body = json(&response.1);
    assert_eq!(body["error"], code, "body: {}", response.1);
    body["message"].as_str().unwrap_or_default().to_string()
}

pub fn webhook_body(order_id: &str, status: &str) -> String {
    serde_json::json!({ "data": { "order_id": order_id, "status": status } }).to_string()
}

/// A webhook request signed with [`SECRET`] at time `t`.
pub fn signed_webhook(body: &str, t: i64) -> Request {
    let header = signature_header(SECRET, t, body.as_bytes()).unwrap();
    webhook_request(body, Some(&header))
}

pub fn webhook_request(body: &str, header: Option<&str>) -> Request {
    let mut req = test::TestRequest::post().uri("/webhooks/elementpay").set_payload(body.to_string());
    if let Some(header) = header {
        req = req.insert_header((SIGNATURE_HEADER, header));
    }
    req.to_request()
}
