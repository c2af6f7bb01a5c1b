use std::time::Duration;

use anyhow::{anyhow, Result};
use log::*;
use order_engine::{
    db_types::{NewOrder, Order, OrderId},
    helpers::SIGNATURE_HEADER,
    order_objects::{OrderStatusView, WebhookStatus, WebhookStatusResponse},
};
use order_server::data_objects::{ErrorResponse, JsonResponse};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Response,
    StatusCode,
};
use url::Url;

use crate::reconciler::OrderBackend;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct OrderServerClient {
    client: Client,
    server: Url,
}

impl OrderServerClient {
    pub fn new(server: &str) -> Result<Self> {
        let server = Url::parse(server).map_err(|e| anyhow!("Invalid server URL {server}. {e}"))?;
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .user_agent("ElementPay Order Tools")
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, server })
    }

    pub fn server(&self) -> &str {
        self.server.as_str()
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.server.join(path).map_err(|e| anyhow!("Failed to join URL: {e}"))
    }

    pub async fn health(&self) -> Result<String> {
        let res = self.client.get(self.url("/health")?).send().await?;
        if !res.status().is_success() {
            return Err(api_error(res).await);
        }
        Ok(res.text().await?)
    }

    pub async fn create_order(&self, order: &NewOrder) -> Result<Order> {
        let res = self.client.post(self.url("/orders")?).json(order).send().await?;
        match res.status() {
            StatusCode::CREATED | StatusCode::OK => Ok(res.json().await?),
            _ => Err(api_error(res).await),
        }
    }

    pub async fn order_status(&self, order_id: &OrderId) -> Result<OrderStatusView> {
        let mut url = self.url("/orders/")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("The server URL cannot take a path"))?
            .pop_if_empty()
            .push(order_id.as_str());
        let res = self.client.get(url).send().await?;
        match res.status() {
            StatusCode::OK => Ok(res.json().await?),
            _ => Err(api_error(res).await),
        }
    }

    pub async fn webhook_status(&self, order_id: &OrderId) -> Result<WebhookStatus> {
        let url = self.url("/orders/webhook-status")?;
        let res = self.client.get(url).query(&[("id", order_id.as_str())]).send().await?;
        match res.status() {
            StatusCode::OK => Ok(res.json::<WebhookStatusResponse>().await?.status),
            _ => Err(api_error(res).await),
        }
    }

    /// Posts a raw webhook body with the given signature header, exactly as a payment processor would.
    pub async fn send_webhook(&self, body: String, signature: Option<&str>) -> Result<JsonResponse> {
        let mut req = self.client.post(self.url("/webhooks/elementpay")?).header("Content-Type", "application/json");
        if let Some(signature) = signature {
            req = req.header(SIGNATURE_HEADER, signature);
        }
        let res = req.body(body).send().await?;
        match res.status() {
            StatusCode::OK => Ok(res.json().await?),
            _ => Err(api_error(res).await),
        }
    }
}

async fn api_error(res: Response) -> anyhow::Error {
    let status = res.status();
    match res.json::<ErrorResponse>().await {
        Ok(e) => {
            debug!("Server responded with {status}. {}: {}", e.error, e.message);
            anyhow!("{} ({status}). {}", e.error, e.message)
        },
        Err(_) => anyhow!("Server responded with {status}"),
    }
}

impl OrderBackend for OrderServerClient {
    async fn create_order(&self, order: &NewOrder) -> Result<Order> {
        OrderServerClient::create_order(self, order).await
    }

    async fn order_status(&self, order_id: &OrderId) -> Result<OrderStatusView> {
        OrderServerClient::order_status(self, order_id).await
    }

    async fn webhook_status(&self, order_id: &OrderId) -> Result<WebhookStatus> {
        OrderServerClient::webhook_status(self, order_id).await
    }
}
