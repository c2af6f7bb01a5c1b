use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{ConversionError, FinalStatus, Order, OrderId, OrderStatusType};

/// The response to an order status query. The status is the *displayed* status, which may be `processing` even
/// though that value is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusView {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub amount: f64,
    pub currency: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl OrderStatusView {
    pub fn new(order: Order, status: OrderStatusType) -> Self {
        Self {
            order_id: order.order_id,
            status,
            amount: order.amount,
            currency: order.currency,
            token: order.token,
            created_at: order.created_at,
        }
    }
}

impl From<Order> for OrderStatusView {
    fn from(order: Order) -> Self {
        let status = order.status;
        Self::new(order, status)
    }
}

/// What the payment processor has told us about an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    Settled,
    Failed,
    /// No webhook has been received for the order.
    Unknown,
}

impl WebhookStatus {
    pub fn final_status(&self) -> Option<FinalStatus> {
        match self {
            Self::Settled => Some(FinalStatus::Settled),
            Self::Failed => Some(FinalStatus::Failed),
            Self::Unknown => None,
        }
    }
}

impl From<Option<FinalStatus>> for WebhookStatus {
    fn from(value: Option<FinalStatus>) -> Self {
        match value {
            Some(FinalStatus::Settled) => Self::Settled,
            Some(FinalStatus::Failed) => Self::Failed,
            None => Self::Unknown,
        }
    }
}

impl Display for WebhookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Settled => write!(f, "settled"),
            Self::Failed => write!(f, "failed"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for WebhookStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(Self::Unknown),
            s => s.parse::<FinalStatus>().map(|f| Self::from(Some(f))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookStatusResponse {
    pub status: WebhookStatus,
}

/// The JSON body a payment processor posts to the webhook endpoint.
///
/// `status` is kept as free text: statuses other than `settled` and `failed` are accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub data: WebhookData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookData {
    pub order_id: OrderId,
    pub status: String,
}

impl WebhookPayload {
    pub fn new<S: Into<String>>(order_id: OrderId, status: S) -> Self {
        Self { data: WebhookData { order_id, status: status.into() } }
    }

    /// The terminal status carried by this payload, if any.
    pub fn final_status(&self) -> Option<FinalStatus> {
        self.data.status.parse().ok()
    }
}
