use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Generates a fresh identifier of the form `ord_` followed by 8 lowercase hex characters.
    pub fn random() -> Self {
        Self(format!("ord_{:08x}", rand::random::<u32>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been accepted and nothing has happened to it yet.
    Created,
    /// Payment is underway. This status is only ever displayed, never stored.
    Processing,
    /// The payment completed successfully.
    Settled,
    /// The payment did not go through.
    Failed,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled | Self::Failed)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Created => write!(f, "created"),
            OrderStatusType::Processing => write!(f, "processing"),
            OrderStatusType::Settled => write!(f, "settled"),
            OrderStatusType::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "processing" => Ok(Self::Processing),
            "settled" => Ok(Self::Settled),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

impl From<FinalStatus> for OrderStatusType {
    fn from(value: FinalStatus) -> Self {
        match value {
            FinalStatus::Settled => Self::Settled,
            FinalStatus::Failed => Self::Failed,
        }
    }
}

//--------------------------------------     FinalStatus       ---------------------------------------------------------
/// The two outcomes an order can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalStatus {
    Settled,
    Failed,
}

impl Display for FinalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        OrderStatusType::from(*self).fmt(f)
    }
}

impl FromStr for FinalStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "settled" => Ok(Self::Settled),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

impl TryFrom<OrderStatusType> for FinalStatus {
    type Error = ConversionError;

    fn try_from(value: OrderStatusType) -> Result<Self, Self::Error> {
        match value {
            OrderStatusType::Settled => Ok(Self::Settled),
            OrderStatusType::Failed => Ok(Self::Failed),
            other => Err(ConversionError(format!("{other} is not a final status"))),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub amount: f64,
    pub currency: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(order_id: OrderId, order: NewOrder, created_at: DateTime<Utc>) -> Self {
        Self {
            order_id,
            status: OrderStatusType::Created,
            amount: order.amount,
            currency: order.currency,
            token: order.token,
            note: order.note,
            created_at,
        }
    }
}

impl Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Order {} [{}] {} {} via {}", self.order_id, self.status, self.amount, self.currency, self.token)
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
/// An order creation request, as submitted by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub amount: f64,
    pub currency: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(amount: f64, currency: S, token: S) -> Self {
        Self { amount, currency: currency.into(), token: token.into(), note: None }
    }

    pub fn with_note<S: Into<String>>(mut self, note: S) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Checks the invariants every stored order must satisfy. Allow-lists for currencies and tokens are a concern of
    /// the caller, not of the engine.
    pub fn validate(&self) -> Result<(), String> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(format!("Amount must be greater than 0, but was {}", self.amount));
        }
        if self.currency.trim().is_empty() {
            return Err("Currency is required".into());
        }
        if self.token.trim().is_empty() {
            return Err("Token is required".into());
        }
        Ok(())
    }
}

//--------------------------------------     WebhookRecord     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRecord {
    pub status: FinalStatus,
    pub received_at: DateTime<Utc>,
}

impl WebhookRecord {
    pub fn new(status: FinalStatus, received_at: DateTime<Utc>) -> Self {
        Self { status, received_at }
    }
}
