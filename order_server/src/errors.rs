use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use order_engine::{db_types::OrderId, helpers::WebhookSignatureError, OrderFlowError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("The request is invalid. {0}")]
    InvalidRequest(String),
    #[error("An order id must be provided.")]
    MissingOrderId,
    #[error("Order {0} does not exist.")]
    OrderNotFound(OrderId),
    #[error("{0}")]
    Webhook(#[from] WebhookSignatureError),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ServerError {
    /// The machine-readable code that goes in the `error` field of the response body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::MissingOrderId => "missing_id",
            Self::OrderNotFound(_) => "order_not_found",
            Self::Webhook(e) => e.code(),
            Self::InitializeError(_) | Self::BackendError(_) | Self::IOError(_) | Self::Unspecified(_) => "server_error",
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::MissingOrderId => StatusCode::BAD_REQUEST,
            Self::OrderNotFound(_) => StatusCode::NOT_FOUND,
            Self::Webhook(e) => match e {
                WebhookSignatureError::MissingSignature => StatusCode::BAD_REQUEST,
                WebhookSignatureError::InvalidSignatureFormat(_) => StatusCode::BAD_REQUEST,
                WebhookSignatureError::SignatureExpired(_) => StatusCode::UNAUTHORIZED,
                WebhookSignatureError::InvalidSignature => StatusCode::FORBIDDEN,
                WebhookSignatureError::MissingSecret => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(json!({ "error": self.code(), "message": self.to_string() }).to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::OrderNotFound(id) => Self::OrderNotFound(id),
            OrderFlowError::InvalidOrder(s) => Self::InvalidRequest(s),
            OrderFlowError::Store(e) => Self::BackendError(e.to_string()),
        }
    }
}
