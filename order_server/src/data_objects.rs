use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JsonResponse {
    pub fn success() -> Self {
        Self { success: true, message: None }
    }
}

/// The query string for `GET /orders/webhook-status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookStatusQuery {
    pub id: Option<String>,
}

/// The body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
