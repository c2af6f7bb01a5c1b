use std::env;

use order_engine::helpers::Secret;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8360";

/// Where the server is, and the webhook secret for signing test webhooks. Command line flags take precedence.
#[derive(Debug, Clone)]
pub struct ToolsConfig {
    pub server: String,
    pub webhook_secret: Option<Secret<String>>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self { server: DEFAULT_SERVER_URL.to_string(), webhook_secret: None }
    }
}

impl ToolsConfig {
    pub fn from_env_or_default() -> Self {
        let server = env::var("EPD_SERVER_URL").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| DEFAULT_SERVER_URL.into());
        let webhook_secret = env::var("EPD_WEBHOOK_SECRET")
            .or_else(|_| env::var("WEBHOOK_SECRET"))
            .ok()
            .filter(|s| !s.is_empty())
            .map(Secret::new);
        Self { server, webhook_secret }
    }

    pub fn with_server(mut self, server: Option<String>) -> Self {
        if let Some(server) = server {
            self.server = server;
        }
        self
    }

    pub fn with_secret(mut self, secret: Option<String>) -> Self {
        if let Some(secret) = secret.filter(|s| !s.is_empty()) {
            self.webhook_secret = Some(Secret::new(secret));
        }
        self
    }
}
