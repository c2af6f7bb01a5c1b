//! # Webhook signature format
//!
//! The payment processor signs every webhook call it makes, so that nobody else can tell us an order has settled.
//! The signature travels in the `x-webhook-signature` header:
//!
//! ```text
//!    x-webhook-signature: t=<unix_seconds>,v1=<base64_hmac>
//! ```
//!
//! where
//!   * `t` is the time of signing, in whole seconds since the Unix epoch.
//!   * `v1` is the standard base64 encoding of `HMAC-SHA256(secret, "{t}.{raw_body}")`. `t` is used exactly as it
//!     appears in the header and the body is the exact byte string received.
//!
//! Fields are comma-separated `key=value` pairs and may appear in any order. Only the first `=` separates key and
//! value, so base64 padding survives. Unknown keys are ignored.
//!
//! Checks run cheapest first: header presence, header format, freshness, secret presence, and only then the HMAC.
//! A signature is fresh if `|now - t| <= 300` seconds. The final comparison is constant-time.
use std::{fmt::Display, str::FromStr};

use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;
use thiserror::Error;

use crate::helpers::Secret;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";
pub const REPLAY_WINDOW_SECS: u64 = 300;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookSignatureError {
    #[error("No webhook signature was provided.")]
    MissingSignature,
    #[error("The webhook signature is not of the form t=<timestamp>,v1=<signature>. {0}")]
    InvalidSignatureFormat(String),
    #[error("The webhook signature is {0}s away from the current time, which is outside the replay window.")]
    SignatureExpired(u64),
    #[error("No webhook secret has been configured.")]
    MissingSecret,
    #[error("The webhook signature is invalid.")]
    InvalidSignature,
}

impl WebhookSignatureError {
    /// The machine-readable error code reported to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingSignature => "missing_signature",
            Self::InvalidSignatureFormat(_) => "invalid_signature_format",
            Self::SignatureExpired(_) => "signature_expired",
            Self::MissingSecret => "missing_secret",
            Self::InvalidSignature => "invalid_signature",
        }
    }
}

//--------------------------------------   SignatureHeader     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    raw_timestamp: String,
    timestamp: i64,
    signature: String,
}

impl SignatureHeader {
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The message that `v1` signs.
    pub fn signed_message(&self, body: &[u8]) -> Vec<u8> {
        signed_message(&self.raw_timestamp, body)
    }
}

impl FromStr for SignatureHeader {
    type Err = WebhookSignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut t = None;
        let mut v1 = None;
        for part in s.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| WebhookSignatureError::InvalidSignatureFormat(format!("'{part}' is not a key=value pair")))?;
            match key {
                "t" if t.is_none() => t = Some(value),
                "v1" if v1.is_none() => v1 = Some(value),
                _ => trace!("🔐️ Ignoring signature header field {key}"),
            }
        }
        let raw_timestamp =
            t.ok_or_else(|| WebhookSignatureError::InvalidSignatureFormat("The timestamp (t) is missing".into()))?;
        let timestamp = raw_timestamp.parse::<i64>().map_err(|e| {
            WebhookSignatureError::InvalidSignatureFormat(format!("'{raw_timestamp}' is not a valid timestamp. {e}"))
        })?;
        let signature = v1
            .filter(|s| !s.is_empty())
            .ok_or_else(|| WebhookSignatureError::InvalidSignatureFormat("The signature (v1) is missing".into()))?;
        Ok(Self { raw_timestamp: raw_timestamp.to_string(), timestamp, signature: signature.to_string() })
    }
}

impl Display for SignatureHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t={},v1={}", self.raw_timestamp, self.signature)
    }
}

fn signed_message(raw_timestamp: &str, body: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(raw_timestamp.len() + 1 + body.len());
    message.extend_from_slice(raw_timestamp.as_bytes());
    message.push(b'.');
    message.extend_from_slice(body);
    message
}

fn keyed_mac(secret: &str) -> Result<HmacSha256, WebhookSignatureError> {
    if secret.is_empty() {
        return Err(WebhookSignatureError::MissingSecret);
    }
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| WebhookSignatureError::MissingSecret)
}

/// Calculates the `v1` signature for the given body and timestamp.
pub fn sign_webhook(secret: &str, timestamp: i64, body: &[u8]) -> Result<String, WebhookSignatureError> {
    let mut mac = keyed_mac(secret)?;
    mac.update(&signed_message(&timestamp.to_string(), body));
    Ok(base64::encode(mac.finalize().into_bytes()))
}

/// Produces a complete `x-webhook-signature` header value for the given body and timestamp.
pub fn signature_header(secret: &str, timestamp: i64, body: &[u8]) -> Result<String, WebhookSignatureError> {
    let signature = sign_webhook(secret, timestamp, body)?;
    Ok(format!("t={timestamp},v1={signature}"))
}

/// Decides whether a webhook call is genuine.
///
/// This is a pure function of its inputs. `now` is the current time in Unix seconds.
pub fn verify_webhook_signature(
    body: &[u8],
    header: Option<&str>,
    secret: Option<&Secret<String>>,
    now: i64,
) -> Result<SignatureHeader, WebhookSignatureError> {
    let header = header.ok_or(WebhookSignatureError::MissingSignature)?.parse::<SignatureHeader>()?;
    let skew = now.checked_sub(header.timestamp).map(i64::unsigned_abs).unwrap_or(u64::MAX);
    if skew > REPLAY_WINDOW_SECS {
        return Err(WebhookSignatureError::SignatureExpired(skew));
    }
    let secret = secret.ok_or(WebhookSignatureError::MissingSecret)?;
    let mut mac = keyed_mac(secret.reveal())?;
    mac.update(&header.signed_message(body));
    let provided = base64::decode(&header.signature).map_err(|e| {
        debug!("🔐️ Webhook signature is not valid base64. {e}");
        WebhookSignatureError::InvalidSignature
    })?;
    // Only the canonical padded encoding is accepted
    if base64::encode(&provided) != header.signature {
        debug!("🔐️ Webhook signature is not in canonical base64 form");
        return Err(WebhookSignatureError::InvalidSignature);
    }
    // verify_slice compares in constant time, and treats a length mismatch as a plain mismatch
    mac.verify_slice(&provided).map_err(|_| WebhookSignatureError::InvalidSignature)?;
    Ok(header)
}
