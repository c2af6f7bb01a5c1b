mod secret;
mod webhook_signature;

pub use secret::Secret;
pub use webhook_signature::{
    sign_webhook,
    signature_header,
    verify_webhook_signature,
    SignatureHeader,
    WebhookSignatureError,
    REPLAY_WINDOW_SECS,
    SIGNATURE_HEADER,
};
