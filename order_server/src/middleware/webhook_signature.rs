//! Webhook signature middleware for Actix Web.
//!
//! The payment processor signs every webhook call with a secret shared with this server. The signature travels in the
//! `x-webhook-signature` header, in the form `t=<unix seconds>,v1=<base64 hmac>`. See
//! [`order_engine::helpers::verify_webhook_signature`] for the details of the scheme.
//!
//! Wrap the webhook scope with this middleware. Requests that fail verification never reach the handler, and are
//! answered with the matching error code. Verified requests are passed on with their body intact.

use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::*;
use order_engine::{
    helpers::{verify_webhook_signature, Secret, WebhookSignatureError, SIGNATURE_HEADER},
    traits::{Clock, SystemClock},
};

use crate::errors::ServerError;

pub struct WebhookSignatureMiddlewareFactory {
    secret: Option<Secret<String>>,
    clock: Arc<dyn Clock>,
}

impl WebhookSignatureMiddlewareFactory {
    pub fn new(secret: Option<Secret<String>>) -> Self {
        Self { secret, clock: Arc::new(SystemClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for WebhookSignatureMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = WebhookSignatureMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(WebhookSignatureMiddlewareService {
            secret: self.secret.clone(),
            clock: Arc::clone(&self.clock),
            service: Rc::new(service),
        }))
    }
}

pub struct WebhookSignatureMiddlewareService<S> {
    secret: Option<Secret<String>>,
    clock: Arc<dyn Clock>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for WebhookSignatureMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.secret.clone();
        let clock = Arc::clone(&self.clock);
        Box::pin(async move {
            trace!("🔐️ Checking webhook signature for request");
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {e:?}");
                ServerError::InvalidRequest("Failed to extract request data.".into())
            })?;
            let header = match req.headers().get(SIGNATURE_HEADER).map(|v| v.to_str()) {
                None => None,
                Some(Ok(s)) => Some(s.to_string()),
                Some(Err(e)) => {
                    warn!("🔐️ Webhook refused. The signature header is not text. {e}");
                    let e = WebhookSignatureError::InvalidSignatureFormat(format!("The header is not text. {e}"));
                    return Err(ServerError::from(e).into());
                },
            };
            let now = clock.now().timestamp();
            match verify_webhook_signature(data.as_ref(), header.as_deref(), secret.as_ref(), now) {
                Ok(signature) => {
                    trace!("🔐️ Webhook signature check ✅️ (signed at {})", signature.timestamp());
                    req.set_payload(bytes_to_payload(data));
                    service.call(req).await
                },
                Err(e) => {
                    match &e {
                        WebhookSignatureError::MissingSecret => error!("🔐️ Webhook refused. {e}"),
                        _ => warn!("🔐️ Webhook refused. {e}"),
                    }
                    Err(ServerError::from(e).into())
                },
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
