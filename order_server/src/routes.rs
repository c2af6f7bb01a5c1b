//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go into a separate module.
//!
//! Handlers are async and must not block the worker thread. Store access goes through the engine APIs, which are
//! registered as app data by the server.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use order_engine::{
    db_types::{NewOrder, OrderId},
    order_objects::{WebhookPayload, WebhookStatusResponse},
    traits::{OrderManagement, WebhookManagement},
    OrderFlowApi,
    WebhookApi,
};

use crate::{
    config::AssetAllowList,
    data_objects::{JsonResponse, WebhookStatusQuery},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl OrderManagement);
/// Creates a new order with status `created`.
///
/// The amount must be positive, and the currency and token must be on the configured allow-list. Responds with
/// `201 Created` and the stored order.
pub async fn create_order<B: OrderManagement>(
    body: web::Json<NewOrder>,
    api: web::Data<OrderFlowApi<B>>,
    assets: web::Data<AssetAllowList>,
) -> Result<HttpResponse, ServerError> {
    let order = body.into_inner();
    trace!("💻️ Received new order request for {} {} via {}", order.amount, order.currency, order.token);
    order.validate().map_err(ServerError::InvalidRequest)?;
    assets.check(&order).map_err(|e| {
        debug!("💻️ Order rejected. {e}");
        ServerError::InvalidRequest(e)
    })?;
    let order = api.create_order(order).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(webhook_status => Get "/orders/webhook-status" impl WebhookManagement);
/// Reports what the payment processor has said about an order: `settled`, `failed`, or `unknown` if nothing yet.
pub async fn webhook_status<B: WebhookManagement>(
    query: web::Query<WebhookStatusQuery>,
    api: web::Data<WebhookApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = query.into_inner().id.filter(|s| !s.trim().is_empty()).ok_or(ServerError::MissingOrderId)?;
    let order_id = OrderId::new(id);
    trace!("💻️ Received webhook status request for {order_id}");
    let status = api.webhook_status(&order_id).await?;
    Ok(HttpResponse::Ok().json(WebhookStatusResponse { status }))
}

route!(order_status => Get "/orders/{order_id}" impl OrderManagement);
pub async fn order_status<B: OrderManagement>(
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ Received order status request for {order_id}");
    let view = api.resolve_order_status(&order_id).await?;
    Ok(HttpResponse::Ok().json(view))
}

//----------------------------------------------   Webhooks  ----------------------------------------------------
route!(elementpay_webhook => Post "/elementpay" impl WebhookManagement);
/// Receives the final status of an order from the payment processor.
///
/// This route must be wrapped in [`crate::middleware::WebhookSignatureMiddlewareFactory`]; by the time the handler
/// runs, the body is known to be genuine. Statuses other than `settled` and `failed` are acknowledged but not stored.
pub async fn elementpay_webhook<B: WebhookManagement>(
    body: web::Bytes,
    api: web::Data<WebhookApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payload = serde_json::from_slice::<WebhookPayload>(&body).map_err(|e| {
        debug!("💻️ Signed webhook body could not be read. {e}");
        ServerError::InvalidRequest(format!("Webhook body is not a valid payload. {e}"))
    })?;
    trace!("💻️ Received webhook for {} ({})", payload.data.order_id, payload.data.status);
    api.record_webhook_result(&payload).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success()))
}
