use std::{future::Future, net::SocketAddr, pin::Pin, sync::Arc, time::Duration};

use actix_web::{
    dev::Server,
    error::JsonPayloadError,
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpRequest,
    HttpServer,
};
use log::*;
use order_engine::{
    events::{EventHandlers, EventHooks, EventProducers, OrderResolvedEvent, WebhookReceivedEvent},
    status_simulator::OutcomeSource,
    traits::{Clock, OrderManagement, SystemClock, WebhookManagement},
    MemoryDatabase,
    OrderFlowApi,
    WebhookApi,
};

use crate::{
    config::{AssetAllowList, ServerConfig},
    errors::ServerError,
    middleware::WebhookSignatureMiddlewareFactory,
    routes::{health, CreateOrderRoute, ElementpayWebhookRoute, OrderStatusRoute, WebhookStatusRoute},
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = MemoryDatabase::new();
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, logging_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let (srv, addr) = create_server_instance(config, db, producers)?;
    info!("💻️ Listening on {addr}");
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Hooks that write engine events to the log.
pub fn logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_resolved(|ev: OrderResolvedEvent| {
            Box::pin(async move {
                info!("📬️ Order {} was resolved as {}", ev.order.order_id, ev.order.status);
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        })
        .on_webhook_received(|ev: WebhookReceivedEvent| {
            Box::pin(async move {
                if ev.is_conflict() {
                    warn!(
                        "📬️ The payment processor changed its mind about order {}: {} -> {}",
                        ev.order_id,
                        ev.replaced.map(|s| s.to_string()).unwrap_or_default(),
                        ev.status
                    );
                } else {
                    info!("📬️ The payment processor reported order {} as {}", ev.order_id, ev.status);
                }
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
    hooks
}

/// Binds the server to the configured address and returns it, unstarted, with the address it is bound to.
///
/// Port 0 binds to a free port, which is handy in tests.
pub fn create_server_instance(
    config: ServerConfig,
    db: MemoryDatabase,
    producers: EventProducers,
) -> Result<(Server, SocketAddr), ServerError> {
    create_server_instance_with_clock(config, db, producers, Arc::new(SystemClock))
}

pub fn create_server_instance_with_clock(
    config: ServerConfig,
    db: MemoryDatabase,
    producers: EventProducers,
    clock: Arc<dyn Clock>,
) -> Result<(Server, SocketAddr), ServerError> {
    // One source for all workers, so that a seeded simulator draws a single reproducible sequence
    let outcomes: Arc<dyn OutcomeSource> = Arc::new(config.simulator.outcome_source());
    let assets = config.allowed_assets.clone();
    let secret = config.webhook_secret.clone();
    let server = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone())
            .with_clock(Arc::clone(&clock))
            .with_outcome_source(Arc::clone(&outcomes));
        let webhook_api = WebhookApi::new(db.clone(), producers.clone()).with_clock(Arc::clone(&clock));
        let signatures = WebhookSignatureMiddlewareFactory::new(secret.clone()).with_clock(Arc::clone(&clock));
        let assets = assets.clone();
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("epd::access_log"))
            .configure(move |cfg| configure_service(cfg, orders_api, webhook_api, assets, signatures))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?;
    let addr = server
        .addrs()
        .first()
        .copied()
        .ok_or_else(|| ServerError::InitializeError(format!("Could not bind to {}:{}", config.host, config.port)))?;
    Ok((server.run(), addr))
}

/// Registers the app data and every route of the order server.
pub fn configure_service<B>(
    cfg: &mut web::ServiceConfig,
    orders_api: OrderFlowApi<B>,
    webhook_api: WebhookApi<B>,
    assets: AssetAllowList,
    signatures: WebhookSignatureMiddlewareFactory,
) where
    B: OrderManagement + WebhookManagement + 'static,
{
    let webhook_scope = web::scope("/webhooks").wrap(signatures).service(ElementpayWebhookRoute::<B>::new());
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::Data::new(orders_api))
        .app_data(web::Data::new(webhook_api))
        .app_data(web::Data::new(assets))
        .service(health)
        .service(CreateOrderRoute::<B>::new())
        // Must be registered before the order status route, which would otherwise match it
        .service(WebhookStatusRoute::<B>::new())
        .service(OrderStatusRoute::<B>::new())
        .service(webhook_scope);
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Could not read JSON body. {err}");
    ServerError::InvalidRequest(err.to_string()).into()
}
