use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use order_engine::{
    db_types::OrderId,
    helpers::{signature_header, SIGNATURE_HEADER},
    order_objects::WebhookPayload,
};
use ordertools::{
    client::OrderServerClient,
    config::ToolsConfig,
    reconciler::{IntervalTicker, PollingPolicy, TrackedStatus},
    session::{OrderForm, OrderSession, DEFAULT_CURRENCY, DEFAULT_TOKEN},
};

#[derive(Parser, Debug)]
#[command(version = "1.0.0", about = "Command line tools for the ElementPay demo order server")]
pub struct Arguments {
    /// The order server's base URL. Defaults to EPD_SERVER_URL, or http://127.0.0.1:8360
    #[arg(short, long, global = true)]
    server: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[clap(name = "order", about = "Create an order and follow it until it settles, fails, or times out")]
    Order(OrderParams),
    #[clap(name = "status", about = "Print the current status of an order")]
    Status {
        /// The order to query
        order_id: String,
    },
    #[clap(name = "webhook", about = "Send a signed webhook to the server, as the payment processor would")]
    Webhook(WebhookParams),
    #[clap(name = "sign", about = "Print the signature header for a webhook body")]
    Sign(SignParams),
}

#[derive(Debug, Args)]
pub struct OrderParams {
    /// The amount to pay
    #[arg(short = 'a', long = "amount")]
    amount: f64,
    #[arg(short = 'c', long = "currency", default_value = DEFAULT_CURRENCY)]
    currency: String,
    /// The token the order is paid with
    #[arg(short = 't', long = "token", default_value = DEFAULT_TOKEN)]
    token: String,
    #[arg(short = 'n', long = "note")]
    note: Option<String>,
}

#[derive(Debug, Args)]
pub struct WebhookParams {
    #[arg(short = 'o', long = "order-id")]
    order_id: String,
    /// The status to report (settled or failed)
    #[arg(short = 's', long = "status", default_value = "settled")]
    status: String,
    /// The shared webhook secret. Defaults to EPD_WEBHOOK_SECRET
    #[arg(short = 'k', long = "secret")]
    secret: Option<String>,
}

#[derive(Debug, Args)]
pub struct SignParams {
    /// The exact webhook body to sign
    #[arg(short = 'b', long = "body")]
    body: String,
    #[arg(short = 'k', long = "secret")]
    secret: Option<String>,
    /// Unix time of the signature. Defaults to now
    #[arg(short = 't', long = "timestamp")]
    timestamp: Option<i64>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    let config = ToolsConfig::from_env_or_default().with_server(cli.server);
    let result = match cli.command {
        Command::Order(params) => place_order(config, params).await,
        Command::Status { order_id } => print_order_status(config, OrderId::new(order_id)).await,
        Command::Webhook(params) => send_webhook(config, params).await,
        Command::Sign(params) => print_signature(config, params),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn place_order(config: ToolsConfig, params: OrderParams) -> Result<()> {
    let client = OrderServerClient::new(&config.server)?;
    let mut form = OrderForm::new(params.amount, params.currency, params.token);
    form.note = params.note;
    let policy = PollingPolicy::default();
    let mut session = OrderSession::new(client, policy).with_form(form);
    loop {
        let Some(order_id) = session.submit().await? else {
            for (field, message) in session.errors().iter() {
                eprintln!("{field}: {message}");
            }
            return Err(anyhow!("The order form is invalid"));
        };
        println!("Order {order_id} created");
        let pb = spinner();
        pb.set_message(format!("Order {order_id} is created"));
        let mut ticker = IntervalTicker::new(policy.interval);
        let status = session.track(&mut ticker, |s| pb.set_message(format!("Order {order_id} is {s}"))).await?;
        match status {
            TrackedStatus::Settled => {
                pb.finish_with_message(format!("✅️ Order {order_id} settled"));
                return Ok(());
            },
            TrackedStatus::Failed => {
                pb.finish_with_message(format!("❌️ Order {order_id} failed"));
                return Ok(());
            },
            _ => pb.finish_with_message(format!("⌛️ Gave up waiting for order {order_id}")),
        }
        if !Confirm::new().with_prompt("Try again with the same order details?").interact()? {
            return Ok(());
        }
        let form = session.form().clone();
        session.reset();
        *session.form_mut() = form;
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:5} {msg} [{elapsed}]") {
        pb.set_style(
            style.tick_strings(&["🕛 ", "🕐 ", "🕑 ", "🕒 ", "🕓 ", "🕔 ", "🕕 ", "🕖 ", "🕗 ", "🕘 ", "🕙 ", "🕚 "]),
        );
    }
    pb
}

async fn print_order_status(config: ToolsConfig, order_id: OrderId) -> Result<()> {
    let client = OrderServerClient::new(&config.server)?;
    let view = client.order_status(&order_id).await?;
    let webhook = client.webhook_status(&order_id).await?;
    println!("----------------------------- Order {} -----------------------------", view.order_id);
    println!("Status: {}", view.status);
    println!("Webhook status: {webhook}");
    println!("Amount: {} {} via {}", view.amount, view.currency, view.token);
    println!("Created at: {}", view.created_at);
    Ok(())
}

async fn send_webhook(config: ToolsConfig, params: WebhookParams) -> Result<()> {
    let config = config.with_secret(params.secret);
    let secret = config.webhook_secret.ok_or_else(|| anyhow!("No webhook secret. Set EPD_WEBHOOK_SECRET or use --secret"))?;
    let body = serde_json::to_string(&WebhookPayload::new(OrderId::new(params.order_id), params.status))?;
    let header = signature_header(secret.reveal(), Utc::now().timestamp(), body.as_bytes())?;
    let client = OrderServerClient::new(&config.server)?;
    let res = client.send_webhook(body, Some(&header)).await?;
    println!("Webhook accepted: {}", res.success);
    Ok(())
}

fn print_signature(config: ToolsConfig, params: SignParams) -> Result<()> {
    let config = config.with_secret(params.secret);
    let secret = config.webhook_secret.ok_or_else(|| anyhow!("No webhook secret. Set EPD_WEBHOOK_SECRET or use --secret"))?;
    let timestamp = params.timestamp.unwrap_or_else(|| Utc::now().timestamp());
    let header = signature_header(secret.reveal(), timestamp, params.body.as_bytes())?;
    println!("{SIGNATURE_HEADER}: {header}");
    Ok(())
}
