use std::env;

use log::*;
use order_engine::{
    db_types::NewOrder,
    helpers::Secret,
    status_simulator::{RandomOutcome, DEFAULT_SETTLE_PROBABILITY},
};

const DEFAULT_EPD_HOST: &str = "127.0.0.1";
const DEFAULT_EPD_PORT: u16 = 8360;
const DEFAULT_CURRENCIES: &str = "KES";
const DEFAULT_TOKENS: &str = "USDC";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// The shared secret for webhook signatures. When `None`, every webhook call is refused.
    pub webhook_secret: Option<Secret<String>>,
    pub allowed_assets: AssetAllowList,
    pub simulator: SimulatorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_EPD_HOST.to_string(),
            port: DEFAULT_EPD_PORT,
            webhook_secret: None,
            allowed_assets: AssetAllowList::default(),
            simulator: SimulatorConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn with_webhook_secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.webhook_secret = non_empty_secret(secret.into());
        self
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("EPD_HOST").ok().unwrap_or_else(|| DEFAULT_EPD_HOST.into());
        let port = env::var("EPD_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for EPD_PORT. {e} Using the default, {DEFAULT_EPD_PORT}, instead."
                    );
                    DEFAULT_EPD_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_EPD_PORT);
        let webhook_secret = env::var("EPD_WEBHOOK_SECRET")
            .or_else(|_| env::var("WEBHOOK_SECRET"))
            .ok()
            .and_then(non_empty_secret);
        if webhook_secret.is_none() {
            warn!(
                "🪛️ EPD_WEBHOOK_SECRET is not set. Webhook calls will be rejected until it is set to the secret shared \
                 with the payment processor."
            );
        }
        let allowed_assets = AssetAllowList::from_env_or_default();
        let simulator = SimulatorConfig::from_env_or_default();
        Self { host, port, webhook_secret, allowed_assets, simulator }
    }
}

fn non_empty_secret(s: String) -> Option<Secret<String>> {
    (!s.is_empty()).then(|| Secret::new(s))
}

//-------------------------------------------------  AssetAllowList  ---------------------------------------------------
/// The currencies and tokens that new orders may use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetAllowList {
    pub currencies: Vec<String>,
    pub tokens: Vec<String>,
}

impl Default for AssetAllowList {
    fn default() -> Self {
        Self { currencies: parse_list(DEFAULT_CURRENCIES), tokens: parse_list(DEFAULT_TOKENS) }
    }
}

impl AssetAllowList {
    pub fn new<S: AsRef<str>>(currencies: &[S], tokens: &[S]) -> Self {
        let own = |v: &[S]| v.iter().map(|s| s.as_ref().to_string()).collect();
        Self { currencies: own(currencies), tokens: own(tokens) }
    }

    pub fn from_env_or_default() -> Self {
        let currencies = list_from_env("EPD_ALLOWED_CURRENCIES", DEFAULT_CURRENCIES);
        let tokens = list_from_env("EPD_ALLOWED_TOKENS", DEFAULT_TOKENS);
        info!("🪛️ Accepting orders in [{}] paid with [{}]", currencies.join(", "), tokens.join(", "));
        Self { currencies, tokens }
    }

    pub fn check(&self, order: &NewOrder) -> Result<(), String> {
        if !self.currencies.iter().any(|c| c == &order.currency) {
            return Err(format!("Unsupported currency: {}", order.currency));
        }
        if !self.tokens.iter().any(|t| t == &order.token) {
            return Err(format!("Unsupported token: {}", order.token));
        }
        Ok(())
    }
}

fn parse_list(s: &str) -> Vec<String> {
    s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}

fn list_from_env(name: &str, default: &str) -> Vec<String> {
    let list = env::var(name).map(|s| parse_list(&s)).unwrap_or_default();
    if list.is_empty() {
        debug!("🪛️ {name} is not set. Using the default, {default}.");
        parse_list(default)
    } else {
        list
    }
}

//-------------------------------------------------  SimulatorConfig  --------------------------------------------------
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulatorConfig {
    /// The chance that an order settles rather than fails.
    pub settle_probability: f64,
    /// When set, outcomes are drawn from a reproducible sequence.
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self { settle_probability: DEFAULT_SETTLE_PROBABILITY, seed: None }
    }
}

impl SimulatorConfig {
    pub fn from_env_or_default() -> Self {
        let settle_probability = env::var("EPD_SETTLE_PROBABILITY")
            .ok()
            .and_then(|s| match s.parse::<f64>() {
                Ok(p) if (0.0..=1.0).contains(&p) => Some(p),
                Ok(p) => {
                    warn!("🪛️ EPD_SETTLE_PROBABILITY must be between 0 and 1, but was {p}. Using the default.");
                    None
                },
                Err(e) => {
                    warn!("🪛️ Invalid configuration value for EPD_SETTLE_PROBABILITY. {e}");
                    None
                },
            })
            .unwrap_or(DEFAULT_SETTLE_PROBABILITY);
        let seed = env::var("EPD_SIMULATOR_SEED").ok().and_then(|s| {
            s.parse::<u64>()
                .map_err(|e| warn!("🪛️ Invalid configuration value for EPD_SIMULATOR_SEED. {e}"))
                .ok()
        });
        if let Some(seed) = seed {
            info!("🪛️ The status simulator is seeded with {seed}. Outcomes are reproducible.");
        }
        Self { settle_probability, seed }
    }

    pub fn outcome_source(&self) -> RandomOutcome {
        match self.seed {
            Some(seed) => RandomOutcome::seeded(seed, self.settle_probability),
            None => RandomOutcome::new(self.settle_probability),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn allow_list_defaults() {
        let list = AssetAllowList::default();
        assert!(list.check(&NewOrder::new(1.0, "KES", "USDC")).is_ok());
        assert_eq!(list.check(&NewOrder::new(1.0, "USD", "USDC")).unwrap_err(), "Unsupported currency: USD");
        assert_eq!(list.check(&NewOrder::new(1.0, "KES", "DAI")).unwrap_err(), "Unsupported token: DAI");
    }

    #[test]
    fn lists_are_trimmed() {
        assert_eq!(parse_list(" KES, UGX ,,TZS"), vec!["KES", "UGX", "TZS"]);
        assert!(parse_list(" , ").is_empty());
    }

    #[test]
    fn empty_secrets_are_no_secret() {
        assert!(ServerConfig::default().with_webhook_secret("").webhook_secret.is_none());
        let config = ServerConfig::default().with_webhook_secret("whsec");
        assert_eq!(config.webhook_secret.map(|s| s.reveal().clone()), Some("whsec".to_string()));
    }
}
