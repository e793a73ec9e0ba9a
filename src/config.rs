use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("Missing config: {0}")]
pub struct ConfigError(&'static str);

/// Static service configuration, resolved once at startup and shared
/// read-only through the router state for the life of the process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Webhook signing secret from the Stripe dashboard (whsec_...).
    pub webhook_secret: String,
    /// Private API key (sk_test_... or sk_live_...); also selects test vs
    /// live data on Stripe's side.
    pub api_key: String,
    /// Sender address, validated in advance with SES.
    pub sender: String,
    pub recipient: String,
    pub subject: String,
    pub region: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            webhook_secret: required("WEBHOOK_SECRET")?,
            api_key: required("STRIPE_SECRET_KEY")?,
            sender: required("SENDER_ADDRESS")?,
            recipient: required("RECIPIENT_ADDRESS")?,
            subject: env::var("SUBJECT").unwrap_or_else(|_| "order".into()),
            region: env::var("AWS_REGION").unwrap_or_else(|_| "us-west-2".into()),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError(name))
}
