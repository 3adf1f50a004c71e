//! CLI configuration loaded from environment variables.

use anyhow::{Context, Result};
use smartfee_client::ApiKey;
use smartfee_core::Environment;

/// Wallet gateway settings, needed only by `plan`.
#[derive(Clone, Debug)]
pub struct ExpressConfig {
    /// Base URL of the Express gateway.
    pub url: String,
    /// Coin ticker, e.g. `btc` or `tbtc`.
    pub coin: String,
    /// Wallet identifier.
    pub wallet_id: String,
    /// Gateway access token.
    pub access_token: ApiKey,
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Smart Fee API key, if set in the environment.
    pub api_key: Option<ApiKey>,
    /// Fee service deployment.
    pub environment: Environment,
    /// Express gateway, if fully configured.
    pub express: Option<ExpressConfig>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = var("SMARTFEE_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .map(ApiKey::new);

        let mut environment: Environment = var("SMARTFEE_ENV")
            .unwrap_or_else(|| "staging".to_string())
            .parse()
            .context("SMARTFEE_ENV must be 'staging' or 'production'")?;
        if let Some(url) = var("SMARTFEE_URL") {
            environment = Environment::custom(environment.name().to_string(), url);
        }

        let express = match var("SMARTFEE_EXPRESS_URL") {
            Some(url) => Some(ExpressConfig {
                url,
                coin: var("SMARTFEE_COIN").unwrap_or_else(|| "btc".to_string()),
                wallet_id: var("SMARTFEE_WALLET_ID")
                    .context("SMARTFEE_WALLET_ID is required with SMARTFEE_EXPRESS_URL")?,
                access_token: var("SMARTFEE_ACCESS_TOKEN")
                    .map(ApiKey::new)
                    .context("SMARTFEE_ACCESS_TOKEN is required with SMARTFEE_EXPRESS_URL")?,
            }),
            None => None,
        };

        Ok(Config {
            api_key,
            environment,
            express,
        })
    }
}
