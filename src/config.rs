//! Configuration management
//!
//! Settings come from a `.env` file / process environment (the usual path)
//! or from a TOML file. Every tuning knob has a default; only the
//! connection settings are required.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Router configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    // Network
    pub rpc_url: String,
    pub chain_id: u64,

    // Wallet
    pub private_key: String,

    /// JSON registry of token / pool / router addresses per chain id
    pub registry_file: String,

    /// Quote deadline for untrusted venues
    #[serde(default = "default_untrusted_timeout_ms")]
    pub untrusted_timeout_ms: u64,

    /// Added on top of a successful gas estimate, in percent
    #[serde(default = "default_gas_buffer_percent")]
    pub gas_buffer_percent: u64,

    /// Gas limit used when estimation fails
    #[serde(default = "default_fallback_gas_limit")]
    pub fallback_gas_limit: u64,

    /// Decimal places shown for balances and shares
    #[serde(default = "default_display_precision")]
    pub display_precision: usize,

    /// Unit decimals assumed for tokens and LP shares
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u8,

    /// Poll period of the chain watcher
    #[serde(default = "default_watch_interval_ms")]
    pub watch_interval_ms: u64,
}

fn default_untrusted_timeout_ms() -> u64 { 5000 }
fn default_gas_buffer_percent() -> u64 { 20 }
fn default_fallback_gas_limit() -> u64 { 500_000 }
fn default_display_precision() -> usize { 4 }
fn default_token_decimals() -> u8 { 18 }
fn default_watch_interval_ms() -> u64 { 2000 }

impl RouterConfig {
    /// Connection-only config with every tuning knob at its default.
    pub fn new(rpc_url: &str, chain_id: u64, private_key: &str, registry_file: &str) -> Self {
        Self {
            rpc_url: rpc_url.to_string(),
            chain_id,
            private_key: private_key.to_string(),
            registry_file: registry_file.to_string(),
            untrusted_timeout_ms: default_untrusted_timeout_ms(),
            gas_buffer_percent: default_gas_buffer_percent(),
            fallback_gas_limit: default_fallback_gas_limit(),
            display_precision: default_display_precision(),
            token_decimals: default_token_decimals(),
            watch_interval_ms: default_watch_interval_ms(),
        }
    }

    pub fn untrusted_timeout(&self) -> Duration {
        Duration::from_millis(self.untrusted_timeout_ms)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }

    /// Load a TOML config file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

/// Load config from `.env` (if present) plus the process environment.
pub fn load_config() -> Result<RouterConfig> {
    dotenv::dotenv().ok();
    from_env()
}

/// Load config from a specific env file, e.g. `.env.localhost`.
pub fn load_config_from_file(path: &str) -> Result<RouterConfig> {
    dotenv::from_filename(path).with_context(|| format!("Failed to load {}", path))?;
    from_env()
}

fn from_env() -> Result<RouterConfig> {
    let mut config = RouterConfig::new(
        &std::env::var("RPC_URL").context("RPC_URL not set")?,
        std::env::var("CHAIN_ID")
            .context("CHAIN_ID not set")?
            .parse()
            .context("CHAIN_ID is not a number")?,
        &std::env::var("PRIVATE_KEY").context("PRIVATE_KEY not set")?,
        &std::env::var("REGISTRY_FILE").unwrap_or_else(|_| "config.json".to_string()),
    );

    if let Some(v) = optional_env("UNTRUSTED_TIMEOUT_MS")? {
        config.untrusted_timeout_ms = v;
    }
    if let Some(v) = optional_env("GAS_BUFFER_PERCENT")? {
        config.gas_buffer_percent = v;
    }
    if let Some(v) = optional_env("FALLBACK_GAS_LIMIT")? {
        config.fallback_gas_limit = v;
    }
    if let Some(v) = optional_env("DISPLAY_PRECISION")? {
        config.display_precision = v;
    }
    if let Some(v) = optional_env("TOKEN_DECIMALS")? {
        config.token_decimals = v;
    }
    if let Some(v) = optional_env("WATCH_INTERVAL_MS")? {
        config.watch_interval_ms = v;
    }

    Ok(config)
}

fn optional_env<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        Err(_) => Ok(None),
    }
}
