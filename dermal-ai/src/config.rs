//! Configuration resolution for dermal-ai
//!
//! Provides multi-tier configuration resolution with CLI → ENV → TOML → default
//! priority. clap merges the first two tiers before values reach this module.

use crate::services::anthropic_client::{
    AnthropicConfig, DEFAULT_BASE_URL as MODEL_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
};
use crate::services::payment_gateway::{
    DEFAULT_BASE_URL as PAYMENT_BASE_URL, DEFAULT_CURRENCY,
};
use dermal_common::config::{is_valid_secret, resolve, TomlConfig};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5780;
/// Face photos arrive base64-encoded inside the JSON body
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LOG_FILTER: &str = "dermal_ai=info,tower_http=info";

/// Values already merged from command line and environment
#[derive(Debug, Clone, Default)]
pub struct ServiceOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub model_api_key: Option<String>,
    pub model: Option<String>,
    pub payment_secret_key: Option<String>,
}

/// Payment processor settings; absent when no secret key is configured
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentConfig {
    pub secret_key: String,
    pub base_url: String,
    pub currency: String,
    pub timeout: Duration,
}

/// Fully resolved service settings
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub model: AnthropicConfig,
    pub payment: Option<PaymentConfig>,
    pub log_filter: String,
}

impl ServiceConfig {
    pub fn resolve(overrides: ServiceOverrides, toml: &TomlConfig) -> Self {
        let timeout = Duration::from_secs(resolve(None, toml.model.timeout_secs, DEFAULT_TIMEOUT_SECS));

        let model = AnthropicConfig {
            api_key: resolve_secret("Model API key", overrides.model_api_key, toml.model.api_key.as_deref()),
            model: resolve(overrides.model, toml.model.model.clone(), DEFAULT_MODEL.to_string()),
            base_url: resolve(None, toml.model.base_url.clone(), MODEL_BASE_URL.to_string()),
            max_tokens: resolve(None, toml.model.max_tokens, DEFAULT_MAX_TOKENS),
            timeout,
        };
        if model.api_key.is_none() {
            warn!("Model API key not configured; every analysis will use fallback content");
        }

        let payment = resolve_secret(
            "Payment secret key",
            overrides.payment_secret_key,
            toml.payment.secret_key.as_deref(),
        )
        .map(|secret_key| PaymentConfig {
            secret_key,
            base_url: resolve(None, toml.payment.base_url.clone(), PAYMENT_BASE_URL.to_string()),
            currency: resolve(None, toml.payment.currency.clone(), DEFAULT_CURRENCY.to_string()),
            timeout,
        });
        if payment.is_none() {
            warn!("Payment secret key not configured; payment endpoint will return 503");
        }

        Self {
            host: resolve(overrides.host, toml.server.host.clone(), DEFAULT_HOST.to_string()),
            port: resolve(overrides.port, toml.server.port, DEFAULT_PORT),
            max_body_bytes: resolve(None, toml.server.max_body_bytes, DEFAULT_MAX_BODY_BYTES),
            model,
            payment,
            log_filter: resolve(None, toml.logging.level.clone(), DEFAULT_LOG_FILTER.to_string()),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Resolve a secret from CLI/ENV then TOML
///
/// Blank values are ignored. Warns when both tiers carry a value.
pub fn resolve_secret(label: &str, cli_or_env: Option<String>, toml: Option<&str>) -> Option<String> {
    let cli_or_env = cli_or_env.filter(|key| is_valid_secret(key));
    let toml = toml.filter(|key| is_valid_secret(key));

    if cli_or_env.is_some() && toml.is_some() {
        warn!(
            "{} found in multiple sources: command line/environment, TOML. Using command line/environment (highest priority).",
            label
        );
    }

    if let Some(key) = cli_or_env {
        info!("{} loaded from command line/environment", label);
        return Some(key);
    }
    if let Some(key) = toml {
        info!("{} loaded from TOML config", label);
        return Some(key.to_string());
    }
    None
}
