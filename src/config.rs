use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

use crate::gateway::client::{
    DEFAULT_BREAKER_FAILURES, DEFAULT_BREAKER_RESET_SECS, DEFAULT_LIVE_URL, DEFAULT_TEST_URL,
    DEFAULT_TIMEOUT_SECS,
};
use crate::services::signer::SignatureDigest;
use crate::validation::{validate_currency, validate_enum, validate_required, ALLOWED_CHANNELS};

#[derive(Debug, Clone)]
pub struct Config {
    pub website_key: String,
    pub private_key_path: PathBuf,
    pub gateway_url: String,
    pub test_gateway_url: String,
    pub culture: String,
    pub channel: String,
    pub currency: String,
    pub signature_digest: SignatureDigest,
    pub timeout_secs: u64,
    pub breaker_failures: u32,
    pub breaker_reset_secs: u64,
    pub push_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let website_key = lookup("BUCKAROO_WEBSITE_KEY").context("BUCKAROO_WEBSITE_KEY is required")?;
        validate_required("BUCKAROO_WEBSITE_KEY", &website_key)?;

        let private_key_path = lookup("BUCKAROO_PRIVATE_KEY_PATH")
            .map(PathBuf::from)
            .context("BUCKAROO_PRIVATE_KEY_PATH is required")?;

        let channel = or_default("BUCKAROO_CHANNEL", "Web");
        validate_enum("BUCKAROO_CHANNEL", &channel, ALLOWED_CHANNELS)?;

        let currency = or_default("BUCKAROO_CURRENCY", "EUR");
        validate_currency(&currency)?;

        let signature_digest = or_default("BUCKAROO_SIGNATURE_DIGEST", "sha256")
            .parse::<SignatureDigest>()
            .map_err(anyhow::Error::msg)?;

        Ok(Config {
            website_key,
            private_key_path,
            gateway_url: or_default("BUCKAROO_GATEWAY_URL", DEFAULT_LIVE_URL),
            test_gateway_url: or_default("BUCKAROO_TEST_GATEWAY_URL", DEFAULT_TEST_URL),
            culture: or_default("BUCKAROO_CULTURE", "nl-NL"),
            channel,
            currency,
            signature_digest,
            timeout_secs: or_default("BUCKAROO_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
                .parse()
                .context("BUCKAROO_TIMEOUT_SECS must be a number of seconds")?,
            breaker_failures: or_default("BUCKAROO_BREAKER_FAILURES", &DEFAULT_BREAKER_FAILURES.to_string())
                .parse()
                .context("BUCKAROO_BREAKER_FAILURES must be a positive number")?,
            breaker_reset_secs: or_default("BUCKAROO_BREAKER_RESET_SECS", &DEFAULT_BREAKER_RESET_SECS.to_string())
                .parse()
                .context("BUCKAROO_BREAKER_RESET_SECS must be a number of seconds")?,
            push_secret: lookup("BUCKAROO_PUSH_SECRET").filter(|s| !s.trim().is_empty()),
        })
    }
}
