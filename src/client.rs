use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::gateway::client::TransportSettings;
use crate::gateway::{HttpTransport, Transport};
use crate::services::signer::RequestSigner;
use crate::services::transaction::TransactionBuilder;
use crate::validation::{
    sanitize_string, validate_currency, validate_enum, validate_required, ALLOWED_CHANNELS,
};

/// Merchant-wide values sent with every transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub website_key: String,
    pub culture: String,
    pub channel: String,
    pub currency: String,
}

impl ClientSettings {
    pub fn new(website_key: &str) -> Result<Self> {
        let website_key = sanitize_string(website_key);
        validate_required("WebsiteKey", &website_key)?;

        Ok(Self {
            website_key,
            culture: "nl-NL".to_string(),
            channel: "Web".to_string(),
            currency: "EUR".to_string(),
        })
    }

    pub fn with_culture(mut self, culture: &str) -> Result<Self> {
        validate_required("Culture", culture)?;
        self.culture = culture.trim().to_string();
        Ok(self)
    }

    pub fn with_channel(mut self, channel: &str) -> Result<Self> {
        validate_enum("Channel", channel, ALLOWED_CHANNELS)?;
        self.channel = channel.to_string();
        Ok(self)
    }

    pub fn with_currency(mut self, currency: &str) -> Result<Self> {
        validate_currency(currency)?;
        self.currency = currency.to_string();
        Ok(self)
    }
}

/// Entry point: holds the merchant settings, the loaded signing key and the transport.
///
/// Cloning is cheap and clones share the transport. Each transaction gets its own builder.
#[derive(Clone)]
pub struct GatewayClient {
    settings: ClientSettings,
    signer: RequestSigner,
    transport: Arc<dyn Transport>,
}

impl GatewayClient {
    pub fn new(settings: ClientSettings, signer: RequestSigner, transport: Arc<dyn Transport>) -> Self {
        Self {
            settings,
            signer,
            transport,
        }
    }

    /// Client for the public gateway endpoints, signing with the key at `key_path`.
    pub fn with_key_file(website_key: &str, key_path: impl AsRef<Path>) -> Result<Self> {
        let settings = ClientSettings::new(website_key)?;
        let signer = RequestSigner::from_file(key_path)?;
        let transport = HttpTransport::new(TransportSettings::default())?;

        Ok(Self::new(settings, signer, Arc::new(transport)))
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = ClientSettings::new(&config.website_key)?
            .with_culture(&config.culture)?
            .with_channel(&config.channel)?
            .with_currency(&config.currency)?;
        let signer =
            RequestSigner::from_file(&config.private_key_path)?.with_digest(config.signature_digest);
        let transport = HttpTransport::new(TransportSettings::from_config(config))?;

        tracing::info!(
            "Gateway client initialized for {} (test endpoint {})",
            config.gateway_url,
            config.test_gateway_url
        );

        Ok(Self::new(settings, signer, Arc::new(transport)))
    }

    /// Starts a new transaction.
    pub fn transaction(&self) -> TransactionBuilder<'_> {
        TransactionBuilder::new(self)
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;

    #[test]
    fn test_settings_defaults() {
        let settings = ClientSettings::new(" WEBSITEKEY1 ").unwrap();
        assert_eq!(settings.website_key, "WEBSITEKEY1");
        assert_eq!(settings.culture, "nl-NL");
        assert_eq!(settings.channel, "Web");
        assert_eq!(settings.currency, "EUR");
    }

    #[test]
    fn test_settings_validation() {
        assert!(matches!(
            ClientSettings::new("  "),
            Err(GatewayError::InvalidArgument(_))
        ));

        let settings = ClientSettings::new("WEBSITEKEY1").unwrap();
        assert!(settings.clone().with_channel("Kiosk").is_err());
        assert!(settings.clone().with_currency("eur").is_err());
        assert_eq!(settings.with_currency("USD").unwrap().currency, "USD");
    }

    #[test]
    fn test_missing_key_file_is_key_load_error() {
        let result = GatewayClient::with_key_file("WEBSITEKEY1", "/nonexistent/private.pem");
        assert!(matches!(result, Err(GatewayError::KeyLoadError(_))));
    }
}
