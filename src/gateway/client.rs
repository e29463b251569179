use async_trait::async_trait;
use chrono::Utc;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config as GatewayConfig;
use crate::gateway::{soap, SignedPayload, Transport};

pub const DEFAULT_LIVE_URL: &str = "https://checkout.buckaroo.nl/soap/";
pub const DEFAULT_TEST_URL: &str = "https://testcheckout.buckaroo.nl/soap/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BREAKER_FAILURES: u32 = 3;
pub const DEFAULT_BREAKER_RESET_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Gateway answered with HTTP status {0}")]
    HttpStatus(u16),
    #[error("Circuit breaker open: {0}")]
    CircuitBreakerOpen(String),
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
    #[error("Malformed gateway response: {0}")]
    MalformedResponse(String),
    #[error("SOAP fault: {0}")]
    SoapFault(String),
}

/// Where and how patiently the transport talks to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    pub live_url: String,
    pub test_url: String,
    pub timeout: Duration,
    /// Consecutive failed round trips before the breaker opens.
    pub breaker_failures: u32,
    /// Lower bound of the jittered wait before a half-open retry; the upper bound is twice this.
    pub breaker_reset: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            live_url: DEFAULT_LIVE_URL.to_string(),
            test_url: DEFAULT_TEST_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            breaker_failures: DEFAULT_BREAKER_FAILURES,
            breaker_reset: Duration::from_secs(DEFAULT_BREAKER_RESET_SECS),
        }
    }
}

impl TransportSettings {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            live_url: config.gateway_url.clone(),
            test_url: config.test_gateway_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            breaker_failures: config.breaker_failures,
            breaker_reset: Duration::from_secs(config.breaker_reset_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
}

type GatewayBreaker = StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>;

/// SOAP over HTTPS transport. A circuit breaker stops hammering a gateway that keeps failing.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    settings: TransportSettings,
    circuit_breaker: GatewayBreaker,
}

impl HttpTransport {
    pub fn new(settings: TransportSettings) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("buckaroo-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let backoff = backoff::equal_jittered(settings.breaker_reset, settings.breaker_reset * 2);
        let policy = failure_policy::consecutive_failures(settings.breaker_failures, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        Ok(HttpTransport {
            client,
            settings,
            circuit_breaker,
        })
    }

    pub fn circuit_state(&self) -> CircuitState {
        if self.circuit_breaker.is_call_permitted() {
            CircuitState::Closed
        } else {
            CircuitState::Open
        }
    }

    /// Test transactions go to the test gateway, everything else to the live one.
    pub fn endpoint(&self, test_mode: bool) -> &str {
        if test_mode {
            &self.settings.test_url
        } else {
            &self.settings.live_url
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, payload: &SignedPayload) -> Result<Value, TransportError> {
        let url = self.endpoint(payload.test_mode).to_string();
        let message_id = Uuid::new_v4();
        let envelope = soap::build_envelope(payload, message_id, Utc::now());
        let client = self.client.clone();

        tracing::debug!("Posting transaction request {} to {}", message_id, url);

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client
                    .post(&url)
                    .header("Content-Type", "text/xml; charset=utf-8")
                    .header("SOAPAction", soap::SOAP_ACTION)
                    .body(envelope)
                    .send()
                    .await?;

                // SOAP faults travel with a 500; anything else non-2xx never reached the engine.
                let status = response.status();
                if !status.is_success() && status != StatusCode::INTERNAL_SERVER_ERROR {
                    return Err(TransportError::HttpStatus(status.as_u16()));
                }

                let body = response.text().await?;
                Ok((status, body))
            })
            .await;

        let (status, body) = match result {
            Ok(answer) => answer,
            Err(FailsafeError::Rejected) => {
                return Err(TransportError::CircuitBreakerOpen(
                    "Gateway circuit breaker is open".to_string(),
                ))
            }
            Err(FailsafeError::Inner(e)) => return Err(e),
        };

        match soap::parse_response(&body) {
            Err(TransportError::MalformedResponse(_)) if !status.is_success() => {
                Err(TransportError::HttpStatus(status.as_u16()))
            }
            parsed => parsed,
        }
    }
}
