pub mod client;
pub mod soap;

use async_trait::async_trait;
use serde_json::Value;

use crate::services::signer::{CanonicalParameters, SignatureDigest};

pub use client::{CircuitState, HttpTransport, TransportError, TransportSettings};

/// Signed request, ready to be wrapped in an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    pub parameters: CanonicalParameters,
    pub signature: String,
    pub digest: SignatureDigest,
    pub test_mode: bool,
}

/// Moves a signed payload to the gateway and returns the response body as a field tree.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, payload: &SignedPayload) -> Result<Value, TransportError>;
}
