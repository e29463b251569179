//! Request signing with the merchant's private key.
//!
//! Parameters are put in canonical order (ASCII case-insensitive by name,
//! exact name as tie-breaker) and form-encoded before signing, so one logical
//! request always yields the same bytes to sign.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::sign::{Signer, Verifier};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{GatewayError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureDigest {
    Sha1,
    #[default]
    Sha256,
}

impl SignatureDigest {
    fn message_digest(&self) -> MessageDigest {
        match self {
            SignatureDigest::Sha1 => MessageDigest::sha1(),
            SignatureDigest::Sha256 => MessageDigest::sha256(),
        }
    }

    /// Algorithm identifier announced next to the signature.
    pub fn algorithm_uri(&self) -> &'static str {
        match self {
            SignatureDigest::Sha1 => "http://www.w3.org/2000/09/xmldsig#rsa-sha1",
            SignatureDigest::Sha256 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
        }
    }
}

impl FromStr for SignatureDigest {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(SignatureDigest::Sha1),
            "sha256" | "sha-256" => Ok(SignatureDigest::Sha256),
            other => Err(format!("unsupported signature digest '{}'", other)),
        }
    }
}

/// Request parameters in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CanonicalParameters(Vec<(String, String)>);

impl CanonicalParameters {
    pub fn new<I, K, V>(parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut parameters: Vec<(String, String)> = parameters
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        parameters.sort_by(|(a_name, a_value), (b_name, b_value)| {
            a_name
                .to_ascii_lowercase()
                .cmp(&b_name.to_ascii_lowercase())
                .then_with(|| a_name.cmp(b_name))
                .then_with(|| a_value.cmp(b_value))
        });
        Self(parameters)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The exact byte sequence that gets signed.
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }
}

/// Signs requests with an RSA private key loaded once and kept read-only.
#[derive(Clone)]
pub struct RequestSigner {
    key: PKey<Private>,
    digest: SignatureDigest,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("bits", &self.key.bits())
            .field("digest", &self.digest)
            .finish()
    }
}

impl RequestSigner {
    /// Loads a PEM encoded RSA private key (PKCS#1 or PKCS#8).
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let key = PKey::private_key_from_pem(pem)
            .map_err(|e| GatewayError::KeyLoadError(format!("invalid PEM private key: {}", e)))?;

        // ECDSA signatures are randomized; the gateway expects RSA.
        key.rsa()
            .map_err(|_| GatewayError::KeyLoadError("private key is not an RSA key".to_string()))?;

        Ok(Self {
            key,
            digest: SignatureDigest::default(),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|e| {
            GatewayError::KeyLoadError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let signer = Self::from_pem(&pem)?;
        tracing::debug!("Loaded {}-bit signing key from {}", signer.key.bits(), path.display());
        Ok(signer)
    }

    pub fn with_digest(mut self, digest: SignatureDigest) -> Self {
        self.digest = digest;
        self
    }

    pub fn digest(&self) -> SignatureDigest {
        self.digest
    }

    /// Base64 signature over the canonical encoding.
    pub fn sign(&self, parameters: &CanonicalParameters) -> Result<String> {
        let signing_error = |e: openssl::error::ErrorStack| GatewayError::SigningError(e.to_string());

        let mut signer =
            Signer::new(self.digest.message_digest(), &self.key).map_err(signing_error)?;
        signer
            .update(parameters.encode().as_bytes())
            .map_err(signing_error)?;
        let signature = signer.sign_to_vec().map_err(signing_error)?;

        Ok(STANDARD.encode(signature))
    }

    /// Checks a base64 signature against the public half of the key.
    pub fn verify(&self, parameters: &CanonicalParameters, signature: &str) -> Result<bool> {
        let Ok(signature) = STANDARD.decode(signature.trim()) else {
            return Ok(false);
        };
        let signing_error = |e: openssl::error::ErrorStack| GatewayError::SigningError(e.to_string());

        let mut verifier =
            Verifier::new(self.digest.message_digest(), &self.key).map_err(signing_error)?;
        verifier
            .update(parameters.encode().as_bytes())
            .map_err(signing_error)?;

        // A signature of the wrong length surfaces as an error from openssl.
        Ok(verifier.verify(&signature).unwrap_or(false))
    }
}
