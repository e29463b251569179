use bigdecimal::BigDecimal;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::status_codes::{self, Permanence, StatusCategory};
use crate::services::signer::CanonicalParameters;
use crate::utils::de::parse_bool;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_FIELD: &str = "brq_signature";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PushError {
    #[error("Push notification carries no brq_signature field")]
    MissingSignature,
    #[error("Push signature is not valid hex")]
    InvalidSignatureFormat,
    #[error("Invalid push secret configuration")]
    InvalidSecret,
    #[error("Push signature verification failed")]
    SignatureMismatch,
    #[error("Invalid push payload: {0}")]
    InvalidPayload(String),
}

/// Status update the gateway posted to the push URL, after its signature checked out.
#[derive(Debug, Clone, PartialEq)]
pub struct PushNotification {
    pub transaction_key: Option<String>,
    pub invoice: Option<String>,
    pub status_code: u16,
    pub status_detail: Option<String>,
    pub amount: Option<BigDecimal>,
    pub currency: Option<String>,
    pub test_mode: bool,
    parameters: CanonicalParameters,
}

impl PushNotification {
    pub fn category(&self) -> StatusCategory {
        status_codes::classify(self.status_code)
    }

    pub fn permanence(&self) -> Option<Permanence> {
        status_codes::permanence(self.status_code)
    }

    pub fn is_successful(&self) -> bool {
        status_codes::is_successful(self.status_code)
    }

    pub fn is_pending(&self) -> bool {
        status_codes::is_pending(self.status_code)
    }

    pub fn is_final(&self) -> bool {
        status_codes::is_permanent_status(self.status_code)
    }

    /// Any posted field other than the signature, looked up without regard to case.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
}

/// Checks push notifications against the shared push secret.
#[derive(Clone)]
pub struct PushVerifier {
    secret: String,
}

impl PushVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self, parameters: &CanonicalParameters) -> Result<HmacSha256, PushError> {
        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).map_err(|_| PushError::InvalidSecret)?;
        mac.update(parameters.encode().as_bytes());
        Ok(mac)
    }

    /// Hex HMAC-SHA256 over the canonical encoding of `parameters`.
    pub fn sign(&self, parameters: &CanonicalParameters) -> Result<String, PushError> {
        Ok(hex::encode(self.mac(parameters)?.finalize().into_bytes()))
    }

    /// Verifies the posted fields and decodes the notification.
    pub fn verify<I, K, V>(&self, fields: I) -> Result<PushNotification, PushError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut signature = None;
        let mut signed = Vec::new();
        for (name, value) in fields {
            let (name, value) = (name.into(), value.into());
            if name.eq_ignore_ascii_case(SIGNATURE_FIELD) {
                signature = Some(value);
            } else {
                signed.push((name, value));
            }
        }

        let signature = signature.ok_or(PushError::MissingSignature)?;
        let expected = hex::decode(signature.trim()).map_err(|_| PushError::InvalidSignatureFormat)?;
        let parameters = CanonicalParameters::new(signed);

        // verify_slice compares in constant time
        self.mac(&parameters)?
            .verify_slice(&expected)
            .map_err(|_| PushError::SignatureMismatch)?;

        let notification = decode_notification(parameters)?;
        tracing::info!(
            "Verified push for transaction {} with status {}",
            notification.transaction_key.as_deref().unwrap_or("-"),
            notification.status_code
        );
        Ok(notification)
    }

    /// Verifies an `application/x-www-form-urlencoded` push body.
    pub fn verify_form(&self, body: &[u8]) -> Result<PushNotification, PushError> {
        self.verify(url::form_urlencoded::parse(body).into_owned())
    }
}

impl std::fmt::Debug for PushVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushVerifier").finish_non_exhaustive()
    }
}

fn decode_notification(parameters: CanonicalParameters) -> Result<PushNotification, PushError> {
    let get = |name: &str| {
        parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let status_code = get("brq_statuscode")
        .ok_or_else(|| PushError::InvalidPayload("brq_statuscode is missing".to_string()))?
        .parse::<u16>()
        .map_err(|_| PushError::InvalidPayload("brq_statuscode is not a status code".to_string()))?;

    let amount = get("brq_amount")
        .map(|raw| {
            BigDecimal::from_str(&raw)
                .map_err(|_| PushError::InvalidPayload(format!("brq_amount '{}' is not a decimal", raw)))
        })
        .transpose()?;

    Ok(PushNotification {
        transaction_key: get("brq_transactions"),
        invoice: get("brq_invoicenumber"),
        status_code,
        status_detail: get("brq_statuscode_detail"),
        amount,
        currency: get("brq_currency"),
        test_mode: get("brq_test").and_then(|v| parse_bool(&v)).unwrap_or(false),
        parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "push_secret_123";

    fn posted() -> Vec<(String, String)> {
        [
            ("brq_transactions", "4C1BE53E2C42412AB32A799D9316E7DD"),
            ("brq_invoicenumber", "INV-42"),
            ("brq_statuscode", "190"),
            ("brq_amount", "10.00"),
            ("brq_currency", "EUR"),
            ("brq_test", "true"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn signed(verifier: &PushVerifier) -> Vec<(String, String)> {
        let mut fields = posted();
        let signature = verifier.sign(&CanonicalParameters::new(fields.clone())).unwrap();
        fields.push((SIGNATURE_FIELD.to_string(), signature));
        fields
    }

    #[test]
    fn test_valid_push_decodes() {
        let verifier = PushVerifier::new(SECRET);
        let notification = verifier.verify(signed(&verifier)).unwrap();

        assert_eq!(notification.status_code, 190);
        assert!(notification.is_successful());
        assert!(notification.is_final());
        assert_eq!(notification.invoice.as_deref(), Some("INV-42"));
        assert_eq!(notification.amount, Some(BigDecimal::from_str("10.00").unwrap()));
        assert!(notification.test_mode);
        assert_eq!(notification.field("BRQ_CURRENCY"), Some("EUR"));
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let verifier = PushVerifier::new(SECRET);
        let mut fields = signed(&verifier);
        fields.reverse();
        assert!(verifier.verify(fields).is_ok());
    }

    #[test]
    fn test_tampered_push_is_rejected() {
        let verifier = PushVerifier::new(SECRET);
        let mut fields = signed(&verifier);
        fields[2].1 = "490".to_string();
        assert_eq!(verifier.verify(fields).unwrap_err(), PushError::SignatureMismatch);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let fields = signed(&PushVerifier::new(SECRET));
        let result = PushVerifier::new("another_secret").verify(fields);
        assert_eq!(result.unwrap_err(), PushError::SignatureMismatch);
    }

    #[test]
    fn test_missing_or_garbled_signature() {
        let verifier = PushVerifier::new(SECRET);
        assert_eq!(verifier.verify(posted()).unwrap_err(), PushError::MissingSignature);

        let mut fields = posted();
        fields.push((SIGNATURE_FIELD.to_string(), "not-hex".to_string()));
        assert_eq!(
            verifier.verify(fields).unwrap_err(),
            PushError::InvalidSignatureFormat
        );
    }

    #[test]
    fn test_signed_push_without_status_is_invalid_payload() {
        let verifier = PushVerifier::new(SECRET);
        let fields = vec![("brq_invoicenumber".to_string(), "INV-42".to_string())];
        let signature = verifier.sign(&CanonicalParameters::new(fields.clone())).unwrap();
        let mut fields = fields;
        fields.push((SIGNATURE_FIELD.to_string(), signature));

        assert!(matches!(
            verifier.verify(fields),
            Err(PushError::InvalidPayload(_))
        ));
    }
}
