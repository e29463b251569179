use buckaroo_client::services::{CanonicalParameters, PushError};
use buckaroo_client::{PushVerifier, StatusCategory};

const SECRET: &str = "push_secret_123";

fn form_body(fields: &[(&str, &str)], signature: Option<&str>) -> Vec<u8> {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(fields.iter());
    if let Some(signature) = signature {
        serializer.append_pair("brq_signature", signature);
    }
    serializer.finish().into_bytes()
}

const CANCELLED: &[(&str, &str)] = &[
    ("brq_transactions", "4C1BE53E2C42412AB32A799D9316E7DD"),
    ("brq_invoicenumber", "INV 42/A"),
    ("brq_statuscode", "890"),
    ("brq_statuscode_detail", "C001"),
    ("brq_amount", "12.50"),
    ("brq_currency", "EUR"),
];

#[test]
fn test_form_encoded_push_is_verified() {
    let verifier = PushVerifier::new(SECRET);
    let signature = verifier.sign(&CanonicalParameters::new(CANCELLED.iter().copied())).unwrap();

    let notification = verifier
        .verify_form(&form_body(CANCELLED, Some(&signature)))
        .unwrap();

    assert_eq!(notification.invoice.as_deref(), Some("INV 42/A"));
    assert_eq!(notification.category(), StatusCategory::Cancelled);
    assert!(notification.is_final());
    assert!(!notification.is_pending());
    assert_eq!(notification.status_detail.as_deref(), Some("C001"));
    assert!(!notification.test_mode);
}

#[test]
fn test_unsigned_push_is_rejected() {
    let verifier = PushVerifier::new(SECRET);
    assert_eq!(
        verifier.verify_form(&form_body(CANCELLED, None)).unwrap_err(),
        PushError::MissingSignature
    );
}

#[test]
fn test_push_signed_with_other_secret_is_rejected() {
    let signature = PushVerifier::new("other_secret")
        .sign(&CanonicalParameters::new(CANCELLED.iter().copied()))
        .unwrap();

    let result = PushVerifier::new(SECRET).verify_form(&form_body(CANCELLED, Some(&signature)));
    assert_eq!(result.unwrap_err(), PushError::SignatureMismatch);
}
