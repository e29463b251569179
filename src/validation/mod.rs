use bigdecimal::{BigDecimal, Signed};
use std::fmt;
use url::Url;

pub const CURRENCY_CODE_LEN: usize = 3;
pub const AMOUNT_MAX_SCALE: i64 = 2;
pub const INVOICE_MAX_LEN: usize = 255;
pub const DESCRIPTION_MAX_LEN: usize = 255;
pub const PARAMETER_NAME_MAX_LEN: usize = 64;
pub const ALLOWED_CHANNELS: &[&str] = &["Web", "Backoffice"];

/// A request field the gateway would refuse, caught before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Gateway name of the offending field, e.g. `Invoice` or `issuer`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Free text as the gateway stores it: control characters dropped, whitespace runs folded.
pub fn sanitize_string(value: &str) -> String {
    let mut cleaned = String::with_capacity(value.len());
    for word in value.split(|ch: char| ch.is_whitespace()).filter(|w| !w.is_empty()) {
        let word: String = word.chars().filter(|ch| !ch.is_control()).collect();
        if word.is_empty() {
            continue;
        }
        if !cleaned.is_empty() {
            cleaned.push(' ');
        }
        cleaned.push_str(&word);
    }
    cleaned
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    match value.trim() {
        "" => Err(ValidationError::new(field, "is required")),
        _ => Ok(()),
    }
}

/// Invoice, order and description limits count characters, not bytes.
pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    let len = value.chars().count();
    if len > max_len {
        return Err(ValidationError::new(
            field,
            format!("is {} characters long, the gateway accepts {}", len, max_len),
        ));
    }

    Ok(())
}

/// Exact match against the values the gateway knows, e.g. `Web` or `Backoffice` for Channel.
pub fn validate_enum(field: &'static str, value: &str, allowed: &[&str]) -> ValidationResult {
    if !allowed.contains(&value) {
        return Err(ValidationError::new(
            field,
            format!("'{}' is not one of {}", value, allowed.join(", ")),
        ));
    }

    Ok(())
}

/// Amounts are sent in major units with at most two decimals.
pub fn validate_amount(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    if amount.is_negative() {
        return Err(ValidationError::new(field, "must not be negative"));
    }

    let (_, scale) = amount.normalized().as_bigint_and_exponent();
    if scale > AMOUNT_MAX_SCALE {
        return Err(ValidationError::new(
            field,
            format!("must have at most {} decimal places", AMOUNT_MAX_SCALE),
        ));
    }

    Ok(())
}

pub fn validate_currency(currency: &str) -> ValidationResult {
    if currency.len() != CURRENCY_CODE_LEN || !currency.chars().all(|ch| ch.is_ascii_uppercase()) {
        return Err(ValidationError::new(
            "Currency",
            "must be a three letter ISO 4217 code",
        ));
    }

    Ok(())
}

pub fn validate_url(field: &'static str, value: &str) -> ValidationResult {
    let parsed = Url::parse(value)
        .map_err(|e| ValidationError::new(field, format!("must be an absolute URL ({})", e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::new(field, "must use http or https"));
    }

    Ok(())
}

pub fn validate_email(field: &'static str, value: &str) -> ValidationResult {
    validate_required(field, value)?;

    let mut parts = value.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();

    if local.is_empty() || !domain.contains('.') || value.chars().any(char::is_whitespace) {
        return Err(ValidationError::new(field, "must be an e-mail address"));
    }

    Ok(())
}

/// Bank identifier: 8 or 11 uppercase letters and digits (iDEAL issuers, giropay BICs).
pub fn validate_bank_identifier(field: &'static str, value: &str) -> ValidationResult {
    validate_required(field, value)?;

    if !matches!(value.len(), 8 | 11)
        || !value
            .chars()
            .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit())
    {
        return Err(ValidationError::new(
            field,
            "must be an 8 or 11 character bank identifier",
        ));
    }

    Ok(())
}

/// Names of free-form parameters become part of the signed encoding.
pub fn validate_parameter_name(field: &'static str, name: &str) -> ValidationResult {
    validate_required(field, name)?;
    validate_max_len(field, name, PARAMETER_NAME_MAX_LEN)?;

    if !name
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        return Err(ValidationError::new(
            field,
            "must contain only letters, digits, '_' and '-'",
        ));
    }

    Ok(())
}
