use crate::gateway::TransportError;
use crate::validation::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    #[error("Missing required field: {field}")]
    MissingRequiredField { field: String },

    #[error("Key load error: {0}")]
    KeyLoadError(String),

    #[error("Signing error: {0}")]
    SigningError(String),

    #[error("Transport failure: {0}")]
    TransportFailure(#[source] TransportError),

    #[error("Decode error: {0}")]
    DecodeError(String),
}

impl GatewayError {
    pub fn missing(field: impl Into<String>) -> Self {
        GatewayError::MissingRequiredField {
            field: field.into(),
        }
    }

    /// The request never produced a usable gateway answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, GatewayError::TransportFailure(_))
    }
}

// A gateway that answered with a fault or garbage did receive the request.
impl From<TransportError> for GatewayError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::MalformedResponse(msg) => GatewayError::DecodeError(msg),
            TransportError::SoapFault(msg) => {
                GatewayError::DecodeError(format!("gateway returned a SOAP fault: {}", msg))
            }
            other => GatewayError::TransportFailure(other),
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::DecodeError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_becomes_invalid_argument() {
        let error: GatewayError = ValidationError::new("Invoice", "is required").into();
        assert!(matches!(error, GatewayError::InvalidArgument(_)));
        assert_eq!(error.to_string(), "Invalid argument: Invoice is required");
    }

    #[test]
    fn test_missing_field_names_the_field() {
        let error = GatewayError::missing("issuer");
        assert_eq!(error.to_string(), "Missing required field: issuer");
    }

    #[test]
    fn test_http_failures_stay_transport_failures() {
        let error: GatewayError = TransportError::HttpStatus(503).into();
        assert!(error.is_transport());

        let error: GatewayError = TransportError::CircuitBreakerOpen("open".to_string()).into();
        assert!(error.is_transport());
    }

    #[test]
    fn test_unintelligible_answers_become_decode_errors() {
        let error: GatewayError = TransportError::MalformedResponse("bad xml".to_string()).into();
        assert!(matches!(error, GatewayError::DecodeError(_)));

        let error: GatewayError = TransportError::SoapFault("Server".to_string()).into();
        assert!(matches!(error, GatewayError::DecodeError(_)));
    }
}
