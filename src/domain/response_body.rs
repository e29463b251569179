//! Typed view of a transaction response.
//!
//! A `ResponseBody` is decoded once from the field tree handed over by the
//! transport and never changes afterwards. Decoding is all-or-nothing: a
//! malformed fragment yields an error, never a half-filled body.

use bigdecimal::{BigDecimal, Zero};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::consumer_message::ConsumerMessage;
use crate::domain::parameters::{AdditionalParameters, CustomParameters};
use crate::domain::request_errors::RequestErrors;
use crate::domain::required_action::{RequiredAction, RequiredActionType};
use crate::domain::service::Services;
use crate::domain::status::Status;
use crate::domain::status_codes::{self, Permanence, StatusCategory};
use crate::error::{GatewayError, Result};
use crate::utils::de;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseBody {
    #[serde(default, deserialize_with = "de::opt_string")]
    key: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    invoice: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    order: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    service_code: Option<String>,
    status: Status,
    #[serde(default, deserialize_with = "de::opt_bool")]
    is_test: Option<bool>,
    #[serde(default, deserialize_with = "de::opt_string")]
    currency: Option<String>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    amount_debit: Option<BigDecimal>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    amount_credit: Option<BigDecimal>,
    #[serde(default, deserialize_with = "de::opt_string")]
    transaction_type: Option<String>,
    #[serde(default)]
    required_action: Option<RequiredAction>,
    #[serde(default, deserialize_with = "de::opt_string")]
    mutation_type: Option<String>,
    #[serde(default)]
    consumer_message: Option<ConsumerMessage>,
    #[serde(default, deserialize_with = "de::opt_string")]
    issuing_country: Option<String>,
    #[serde(default, deserialize_with = "de::opt_bool")]
    start_recurrent: Option<bool>,
    #[serde(default, deserialize_with = "de::opt_bool")]
    recurring: Option<bool>,
    #[serde(default, deserialize_with = "de::opt_string")]
    customer_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    payer_hash: Option<String>,
    #[serde(default)]
    services: Services,
    #[serde(default)]
    custom_parameters: Option<CustomParameters>,
    #[serde(default)]
    additional_parameters: Option<AdditionalParameters>,
    #[serde(default)]
    request_errors: Option<RequestErrors>,
    #[serde(default, deserialize_with = "de::opt_string")]
    payment_key: Option<String>,
    #[serde(default, deserialize_with = "de::opt_bool")]
    is_cancelable: Option<bool>,
}

impl ResponseBody {
    /// Decodes the transaction response fragment.
    pub fn from_fragment(fragment: Value) -> Result<Self> {
        match fragment {
            Value::Object(_) => serde_json::from_value(fragment).map_err(|e| {
                GatewayError::DecodeError(format!("invalid transaction response: {}", e))
            }),
            other => Err(GatewayError::DecodeError(format!(
                "transaction response must be a structure, found {}",
                other
            ))),
        }
    }

    pub fn transaction_key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn invoice_number(&self) -> Option<&str> {
        self.invoice.as_deref()
    }

    pub fn order_number(&self) -> Option<&str> {
        self.order.as_deref()
    }

    pub fn service_code(&self) -> Option<&str> {
        self.service_code.as_deref()
    }

    pub fn is_in_test_mode(&self) -> bool {
        self.is_test.unwrap_or(false)
    }

    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    /// The debit amount when present and non-zero, otherwise the credit amount.
    pub fn amount(&self) -> Option<&BigDecimal> {
        match &self.amount_debit {
            Some(debit) if !debit.is_zero() => Some(debit),
            _ => self.amount_credit.as_ref(),
        }
    }

    pub fn amount_debit(&self) -> Option<&BigDecimal> {
        self.amount_debit.as_ref()
    }

    pub fn amount_credit(&self) -> Option<&BigDecimal> {
        self.amount_credit.as_ref()
    }

    pub fn transaction_type(&self) -> Option<&str> {
        self.transaction_type.as_deref()
    }

    pub fn mutation_type(&self) -> Option<&str> {
        self.mutation_type.as_deref()
    }

    pub fn issuing_country(&self) -> Option<&str> {
        self.issuing_country.as_deref()
    }

    pub fn start_recurrent(&self) -> Option<bool> {
        self.start_recurrent
    }

    pub fn recurring(&self) -> Option<bool> {
        self.recurring
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn payer_hash(&self) -> Option<&str> {
        self.payer_hash.as_deref()
    }

    pub fn payment_key(&self) -> Option<&str> {
        self.payment_key.as_deref()
    }

    pub fn is_cancelable(&self) -> bool {
        self.is_cancelable.unwrap_or(false)
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.code()
    }

    pub fn status_sub_code(&self) -> Option<&str> {
        self.status.sub_code().map(|sub| sub.code.as_str())
    }

    pub fn status_description(&self) -> Option<&str> {
        self.status.description()
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn consumer_message(&self) -> Option<&ConsumerMessage> {
        self.consumer_message.as_ref()
    }

    pub fn custom_parameters(&self) -> Option<&CustomParameters> {
        self.custom_parameters.as_ref()
    }

    pub fn additional_parameters(&self) -> Option<&AdditionalParameters> {
        self.additional_parameters.as_ref()
    }

    pub fn request_errors(&self) -> Option<&RequestErrors> {
        self.request_errors.as_ref()
    }

    /// Absent and empty error lists both mean "no errors".
    pub fn has_errors(&self) -> bool {
        self.request_errors
            .as_ref()
            .map(RequestErrors::has_errors)
            .unwrap_or(false)
    }

    pub fn has_required_action(&self) -> bool {
        self.required_action.is_some()
    }

    pub fn required_action(&self) -> Option<&RequiredAction> {
        self.required_action.as_ref()
    }

    pub fn required_action_type(&self) -> Option<&RequiredActionType> {
        self.required_action.as_ref().map(RequiredAction::action_type)
    }

    pub fn is_redirect_action(&self) -> bool {
        self.required_action
            .as_ref()
            .map(RequiredAction::is_redirect)
            .unwrap_or(false)
    }

    /// `None` unless the required action is a redirect.
    pub fn redirect_url(&self) -> Option<&str> {
        self.required_action
            .as_ref()
            .and_then(RequiredAction::redirect_url)
    }

    pub fn category(&self) -> StatusCategory {
        status_codes::classify(self.status_code())
    }

    pub fn permanence(&self) -> Option<Permanence> {
        status_codes::permanence(self.status_code())
    }

    pub fn is_successful(&self) -> bool {
        status_codes::is_successful(self.status_code())
    }

    pub fn is_pending(&self) -> bool {
        status_codes::is_pending(self.status_code())
    }

    pub fn is_failed(&self) -> bool {
        status_codes::is_failed(self.status_code())
    }

    pub fn is_cancelled(&self) -> bool {
        status_codes::is_cancelled(self.status_code())
    }

    pub fn is_rejected(&self) -> bool {
        status_codes::is_rejected(self.status_code())
    }

    pub fn has_permanent_status(&self) -> bool {
        status_codes::is_permanent_status(self.status_code())
    }

    pub fn has_temporary_status(&self) -> bool {
        status_codes::is_temporary_status(self.status_code())
    }
}
