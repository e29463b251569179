use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardBrand {
    Mastercard,
    Visa,
    Amex,
    Maestro,
}

/// Payment methods the gateway can be asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentService {
    Ideal,
    CreditCard(CardBrand),
    PayPal,
    Bancontact,
    Sofort,
    Giropay,
    Transfer,
}

pub const IDEAL_ISSUER: &str = "issuer";
pub const GIROPAY_BIC: &str = "bic";
pub const TRANSFER_CUSTOMER_EMAIL: &str = "customeremail";

impl PaymentService {
    /// Service name as the gateway knows it.
    pub fn code(&self) -> &'static str {
        match self {
            PaymentService::Ideal => "ideal",
            PaymentService::CreditCard(CardBrand::Mastercard) => "mastercard",
            PaymentService::CreditCard(CardBrand::Visa) => "visa",
            PaymentService::CreditCard(CardBrand::Amex) => "amex",
            PaymentService::CreditCard(CardBrand::Maestro) => "maestro",
            PaymentService::PayPal => "paypal",
            PaymentService::Bancontact => "bancontactmrcash",
            PaymentService::Sofort => "sofortueberweisung",
            PaymentService::Giropay => "giropay",
            PaymentService::Transfer => "transfer",
        }
    }

    /// Service parameters that must be set before the transaction is submitted.
    /// Refunds point at the original payment and need none of them.
    pub fn required_parameters(&self, action: ServiceAction) -> &'static [&'static str] {
        if action == ServiceAction::Refund {
            return &[];
        }
        match self {
            PaymentService::Ideal => &[IDEAL_ISSUER],
            PaymentService::Giropay => &[GIROPAY_BIC],
            PaymentService::Transfer => &[TRANSFER_CUSTOMER_EMAIL],
            _ => &[],
        }
    }

    /// The one service a dedicated parameter (issuer, bic, customeremail) belongs to.
    pub fn owner_of(parameter: &str) -> Option<(&'static str, PaymentService)> {
        [
            (IDEAL_ISSUER, PaymentService::Ideal),
            (GIROPAY_BIC, PaymentService::Giropay),
            (TRANSFER_CUSTOMER_EMAIL, PaymentService::Transfer),
        ]
        .into_iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(parameter))
    }

    pub fn all() -> [PaymentService; 10] {
        [
            PaymentService::Ideal,
            PaymentService::CreditCard(CardBrand::Mastercard),
            PaymentService::CreditCard(CardBrand::Visa),
            PaymentService::CreditCard(CardBrand::Amex),
            PaymentService::CreditCard(CardBrand::Maestro),
            PaymentService::PayPal,
            PaymentService::Bancontact,
            PaymentService::Sofort,
            PaymentService::Giropay,
            PaymentService::Transfer,
        ]
    }
}

impl fmt::Display for PaymentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PaymentService {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentService::all()
            .into_iter()
            .find(|service| service.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown payment service '{}'", s))
    }
}

/// Whether money moves from the consumer (debit) or back to them (credit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Pay,
    Refund,
}

impl ServiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceAction::Pay => "Pay",
            ServiceAction::Refund => "Refund",
        }
    }
}
