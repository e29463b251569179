//! Fluent construction and submission of a single gateway transaction.
//!
//! Setters validate their argument right away and hand the builder back, so a
//! transaction reads as one chain ending in `perform()`. `perform` consumes the
//! builder: a failed submission has to be rebuilt, not replayed.

use bigdecimal::BigDecimal;
use std::collections::BTreeMap;
use std::net::IpAddr;
use tracing::Instrument;

use crate::client::GatewayClient;
use crate::domain::payment_service::{
    PaymentService, ServiceAction, GIROPAY_BIC, IDEAL_ISSUER, TRANSFER_CUSTOMER_EMAIL,
};
use crate::domain::response_body::ResponseBody;
use crate::error::{GatewayError, Result};
use crate::gateway::SignedPayload;
use crate::services::signer::CanonicalParameters;
use crate::utils::sanitize::{sanitize_json, sanitize_parameters};
use crate::validation::{
    sanitize_string, validate_amount, validate_bank_identifier, validate_currency,
    validate_email, validate_max_len, validate_parameter_name, validate_required, validate_url,
    ValidationError, DESCRIPTION_MAX_LEN, INVOICE_MAX_LEN,
};

#[derive(Debug, Clone, PartialEq)]
enum Amount {
    Debit(BigDecimal),
    Credit(BigDecimal),
}

impl Amount {
    fn field(&self) -> &'static str {
        match self {
            Amount::Debit(_) => "AmountDebit",
            Amount::Credit(_) => "AmountCredit",
        }
    }

    fn action(&self) -> ServiceAction {
        match self {
            Amount::Debit(_) => ServiceAction::Pay,
            Amount::Credit(_) => ServiceAction::Refund,
        }
    }

    fn formatted(&self) -> String {
        match self {
            Amount::Debit(value) | Amount::Credit(value) => value.with_scale(2).to_string(),
        }
    }
}

pub struct TransactionBuilder<'a> {
    client: &'a GatewayClient,
    amount: Option<Amount>,
    currency: Option<String>,
    service: Option<PaymentService>,
    service_parameters: BTreeMap<String, String>,
    invoice: Option<String>,
    order: Option<String>,
    description: Option<String>,
    client_ip: Option<IpAddr>,
    culture: Option<String>,
    urls: BTreeMap<&'static str, String>,
    original_transaction_key: Option<String>,
    start_recurrent: bool,
    custom_parameters: BTreeMap<String, String>,
    additional_parameters: BTreeMap<String, String>,
    test_mode: bool,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(client: &'a GatewayClient) -> Self {
        Self {
            client,
            amount: None,
            currency: None,
            service: None,
            service_parameters: BTreeMap::new(),
            invoice: None,
            order: None,
            description: None,
            client_ip: None,
            culture: None,
            urls: BTreeMap::new(),
            original_transaction_key: None,
            start_recurrent: false,
            custom_parameters: BTreeMap::new(),
            additional_parameters: BTreeMap::new(),
            test_mode: false,
        }
    }

    /// Sends the transaction to the test endpoint.
    pub fn put_in_test_mode(mut self) -> Self {
        self.test_mode = true;
        self
    }

    /// Charges the consumer. Replaces any credit amount set before.
    pub fn set_amount_debit(mut self, amount: BigDecimal) -> Result<Self> {
        validate_amount("AmountDebit", &amount)?;
        self.amount = Some(Amount::Debit(amount));
        Ok(self)
    }

    /// Pays the consumer back. Replaces any debit amount set before.
    pub fn set_amount_credit(mut self, amount: BigDecimal) -> Result<Self> {
        validate_amount("AmountCredit", &amount)?;
        self.amount = Some(Amount::Credit(amount));
        Ok(self)
    }

    /// Overrides the client's default currency.
    pub fn set_currency(mut self, currency: &str) -> Result<Self> {
        validate_currency(currency)?;
        self.currency = Some(currency.to_string());
        Ok(self)
    }

    pub fn set_service(mut self, service: PaymentService) -> Self {
        self.service = Some(service);
        self
    }

    pub fn set_ideal_issuer(self, issuer: &str) -> Result<Self> {
        let issuer = sanitize_string(issuer).to_ascii_uppercase();
        validate_bank_identifier("issuer", &issuer)?;
        self.with_service_parameter(IDEAL_ISSUER, issuer)
    }

    pub fn set_giropay_bic(self, bic: &str) -> Result<Self> {
        let bic = sanitize_string(bic).to_ascii_uppercase();
        validate_bank_identifier("bic", &bic)?;
        self.with_service_parameter(GIROPAY_BIC, bic)
    }

    pub fn set_customer_email(self, email: &str) -> Result<Self> {
        let email = email.trim().to_string();
        validate_email("customeremail", &email)?;
        self.with_service_parameter(TRANSFER_CUSTOMER_EMAIL, email)
    }

    /// Any other parameter of the selected service, sent as `Services.<service>.<name>`.
    pub fn set_service_parameter(self, name: &str, value: &str) -> Result<Self> {
        validate_parameter_name("ServiceParameter", name)?;
        validate_required("ServiceParameter", value)?;
        self.with_service_parameter(name, value.to_string())
    }

    fn with_service_parameter(mut self, name: &str, value: String) -> Result<Self> {
        self.service_parameters.insert(name.to_ascii_lowercase(), value);
        Ok(self)
    }

    pub fn set_invoice(mut self, invoice: &str) -> Result<Self> {
        let invoice = sanitize_string(invoice);
        validate_required("Invoice", &invoice)?;
        validate_max_len("Invoice", &invoice, INVOICE_MAX_LEN)?;
        self.invoice = Some(invoice);
        Ok(self)
    }

    pub fn set_order(mut self, order: &str) -> Result<Self> {
        let order = sanitize_string(order);
        validate_required("Order", &order)?;
        validate_max_len("Order", &order, INVOICE_MAX_LEN)?;
        self.order = Some(order);
        Ok(self)
    }

    pub fn set_description(mut self, description: &str) -> Result<Self> {
        let description = sanitize_string(description);
        validate_required("Description", &description)?;
        validate_max_len("Description", &description, DESCRIPTION_MAX_LEN)?;
        self.description = Some(description);
        Ok(self)
    }

    pub fn set_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    pub fn set_culture(mut self, culture: &str) -> Result<Self> {
        validate_required("Culture", culture)?;
        self.culture = Some(culture.trim().to_string());
        Ok(self)
    }

    fn with_url(mut self, field: &'static str, url: &str) -> Result<Self> {
        let url = url.trim();
        validate_url(field, url)?;
        self.urls.insert(field, url.to_string());
        Ok(self)
    }

    pub fn set_return_url(self, url: &str) -> Result<Self> {
        self.with_url("ReturnURL", url)
    }

    pub fn set_return_url_cancel(self, url: &str) -> Result<Self> {
        self.with_url("ReturnURLCancel", url)
    }

    pub fn set_return_url_error(self, url: &str) -> Result<Self> {
        self.with_url("ReturnURLError", url)
    }

    pub fn set_return_url_reject(self, url: &str) -> Result<Self> {
        self.with_url("ReturnURLReject", url)
    }

    pub fn set_push_url(self, url: &str) -> Result<Self> {
        self.with_url("PushURL", url)
    }

    pub fn set_push_url_failure(self, url: &str) -> Result<Self> {
        self.with_url("PushURLFailure", url)
    }

    /// The payment a credit refers to.
    pub fn set_original_transaction_key(mut self, key: &str) -> Result<Self> {
        let key = sanitize_string(key);
        validate_required("OriginalTransactionKey", &key)?;
        self.original_transaction_key = Some(key);
        Ok(self)
    }

    pub fn start_recurrent(mut self) -> Self {
        self.start_recurrent = true;
        self
    }

    pub fn add_custom_parameter(mut self, name: &str, value: &str) -> Result<Self> {
        validate_parameter_name("CustomParameters", name)?;
        self.custom_parameters
            .insert(name.to_string(), sanitize_string(value));
        Ok(self)
    }

    pub fn add_additional_parameter(mut self, name: &str, value: &str) -> Result<Self> {
        validate_parameter_name("AdditionalParameters", name)?;
        self.additional_parameters
            .insert(name.to_string(), sanitize_string(value));
        Ok(self)
    }

    pub fn is_in_test_mode(&self) -> bool {
        self.test_mode
    }

    fn check_required(&self) -> Result<(PaymentService, &Amount, &str)> {
        let service = self.service.ok_or_else(|| GatewayError::missing("Service"))?;
        let amount = self
            .amount
            .as_ref()
            .ok_or_else(|| GatewayError::missing("AmountDebit"))?;
        let invoice = self
            .invoice
            .as_deref()
            .ok_or_else(|| GatewayError::missing("Invoice"))?;

        for name in self.service_parameters.keys() {
            if let Some((field, owner)) = PaymentService::owner_of(name) {
                if owner != service {
                    return Err(ValidationError::new(
                        field,
                        format!("only applies to the {} service, not {}", owner, service),
                    )
                    .into());
                }
            }
        }

        if let Some(field) = service
            .required_parameters(amount.action())
            .iter()
            .find(|field| !self.service_parameters.contains_key(**field))
        {
            return Err(GatewayError::missing(*field));
        }

        if matches!(amount, Amount::Credit(_)) && self.original_transaction_key.is_none() {
            return Err(GatewayError::missing("OriginalTransactionKey"));
        }

        Ok((service, amount, invoice))
    }

    /// Validates the transaction and lays it out as canonical request parameters.
    pub fn parameters(&self) -> Result<CanonicalParameters> {
        let (service, amount, invoice) = self.check_required()?;
        let settings = self.client.settings();
        let service_prefix = format!("Services.{}", service.code());

        let mut params: Vec<(String, String)> = vec![
            ("WebsiteKey".to_string(), settings.website_key.clone()),
            (
                "Culture".to_string(),
                self.culture.clone().unwrap_or_else(|| settings.culture.clone()),
            ),
            ("Channel".to_string(), settings.channel.clone()),
            (
                "Currency".to_string(),
                self.currency.clone().unwrap_or_else(|| settings.currency.clone()),
            ),
            (amount.field().to_string(), amount.formatted()),
            ("Invoice".to_string(), invoice.to_string()),
            (
                format!("{}.Action", service_prefix),
                amount.action().as_str().to_string(),
            ),
        ];

        let optional = [
            ("Order", self.order.clone()),
            ("Description", self.description.clone()),
            ("ClientIP", self.client_ip.map(|ip| ip.to_string())),
            ("OriginalTransactionKey", self.original_transaction_key.clone()),
            ("StartRecurrent", self.start_recurrent.then(|| "true".to_string())),
        ];
        params.extend(
            optional
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name.to_string(), v))),
        );

        params.extend(self.urls.iter().map(|(k, v)| (k.to_string(), v.clone())));
        params.extend(
            self.service_parameters
                .iter()
                .map(|(k, v)| (format!("{}.{}", service_prefix, k), v.clone())),
        );
        params.extend(
            self.custom_parameters
                .iter()
                .map(|(k, v)| (format!("CustomParameters.{}", k), v.clone())),
        );
        params.extend(
            self.additional_parameters
                .iter()
                .map(|(k, v)| (format!("AdditionalParameters.{}", k), v.clone())),
        );

        Ok(CanonicalParameters::new(params))
    }

    /// Validates, assembles and signs the transaction without sending it.
    pub fn sign(&self) -> Result<SignedPayload> {
        let parameters = self.parameters()?;
        let signer = self.client.signer();
        let signature = signer.sign(&parameters)?;

        Ok(SignedPayload {
            parameters,
            signature,
            digest: signer.digest(),
            test_mode: self.test_mode,
        })
    }

    /// Submits the transaction and decodes the gateway's answer.
    pub async fn perform(self) -> Result<ResponseBody> {
        let span = tracing::info_span!(
            "gateway_transaction",
            service = self.service.map(|s| s.code()).unwrap_or("none"),
            invoice = self.invoice.as_deref().unwrap_or(""),
            test_mode = self.test_mode,
        );

        async move {
            let payload = self.sign()?;
            tracing::info!("Submitting transaction with {} parameters", payload.parameters.len());
            tracing::debug!("Request parameters: {:?}", sanitize_parameters(&payload.parameters));

            let fragment = self
                .client
                .transport()
                .send(&payload)
                .await
                .map_err(|e| {
                    tracing::warn!("Transaction round-trip failed: {}", e);
                    GatewayError::from(e)
                })?;
            tracing::debug!("Response fragment: {}", sanitize_json(&fragment));

            let body = ResponseBody::from_fragment(fragment).map_err(|e| {
                tracing::warn!("Could not decode transaction response: {}", e);
                e
            })?;

            tracing::info!(
                "Transaction {} is {} (status {})",
                body.transaction_key().unwrap_or("-"),
                body.category(),
                body.status_code()
            );
            Ok::<_, GatewayError>(body)
        }
        .instrument(span)
        .await
    }
}
