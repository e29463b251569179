//! Client for the Buckaroo payment gateway: build a transaction, sign it with
//! the merchant key, submit it over SOAP and read back a typed response.

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod services;
pub mod utils;
pub mod validation;

pub use client::{ClientSettings, GatewayClient};
pub use config::Config;
pub use domain::status_codes;
pub use domain::{CardBrand, PaymentService, ResponseBody, StatusCategory};
pub use error::{GatewayError, Result};
pub use gateway::{
    CircuitState, HttpTransport, SignedPayload, Transport, TransportError, TransportSettings,
};
pub use services::{PushNotification, PushVerifier, RequestSigner, SignatureDigest, TransactionBuilder};
