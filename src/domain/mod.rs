//! Gateway domain: request-side vocabulary and the decoded response graph.

pub mod consumer_message;
pub mod parameters;
pub mod payment_service;
pub mod request_errors;
pub mod required_action;
pub mod response_body;
pub mod service;
pub mod status;
pub mod status_codes;

pub use consumer_message::ConsumerMessage;
pub use parameters::{AdditionalParameters, CustomParameters};
pub use payment_service::{CardBrand, PaymentService, ServiceAction};
pub use request_errors::{RequestError, RequestErrorKind, RequestErrors};
pub use required_action::{RequiredAction, RequiredActionType};
pub use response_body::ResponseBody;
pub use service::{Service, ServiceParameter, Services};
pub use status::{Status, SubCode};
pub use status_codes::{Permanence, StatusCategory};
