pub mod push;
pub mod signer;
pub mod transaction;

pub use push::{PushError, PushNotification, PushVerifier};
pub use signer::{CanonicalParameters, RequestSigner, SignatureDigest};
pub use transaction::TransactionBuilder;
