// WeChat Pay enterprise disbursement
//
// Leaf components: signer, envelope, response
// Network: http_client (reqwest with a PKCS#12 client identity)
// Orchestration: client

pub mod client;
pub mod envelope;
pub mod error;
pub mod http_client;
pub mod response;
pub mod signer;

pub use client::{DisbursementClient, SIGN_FIELD};
pub use envelope::{EnvelopeError, build_envelope, parse_envelope};
pub use error::{ERROR_TAG, PaymentError, TransportError};
pub use http_client::ReqwestTransport;
pub use response::interpret;
pub use signer::{SignType, canonical_query_string, sign};
