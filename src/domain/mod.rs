pub mod models;
pub mod ports;

pub use models::{
    CheckName, DEFAULT_NONCE_LENGTH, DisbursementRequest, DisbursementResult, MerchantIdentity,
    NonceToken,
};
pub use ports::DisbursementTransport;
