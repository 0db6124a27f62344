pub mod config;
pub mod domain;
pub mod outbound;

pub use domain::{
    CheckName, DisbursementRequest, DisbursementResult, DisbursementTransport, MerchantIdentity,
    NonceToken,
};
pub use outbound::wechat_pay::{DisbursementClient, PaymentError, SignType, TransportError};
