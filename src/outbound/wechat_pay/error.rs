use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use super::envelope::EnvelopeError;

/// Tag prefixed to every error name raised by this client
pub const ERROR_TAG: &str = "WeChatPay";

/// Error type for the outbound HTTPS call
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// Duration is `None` when the timeout came from a preconfigured client
    #[error("Request timeout{}", timeout_suffix(.0))]
    Timeout(Option<Duration>),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Response error: status={status}, body={body}")]
    ResponseError { status: StatusCode, body: String },

    #[error("Invalid client certificate: {0}")]
    InvalidCertificate(String),

    #[error("Response body is not valid UTF-8: {0}")]
    InvalidEncoding(String),

    #[error("Response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

fn timeout_suffix(timeout: &Option<Duration>) -> String {
    timeout
        .map(|t| format!(" after {t:?}"))
        .unwrap_or_default()
}

impl TransportError {
    /// Kind of failure, without the client tag
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::RequestFailed(_) => "RequestError",
            TransportError::Timeout(_) => "TimeoutError",
            TransportError::NetworkError(_) => "NetworkError",
            TransportError::ResponseError { .. } => "ResponseError",
            TransportError::InvalidCertificate(_) => "CertificateError",
            TransportError::InvalidEncoding(_) => "EncodingError",
            TransportError::BodyTooLarge { .. } => "BodyTooLargeError",
        }
    }

    /// Build from a reqwest error, reporting `timeout` when the request timed out
    pub fn from_reqwest(err: reqwest::Error, timeout: Option<Duration>) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(timeout)
        } else if err.is_connect() {
            TransportError::NetworkError(err.to_string())
        } else {
            TransportError::RequestFailed(err.to_string())
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::from_reqwest(err, None)
    }
}

/// Error returned by [`DisbursementClient::disburse`](super::DisbursementClient::disburse)
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The network call itself failed
    #[error("WeChatPay transport error: {0}")]
    Transport(#[source] TransportError),

    /// The provider answered with an error code
    #[error("WeChatPay error {code}: {message}")]
    Provider { code: String, message: String },

    /// The response body could not be decoded
    #[error("WeChatPay response could not be decoded: {0}")]
    Envelope(#[from] EnvelopeError),
}

impl PaymentError {
    /// Tagged error name, e.g. `WeChatPayError` or `WeChatPayTimeoutError`
    pub fn name(&self) -> String {
        match self {
            PaymentError::Transport(err) => format!("{ERROR_TAG}{}", err.kind()),
            PaymentError::Provider { .. } => format!("{ERROR_TAG}Error"),
            PaymentError::Envelope(_) => format!("{ERROR_TAG}EnvelopeError"),
        }
    }

    /// Provider error code, only set when the provider rejected the call
    pub fn provider_code(&self) -> Option<&str> {
        match self {
            PaymentError::Provider { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, PaymentError::Transport(_))
    }
}

impl From<TransportError> for PaymentError {
    fn from(err: TransportError) -> Self {
        PaymentError::Transport(err)
    }
}
