use std::collections::BTreeMap;

use crate::domain::DisbursementResult;

use super::error::PaymentError;

pub const ERROR_CODE_FIELD: &str = "errcode";
pub const ERROR_MESSAGE_FIELD: &str = "errmsg";

/// Map a decoded response body to a result or a provider error.
///
/// A non-empty `errcode` is a failure carrying `errmsg`. Anything else is
/// returned unchanged.
pub fn interpret(decoded: BTreeMap<String, String>) -> Result<DisbursementResult, PaymentError> {
    match decoded.get(ERROR_CODE_FIELD) {
        Some(code) if !code.is_empty() => Err(PaymentError::Provider {
            code: code.clone(),
            message: decoded
                .get(ERROR_MESSAGE_FIELD)
                .cloned()
                .unwrap_or_default(),
        }),
        _ => Ok(DisbursementResult::new(decoded)),
    }
}
