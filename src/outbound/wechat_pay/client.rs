use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::WeChatPayConfig;
use crate::domain::{
    DisbursementRequest, DisbursementResult, DisbursementTransport, MerchantIdentity, NonceToken,
};

use super::envelope::{build_envelope, parse_envelope};
use super::error::PaymentError;
use super::http_client::ReqwestTransport;
use super::response::interpret;
use super::signer::sign;

/// Wire name of the signature field
pub const SIGN_FIELD: &str = "sign";

/// Client for the enterprise disbursement API.
///
/// Holds the merchant identity, one nonce shared by every call, and the
/// transport. All of it is read-only after construction, so one client can
/// serve concurrent calls.
pub struct DisbursementClient {
    identity: MerchantIdentity,
    nonce: NonceToken,
    config: WeChatPayConfig,
    transport: Arc<dyn DisbursementTransport>,
}

impl DisbursementClient {
    /// Create a client that talks to the provider over mutual TLS
    pub fn new(identity: MerchantIdentity, config: WeChatPayConfig) -> Result<Self, PaymentError> {
        let transport = ReqwestTransport::new(&identity, &config)?;
        Ok(Self::with_transport(identity, config, Arc::new(transport)))
    }

    /// Create a client over a caller-provided transport
    pub fn with_transport(
        identity: MerchantIdentity,
        config: WeChatPayConfig,
        transport: Arc<dyn DisbursementTransport>,
    ) -> Self {
        let nonce = NonceToken::generate(config.nonce_length);
        Self {
            identity,
            nonce,
            config,
            transport,
        }
    }

    pub fn nonce(&self) -> &NonceToken {
        &self.nonce
    }

    pub fn config(&self) -> &WeChatPayConfig {
        &self.config
    }

    /// Pay out `request` and return the provider's decoded response
    pub async fn disburse(
        &self,
        request: &DisbursementRequest,
    ) -> Result<DisbursementResult, PaymentError> {
        let body = self.build_request_body(request)?;

        debug!(
            endpoint = %self.config.endpoint,
            partner_trade_no = %request.partner_trade_no,
            transport = self.transport.name(),
            "Sending disbursement"
        );

        let response = self
            .transport
            .post_xml(&self.config.endpoint, body)
            .await
            .map_err(|e| {
                warn!(
                    partner_trade_no = %request.partner_trade_no,
                    error = %e,
                    "Disbursement transport failed"
                );
                PaymentError::Transport(e)
            })?;

        interpret(parse_envelope(&response)?)
    }

    /// Merchant fields plus request fields under their wire names.
    /// Absent or empty values are left out. `device_info` is never sent.
    pub fn signable_parameters(&self, request: &DisbursementRequest) -> BTreeMap<String, String> {
        let entries = [
            ("mch_appid", Some(self.identity.app_id().to_string())),
            ("mchid", Some(self.identity.merchant_id().to_string())),
            ("nonce_str", Some(self.nonce.to_string())),
            ("partner_trade_no", Some(request.partner_trade_no.clone())),
            ("openid", Some(request.openid.clone())),
            (
                "check_name",
                request.check_name.map(|c| c.as_str().to_string()),
            ),
            ("re_user_name", request.re_user_name.clone()),
            ("amount", Some(request.amount.to_string())),
            ("desc", Some(request.desc.clone())),
            ("spbill_create_ip", Some(request.spbill_create_ip.clone())),
        ];

        entries
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .filter(|v| !v.is_empty())
                    .map(|v| (key.to_string(), v))
            })
            .collect()
    }

    /// Signed XML body for `request`
    pub fn build_request_body(&self, request: &DisbursementRequest) -> Result<String, PaymentError> {
        let mut params = self.signable_parameters(request);
        let signature = sign(
            &params,
            self.identity.signing_key(),
            self.config.sign_type,
        );
        params.insert(SIGN_FIELD.to_string(), signature);

        Ok(build_envelope(
            params.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )?)
    }
}
