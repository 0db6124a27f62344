/*
   This module specifies the seam between the disbursement client and the
   network. The client signs and serializes; the transport only delivers bytes.
*/

use async_trait::async_trait;

use crate::outbound::wechat_pay::error::TransportError;

/// Delivers a serialized request body and returns the raw response body
#[async_trait]
pub trait DisbursementTransport: Send + Sync {
    async fn post_xml(&self, url: &str, body: String) -> Result<String, TransportError>;

    fn name(&self) -> &'static str {
        "UnnamedTransport"
    }
}
