use async_trait::async_trait;
use reqwest::{Client, Identity, Response};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::WeChatPayConfig;
use crate::domain::{DisbursementTransport, MerchantIdentity};

use super::error::TransportError;

/// Largest response body read from the provider
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// HTTPS transport presenting the merchant's PKCS#12 certificate
pub struct ReqwestTransport {
    client: Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Build a mutually-authenticated client from the merchant certificate
    pub fn new(
        identity: &MerchantIdentity,
        config: &WeChatPayConfig,
    ) -> Result<Self, TransportError> {
        let tls_identity = Identity::from_pkcs12_der(
            identity.client_certificate(),
            identity.certificate_passphrase(),
        )
        .map_err(|e| TransportError::InvalidCertificate(e.to_string()))?;

        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("EnterprisePay/{}", env!("CARGO_PKG_VERSION")));

        let mut builder = Client::builder()
            .use_native_tls()
            .identity(tls_identity)
            .user_agent(user_agent);

        let timeout = config.timeout();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Wrap a preconfigured client, e.g. one with its own TLS setup
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Get configured timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Read the body chunk by chunk, stopping once it passes `MAX_BODY_SIZE`
    async fn read_response_body(
        &self,
        mut response: Response,
    ) -> Result<String, TransportError> {
        let too_large = TransportError::BodyTooLarge {
            limit: MAX_BODY_SIZE,
        };

        if response
            .content_length()
            .is_some_and(|len| len > MAX_BODY_SIZE as u64)
        {
            return Err(too_large);
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.timeout))?
        {
            if bytes.len() + chunk.len() > MAX_BODY_SIZE {
                return Err(too_large);
            }
            bytes.extend_from_slice(&chunk);
        }

        decode_body(bytes)
    }
}

#[async_trait]
impl DisbursementTransport for ReqwestTransport {
    async fn post_xml(&self, url: &str, body: String) -> Result<String, TransportError> {
        let start = Instant::now();

        let response = self
            .client
            .post(url)
            .header("Content-Type", "text/xml; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        debug!(
            url = %url,
            status = %status.as_u16(),
            response_time_ms = %start.elapsed().as_millis(),
            "Disbursement response received"
        );

        let body = self.read_response_body(response).await?;

        if !status.is_success() {
            return Err(TransportError::ResponseError { status, body });
        }

        Ok(body)
    }

    fn name(&self) -> &'static str {
        "ReqwestTransport"
    }
}

fn decode_body(bytes: Vec<u8>) -> Result<String, TransportError> {
    String::from_utf8(bytes).map_err(|e| TransportError::InvalidEncoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_body_keeps_utf8_unchanged() -> Result<(), TransportError> {
        let body = "<xml><re_user_name>张三</re_user_name></xml>";
        assert_eq!(decode_body(body.as_bytes().to_vec())?, body);
        Ok(())
    }

    #[test]
    fn test_decode_body_rejects_invalid_utf8() {
        // "张三" in GBK
        let mut body = b"<xml><re_user_name>".to_vec();
        body.extend_from_slice(&[0xD5, 0xC5, 0xC8, 0xFD]);
        body.extend_from_slice(b"</re_user_name></xml>");

        let result = decode_body(body);
        assert!(matches!(result, Err(TransportError::InvalidEncoding(_))));
    }

    #[test]
    fn test_invalid_certificate_is_rejected() {
        let identity = MerchantIdentity::new("A", "M", "K", b"not a pkcs12 file".to_vec(), None);

        let result = ReqwestTransport::new(&identity, &WeChatPayConfig::default());
        assert!(matches!(result, Err(TransportError::InvalidCertificate(_))));
    }

    #[test]
    fn test_from_client_has_no_timeout() {
        let transport = ReqwestTransport::from_client(Client::new());
        assert_eq!(transport.timeout(), None);
        assert_eq!(transport.name(), "ReqwestTransport");
    }
}
