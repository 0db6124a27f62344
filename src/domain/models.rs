use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Default number of characters in a nonce
pub const DEFAULT_NONCE_LENGTH: usize = 32;

/// Merchant credentials used to sign and authenticate every call
#[derive(Clone)]
pub struct MerchantIdentity {
    app_id: String,
    merchant_id: String,
    signing_key: String,
    client_certificate: Vec<u8>,
    certificate_passphrase: String,
}

impl MerchantIdentity {
    /// Create an identity from an already loaded PKCS#12 certificate.
    ///
    /// The certificate passphrase defaults to the merchant id when `None`,
    /// which is how the provider issues merchant certificates.
    pub fn new(
        app_id: impl Into<String>,
        merchant_id: impl Into<String>,
        signing_key: impl Into<String>,
        client_certificate: Vec<u8>,
        certificate_passphrase: Option<String>,
    ) -> Self {
        let merchant_id = merchant_id.into();
        let certificate_passphrase = certificate_passphrase.unwrap_or_else(|| merchant_id.clone());

        Self {
            app_id: app_id.into(),
            merchant_id,
            signing_key: signing_key.into(),
            client_certificate,
            certificate_passphrase,
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    pub fn signing_key(&self) -> &str {
        &self.signing_key
    }

    pub fn client_certificate(&self) -> &[u8] {
        &self.client_certificate
    }

    pub fn certificate_passphrase(&self) -> &str {
        &self.certificate_passphrase
    }
}

impl fmt::Debug for MerchantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantIdentity")
            .field("app_id", &self.app_id)
            .field("merchant_id", &self.merchant_id)
            .field("signing_key", &"<redacted>")
            .field(
                "client_certificate",
                &format_args!("<{} bytes>", self.client_certificate.len()),
            )
            .field("certificate_passphrase", &"<redacted>")
            .finish()
    }
}

/// Random alphanumeric string sent as `nonce_str`.
///
/// A client generates one token at construction and sends it with every call
/// it makes. Nonces are conventionally per request, so callers that care about
/// replay protection should use one client per disbursement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceToken(String);

impl NonceToken {
    /// Generate a token of `length` characters drawn uniformly from `[A-Za-z0-9]`.
    /// A length of zero falls back to [`DEFAULT_NONCE_LENGTH`].
    pub fn generate(length: usize) -> Self {
        let length = if length == 0 {
            DEFAULT_NONCE_LENGTH
        } else {
            length
        };

        let token = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect();

        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NonceToken {
    fn default() -> Self {
        Self::generate(DEFAULT_NONCE_LENGTH)
    }
}

impl fmt::Display for NonceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether the provider checks the receiver's real name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckName {
    #[default]
    NoCheck,
    ForceCheck,
    OptionCheck,
}

impl CheckName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckName::NoCheck => "NO_CHECK",
            CheckName::ForceCheck => "FORCE_CHECK",
            CheckName::OptionCheck => "OPTION_CHECK",
        }
    }
}

/// A single payout to an individual user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisbursementRequest {
    /// Accepted for callers but not sent to the provider
    pub device_info: Option<String>,

    /// Merchant-side unique order number
    pub partner_trade_no: String,

    pub openid: String,

    /// Sent as `check_name` when set
    pub check_name: Option<CheckName>,

    pub re_user_name: Option<String>,

    /// Amount in minor currency units (fen)
    pub amount: u64,

    pub desc: String,

    /// IP address of the machine issuing the call
    pub spbill_create_ip: String,
}

impl DisbursementRequest {
    /// Create a request with only the required fields set
    pub fn new(
        partner_trade_no: impl Into<String>,
        openid: impl Into<String>,
        amount: u64,
        desc: impl Into<String>,
        spbill_create_ip: impl Into<String>,
    ) -> Self {
        Self {
            device_info: None,
            partner_trade_no: partner_trade_no.into(),
            openid: openid.into(),
            check_name: None,
            re_user_name: None,
            amount,
            desc: desc.into(),
            spbill_create_ip: spbill_create_ip.into(),
        }
    }

    pub fn with_device_info(mut self, device_info: impl Into<String>) -> Self {
        self.device_info = Some(device_info.into());
        self
    }

    /// Require the receiver's real name to match `name`
    pub fn with_receiver_name(mut self, name: impl Into<String>) -> Self {
        self.check_name = Some(CheckName::ForceCheck);
        self.re_user_name = Some(name.into());
        self
    }

    pub fn with_check_name(mut self, check_name: CheckName) -> Self {
        self.check_name = Some(check_name);
        self
    }
}

/// Decoded provider response, returned exactly as received
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisbursementResult(BTreeMap<String, String>);

impl DisbursementResult {
    pub fn new(fields: BTreeMap<String, String>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Provider-side payment number, present on a completed transfer
    pub fn payment_no(&self) -> Option<&str> {
        self.get("payment_no")
    }

    pub fn partner_trade_no(&self) -> Option<&str> {
        self.get("partner_trade_no")
    }

    pub fn payment_time(&self) -> Option<&str> {
        self.get("payment_time")
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn into_fields(self) -> BTreeMap<String, String> {
        self.0
    }
}
