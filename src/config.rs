use std::collections::HashMap;
use std::time::Duration;

use config::{Config as ConfigLib, ConfigBuilder, ConfigError, Environment, builder::DefaultState};
use serde::{Deserialize, Serialize};

use crate::domain::DEFAULT_NONCE_LENGTH;
use crate::outbound::wechat_pay::SignType;

/// Enterprise disbursement endpoint of the provider
pub const DEFAULT_ENDPOINT: &str =
    "https://api.mch.weixin.qq.com/mmpaymkttransfers/promotion/transfers";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub wechat_pay: WeChatPayConfig,
}

/// Settings held by a [`DisbursementClient`](crate::DisbursementClient)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeChatPayConfig {
    pub endpoint: String,

    pub sign_type: SignType,

    pub nonce_length: usize,

    /// Passed to the HTTP client as-is; no timeout when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub user_agent: Option<String>,
}

impl WeChatPayConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for WeChatPayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            sign_type: SignType::default(),
            nonce_length: DEFAULT_NONCE_LENGTH,
            timeout_secs: None,
            user_agent: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_sources(None)
    }

    fn load_with_sources(env_vars: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let mut builder = Self::set_defaults()?;
        // Explicit overrides replace the system environment so tests stay isolated
        if let Some(vars) = env_vars {
            for (key, value) in vars {
                builder = builder.set_override(&key, value)?;
            }
        } else {
            // Format: ENTERPRISE_PAY_WECHAT_PAY__ENDPOINT, ENTERPRISE_PAY_WECHAT_PAY__SIGN_TYPE
            builder = builder.add_source(
                Environment::with_prefix("ENTERPRISE_PAY")
                    .prefix_separator("_")
                    .separator("__"),
            );
        }

        builder.build()?.try_deserialize()
    }

    /// Set default values for the configuration.
    fn set_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        ConfigLib::builder()
            .set_default("wechat_pay.endpoint", DEFAULT_ENDPOINT)?
            .set_default("wechat_pay.sign_type", SignType::default().as_str())?
            .set_default("wechat_pay.nonce_length", DEFAULT_NONCE_LENGTH as i64)
    }
}
