//! Configuration management

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    APP_TOKEN_PATH, DEFAULT_CONNECTIVITY_TIMEOUT_MS, DEFAULT_KEYCHAIN_SERVICE,
    DEFAULT_MAX_RETRIES, DEFAULT_MOCK_DELAY_MS, DEFAULT_RETRY_BASE_DELAY_MS,
    DEFAULT_RETRY_MAX_DELAY_MS, DEFAULT_TIMEOUT_MS, LOGIN_PATH, REFRESH_PATH,
};
use crate::errors::{Result, TollgateError};

/// Client configuration
///
/// `networking_enabled = false` switches the whole client into mock mode:
/// no request leaves the process and responses are synthesized locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub networking_enabled: bool,
    #[serde(skip_serializing)]
    pub client_key: String,
    pub timeout_ms: u64,
    pub connectivity_timeout_ms: u64,
    pub mock_delay_ms: u64,
    /// Tokens expiring within this many seconds are treated as expired
    pub expiry_leeway_secs: i64,
    pub retry: RetrySettings,
    pub endpoints: EndpointConfig,
    pub storage: StorageConfig,
}

/// Retry budget for transient failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

/// Paths of the credential-issuing endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub app_token: String,
    pub login: String,
    pub refresh: String,
}

/// Credential storage backend selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Keychain service name for high-sensitivity credentials
    pub keychain_service: String,
    /// Use the platform keychain for high-sensitivity credentials
    pub use_keychain: bool,
    /// Persist low-sensitivity credentials to this JSON file instead of memory
    pub plain_store_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            networking_enabled: true,
            client_key: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            connectivity_timeout_ms: DEFAULT_CONNECTIVITY_TIMEOUT_MS,
            mock_delay_ms: DEFAULT_MOCK_DELAY_MS,
            expiry_leeway_secs: 0,
            retry: RetrySettings::default(),
            endpoints: EndpointConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            app_token: APP_TOKEN_PATH.to_string(),
            login: LOGIN_PATH.to_string(),
            refresh: REFRESH_PATH.to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            keychain_service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
            use_keychain: true,
            plain_store_path: None,
        }
    }
}

impl ClientConfig {
    /// Configuration for a live backend at `base_url`
    pub fn new(base_url: impl Into<String>, client_key: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), client_key: client_key.into(), ..Self::default() }
    }

    /// Configuration for mock mode (no backend required)
    pub fn mock(client_key: impl Into<String>) -> Self {
        Self { networking_enabled: false, client_key: client_key.into(), ..Self::default() }
    }

    /// Whether responses are synthesized locally
    #[must_use]
    pub const fn is_mock_mode(&self) -> bool {
        !self.networking_enabled
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub const fn connectivity_timeout(&self) -> Duration {
        Duration::from_millis(self.connectivity_timeout_ms)
    }

    #[must_use]
    pub const fn mock_delay(&self) -> Duration {
        Duration::from_millis(self.mock_delay_ms)
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns `TollgateError::Config` when a live configuration lacks a
    /// usable base URL, when the client key is empty, or when the timeout
    /// is zero.
    pub fn validate(&self) -> Result<()> {
        if self.networking_enabled {
            let url = self.base_url.trim();
            if url.is_empty() {
                return Err(TollgateError::Config("base_url is required".to_string()));
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(TollgateError::Config(format!(
                    "base_url must start with http:// or https://: {url}"
                )));
            }
        }

        if self.client_key.trim().is_empty() {
            return Err(TollgateError::Config("client_key is required".to_string()));
        }

        if self.timeout_ms == 0 {
            return Err(TollgateError::Config("timeout_ms must be greater than 0".to_string()));
        }

        Ok(())
    }
}

impl RetrySettings {
    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}
