//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BACKOFF_MS, DEFAULT_BASE_URL, DEFAULT_MAX_ATTEMPTS, LEGACY_BASE_URL,
};
use crate::types::Credentials;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    #[serde(flatten)]
    pub credentials: Credentials,
    /// Where the authorization server redirects after the user approves
    /// access. Only needed for the handshake.
    pub callback_url: Option<String>,
    pub base_url: String,
    pub legacy_base_url: String,
    /// 0 = warnings only, 1 = info, 2 = debug, 3+ = trace
    pub verbosity: u8,
    pub retry: RetrySettings,
}

/// Retry configuration for requests against the ledger service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            callback_url: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            legacy_base_url: LEGACY_BASE_URL.to_string(),
            verbosity: 0,
            retry: RetrySettings::default(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS, backoff_ms: DEFAULT_BACKOFF_MS }
    }
}

impl ClientConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials, ..Self::default() }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Legacy base URL without a trailing slash.
    pub fn legacy_base_url(&self) -> &str {
        self.legacy_base_url.trim_end_matches('/')
    }
}
