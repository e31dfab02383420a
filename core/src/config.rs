//! JSON configuration for `HttpClient`.
//!
//! # Design
//! `ClientConfig` mirrors the setter surface so a client can be described in a
//! file instead of code. Every field is optional; omitted fields keep the
//! setter defaults. Unknown keys are rejected to catch typos early.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::options::{ProxyConfig, TlsVersion, DEFAULT_MAX_REDIRECTS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid client config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub timeout_secs: Option<u64>,
    pub verify_peer: bool,
    pub check_status: bool,
    pub user_agent: Option<String>,
    pub proxy: Option<ProxyConfig>,
    pub tls_version: TlsVersion,
    pub max_redirects: u32,
    /// Follow 301/302 in the client even if the transport could do it.
    pub manual_redirects: bool,
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            verify_peer: true,
            check_status: true,
            user_agent: None,
            proxy: None,
            tls_version: TlsVersion::Default,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            manual_redirects: false,
            headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
