//! Per-client transport options.
//!
//! # Design
//! `RequestOptions` is the typed form of the option set handed to the
//! transport before every execution. Setters on `HttpClient` are the only
//! writers; the executor and transports only read it. Passwords are held as
//! `SecretString` so `Debug` output and logs never show them.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

/// Default ceiling for redirect chains.
pub const DEFAULT_MAX_REDIRECTS: u32 = 20;

/// Basic-auth credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// Proxy target. `host` may carry a scheme (`http://proxy.local`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProxyConfig {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
}

impl ProxyConfig {
    /// `host` or `host:port`.
    pub fn address(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{port}", self.host),
            None => self.host.clone(),
        }
    }
}

/// Client certificate in PEM form, with an optional key passphrase.
#[derive(Debug, Clone)]
pub struct ClientCertificate {
    pub path: PathBuf,
    pub password: Option<SecretString>,
}

/// TLS protocol version requested for HTTPS connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsVersion {
    #[default]
    Default,
    Tls1_0,
    Tls1_1,
    Tls1_2,
    Tls1_3,
}

/// Everything a transport needs to configure a handle.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Raw `"Name: value"` lines, in the order they were added.
    pub headers: Vec<String>,
    pub auth: Option<Credentials>,
    /// Applied as both the connect timeout and the total timeout.
    pub timeout: Option<Duration>,
    pub proxy: Option<ProxyConfig>,
    pub verify_peer: bool,
    pub client_certificate: Option<ClientCertificate>,
    pub tls_version: TlsVersion,
    /// Let the transport follow redirects itself.
    pub follow_location: bool,
    pub max_redirects: u32,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            auth: None,
            timeout: None,
            proxy: None,
            verify_peer: true,
            client_certificate: None,
            tls_version: TlsVersion::Default,
            follow_location: false,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}
