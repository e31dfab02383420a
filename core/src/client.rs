//! One-shot HTTP client with optional manual redirect following.
//!
//! # Design
//! `HttpClient` owns a `RequestOptions` set and a `ResponseState`. Each verb
//! call opens a fresh transport handle, streams the response into the state,
//! classifies the outcome, and drops the handle on every exit path.
//!
//! Whether redirects are followed by the transport or by the client is
//! decided once, at construction, by asking the transport. When the client
//! follows them itself, a 301/302 is re-issued as a GET to the `Location`
//! target, in a loop bounded by `max_redirects`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{HttpClientError, TransportErrorKind};
use crate::http::{HttpMethod, PreparedRequest, RequestBody};
use crate::options::{ClientCertificate, Credentials, ProxyConfig, RequestOptions, TlsVersion};
use crate::response::{ResponseState, TransferInfo};
use crate::transport::{Transport, TransportFailure, TransportHandle};
use crate::types::{Payload, Query};
use crate::ureq_transport::UreqTransport;

#[derive(Debug, Clone, Copy, Default)]
struct RedirectState {
    followed: u32,
    manual: bool,
}

/// Synchronous HTTP client. Not meant to be shared between threads: every
/// verb call mutates the response state in place.
pub struct HttpClient<T: Transport = UreqTransport> {
    transport: T,
    options: RequestOptions,
    check_status: bool,
    response: ResponseState,
    redirects: RedirectState,
}

impl HttpClient<UreqTransport> {
    pub fn new() -> Self {
        Self::with_transport(UreqTransport::new())
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_config(UreqTransport::new(), config)
    }
}

impl Default for HttpClient<UreqTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> HttpClient<T> {
    pub fn with_transport(transport: T) -> Self {
        let native = transport.follows_redirects();
        let options = RequestOptions {
            follow_location: native,
            ..RequestOptions::default()
        };
        Self {
            transport,
            options,
            check_status: true,
            response: ResponseState::default(),
            redirects: RedirectState {
                followed: 0,
                manual: !native,
            },
        }
    }

    pub fn with_config(transport: T, config: &ClientConfig) -> Self {
        let mut client = Self::with_transport(transport);
        if config.manual_redirects {
            client.options.follow_location = false;
            client.redirects.manual = true;
        }
        client
            .check_status(config.check_status)
            .set_verify_peer(config.verify_peer)
            .set_ssl_version(config.tls_version)
            .set_max_redirects(config.max_redirects)
            .set_headers(&config.headers);
        if let Some(timeout) = config.timeout() {
            client.set_timeout(timeout);
        }
        if let Some(proxy) = &config.proxy {
            client.set_proxy(&proxy.host, proxy.port);
        }
        if let Some(user_agent) = &config.user_agent {
            client.set_user_agent(user_agent);
        }
        client
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    pub fn set_auth(&mut self, username: &str, password: &str) -> &mut Self {
        self.options.auth = Some(Credentials {
            username: username.to_string(),
            password: SecretString::from(password),
        });
        self
    }

    /// Turn status-based failure (4xx/5xx) on or off. On by default.
    pub fn check_status(&mut self, enabled: bool) -> &mut Self {
        self.check_status = enabled;
        self
    }

    /// Connect timeout and total timeout, both.
    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn set_proxy(&mut self, host: &str, port: Option<u16>) -> &mut Self {
        self.options.proxy = Some(ProxyConfig {
            host: host.to_string(),
            port,
        });
        self
    }

    pub fn set_verify_peer(&mut self, verify: bool) -> &mut Self {
        self.options.verify_peer = verify;
        self
    }

    pub fn set_ssl_certificate(&mut self, path: impl Into<PathBuf>, password: Option<&str>) -> &mut Self {
        self.options.client_certificate = Some(ClientCertificate {
            path: path.into(),
            password: password.map(SecretString::from),
        });
        self
    }

    /// Only `Default` and `Tls1_2` can be honored by the ureq transport; other
    /// versions make `https` requests fail with `SslConnectError`. Plain
    /// `http` requests ignore the setting.
    pub fn set_ssl_version(&mut self, version: TlsVersion) -> &mut Self {
        self.options.tls_version = version;
        self
    }

    pub fn set_max_redirects(&mut self, max: u32) -> &mut Self {
        self.options.max_redirects = max;
        self
    }

    /// Append a request header. Earlier headers with the same name are kept.
    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.options.headers.push(format!("{name}: {value}"));
        self
    }

    pub fn set_headers<K, V>(&mut self, headers: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in headers {
            self.set_header(name.as_ref(), value.as_ref());
        }
        self
    }

    pub fn set_user_agent(&mut self, value: &str) -> &mut Self {
        self.set_header("User-Agent", value)
    }

    // -----------------------------------------------------------------------
    // Verbs
    // -----------------------------------------------------------------------

    pub fn get(&mut self, uri: &str) -> Result<&mut Self, HttpClientError> {
        let handle = self.start_request()?;
        self.execute(handle, PreparedRequest::get(uri))
    }

    /// GET with a query string appended as `uri?query`. An empty query leaves
    /// the URI untouched.
    pub fn get_with_query(&mut self, uri: &str, query: impl Into<Query>) -> Result<&mut Self, HttpClientError> {
        let handle = self.start_request()?;
        let query = query.into().encode()?;
        let url = if query.is_empty() {
            uri.to_string()
        } else {
            format!("{uri}?{query}")
        };
        self.execute(handle, PreparedRequest::get(url))
    }

    pub fn post(&mut self, uri: &str, data: impl Into<Payload>) -> Result<&mut Self, HttpClientError> {
        let handle = self.start_request()?;
        let body = RequestBody::Bytes(data.into().into_bytes()?);
        self.execute(handle, PreparedRequest::new(HttpMethod::Post, uri, body))
    }

    pub fn head(&mut self, uri: &str) -> Result<&mut Self, HttpClientError> {
        let handle = self.start_request()?;
        self.execute(handle, PreparedRequest::new(HttpMethod::Head, uri, RequestBody::Empty))
    }

    /// PUT streams the payload from a temporary file with a declared length.
    pub fn put(&mut self, uri: &str, data: impl Into<Payload>) -> Result<&mut Self, HttpClientError> {
        let handle = self.start_request()?;
        let body = spool(&data.into().into_bytes()?)?;
        self.execute(handle, PreparedRequest::new(HttpMethod::Put, uri, body))
    }

    pub fn delete(&mut self, uri: &str) -> Result<&mut Self, HttpClientError> {
        let handle = self.start_request()?;
        self.execute(handle, PreparedRequest::new(HttpMethod::Delete, uri, RequestBody::Empty))
    }

    // -----------------------------------------------------------------------
    // Response accessors (most recent execution only)
    // -----------------------------------------------------------------------

    pub fn status(&self) -> u16 {
        self.response.info().http_code
    }

    /// Raw status line, including its line terminator. Empty if none arrived.
    pub fn status_message(&self) -> &str {
        self.response.status_line().unwrap_or_default()
    }

    pub fn body(&self) -> &[u8] {
        self.response.body()
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.response.body())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.response.header(name)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        self.response.headers()
    }

    pub fn info(&self) -> &TransferInfo {
        self.response.info()
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// True once the last handle was configured. Set before the network call.
    pub fn is_handle_ready(&self) -> bool {
        self.response.is_handle_ready()
    }

    pub fn redirects_followed(&self) -> u32 {
        self.redirects.followed
    }

    pub fn follows_manually(&self) -> bool {
        self.redirects.manual
    }

    // -----------------------------------------------------------------------
    // Execution
    // -----------------------------------------------------------------------

    /// Entry point of every verb: a new logical request starts a new
    /// redirect chain.
    fn start_request(&mut self) -> Result<Box<dyn TransportHandle>, HttpClientError> {
        self.redirects.followed = 0;
        self.init_request()
    }

    fn init_request(&mut self) -> Result<Box<dyn TransportHandle>, HttpClientError> {
        self.response = ResponseState::default();
        let handle = self.transport.open(&self.options)?;
        self.response.mark_handle_ready();
        Ok(handle)
    }

    fn execute(
        &mut self,
        mut handle: Box<dyn TransportHandle>,
        mut request: PreparedRequest,
    ) -> Result<&mut Self, HttpClientError> {
        loop {
            tracing::debug!(method = %request.method, url = %request.url, "sending request");
            let outcome = handle.perform(request, &mut self.response);
            let next = self.check_response(handle.as_ref(), outcome)?;
            drop(handle);

            match next {
                Some(url) => {
                    handle = self.init_request()?;
                    request = PreparedRequest::get(url);
                }
                None => return Ok(self),
            }
        }
    }

    /// Classify a finished execution. Returns the next URL to fetch when a
    /// manual redirect is due.
    fn check_response(
        &mut self,
        handle: &dyn TransportHandle,
        outcome: Result<(), TransportFailure>,
    ) -> Result<Option<String>, HttpClientError> {
        self.response.set_info(handle.info());

        if let Err(failure) = outcome {
            tracing::warn!(
                url = %self.response.info().effective_url,
                code = failure.kind.code(),
                error = %failure.message,
                "transport failure"
            );
            return Err(failure.into());
        }

        let status = self.status();
        tracing::debug!(
            status,
            elapsed_ms = self.response.info().total_time.as_millis(),
            bytes = self.response.body().len(),
            "response received"
        );

        if self.check_status && (400..=599).contains(&status) {
            tracing::warn!(status, url = %self.response.info().effective_url, "HTTP error status");
            return Err(HttpClientError::HttpStatus {
                code: status,
                message: self.status_message().to_string(),
            });
        }

        if self.redirects.manual {
            return self.follow_redirect_path();
        }
        Ok(None)
    }

    fn follow_redirect_path(&mut self) -> Result<Option<String>, HttpClientError> {
        self.redirects.followed += 1;
        if !matches!(self.status(), 301 | 302) {
            self.redirects.followed = 0;
            return Ok(None);
        }

        let limit = self.options.max_redirects;
        if self.redirects.followed >= limit {
            tracing::warn!(limit, "redirect limit reached");
            return Err(HttpClientError::TooManyRedirects { limit });
        }

        let location = self.header("Location").ok_or_else(|| HttpClientError::Transport {
            code: TransportErrorKind::UrlMalformat,
            message: format!("{} response without a Location header", self.status()),
        })?;
        let from = &self.response.info().effective_url;
        let target = resolve_location(location, from)?;
        tracing::debug!(%from, to = %target, redirects = self.redirects.followed, "following redirect");
        Ok(Some(target))
    }
}

/// An absolute `Location` (scheme and host) is used as-is; anything else is
/// appended to the origin of the URL that produced the redirect.
fn resolve_location(location: &str, effective_url: &str) -> Result<String, HttpClientError> {
    if Url::parse(location).is_ok_and(|url| url.has_host()) {
        return Ok(location.to_string());
    }

    let malformed = |reason: String| HttpClientError::Transport {
        code: TransportErrorKind::UrlMalformat,
        message: reason,
    };
    let base = Url::parse(effective_url)
        .map_err(|e| malformed(format!("cannot resolve redirect from '{effective_url}': {e}")))?;
    let host = base
        .host_str()
        .ok_or_else(|| malformed(format!("cannot resolve redirect from '{effective_url}': no host")))?;

    Ok(match base.port() {
        Some(port) => format!("{}://{host}:{port}{location}", base.scheme()),
        None => format!("{}://{host}{location}", base.scheme()),
    })
}

fn spool(data: &[u8]) -> Result<RequestBody, HttpClientError> {
    let mut file = tempfile::tempfile().map_err(HttpClientError::Spool)?;
    file.write_all(data).map_err(HttpClientError::Spool)?;
    file.seek(SeekFrom::Start(0)).map_err(HttpClientError::Spool)?;
    Ok(RequestBody::Spooled {
        file,
        len: data.len() as u64,
    })
}
