//! `Transport` backed by a blocking `ureq` agent.
//!
//! # Design
//! Every request gets a fresh `ureq::Agent` built from the handle's option
//! set, so no connection is reused across calls. ureq hands back a parsed
//! response; the handle replays it into the sink as raw header lines
//! followed by body chunks, which keeps the executor independent of ureq's
//! types.

use std::io::Read;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use secrecy::ExposeSecret;
use ureq::tls::{ClientCert, PemItem, TlsConfig};
use ureq::typestate::WithBody;
use ureq::{Agent, RequestBuilder, ResponseExt, SendBody};

use crate::error::TransportErrorKind;
use crate::http::{HttpMethod, PreparedRequest, RequestBody};
use crate::options::{ClientCertificate, RequestOptions, TlsVersion};
use crate::response::TransferInfo;
use crate::transport::{deliver, ResponseSink, Transport, TransportFailure, TransportHandle};

const CHUNK_SIZE: usize = 16 * 1024;

/// Blocking transport over `ureq`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    native_redirects: bool,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            native_redirects: true,
        }
    }

    /// A transport that never follows redirects itself, as in environments
    /// where automatic following is disallowed. The client then follows
    /// 301/302 responses on its own.
    pub fn without_native_redirects() -> Self {
        Self {
            native_redirects: false,
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn follows_redirects(&self) -> bool {
        self.native_redirects
    }

    fn open(&self, options: &RequestOptions) -> Result<Box<dyn TransportHandle>, TransportFailure> {
        let proxy = options
            .proxy
            .as_ref()
            .map(|proxy| {
                ureq::Proxy::new(&proxy.address())
                    .map_err(|e| TransportFailure::new(TransportErrorKind::CouldntResolveProxy, e.to_string()))
            })
            .transpose()?;
        let mut headers = request_headers(options);
        if let Some(auth) = &options.auth {
            let token = STANDARD.encode(format!(
                "{}:{}",
                auth.username,
                auth.password.expose_secret()
            ));
            headers.push(("Authorization".to_string(), format!("Basic {token}")));
        }
        Ok(Box::new(UreqHandle {
            options: options.clone(),
            follow: self.native_redirects && options.follow_location,
            proxy,
            headers,
            info: TransferInfo::default(),
        }))
    }
}

/// TLS settings only matter, and are only validated, for `https` targets.
fn is_tls(url: &str) -> bool {
    url.get(..8).is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"))
}

/// rustls always offers TLS 1.2 and 1.3 and cannot be pinned to a single
/// version, so only the default and the 1.2 floor can be honored.
fn check_tls_version(version: TlsVersion) -> Result<(), TransportFailure> {
    match version {
        TlsVersion::Default | TlsVersion::Tls1_2 => Ok(()),
        TlsVersion::Tls1_0 | TlsVersion::Tls1_1 | TlsVersion::Tls1_3 => Err(TransportFailure::new(
            TransportErrorKind::SslConnectError,
            format!("TLS version {version:?} is not supported"),
        )),
    }
}

fn load_client_cert(certificate: &ClientCertificate) -> Result<ClientCert, TransportFailure> {
    let cert_problem = |message: String| TransportFailure::new(TransportErrorKind::SslCertProblem, message);

    if certificate.password.is_some() {
        return Err(cert_problem(
            "encrypted client keys are not supported; provide an unencrypted PEM key".to_string(),
        ));
    }
    let pem = std::fs::read(&certificate.path)
        .map_err(|e| cert_problem(format!("could not read {}: {e}", certificate.path.display())))?;

    let mut chain = Vec::new();
    let mut key = None;
    for item in ureq::tls::parse_pem(&pem) {
        match item.map_err(|e| cert_problem(e.to_string()))? {
            PemItem::Certificate(cert) => chain.push(cert.to_owned()),
            PemItem::PrivateKey(private) => key = Some(private.to_owned()),
            _ => {}
        }
    }
    let key = key.ok_or_else(|| {
        cert_problem(format!("no private key in {}", certificate.path.display()))
    })?;
    Ok(ClientCert::new_with_certs(&chain, key))
}

/// Split the raw `"Name: value"` header lines into pairs.
fn request_headers(options: &RequestOptions) -> Vec<(String, String)> {
    options
        .headers
        .iter()
        .filter_map(|line| match line.split_once(':') {
            Some((name, value)) => Some((name.trim().to_string(), value.trim().to_string())),
            None => {
                tracing::warn!(header = %line, "skipping malformed request header");
                None
            }
        })
        .collect()
}

struct UreqHandle {
    options: RequestOptions,
    follow: bool,
    proxy: Option<ureq::Proxy>,
    headers: Vec<(String, String)>,
    info: TransferInfo,
}

impl UreqHandle {
    fn build_agent(&self, tls: bool) -> Result<Agent, TransportFailure> {
        let mut tls_config = TlsConfig::builder().disable_verification(!self.options.verify_peer);
        if tls {
            check_tls_version(self.options.tls_version)?;
            if let Some(certificate) = &self.options.client_certificate {
                tls_config = tls_config.client_cert(Some(load_client_cert(certificate)?));
            }
        }

        let config = Agent::config_builder()
            .http_status_as_error(false)
            .save_redirect_history(true)
            .max_redirects(if self.follow { self.options.max_redirects } else { 0 })
            .timeout_global(self.options.timeout)
            .timeout_connect(self.options.timeout)
            .proxy(self.proxy.clone())
            .tls_config(tls_config.build())
            .build();
        Ok(config.new_agent())
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    fn send(&self, agent: &Agent, request: PreparedRequest) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        let url = request.url.as_str();
        match (request.method, request.body) {
            (HttpMethod::Get, _) => self.with_headers(agent.get(url)).call(),
            (HttpMethod::Head, _) => self.with_headers(agent.head(url)).call(),
            (HttpMethod::Delete, _) => self.with_headers(agent.delete(url)).call(),
            (HttpMethod::Post, body) => {
                let mut builder = self.with_headers(agent.post(url));
                if !self.has_header("Content-Type") {
                    builder = builder.header("Content-Type", "application/x-www-form-urlencoded");
                }
                send_body(builder, body)
            }
            (HttpMethod::Put, body) => {
                let builder = self
                    .with_headers(agent.put(url))
                    .header("Content-Length", body.len().to_string());
                send_body(builder, body)
            }
        }
    }

    fn with_headers<B>(&self, mut builder: RequestBuilder<B>) -> RequestBuilder<B> {
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }
}

fn send_body(
    builder: RequestBuilder<WithBody>,
    body: RequestBody,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        RequestBody::Empty => builder.send_empty(),
        RequestBody::Bytes(bytes) => builder.send(&bytes[..]),
        RequestBody::Spooled { mut file, .. } => builder.send(SendBody::from_reader(&mut file)),
    }
}

impl TransportHandle for UreqHandle {
    fn perform(
        &mut self,
        request: PreparedRequest,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), TransportFailure> {
        let started = Instant::now();
        self.info = TransferInfo {
            effective_url: request.url.clone(),
            size_upload: request.body.len(),
            ..TransferInfo::default()
        };

        let agent = self.build_agent(is_tls(&request.url))?;
        let result = self.send(&agent, request);
        self.info.total_time = started.elapsed();
        let mut response = result.map_err(classify)?;

        let status = response.status();
        self.info.http_code = status.as_u16();
        self.info.effective_url = response.get_uri().to_string();
        self.info.redirect_count = response
            .get_redirect_history()
            .map_or(0, |history| u32::try_from(history.len().saturating_sub(1)).unwrap_or(u32::MAX));
        self.info.content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let status_line = format!(
            "{:?} {} {}",
            response.version(),
            status.as_str(),
            status.canonical_reason().unwrap_or("")
        );
        let status_line = format!("{}\r\n", status_line.trim_end());
        deliver(sink.header_line(status_line.as_bytes()), status_line.len(), "header")?;
        for (name, value) in response.headers() {
            let line = format!("{name}: {}\r\n", String::from_utf8_lossy(value.as_bytes()));
            deliver(sink.header_line(line.as_bytes()), line.len(), "header")?;
        }
        deliver(sink.header_line(b"\r\n"), 2, "header")?;

        let mut reader = response.body_mut().as_reader();
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = reader.read(&mut buf).map_err(|e| {
                let kind = if e.kind() == std::io::ErrorKind::TimedOut {
                    TransportErrorKind::OperationTimedOut
                } else {
                    TransportErrorKind::RecvError
                };
                TransportFailure::new(kind, e.to_string())
            })?;
            if n == 0 {
                break;
            }
            deliver(sink.body_chunk(&buf[..n]), n, "body")?;
            self.info.size_download += n as u64;
        }
        self.info.total_time = started.elapsed();
        Ok(())
    }

    fn info(&self) -> TransferInfo {
        self.info.clone()
    }
}

fn classify(err: ureq::Error) -> TransportFailure {
    let kind = match &err {
        ureq::Error::Timeout(_) => TransportErrorKind::OperationTimedOut,
        ureq::Error::HostNotFound => TransportErrorKind::CouldntResolveHost,
        ureq::Error::ConnectionFailed => TransportErrorKind::CouldntConnect,
        ureq::Error::TooManyRedirects => TransportErrorKind::TooManyRedirects,
        ureq::Error::BadUri(_) | ureq::Error::RedirectFailed => TransportErrorKind::UrlMalformat,
        ureq::Error::InvalidProxyUrl | ureq::Error::ConnectProxyFailed(_) => {
            TransportErrorKind::CouldntResolveProxy
        }
        ureq::Error::Tls(_) => TransportErrorKind::SslConnectError,
        ureq::Error::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
            TransportErrorKind::OperationTimedOut
        }
        ureq::Error::Io(io) if io.kind() == std::io::ErrorKind::ConnectionRefused => {
            TransportErrorKind::CouldntConnect
        }
        ureq::Error::Io(_) => TransportErrorKind::RecvError,
        _ => TransportErrorKind::Other,
    };
    TransportFailure::new(kind, err.to_string())
}
