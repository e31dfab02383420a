//! Error types for the HTTP client.
//!
//! # Design
//! Three failure classes come out of a verb call: the transport could not
//! complete the exchange, the server answered with a 4xx/5xx while status
//! checking is on, or a manual redirect chain ran past its limit. Each carries
//! a numeric code; transport codes follow libcurl's numbering so callers that
//! already switch on those values keep working.

use std::fmt;

use thiserror::Error;

/// Classification of a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TransportErrorKind {
    UnsupportedProtocol,
    UrlMalformat,
    CouldntResolveProxy,
    CouldntResolveHost,
    CouldntConnect,
    /// A streaming callback consumed fewer bytes than it was handed.
    WriteError,
    ReadError,
    OperationTimedOut,
    SslConnectError,
    TooManyRedirects,
    SendError,
    RecvError,
    SslCertProblem,
    PeerFailedVerification,
    Other,
}

impl TransportErrorKind {
    /// Numeric code, libcurl-compatible.
    pub fn code(self) -> u32 {
        match self {
            TransportErrorKind::UnsupportedProtocol => 1,
            TransportErrorKind::UrlMalformat => 3,
            TransportErrorKind::CouldntResolveProxy => 5,
            TransportErrorKind::CouldntResolveHost => 6,
            TransportErrorKind::CouldntConnect => 7,
            TransportErrorKind::WriteError => 23,
            TransportErrorKind::ReadError => 26,
            TransportErrorKind::OperationTimedOut => 28,
            TransportErrorKind::SslConnectError => 35,
            TransportErrorKind::TooManyRedirects => 47,
            TransportErrorKind::SendError => 55,
            TransportErrorKind::RecvError => 56,
            TransportErrorKind::SslCertProblem => 58,
            TransportErrorKind::PeerFailedVerification => 60,
            TransportErrorKind::Other => 0,
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}/{}", self.code())
    }
}

/// Errors returned by `HttpClient` verb methods.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HttpClientError {
    /// Connection, DNS, TLS, timeout or callback failure reported by the transport.
    #[error("transport error ({code}): {message}")]
    Transport {
        code: TransportErrorKind,
        message: String,
    },

    /// The response status was in 400..=599 and status checking is enabled.
    /// `message` is the raw status line.
    #[error("HTTP {code}: {}", message.trim_end())]
    HttpStatus { code: u16, message: String },

    /// The manual redirect chain reached the configured maximum.
    #[error("Too many redirects when trying to follow location (limit {limit})")]
    TooManyRedirects { limit: u32 },

    /// Query string or form body could not be encoded.
    #[error("form encoding failed: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),

    /// The temporary file backing a PUT body could not be written.
    #[error("failed to spool request body: {0}")]
    Spool(#[source] std::io::Error),
}

impl HttpClientError {
    /// Numeric code of the failure: the transport code, the HTTP status, or
    /// the too-many-redirects transport code.
    pub fn code(&self) -> u32 {
        match self {
            HttpClientError::Transport { code, .. } => code.code(),
            HttpClientError::HttpStatus { code, .. } => u32::from(*code),
            HttpClientError::TooManyRedirects { .. } => TransportErrorKind::TooManyRedirects.code(),
            HttpClientError::Encode(_) | HttpClientError::Spool(_) => TransportErrorKind::Other.code(),
        }
    }
}
