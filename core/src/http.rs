//! Request types handed to the transport.
//!
//! # Design
//! A `PreparedRequest` is plain data: the verb, the final URL (query string
//! already appended) and the body. The executor builds one per execution and
//! the transport consumes it. Options that outlive a single request (auth,
//! proxy, headers, TLS) live in `RequestOptions` instead.

use std::fmt;
use std::fs::File;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Head,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Head => "HEAD",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of an outgoing request.
#[derive(Debug)]
pub enum RequestBody {
    Empty,
    /// Sent in one piece (POST).
    Bytes(Vec<u8>),
    /// Streamed from a rewound temporary file with a declared length (PUT).
    /// The file is removed when this value is dropped.
    Spooled { file: File, len: u64 },
}

impl RequestBody {
    /// Declared length of the body in bytes.
    pub fn len(&self) -> u64 {
        match self {
            RequestBody::Empty => 0,
            RequestBody::Bytes(bytes) => bytes.len() as u64,
            RequestBody::Spooled { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One transport-level request: verb, URL and body.
#[derive(Debug)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: RequestBody,
}

impl PreparedRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>, body: RequestBody) -> Self {
        Self {
            method,
            url: url.into(),
            body,
        }
    }

    /// A bodiless GET, used for the initial GET and for every manual redirect hop.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url, RequestBody::Empty)
    }
}
