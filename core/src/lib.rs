//! Synchronous one-shot HTTP client.
//!
//! # Overview
//! `HttpClient` issues GET/POST/HEAD/PUT/DELETE requests through a pluggable
//! `Transport`, captures the response through streaming callbacks, turns
//! transport failures and 4xx/5xx statuses into errors, and follows 301/302
//! redirects itself when the transport cannot.
//!
//! # Design
//! - One transport handle per execution; nothing is pooled or reused.
//! - The response state is rebuilt for every execution; accessors always
//!   describe the most recent one.
//! - `UreqTransport` is the default transport. Tests substitute their own.
//! - Logging goes through `tracing`; install a subscriber to see it.
//!
//! ```no_run
//! use oneshot_core::HttpClient;
//!
//! let mut client = HttpClient::new();
//! client.set_user_agent("tester/1.0");
//! let status = client.get_with_query("https://example.com/search", [("q", "rust")])?.status();
//! # Ok::<(), oneshot_core::HttpClientError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod options;
pub mod response;
pub mod transport;
pub mod types;
pub mod ureq_transport;

pub use client::HttpClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{HttpClientError, TransportErrorKind};
pub use http::{HttpMethod, PreparedRequest, RequestBody};
pub use options::{RequestOptions, TlsVersion, DEFAULT_MAX_REDIRECTS};
pub use response::{ResponseState, TransferInfo};
pub use transport::{ResponseSink, Transport, TransportFailure, TransportHandle};
pub use types::{Payload, Query};
pub use ureq_transport::UreqTransport;
