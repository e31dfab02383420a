//! Transport collaborator contract.
//!
//! # Design
//! The executor never touches sockets. A `Transport` opens one handle per
//! execution, already configured from `RequestOptions`; the handle performs a
//! single synchronous exchange, streaming the response into a `ResponseSink`,
//! and then reports `TransferInfo`. Dropping the handle releases it, so every
//! exit path of a verb call frees it.

use std::fmt;

use crate::error::{HttpClientError, TransportErrorKind};
use crate::http::PreparedRequest;
use crate::options::RequestOptions;
use crate::response::TransferInfo;

/// Receiver for a response as it streams in.
///
/// Both callbacks return the number of bytes consumed. Returning anything
/// other than the input length tells the transport to abort the transfer.
pub trait ResponseSink {
    /// Called once per header line, including the status line and the blank
    /// terminator, before any body chunk.
    fn header_line(&mut self, line: &[u8]) -> usize;

    /// Called for each body chunk, in arrival order.
    fn body_chunk(&mut self, chunk: &[u8]) -> usize;
}

/// A transport-level failure, as reported by a handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportFailure {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl std::error::Error for TransportFailure {}

impl From<TransportFailure> for HttpClientError {
    fn from(failure: TransportFailure) -> Self {
        HttpClientError::Transport {
            code: failure.kind,
            message: failure.message,
        }
    }
}

/// One configured, single-use transfer.
pub trait TransportHandle {
    /// Execute `request`, feeding the response into `sink`.
    fn perform(
        &mut self,
        request: PreparedRequest,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), TransportFailure>;

    /// Metadata of the last `perform`, available even when it failed.
    fn info(&self) -> TransferInfo;
}

/// Factory for transport handles.
pub trait Transport {
    /// Whether handles can follow redirects on their own. Queried once, when
    /// the client is constructed.
    fn follows_redirects(&self) -> bool;

    /// Allocate a handle and apply `options` to it.
    fn open(&self, options: &RequestOptions) -> Result<Box<dyn TransportHandle>, TransportFailure>;
}

/// Check a sink callback's return value against the byte-count contract.
pub(crate) fn deliver(
    consumed: usize,
    expected: usize,
    what: &str,
) -> Result<(), TransportFailure> {
    if consumed == expected {
        Ok(())
    } else {
        Err(TransportFailure::new(
            TransportErrorKind::WriteError,
            format!("{what} callback consumed {consumed} of {expected} bytes"),
        ))
    }
}
