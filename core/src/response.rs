//! Per-execution response capture.
//!
//! # Design
//! The transport streams the response into a `ResponseState` through the two
//! `ResponseSink` callbacks: one call per header line, then one call per body
//! chunk. The state is replaced wholesale at the start of every execution so
//! nothing from a previous request survives into the next one.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::transport::ResponseSink;

/// Metadata the transport reports once an execution has finished.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferInfo {
    /// Numeric status of the final response, 0 if none was received.
    pub http_code: u16,
    /// URL actually reached, after any redirects the transport followed.
    pub effective_url: String,
    pub total_time: Duration,
    pub size_download: u64,
    pub size_upload: u64,
    pub content_type: Option<String>,
    /// Redirects followed by the transport itself.
    pub redirect_count: u32,
}

/// Status line, headers and body accumulated for one execution.
#[derive(Debug, Clone, Default)]
pub struct ResponseState {
    status_line: Option<String>,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
    /// Set once the transport handle has been configured, before any network
    /// traffic. It does not mean a response has arrived.
    handle_ready: bool,
    info: TransferInfo,
}

impl ResponseState {
    pub fn status_line(&self) -> Option<&str> {
        self.status_line.as_deref()
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn info(&self) -> &TransferInfo {
        &self.info
    }

    pub fn is_handle_ready(&self) -> bool {
        self.handle_ready
    }

    pub(crate) fn mark_handle_ready(&mut self) {
        self.handle_ready = true;
    }

    pub(crate) fn set_info(&mut self, info: TransferInfo) {
        self.info = info;
    }
}

impl ResponseSink for ResponseState {
    fn header_line(&mut self, line: &[u8]) -> usize {
        let text = String::from_utf8_lossy(line);
        if self.status_line.is_none() && text.starts_with("HTTP/") {
            self.status_line = Some(text.into_owned());
        } else if let Some((name, value)) = text.split_once(": ") {
            tracing::trace!(header = name, "response header");
            self.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
            self.headers.insert(name.to_string(), value.trim().to_string());
        }
        line.len()
    }

    fn body_chunk(&mut self, chunk: &[u8]) -> usize {
        self.body.extend_from_slice(chunk);
        chunk.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_headers(state: &mut ResponseState, lines: &[&str]) {
        for line in lines {
            assert_eq!(state.header_line(line.as_bytes()), line.len());
        }
    }

    #[test]
    fn body_is_concatenation_of_chunks_in_order() {
        let mut state = ResponseState::default();
        let chunks: [&[u8]; 5] = [b"hello", b"", b", ", b"world", b""];
        for chunk in chunks {
            assert_eq!(state.body_chunk(chunk), chunk.len());
        }
        assert_eq!(state.body(), b"hello, world");
    }

    #[test]
    fn first_http_line_is_the_status_line() {
        let mut state = ResponseState::default();
        feed_headers(
            &mut state,
            &["HTTP/1.1 301 Moved Permanently\r\n", "HTTP/1.1 200 OK\r\n", "\r\n"],
        );
        assert_eq!(state.status_line(), Some("HTTP/1.1 301 Moved Permanently\r\n"));
        assert!(state.headers().is_empty());
    }

    #[test]
    fn header_values_are_trimmed_and_last_write_wins() {
        let mut state = ResponseState::default();
        feed_headers(
            &mut state,
            &[
                "HTTP/1.1 200 OK\r\n",
                "X-Trace: first\r\n",
                "Content-Type:   text/plain  \r\n",
                "X-Trace: second\r\n",
            ],
        );
        assert_eq!(state.header("X-Trace"), Some("second"));
        assert_eq!(state.header("Content-Type"), Some("text/plain"));
        assert_eq!(state.headers().len(), 2);
    }

    #[test]
    fn value_keeps_everything_after_first_separator() {
        let mut state = ResponseState::default();
        feed_headers(&mut state, &["Link: <a>; rel: next\r\n"]);
        assert_eq!(state.header("Link"), Some("<a>; rel: next"));
    }

    #[test]
    fn lines_without_separator_are_ignored() {
        let mut state = ResponseState::default();
        feed_headers(&mut state, &["garbage\r\n", "Name:novalue\r\n", "\r\n"]);
        assert!(state.headers().is_empty());
        assert!(state.status_line().is_none());
    }

    #[test]
    fn header_lookup_ignores_ascii_case() {
        let mut state = ResponseState::default();
        feed_headers(&mut state, &["location: /new\r\n"]);
        assert_eq!(state.header("Location"), Some("/new"));
        assert_eq!(state.header("LOCATION"), Some("/new"));
        assert_eq!(state.header("Content-Length"), None);
    }

    #[test]
    fn duplicate_with_different_case_replaces_previous() {
        let mut state = ResponseState::default();
        feed_headers(&mut state, &["ETag: \"a\"\r\n", "etag: \"b\"\r\n"]);
        assert_eq!(state.headers().len(), 1);
        assert_eq!(state.header("ETag"), Some("\"b\""));
    }

    #[test]
    fn fresh_state_is_empty() {
        let state = ResponseState::default();
        assert!(!state.is_handle_ready());
        assert!(state.body().is_empty());
        assert_eq!(state.info().http_code, 0);
    }
}
