//! Caller-facing request data: GET query strings and POST/PUT payloads.
//!
//! # Design
//! Both types come in two shapes. Key/value pairs are form-url-encoded with
//! `serde_urlencoded`; raw strings or bytes are passed through untouched.
//! `From` impls let callers hand in arrays, maps or strings directly.

use std::collections::{BTreeMap, HashMap};

use crate::error::HttpClientError;

/// Query string for `HttpClient::get_with_query`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Encoded as `k1=v1&k2=v2`, in order.
    Pairs(Vec<(String, String)>),
    /// Appended verbatim.
    Raw(String),
}

impl Query {
    pub fn encode(&self) -> Result<String, HttpClientError> {
        match self {
            Query::Pairs(pairs) => Ok(serde_urlencoded::to_string(pairs)?),
            Query::Raw(raw) => Ok(raw.clone()),
        }
    }
}

impl From<&str> for Query {
    fn from(raw: &str) -> Self {
        Query::Raw(raw.to_string())
    }
}

impl From<String> for Query {
    fn from(raw: String) -> Self {
        Query::Raw(raw)
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for Query {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Query::Pairs(into_pairs(pairs))
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Query {
    fn from(pairs: [(K, V); N]) -> Self {
        Query::Pairs(into_pairs(pairs))
    }
}

impl<K: Into<String>, V: Into<String>> From<BTreeMap<K, V>> for Query {
    fn from(map: BTreeMap<K, V>) -> Self {
        Query::Pairs(into_pairs(map))
    }
}

impl<K: Into<String>, V: Into<String>> From<HashMap<K, V>> for Query {
    fn from(map: HashMap<K, V>) -> Self {
        Query::Pairs(into_pairs(map))
    }
}

/// Request body for `HttpClient::post` and `HttpClient::put`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Form-url-encoded before sending.
    Form(Vec<(String, String)>),
    /// Sent as-is.
    Raw(Vec<u8>),
}

impl Payload {
    pub fn form<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Payload::Form(into_pairs(pairs))
    }

    pub fn into_bytes(self) -> Result<Vec<u8>, HttpClientError> {
        match self {
            Payload::Form(pairs) => Ok(serde_urlencoded::to_string(&pairs)?.into_bytes()),
            Payload::Raw(bytes) => Ok(bytes),
        }
    }
}

impl From<&str> for Payload {
    fn from(raw: &str) -> Self {
        Payload::Raw(raw.as_bytes().to_vec())
    }
}

impl From<String> for Payload {
    fn from(raw: String) -> Self {
        Payload::Raw(raw.into_bytes())
    }
}

impl From<&[u8]> for Payload {
    fn from(raw: &[u8]) -> Self {
        Payload::Raw(raw.to_vec())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(raw: Vec<u8>) -> Self {
        Payload::Raw(raw)
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for Payload {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Payload::form(pairs)
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Payload {
    fn from(pairs: [(K, V); N]) -> Self {
        Payload::form(pairs)
    }
}

impl<K: Into<String>, V: Into<String>> From<BTreeMap<K, V>> for Payload {
    fn from(map: BTreeMap<K, V>) -> Self {
        Payload::form(map)
    }
}

impl<K: Into<String>, V: Into<String>> From<HashMap<K, V>> for Payload {
    fn from(map: HashMap<K, V>) -> Self {
        Payload::form(map)
    }
}

fn into_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Vec<(String, String)>
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
