use std::collections::BTreeMap;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, RawQuery},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub query: Option<String>,
    /// Lowercase header names; repeated headers are joined with `, `.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// `"hello world hello world"` gzip-compressed, served as-is by `/gzip`.
pub const GZIP_BODY: &[u8] = &[
    0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0xff, 0xcb, 0x48, 0xcd, 0xc9, 0xc9, 0x57,
    0x28, 0xcf, 0x2f, 0xca, 0x49, 0x51, 0xc8, 0x40, 0xb0, 0x01, 0x3b, 0xce, 0xe2, 0xea, 0x17, 0x00,
    0x00, 0x00,
];

pub fn app() -> Router {
    Router::new()
        .route("/status/{code}", any(status))
        .route("/redirect/{n}", get(redirect_chain))
        .route("/moved", any(moved))
        .route("/redirect-absolute", get(redirect_absolute))
        .route("/landing", get(landing))
        .route("/echo", any(echo))
        .route("/headers", get(custom_headers))
        .route("/slow/{millis}", get(slow))
        .route("/gzip", get(gzip))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, String), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, format!("status {code}")))
}

/// `/redirect/3` → `/redirect/2` → `/redirect/1` → `/landing`, all 302.
async fn redirect_chain(Path(n): Path<u32>) -> Response {
    let location = if n <= 1 {
        "/landing".to_string()
    } else {
        format!("/redirect/{}", n - 1)
    };
    found(StatusCode::FOUND, &location)
}

/// 301 with a relative `Location`.
async fn moved() -> Response {
    found(StatusCode::MOVED_PERMANENTLY, "/landing")
}

/// 301 with an absolute `Location` built from the `Host` header.
async fn redirect_absolute(headers: HeaderMap) -> Response {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    found(StatusCode::MOVED_PERMANENTLY, &format!("http://{host}/landing"))
}

fn found(status: StatusCode, location: &str) -> Response {
    tracing::debug!(%status, location, "redirecting");
    (status, [(header::LOCATION, location.to_string())]).into_response()
}

async fn landing() -> &'static str {
    "landed"
}

async fn echo(method: Method, RawQuery(query): RawQuery, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in &headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        seen.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    Json(Echo {
        method: method.to_string(),
        query,
        headers: seen,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn custom_headers() -> impl IntoResponse {
    (
        [
            ("x-custom", "yes"),
            ("x-padded", "  spaced value  "),
            ("cache-control", "no-store"),
        ],
        "with headers",
    )
}

async fn slow(Path(millis): Path<u64>) -> &'static str {
    tokio::time::sleep(Duration::from_millis(millis)).await;
    "finally"
}

async fn gzip() -> impl IntoResponse {
    ([(header::CONTENT_ENCODING, "gzip")], GZIP_BODY)
}
