//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data.
//! `RequestClient` builds `HttpRequest` values and parses `HttpResponse`
//! values; a `Transport` (or any caller holding the request) performs the
//! actual exchange. Keeping the exchange behind plain data lets the URL,
//! header and body rules be tested without a network.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Header every request starts with before caller overrides are applied.
pub const DEFAULT_CONTENT_TYPE: (&str, &str) = ("Content-Type", "application/json");

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
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

/// Options forwarded to the transport without being interpreted by the
/// client.
///
/// `timeout` is applied by `ReqwestTransport`; `attributes` is an opaque bag
/// for transports that understand extra knobs (credentials mode, cache mode
/// and the like). Cancellation is done by dropping the request future.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOptions {
    pub timeout: Option<Duration>,
    pub attributes: BTreeMap<String, String>,
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub options: TransportOptions,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is in the 200–299 range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Apply `overrides` on top of `defaults`.
///
/// Names compare case-insensitively. An override of an existing name replaces
/// that entry in place; new names are appended in the order given.
pub fn merge_headers(
    defaults: &[(&str, &str)],
    overrides: &[(String, String)],
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = defaults
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    for (name, value) in overrides {
        match merged.iter_mut().find(|(existing, _)| existing.eq_ignore_ascii_case(name)) {
            Some(entry) => *entry = (name.clone(), value.clone()),
            None => merged.push((name.clone(), value.clone())),
        }
    }
    merged
}
