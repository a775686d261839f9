//! Client-wide and per-call configuration.
//!
//! # Design
//! The default base endpoint lives in `ClientConfig`, handed to the client
//! when it is constructed and never mutated afterwards. Per-call tweaks go in
//! `RequestConfig`, which is consumed by a single call.

use std::time::Duration;

use thiserror::Error;

use crate::http::TransportOptions;

/// Environment variable holding the default base endpoint.
pub const API_ENDPOINT_ENV: &str = "API_ENDPOINT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("environment variable {0} is empty")]
    EmptyEnv(&'static str),
}

/// Settings shared by every call a client makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
}

impl ClientConfig {
    /// The base URL is stored verbatim; a trailing slash is kept.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Read the default endpoint from `API_ENDPOINT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, resolving variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(API_ENDPOINT_ENV).ok_or(ConfigError::MissingEnv(API_ENDPOINT_ENV))?;
        if base_url.is_empty() {
            return Err(ConfigError::EmptyEnv(API_ENDPOINT_ENV));
        }
        Ok(Self::new(base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Per-call configuration. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestConfig {
    /// Replaces the client's base URL for this call only.
    pub base_url: Option<String>,
    /// Merged over the default `Content-Type: application/json`.
    pub headers: Vec<(String, String)>,
    pub options: TransportOptions,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Add an opaque option for the transport.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.attributes.insert(key.into(), value.into());
        self
    }
}
