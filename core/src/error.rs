//! Error types for the request client.
//!
//! # Design
//! Two tiers. `TransportError` covers everything that happens before a
//! response exists (connection refused, DNS, timeout). `RequestFailure` is a
//! response whose status is outside 200–299; it keeps the status and the
//! server's JSON body so callers can inspect what the server reported.
//! `RequestError` joins both with the JSON (de)serialization failures.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::types::ResponseEnvelope;

/// Errors returned by `RequestClient` operations.
#[derive(Debug, Error)]
pub enum RequestError {
    /// No response was obtained from the transport.
    #[error("transport error")]
    Transport(#[from] TransportError),

    /// The server answered with a non-ok status.
    #[error(transparent)]
    Failure(#[from] RequestFailure),

    /// The request body could not be serialized to JSON.
    #[error("failed to serialize request body")]
    Serialization(#[source] serde_json::Error),

    /// The response body was not JSON or did not match the expected type.
    #[error("failed to parse response body")]
    Deserialization(#[source] serde_json::Error),
}

impl RequestError {
    /// The failure envelope, if the server answered with a non-ok status.
    pub fn failure(&self) -> Option<&RequestFailure> {
        match self {
            RequestError::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    /// Status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        self.failure().map(|failure| failure.status)
    }
}

/// A response whose status is outside 200–299.
///
/// The payload is kept as untyped JSON: an error body rarely has the shape of
/// the success type the caller asked for.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("HTTP {status}: {payload}")]
pub struct RequestFailure {
    pub status: u16,
    pub payload: Value,
}

impl RequestFailure {
    pub fn envelope(&self) -> ResponseEnvelope<&Value> {
        ResponseEnvelope {
            status: self.status,
            payload: &self.payload,
        }
    }

    pub fn into_envelope(self) -> ResponseEnvelope<Value> {
        ResponseEnvelope {
            status: self.status,
            payload: self.payload,
        }
    }

    /// Decode the payload into a caller-chosen error body type.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}

/// Boxed cause carried by `TransportError`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by a `Transport` before any response is available.
///
/// Each variant keeps the transport's own error as its `source()`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed")]
    Connection(#[source] BoxError),

    #[error("request timed out")]
    Timeout(#[source] BoxError),

    /// The request could not be built (bad URL, invalid header, ...).
    #[error("invalid request")]
    InvalidRequest(#[source] BoxError),

    #[error("transport failed")]
    Other(#[source] BoxError),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.into())
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.into())
        } else if err.is_connect() {
            TransportError::Connection(err.into())
        } else {
            TransportError::Other(err.into())
        }
    }
}
