//! Thin JSON client over a single HTTP round trip.
//!
//! # Overview
//! `RequestClient` joins a path onto a base URL, serializes the body as JSON,
//! merges caller headers over `Content-Type: application/json`, performs one
//! exchange through a `Transport`, and returns a `ResponseEnvelope` holding
//! the status and the decoded payload. Non-2xx statuses come back as
//! `RequestError::Failure` carrying the same status and the server's JSON
//! body; transport errors are reported separately.
//!
//! # Design
//! - The default base URL is injected through `ClientConfig`; per-call
//!   overrides go in `RequestConfig`.
//! - `build_request` and `parse_response` are plain functions over
//!   `HttpRequest` / `HttpResponse`, so the network step can be swapped out
//!   or run by the caller.
//! - No retries, caching or logging subscribers; events are emitted through
//!   `tracing` at debug level.
//!
//! ```no_run
//! use request_client::{ClientConfig, RequestClient};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//! }
//!
//! async fn example() -> Result<(), request_client::RequestError> {
//!     let client = RequestClient::new(ClientConfig::new("https://api.example.com"));
//!     let user = client.get::<User>("/users/1", None).await?;
//!     println!("{} -> {}", user.status, user.payload.id);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::RequestClient;
pub use config::{ClientConfig, ConfigError, RequestConfig, API_ENDPOINT_ENV};
pub use error::{BoxError, RequestError, RequestFailure, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, TransportOptions};
pub use transport::{ReqwestTransport, Transport};
pub use types::ResponseEnvelope;
