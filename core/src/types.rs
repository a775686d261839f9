//! Response envelope shared by successes and failures.

use serde::{Deserialize, Serialize};

/// Status code paired with the parsed response body.
///
/// The payload is decoded into whatever type the caller names; no validation
/// beyond what `Deserialize` enforces is performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    pub status: u16,
    pub payload: T,
}

impl<T> ResponseEnvelope<T> {
    pub fn into_payload(self) -> T {
        self.payload
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResponseEnvelope<U> {
        ResponseEnvelope {
            status: self.status,
            payload: f(self.payload),
        }
    }
}
