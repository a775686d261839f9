//! The seam between the client and the network.

mod reqwest_backend;

use std::future::Future;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

pub use reqwest_backend::ReqwestTransport;

/// Performs one HTTP exchange.
///
/// Implementations must return non-2xx responses as `Ok`; deciding what
/// counts as a failure is the client's job. Options in
/// `HttpRequest::options` are the transport's to interpret or ignore.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

impl<T: Transport> Transport for &T {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        (**self).send(request)
    }
}
