//! JSON request client over a pluggable transport.
//!
//! # Design
//! Every verb runs the same three steps: `build_request` turns the path, body
//! and per-call config into an `HttpRequest`; the transport performs the
//! exchange; `parse_response` turns the `HttpResponse` into an envelope or a
//! `RequestFailure`. Both the build and parse steps are public so a caller
//! can run the exchange itself. The client holds no mutable state and never
//! retries, so concurrent calls do not interact.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::{ClientConfig, ConfigError, RequestConfig};
use crate::error::{RequestError, RequestFailure};
use crate::http::{merge_headers, HttpMethod, HttpRequest, HttpResponse, DEFAULT_CONTENT_TYPE};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::ResponseEnvelope;

/// Client that joins paths onto a base URL and exchanges JSON.
///
/// Payload types are trusted: the body is decoded into whatever `R` the
/// caller names, and checking its shape beyond that is the caller's job.
#[derive(Debug, Clone)]
pub struct RequestClient<T = ReqwestTransport> {
    config: ClientConfig,
    transport: T,
}

impl RequestClient<ReqwestTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }

    /// Build a client whose default endpoint comes from `API_ENDPOINT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(ClientConfig::from_env()?))
    }
}

impl<T> RequestClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Join `path` onto `base_url`, or onto the client's base URL when
    /// `base_url` is `None`.
    pub fn resolve_url(&self, path: &str, base_url: Option<&str>) -> String {
        join_url(base_url.unwrap_or(self.config.base_url()), path)
    }

    /// Describe a request without sending it.
    ///
    /// A body that serializes to JSON `null` is treated as no body.
    pub fn build_request<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<HttpRequest, RequestError>
    where
        B: Serialize + ?Sized,
    {
        let body = match body {
            Some(body) => {
                let json = serde_json::to_string(body).map_err(RequestError::Serialization)?;
                (json != "null").then_some(json)
            }
            None => None,
        };

        Ok(HttpRequest {
            method,
            url: self.resolve_url(path, config.base_url.as_deref()),
            headers: merge_headers(&[DEFAULT_CONTENT_TYPE], &config.headers),
            body,
            options: config.options,
        })
    }

    /// Turn a raw response into an envelope.
    ///
    /// The body must be JSON whatever the status; an empty or non-JSON body
    /// is a `Deserialization` error. Statuses outside 200–299 become
    /// `RequestError::Failure` with the untyped payload; otherwise the payload
    /// is decoded into `R`.
    pub fn parse_response<R: DeserializeOwned>(
        &self,
        response: HttpResponse,
    ) -> Result<ResponseEnvelope<R>, RequestError> {
        let payload: Value =
            serde_json::from_str(&response.body).map_err(RequestError::Deserialization)?;

        if !response.is_ok() {
            debug!(status = response.status, "server returned non-ok status");
            return Err(RequestFailure {
                status: response.status,
                payload,
            }
            .into());
        }

        let payload = serde_json::from_value(payload).map_err(RequestError::Deserialization)?;
        Ok(ResponseEnvelope {
            status: response.status,
            payload,
        })
    }
}

impl<T: Transport> RequestClient<T> {
    pub async fn get<R: DeserializeOwned>(
        &self,
        path: &str,
        config: Option<RequestConfig>,
    ) -> Result<ResponseEnvelope<R>, RequestError> {
        self.request::<R, ()>(HttpMethod::Get, path, None, config).await
    }

    pub async fn post<R, B>(
        &self,
        path: &str,
        body: &B,
        config: Option<RequestConfig>,
    ) -> Result<ResponseEnvelope<R>, RequestError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(HttpMethod::Post, path, Some(body), config).await
    }

    pub async fn put<R, B>(
        &self,
        path: &str,
        body: &B,
        config: Option<RequestConfig>,
    ) -> Result<ResponseEnvelope<R>, RequestError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(HttpMethod::Put, path, Some(body), config).await
    }

    /// Pass `&None::<()>` (or `&()`) to send no body.
    pub async fn delete<R, B>(
        &self,
        path: &str,
        body: &B,
        config: Option<RequestConfig>,
    ) -> Result<ResponseEnvelope<R>, RequestError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(HttpMethod::Delete, path, Some(body), config).await
    }

    async fn request<R, B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        config: Option<RequestConfig>,
    ) -> Result<ResponseEnvelope<R>, RequestError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.build_request(method, path, body, config.unwrap_or_default())?;
        debug!(method = %request.method, url = %request.url, "sending request");

        let response = self.transport.send(request).await?;
        debug!(status = response.status, "received response");

        self.parse_response(response)
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base_url}{path}")
    } else {
        format!("{base_url}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::error::TransportError;

    const BASE_URL: &str = "http://localhost:3000";

    fn client() -> RequestClient {
        RequestClient::new(ClientConfig::new(BASE_URL))
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: u64,
    }

    /// Records every request and answers with a fixed response.
    struct RecordingTransport {
        requests: Mutex<Vec<HttpRequest>>,
        response: HttpResponse,
    }

    impl RecordingTransport {
        fn answering(status: u16, body: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                response: HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.to_string(),
                },
            }
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for RecordingTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            Ok(self.response.clone())
        }
    }

    struct RefusingTransport;

    impl Transport for RefusingTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Connection("connection refused".into()))
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn header(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    // --- url ---

    #[test]
    fn leading_slash_path_is_appended() {
        assert_eq!(client().resolve_url("/users/1", None), "http://localhost:3000/users/1");
    }

    #[test]
    fn relative_path_gets_separator() {
        assert_eq!(client().resolve_url("users/1", None), "http://localhost:3000/users/1");
    }

    #[test]
    fn base_url_is_not_normalized() {
        let client = RequestClient::new(ClientConfig::new("http://localhost:3000/"));
        assert_eq!(client.resolve_url("/users", None), "http://localhost:3000//users");
        assert_eq!(client.resolve_url("users", None), "http://localhost:3000//users");
    }

    #[test]
    fn base_url_override_applies() {
        let url = client().resolve_url("/users", Some("https://other.example"));
        assert_eq!(url, "https://other.example/users");
    }

    // --- build ---

    #[test]
    fn build_get_has_no_body_and_default_headers() {
        let req = client()
            .build_request::<()>(HttpMethod::Get, "/users/1", None, RequestConfig::new())
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/users/1");
        assert_eq!(req.headers, vec![header("Content-Type", "application/json")]);
        assert!(req.body.is_none());
    }

    #[test]
    fn build_post_serializes_body() {
        let body = json!({"name": "a"});
        let req = client()
            .build_request(HttpMethod::Post, "/users", Some(&body), RequestConfig::new())
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.body.as_deref(), Some(r#"{"name":"a"}"#));
    }

    #[test]
    fn build_with_null_body_sends_nothing() {
        let req = client()
            .build_request(HttpMethod::Delete, "/users/1", Some(&None::<u8>), RequestConfig::new())
            .unwrap();
        assert!(req.body.is_none());
    }

    #[test]
    fn build_serializes_scalar_bodies() {
        let c = client();
        let build = |body: &Value| {
            c.build_request(HttpMethod::Put, "/flag", Some(body), RequestConfig::new())
                .unwrap()
                .body
        };
        assert_eq!(build(&json!(false)).as_deref(), Some("false"));
        assert_eq!(build(&json!(0)).as_deref(), Some("0"));
        assert_eq!(build(&json!("")).as_deref(), Some(r#""""#));
        assert_eq!(build(&Value::Null), None);
    }

    #[test]
    fn build_merges_caller_headers() {
        let config = RequestConfig::new().header("Authorization", "x");
        let req = client()
            .build_request::<()>(HttpMethod::Get, "/me", None, config)
            .unwrap();
        assert_eq!(
            req.headers,
            vec![header("Content-Type", "application/json"), header("Authorization", "x")]
        );
    }

    #[test]
    fn build_lets_caller_override_content_type() {
        let config = RequestConfig::new().header("Content-Type", "text/plain");
        let req = client()
            .build_request(HttpMethod::Post, "/raw", Some("hello"), config)
            .unwrap();
        assert_eq!(req.headers, vec![header("Content-Type", "text/plain")]);
        assert_eq!(req.body.as_deref(), Some(r#""hello""#));
    }

    #[test]
    fn build_passes_options_through() {
        let config = RequestConfig::new()
            .timeout(Duration::from_millis(250))
            .attribute("credentials", "include");
        let req = client()
            .build_request::<()>(HttpMethod::Get, "/", None, config.clone())
            .unwrap();
        assert_eq!(req.options, config.options);
    }

    // --- parse ---

    #[test]
    fn parse_success_envelope() {
        let envelope: ResponseEnvelope<User> =
            client().parse_response(response(200, r#"{"id":1}"#)).unwrap();
        assert_eq!(envelope, ResponseEnvelope { status: 200, payload: User { id: 1 } });
    }

    #[test]
    fn parse_not_found_is_failure_with_payload() {
        let err = client()
            .parse_response::<User>(response(404, r#"{"error":"not found"}"#))
            .unwrap_err();
        let failure = err.failure().expect("expected a failure");
        assert_eq!(failure.status, 404);
        assert_eq!(failure.payload, json!({"error": "not found"}));
    }

    #[test]
    fn parse_redirect_status_is_failure() {
        let err = client().parse_response::<Value>(response(302, "{}")).unwrap_err();
        assert_eq!(err.status(), Some(302));
    }

    #[test]
    fn parse_malformed_body_is_deserialization_error() {
        let err = client().parse_response::<User>(response(200, "not json")).unwrap_err();
        assert!(matches!(err, RequestError::Deserialization(_)));
    }

    #[test]
    fn parse_malformed_error_body_is_deserialization_error() {
        let err = client()
            .parse_response::<User>(response(500, "<html>oops</html>"))
            .unwrap_err();
        assert!(matches!(err, RequestError::Deserialization(_)));
    }

    #[test]
    fn parse_shape_mismatch_is_deserialization_error() {
        let err = client()
            .parse_response::<User>(response(200, r#"{"name":"a"}"#))
            .unwrap_err();
        assert!(matches!(err, RequestError::Deserialization(_)));
    }

    #[test]
    fn parse_empty_body_is_deserialization_error() {
        let err = client().parse_response::<()>(response(204, "")).unwrap_err();
        assert!(matches!(err, RequestError::Deserialization(_)));

        let err = client().parse_response::<Option<User>>(response(200, "")).unwrap_err();
        assert!(matches!(err, RequestError::Deserialization(_)));
    }

    #[test]
    fn parse_empty_error_body_is_not_a_failure() {
        for status in [404, 500] {
            let err = client().parse_response::<Value>(response(status, "")).unwrap_err();
            assert!(matches!(err, RequestError::Deserialization(_)), "{status}");
            assert!(err.failure().is_none());
        }
    }

    #[test]
    fn parse_explicit_null_body_is_accepted() {
        let envelope: ResponseEnvelope<()> = client().parse_response(response(200, "null")).unwrap();
        assert_eq!(envelope.status, 200);
    }

    // --- round trips through a transport ---

    #[tokio::test]
    async fn get_sends_one_request_and_returns_envelope() {
        let transport = RecordingTransport::answering(200, r#"{"id":1}"#);
        let client = RequestClient::with_transport(ClientConfig::new(BASE_URL), &transport);

        let envelope = client.get::<User>("/users/1", None).await.unwrap();
        assert_eq!(envelope.payload, User { id: 1 });

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Get);
        assert_eq!(sent[0].url, "http://localhost:3000/users/1");
        assert!(sent[0].body.is_none());
    }

    #[tokio::test]
    async fn base_url_override_does_not_leak() {
        let transport = RecordingTransport::answering(200, "{}");
        let client = RequestClient::with_transport(ClientConfig::new(BASE_URL), &transport);

        let config = RequestConfig::new().base_url("https://other.example");
        client.get::<Value>("users", Some(config)).await.unwrap();
        client.get::<Value>("users", None).await.unwrap();

        let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["https://other.example/users", "http://localhost:3000/users"]);
    }

    #[tokio::test]
    async fn verbs_map_to_methods_and_bodies() {
        let transport = RecordingTransport::answering(200, "null");
        let client = RequestClient::with_transport(ClientConfig::new(BASE_URL), &transport);

        client.post::<(), _>("/users", &json!({"name": "a"}), None).await.unwrap();
        client.put::<(), _>("/users/1", &json!({"name": "b"}), None).await.unwrap();
        client.delete::<(), _>("/users/1", &None::<()>, None).await.unwrap();

        let sent = transport.requests();
        let methods: Vec<HttpMethod> = sent.iter().map(|r| r.method).collect();
        assert_eq!(methods, vec![HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete]);
        assert_eq!(sent[0].body.as_deref(), Some(r#"{"name":"a"}"#));
        assert_eq!(sent[1].body.as_deref(), Some(r#"{"name":"b"}"#));
        assert!(sent[2].body.is_none());
    }

    #[tokio::test]
    async fn repeated_get_is_not_cached() {
        let transport = RecordingTransport::answering(200, r#"{"id":7}"#);
        let client = RequestClient::with_transport(ClientConfig::new(BASE_URL), &transport);

        let first = client.get::<User>("/users/7", None).await.unwrap();
        let second = client.get::<User>("/users/7", None).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn transport_errors_are_not_wrapped_as_failures() {
        let client = RequestClient::with_transport(ClientConfig::new(BASE_URL), RefusingTransport);
        let err = client.get::<Value>("/users", None).await.unwrap_err();
        assert!(matches!(err, RequestError::Transport(TransportError::Connection(_))));
        assert!(err.status().is_none());
    }
}
