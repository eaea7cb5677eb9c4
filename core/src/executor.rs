//! Request executor: one HTTP round trip, interpreted.
//!
//! # Design
//! `build_request` turns a `Call` into an `HttpRequest` (the body is
//! serialized here, once). `parse_response` turns an `HttpResponse` into a
//! success value or a classified error. `execute` glues the two around a
//! single `Transport::send`. The retry wrapper replays the built
//! `HttpRequest` as is, so nothing is re-serialized between attempts.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::auth::{TokenSource, AUTH_HEADER};
use crate::classify::classify;
use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

const USER_AGENT: &str = concat!("cloud-core/", env!("CARGO_PKG_VERSION"));

/// Everything that varies per call. Built fresh for each call and never
/// stored on the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl Call {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn queries<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// A successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    /// 204 bodies, and anything that did not parse as JSON.
    Text(String),
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    /// Flatten into a JSON value: blank text becomes `null`, other text a
    /// JSON string.
    pub fn into_json(self) -> Value {
        match self {
            ResponseBody::Json(value) => value,
            ResponseBody::Text(text) if text.trim().is_empty() => Value::Null,
            ResponseBody::Text(text) => Value::String(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ResponseBody::Json(value) => value.is_null(),
            ResponseBody::Text(text) => text.trim().is_empty(),
        }
    }
}

/// A response whose status code was one of 200, 201, 202 or 204.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

/// Performs single HTTP round trips against one endpoint.
#[derive(Clone)]
pub struct Executor {
    endpoint: Endpoint,
    tokens: Arc<dyn TokenSource>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Executor {
    pub fn new(
        endpoint: Endpoint,
        tokens: Arc<dyn TokenSource>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            endpoint,
            tokens,
            transport,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn build_request(&self, call: &Call) -> Result<HttpRequest, ApiError> {
        let body = call
            .body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;

        let mut headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
        ];
        if let Some(token) = self.tokens.token() {
            headers.push((AUTH_HEADER.to_string(), token));
        }
        headers.extend(call.headers.iter().cloned());

        Ok(HttpRequest {
            method: call.method,
            url: self.endpoint.url_for(&call.path),
            query: call.query.clone(),
            headers,
            body,
        })
    }

    /// Send `request` once. Transport failures come back as
    /// `ConnectionFailure` with `attempts = 1`.
    pub fn execute(&self, request: &HttpRequest) -> Result<ApiResponse, ApiError> {
        debug!(method = %request.method, url = %request.full_url(), "sending request");
        let response = self.transport.send(request).map_err(|e| {
            debug!(method = %request.method, url = %request.url, error = %e, "transport failure");
            ApiError::ConnectionFailure {
                attempts: 1,
                message: e.to_string(),
            }
        })?;
        debug!(method = %request.method, url = %request.url, status = response.status, "received response");
        Self::parse_response(response)
    }

    pub fn do_request(&self, call: &Call) -> Result<ApiResponse, ApiError> {
        let request = self.build_request(call)?;
        self.execute(&request)
    }

    /// Interpret a received response without any I/O.
    pub fn parse_response(response: HttpResponse) -> Result<ApiResponse, ApiError> {
        let HttpResponse {
            status,
            headers,
            body,
        } = response;
        match status {
            204 => Ok(ApiResponse {
                status,
                headers,
                body: ResponseBody::Text(body),
            }),
            200 | 201 | 202 => Ok(ApiResponse {
                status,
                headers,
                body: success_body(body),
            }),
            _ => {
                let error_body = error_body(&body);
                Err(classify(status, error_body.as_ref()).into())
            }
        }
    }
}

fn success_body(raw: String) -> ResponseBody {
    if raw.trim().is_empty() {
        return ResponseBody::Text(raw);
    }
    match serde_json::from_str(&raw) {
        Ok(value) => ResponseBody::Json(value),
        Err(_) => ResponseBody::Text(raw),
    }
}

/// Non-JSON error text is treated as a bare-string message.
fn error_body(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Anonymous, StaticToken};
    use crate::error::ErrorKind;
    use crate::testing::ScriptedTransport;
    use serde_json::json;

    fn executor(transport: Arc<ScriptedTransport>) -> Executor {
        Executor::new(
            Endpoint::new("http://localhost:9696", "/v2.0").unwrap(),
            Arc::new(StaticToken::new("tok")),
            transport,
        )
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_get_request() {
        let exec = executor(Arc::new(ScriptedTransport::new()));
        let req = exec
            .build_request(&Call::get("/networks").query("limit", "2"))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:9696/v2.0/networks");
        assert_eq!(req.query, vec![("limit".to_string(), "2".to_string())]);
        assert_eq!(req.header("x-auth-token"), Some("tok"));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert!(req.body.is_none());
    }

    #[test]
    fn build_post_serializes_body_once() {
        let exec = executor(Arc::new(ScriptedTransport::new()));
        let req = exec
            .build_request(&Call::post("/networks").json(json!({"network": {"name": "a"}})))
            .unwrap();
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["network"]["name"], "a");
    }

    #[test]
    fn anonymous_requests_carry_no_token() {
        let exec = Executor::new(
            Endpoint::new("http://localhost:9696", "/v2.0").unwrap(),
            Arc::new(Anonymous),
            Arc::new(ScriptedTransport::new()),
        );
        let req = exec.build_request(&Call::get("/networks")).unwrap();
        assert_eq!(req.header(AUTH_HEADER), None);
    }

    #[test]
    fn per_call_headers_are_appended() {
        let exec = executor(Arc::new(ScriptedTransport::new()));
        let req = exec
            .build_request(&Call::get("/networks").header("X-Request-Id", "r1"))
            .unwrap();
        assert_eq!(req.header("x-request-id"), Some("r1"));
    }

    #[test]
    fn success_statuses_parse_json() {
        for status in [200, 201, 202] {
            let resp = Executor::parse_response(response(status, r#"{"ok":true}"#)).unwrap();
            assert_eq!(resp.status, status);
            assert_eq!(resp.body, ResponseBody::Json(json!({"ok": true})));
        }
    }

    #[test]
    fn no_content_with_empty_body_is_valid() {
        let resp = Executor::parse_response(response(204, "")).unwrap();
        assert_eq!(resp.body, ResponseBody::Text(String::new()));
        assert!(resp.body.is_empty());
        assert_eq!(resp.body.into_json(), Value::Null);
    }

    #[test]
    fn unparseable_success_body_is_text() {
        let resp = Executor::parse_response(response(200, "pong")).unwrap();
        assert_eq!(resp.body, ResponseBody::Text("pong".to_string()));
        assert_eq!(resp.body.into_json(), json!("pong"));
    }

    #[test]
    fn other_2xx_is_an_error() {
        let err = Executor::parse_response(response(206, "{}")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unclassified);
        assert_eq!(err.status(), Some(206));
    }

    #[test]
    fn error_body_message_is_extracted() {
        let err = Executor::parse_response(response(404, r#"{"message":"gone"}"#)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "gone");
    }

    #[test]
    fn plain_text_error_body_is_the_message() {
        let err = Executor::parse_response(response(503, "down for maintenance\n")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(err.message(), "down for maintenance");
    }

    #[test]
    fn empty_error_body_uses_reason_phrase() {
        let err = Executor::parse_response(response(409, "")).unwrap_err();
        assert_eq!(err.message(), "Conflict");
    }

    #[test]
    fn transport_failure_is_connection_failure() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_failure("connection refused");
        let err = executor(transport.clone())
            .do_request(&Call::get("/networks"))
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::ConnectionFailure { attempts: 1, ref message } if message == "connection refused"
        ));
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn do_request_sends_the_built_request() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({"network": {"id": "n1"}}));
        let exec = executor(transport.clone());
        let resp = exec.do_request(&Call::get("/networks/n1")).unwrap();
        assert_eq!(resp.body.as_json().unwrap()["network"]["id"], "n1");
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "http://localhost:9696/v2.0/networks/n1");
    }
}
