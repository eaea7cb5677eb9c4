//! Service client: an executor, a retry policy and a sleeper, composed.
//!
//! # Design
//! A per-service binding holds one `Client` and calls it with `Call`
//! values. The routing rule lives in one place, `send`: POST goes straight
//! to the executor, GET/PUT/DELETE go through the retry wrapper. The client
//! holds no mutable state; per-call options travel in the `Call`.

use std::sync::Arc;

use serde_json::Value;

use crate::auth::{Anonymous, StaticToken, TokenSource};
use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::executor::{ApiResponse, Call, Executor, ResponseBody};
use crate::http::{HttpMethod, Transport};
use crate::pager::Pager;
use crate::retry::{retry_request, RetryPolicy, Sleeper, ThreadSleeper};
use crate::transport::UreqTransport;

#[derive(Clone)]
pub struct Client {
    executor: Executor,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("executor", &self.executor)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn builder(endpoint: Endpoint) -> ClientBuilder {
        ClientBuilder::new(endpoint)
    }

    /// Production client for one service, talking over `UreqTransport`.
    pub fn from_config(config: &ClientConfig, prefix: &str) -> Result<Self, ApiError> {
        let endpoint = Endpoint::new(&config.resolve_endpoint()?, prefix)?;
        let transport = UreqTransport::new(config.transport_options())?;
        let mut builder = Client::builder(endpoint)
            .transport(Arc::new(transport))
            .retry_policy(config.retry_policy());
        if let Some(token) = &config.token {
            builder = builder.token_source(Arc::new(StaticToken::new(token.clone())));
        }
        Ok(builder.build())
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Send one call. `Ok(None)` only when retries ran out and the policy
    /// does not raise.
    pub fn send(&self, call: &Call) -> Result<Option<ApiResponse>, ApiError> {
        let request = self.executor.build_request(call)?;
        match call.method {
            HttpMethod::Post => self.executor.execute(&request).map(Some),
            HttpMethod::Get | HttpMethod::Put | HttpMethod::Delete => {
                retry_request(&self.executor, &request, &self.retry, self.sleeper.as_ref())
            }
        }
    }

    /// Like `send`, but exhaustion is always an error.
    pub fn send_raising(&self, call: &Call) -> Result<ApiResponse, ApiError> {
        let request = self.executor.build_request(call)?;
        let policy = self.retry.raising();
        let response = match call.method {
            HttpMethod::Post => Some(self.executor.execute(&request)?),
            HttpMethod::Get | HttpMethod::Put | HttpMethod::Delete => {
                retry_request(&self.executor, &request, &policy, self.sleeper.as_ref())?
            }
        };
        response.ok_or_else(|| ApiError::ConnectionFailure {
            attempts: policy.attempts(),
            message: "retries exhausted".to_string(),
        })
    }

    pub fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ResponseBody, ApiError> {
        let call = Call::get(path).queries(query.iter().copied());
        Ok(self.send_raising(&call)?.body)
    }

    pub fn post(&self, path: &str, body: Value) -> Result<ResponseBody, ApiError> {
        Ok(self.send_raising(&Call::post(path).json(body))?.body)
    }

    pub fn put(&self, path: &str, body: Value) -> Result<ResponseBody, ApiError> {
        Ok(self.send_raising(&Call::put(path).json(body))?.body)
    }

    pub fn delete(&self, path: &str) -> Result<ResponseBody, ApiError> {
        Ok(self.send_raising(&Call::delete(path))?.body)
    }

    /// Lazy pages of `collection` starting at `path`.
    pub fn pager(&self, collection: &str, path: &str, query: &[(&str, &str)]) -> Pager<'_> {
        Pager::new(
            &self.executor,
            self.retry,
            self.sleeper.as_ref(),
            collection,
            path,
            query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    /// Every item of `collection`, all pages drained.
    pub fn list(
        &self,
        collection: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<Value>, ApiError> {
        self.pager(collection, path, query).collect_all()
    }
}

pub struct ClientBuilder {
    endpoint: Endpoint,
    tokens: Arc<dyn TokenSource>,
    transport: Option<Arc<dyn Transport>>,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl ClientBuilder {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            tokens: Arc::new(Anonymous),
            transport: None,
            retry: RetryPolicy::default(),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    pub fn token(self, token: impl Into<String>) -> Self {
        self.token_source(Arc::new(StaticToken::new(token)))
    }

    pub fn token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Without an explicit transport, a default `UreqTransport` is used.
    pub fn build(self) -> Client {
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(UreqTransport::default()));
        Client {
            executor: Executor::new(self.endpoint, self.tokens, transport),
            retry: self.retry,
            sleeper: self.sleeper,
        }
    }
}
