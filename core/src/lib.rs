//! Shared HTTP core for the cloud platform's service bindings.
//!
//! # Overview
//! Every service binding (network, compute, storage, DNS, ...) talks to its
//! REST API through the same four pieces:
//!
//! - [`classify`] maps a rejected response onto a closed [`ErrorKind`] and the
//!   best message the body offers.
//! - [`Executor`] performs exactly one round trip through a [`Transport`].
//! - [`retry_request`] replays idempotent requests after connection failures.
//! - [`Pager`] follows `<collection>_links` relation links across pages.
//!
//! # Design
//! - All I/O goes through the [`Transport`] trait; [`UreqTransport`] is the
//!   blocking production implementation, tests script their own.
//! - Requests are strictly sequential and blocking. The only suspension
//!   points are the network call and the sleep between retries.
//! - [`Client`] composes an executor with a retry policy; it holds no
//!   mutable state, so it can be shared freely.
//! - Payloads are opaque `serde_json::Value`s. Resource-specific field access
//!   belongs to the caller.

pub mod auth;
pub mod classify;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod executor;
pub mod http;
pub mod pager;
pub mod retry;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;

pub use auth::{Anonymous, StaticToken, TokenSource, AUTH_HEADER};
pub use classify::{classify, Classification};
pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, EndpointType, RetrySettings, Verify};
pub use endpoint::Endpoint;
pub use error::{ApiError, ErrorKind};
pub use executor::{ApiResponse, Call, Executor, ResponseBody};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use pager::{Direction, Link, Page, Pager};
pub use retry::{retry_request, Backoff, RetryPolicy, Sleeper, ThreadSleeper};
pub use transport::{TlsMode, TransportOptions, UreqTransport};
