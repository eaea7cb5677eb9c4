//! Blocking `Transport` over `ureq`.
//!
//! Status codes are returned as data (`http_status_as_error(false)`), so
//! 4xx/5xx responses reach the executor's classifier. Only failures where no
//! response arrived become `TransportError`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ureq::tls::{Certificate, RootCerts, TlsConfig};
use ureq::{Agent, RequestBuilder};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Server certificate verification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TlsMode {
    /// Verify against the bundled web-PKI roots.
    #[default]
    Verify,
    /// Verify against the certificates in a PEM file.
    CaBundle(PathBuf),
    /// Do not verify.
    Insecure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Per-call timeout. `None` waits forever.
    pub timeout: Option<Duration>,
    pub tls: TlsMode,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            tls: TlsMode::Verify,
        }
    }
}

pub struct UreqTransport {
    agent: Agent,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self {
            agent: agent(TransportOptions::default().timeout, TlsConfig::builder().build()),
        }
    }
}

impl UreqTransport {
    pub fn new(options: TransportOptions) -> Result<Self, ApiError> {
        let tls = match &options.tls {
            TlsMode::Verify => TlsConfig::builder().build(),
            TlsMode::Insecure => TlsConfig::builder().disable_verification(true).build(),
            TlsMode::CaBundle(path) => TlsConfig::builder()
                .root_certs(RootCerts::Specific(Arc::new(load_certificates(path)?)))
                .build(),
        };
        Ok(Self {
            agent: agent(options.timeout, tls),
        })
    }
}

fn agent(timeout: Option<Duration>, tls: TlsConfig) -> Agent {
    Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(timeout)
        .tls_config(tls)
        .build()
        .new_agent()
}

fn load_certificates(path: &Path) -> Result<Vec<Certificate<'static>>, ApiError> {
    let pem = std::fs::read(path).map_err(|e| {
        ApiError::Config(format!("cannot read CA bundle {}: {e}", path.display()))
    })?;
    let certs = ureq::tls::parse_pem(&pem)
        .filter_map(|item| match item {
            Ok(ureq::tls::PemItem::Certificate(cert)) => Some(Ok(cert)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::Config(format!("invalid CA bundle {}: {e}", path.display())))?;
    if certs.is_empty() {
        return Err(ApiError::Config(format!(
            "CA bundle {} contains no certificates",
            path.display()
        )));
    }
    Ok(certs)
}

fn decorate<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (key, value) in &request.query {
        builder = builder.query(key.as_str(), value.as_str());
    }
    for (key, value) in &request.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let body = request.body.as_deref().map(str::as_bytes);
        let result = match (request.method, body) {
            (HttpMethod::Get, _) => decorate(self.agent.get(url), request).call(),
            (HttpMethod::Delete, None) => decorate(self.agent.delete(url), request).call(),
            (HttpMethod::Delete, Some(bytes)) => {
                decorate(self.agent.delete(url).force_send_body(), request).send(bytes)
            }
            (HttpMethod::Post, Some(bytes)) => decorate(self.agent.post(url), request).send(bytes),
            (HttpMethod::Post, None) => decorate(self.agent.post(url), request).send_empty(),
            (HttpMethod::Put, Some(bytes)) => decorate(self.agent.put(url), request).send(bytes),
            (HttpMethod::Put, None) => decorate(self.agent.put(url), request).send_empty(),
        };

        let mut response = result.map_err(transport_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(transport_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn transport_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::timed_out(err.to_string()),
        other => TransportError::new(other.to_string()),
    }
}
