//! Client configuration: TOML file, then environment overrides.
//!
//! ```toml
//! region = "jp1"
//! endpoint_type = "public"
//! token = "..."
//! timeout_secs = 30
//! verify = "/etc/ssl/private-ca.pem"   # or true / false
//!
//! [endpoints]
//! public = "https://network-{region}.example.com"
//! internal = "http://network.internal:9696"
//!
//! [retry]
//! max_attempts = 3
//! delay_ms = 1000
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::retry::{Backoff, RetryPolicy};
use crate::transport::{TlsMode, TransportOptions, DEFAULT_TIMEOUT};

/// Which of a service's published URLs to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointType {
    #[default]
    Public,
    Internal,
    Admin,
}

impl EndpointType {
    pub fn as_str(self) -> &'static str {
        match self {
            EndpointType::Public => "public",
            EndpointType::Internal => "internal",
            EndpointType::Admin => "admin",
        }
    }
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().trim_end_matches("url") {
            "public" => Ok(EndpointType::Public),
            "internal" => Ok(EndpointType::Internal),
            "admin" => Ok(EndpointType::Admin),
            _ => Err(ApiError::Config(format!(
                "unknown endpoint type {s:?} (expected public, internal or admin)"
            ))),
        }
    }
}

/// `verify = true | false | "<path to CA bundle>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Verify {
    Enabled(bool),
    CaBundle(PathBuf),
}

impl Default for Verify {
    fn default() -> Self {
        Verify::Enabled(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay_ms: u64,
    pub raise_on_exhausted: bool,
    /// Opt-in exponential backoff; unset keeps the fixed delay.
    pub backoff_factor: Option<u32>,
    pub max_delay_ms: Option<u64>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            delay_ms: policy.delay.as_millis() as u64,
            raise_on_exhausted: policy.raise_on_exhausted,
            backoff_factor: None,
            max_delay_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Explicit URL; wins over `endpoints`.
    pub endpoint: Option<String>,
    pub endpoints: BTreeMap<EndpointType, String>,
    pub endpoint_type: EndpointType,
    pub region: Option<String>,
    pub token: Option<String>,
    /// Per-call timeout; 0 disables it.
    pub timeout_secs: Option<u64>,
    pub verify: Verify,
    pub retry: RetrySettings,
}

impl ClientConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ApiError> {
        toml::from_str(text).map_err(|e| ApiError::Config(format!("invalid config: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, ApiError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ApiError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Apply `CLOUD_*` variables from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ApiError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `CLOUD_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("CLOUD_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Some(token) = lookup("CLOUD_TOKEN") {
            self.token = Some(token);
        }
        if let Some(region) = lookup("CLOUD_REGION") {
            self.region = Some(region);
        }
        if let Some(kind) = lookup("CLOUD_ENDPOINT_TYPE") {
            self.endpoint_type = kind.parse()?;
        }
        if let Some(timeout) = lookup("CLOUD_TIMEOUT") {
            let secs = timeout.trim().parse().map_err(|_| {
                ApiError::Config(format!("CLOUD_TIMEOUT must be whole seconds, got {timeout:?}"))
            })?;
            self.timeout_secs = Some(secs);
        }
        if let Some(path) = lookup("CLOUD_CACERT") {
            self.verify = Verify::CaBundle(PathBuf::from(path));
        }
        if lookup("CLOUD_INSECURE").is_some_and(|v| is_truthy(&v)) {
            self.verify = Verify::Enabled(false);
        }
        Ok(())
    }

    /// The service URL for the configured endpoint type, with `{region}`
    /// substituted.
    pub fn resolve_endpoint(&self) -> Result<String, ApiError> {
        let template = match &self.endpoint {
            Some(url) => url.clone(),
            None => self
                .endpoints
                .get(&self.endpoint_type)
                .cloned()
                .ok_or_else(|| {
                    ApiError::Config(format!(
                        "no {} endpoint configured",
                        self.endpoint_type
                    ))
                })?,
        };
        if !template.contains("{region}") {
            return Ok(template);
        }
        let region = self.region.as_deref().ok_or_else(|| {
            ApiError::Config(format!("endpoint {template:?} needs a region"))
        })?;
        Ok(template.replace("{region}", region))
    }

    pub fn transport_options(&self) -> TransportOptions {
        let timeout = match self.timeout_secs {
            None => Some(DEFAULT_TIMEOUT),
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        };
        let tls = match &self.verify {
            Verify::Enabled(true) => TlsMode::Verify,
            Verify::Enabled(false) => TlsMode::Insecure,
            Verify::CaBundle(path) => TlsMode::CaBundle(path.clone()),
        };
        TransportOptions { timeout, tls }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let delay = Duration::from_millis(self.retry.delay_ms);
        let backoff = match self.retry.backoff_factor {
            Some(factor) => Backoff::Exponential {
                factor,
                max: self
                    .retry
                    .max_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(Duration::MAX),
            },
            None => Backoff::Fixed,
        };
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            delay,
            backoff,
            raise_on_exhausted: self.retry.raise_on_exhausted,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
