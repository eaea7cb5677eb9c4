//! Service endpoint: base URL, path prefix and path-template resolution.

use url::Url;

use crate::error::ApiError;

/// A resolved service endpoint, e.g. `https://network.example.com` with the
/// prefix `/v2.0`. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: String,
    prefix: String,
}

impl Endpoint {
    pub fn new(base: &str, prefix: &str) -> Result<Self, ApiError> {
        let parsed = Url::parse(base)
            .map_err(|e| ApiError::Config(format!("invalid endpoint URL {base:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::Config(format!(
                "endpoint URL {base:?} must use http or https"
            )));
        }
        let prefix = prefix.trim_matches('/');
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            prefix: if prefix.is_empty() {
                String::new()
            } else {
                format!("/{prefix}")
            },
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Absolute URL for `path`. A path already carrying the prefix is left
    /// alone, so links handed back by the server can be fed in directly.
    pub fn url_for(&self, path: &str) -> String {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let prefixed = !self.prefix.is_empty()
            && (path == self.prefix || path.starts_with(&format!("{}/", self.prefix)));
        if prefixed {
            format!("{}{path}", self.base)
        } else {
            format!("{}{}{path}", self.base, self.prefix)
        }
    }

    /// Substitute `{name}` placeholders in `template` with percent-encoded
    /// values from `params`. Unused params are ignored.
    pub fn resolve(template: &str, params: &[(&str, &str)]) -> Result<String, ApiError> {
        let mut scratch = Url::parse("http://localhost/").map_err(|e| {
            ApiError::InvalidRequest(format!("cannot build path from {template:?}: {e}"))
        })?;
        let mut segments = Vec::new();
        for segment in template.trim_start_matches('/').split('/') {
            let value = match placeholder(segment) {
                Some(name) => params
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| {
                        ApiError::InvalidRequest(format!(
                            "path template {template:?} needs a value for {{{name}}}"
                        ))
                    })?,
                None => segment,
            };
            segments.push(value);
        }
        scratch
            .path_segments_mut()
            .map_err(|()| ApiError::InvalidRequest(format!("cannot build path from {template:?}")))?
            .clear()
            .extend(segments);
        Ok(scratch.path().to_string())
    }
}

fn placeholder(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let ep = Endpoint::new("http://localhost:9696/", "/v2.0/").unwrap();
        assert_eq!(ep.base(), "http://localhost:9696");
        assert_eq!(ep.prefix(), "/v2.0");
        assert_eq!(ep.url_for("/networks"), "http://localhost:9696/v2.0/networks");
    }

    #[test]
    fn prefix_is_not_doubled() {
        let ep = Endpoint::new("http://localhost:9696", "v2.0").unwrap();
        assert_eq!(
            ep.url_for("/v2.0/networks"),
            "http://localhost:9696/v2.0/networks"
        );
        assert_eq!(
            ep.url_for("/v2.0x/networks"),
            "http://localhost:9696/v2.0/v2.0x/networks"
        );
    }

    #[test]
    fn empty_prefix() {
        let ep = Endpoint::new("https://dns.example.com", "").unwrap();
        assert_eq!(ep.url_for("zones"), "https://dns.example.com/zones");
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(matches!(
            Endpoint::new("not a url", "/v2.0"),
            Err(ApiError::Config(_))
        ));
        assert!(matches!(
            Endpoint::new("ftp://example.com", "/v2.0"),
            Err(ApiError::Config(_))
        ));
    }

    #[test]
    fn resolve_substitutes_and_encodes() {
        let path = Endpoint::resolve(
            "/networks/{network_id}/tags/{tag}",
            &[("network_id", "abc"), ("tag", "a b/c"), ("unused", "x")],
        )
        .unwrap();
        assert_eq!(path, "/networks/abc/tags/a%20b%2Fc");
    }

    #[test]
    fn resolve_without_placeholders() {
        assert_eq!(Endpoint::resolve("/networks", &[]).unwrap(), "/networks");
    }

    #[test]
    fn resolve_missing_placeholder_is_an_error() {
        let err = Endpoint::resolve("/networks/{id}", &[]).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }
}
