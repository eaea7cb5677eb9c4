//! Auth token access.
//!
//! The token is the only state shared across calls. The core only reads it;
//! refreshing it is the credential collaborator's job, which is why the
//! executor asks a `TokenSource` on every request build instead of caching.

/// Header carrying the token on every request.
pub const AUTH_HEADER: &str = "X-Auth-Token";

pub trait TokenSource: Send + Sync {
    /// The current token, or `None` to send the request unauthenticated.
    fn token(&self) -> Option<String>;
}

/// A token fixed at construction time.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.clone())
        }
    }
}

/// No token at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl TokenSource for Anonymous {
    fn token(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_static_token_sends_nothing() {
        assert_eq!(StaticToken::new("").token(), None);
        assert_eq!(StaticToken::new("abc").token().as_deref(), Some("abc"));
        assert_eq!(Anonymous.token(), None);
    }

    #[test]
    fn debug_hides_the_token() {
        assert_eq!(format!("{:?}", StaticToken::new("secret")), "StaticToken(***)");
    }
}
