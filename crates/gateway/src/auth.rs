//! Bearer token supply.

/// Source of the bearer token attached to every request.
///
/// Called once per request so implementations may refresh credentials between calls.
pub trait TokenSupplier: Send + Sync {
    /// Returns the current token, or `None` when the caller is not signed in.
    fn bearer_token(&self) -> Option<String>;
}

/// A fixed token resolved at startup.
#[derive(Clone, Debug, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    /// Wraps `token`; blank tokens are treated as absent.
    pub fn new(token: Option<String>) -> Self {
        Self(token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()))
    }
}

impl TokenSupplier for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}
