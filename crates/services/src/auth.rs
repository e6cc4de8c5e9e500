use async_trait::async_trait;
use std::env;

/// Source of the bearer credential attached to outgoing requests.
///
/// Queried per request rather than cached, so a token refresh in the
/// provider is transparent to every caller.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current bearer token, or `None` when the player is unauthenticated.
    async fn bearer_token(&self) -> Option<String>;
}

/// Fixed token, or anonymous when built without one.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Reads the token from an environment variable on every request, so an
/// external refresher can rotate it while the game is running.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub const DEFAULT_VAR: &'static str = "RUSH_API_TOKEN";

    #[must_use]
    pub fn new() -> Self {
        Self::from_var(Self::DEFAULT_VAR)
    }

    #[must_use]
    pub fn from_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentials {
    async fn bearer_token(&self) -> Option<String> {
        match env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Some(token),
            _ => None,
        }
    }
}
