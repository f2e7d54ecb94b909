//! Access-token provisioning for realtime connections
//!
//! The session layer never owns a credential. Every connect attempt asks the
//! [`TokenProvider`] for a currently-valid token; the provider is responsible
//! for refreshing an expired one before answering. Implementations must be
//! safe to call concurrently.

use std::future::Future;

use thiserror::Error;

/// Errors produced while obtaining an access token
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// No valid credential could be produced (not signed in, refresh failed)
    #[error("Authentication unavailable: {0}")]
    Unavailable(String),
}

/// Source of valid access tokens for connection-time authentication
///
/// The real application backs this with secure storage plus a refresh
/// round-trip; tests and the diagnostic CLI use [`StaticTokenProvider`].
pub trait TokenProvider: Send + Sync + 'static {
    /// Return a currently-valid access token, refreshing if necessary
    fn access_token(&self) -> impl Future<Output = Result<String, AuthError>> + Send;
}

/// Token provider that hands out a fixed token
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        if self.token.is_empty() {
            return Err(AuthError::Unavailable("no token configured".to_string()));
        }
        Ok(self.token.clone())
    }
}
