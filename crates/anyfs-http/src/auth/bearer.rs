//! Delegated-credential (bearer token) authentication.

use std::future::Future;

use http::header::{AUTHORIZATION, HeaderValue};
use secrecy::{ExposeSecret as _, SecretString};

use super::Authenticator;
use crate::error::AuthError;
use crate::http_client::HttpRequest;

/// Hands out bearer tokens.
///
/// Acquisition, caching and refresh are entirely the provider's business;
/// [`BearerAuth`] asks for a token on every attempt.
pub trait TokenProvider: Send + Sync {
    /// Return a token that is valid right now.
    fn token(&self) -> impl Future<Output = Result<SecretString, AuthError>> + Send;
}

/// A provider that always returns the same pre-issued token.
#[derive(Debug, Clone)]
pub struct StaticToken(SecretString);

impl StaticToken {
    /// Wrap an already issued token.
    #[must_use]
    pub fn new(token: SecretString) -> Self {
        Self(token)
    }
}

impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<SecretString, AuthError> {
        Ok(self.0.clone())
    }
}

/// Injects `Authorization: Bearer <token>` from a [`TokenProvider`].
#[derive(Debug, Clone)]
pub struct BearerAuth<P> {
    provider: P,
}

impl<P: TokenProvider> BearerAuth<P> {
    /// Authenticate with tokens from `provider`.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: TokenProvider> Authenticator for BearerAuth<P> {
    async fn authorize(&self, request: &mut HttpRequest) -> Result<(), AuthError> {
        let token = self.provider.token().await?;
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
        value.set_sensitive(true);
        request.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}
