use async_trait::async_trait;
use thiserror::Error;

use crate::contract::model::ExternalProfile;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Google sign-in is not configured")]
    NotConfigured,
    #[error("Google sign-in was cancelled: {0}")]
    Denied(String),
    #[error("Authorization code was rejected: {0}")]
    Exchange(String),
    #[error("Failed to fetch Google profile: {0}")]
    Profile(String),
    #[error("Identity provider unreachable: {0}")]
    Transport(String),
}

/// An OAuth 2.0 / OpenID Connect identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// URL the browser is sent to; `state` must come back unchanged.
    fn authorize_url(&self, state: &str) -> Result<String, ProviderError>;

    /// Trade an authorization code for the user's profile.
    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, ProviderError>;
}
