//! Browser sign-in through an external identity provider.
//!
//! The front-end origin that started the flow travels inside the signed
//! `state` parameter, so the callback needs no server-side session. Every
//! outcome is a redirect back to a front-end origin from the allowlist.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use url::Url;

use crate::domain::error::DomainError;
use crate::domain::provider::{IdentityProvider, ProviderError};
use crate::domain::service::Service;
use crate::domain::token::StateSigner;

/// Query parameters the provider sends back to the callback.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

pub struct OAuthFlow {
    provider: Option<Arc<dyn IdentityProvider>>,
    states: StateSigner,
    frontend_urls: Vec<String>,
    service: Arc<Service>,
}

impl OAuthFlow {
    pub fn new(
        provider: Option<Arc<dyn IdentityProvider>>,
        states: StateSigner,
        frontend_urls: Vec<String>,
        service: Arc<Service>,
    ) -> Self {
        let frontend_urls = frontend_urls
            .iter()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .collect();
        Self {
            provider,
            states,
            frontend_urls,
            service,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    fn default_origin(&self) -> String {
        self.frontend_urls.first().cloned().unwrap_or_default()
    }

    /// Origin of `referer` when it is an allowed front end, else the default one.
    pub fn pick_origin(&self, referer: Option<&str>) -> String {
        referer
            .and_then(|r| Url::parse(r).ok())
            .map(|u| u.origin().ascii_serialization())
            .and_then(|origin| {
                self.frontend_urls
                    .iter()
                    .find(|allowed| origin_of(allowed).as_deref() == Some(origin.as_str()))
                    .cloned()
            })
            .unwrap_or_else(|| self.default_origin())
    }

    /// Where to send the browser to start sign-in.
    #[instrument(skip(self))]
    pub fn begin(&self, referer: Option<&str>) -> String {
        let origin = self.pick_origin(referer);
        match self.authorize_url(&origin) {
            Ok(url) => {
                info!(%origin, "Starting provider sign-in");
                url
            }
            Err(e) => {
                warn!(error = %e, "Cannot start provider sign-in");
                failure_redirect(&origin, &e.to_string())
            }
        }
    }

    fn authorize_url(&self, origin: &str) -> Result<String, DomainError> {
        let provider = self.provider.as_ref().ok_or(ProviderError::NotConfigured)?;
        let state = self
            .states
            .sign(origin)
            .map_err(|e| DomainError::internal(e.to_string()))?;
        Ok(provider.authorize_url(&state)?)
    }

    /// Finish sign-in and return the front-end URL to redirect to: the
    /// token on success, an `auth_failed` login page otherwise.
    #[instrument(skip_all)]
    pub async fn complete(&self, params: CallbackParams) -> String {
        let verified = match params.state.as_deref() {
            Some(state) => self
                .states
                .verify(state)
                .map_err(|e| DomainError::invalid_state(e.to_string())),
            None => Err(DomainError::invalid_state("missing state")),
        };

        let (origin, outcome) = match verified {
            // Re-checked against the current allowlist.
            Ok(origin) => {
                let origin = self.pick_origin(Some(&origin));
                let outcome = self.exchange(params.code, params.error).await;
                (origin, outcome)
            }
            Err(e) => (self.default_origin(), Err(e)),
        };

        match outcome {
            Ok(token) => {
                info!(%origin, "Provider sign-in completed");
                format!("{origin}/oauth-callback?token={}", urlencoding::encode(&token))
            }
            Err(e) => {
                warn!(error = %e, %origin, "Provider sign-in failed");
                failure_redirect(&origin, &e.to_string())
            }
        }
    }

    async fn exchange(
        &self,
        code: Option<String>,
        provider_error: Option<String>,
    ) -> Result<String, DomainError> {
        if let Some(err) = provider_error {
            return Err(ProviderError::Denied(err).into());
        }
        let provider = self.provider.as_ref().ok_or(ProviderError::NotConfigured)?;
        let code = code
            .filter(|c| !c.trim().is_empty())
            .ok_or(DomainError::MissingCode)?;

        let profile = provider.exchange_code(&code).await?;
        let user = self.service.resolve_oauth_user(profile).await?;
        self.service.issue_token(&user)
    }
}

fn origin_of(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|u| u.origin().ascii_serialization())
}

fn failure_redirect(origin: &str, message: &str) -> String {
    format!(
        "{origin}/login?error=auth_failed&message={}",
        urlencoding::encode(message)
    )
}
