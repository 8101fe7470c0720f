//! Google OpenID Connect provider over plain OAuth 2.0 endpoints.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::config::AuthConfig;
use crate::contract::model::ExternalProfile;
use crate::domain::provider::{IdentityProvider, ProviderError};

const SCOPE: &str = "openid email profile";

pub struct GoogleProvider {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    callback_url: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    name: Option<String>,
}

impl GoogleProvider {
    /// Build the provider, or `None` when no client credentials are configured.
    pub fn from_config(cfg: &AuthConfig) -> anyhow::Result<Option<Self>> {
        if !cfg.google.is_configured() {
            return Ok(None);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("failed to build HTTP client for Google sign-in")?;
        Url::parse(&cfg.google.auth_url)
            .with_context(|| format!("invalid google.auth_url '{}'", cfg.google.auth_url))?;

        Ok(Some(Self {
            http,
            client_id: cfg.google.client_id.clone().unwrap_or_default(),
            client_secret: cfg.google.client_secret.clone().unwrap_or_default(),
            callback_url: cfg.google_callback_url(),
            auth_url: cfg.google.auth_url.clone(),
            token_url: cfg.google.token_url.clone(),
            userinfo_url: cfg.google.userinfo_url.clone(),
        }))
    }

    async fn fetch_access_token(&self, code: &str) -> Result<String, ProviderError> {
        let resp = self
            .http
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            debug!(%status, %body, "Token endpoint refused the code");
            return Err(ProviderError::Exchange(format!("token endpoint returned {status}")));
        }
        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Exchange(e.to_string()))?;
        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ExternalProfile, ProviderError> {
        let resp = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Profile(format!("userinfo endpoint returned {status}")));
        }
        let info: UserInfo = resp
            .json()
            .await
            .map_err(|e| ProviderError::Profile(e.to_string()))?;
        Ok(ExternalProfile {
            email: info.email,
            given_name: info.given_name,
            family_name: info.family_name,
            display_name: info.name,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn authorize_url(&self, state: &str) -> Result<String, ProviderError> {
        let url = Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.callback_url.as_str()),
                ("response_type", "code"),
                ("scope", SCOPE),
                ("state", state),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| ProviderError::Exchange(e.to_string()))?;
        Ok(url.into())
    }

    #[instrument(skip_all, fields(provider = "google"))]
    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, ProviderError> {
        let access_token = self.fetch_access_token(code).await?;
        self.fetch_profile(&access_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> AuthConfig {
        let mut cfg = AuthConfig {
            jwt_secret: "j".into(),
            session_secret: "s".into(),
            ..Default::default()
        };
        cfg.google.client_id = Some("client-123".into());
        cfg.google.client_secret = Some("shh".into());
        cfg
    }

    #[test]
    fn unconfigured_provider_is_absent() {
        let cfg = AuthConfig::default();
        assert!(GoogleProvider::from_config(&cfg).unwrap().is_none());
    }

    #[test]
    fn authorize_url_carries_request() {
        let provider = GoogleProvider::from_config(&configured()).unwrap().unwrap();
        let url = Url::parse(&provider.authorize_url("st.ate").unwrap()).unwrap();
        assert_eq!(url.host_str(), Some("accounts.google.com"));

        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(
            params["redirect_uri"],
            "http://localhost:5000/api/auth/google/callback"
        );
        assert_eq!(params["scope"], "openid email profile");
        assert_eq!(params["prompt"], "select_account");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["state"], "st.ate");
    }
}
