use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Configuration for the auth module (`modules.auth`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// HS256 key for access tokens. Required.
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expires_in_secs")]
    pub jwt_expires_in_secs: u64,
    /// HS256 key for the OAuth `state` parameter. Required.
    #[serde(default)]
    pub session_secret: String,
    /// Browser apps allowed to receive OAuth redirects; the first one is the default.
    #[serde(default = "default_frontend_urls")]
    pub frontend_urls: Vec<String>,
    /// Public URLs of this server; the first one builds the OAuth callback URL.
    #[serde(default = "default_backend_urls")]
    pub backend_urls: Vec<String>,
    #[serde(default)]
    pub debug_endpoint: bool,
    #[serde(default)]
    pub google: GoogleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoogleConfig {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Overrides `<backend_urls[0]>/api/auth/google/callback`.
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_userinfo_url")]
    pub userinfo_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expires_in_secs: default_jwt_expires_in_secs(),
            session_secret: String::new(),
            frontend_urls: default_frontend_urls(),
            backend_urls: default_backend_urls(),
            debug_endpoint: false,
            google: GoogleConfig::default(),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            callback_url: None,
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            userinfo_url: default_userinfo_url(),
        }
    }
}

impl AuthConfig {
    /// Reject configurations the server cannot start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt_secret.trim().is_empty() {
            bail!("modules.auth.jwt_secret is required");
        }
        if self.session_secret.trim().is_empty() {
            bail!("modules.auth.session_secret is required");
        }
        if self.frontend_urls.is_empty() {
            bail!("modules.auth.frontend_urls must list at least one URL");
        }
        for raw in &self.frontend_urls {
            let trimmed = raw.trim();
            let valid = url::Url::parse(trimmed)
                .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.has_host());
            if !valid {
                bail!("modules.auth.frontend_urls contains an invalid URL: '{raw}'");
            }
        }
        if self.backend_urls.is_empty() && self.google.callback_url.is_none() {
            bail!("modules.auth.backend_urls must list at least one URL");
        }
        Ok(())
    }

    pub fn google_callback_url(&self) -> String {
        if let Some(url) = &self.google.callback_url {
            return url.clone();
        }
        let backend = self
            .backend_urls
            .first()
            .map(|u| u.trim_end_matches('/'))
            .unwrap_or_default();
        format!("{backend}/api/auth/google/callback")
    }
}

impl GoogleConfig {
    pub fn is_configured(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        set(&self.client_id) && set(&self.client_secret)
    }
}

fn default_jwt_expires_in_secs() -> u64 {
    30 * 24 * 60 * 60
}

fn default_frontend_urls() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_backend_urls() -> Vec<String> {
    vec!["http://localhost:5000".to_string()]
}

fn default_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_userinfo_url() -> String {
    "https://openidconnect.googleapis.com/v1/userinfo".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> AuthConfig {
        AuthConfig {
            jwt_secret: "jwt".into(),
            session_secret: "session".into(),
            ..Default::default()
        }
    }

    #[test]
    fn secrets_are_required() {
        assert!(AuthConfig::default().validate().is_err());
        assert!(configured().validate().is_ok());

        let mut cfg = configured();
        cfg.session_secret = "  ".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn frontend_urls_must_be_absolute() {
        let mut cfg = configured();
        cfg.frontend_urls = vec![" ".into()];
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("frontend_urls contains an invalid URL"), "{err}");

        cfg.frontend_urls = vec!["https://labels.example.com".into(), "/login".into()];
        assert!(cfg.validate().is_err());

        cfg.frontend_urls = vec![" https://labels.example.com/ ".into()];
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn callback_url_from_first_backend() {
        let mut cfg = configured();
        cfg.backend_urls = vec!["https://api.example.com/".into(), "https://b.example.com".into()];
        assert_eq!(
            cfg.google_callback_url(),
            "https://api.example.com/api/auth/google/callback"
        );

        cfg.google.callback_url = Some("https://cb.example.com/cb".into());
        assert_eq!(cfg.google_callback_url(), "https://cb.example.com/cb");
    }

    #[test]
    fn google_needs_id_and_secret() {
        let mut g = GoogleConfig::default();
        assert!(!g.is_configured());
        g.client_id = Some("id".into());
        assert!(!g.is_configured());
        g.client_secret = Some("secret".into());
        assert!(g.is_configured());
    }

    #[test]
    fn deserializes_with_defaults() {
        let cfg: AuthConfig = serde_json::from_value(serde_json::json!({
            "jwt_secret": "a",
            "session_secret": "b",
            "google": { "client_id": "cid" }
        }))
        .unwrap();
        assert_eq!(cfg.jwt_expires_in_secs, 2_592_000);
        assert_eq!(cfg.google.token_url, "https://oauth2.googleapis.com/token");
        assert_eq!(cfg.frontend_urls, vec!["http://localhost:3000".to_string()]);
    }
}
