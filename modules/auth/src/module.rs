use std::sync::Arc;

use anyhow::Context;
use api_ingress::RestfulModule;
use async_trait::async_trait;
use db::{DbHandle, DbModule};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info, warn};

use crate::api::rest::dto::DebugInfo;
use crate::api::rest::routes;
use crate::config::AuthConfig;
use crate::domain::oauth::OAuthFlow;
use crate::domain::provider::IdentityProvider;
use crate::domain::service::Service;
use crate::domain::token::{JwtService, StateSigner};
use crate::infra::google::GoogleProvider;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::sea_orm_repo::SeaOrmUsersRepository;

/// Accounts, tokens and provider sign-in.
pub struct AuthModule {
    service: Arc<Service>,
    oauth: Arc<OAuthFlow>,
    debug: Option<Arc<DebugInfo>>,
}

impl AuthModule {
    /// `environment` is only reported by the debug endpoint.
    pub fn new(db: &DbHandle, cfg: AuthConfig, environment: &str) -> anyhow::Result<Self> {
        info!("Initializing auth module");
        cfg.validate().context("invalid auth configuration")?;
        debug!(
            frontend_urls = ?cfg.frontend_urls,
            jwt_expires_in_secs = cfg.jwt_expires_in_secs,
            "Loaded auth config"
        );

        let repo = Arc::new(SeaOrmUsersRepository::new(db.sea()));
        let jwt = JwtService::new(&cfg.jwt_secret, cfg.jwt_expires_in_secs);
        let service = Arc::new(Service::new(repo, jwt));

        let provider: Option<Arc<dyn IdentityProvider>> = match GoogleProvider::from_config(&cfg)? {
            Some(google) => {
                info!(callback_url = %cfg.google_callback_url(), "Google sign-in enabled");
                Some(Arc::new(google))
            }
            None => {
                warn!("Google client credentials not set, Google sign-in disabled");
                None
            }
        };

        let debug = cfg.debug_endpoint.then(|| {
            let set = |v: &Option<String>| {
                if v.as_deref().is_some_and(|s| !s.is_empty()) {
                    "Set"
                } else {
                    "Not Set"
                }
            };
            Arc::new(DebugInfo {
                environment: environment.to_string(),
                backend_urls: cfg.backend_urls.clone(),
                frontend_urls: cfg.frontend_urls.clone(),
                google_client_id: set(&cfg.google.client_id),
                google_client_secret: set(&cfg.google.client_secret),
                google_callback_url: cfg.google_callback_url(),
            })
        });

        let oauth = Arc::new(OAuthFlow::new(
            provider,
            StateSigner::new(&cfg.session_secret),
            cfg.frontend_urls,
            service.clone(),
        ));

        Ok(Self {
            service,
            oauth,
            debug,
        })
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn oauth(&self) -> Arc<OAuthFlow> {
        self.oauth.clone()
    }
}

#[async_trait]
impl DbModule for AuthModule {
    async fn migrate(&self, db: &DbHandle) -> anyhow::Result<()> {
        info!("Running auth database migrations");
        Migrator::up(db.seaorm(), None).await?;
        info!("Auth database migrations completed successfully");
        Ok(())
    }
}

impl RestfulModule for AuthModule {
    fn register_rest(&self, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering auth REST routes");
        routes::register_routes(
            router,
            self.service.clone(),
            self.oauth.clone(),
            self.debug.clone(),
        )
    }
}
