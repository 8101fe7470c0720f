use std::sync::Arc;

use api_ingress::RestfulModule;
use async_trait::async_trait;
use db::{DbHandle, DbModule};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::LabelsConfig;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::sea_orm_repo::SeaOrmLabelsRepository;

/// Labels and label templates: storage, domain service and REST surface.
pub struct LabelsModule {
    service: Arc<Service>,
}

impl LabelsModule {
    pub fn new(db: &DbHandle, cfg: LabelsConfig) -> Self {
        info!("Initializing labels module");
        debug!(default_languages = ?cfg.default_languages, "Loaded labels config");

        let repo = Arc::new(SeaOrmLabelsRepository::new(db.sea()));
        let service = Service::new(
            repo,
            ServiceConfig {
                default_languages: cfg.default_languages,
            },
        );
        Self {
            service: Arc::new(service),
        }
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }
}

#[async_trait]
impl DbModule for LabelsModule {
    async fn migrate(&self, db: &DbHandle) -> anyhow::Result<()> {
        info!("Running labels database migrations");
        Migrator::up(db.seaorm(), None).await?;
        info!("Labels database migrations completed successfully");
        Ok(())
    }
}

impl RestfulModule for LabelsModule {
    fn register_rest(&self, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering labels REST routes");
        routes::register_routes(router, self.service.clone())
    }
}
