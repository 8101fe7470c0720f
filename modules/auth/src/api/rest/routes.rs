use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};

use crate::api::rest::dto::DebugInfo;
use crate::api::rest::handlers;
use crate::domain::oauth::OAuthFlow;
use crate::domain::service::Service;

pub fn register_routes(
    router: Router,
    service: Arc<Service>,
    oauth: Arc<OAuthFlow>,
    debug: Option<Arc<DebugInfo>>,
) -> anyhow::Result<Router> {
    let mut auth = Router::new()
        .route("/api/auth/signup", post(handlers::signup))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/me", get(handlers::me))
        .route("/api/auth/google", get(handlers::google))
        .route("/api/auth/google/callback", get(handlers::google_callback))
        .route("/api/auth/health", get(handlers::health));

    if let Some(info) = debug {
        auth = auth
            .route("/api/auth/debug", get(handlers::debug))
            .layer(Extension(info));
    }

    let auth = auth.layer(Extension(service)).layer(Extension(oauth));
    Ok(router.merge(auth))
}
