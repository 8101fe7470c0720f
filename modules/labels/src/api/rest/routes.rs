use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use crate::api::rest::handlers;
use crate::domain::service::Service;

// Path segments in the same position must share a parameter name, so the
// sponsor lookups reuse `{id}`; handlers extract parameters by position.
pub fn register_routes(router: Router, service: Arc<Service>) -> anyhow::Result<Router> {
    let labels = Router::new()
        .route(
            "/api/labels",
            get(handlers::list_labels).post(handlers::create_label),
        )
        .route("/api/labels/{id}", get(handlers::get_label))
        .route(
            "/api/labels/batch/{batchNumber}",
            get(handlers::get_label_by_batch),
        )
        .route(
            "/api/labels/protocol/{protocolNumber}/kit/{kitNumber}",
            get(handlers::get_label_by_protocol_kit),
        )
        .route(
            "/api/labels/identifier/{identifierCode}",
            get(handlers::get_label_by_identifier),
        )
        .route(
            "/api/labels/{id}/{trialIdentifier}/batch/{batchNumber}",
            get(handlers::get_label_by_sponsor_trial_batch),
        )
        .route(
            "/api/labels/{id}/{trialIdentifier}/kit/{kitNumber}",
            get(handlers::get_label_by_sponsor_trial_kit),
        )
        .route("/api/templates", get(handlers::list_templates))
        .route("/api/templates/{id}", get(handlers::get_template))
        .layer(Extension(service));

    Ok(router.merge(labels))
}
