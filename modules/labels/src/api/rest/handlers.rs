use std::sync::Arc;

use api_ingress::validation::check;
use api_ingress::{ApiError, ValidatedJson};
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::Json,
    Extension,
};
use tracing::info;

use crate::api::rest::dto::{CreateLabelReq, LabelDto, ListLabelsQuery, TemplateDto};
use crate::api::rest::params::{
    BatchParams, IdParams, IdentifierParams, ProtocolKitParams, SponsorTrialBatchParams,
    SponsorTrialKitParams,
};
use crate::contract::model::LabelLookup;
use crate::domain::service::Service;

/// Create a new label
pub async fn create_label(
    Extension(svc): Extension<Arc<Service>>,
    ValidatedJson(req): ValidatedJson<CreateLabelReq>,
) -> Result<(StatusCode, Json<LabelDto>), ApiError> {
    let label = svc.create_label(req.into_new_label()?).await?;
    Ok((StatusCode::CREATED, Json(label.into())))
}

/// List labels, optionally filtered by type and template version
pub async fn list_labels(
    Extension(svc): Extension<Arc<Service>>,
    query: Result<Query<ListLabelsQuery>, axum::extract::rejection::QueryRejection>,
) -> Result<Json<Vec<LabelDto>>, ApiError> {
    let Query(query) = query?;
    let labels = svc.list_labels(query.into_filter()?).await?;
    Ok(Json(labels.into_iter().map(LabelDto::from).collect()))
}

pub async fn get_label(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
) -> Result<Json<LabelDto>, ApiError> {
    let params = IdParams { id };
    check(&params)?;
    info!("Getting label with id: {}", params.id);
    Ok(Json(svc.get_label(&params.id).await?.into()))
}

async fn find(svc: &Service, lookup: LabelLookup) -> Result<Json<LabelDto>, ApiError> {
    info!(?lookup, "Looking up label");
    Ok(Json(svc.find_label(lookup).await?.into()))
}

pub async fn get_label_by_batch(
    Extension(svc): Extension<Arc<Service>>,
    Path(batch_number): Path<String>,
) -> Result<Json<LabelDto>, ApiError> {
    let params = BatchParams { batch_number };
    check(&params)?;
    find(&svc, params.into()).await
}

pub async fn get_label_by_protocol_kit(
    Extension(svc): Extension<Arc<Service>>,
    Path((protocol_number, kit_number)): Path<(String, String)>,
) -> Result<Json<LabelDto>, ApiError> {
    let params = ProtocolKitParams {
        protocol_number,
        kit_number,
    };
    check(&params)?;
    find(&svc, params.into()).await
}

pub async fn get_label_by_identifier(
    Extension(svc): Extension<Arc<Service>>,
    Path(identifier_code): Path<String>,
) -> Result<Json<LabelDto>, ApiError> {
    let params = IdentifierParams { identifier_code };
    check(&params)?;
    find(&svc, params.into()).await
}

pub async fn get_label_by_sponsor_trial_batch(
    Extension(svc): Extension<Arc<Service>>,
    Path((sponsor_name, trial_identifier, batch_number)): Path<(String, String, String)>,
) -> Result<Json<LabelDto>, ApiError> {
    let params = SponsorTrialBatchParams {
        sponsor_name,
        trial_identifier,
        batch_number,
    };
    check(&params)?;
    find(&svc, params.into()).await
}

pub async fn get_label_by_sponsor_trial_kit(
    Extension(svc): Extension<Arc<Service>>,
    Path((sponsor_name, trial_identifier, kit_number)): Path<(String, String, String)>,
) -> Result<Json<LabelDto>, ApiError> {
    let params = SponsorTrialKitParams {
        sponsor_name,
        trial_identifier,
        kit_number,
    };
    check(&params)?;
    find(&svc, params.into()).await
}

pub async fn list_templates(
    Extension(svc): Extension<Arc<Service>>,
) -> Result<Json<Vec<TemplateDto>>, ApiError> {
    let templates = svc.list_templates().await?;
    Ok(Json(templates.into_iter().map(TemplateDto::from).collect()))
}

pub async fn get_template(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
) -> Result<Json<TemplateDto>, ApiError> {
    let params = IdParams { id };
    check(&params)?;
    Ok(Json(svc.get_template(&params.id).await?.into()))
}
