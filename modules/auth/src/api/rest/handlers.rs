use std::sync::Arc;

use api_ingress::{ApiError, ValidatedJson};
use axum::{
    extract::Query,
    http::{header, HeaderMap, StatusCode},
    response::{Json, Redirect},
    Extension,
};
use serde_json::{json, Value};
use tracing::info;

use crate::api::rest::dto::{
    AuthResponse, CallbackQuery, DebugInfo, DebugReport, LoginReq, SignupReq, UserDto,
};
use crate::domain::oauth::{CallbackParams, OAuthFlow};
use crate::domain::service::Service;

/// Register a local account
pub async fn signup(
    Extension(svc): Extension<Arc<Service>>,
    ValidatedJson(req): ValidatedJson<SignupReq>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let session = svc.signup(req.into()).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

pub async fn login(
    Extension(svc): Extension<Arc<Service>>,
    ValidatedJson(req): ValidatedJson<LoginReq>,
) -> Result<Json<AuthResponse>, ApiError> {
    let session = svc.login(req.into()).await?;
    Ok(Json(session.into()))
}

/// Current user from the `Authorization: Bearer` token
pub async fn me(
    Extension(svc): Extension<Arc<Service>>,
    headers: HeaderMap,
) -> Result<Json<UserDto>, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Not authorized, no token".to_string()))?;
    let user = svc.current_user(token).await?;
    Ok(Json(user.into()))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Start Google sign-in
pub async fn google(Extension(flow): Extension<Arc<OAuthFlow>>, headers: HeaderMap) -> Redirect {
    let referer = header_str(&headers, header::REFERER);
    Redirect::to(&flow.begin(referer.as_deref()))
}

pub async fn google_callback(
    Extension(flow): Extension<Arc<OAuthFlow>>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    info!("Received provider callback");
    let target = flow
        .complete(CallbackParams {
            code: query.code,
            state: query.state,
            error: query.error,
        })
        .await;
    Redirect::to(&target)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn debug(
    Extension(static_info): Extension<Arc<DebugInfo>>,
    headers: HeaderMap,
) -> Json<DebugReport> {
    let report = DebugReport {
        info: (*static_info).clone(),
        referer: header_str(&headers, header::REFERER),
        origin: header_str(&headers, header::ORIGIN),
    };
    info!(?report, "Auth debug report");
    Json(report)
}
