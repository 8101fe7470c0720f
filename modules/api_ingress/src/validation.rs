//! Request validation glue between `validator` and [`ApiError`].
//!
//! Handlers receive already-validated input: [`ValidatedJson`] rejects a
//! malformed or rule-breaking body with a 400 before the handler runs, and
//! path/query parameter structs go through [`check`].

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::{ApiError, FieldError};

/// JSON body extractor that runs `Validate` after deserializing.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Validate a parameter struct, mapping failures to a 400 field-error list.
pub fn check<T: Validate>(params: &T) -> Result<(), ApiError> {
    params.validate().map_err(ApiError::from)
}

/// Flatten `validator` output into wire field errors, ordered by field name.
/// Rust field names are reported in camelCase, the way clients send them.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    for (field, list) in errors.field_errors() {
        let field = to_camel_case(&field);
        for err in list.iter() {
            let message = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid {field}"));
            out.push(FieldError::new(field.clone(), message));
        }
    }
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

/// `batch_number` → `batchNumber`; already camelCase input is returned as is.
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for ch in name.chars() {
        if ch == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Shorthand for a single-field validation failure.
pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> ApiError {
    ApiError::Validation(vec![FieldError::new(field, message)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, response::IntoResponse, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    struct Signup {
        #[validate(length(min = 1, message = "First name is required"))]
        first_name: String,
        #[validate(length(min = 6, message = "Password too short"))]
        password: String,
    }

    #[test]
    fn camel_case_conversion() {
        assert_eq!(to_camel_case("batch_number"), "batchNumber");
        assert_eq!(to_camel_case("metadata"), "metadata");
        assert_eq!(to_camel_case("identifierCode"), "identifierCode");
        assert_eq!(to_camel_case("_private"), "private");
    }

    #[test]
    fn errors_sorted_and_camel_cased() {
        let s = Signup {
            first_name: String::new(),
            password: "x".into(),
        };
        let errs = field_errors(&s.validate().unwrap_err());
        assert_eq!(
            errs,
            vec![
                FieldError::new("firstName", "First name is required"),
                FieldError::new("password", "Password too short"),
            ]
        );
    }

    async fn handler(ValidatedJson(body): ValidatedJson<Signup>) -> impl IntoResponse {
        body.first_name
    }

    async fn send(body: &'static str) -> (StatusCode, serde_json::Value) {
        let app = Router::new().route("/", post(handler));
        let resp = app
            .oneshot(
                axum::http::Request::post("/")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn extractor_rejects_rule_violations() {
        let (status, json) = send(r#"{"firstName":"","password":"secret1"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["errors"][0]["field"], "firstName");
    }

    #[tokio::test]
    async fn extractor_rejects_malformed_json_with_message() {
        let (status, json) = send("{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].is_string());
    }

    #[tokio::test]
    async fn extractor_passes_valid_body() {
        let (status, _) = send(r#"{"firstName":"Ada","password":"secret1"}"#).await;
        assert_eq!(status, StatusCode::OK);
    }
}
