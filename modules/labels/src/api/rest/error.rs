use api_ingress::{ApiError, FieldError};

use crate::domain::error::DomainError;

/// Map domain errors onto the shared HTTP error shapes.
impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::LabelNotFound { .. } | DomainError::TemplateNotFound { .. } => {
                ApiError::NotFound(e.to_string())
            }
            DomainError::NoMatchingLabel { lookup } => ApiError::NotFound(lookup.to_string()),
            DomainError::IdentifierCodeExists { .. } => ApiError::Conflict(e.to_string()),
            DomainError::Validation { field, message } => {
                ApiError::Validation(vec![FieldError::new(field, message)])
            }
            DomainError::Database { message } => {
                ApiError::internal(anyhow::anyhow!("labels store: {message}"))
            }
        }
    }
}
