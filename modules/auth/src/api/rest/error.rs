use api_ingress::{ApiError, FieldError};

use crate::domain::error::DomainError;

/// Map domain errors onto the shared HTTP error shapes.
impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::UserAlreadyExists { .. } => ApiError::Conflict(e.to_string()),
            DomainError::InvalidCredentials | DomainError::InvalidToken { .. } => {
                ApiError::Unauthorized(e.to_string())
            }
            DomainError::UserNotFound { .. } => ApiError::NotFound(e.to_string()),
            DomainError::Validation { field, message } => {
                ApiError::Validation(vec![FieldError::new(field, message)])
            }
            DomainError::MissingEmail
            | DomainError::MissingCode
            | DomainError::InvalidState { .. }
            | DomainError::Provider(_) => ApiError::BadRequest(e.to_string()),
            DomainError::Database { message } => {
                ApiError::internal(anyhow::anyhow!("auth store: {message}"))
            }
            DomainError::Internal { message } => ApiError::internal(anyhow::anyhow!(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn status_mapping() {
        let cases = [
            (DomainError::user_already_exists("a@b.c"), StatusCode::CONFLICT),
            (DomainError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (DomainError::invalid_token("expired"), StatusCode::UNAUTHORIZED),
            (DomainError::user_not_found("x"), StatusCode::NOT_FOUND),
            (DomainError::validation("email", "bad"), StatusCode::BAD_REQUEST),
            (DomainError::database("down"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn messages_are_client_facing() {
        let api: ApiError = DomainError::invalid_token("signature mismatch").into();
        assert_eq!(api.to_string(), "Not authorized, token failed");
        let api: ApiError = DomainError::user_already_exists("a@b.c").into();
        assert_eq!(api.to_string(), "User already exists");
    }
}
