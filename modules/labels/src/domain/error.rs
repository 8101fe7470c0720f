use thiserror::Error;

use crate::contract::model::LabelLookup;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Label not found")]
    LabelNotFound { id: String },

    #[error("{lookup}")]
    NoMatchingLabel { lookup: LabelLookup },

    #[error("Template not found")]
    TemplateNotFound { id: String },

    #[error("Label with identifierCode '{code}' already exists")]
    IdentifierCodeExists { code: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn label_not_found(id: impl Into<String>) -> Self {
        Self::LabelNotFound { id: id.into() }
    }

    pub fn no_matching_label(lookup: LabelLookup) -> Self {
        Self::NoMatchingLabel { lookup }
    }

    pub fn template_not_found(id: impl Into<String>) -> Self {
        Self::TemplateNotFound { id: id.into() }
    }

    pub fn identifier_code_exists(code: impl Into<String>) -> Self {
        Self::IdentifierCodeExists { code: code.into() }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
