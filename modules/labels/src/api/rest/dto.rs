use std::borrow::Cow;

use api_ingress::validation::invalid;
use api_ingress::ApiError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::api::rest::rules::{
    parse_expiry_date, validate_expiry_date, validate_languages, BATCH_RE, IDENTIFIER_RE, KIT_RE,
    NON_BLANK_RE, SPONSOR_RE, TRIAL_RE,
};
use crate::contract::model::{FieldDefinition, Label, LabelFilter, LabelTemplate, NewLabel};

/// REST DTO for label representation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDto {
    pub id: Uuid,
    pub label_type: String,
    pub template_version: i32,
    pub trial_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sponsor_name: Option<String>,
    pub protocol_number: String,
    pub product_name: String,
    pub identifier_code: String,
    pub batch_number: String,
    pub expiry_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kit_number: Option<String>,
    pub custom_fields: Map<String, Value>,
    pub languages: Vec<String>,
    pub metadata: LabelMetadataDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelMetadataDto {
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// REST DTO for creating a label. Required fields are `Option` so a missing
/// field is reported as a field error rather than a parse failure.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLabelReq {
    #[validate(
        required(message = "Label type is required"),
        regex(path = *NON_BLANK_RE, message = "Label type is required"),
        length(min = 1, max = 50, message = "Label type must be between 1-50 characters")
    )]
    pub label_type: Option<String>,

    #[validate(
        required(message = "Template version is required"),
        range(min = 1, message = "Template version must be a positive integer")
    )]
    pub template_version: Option<i32>,

    #[validate(
        required(message = "Trial identifier is required"),
        regex(path = *TRIAL_RE, message = "Invalid trial identifier format"),
        length(max = 50, message = "Trial identifier too long")
    )]
    pub trial_identifier: Option<String>,

    #[validate(
        regex(path = *SPONSOR_RE, message = "Invalid sponsor name format"),
        length(max = 100, message = "Sponsor name too long")
    )]
    pub sponsor_name: Option<String>,

    #[validate(
        required(message = "Protocol number is required"),
        regex(path = *TRIAL_RE, message = "Invalid protocol number format"),
        length(max = 50, message = "Protocol number too long")
    )]
    pub protocol_number: Option<String>,

    #[validate(
        required(message = "Product name is required"),
        regex(path = *NON_BLANK_RE, message = "Product name is required"),
        length(min = 1, max = 200, message = "Product name must be between 1-200 characters")
    )]
    pub product_name: Option<String>,

    #[validate(
        required(message = "Identifier code is required"),
        regex(path = *IDENTIFIER_RE, message = "Invalid identifier code format"),
        length(max = 64, message = "Identifier code too long")
    )]
    pub identifier_code: Option<String>,

    #[validate(
        required(message = "Batch number is required"),
        regex(path = *BATCH_RE, message = "Invalid batch number format"),
        length(min = 3, max = 20, message = "Batch number must be between 3-20 characters")
    )]
    pub batch_number: Option<String>,

    #[validate(
        required(message = "Expiry date is required"),
        custom(function = validate_expiry_date)
    )]
    pub expiry_date: Option<String>,

    #[validate(regex(path = *KIT_RE, message = "Kit number must be exactly 6 digits"))]
    pub kit_number: Option<String>,

    pub custom_fields: Option<Map<String, Value>>,

    #[validate(custom(function = validate_languages))]
    pub languages: Option<Vec<String>>,

    #[validate(
        required(message = "metadata.createdBy is required"),
        custom(function = validate_metadata)
    )]
    pub metadata: Option<LabelMetadataReq>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelMetadataReq {
    pub created_by: Option<String>,
}

fn validate_metadata(metadata: &LabelMetadataReq) -> Result<(), ValidationError> {
    match metadata.created_by.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(ValidationError::new("required")
            .with_message(Cow::Borrowed("metadata.createdBy is required"))),
    }
}

fn present<T>(value: Option<T>, field: &str, message: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| invalid(field, message))
}

impl CreateLabelReq {
    /// Convert an already validated request into the contract model.
    pub fn into_new_label(self) -> Result<NewLabel, ApiError> {
        let expiry_raw = present(self.expiry_date, "expiryDate", "Expiry date is required")?;
        let expiry_date = parse_expiry_date(&expiry_raw)
            .ok_or_else(|| invalid("expiryDate", "Invalid date format - use YYYY-MM-DD"))?;
        let created_by = self
            .metadata
            .and_then(|m| m.created_by)
            .ok_or_else(|| invalid("metadata", "metadata.createdBy is required"))?;

        Ok(NewLabel {
            label_type: present(self.label_type, "labelType", "Label type is required")?,
            template_version: present(
                self.template_version,
                "templateVersion",
                "Template version is required",
            )?,
            trial_identifier: present(
                self.trial_identifier,
                "trialIdentifier",
                "Trial identifier is required",
            )?,
            sponsor_name: self.sponsor_name,
            protocol_number: present(
                self.protocol_number,
                "protocolNumber",
                "Protocol number is required",
            )?,
            product_name: present(self.product_name, "productName", "Product name is required")?,
            identifier_code: present(
                self.identifier_code,
                "identifierCode",
                "Identifier code is required",
            )?,
            batch_number: present(self.batch_number, "batchNumber", "Batch number is required")?,
            expiry_date,
            kit_number: self.kit_number,
            custom_fields: self.custom_fields.unwrap_or_default(),
            languages: self.languages,
            created_by,
        })
    }
}

/// Query string for `GET /api/labels`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLabelsQuery {
    pub label_type: Option<String>,
    /// Kept as text so a non-numeric value becomes a field error.
    pub template_version: Option<String>,
}

impl ListLabelsQuery {
    pub fn into_filter(self) -> Result<LabelFilter, ApiError> {
        let template_version = match self.template_version.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(v) => Some(v.parse::<i32>().map_err(|_| {
                invalid("templateVersion", "Template version must be an integer")
            })?),
        };
        Ok(LabelFilter {
            label_type: self.label_type.filter(|t| !t.is_empty()),
            template_version,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinitionDto {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    pub translatable: bool,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDto {
    pub id: Uuid,
    pub template_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: i32,
    pub required_fields: Vec<FieldDefinitionDto>,
    pub custom_fields: Vec<FieldDefinitionDto>,
    pub created_at: DateTime<Utc>,
}

// Conversion implementations between REST DTOs and contract models

impl From<Label> for LabelDto {
    fn from(l: Label) -> Self {
        Self {
            id: l.id,
            label_type: l.label_type,
            template_version: l.template_version,
            trial_identifier: l.trial_identifier,
            sponsor_name: l.sponsor_name,
            protocol_number: l.protocol_number,
            product_name: l.product_name,
            identifier_code: l.identifier_code,
            batch_number: l.batch_number,
            expiry_date: l.expiry_date,
            kit_number: l.kit_number,
            custom_fields: l.custom_fields,
            languages: l.languages,
            metadata: LabelMetadataDto {
                created_by: l.created_by,
                created_at: l.created_at,
            },
        }
    }
}

impl From<FieldDefinition> for FieldDefinitionDto {
    fn from(f: FieldDefinition) -> Self {
        Self {
            name: f.name,
            field_type: f.field_type.as_str().to_string(),
            label: f.label,
            translatable: f.translatable,
            required: f.required,
        }
    }
}

impl From<LabelTemplate> for TemplateDto {
    fn from(t: LabelTemplate) -> Self {
        Self {
            id: t.id,
            template_name: t.template_name,
            description: t.description,
            version: t.version,
            required_fields: t.required_fields.into_iter().map(Into::into).collect(),
            custom_fields: t.custom_fields.into_iter().map(Into::into).collect(),
            created_at: t.created_at,
        }
    }
}
