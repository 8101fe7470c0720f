//! Conversions between stored rows and contract models. JSON columns are
//! decoded here so a corrupt row surfaces as a repository error.

use anyhow::Context;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::contract::model::{FieldDefinition, Label, LabelTemplate};
use crate::infra::storage::{label_entity, template_entity};

/// Stored shape of a template field definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinitionRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    #[serde(default)]
    pub translatable: bool,
    #[serde(default)]
    pub required: bool,
}

impl From<&FieldDefinition> for FieldDefinitionRecord {
    fn from(f: &FieldDefinition) -> Self {
        Self {
            name: f.name.clone(),
            field_type: f.field_type.as_str().to_string(),
            label: f.label.clone(),
            translatable: f.translatable,
            required: f.required,
        }
    }
}

impl TryFrom<FieldDefinitionRecord> for FieldDefinition {
    type Error = anyhow::Error;

    fn try_from(r: FieldDefinitionRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            field_type: r.field_type.parse().map_err(anyhow::Error::msg)?,
            name: r.name,
            label: r.label,
            translatable: r.translatable,
            required: r.required,
        })
    }
}

pub fn label_to_active(l: Label) -> label_entity::ActiveModel {
    label_entity::ActiveModel {
        id: Set(l.id),
        label_type: Set(l.label_type),
        template_version: Set(l.template_version),
        trial_identifier: Set(l.trial_identifier),
        sponsor_name: Set(l.sponsor_name),
        protocol_number: Set(l.protocol_number),
        product_name: Set(l.product_name),
        identifier_code: Set(l.identifier_code),
        batch_number: Set(l.batch_number),
        expiry_date: Set(l.expiry_date),
        kit_number: Set(l.kit_number),
        custom_fields: Set(serde_json::Value::Object(l.custom_fields)),
        languages: Set(serde_json::Value::from(l.languages)),
        created_by: Set(l.created_by),
        created_at: Set(l.created_at),
    }
}

impl TryFrom<label_entity::Model> for Label {
    type Error = anyhow::Error;

    fn try_from(m: label_entity::Model) -> Result<Self, Self::Error> {
        let custom_fields = match m.custom_fields {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            other => anyhow::bail!("label {}: customFields is not an object: {other}", m.id),
        };
        let languages: Vec<String> = serde_json::from_value(m.languages)
            .with_context(|| format!("label {}: languages is not a string list", m.id))?;
        Ok(Self {
            id: m.id,
            label_type: m.label_type,
            template_version: m.template_version,
            trial_identifier: m.trial_identifier,
            sponsor_name: m.sponsor_name,
            protocol_number: m.protocol_number,
            product_name: m.product_name,
            identifier_code: m.identifier_code,
            batch_number: m.batch_number,
            expiry_date: m.expiry_date,
            kit_number: m.kit_number,
            custom_fields,
            languages,
            created_by: m.created_by,
            created_at: m.created_at,
        })
    }
}

fn fields_to_json(fields: &[FieldDefinition]) -> anyhow::Result<serde_json::Value> {
    let records: Vec<FieldDefinitionRecord> = fields.iter().map(Into::into).collect();
    serde_json::to_value(records).context("encode field definitions")
}

fn fields_from_json(value: serde_json::Value) -> anyhow::Result<Vec<FieldDefinition>> {
    let records: Vec<FieldDefinitionRecord> =
        serde_json::from_value(value).context("decode field definitions")?;
    records.into_iter().map(FieldDefinition::try_from).collect()
}

pub fn template_to_active(t: LabelTemplate) -> anyhow::Result<template_entity::ActiveModel> {
    Ok(template_entity::ActiveModel {
        id: Set(t.id),
        template_name: Set(t.template_name),
        description: Set(t.description),
        version: Set(t.version),
        required_fields: Set(fields_to_json(&t.required_fields)?),
        custom_fields: Set(fields_to_json(&t.custom_fields)?),
        created_at: Set(t.created_at),
    })
}

impl TryFrom<template_entity::Model> for LabelTemplate {
    type Error = anyhow::Error;

    fn try_from(m: template_entity::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            required_fields: fields_from_json(m.required_fields)
                .with_context(|| format!("template {}: requiredFields", m.id))?,
            custom_fields: fields_from_json(m.custom_fields)
                .with_context(|| format!("template {}: customFields", m.id))?,
            id: m.id,
            template_name: m.template_name,
            description: m.description,
            version: m.version,
            created_at: m.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::FieldType;

    #[test]
    fn field_record_uses_type_key() {
        let def = FieldDefinition {
            name: "dosage".into(),
            field_type: FieldType::Text,
            label: "Dosage".into(),
            translatable: true,
            required: false,
        };
        let json = fields_to_json(std::slice::from_ref(&def)).unwrap();
        assert_eq!(json[0]["type"], "Text");
        assert_eq!(fields_from_json(json).unwrap(), vec![def]);
    }

    #[test]
    fn unknown_field_type_is_an_error() {
        let json = serde_json::json!([{ "name": "x", "type": "Blob", "label": "X" }]);
        assert!(fields_from_json(json).is_err());
    }
}
