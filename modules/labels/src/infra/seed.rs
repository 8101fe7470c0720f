//! Label template seed files.
//!
//! ```yaml
//! templates:
//!   - templateName: Kit Label
//!     version: 1
//!     requiredFields:
//!       - { name: protocolNumber, type: String, label: Protocol }
//!     customFields:
//!       - { name: dosage, type: Text, label: Dosage, translatable: true }
//! ```

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::contract::model::{FieldDefinition, NewLabelTemplate};
use crate::infra::storage::mapper::FieldDefinitionRecord;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedFile {
    templates: Vec<TemplateSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct TemplateSeed {
    template_name: String,
    #[serde(default)]
    description: Option<String>,
    version: i32,
    #[serde(default)]
    required_fields: Vec<FieldDefinitionRecord>,
    #[serde(default)]
    custom_fields: Vec<FieldDefinitionRecord>,
}

impl TryFrom<TemplateSeed> for NewLabelTemplate {
    type Error = anyhow::Error;

    fn try_from(t: TemplateSeed) -> Result<Self, Self::Error> {
        let convert = |fields: Vec<FieldDefinitionRecord>| -> anyhow::Result<Vec<FieldDefinition>> {
            fields.into_iter().map(FieldDefinition::try_from).collect()
        };
        Ok(Self {
            required_fields: convert(t.required_fields)
                .with_context(|| format!("template '{}': requiredFields", t.template_name))?,
            custom_fields: convert(t.custom_fields)
                .with_context(|| format!("template '{}': customFields", t.template_name))?,
            template_name: t.template_name,
            description: t.description,
            version: t.version,
        })
    }
}

pub fn parse_templates(yaml: &str) -> anyhow::Result<Vec<NewLabelTemplate>> {
    let file: SeedFile = serde_yaml::from_str(yaml).context("invalid template seed file")?;
    file.templates
        .into_iter()
        .map(NewLabelTemplate::try_from)
        .collect()
}

pub fn load_templates(path: &Path) -> anyhow::Result<Vec<NewLabelTemplate>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_templates(&raw).with_context(|| format!("failed to load {}", path.display()))
}
