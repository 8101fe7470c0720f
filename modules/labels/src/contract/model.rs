use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A printed clinical-trial label (no serde; REST DTOs own the wire shape).
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub id: Uuid,
    pub label_type: String,
    pub template_version: i32,
    pub trial_identifier: String,
    pub sponsor_name: Option<String>,
    pub protocol_number: String,
    pub product_name: String,
    pub identifier_code: String,
    pub batch_number: String,
    pub expiry_date: DateTime<Utc>,
    pub kit_number: Option<String>,
    pub custom_fields: Map<String, Value>,
    pub languages: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Data for creating a label. `languages: None` takes the configured default.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLabel {
    pub label_type: String,
    pub template_version: i32,
    pub trial_identifier: String,
    pub sponsor_name: Option<String>,
    pub protocol_number: String,
    pub product_name: String,
    pub identifier_code: String,
    pub batch_number: String,
    pub expiry_date: DateTime<Utc>,
    pub kit_number: Option<String>,
    pub custom_fields: Map<String, Value>,
    pub languages: Option<Vec<String>>,
    pub created_by: String,
}

/// Optional equality filters for listing labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelFilter {
    pub label_type: Option<String>,
    pub template_version: Option<i32>,
}

/// The business keys a single label can be fetched by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelLookup {
    Batch {
        batch_number: String,
    },
    ProtocolKit {
        protocol_number: String,
        kit_number: String,
    },
    Identifier {
        identifier_code: String,
    },
    SponsorTrialBatch {
        sponsor_name: String,
        trial_identifier: String,
        batch_number: String,
    },
    SponsorTrialKit {
        sponsor_name: String,
        trial_identifier: String,
        kit_number: String,
    },
}

/// Renders the not-found message for the lookup.
impl fmt::Display for LabelLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelLookup::Batch { batch_number } => {
                write!(f, "Label not found for batchNumber {batch_number}")
            }
            LabelLookup::ProtocolKit {
                protocol_number,
                kit_number,
            } => write!(
                f,
                "Label not found for protocol {protocol_number} and kit {kit_number}"
            ),
            LabelLookup::Identifier { .. } => {
                f.write_str("Label not found for that identifierCode")
            }
            LabelLookup::SponsorTrialBatch { .. } => {
                f.write_str("Label not found for that sponsor/trial/batch")
            }
            LabelLookup::SponsorTrialKit { .. } => {
                f.write_str("Label not found for that sponsor/trial/kit")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Text,
    List,
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "String",
            FieldType::Text => "Text",
            FieldType::List => "List",
            FieldType::Date => "Date",
        }
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "String" => Ok(FieldType::String),
            "Text" => Ok(FieldType::Text),
            "List" => Ok(FieldType::List),
            "Date" => Ok(FieldType::Date),
            other => Err(format!(
                "unknown field type '{other}' (expected String, Text, List or Date)"
            )),
        }
    }
}

/// One field slot of a label template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub label: String,
    pub translatable: bool,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTemplate {
    pub id: Uuid,
    pub template_name: String,
    pub description: Option<String>,
    pub version: i32,
    pub required_fields: Vec<FieldDefinition>,
    pub custom_fields: Vec<FieldDefinition>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLabelTemplate {
    pub template_name: String,
    pub description: Option<String>,
    pub version: i32,
    pub required_fields: Vec<FieldDefinition>,
    pub custom_fields: Vec<FieldDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_messages_name_the_key() {
        let batch = LabelLookup::Batch {
            batch_number: "B-001".into(),
        };
        assert_eq!(batch.to_string(), "Label not found for batchNumber B-001");

        let kit = LabelLookup::ProtocolKit {
            protocol_number: "PROT-1".into(),
            kit_number: "123456".into(),
        };
        assert_eq!(
            kit.to_string(),
            "Label not found for protocol PROT-1 and kit 123456"
        );

        let stk = LabelLookup::SponsorTrialKit {
            sponsor_name: "Acme".into(),
            trial_identifier: "T1".into(),
            kit_number: "000001".into(),
        };
        assert_eq!(stk.to_string(), "Label not found for that sponsor/trial/kit");
    }

    #[test]
    fn field_type_parses_known_names_only() {
        assert_eq!("List".parse::<FieldType>(), Ok(FieldType::List));
        assert_eq!(FieldType::Date.as_str(), "Date");
        assert!("list".parse::<FieldType>().is_err());
    }
}
