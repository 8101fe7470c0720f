use serde::{Deserialize, Serialize};

/// Configuration for the labels module (`modules.labels`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelsConfig {
    /// Languages assigned to a label created without a `languages` list.
    #[serde(default = "default_languages")]
    pub default_languages: Vec<String>,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            default_languages: default_languages(),
        }
    }
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}
