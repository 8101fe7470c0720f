use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{
    Label, LabelFilter, LabelLookup, LabelTemplate, NewLabel, NewLabelTemplate,
};
use crate::domain::error::DomainError;
use crate::domain::repo::LabelsRepository;

/// Domain service for labels and label templates.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn LabelsRepository>,
    config: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_languages: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_languages: vec!["en".to_string()],
        }
    }
}

impl Service {
    pub fn new(repo: Arc<dyn LabelsRepository>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    #[instrument(skip(self, new_label), fields(identifier_code = %new_label.identifier_code))]
    pub async fn create_label(&self, new_label: NewLabel) -> Result<Label, DomainError> {
        info!("Creating new label");

        self.validate_new_label(&new_label)?;

        if self
            .repo
            .identifier_code_exists(&new_label.identifier_code)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        {
            return Err(DomainError::identifier_code_exists(new_label.identifier_code));
        }

        let label = Label {
            id: Uuid::new_v4(),
            label_type: new_label.label_type,
            template_version: new_label.template_version,
            trial_identifier: new_label.trial_identifier,
            sponsor_name: new_label.sponsor_name,
            protocol_number: new_label.protocol_number,
            product_name: new_label.product_name,
            identifier_code: new_label.identifier_code,
            batch_number: new_label.batch_number,
            expiry_date: new_label.expiry_date,
            kit_number: new_label.kit_number,
            custom_fields: new_label.custom_fields,
            languages: new_label
                .languages
                .unwrap_or_else(|| self.config.default_languages.clone()),
            created_by: new_label.created_by,
            created_at: Utc::now(),
        };

        // A concurrent insert can still win the race past the pre-check.
        if let Err(e) = self.repo.insert_label(label.clone()).await {
            if db::errors::is_unique_violation(&e) {
                return Err(DomainError::identifier_code_exists(label.identifier_code));
            }
            return Err(DomainError::database(e.to_string()));
        }

        info!(label_id = %label.id, "Successfully created label");
        Ok(label)
    }

    #[instrument(skip(self))]
    pub async fn list_labels(&self, filter: LabelFilter) -> Result<Vec<Label>, DomainError> {
        let labels = self
            .repo
            .list_labels(&filter)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!("Listed {} labels", labels.len());
        Ok(labels)
    }

    /// Fetch by store id. Ids that are not UUIDs cannot name a label.
    #[instrument(skip(self))]
    pub async fn get_label(&self, id: &str) -> Result<Label, DomainError> {
        let Ok(uuid) = Uuid::parse_str(id) else {
            debug!("Label id is not a UUID");
            return Err(DomainError::label_not_found(id));
        };
        self.repo
            .find_label_by_id(uuid)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::label_not_found(id))
    }

    #[instrument(skip(self))]
    pub async fn find_label(&self, lookup: LabelLookup) -> Result<Label, DomainError> {
        self.repo
            .find_first_label(&lookup)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::no_matching_label(lookup))
    }

    #[instrument(skip(self))]
    pub async fn list_templates(&self) -> Result<Vec<LabelTemplate>, DomainError> {
        let templates = self
            .repo
            .list_templates()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!("Found {} templates", templates.len());
        Ok(templates)
    }

    #[instrument(skip(self))]
    pub async fn get_template(&self, id: &str) -> Result<LabelTemplate, DomainError> {
        let Ok(uuid) = Uuid::parse_str(id) else {
            return Err(DomainError::template_not_found(id));
        };
        self.repo
            .find_template_by_id(uuid)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::template_not_found(id))
    }

    /// Store templates that are not present yet (matched by name and version).
    /// Returns the templates that were inserted.
    #[instrument(skip(self, templates), fields(count = templates.len()))]
    pub async fn import_templates(
        &self,
        templates: Vec<NewLabelTemplate>,
    ) -> Result<Vec<LabelTemplate>, DomainError> {
        for t in &templates {
            validate_new_template(t)?;
        }

        let mut inserted = Vec::new();
        for t in templates {
            let exists = self
                .repo
                .template_exists(&t.template_name, t.version)
                .await
                .map_err(|e| DomainError::database(e.to_string()))?;
            if exists {
                info!(name = %t.template_name, version = t.version, "Template already present, skipping");
                continue;
            }

            let template = LabelTemplate {
                id: Uuid::new_v4(),
                template_name: t.template_name,
                description: t.description,
                version: t.version,
                required_fields: t.required_fields,
                custom_fields: t.custom_fields,
                created_at: Utc::now(),
            };
            self.repo
                .insert_template(template.clone())
                .await
                .map_err(|e| DomainError::database(e.to_string()))?;
            inserted.push(template);
        }

        info!("Imported {} templates", inserted.len());
        Ok(inserted)
    }

    fn validate_new_label(&self, l: &NewLabel) -> Result<(), DomainError> {
        if l.template_version < 1 {
            return Err(DomainError::validation(
                "templateVersion",
                "Template version must be a positive integer",
            ));
        }
        if l.identifier_code.trim().is_empty() {
            return Err(DomainError::validation(
                "identifierCode",
                "Identifier code is required",
            ));
        }
        if l.created_by.trim().is_empty() {
            return Err(DomainError::validation(
                "metadata",
                "metadata.createdBy is required",
            ));
        }
        Ok(())
    }
}

fn validate_new_template(t: &NewLabelTemplate) -> Result<(), DomainError> {
    if t.template_name.trim().is_empty() {
        return Err(DomainError::validation(
            "templateName",
            "Template name is required",
        ));
    }
    if t.version < 1 {
        return Err(DomainError::validation(
            "version",
            format!("Template '{}' must have a version of 1 or more", t.template_name),
        ));
    }
    Ok(())
}
