use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::{Label, LabelFilter, LabelLookup, LabelTemplate};

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait LabelsRepository: Send + Sync {
    /// Insert a fully-formed label; service assigns id and timestamps.
    async fn insert_label(&self, label: Label) -> anyhow::Result<()>;
    async fn find_label_by_id(&self, id: Uuid) -> anyhow::Result<Option<Label>>;
    /// Oldest label matching the lookup key.
    async fn find_first_label(&self, lookup: &LabelLookup) -> anyhow::Result<Option<Label>>;
    async fn identifier_code_exists(&self, code: &str) -> anyhow::Result<bool>;
    /// Labels matching the filter, oldest first.
    async fn list_labels(&self, filter: &LabelFilter) -> anyhow::Result<Vec<Label>>;

    async fn insert_template(&self, template: LabelTemplate) -> anyhow::Result<()>;
    async fn find_template_by_id(&self, id: Uuid) -> anyhow::Result<Option<LabelTemplate>>;
    /// Check whether a template with this name and version is already stored.
    async fn template_exists(&self, name: &str, version: i32) -> anyhow::Result<bool>;
    async fn list_templates(&self) -> anyhow::Result<Vec<LabelTemplate>>;
}
