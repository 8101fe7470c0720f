//! SeaORM-backed repository implementation for the domain port.
//!
//! Generic over `C: ConnectionTrait`, so it can be built with a
//! `DatabaseConnection` or a transaction.

use anyhow::Context;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::contract::model::{Label, LabelFilter, LabelLookup, LabelTemplate};
use crate::domain::repo::LabelsRepository;
use crate::infra::storage::label_entity::{Column as LabelCol, Entity as LabelEntity};
use crate::infra::storage::mapper::{label_to_active, template_to_active};
use crate::infra::storage::template_entity::{Column as TemplateCol, Entity as TemplateEntity};

pub struct SeaOrmLabelsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmLabelsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

fn lookup_condition(lookup: &LabelLookup) -> Condition {
    match lookup {
        LabelLookup::Batch { batch_number } => {
            Condition::all().add(LabelCol::BatchNumber.eq(batch_number.as_str()))
        }
        LabelLookup::ProtocolKit {
            protocol_number,
            kit_number,
        } => Condition::all()
            .add(LabelCol::ProtocolNumber.eq(protocol_number.as_str()))
            .add(LabelCol::KitNumber.eq(kit_number.as_str())),
        LabelLookup::Identifier { identifier_code } => {
            Condition::all().add(LabelCol::IdentifierCode.eq(identifier_code.as_str()))
        }
        LabelLookup::SponsorTrialBatch {
            sponsor_name,
            trial_identifier,
            batch_number,
        } => Condition::all()
            .add(LabelCol::SponsorName.eq(sponsor_name.as_str()))
            .add(LabelCol::TrialIdentifier.eq(trial_identifier.as_str()))
            .add(LabelCol::BatchNumber.eq(batch_number.as_str())),
        LabelLookup::SponsorTrialKit {
            sponsor_name,
            trial_identifier,
            kit_number,
        } => Condition::all()
            .add(LabelCol::SponsorName.eq(sponsor_name.as_str()))
            .add(LabelCol::TrialIdentifier.eq(trial_identifier.as_str()))
            .add(LabelCol::KitNumber.eq(kit_number.as_str())),
    }
}

#[async_trait::async_trait]
impl<C> LabelsRepository for SeaOrmLabelsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn insert_label(&self, label: Label) -> anyhow::Result<()> {
        let _ = label_to_active(label)
            .insert(&self.conn)
            .await
            .context("insert_label failed")?;
        Ok(())
    }

    async fn find_label_by_id(&self, id: Uuid) -> anyhow::Result<Option<Label>> {
        let found = LabelEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_label_by_id failed")?;
        found.map(Label::try_from).transpose()
    }

    async fn find_first_label(&self, lookup: &LabelLookup) -> anyhow::Result<Option<Label>> {
        let found = LabelEntity::find()
            .filter(lookup_condition(lookup))
            .order_by_asc(LabelCol::CreatedAt)
            .one(&self.conn)
            .await
            .context("find_first_label failed")?;
        found.map(Label::try_from).transpose()
    }

    async fn identifier_code_exists(&self, code: &str) -> anyhow::Result<bool> {
        let count = LabelEntity::find()
            .filter(LabelCol::IdentifierCode.eq(code))
            .count(&self.conn)
            .await
            .context("identifier_code_exists failed")?;
        Ok(count > 0)
    }

    async fn list_labels(&self, filter: &LabelFilter) -> anyhow::Result<Vec<Label>> {
        let mut query = LabelEntity::find();
        if let Some(label_type) = &filter.label_type {
            query = query.filter(LabelCol::LabelType.eq(label_type.as_str()));
        }
        if let Some(version) = filter.template_version {
            query = query.filter(LabelCol::TemplateVersion.eq(version));
        }
        let rows = query
            .order_by_asc(LabelCol::CreatedAt)
            .all(&self.conn)
            .await
            .context("list_labels failed")?;
        rows.into_iter().map(Label::try_from).collect()
    }

    async fn insert_template(&self, template: LabelTemplate) -> anyhow::Result<()> {
        let _ = template_to_active(template)?
            .insert(&self.conn)
            .await
            .context("insert_template failed")?;
        Ok(())
    }

    async fn find_template_by_id(&self, id: Uuid) -> anyhow::Result<Option<LabelTemplate>> {
        let found = TemplateEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_template_by_id failed")?;
        found.map(LabelTemplate::try_from).transpose()
    }

    async fn template_exists(&self, name: &str, version: i32) -> anyhow::Result<bool> {
        let count = TemplateEntity::find()
            .filter(TemplateCol::TemplateName.eq(name))
            .filter(TemplateCol::Version.eq(version))
            .count(&self.conn)
            .await
            .context("template_exists failed")?;
        Ok(count > 0)
    }

    async fn list_templates(&self) -> anyhow::Result<Vec<LabelTemplate>> {
        let rows = TemplateEntity::find()
            .order_by_asc(TemplateCol::CreatedAt)
            .all(&self.conn)
            .await
            .context("list_templates failed")?;
        rows.into_iter().map(LabelTemplate::try_from).collect()
    }
}
