use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "labels")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub label_type: String,
    pub template_version: i32,
    pub trial_identifier: String,
    pub sponsor_name: Option<String>,
    pub protocol_number: String,
    pub product_name: String,
    #[sea_orm(unique)]
    pub identifier_code: String,
    pub batch_number: String,
    pub expiry_date: DateTime<Utc>,
    pub kit_number: Option<String>,
    /// JSON object.
    pub custom_fields: Json,
    /// JSON array of language codes.
    pub languages: Json,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
