use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Labels::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Labels::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Labels::LabelType).string().not_null())
                    .col(ColumnDef::new(Labels::TemplateVersion).integer().not_null())
                    .col(ColumnDef::new(Labels::TrialIdentifier).string().not_null())
                    .col(ColumnDef::new(Labels::SponsorName).string())
                    .col(ColumnDef::new(Labels::ProtocolNumber).string().not_null())
                    .col(ColumnDef::new(Labels::ProductName).string().not_null())
                    .col(ColumnDef::new(Labels::IdentifierCode).string().not_null())
                    .col(ColumnDef::new(Labels::BatchNumber).string().not_null())
                    .col(
                        ColumnDef::new(Labels::ExpiryDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Labels::KitNumber).string())
                    .col(ColumnDef::new(Labels::CustomFields).json().not_null())
                    .col(ColumnDef::new(Labels::Languages).json().not_null())
                    .col(ColumnDef::new(Labels::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(Labels::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_labels_identifier_code")
                    .table(Labels::Table)
                    .col(Labels::IdentifierCode)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_labels_sponsor_trial_batch")
                    .table(Labels::Table)
                    .col(Labels::SponsorName)
                    .col(Labels::TrialIdentifier)
                    .col(Labels::BatchNumber)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_labels_sponsor_trial_kit")
                    .table(Labels::Table)
                    .col(Labels::SponsorName)
                    .col(Labels::TrialIdentifier)
                    .col(Labels::KitNumber)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LabelTemplates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LabelTemplates::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LabelTemplates::TemplateName).string().not_null())
                    .col(ColumnDef::new(LabelTemplates::Description).text())
                    .col(ColumnDef::new(LabelTemplates::Version).integer().not_null())
                    .col(ColumnDef::new(LabelTemplates::RequiredFields).json().not_null())
                    .col(ColumnDef::new(LabelTemplates::CustomFields).json().not_null())
                    .col(
                        ColumnDef::new(LabelTemplates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LabelTemplates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Labels::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Labels {
    Table,
    Id,
    LabelType,
    TemplateVersion,
    TrialIdentifier,
    SponsorName,
    ProtocolNumber,
    ProductName,
    IdentifierCode,
    BatchNumber,
    ExpiryDate,
    KitNumber,
    CustomFields,
    Languages,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum LabelTemplates {
    Table,
    Id,
    TemplateName,
    Description,
    Version,
    RequiredFields,
    CustomFields,
    CreatedAt,
}
