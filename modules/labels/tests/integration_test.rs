use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use db::{ConnectOpts, DbHandle, DbModule};
use serde_json::json;

use labels::contract::model::{
    FieldDefinition, FieldType, LabelFilter, LabelLookup, NewLabel, NewLabelTemplate,
};
use labels::domain::error::DomainError;
use labels::domain::repo::LabelsRepository;
use labels::domain::service::Service;
use labels::infra::storage::sea_orm_repo::SeaOrmLabelsRepository;
use labels::{LabelsConfig, LabelsModule};

/// Fresh in-memory database with the labels schema applied.
async fn setup_with(cfg: LabelsConfig) -> (DbHandle, Arc<Service>) {
    let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default())
        .await
        .expect("Failed to connect to test database");
    let module = LabelsModule::new(&db, cfg);
    module.migrate(&db).await.expect("Failed to run migrations");
    let svc = module.service();
    (db, svc)
}

async fn setup() -> (DbHandle, Arc<Service>) {
    setup_with(LabelsConfig::default()).await
}

fn new_label(code: &str) -> NewLabel {
    NewLabel {
        label_type: "kit".into(),
        template_version: 1,
        trial_identifier: "TRIAL-001".into(),
        sponsor_name: Some("Acme Pharma".into()),
        protocol_number: "PROT-77".into(),
        product_name: "Examplumab 10mg".into(),
        identifier_code: code.into(),
        batch_number: "B-2024-01".into(),
        expiry_date: Utc::now() + Duration::days(365),
        kit_number: Some("000123".into()),
        custom_fields: serde_json::Map::new(),
        languages: None,
        created_by: "qa@example.com".into(),
    }
}

fn field(name: &str, field_type: FieldType) -> FieldDefinition {
    FieldDefinition {
        name: name.into(),
        field_type,
        label: name.to_uppercase(),
        translatable: false,
        required: true,
    }
}

#[tokio::test]
async fn create_and_fetch_label() -> Result<()> {
    let (_db, svc) = setup().await;

    let mut input = new_label("LBL_0001");
    input.custom_fields = json!({ "dosage": { "en": "10mg", "fr": "10 mg" } })
        .as_object()
        .cloned()
        .unwrap();
    let created = svc.create_label(input).await?;
    assert_eq!(created.languages, vec!["en".to_string()]);

    let fetched = svc.get_label(&created.id.to_string()).await?;
    assert_eq!(fetched, created);
    assert_eq!(fetched.custom_fields["dosage"]["fr"], "10 mg");
    Ok(())
}

#[tokio::test]
async fn default_languages_come_from_config() -> Result<()> {
    let (_db, svc) = setup_with(LabelsConfig {
        default_languages: vec!["en".into(), "de".into()],
    })
    .await;

    let created = svc.create_label(new_label("LBL_LANG")).await?;
    assert_eq!(created.languages, vec!["en".to_string(), "de".to_string()]);

    let mut explicit = new_label("LBL_LANG_2");
    explicit.languages = Some(vec!["fr-CA".into()]);
    let created = svc.create_label(explicit).await?;
    assert_eq!(created.languages, vec!["fr-CA".to_string()]);
    Ok(())
}

#[tokio::test]
async fn duplicate_identifier_code_rejected() -> Result<()> {
    let (_db, svc) = setup().await;
    svc.create_label(new_label("LBL_DUP")).await?;

    let err = svc.create_label(new_label("LBL_DUP")).await.unwrap_err();
    assert!(matches!(err, DomainError::IdentifierCodeExists { .. }));
    Ok(())
}

#[tokio::test]
async fn unique_index_enforced_below_the_service() -> Result<()> {
    let (db, svc) = setup().await;
    let first = svc.create_label(new_label("LBL_RACE")).await?;

    let repo = SeaOrmLabelsRepository::new(db.sea());
    let mut clash = first.clone();
    clash.id = uuid::Uuid::new_v4();
    let err = repo.insert_label(clash).await.unwrap_err();
    assert!(db::errors::is_unique_violation(&err));
    Ok(())
}

#[tokio::test]
async fn non_uuid_id_is_not_found() {
    let (_db, svc) = setup().await;
    let err = svc.get_label("abc-123").await.unwrap_err();
    assert!(matches!(err, DomainError::LabelNotFound { .. }));
    assert_eq!(err.to_string(), "Label not found");
}

#[tokio::test]
async fn lookups_by_each_key() -> Result<()> {
    let (_db, svc) = setup().await;
    let created = svc.create_label(new_label("LBL_KEYS")).await?;

    let lookups = [
        LabelLookup::Batch {
            batch_number: "B-2024-01".into(),
        },
        LabelLookup::ProtocolKit {
            protocol_number: "PROT-77".into(),
            kit_number: "000123".into(),
        },
        LabelLookup::Identifier {
            identifier_code: "LBL_KEYS".into(),
        },
        LabelLookup::SponsorTrialBatch {
            sponsor_name: "Acme Pharma".into(),
            trial_identifier: "TRIAL-001".into(),
            batch_number: "B-2024-01".into(),
        },
        LabelLookup::SponsorTrialKit {
            sponsor_name: "Acme Pharma".into(),
            trial_identifier: "TRIAL-001".into(),
            kit_number: "000123".into(),
        },
    ];
    for lookup in lookups {
        assert_eq!(svc.find_label(lookup).await?.id, created.id);
    }

    let missing = LabelLookup::SponsorTrialKit {
        sponsor_name: "Acme Pharma".into(),
        trial_identifier: "TRIAL-001".into(),
        kit_number: "999999".into(),
    };
    let err = svc.find_label(missing).await.unwrap_err();
    assert_eq!(err.to_string(), "Label not found for that sponsor/trial/kit");
    Ok(())
}

#[tokio::test]
async fn lookup_returns_oldest_match() -> Result<()> {
    let (_db, svc) = setup().await;
    let first = svc.create_label(new_label("LBL_OLD")).await?;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    svc.create_label(new_label("LBL_NEW")).await?;

    let found = svc
        .find_label(LabelLookup::Batch {
            batch_number: "B-2024-01".into(),
        })
        .await?;
    assert_eq!(found.id, first.id);
    Ok(())
}

#[tokio::test]
async fn list_filters_by_type_and_version() -> Result<()> {
    let (_db, svc) = setup().await;
    svc.create_label(new_label("LBL_A")).await?;
    let mut carton = new_label("LBL_B");
    carton.label_type = "carton".into();
    carton.template_version = 2;
    svc.create_label(carton).await?;

    assert_eq!(svc.list_labels(LabelFilter::default()).await?.len(), 2);

    let kits = svc
        .list_labels(LabelFilter {
            label_type: Some("kit".into()),
            template_version: None,
        })
        .await?;
    assert_eq!(kits.len(), 1);
    assert_eq!(kits[0].identifier_code, "LBL_A");

    let v2 = svc
        .list_labels(LabelFilter {
            label_type: None,
            template_version: Some(2),
        })
        .await?;
    assert_eq!(v2.len(), 1);
    assert_eq!(v2[0].label_type, "carton");

    let none = svc
        .list_labels(LabelFilter {
            label_type: Some("kit".into()),
            template_version: Some(2),
        })
        .await?;
    assert!(none.is_empty());
    Ok(())
}

#[tokio::test]
async fn import_templates_skips_existing_versions() -> Result<()> {
    let (_db, svc) = setup().await;
    let template = NewLabelTemplate {
        template_name: "Kit Label".into(),
        description: Some("Standard".into()),
        version: 1,
        required_fields: vec![field("protocolNumber", FieldType::String)],
        custom_fields: vec![field("expiry", FieldType::Date)],
    };

    let inserted = svc.import_templates(vec![template.clone()]).await?;
    assert_eq!(inserted.len(), 1);

    let mut v2 = template.clone();
    v2.version = 2;
    let inserted_again = svc.import_templates(vec![template, v2]).await?;
    assert_eq!(inserted_again.len(), 1);
    assert_eq!(inserted_again[0].version, 2);

    let all = svc.list_templates().await?;
    assert_eq!(all.len(), 2);

    let fetched = svc.get_template(&all[0].id.to_string()).await?;
    assert_eq!(fetched.required_fields[0].field_type, FieldType::String);
    assert_eq!(fetched.custom_fields[0].name, "expiry");
    Ok(())
}

#[tokio::test]
async fn import_rejects_invalid_templates() {
    let (_db, svc) = setup().await;
    let bad = NewLabelTemplate {
        template_name: " ".into(),
        description: None,
        version: 1,
        required_fields: vec![],
        custom_fields: vec![],
    };
    let err = svc.import_templates(vec![bad]).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
    assert!(svc.list_templates().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_template_is_not_found() {
    let (_db, svc) = setup().await;
    let err = svc
        .get_template(&uuid::Uuid::new_v4().to_string())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Template not found");
}
