mod common;

use common::*;
use record_audit::domain::collection::{CollectionDefinition, FieldKind};
use record_audit::domain::config::AuditConfig;
use record_audit::domain::error::AuditError;
use record_audit::domain::event::{EventType, HookPoint, fields};
use record_audit::domain::id::{Identifier, MAX_IDENTIFIER_LEN};
use record_audit::domain::record::Record;
use record_audit::domain::store::RecordStore;
use record_audit::infra::memory::MemoryStore;
use record_audit::services::bootstrap::setup;
use record_audit::services::provisioner::{
    ADMIN_ONLY_RULE, ProvisionResult, audit_collection_definition, ensure_audit_collection,
    import_collections_from_file, index_name,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

fn temp_schema(contents: &str) -> PathBuf {
    let file = format!("record_audit_schema_{}.json", uuid::Uuid::now_v7());
    let path = std::env::temp_dir().join(file);
    std::fs::write(&path, contents).unwrap();
    path
}

// ── audit collection schema ────────────────────────────────────────────────

#[test]
fn definition_has_fields_rules_and_indexes() {
    let def = audit_collection_definition("audit_logs");

    let event_type = def.field(fields::EVENT_TYPE).unwrap();
    assert_eq!(event_type.kind, FieldKind::Select);
    assert!(event_type.required);
    assert_eq!(event_type.values.len(), EventType::ALL.len());

    for name in [fields::COLLECTION_NAME, fields::RECORD_ID] {
        let f = def.field(name).unwrap();
        assert_eq!(f.kind, FieldKind::Text);
        assert!(f.required, "{name} should be required");
    }
    for name in [
        fields::USER_ID,
        fields::AUTH_METHOD,
        fields::REQUEST_METHOD,
        fields::REQUEST_IP,
        fields::REQUEST_URL,
        fields::BEFORE_CHANGES,
        fields::AFTER_CHANGES,
    ] {
        assert!(!def.field(name).unwrap().required, "{name} should be optional");
    }
    assert_eq!(def.field(fields::TIMESTAMP).unwrap().kind, FieldKind::Date);
    assert_eq!(def.field(fields::CREATED).unwrap().kind, FieldKind::Autodate);
    assert!(def.field(fields::UPDATED).unwrap().on_update);

    let rules = &def.rules;
    for rule in [
        &rules.list_rule,
        &rules.view_rule,
        &rules.create_rule,
        &rules.update_rule,
        &rules.delete_rule,
    ] {
        assert_eq!(rule.as_deref(), Some(ADMIN_ONLY_RULE));
    }

    let indexed: Vec<&str> = def.indexes.iter().map(|i| i.columns[0].as_str()).collect();
    assert_eq!(
        indexed,
        [
            fields::COLLECTION_NAME,
            fields::RECORD_ID,
            fields::TIMESTAMP,
            fields::USER_ID,
            fields::EVENT_TYPE
        ]
    );
    assert!(def.indexes.iter().all(|i| !i.unique));
    assert_eq!(def.indexes[0].name, "idx_audit_logs_collection_name");
}

#[test]
fn long_collection_names_get_bounded_unique_index_names() {
    let short = index_name("audit_logs", fields::RECORD_ID);
    assert_eq!(short, "idx_audit_logs_record_id");

    for len in [44, 50, 63] {
        let name = format!("a{}", "x".repeat(len - 1));
        let def = audit_collection_definition(&name);

        let names: HashSet<&str> = def.indexes.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names.len(), def.indexes.len(), "index names collide for {len}");
        for index in &def.indexes {
            assert!(index.name.len() <= MAX_IDENTIFIER_LEN, "{} too long", index.name);
            assert!(index.name.ends_with(&index.columns[0]));
            assert!(Identifier::new(index.name.as_str()).is_ok());
        }
    }

    let a = index_name(&format!("{}a", "x".repeat(59)), fields::USER_ID);
    let b = index_name(&format!("{}b", "x".repeat(59)), fields::USER_ID);
    assert_ne!(a, b);
    assert_eq!(a, index_name(&format!("{}a", "x".repeat(59)), fields::USER_ID));
}

#[tokio::test]
async fn audit_rows_outside_vocabulary_are_rejected() {
    let store = Arc::new(MemoryStore::new());
    ensure_audit_collection(&*store, AUDIT).await.unwrap();

    let row = Record::new(AUDIT, "a1")
        .with_field(fields::EVENT_TYPE, "rename")
        .with_field(fields::COLLECTION_NAME, "widgets")
        .with_field(fields::RECORD_ID, "w1")
        .with_field(fields::TIMESTAMP, "2025-01-01T00:00:00Z");

    assert!(matches!(store.save(&row).await, Err(AuditError::Validation(_))));
}

// ── idempotence ────────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_twice_creates_once() {
    let store = Arc::new(MemoryStore::new());

    let first = ensure_audit_collection(&*store, AUDIT).await.unwrap();
    let second = ensure_audit_collection(&*store, AUDIT).await.unwrap();

    assert_eq!(first, ProvisionResult::Created);
    assert_eq!(second, ProvisionResult::AlreadyExists);
    assert_eq!(store.collection_names().await, vec![AUDIT.to_string()]);
}

#[tokio::test]
async fn existing_collection_is_not_modified() {
    let store = Arc::new(MemoryStore::new());
    store
        .create_collection(&CollectionDefinition::new(AUDIT))
        .await
        .unwrap();

    let result = ensure_audit_collection(&*store, AUDIT).await.unwrap();

    assert_eq!(result, ProvisionResult::AlreadyExists);
    let existing = store.find_collection_by_name(AUDIT).await.unwrap().unwrap();
    assert!(existing.definition.fields.is_empty());
}

#[tokio::test]
async fn creation_failure_surfaces_as_schema_error() {
    let store = Arc::new(MemoryStore::new());
    store.fail_writes_to(AUDIT).await;

    let result = ensure_audit_collection(&*store, AUDIT).await;
    assert!(matches!(result, Err(AuditError::Schema(_))));
}

// ── schema import ──────────────────────────────────────────────────────────

#[tokio::test]
async fn import_creates_missing_collections_and_audit_collection() {
    let store = Arc::new(MemoryStore::new());
    store
        .create_collection(&CollectionDefinition::new("users"))
        .await
        .unwrap();
    let path = temp_schema(
        r#"[
            {"name": "users", "fields": [{"name": "email", "type": "text", "required": true}]},
            {"name": "posts", "fields": [
                {"name": "title", "type": "text", "required": true},
                {"name": "status", "type": "select", "values": ["draft", "live"]},
                {"name": "created", "type": "autodate", "onCreate": true}
            ]}
        ]"#,
    );

    let created = import_collections_from_file(&*store, &path, AUDIT).await.unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(created, vec!["posts".to_string(), AUDIT.to_string()]);
    let users = store.find_collection_by_name("users").await.unwrap().unwrap();
    assert!(users.definition.fields.is_empty(), "existing collection untouched");
    let posts = store.find_collection_by_name("posts").await.unwrap().unwrap();
    assert_eq!(posts.definition.field("status").unwrap().values, ["draft", "live"]);
}

#[tokio::test]
async fn import_of_unreadable_file_is_schema_error() {
    let store = Arc::new(MemoryStore::new());
    let missing = std::env::temp_dir().join("record_audit_no_such_schema.json");

    let result = import_collections_from_file(&*store, &missing, AUDIT).await;
    assert!(matches!(result, Err(AuditError::Schema(_))));

    let path = temp_schema("{ not json");
    let result = import_collections_from_file(&*store, &path, AUDIT).await;
    std::fs::remove_file(&path).ok();
    assert!(matches!(result, Err(AuditError::Schema(_))));
}

// ── bootstrap ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn setup_registers_enabled_groups() {
    let store = Arc::new(MemoryStore::new());
    let config = AuditConfig {
        enable_request_events: false,
        ..AuditConfig::default()
    };

    let hooks = setup(store.clone(), config).await.unwrap();

    for point in HookPoint::STANDARD.iter().chain(&HookPoint::AUTH) {
        assert!(hooks.is_registered(*point), "{point} should be registered");
    }
    for point in HookPoint::REQUEST {
        assert!(!hooks.is_registered(point), "{point} should not be registered");
    }
    assert!(store.find_collection_by_name(AUDIT).await.unwrap().is_some());
}

#[tokio::test]
async fn setup_corrects_empty_collection_name() {
    let store = Arc::new(MemoryStore::new());
    let config = AuditConfig {
        collection_name: String::new(),
        ..AuditConfig::default()
    };

    let hooks = setup(store.clone(), config).await.unwrap();

    assert_eq!(hooks.logger().config().collection_name, AUDIT);
    assert_eq!(store.collection_names().await, vec![AUDIT.to_string()]);
}

#[tokio::test]
async fn setup_without_auto_create_leaves_store_alone() {
    let store = Arc::new(MemoryStore::new());
    let config = AuditConfig {
        create_audit_collection: false,
        ..AuditConfig::default()
    };

    setup(store.clone(), config).await.unwrap();
    assert!(store.collection_names().await.is_empty());
}

#[tokio::test]
async fn setup_fails_when_audit_collection_cannot_be_created() {
    let store = Arc::new(MemoryStore::new());
    store.fail_writes_to(AUDIT).await;

    let result = setup(store, AuditConfig::default()).await;
    assert!(matches!(result, Err(AuditError::Schema(_))));
}

#[tokio::test]
async fn schema_import_failure_is_tolerated_unless_configured() {
    let missing = std::env::temp_dir()
        .join("record_audit_missing_schema.json")
        .display()
        .to_string();

    let tolerant = AuditConfig {
        schema_path: missing.clone(),
        ..AuditConfig::default()
    };
    assert!(setup(Arc::new(MemoryStore::new()), tolerant).await.is_ok());

    let strict = AuditConfig {
        schema_path: missing,
        fail_on_schema_error: true,
        ..AuditConfig::default()
    };
    let result = setup(Arc::new(MemoryStore::new()), strict).await;
    assert!(matches!(result, Err(AuditError::Schema(_))));
}
