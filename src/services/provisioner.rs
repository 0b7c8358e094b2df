use {
    crate::domain::{
        collection::{AccessRules, CollectionDefinition, FieldDefinition},
        error::AuditError,
        event::{EventType, fields},
        id::MAX_IDENTIFIER_LEN,
        store::RecordStore,
    },
    std::path::Path,
    uuid::Uuid,
};

/// Audit rows are readable and writable through the API by admins only.
pub const ADMIN_ONLY_RULE: &str = "@request.auth.type = 'admin'";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionResult {
    Created,
    AlreadyExists,
}

/// Schema of the audit collection: fields, admin-only rules and one
/// non-unique index per commonly filtered dimension.
pub fn audit_collection_definition(name: &str) -> CollectionDefinition {
    CollectionDefinition::new(name)
        .with_rules(AccessRules::uniform(ADMIN_ONLY_RULE))
        .with_field(FieldDefinition::select(
            fields::EVENT_TYPE,
            true,
            EventType::ALL.iter().map(EventType::as_str),
        ))
        .with_field(FieldDefinition::text(fields::COLLECTION_NAME, true))
        .with_field(FieldDefinition::text(fields::RECORD_ID, true))
        .with_field(FieldDefinition::text(fields::USER_ID, false))
        .with_field(FieldDefinition::text(fields::AUTH_METHOD, false))
        .with_field(FieldDefinition::text(fields::REQUEST_METHOD, false))
        .with_field(FieldDefinition::text(fields::REQUEST_IP, false))
        .with_field(FieldDefinition::text(fields::REQUEST_URL, false))
        .with_field(FieldDefinition::date(fields::TIMESTAMP, true))
        .with_field(FieldDefinition::text(fields::BEFORE_CHANGES, false))
        .with_field(FieldDefinition::text(fields::AFTER_CHANGES, false))
        .with_field(FieldDefinition::autodate(fields::CREATED, true, false))
        .with_field(FieldDefinition::autodate(fields::UPDATED, true, true))
        .with_index(index_name(name, fields::COLLECTION_NAME), false, fields::COLLECTION_NAME)
        .with_index(index_name(name, fields::RECORD_ID), false, fields::RECORD_ID)
        .with_index(index_name(name, fields::TIMESTAMP), false, fields::TIMESTAMP)
        .with_index(index_name(name, fields::USER_ID), false, fields::USER_ID)
        .with_index(index_name(name, fields::EVENT_TYPE), false, fields::EVENT_TYPE)
}

/// Length of the hash that replaces the tail of an over-long collection name.
const INDEX_HASH_LEN: usize = 8;

/// Index names share one namespace per database schema, so they carry the
/// collection name. When that would exceed the identifier limit the
/// collection part is cut short and a stable hash of the full name keeps it
/// unique.
pub fn index_name(collection: &str, column: &str) -> String {
    let full = format!("idx_{collection}_{column}");
    if full.len() <= MAX_IDENTIFIER_LEN {
        return full;
    }

    let hash = Uuid::new_v5(&Uuid::NAMESPACE_OID, full.as_bytes()).simple().to_string();
    let keep = MAX_IDENTIFIER_LEN.saturating_sub("idx_".len() + column.len() + INDEX_HASH_LEN + 2);
    let prefix: String = collection.chars().take(keep).collect();
    format!("idx_{prefix}_{}_{column}", &hash[..INDEX_HASH_LEN])
}

/// Create the audit collection unless one with this name exists already.
pub async fn ensure_audit_collection(
    store: &dyn RecordStore,
    name: &str,
) -> Result<ProvisionResult, AuditError> {
    if store.find_collection_by_name(name).await?.is_some() {
        tracing::info!(collection = %name, "audit collection already exists");
        return Ok(ProvisionResult::AlreadyExists);
    }

    store
        .create_collection(&audit_collection_definition(name))
        .await
        .map_err(|e| AuditError::Schema(format!("failed to create audit collection {name}: {e}")))?;

    tracing::info!(collection = %name, "created audit collection");
    Ok(ProvisionResult::Created)
}

/// Import collection definitions from a JSON array file. Existing
/// collections are left untouched; nothing is ever deleted. The audit
/// collection is ensured afterwards in case the file omits it.
///
/// Returns the names of the collections that were created.
pub async fn import_collections_from_file(
    store: &dyn RecordStore,
    path: &Path,
    audit_collection: &str,
) -> Result<Vec<String>, AuditError> {
    let raw = tokio::fs::read(path).await.map_err(|e| {
        AuditError::Schema(format!("failed to read schema file {}: {e}", path.display()))
    })?;
    let definitions: Vec<CollectionDefinition> = serde_json::from_slice(&raw)
        .map_err(|e| AuditError::Schema(format!("failed to parse schema file: {e}")))?;

    let mut created = Vec::new();
    for definition in &definitions {
        if store.find_collection_by_name(&definition.name).await?.is_some() {
            tracing::debug!(collection = %definition.name, "collection exists, skipping import");
            continue;
        }
        store.create_collection(definition).await.map_err(|e| {
            AuditError::Schema(format!("failed to import collection {}: {e}", definition.name))
        })?;
        created.push(definition.name.clone());
    }

    if ensure_audit_collection(store, audit_collection).await? == ProvisionResult::Created {
        tracing::info!(
            collection = %audit_collection,
            "audit collection missing from schema file, created it"
        );
        created.push(audit_collection.to_string());
    }

    tracing::info!(
        path = %path.display(),
        imported = created.len(),
        "imported collections from schema"
    );
    Ok(created)
}
