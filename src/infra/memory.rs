use {
    crate::domain::{
        collection::{Collection, CollectionDefinition},
        error::AuditError,
        record::Record,
        store::{RecordStore, StoreFuture},
    },
    chrono::Utc,
    std::collections::{BTreeMap, HashSet},
    tokio::sync::RwLock,
    uuid::Uuid,
};

#[derive(Default)]
struct State {
    collections: BTreeMap<String, Collection>,
    /// Records per collection, in insertion order.
    records: BTreeMap<String, Vec<Record>>,
    failing: HashSet<String>,
}

/// In-process `RecordStore`. Applies the same validation and autodate rules
/// as the database backend.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write to `collection` fail.
    pub async fn fail_writes_to(&self, collection: &str) {
        self.state.write().await.failing.insert(collection.to_string());
    }

    pub async fn records(&self, collection: &str) -> Vec<Record> {
        self.state
            .read()
            .await
            .records
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn collection_names(&self) -> Vec<String> {
        self.state.read().await.collections.keys().cloned().collect()
    }
}

impl RecordStore for MemoryStore {
    fn find_collection_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> StoreFuture<'a, Option<Collection>> {
        Box::pin(async move { Ok(self.state.read().await.collections.get(name).cloned()) })
    }

    fn find_record_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> StoreFuture<'a, Option<Record>> {
        Box::pin(async move {
            let state = self.state.read().await;
            if !state.collections.contains_key(collection) {
                return Err(AuditError::CollectionNotFound(collection.to_string()));
            }
            Ok(state
                .records
                .get(collection)
                .and_then(|rows| rows.iter().find(|r| r.id() == id))
                .cloned())
        })
    }

    fn save<'a>(&'a self, record: &'a Record) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            let name = record.collection();
            if state.failing.contains(name) {
                return Err(AuditError::Storage(format!("write to {name} rejected")));
            }
            let definition = state
                .collections
                .get(name)
                .map(|c| c.definition.clone())
                .ok_or_else(|| AuditError::CollectionNotFound(name.to_string()))?;

            let rows = state.records.entry(name.to_string()).or_default();
            let existing = rows.iter().position(|r| r.id() == record.id());

            let mut row = record.clone();
            definition.stamp_autodates(&mut row, Utc::now(), existing.is_none());
            definition.validate(&row)?;

            match existing {
                Some(i) => rows[i] = row,
                None => rows.push(row),
            }
            Ok(())
        })
    }

    fn delete<'a>(&'a self, record: &'a Record) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            let name = record.collection();
            if state.failing.contains(name) {
                return Err(AuditError::Storage(format!("write to {name} rejected")));
            }
            let rows = state
                .records
                .get_mut(name)
                .ok_or_else(|| AuditError::CollectionNotFound(name.to_string()))?;
            let before = rows.len();
            rows.retain(|r| r.id() != record.id());
            if rows.len() == before {
                return Err(AuditError::RecordNotFound {
                    collection: name.to_string(),
                    id: record.id().to_string(),
                });
            }
            Ok(())
        })
    }

    fn create_collection<'a>(
        &'a self,
        definition: &'a CollectionDefinition,
    ) -> StoreFuture<'a, Collection> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if state.failing.contains(&definition.name) {
                return Err(AuditError::Storage(format!(
                    "create of {} rejected",
                    definition.name
                )));
            }
            if state.collections.contains_key(&definition.name) {
                return Err(AuditError::Validation(format!(
                    "collection {} already exists",
                    definition.name
                )));
            }
            let collection = Collection {
                id: Uuid::now_v7(),
                definition: definition.clone(),
            };
            state
                .collections
                .insert(definition.name.clone(), collection.clone());
            state.records.insert(definition.name.clone(), Vec::new());
            Ok(collection)
        })
    }
}
