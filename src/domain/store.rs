use {
    super::{
        collection::{Collection, CollectionDefinition},
        error::AuditError,
        record::Record,
    },
    std::{future::Future, pin::Pin},
};

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AuditError>> + Send + 'a>>;

/// The record storage engine the audit pipeline reads from and writes to.
pub trait RecordStore: Send + Sync {
    fn find_collection_by_name<'a>(&'a self, name: &'a str)
    -> StoreFuture<'a, Option<Collection>>;

    fn find_record_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> StoreFuture<'a, Option<Record>>;

    /// Insert or replace. Validates against the collection definition and
    /// stamps autodate fields.
    fn save<'a>(&'a self, record: &'a Record) -> StoreFuture<'a, ()>;

    fn delete<'a>(&'a self, record: &'a Record) -> StoreFuture<'a, ()>;

    /// Register a new collection. Fails if the name is taken.
    fn create_collection<'a>(
        &'a self,
        definition: &'a CollectionDefinition,
    ) -> StoreFuture<'a, Collection>;
}
