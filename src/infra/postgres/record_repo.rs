use {
    super::schema::{table_ddl, upsert_sql},
    crate::domain::{
        collection::{Collection, CollectionDefinition},
        error::AuditError,
        id::Identifier,
        record::Record,
        store::{RecordStore, StoreFuture},
    },
    chrono::Utc,
    sqlx::{PgPool, types::Json},
    uuid::Uuid,
};

/// Postgres-backed `RecordStore`. Collections are registered in
/// `_collections`; each one is a table with a typed column per field.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded migrations (collection registry).
    pub async fn migrate(&self) -> Result<(), AuditError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AuditError::Schema(format!("migration failed: {e}")))
    }

    async fn collection(&self, name: &str) -> Result<Option<Collection>, AuditError> {
        let row = sqlx::query_as::<_, (Uuid, Json<CollectionDefinition>)>(
            "SELECT id, definition FROM _collections WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, Json(definition))| Collection { id, definition }))
    }

    async fn require_collection(&self, name: &str) -> Result<Collection, AuditError> {
        self.collection(name)
            .await?
            .ok_or_else(|| AuditError::CollectionNotFound(name.to_string()))
    }

    async fn record(&self, collection: &str, id: &str) -> Result<Option<Record>, AuditError> {
        let collection = self.require_collection(collection).await?;
        let table = Identifier::new(collection.name())?.quoted();

        let row: Option<serde_json::Value> =
            sqlx::query_scalar(&format!("SELECT to_jsonb(t) FROM {table} t WHERE t.id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|row| Record::from_row(collection.name(), row))
            .transpose()
    }

    async fn upsert(&self, record: &Record) -> Result<(), AuditError> {
        let collection = self.require_collection(record.collection()).await?;
        let definition = &collection.definition;
        let table = Identifier::new(collection.name())?.quoted();

        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)"
        ))
        .bind(record.id())
        .fetch_one(&mut *tx)
        .await?;

        let mut row = record.clone();
        definition.stamp_autodates(&mut row, Utc::now(), !exists);
        definition.validate(&row)?;

        sqlx::query(&upsert_sql(definition)?)
            .bind(row.to_row())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn remove(&self, record: &Record) -> Result<(), AuditError> {
        let collection = self.require_collection(record.collection()).await?;
        let table = Identifier::new(collection.name())?.quoted();

        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(record.id())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuditError::RecordNotFound {
                collection: record.collection().to_string(),
                id: record.id().to_string(),
            });
        }
        Ok(())
    }

    async fn register(&self, definition: &CollectionDefinition) -> Result<Collection, AuditError> {
        let statements = table_ddl(definition)?;
        let id = Uuid::now_v7();

        let mut tx = self.pool.begin().await?;

        let inserted: Option<bool> = sqlx::query_scalar(
            r#"
            INSERT INTO _collections (id, name, definition)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            RETURNING true
            "#,
        )
        .bind(id)
        .bind(&definition.name)
        .bind(Json(definition))
        .fetch_optional(&mut *tx)
        .await?;

        if inserted.is_none() {
            return Err(AuditError::Validation(format!(
                "collection {} already exists",
                definition.name
            )));
        }

        for statement in &statements {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        tx.commit().await?;

        tracing::debug!(collection = %definition.name, "collection table created");
        Ok(Collection {
            id,
            definition: definition.clone(),
        })
    }
}

impl RecordStore for PgStore {
    fn find_collection_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> StoreFuture<'a, Option<Collection>> {
        Box::pin(self.collection(name))
    }

    fn find_record_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> StoreFuture<'a, Option<Record>> {
        Box::pin(self.record(collection, id))
    }

    fn save<'a>(&'a self, record: &'a Record) -> StoreFuture<'a, ()> {
        Box::pin(self.upsert(record))
    }

    fn delete<'a>(&'a self, record: &'a Record) -> StoreFuture<'a, ()> {
        Box::pin(self.remove(record))
    }

    fn create_collection<'a>(
        &'a self,
        definition: &'a CollectionDefinition,
    ) -> StoreFuture<'a, Collection> {
        Box::pin(self.register(definition))
    }
}
