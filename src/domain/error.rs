use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("configuration: {0}")]
    Configuration(String),

    #[error("schema: {0}")]
    Schema(String),

    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("record not found: {collection}/{id}")]
    RecordNotFound { collection: String, id: String },

    #[error("validation: {0}")]
    Validation(String),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage: {0}")]
    Storage(String),
}
