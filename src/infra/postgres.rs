mod record_repo;
pub mod schema;

pub use record_repo::PgStore;
