//! Database-specific error types and conversions.

use rollcall_core::error::RollcallError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Row decode failed: {0}")]
    Decode(String),

    #[error("Duplicate: {entity} with id {id}")]
    Duplicate { entity: String, id: String },
}

impl From<DbError> for RollcallError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Duplicate { entity, id } => RollcallError::AlreadyExists { entity, id },
            other => RollcallError::Database(other.to_string()),
        }
    }
}

/// Whether a SurrealDB error is a uniqueness-constraint violation
/// (duplicate record id or unique index hit).
pub(crate) fn is_unique_violation(err: &surrealdb::Error) -> bool {
    let msg = err.to_string();
    msg.contains("already exists") || msg.contains("already contains")
}
