//! Schema definitions and migration runner for SurrealDB.
//!
//! Both tables use SCHEMAFULL mode for data integrity. UUIDs are
//! stored as strings. The unique index on
//! `(student_id, session_id)` is the authoritative duplicate guard
//! for check-ins; client-side pre-checks are an optimization only.

use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, Deserialize)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Attendance sessions (record id = session_id)
-- =======================================================================
DEFINE TABLE attendance_session SCHEMAFULL;
DEFINE FIELD class_id ON TABLE attendance_session TYPE string;
DEFINE FIELD subject ON TABLE attendance_session TYPE string;
DEFINE FIELD created_by ON TABLE attendance_session TYPE string;
DEFINE FIELD created_at ON TABLE attendance_session TYPE datetime;
DEFINE FIELD expires_at ON TABLE attendance_session TYPE datetime;
DEFINE FIELD is_active ON TABLE attendance_session TYPE bool \
    DEFAULT true;

-- =======================================================================
-- Attendance records (append-mostly; one per student per session)
-- =======================================================================
DEFINE TABLE attendance_record SCHEMAFULL;
DEFINE FIELD student_id ON TABLE attendance_record TYPE string;
DEFINE FIELD session_id ON TABLE attendance_record TYPE string;
DEFINE FIELD subject ON TABLE attendance_record TYPE string;
DEFINE FIELD scan_time ON TABLE attendance_record TYPE datetime;
DEFINE FIELD location_lat ON TABLE attendance_record TYPE option<float>;
DEFINE FIELD location_long ON TABLE attendance_record TYPE option<float>;
DEFINE FIELD biometric_verified ON TABLE attendance_record TYPE bool \
    DEFAULT false;
DEFINE FIELD status ON TABLE attendance_record TYPE string \
    ASSERT $value IN ['present'];
DEFINE INDEX idx_attendance_once ON TABLE attendance_record \
    COLUMNS student_id, session_id UNIQUE;
";

/// Apply any migrations newer than the recorded schema version.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
