//! SurrealDB implementation of [`SessionRepository`].

use rollcall_core::error::RollcallResult;
use rollcall_core::models::session::{AttendanceSession, CreateAttendanceSession};
use rollcall_core::repository::SessionRepository;
use serde::Deserialize;
use surrealdb::sql::Datetime;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, Deserialize)]
struct SessionRow {
    class_id: String,
    subject: String,
    created_by: String,
    created_at: Datetime,
    expires_at: Datetime,
    is_active: bool,
}

impl SessionRow {
    fn try_into_session(self, session_id: String) -> Result<AttendanceSession, DbError> {
        let created_by = Uuid::parse_str(&self.created_by)
            .map_err(|e| DbError::Decode(format!("invalid issuer UUID: {e}")))?;
        Ok(AttendanceSession {
            session_id,
            class_id: self.class_id,
            subject: self.subject,
            created_by,
            created_at: self.created_at.0,
            expires_at: self.expires_at.0,
            is_active: self.is_active,
        })
    }
}

/// SurrealDB implementation of the session store. Sessions are keyed
/// by their `session_id` as the record id.
#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn insert(&self, input: CreateAttendanceSession) -> RollcallResult<AttendanceSession> {
        let session_id = input.session_id.clone();

        // UPSERT supersedes a dead session reusing the same id; the
        // issuer refuses live collisions before calling this.
        let result = self
            .db
            .query(
                "UPSERT type::record('attendance_session', $id) SET \
                 class_id = $class_id, \
                 subject = $subject, \
                 created_by = $created_by, \
                 created_at = $created_at, \
                 expires_at = $expires_at, \
                 is_active = true",
            )
            .bind(("id", session_id.clone()))
            .bind(("class_id", input.class_id))
            .bind(("subject", input.subject))
            .bind(("created_by", input.created_by.to_string()))
            .bind(("created_at", Datetime::from(input.created_at)))
            .bind(("expires_at", Datetime::from(input.expires_at)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| {
            DbError::Decode(format!("upsert of session '{session_id}' returned no row"))
        })?;

        row.try_into_session(session_id).map_err(Into::into)
    }

    async fn get(&self, session_id: &str) -> RollcallResult<Option<AttendanceSession>> {
        let id = session_id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('attendance_session', $id)")
            .bind(("id", id.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_session(id)?)),
            None => Ok(None),
        }
    }

    async fn set_active(&self, session_id: &str, active: bool) -> RollcallResult<()> {
        // UPDATE against a missing record id matches nothing, which
        // keeps revocation idempotent.
        self.db
            .query("UPDATE type::record('attendance_session', $id) SET is_active = $active")
            .bind(("id", session_id.to_string()))
            .bind(("active", active))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn deactivate_for_issuer(&self, issuer_id: Uuid) -> RollcallResult<u64> {
        let mut result = self
            .db
            .query(
                "UPDATE attendance_session SET is_active = false \
                 WHERE created_by = $issuer AND is_active = true",
            )
            .bind(("issuer", issuer_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }
}
