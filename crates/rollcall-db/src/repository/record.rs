//! SurrealDB implementation of [`RecordRepository`].

use rollcall_core::error::RollcallResult;
use rollcall_core::models::record::{
    AttendanceRecord, CreateAttendanceRecord, STATUS_PRESENT,
};
use rollcall_core::repository::RecordRepository;
use serde::Deserialize;
use surrealdb::sql::Datetime;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use crate::error::{DbError, is_unique_violation};

#[derive(Debug, Deserialize)]
struct RecordRow {
    record_id: String,
    student_id: String,
    session_id: String,
    subject: String,
    scan_time: Datetime,
    location_lat: Option<f64>,
    location_long: Option<f64>,
    biometric_verified: bool,
    status: String,
}

impl RecordRow {
    fn try_into_record(self) -> Result<AttendanceRecord, DbError> {
        let record_id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid record UUID: {e}")))?;
        let student_id = Uuid::parse_str(&self.student_id)
            .map_err(|e| DbError::Decode(format!("invalid student UUID: {e}")))?;
        Ok(AttendanceRecord {
            record_id,
            student_id,
            session_id: self.session_id,
            subject: self.subject,
            scan_time: self.scan_time.0,
            location_lat: self.location_lat,
            location_long: self.location_long,
            biometric_verified: self.biometric_verified,
            status: self.status,
        })
    }
}

/// SurrealDB implementation of the record store. The unique index on
/// `(student_id, session_id)` is the authoritative duplicate guard;
/// a violation surfaces as `AlreadyExists` so the validator can fold
/// the race into its "already marked" outcome.
#[derive(Clone)]
pub struct SurrealRecordRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRecordRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RecordRepository for SurrealRecordRepository<C> {
    async fn insert(&self, input: CreateAttendanceRecord) -> RollcallResult<AttendanceRecord> {
        let record_id = Uuid::new_v4();
        let pair = format!("{}/{}", input.student_id, input.session_id);

        let result = self
            .db
            .query(
                "CREATE type::record('attendance_record', $id) SET \
                 student_id = $student_id, \
                 session_id = $session_id, \
                 subject = $subject, \
                 scan_time = $scan_time, \
                 location_lat = $location_lat, \
                 location_long = $location_long, \
                 biometric_verified = $biometric_verified, \
                 status = $status",
            )
            .bind(("id", record_id.to_string()))
            .bind(("student_id", input.student_id.to_string()))
            .bind(("session_id", input.session_id.clone()))
            .bind(("subject", input.subject.clone()))
            .bind(("scan_time", Datetime::from(input.scan_time)))
            .bind(("location_lat", input.location_lat))
            .bind(("location_long", input.location_long))
            .bind(("biometric_verified", input.biometric_verified))
            .bind(("status", STATUS_PRESENT))
            .await
            .map_err(DbError::from)?;

        if let Err(err) = result.check() {
            if is_unique_violation(&err) {
                return Err(DbError::Duplicate {
                    entity: "attendance_record".into(),
                    id: pair,
                }
                .into());
            }
            return Err(DbError::from(err).into());
        }

        Ok(AttendanceRecord {
            record_id,
            student_id: input.student_id,
            session_id: input.session_id,
            subject: input.subject,
            scan_time: input.scan_time,
            location_lat: input.location_lat,
            location_long: input.location_long,
            biometric_verified: input.biometric_verified,
            status: STATUS_PRESENT.into(),
        })
    }

    async fn find(
        &self,
        student_id: Uuid,
        session_id: &str,
    ) -> RollcallResult<Option<AttendanceRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM attendance_record \
                 WHERE student_id = $student_id AND session_id = $session_id",
            )
            .bind(("student_id", student_id.to_string()))
            .bind(("session_id", session_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RecordRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_record()?)),
            None => Ok(None),
        }
    }

    async fn list_for_student(&self, student_id: Uuid) -> RollcallResult<Vec<AttendanceRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM attendance_record \
                 WHERE student_id = $student_id ORDER BY scan_time DESC",
            )
            .bind(("student_id", student_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RecordRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_record().map_err(Into::into))
            .collect()
    }
}
