//! Repository trait definitions for the session and record stores.
//!
//! All operations are async. The stores are the only synchronization
//! points between the issuer and concurrently scanning validators:
//! duplicate prevention ultimately rests on the record store's
//! uniqueness constraint over `(student_id, session_id)`, not on any
//! client-side check.

use uuid::Uuid;

use crate::error::RollcallResult;
use crate::models::record::{AttendanceRecord, CreateAttendanceRecord};
use crate::models::session::{AttendanceSession, CreateAttendanceSession};

pub trait SessionRepository: Send + Sync {
    /// Persist a new session. An existing session with the same id
    /// is superseded in place — the issuer refuses to reuse an id
    /// while its session is still usable, so only dead sessions are
    /// ever overwritten.
    fn insert(
        &self,
        input: CreateAttendanceSession,
    ) -> impl Future<Output = RollcallResult<AttendanceSession>> + Send;

    /// Fetch a session by id. Absence is a routine branch of the
    /// check-in state machine, so this returns `None` rather than an
    /// error.
    fn get(
        &self,
        session_id: &str,
    ) -> impl Future<Output = RollcallResult<Option<AttendanceSession>>> + Send;

    /// Flip the `is_active` flag. Writing the current value is a
    /// no-op, not an error.
    fn set_active(
        &self,
        session_id: &str,
        active: bool,
    ) -> impl Future<Output = RollcallResult<()>> + Send;

    /// Deactivate every still-active session created by `issuer_id`.
    /// Returns the number of sessions deactivated.
    fn deactivate_for_issuer(
        &self,
        issuer_id: Uuid,
    ) -> impl Future<Output = RollcallResult<u64>> + Send;
}

pub trait RecordRepository: Send + Sync {
    /// Commit a record. Fails with `AlreadyExists` when a record for
    /// the same `(student_id, session_id)` pair is already present —
    /// the store-level uniqueness constraint is the authoritative
    /// duplicate guard.
    fn insert(
        &self,
        input: CreateAttendanceRecord,
    ) -> impl Future<Output = RollcallResult<AttendanceRecord>> + Send;

    /// Look up the record for one `(student, session)` pair, if any.
    fn find(
        &self,
        student_id: Uuid,
        session_id: &str,
    ) -> impl Future<Output = RollcallResult<Option<AttendanceRecord>>> + Send;

    /// All records for a student, newest first.
    fn list_for_student(
        &self,
        student_id: Uuid,
    ) -> impl Future<Output = RollcallResult<Vec<AttendanceRecord>>> + Send;
}
