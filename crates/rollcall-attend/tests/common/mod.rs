//! In-memory store implementations shared by the protocol test
//! suites.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rollcall_core::error::{RollcallError, RollcallResult};
use rollcall_core::models::record::{AttendanceRecord, CreateAttendanceRecord, STATUS_PRESENT};
use rollcall_core::models::session::{AttendanceSession, CreateAttendanceSession};
use rollcall_core::repository::{RecordRepository, SessionRepository};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<Mutex<HashMap<String, AttendanceSession>>>,
}

impl MemorySessionStore {
    pub fn snapshot(&self, session_id: &str) -> Option<AttendanceSession> {
        self.inner.lock().unwrap().get(session_id).cloned()
    }
}

impl SessionRepository for MemorySessionStore {
    async fn insert(&self, input: CreateAttendanceSession) -> RollcallResult<AttendanceSession> {
        let mut map = self.inner.lock().unwrap();
        let session = AttendanceSession {
            session_id: input.session_id.clone(),
            class_id: input.class_id,
            subject: input.subject,
            created_by: input.created_by,
            created_at: input.created_at,
            expires_at: input.expires_at,
            is_active: true,
        };
        map.insert(input.session_id, session.clone());
        Ok(session)
    }

    async fn get(&self, session_id: &str) -> RollcallResult<Option<AttendanceSession>> {
        Ok(self.inner.lock().unwrap().get(session_id).cloned())
    }

    async fn set_active(&self, session_id: &str, active: bool) -> RollcallResult<()> {
        if let Some(session) = self.inner.lock().unwrap().get_mut(session_id) {
            session.is_active = active;
        }
        Ok(())
    }

    async fn deactivate_for_issuer(&self, issuer_id: Uuid) -> RollcallResult<u64> {
        let mut count = 0;
        for session in self.inner.lock().unwrap().values_mut() {
            if session.created_by == issuer_id && session.is_active {
                session.is_active = false;
                count += 1;
            }
        }
        Ok(count)
    }
}

#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<Mutex<Vec<AttendanceRecord>>>,
}

impl MemoryRecordStore {
    pub fn count_for(&self, student_id: Uuid, session_id: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.student_id == student_id && r.session_id == session_id)
            .count()
    }

    pub fn total(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

impl RecordRepository for MemoryRecordStore {
    async fn insert(&self, input: CreateAttendanceRecord) -> RollcallResult<AttendanceRecord> {
        let mut records = self.inner.lock().unwrap();
        let duplicate = records
            .iter()
            .any(|r| r.student_id == input.student_id && r.session_id == input.session_id);
        if duplicate {
            return Err(RollcallError::AlreadyExists {
                entity: "attendance_record".into(),
                id: format!("{}/{}", input.student_id, input.session_id),
            });
        }
        let record = AttendanceRecord {
            record_id: Uuid::new_v4(),
            student_id: input.student_id,
            session_id: input.session_id,
            subject: input.subject,
            scan_time: input.scan_time,
            location_lat: input.location_lat,
            location_long: input.location_long,
            biometric_verified: input.biometric_verified,
            status: STATUS_PRESENT.into(),
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn find(
        &self,
        student_id: Uuid,
        session_id: &str,
    ) -> RollcallResult<Option<AttendanceRecord>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.student_id == student_id && r.session_id == session_id)
            .cloned())
    }

    async fn list_for_student(&self, student_id: Uuid) -> RollcallResult<Vec<AttendanceRecord>> {
        let mut records: Vec<_> = self
            .inner
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.scan_time.cmp(&a.scan_time));
        Ok(records)
    }
}

/// A record store whose duplicate pre-check is always stale: `find`
/// reports nothing, so races are only caught by the insert-time
/// uniqueness guard.
#[derive(Clone, Default)]
pub struct StaleFindRecordStore(pub MemoryRecordStore);

impl RecordRepository for StaleFindRecordStore {
    async fn insert(&self, input: CreateAttendanceRecord) -> RollcallResult<AttendanceRecord> {
        self.0.insert(input).await
    }

    async fn find(
        &self,
        _student_id: Uuid,
        _session_id: &str,
    ) -> RollcallResult<Option<AttendanceRecord>> {
        Ok(None)
    }

    async fn list_for_student(&self, student_id: Uuid) -> RollcallResult<Vec<AttendanceRecord>> {
        self.0.list_for_student(student_id).await
    }
}

/// A session store that is down.
#[derive(Clone, Default)]
pub struct UnavailableSessionStore;

impl SessionRepository for UnavailableSessionStore {
    async fn insert(&self, _input: CreateAttendanceSession) -> RollcallResult<AttendanceSession> {
        Err(RollcallError::StoreUnavailable("connection refused".into()))
    }

    async fn get(&self, _session_id: &str) -> RollcallResult<Option<AttendanceSession>> {
        Err(RollcallError::StoreUnavailable("connection refused".into()))
    }

    async fn set_active(&self, _session_id: &str, _active: bool) -> RollcallResult<()> {
        Err(RollcallError::StoreUnavailable("connection refused".into()))
    }

    async fn deactivate_for_issuer(&self, _issuer_id: Uuid) -> RollcallResult<u64> {
        Err(RollcallError::StoreUnavailable("connection refused".into()))
    }
}
