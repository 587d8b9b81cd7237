//! Attendance record domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marker stored in every record's `status` field. There is no
/// "absent" record — absence is the absence of a record.
pub const STATUS_PRESENT: &str = "present";

/// One verified student presence event.
///
/// Created exactly once per `(student_id, session_id)` pair by the
/// scan validator; never updated or deleted by this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub record_id: Uuid,
    pub student_id: Uuid,
    pub session_id: String,
    /// Copied from the session at commit time for reporting.
    pub subject: String,
    pub scan_time: DateTime<Utc>,
    pub location_lat: Option<f64>,
    pub location_long: Option<f64>,
    pub biometric_verified: bool,
    pub status: String,
}

/// Input for committing a record.
#[derive(Debug, Clone)]
pub struct CreateAttendanceRecord {
    pub student_id: Uuid,
    pub session_id: String,
    pub subject: String,
    pub scan_time: DateTime<Utc>,
    pub location_lat: Option<f64>,
    pub location_long: Option<f64>,
    pub biometric_verified: bool,
}
