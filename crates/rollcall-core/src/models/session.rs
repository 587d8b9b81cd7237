//! Attendance session domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RollcallError, RollcallResult};

/// Shortest accepted session identifier.
pub const SESSION_ID_MIN_LEN: usize = 3;
/// Longest accepted session identifier.
pub const SESSION_ID_MAX_LEN: usize = 64;

/// One faculty-issued check-in window.
///
/// A session is usable for check-in iff `is_active` **and** the wall
/// clock has not passed `expires_at`. Both conditions are evaluated
/// independently: `is_active` is an explicit write that may lag real
/// time, so readers must never trust it alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceSession {
    pub session_id: String,
    pub class_id: String,
    pub subject: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl AttendanceSession {
    /// Whether the session can still accept check-ins at `now`.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.expires_at
    }

    /// Whether the wall clock alone has invalidated the session,
    /// regardless of the `is_active` flag.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Input for creating a session.
#[derive(Debug, Clone)]
pub struct CreateAttendanceSession {
    pub session_id: String,
    pub class_id: String,
    pub subject: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Validate a caller-supplied session identifier: 3–64 characters,
/// ASCII letters, digits, hyphen, or underscore.
pub fn validate_session_id(id: &str) -> RollcallResult<()> {
    if id.len() < SESSION_ID_MIN_LEN || id.len() > SESSION_ID_MAX_LEN {
        return Err(RollcallError::Validation {
            message: format!(
                "session id must be {SESSION_ID_MIN_LEN}-{SESSION_ID_MAX_LEN} characters, got {}",
                id.len()
            ),
        });
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(RollcallError::Validation {
            message: "session id may only contain letters, digits, '-' and '_'".into(),
        });
    }
    Ok(())
}

/// Generate a fresh random session identifier (UUIDv4).
pub fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}
