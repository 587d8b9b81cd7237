//! Session payload serialization.
//!
//! The payload travels as one JSON text string inside the QR symbol.
//! It carries no integrity signature: it is trusted only insofar as
//! the referenced session exists and is still usable in the store.
//! Deployments that need presence proof enable the verification
//! gates on the validator side.

use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QrError;

/// Current payload schema version.
pub const PAYLOAD_VERSION: u8 = 1;

/// The structured contents of a scannable attendance symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrPayload {
    pub session_id: String,
    pub subject: String,
    /// Issuing faculty principal, when the issuer chose to embed it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_by: Option<Uuid>,
    pub generated_at: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: u8,
}

fn default_version() -> u8 {
    PAYLOAD_VERSION
}

impl QrPayload {
    pub fn new(
        session_id: impl Into<String>,
        subject: impl Into<String>,
        issued_by: Option<Uuid>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            subject: subject.into(),
            issued_by,
            generated_at,
            version: PAYLOAD_VERSION,
        }
    }
}

/// Serialize a payload into the text form embedded in the symbol.
pub fn encode(payload: &QrPayload) -> String {
    // QrPayload contains no map keys that can fail to serialize.
    serde_json::to_string(payload).expect("payload serialization is infallible")
}

/// Parse raw scanned text back into a payload.
///
/// Tries a direct parse first; some scanner stacks re-encode special
/// characters, so on failure the text is percent-decoded once and
/// parsed again. A parse that succeeds but yields an empty
/// `session_id` is still malformed.
pub fn decode(raw: &str) -> Result<QrPayload, QrError> {
    let payload = match serde_json::from_str::<QrPayload>(raw) {
        Ok(p) => p,
        Err(first_err) => {
            let decoded = percent_decode_str(raw)
                .decode_utf8()
                .map_err(|e| QrError::MalformedPayload(e.to_string()))?;
            serde_json::from_str::<QrPayload>(&decoded)
                .map_err(|_| QrError::MalformedPayload(first_err.to_string()))?
        }
    };

    if payload.session_id.is_empty() {
        return Err(QrError::MalformedPayload("missing session_id".into()));
    }

    Ok(payload)
}
