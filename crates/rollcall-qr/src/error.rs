//! QR codec error types.

use rollcall_core::error::RollcallError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QrError {
    /// The scanned text is not a recognizable session payload. This
    /// is user-facing ("invalid QR"), never fatal.
    #[error("malformed QR payload: {0}")]
    MalformedPayload(String),

    /// The payload is too large or otherwise unencodable as a symbol.
    #[error("QR render failed: {0}")]
    Render(String),
}

impl From<QrError> for RollcallError {
    fn from(err: QrError) -> Self {
        match err {
            QrError::MalformedPayload(msg) => RollcallError::Validation {
                message: format!("malformed QR payload: {msg}"),
            },
            QrError::Render(msg) => RollcallError::Internal(format!("QR render failed: {msg}")),
        }
    }
}
