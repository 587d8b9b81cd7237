//! Issuance errors and check-in rejection reasons.

use rollcall_core::error::RollcallError;
use rollcall_qr::QrError;
use thiserror::Error;

/// Failures of the faculty-side `generate`/`revoke` operations.
///
/// `SessionIdInUse` is surfaced to the caller so they can pick
/// another id — generation is never silently retried.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("session id '{0}' is already in use by a live session")]
    SessionIdInUse(String),

    #[error(transparent)]
    Qr(#[from] QrError),

    #[error(transparent)]
    Core(#[from] RollcallError),
}

/// Why a check-in attempt was turned away.
///
/// Every variant is recovered locally into the state machine's
/// `Rejected` state with a user-displayable message; none propagates
/// as a raw error. `SessionExpired` deliberately prompts for a fresh
/// code on the issuer side.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    #[error("invalid QR code")]
    MalformedPayload,

    #[error("no such attendance session")]
    SessionNotFound,

    #[error("QR expired — ask your faculty to generate a new code")]
    SessionExpired,

    #[error("identity verification failed")]
    CredentialDenied,

    #[error("location permission denied")]
    LocationPermissionDenied,

    #[error("location unavailable")]
    LocationUnavailable,

    #[error("location request timed out")]
    LocationTimeout,

    #[error("too far from the session location ({distance_m:.0} m away)")]
    OutOfRadius { distance_m: f64 },
}
