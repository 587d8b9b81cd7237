//! Student-side scan validation and record commit.
//!
//! The machine runs `Idle → Scanning → PayloadDecoded →
//! SessionFetched → (CredentialChecked → LocationChecked) →
//! Committed`, with `Rejected` reachable from every state after
//! `Idle`. Store accesses and gate prompts are the suspension
//! points; the camera handle is released on every exit path.

use rollcall_core::clock::Clock;
use rollcall_core::error::{RollcallError, RollcallResult};
use rollcall_core::models::principal::Principal;
use rollcall_core::models::record::{AttendanceRecord, CreateAttendanceRecord};
use rollcall_core::repository::{RecordRepository, SessionRepository};
use rollcall_qr::{QrPayload, decode};
use tracing::{debug, info, warn};

use crate::error::RejectReason;
use crate::gates::Verifier;
use crate::suggest::{SuggestError, SuggestionClient, SuggestionRequest};

/// Where a scan attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Scanning,
    PayloadDecoded,
    SessionFetched,
    CredentialChecked,
    LocationChecked,
    Committed,
    Rejected,
}

/// An exclusively held camera stream.
///
/// `stop` must be safe to call more than once; the flow calls it on
/// every exit path so repeated attempts never leak a device handle.
pub trait CaptureSurface: Send {
    fn stop(&mut self);
}

/// Stand-in surface for flows fed pre-decoded text (tests, deep
/// links).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCapture;

impl CaptureSurface for NullCapture {
    fn stop(&mut self) {}
}

/// One scan attempt: phase tracking plus ownership of the capture
/// surface.
pub struct ScanFlow<Cam: CaptureSurface = NullCapture> {
    phase: ScanPhase,
    camera: Option<Cam>,
}

impl ScanFlow<NullCapture> {
    /// A flow with no camera, starting at `Idle`.
    pub fn detached() -> Self {
        Self {
            phase: ScanPhase::Idle,
            camera: None,
        }
    }
}

impl<Cam: CaptureSurface> ScanFlow<Cam> {
    /// Open the capture surface: `Idle → Scanning`.
    pub fn begin(camera: Cam) -> Self {
        Self {
            phase: ScanPhase::Scanning,
            camera: Some(camera),
        }
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Feed one camera frame's worth of decoded text. Decode failure
    /// is routine — the flow stays in `Scanning` — and a frame
    /// arriving in any other phase is ignored.
    pub fn on_frame(&mut self, raw: &str) -> Option<QrPayload> {
        if self.phase != ScanPhase::Scanning {
            return None;
        }
        match decode(raw) {
            Ok(payload) => {
                // Scanning is done; let go of the camera before the
                // slow store round-trips begin.
                self.release_camera();
                self.phase = ScanPhase::PayloadDecoded;
                Some(payload)
            }
            Err(err) => {
                debug!(%err, "undecodable frame, still scanning");
                None
            }
        }
    }

    /// User cancellation from any phase: release the device and
    /// return to `Idle`. No partial record is ever written.
    pub fn cancel(&mut self) {
        self.release_camera();
        self.phase = ScanPhase::Idle;
    }

    fn release_camera(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            camera.stop();
        }
    }

    fn advance(&mut self, phase: ScanPhase) {
        debug!(from = ?self.phase, to = ?phase, "scan flow transition");
        self.phase = phase;
    }

    fn finish(&mut self, phase: ScanPhase) {
        self.release_camera();
        self.phase = phase;
    }
}

impl<Cam: CaptureSurface> Drop for ScanFlow<Cam> {
    fn drop(&mut self) {
        self.release_camera();
    }
}

/// Terminal result of a check-in attempt.
#[derive(Debug, Clone)]
pub enum CheckInOutcome {
    /// Exactly one record was written.
    Committed {
        record: AttendanceRecord,
        /// Advisory text from the suggestion collaborator, if it
        /// answered in time.
        suggestion: Option<String>,
    },
    /// A record for this (student, session) already exists. Success-
    /// equivalent: report it neutrally, never with error styling.
    AlreadyMarked { session_id: String },
    /// Turned away with a user-displayable reason.
    Rejected(RejectReason),
}

/// Validates scans and commits records on behalf of one student
/// principal.
pub struct ScanValidator<S, R, K, V, G>
where
    S: SessionRepository,
    R: RecordRepository,
    K: Clock,
    V: Verifier,
    G: SuggestionClient,
{
    sessions: S,
    records: R,
    clock: K,
    chain: V,
    suggestions: G,
    principal: Principal,
}

impl<S, R, K, V, G> ScanValidator<S, R, K, V, G>
where
    S: SessionRepository,
    R: RecordRepository,
    K: Clock,
    V: Verifier,
    G: SuggestionClient,
{
    pub fn new(
        sessions: S,
        records: R,
        clock: K,
        chain: V,
        suggestions: G,
        principal: Principal,
    ) -> Self {
        Self {
            sessions,
            records,
            clock,
            chain,
            suggestions,
            principal,
        }
    }

    /// Run a decoded payload through the state machine and, on
    /// acceptance, commit the record.
    ///
    /// Store connectivity failures abort the attempt back to `Idle`
    /// and propagate as errors; every protocol-level refusal comes
    /// back as a [`CheckInOutcome`] instead.
    pub async fn check_in<Cam: CaptureSurface>(
        &self,
        flow: &mut ScanFlow<Cam>,
        payload: &QrPayload,
    ) -> RollcallResult<CheckInOutcome> {
        match self.evaluate(flow, payload).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                // No partial state survives a store failure.
                flow.cancel();
                Err(err)
            }
        }
    }

    async fn evaluate<Cam: CaptureSurface>(
        &self,
        flow: &mut ScanFlow<Cam>,
        payload: &QrPayload,
    ) -> RollcallResult<CheckInOutcome> {
        if flow.phase() == ScanPhase::Idle {
            // Payload arrived without a camera pass (deep link or
            // detached flow).
            flow.advance(ScanPhase::PayloadDecoded);
        }

        // 1. Fetch the referenced session.
        let Some(session) = self.sessions.get(&payload.session_id).await? else {
            flow.finish(ScanPhase::Rejected);
            return Ok(CheckInOutcome::Rejected(RejectReason::SessionNotFound));
        };

        // 2. Usability: the wall clock is evaluated here, every
        //    time — `is_active` alone is never trusted, because
        //    revocation is an explicit write that may lag expiry.
        let now = self.clock.now();
        if !session.is_usable(now) {
            flow.finish(ScanPhase::Rejected);
            return Ok(CheckInOutcome::Rejected(RejectReason::SessionExpired));
        }
        flow.advance(ScanPhase::SessionFetched);

        // 3. Duplicate pre-check. An optimization only: the store's
        //    uniqueness constraint at step 5 is the real guarantee.
        if self
            .records
            .find(self.principal.id, &session.session_id)
            .await?
            .is_some()
        {
            flow.finish(ScanPhase::Rejected);
            return Ok(CheckInOutcome::AlreadyMarked {
                session_id: session.session_id,
            });
        }

        // 4. Verification chain.
        let evidence = match self.chain.verify(&self.principal, &session).await {
            Ok(evidence) => evidence,
            Err(reason) => {
                flow.finish(ScanPhase::Rejected);
                return Ok(CheckInOutcome::Rejected(reason));
            }
        };
        if evidence.biometric_verified {
            flow.advance(ScanPhase::CredentialChecked);
        }
        if evidence.location.is_some() {
            flow.advance(ScanPhase::LocationChecked);
        }

        // 5. Commit. A uniqueness violation here is a concurrent
        //    duplicate winning the race, not a write error.
        let created = self
            .records
            .insert(CreateAttendanceRecord {
                student_id: self.principal.id,
                session_id: session.session_id.clone(),
                subject: session.subject.clone(),
                scan_time: self.clock.now(),
                location_lat: evidence.location.map(|p| p.lat),
                location_long: evidence.location.map(|p| p.long),
                biometric_verified: evidence.biometric_verified,
            })
            .await;

        let record = match created {
            Ok(record) => record,
            Err(RollcallError::AlreadyExists { .. }) => {
                flow.finish(ScanPhase::Rejected);
                return Ok(CheckInOutcome::AlreadyMarked {
                    session_id: session.session_id,
                });
            }
            Err(err) => return Err(err),
        };

        info!(
            student = %self.principal.id,
            session_id = %record.session_id,
            subject = %record.subject,
            "attendance committed"
        );
        flow.finish(ScanPhase::Committed);

        // Fire-and-forget advisory step; failures never touch the
        // committed record.
        let suggestion = self.fetch_suggestion(&record).await;

        Ok(CheckInOutcome::Committed { record, suggestion })
    }

    async fn fetch_suggestion(&self, record: &AttendanceRecord) -> Option<String> {
        let request = SuggestionRequest {
            student_id: record.student_id,
            session_id: record.session_id.clone(),
            subject: record.subject.clone(),
        };
        match self.suggestions.suggest(&request).await {
            Ok(text) => Some(text),
            Err(SuggestError::Disabled) => None,
            Err(err) => {
                warn!(%err, "suggestion collaborator failed, ignoring");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rollcall_qr::encode;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct CountingCamera {
        stops: Arc<AtomicUsize>,
    }

    impl CaptureSurface for CountingCamera {
        fn stop(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn malformed_frames_keep_scanning() {
        let stops = Arc::new(AtomicUsize::new(0));
        let mut flow = ScanFlow::begin(CountingCamera {
            stops: stops.clone(),
        });

        assert!(flow.on_frame("not-json").is_none());
        assert!(flow.on_frame("{\"half\":").is_none());
        assert_eq!(flow.phase(), ScanPhase::Scanning);
        assert_eq!(stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn decoded_frame_releases_camera_and_advances() {
        let stops = Arc::new(AtomicUsize::new(0));
        let mut flow = ScanFlow::begin(CountingCamera {
            stops: stops.clone(),
        });

        let payload = QrPayload::new("CS101-monday", "Data Structures", None, Utc::now());
        let decoded = flow.on_frame(&encode(&payload)).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(flow.phase(), ScanPhase::PayloadDecoded);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_releases_camera_and_returns_to_idle() {
        let stops = Arc::new(AtomicUsize::new(0));
        let mut flow = ScanFlow::begin(CountingCamera {
            stops: stops.clone(),
        });

        flow.cancel();
        assert_eq!(flow.phase(), ScanPhase::Idle);
        assert_eq!(stops.load(Ordering::SeqCst), 1);

        // Frames after cancellation are ignored.
        let payload = QrPayload::new("CS101-monday", "x", None, Utc::now());
        assert!(flow.on_frame(&encode(&payload)).is_none());
    }

    #[test]
    fn dropping_an_active_flow_stops_the_camera() {
        let stopped = Arc::new(AtomicBool::new(false));

        struct FlagCamera(Arc<AtomicBool>);
        impl CaptureSurface for FlagCamera {
            fn stop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        {
            let _flow = ScanFlow::begin(FlagCamera(stopped.clone()));
        }
        assert!(stopped.load(Ordering::SeqCst));
    }
}
