//! Faculty-side session issuance.

use chrono::Duration;
use rollcall_core::clock::Clock;
use rollcall_core::models::principal::Principal;
use rollcall_core::models::session::{
    AttendanceSession, CreateAttendanceSession, generate_session_id, validate_session_id,
};
use rollcall_core::repository::SessionRepository;
use rollcall_qr::{QrPayload, encode, render_svg};
use tracing::{debug, info};

use crate::config::AttendConfig;
use crate::error::IssueError;

/// Input for issuing a session.
#[derive(Debug, Clone, Default)]
pub struct GenerateSession {
    /// Caller-chosen identifier; a random one is generated when
    /// absent.
    pub session_id: Option<String>,
    pub class_id: String,
    pub subject: String,
    /// Per-session override of the configured validity window.
    pub validity: Option<Duration>,
}

/// A freshly issued session plus its scannable artifact.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session: AttendanceSession,
    /// The exact text embedded in the symbol.
    pub payload_text: String,
    /// Rendered SVG symbol.
    pub symbol_svg: String,
}

/// Issues, revokes, and expires attendance sessions on behalf of one
/// faculty principal.
///
/// Generic over the session store and the clock so the flow can be
/// exercised deterministically in tests.
pub struct SessionIssuer<S: SessionRepository, C: Clock> {
    sessions: S,
    clock: C,
    principal: Principal,
    config: AttendConfig,
}

impl<S: SessionRepository, C: Clock> SessionIssuer<S, C> {
    pub fn new(sessions: S, clock: C, principal: Principal, config: AttendConfig) -> Self {
        Self {
            sessions,
            clock,
            principal,
            config,
        }
    }

    /// Issue a new session and render its QR symbol.
    ///
    /// Issuing supersedes: any still-active session previously
    /// created by this principal is deactivated first, so at most one
    /// session per faculty screen is live at a time.
    pub async fn generate(&self, input: GenerateSession) -> Result<IssuedSession, IssueError> {
        let now = self.clock.now();

        // 1. Resolve and validate the identifier before any store
        //    write.
        let session_id = match input.session_id {
            Some(id) => {
                validate_session_id(&id)?;
                id
            }
            None => generate_session_id(),
        };

        // 2. Collision guard: a still-usable session owns its id.
        if let Some(existing) = self.sessions.get(&session_id).await? {
            if existing.is_usable(now) {
                return Err(IssueError::SessionIdInUse(session_id));
            }
        }

        // 3. Supersede whatever this principal had on screen.
        let superseded = self.sessions.deactivate_for_issuer(self.principal.id).await?;
        if superseded > 0 {
            debug!(issuer = %self.principal.id, superseded, "deactivated previous sessions");
        }

        // 4. Persist.
        let validity = input.validity.unwrap_or(self.config.validity);
        let session = self
            .sessions
            .insert(CreateAttendanceSession {
                session_id,
                class_id: input.class_id,
                subject: input.subject,
                created_by: self.principal.id,
                created_at: now,
                expires_at: now + validity,
            })
            .await?;

        // 5. Render the scannable artifact.
        let issued_by = self.config.embed_issuer.then_some(self.principal.id);
        let payload = QrPayload::new(&session.session_id, &session.subject, issued_by, now);
        let payload_text = encode(&payload);
        let symbol_svg = render_svg(&payload_text)?;

        info!(
            session_id = %session.session_id,
            class_id = %session.class_id,
            expires_at = %session.expires_at,
            "attendance session issued"
        );

        Ok(IssuedSession {
            session,
            payload_text,
            symbol_svg,
        })
    }

    /// Deactivate a session. Idempotent: revoking an already-inactive
    /// or unknown session is a no-op.
    pub async fn revoke(&self, session_id: &str) -> Result<(), IssueError> {
        self.sessions.set_active(session_id, false).await?;
        info!(session_id, "attendance session revoked");
        Ok(())
    }

    /// Seconds of validity left on a session, clamped at zero. Drives
    /// the issuer-side countdown display; the authoritative expiry
    /// check always happens at validation time.
    pub fn remaining(&self, session: &AttendanceSession) -> Duration {
        (session.expires_at - self.clock.now()).max(Duration::zero())
    }

    /// Countdown tick: revoke the session once its window has
    /// elapsed. Returns whether a revocation happened.
    pub async fn expire_if_due(&self, session: &AttendanceSession) -> Result<bool, IssueError> {
        if !session.is_expired(self.clock.now()) {
            return Ok(false);
        }
        if session.is_active {
            self.revoke(&session.session_id).await?;
        }
        Ok(true)
    }
}
