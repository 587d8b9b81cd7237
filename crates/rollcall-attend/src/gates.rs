//! The verification chain: ordered, pluggable gates between scan
//! acceptance and record commit.
//!
//! Gates are a tagged list evaluated in declared order. The chain
//! short-circuits on the first denial. A gate the platform cannot
//! run reports `Unsupported`, which either falls back to the step's
//! declared alternate gate or skips the step with a warning — it is
//! never silently treated as an acceptance.

use rollcall_core::geo::GeoPoint;
use rollcall_core::models::principal::Principal;
use rollcall_core::models::session::AttendanceSession;
use tracing::{debug, warn};

use crate::challenge::generate_challenge;
use crate::config::AttendConfig;
use crate::error::RejectReason;

/// One verification step variant.
#[derive(Debug, Clone, PartialEq)]
pub enum GateKind {
    /// Device-bound credential challenge (platform biometric).
    Credential,
    /// Geographic proximity to a reference point.
    Location { reference: GeoPoint },
    /// Explicit user confirmation; the usual fallback when the
    /// platform lacks a credential authenticator.
    ManualConfirm,
}

/// A gate plus its optional alternate of equivalent strength.
#[derive(Debug, Clone, PartialEq)]
pub struct GateStep {
    pub gate: GateKind,
    pub fallback: Option<GateKind>,
}

impl GateStep {
    pub fn required(gate: GateKind) -> Self {
        Self {
            gate,
            fallback: None,
        }
    }

    pub fn with_fallback(gate: GateKind, fallback: GateKind) -> Self {
        Self {
            gate,
            fallback: Some(fallback),
        }
    }
}

/// What the chain proved about this check-in. Folded into the
/// committed record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GateEvidence {
    /// True iff a credential gate (not a manual fallback) ran and
    /// passed.
    pub biometric_verified: bool,
    /// The accepted device position, when a location gate ran.
    pub location: Option<GeoPoint>,
}

/// Result of the platform credential challenge. Opaque pass/fail
/// from the protocol's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOutcome {
    Verified,
    Denied,
    /// No platform authenticator is available.
    Unsupported,
}

/// Failure modes of a one-shot position request. These stay distinct
/// all the way to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionError {
    PermissionDenied,
    Unavailable,
    Timeout,
}

/// Platform credential challenge/response surface.
pub trait CredentialChallenger: Send + Sync {
    fn attempt(
        &self,
        principal: &Principal,
        session_id: &str,
        challenge: &str,
    ) -> impl Future<Output = ChallengeOutcome> + Send;
}

/// One-shot device position surface.
pub trait LocationProvider: Send + Sync {
    fn current_position(&self) -> impl Future<Output = Result<GeoPoint, PositionError>> + Send;
}

/// Explicit user confirmation surface.
pub trait ConfirmationPrompt: Send + Sync {
    fn confirm(&self, message: &str) -> impl Future<Output = bool> + Send;
}

/// Anything that stands between scan acceptance and record commit.
pub trait Verifier: Send + Sync {
    fn verify(
        &self,
        principal: &Principal,
        session: &AttendanceSession,
    ) -> impl Future<Output = Result<GateEvidence, RejectReason>> + Send;
}

/// The plain-scan variant: no gates configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVerification;

impl Verifier for NoVerification {
    async fn verify(
        &self,
        _principal: &Principal,
        _session: &AttendanceSession,
    ) -> Result<GateEvidence, RejectReason> {
        Ok(GateEvidence::default())
    }
}

enum GateResult {
    Accepted {
        biometric: bool,
        location: Option<GeoPoint>,
    },
    Denied(RejectReason),
    Unsupported,
}

/// Ordered gate list bound to its platform surfaces.
pub struct VerificationChain<P, L, M> {
    steps: Vec<GateStep>,
    credential: P,
    location: L,
    confirm: M,
    radius_m: f64,
    position_timeout: std::time::Duration,
}

impl<P, L, M> VerificationChain<P, L, M>
where
    P: CredentialChallenger,
    L: LocationProvider,
    M: ConfirmationPrompt,
{
    pub fn new(steps: Vec<GateStep>, credential: P, location: L, confirm: M) -> Self {
        let config = AttendConfig::default();
        Self {
            steps,
            credential,
            location,
            confirm,
            radius_m: config.location_radius_m,
            position_timeout: config.position_timeout,
        }
    }

    pub fn with_config(mut self, config: &AttendConfig) -> Self {
        self.radius_m = config.location_radius_m;
        self.position_timeout = config.position_timeout;
        self
    }

    async fn run_gate(
        &self,
        gate: &GateKind,
        principal: &Principal,
        session: &AttendanceSession,
    ) -> GateResult {
        match gate {
            GateKind::Credential => {
                let challenge = generate_challenge();
                match self
                    .credential
                    .attempt(principal, &session.session_id, &challenge)
                    .await
                {
                    ChallengeOutcome::Verified => GateResult::Accepted {
                        biometric: true,
                        location: None,
                    },
                    ChallengeOutcome::Denied => GateResult::Denied(RejectReason::CredentialDenied),
                    ChallengeOutcome::Unsupported => GateResult::Unsupported,
                }
            }
            GateKind::Location { reference } => {
                let position =
                    tokio::time::timeout(self.position_timeout, self.location.current_position())
                        .await;
                match position {
                    Err(_elapsed) => GateResult::Denied(RejectReason::LocationTimeout),
                    Ok(Err(PositionError::PermissionDenied)) => {
                        GateResult::Denied(RejectReason::LocationPermissionDenied)
                    }
                    Ok(Err(PositionError::Unavailable)) => {
                        GateResult::Denied(RejectReason::LocationUnavailable)
                    }
                    Ok(Err(PositionError::Timeout)) => {
                        GateResult::Denied(RejectReason::LocationTimeout)
                    }
                    Ok(Ok(point)) => {
                        let distance_m = reference.distance_m(&point);
                        debug!(session_id = %session.session_id, distance_m, "location gate");
                        if distance_m <= self.radius_m {
                            GateResult::Accepted {
                                biometric: false,
                                location: Some(point),
                            }
                        } else {
                            GateResult::Denied(RejectReason::OutOfRadius { distance_m })
                        }
                    }
                }
            }
            GateKind::ManualConfirm => {
                let message = format!(
                    "Confirm you are present in {} ({})",
                    session.subject, session.class_id
                );
                if self.confirm.confirm(&message).await {
                    // Manual confirmation does not count as biometric
                    // proof.
                    GateResult::Accepted {
                        biometric: false,
                        location: None,
                    }
                } else {
                    GateResult::Denied(RejectReason::CredentialDenied)
                }
            }
        }
    }
}

impl<P, L, M> Verifier for VerificationChain<P, L, M>
where
    P: CredentialChallenger,
    L: LocationProvider,
    M: ConfirmationPrompt,
{
    async fn verify(
        &self,
        principal: &Principal,
        session: &AttendanceSession,
    ) -> Result<GateEvidence, RejectReason> {
        let mut evidence = GateEvidence::default();

        for step in &self.steps {
            let result = match self.run_gate(&step.gate, principal, session).await {
                GateResult::Unsupported => match &step.fallback {
                    Some(alternate) => {
                        debug!(?step.gate, ?alternate, "gate unsupported, trying fallback");
                        self.run_gate(alternate, principal, session).await
                    }
                    None => {
                        warn!(?step.gate, "gate unsupported and no fallback, skipping");
                        continue;
                    }
                },
                other => other,
            };

            match result {
                GateResult::Accepted {
                    biometric,
                    location,
                } => {
                    evidence.biometric_verified |= biometric;
                    if location.is_some() {
                        evidence.location = location;
                    }
                }
                GateResult::Denied(reason) => return Err(reason),
                GateResult::Unsupported => {
                    warn!(?step.gate, "fallback gate unsupported too, skipping");
                }
            }
        }

        Ok(evidence)
    }
}
