//! ROLLCALL Attend — Session issuance and the scan/validate/commit
//! check-in protocol.
//!
//! The issuer and validator never talk to each other directly; they
//! rendezvous only through the session and record stores.

pub mod challenge;
pub mod config;
pub mod error;
pub mod gates;
pub mod issuer;
pub mod suggest;
pub mod validator;

pub use config::AttendConfig;
pub use error::{IssueError, RejectReason};
pub use gates::{
    ChallengeOutcome, ConfirmationPrompt, CredentialChallenger, GateEvidence, GateKind, GateStep,
    LocationProvider, NoVerification, PositionError, VerificationChain, Verifier,
};
pub use issuer::{GenerateSession, IssuedSession, SessionIssuer};
pub use suggest::{NoSuggestions, SuggestError, SuggestionClient, SuggestionRequest};
pub use validator::{
    CaptureSurface, CheckInOutcome, NullCapture, ScanFlow, ScanPhase, ScanValidator,
};
