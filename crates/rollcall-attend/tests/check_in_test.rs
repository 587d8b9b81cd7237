//! End-to-end check-in protocol tests: issuance through scan,
//! validation, gates, and commit, over in-memory stores and a
//! manually advanced clock.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{
    MemoryRecordStore, MemorySessionStore, StaleFindRecordStore, UnavailableSessionStore,
};
use rollcall_attend::suggest::{SuggestError, SuggestionClient, SuggestionRequest};
use rollcall_attend::{
    AttendConfig, CheckInOutcome, GenerateSession, NoSuggestions, NoVerification, ScanFlow,
    ScanPhase, ScanValidator, SessionIssuer,
};
use rollcall_core::clock::ManualClock;
use rollcall_core::error::RollcallError;
use rollcall_core::models::principal::{Principal, Role};
use rollcall_qr::QrPayload;
use uuid::Uuid;

fn faculty() -> Principal {
    Principal::new(Uuid::new_v4(), "Dr. Rao", Role::Faculty)
}

fn student() -> Principal {
    Principal::new(Uuid::new_v4(), "Asha", Role::Student)
}

fn issuer(
    sessions: MemorySessionStore,
    clock: Arc<ManualClock>,
) -> SessionIssuer<MemorySessionStore, Arc<ManualClock>> {
    SessionIssuer::new(sessions, clock, faculty(), AttendConfig::default())
}

fn validator(
    sessions: MemorySessionStore,
    records: MemoryRecordStore,
    clock: Arc<ManualClock>,
    principal: Principal,
) -> ScanValidator<MemorySessionStore, MemoryRecordStore, Arc<ManualClock>, NoVerification, NoSuggestions>
{
    ScanValidator::new(
        sessions,
        records,
        clock,
        NoVerification,
        NoSuggestions,
        principal,
    )
}

fn generate_input() -> GenerateSession {
    GenerateSession {
        session_id: None,
        class_id: "CS101".into(),
        subject: "Data Structures".into(),
        validity: None,
    }
}

#[tokio::test]
async fn scan_inside_window_commits_one_record() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let sessions = MemorySessionStore::default();
    let records = MemoryRecordStore::default();

    let issued = issuer(sessions.clone(), clock.clone())
        .generate(generate_input())
        .await
        .unwrap();

    let asha = student();
    let validator = validator(sessions, records.clone(), clock.clone(), asha.clone());

    // Scan at t=89, one second before the 90 s window closes.
    clock.advance(Duration::seconds(89));
    let mut flow = ScanFlow::detached();
    let payload = rollcall_qr::decode(&issued.payload_text).unwrap();
    let outcome = validator.check_in(&mut flow, &payload).await.unwrap();

    let CheckInOutcome::Committed { record, suggestion } = outcome else {
        panic!("expected commit, got {outcome:?}");
    };
    assert_eq!(record.subject, "Data Structures");
    assert_eq!(record.status, "present");
    assert!(!record.biometric_verified);
    assert_eq!(suggestion, None);
    assert_eq!(flow.phase(), ScanPhase::Committed);
    assert_eq!(records.count_for(asha.id, &issued.session.session_id), 1);
}

#[tokio::test]
async fn second_scan_by_same_student_is_already_marked() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let sessions = MemorySessionStore::default();
    let records = MemoryRecordStore::default();

    let issued = issuer(sessions.clone(), clock.clone())
        .generate(generate_input())
        .await
        .unwrap();

    let asha = student();
    let validator = validator(sessions, records.clone(), clock.clone(), asha.clone());
    let payload = rollcall_qr::decode(&issued.payload_text).unwrap();

    clock.advance(Duration::seconds(89));
    let mut first = ScanFlow::detached();
    validator.check_in(&mut first, &payload).await.unwrap();

    // t=90: duplicate attempt. Soft outcome, no second record.
    clock.advance(Duration::seconds(1));
    let mut second = ScanFlow::detached();
    let outcome = validator.check_in(&mut second, &payload).await.unwrap();

    assert!(matches!(outcome, CheckInOutcome::AlreadyMarked { .. }));
    assert_eq!(records.count_for(asha.id, &issued.session.session_id), 1);
}

#[tokio::test]
async fn scan_after_expiry_is_rejected_with_no_record() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let sessions = MemorySessionStore::default();
    let records = MemoryRecordStore::default();

    let issued = issuer(sessions.clone(), clock.clone())
        .generate(generate_input())
        .await
        .unwrap();

    // A different student scans at t=95, after the 90 s window.
    clock.advance(Duration::seconds(95));
    let late = student();
    let validator = validator(sessions, records.clone(), clock.clone(), late.clone());
    let payload = rollcall_qr::decode(&issued.payload_text).unwrap();

    let mut flow = ScanFlow::detached();
    let outcome = validator.check_in(&mut flow, &payload).await.unwrap();

    assert!(matches!(
        outcome,
        CheckInOutcome::Rejected(rollcall_attend::RejectReason::SessionExpired)
    ));
    assert_eq!(flow.phase(), ScanPhase::Rejected);
    assert_eq!(records.count_for(late.id, &issued.session.session_id), 0);
}

#[tokio::test]
async fn expiry_is_enforced_by_wall_clock_even_while_flag_lags() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let sessions = MemorySessionStore::default();
    let records = MemoryRecordStore::default();

    let issued = issuer(sessions.clone(), clock.clone())
        .generate(generate_input())
        .await
        .unwrap();

    // Time passes the window but nobody revoked: is_active still true.
    clock.advance(Duration::seconds(120));
    assert!(sessions.snapshot(&issued.session.session_id).unwrap().is_active);

    let validator = validator(sessions, records, clock.clone(), student());
    let payload = rollcall_qr::decode(&issued.payload_text).unwrap();
    let mut flow = ScanFlow::detached();
    let outcome = validator.check_in(&mut flow, &payload).await.unwrap();

    assert!(matches!(
        outcome,
        CheckInOutcome::Rejected(rollcall_attend::RejectReason::SessionExpired)
    ));
}

#[tokio::test]
async fn revoked_session_rejects_before_expiry() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let sessions = MemorySessionStore::default();
    let records = MemoryRecordStore::default();

    let issuer = issuer(sessions.clone(), clock.clone());
    let issued = issuer.generate(generate_input()).await.unwrap();
    issuer.revoke(&issued.session.session_id).await.unwrap();

    clock.advance(Duration::seconds(10));
    let validator = validator(sessions, records, clock.clone(), student());
    let payload = rollcall_qr::decode(&issued.payload_text).unwrap();
    let mut flow = ScanFlow::detached();
    let outcome = validator.check_in(&mut flow, &payload).await.unwrap();

    assert!(matches!(
        outcome,
        CheckInOutcome::Rejected(rollcall_attend::RejectReason::SessionExpired)
    ));
}

#[tokio::test]
async fn unknown_session_is_rejected() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let validator = validator(
        MemorySessionStore::default(),
        MemoryRecordStore::default(),
        clock,
        student(),
    );

    let payload = QrPayload::new("never-issued", "Ghost Class", None, Utc::now());
    let mut flow = ScanFlow::detached();
    let outcome = validator.check_in(&mut flow, &payload).await.unwrap();

    assert!(matches!(
        outcome,
        CheckInOutcome::Rejected(rollcall_attend::RejectReason::SessionNotFound)
    ));
}

#[tokio::test]
async fn malformed_frame_makes_no_store_calls_and_keeps_scanning() {
    // The flow alone handles undecodable frames; no validator (and
    // therefore no store) is ever involved.
    let mut flow = ScanFlow::begin(rollcall_attend::NullCapture);
    assert!(flow.on_frame("not-json").is_none());
    assert_eq!(flow.phase(), ScanPhase::Scanning);
}

#[tokio::test]
async fn concurrent_attempts_yield_one_record_and_already_marked() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let sessions = MemorySessionStore::default();
    let records = MemoryRecordStore::default();

    let issued = issuer(sessions.clone(), clock.clone())
        .generate(generate_input())
        .await
        .unwrap();
    let payload = rollcall_qr::decode(&issued.payload_text).unwrap();

    let asha = student();
    let validator = validator(sessions, records.clone(), clock.clone(), asha.clone());

    let mut commits = 0;
    let mut already = 0;
    let (a, b, c) = tokio::join!(
        async {
            let mut flow = ScanFlow::detached();
            validator.check_in(&mut flow, &payload).await.unwrap()
        },
        async {
            let mut flow = ScanFlow::detached();
            validator.check_in(&mut flow, &payload).await.unwrap()
        },
        async {
            let mut flow = ScanFlow::detached();
            validator.check_in(&mut flow, &payload).await.unwrap()
        },
    );
    for outcome in [a, b, c] {
        match outcome {
            CheckInOutcome::Committed { .. } => commits += 1,
            CheckInOutcome::AlreadyMarked { .. } => already += 1,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    assert_eq!(commits, 1);
    assert_eq!(already, 2);
    assert_eq!(records.count_for(asha.id, &issued.session.session_id), 1);
}

#[tokio::test]
async fn write_conflict_with_stale_precheck_maps_to_already_marked() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let sessions = MemorySessionStore::default();
    let backing = MemoryRecordStore::default();
    let stale = StaleFindRecordStore(backing.clone());

    let issued = issuer(sessions.clone(), clock.clone())
        .generate(generate_input())
        .await
        .unwrap();
    let payload = rollcall_qr::decode(&issued.payload_text).unwrap();

    let asha = student();
    let validator = ScanValidator::new(
        sessions,
        stale,
        clock.clone(),
        NoVerification,
        NoSuggestions,
        asha.clone(),
    );

    let mut first = ScanFlow::detached();
    let outcome = validator.check_in(&mut first, &payload).await.unwrap();
    assert!(matches!(outcome, CheckInOutcome::Committed { .. }));

    // Pre-check sees nothing; the insert-time uniqueness guard must
    // catch the duplicate and map it to the soft outcome.
    let mut second = ScanFlow::detached();
    let outcome = validator.check_in(&mut second, &payload).await.unwrap();
    assert!(matches!(outcome, CheckInOutcome::AlreadyMarked { .. }));
    assert_eq!(backing.count_for(asha.id, &issued.session.session_id), 1);
}

#[tokio::test]
async fn store_outage_aborts_to_idle_without_partial_state() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let records = MemoryRecordStore::default();
    let validator = ScanValidator::new(
        UnavailableSessionStore,
        records.clone(),
        clock,
        NoVerification,
        NoSuggestions,
        student(),
    );

    let payload = QrPayload::new("CS101-monday", "Data Structures", None, Utc::now());
    let mut flow = ScanFlow::detached();
    let err = validator.check_in(&mut flow, &payload).await.unwrap_err();

    assert!(matches!(err, RollcallError::StoreUnavailable(_)));
    assert_eq!(flow.phase(), ScanPhase::Idle);
    assert_eq!(records.total(), 0);
}

#[tokio::test]
async fn suggestion_failure_does_not_affect_the_commit() {
    struct BrokenSuggestions;
    impl SuggestionClient for BrokenSuggestions {
        async fn suggest(&self, _request: &SuggestionRequest) -> Result<String, SuggestError> {
            Err(SuggestError::Request("upstream 500".into()))
        }
    }

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let sessions = MemorySessionStore::default();
    let records = MemoryRecordStore::default();

    let issued = issuer(sessions.clone(), clock.clone())
        .generate(generate_input())
        .await
        .unwrap();
    let payload = rollcall_qr::decode(&issued.payload_text).unwrap();

    let asha = student();
    let validator = ScanValidator::new(
        sessions,
        records.clone(),
        clock,
        NoVerification,
        BrokenSuggestions,
        asha.clone(),
    );

    let mut flow = ScanFlow::detached();
    let outcome = validator.check_in(&mut flow, &payload).await.unwrap();

    let CheckInOutcome::Committed { suggestion, .. } = outcome else {
        panic!("expected commit");
    };
    assert_eq!(suggestion, None);
    assert_eq!(records.count_for(asha.id, &issued.session.session_id), 1);
}
