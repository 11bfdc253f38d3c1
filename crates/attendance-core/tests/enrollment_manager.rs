// crates/attendance-core/tests/enrollment_manager.rs
// ============================================================================
// Module: Enrollment Manager Tests
// Description: Lifecycle, ordering, and concurrency checks for enrollments.
// Purpose: Pin the enrollment state machine against the in-memory store.
// Dependencies: attendance-core
// ============================================================================

//! ## Overview
//! Drives [`EnrollmentManager`] through enroll, status, unenroll, and
//! reporting flows. A counting store wrapper proves anonymous callers are
//! rejected before any store access.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;

use attendance_core::Account;
use attendance_core::AccountId;
use attendance_core::AttendeeView;
use attendance_core::EnrolledProgramView;
use attendance_core::Enrollment;
use attendance_core::EnrollmentError;
use attendance_core::EnrollmentManager;
use attendance_core::EnrollmentStatus;
use attendance_core::EnrollmentStore;
use attendance_core::Identity;
use attendance_core::InMemoryAttendanceStore;
use attendance_core::InsertOutcome;
use attendance_core::ManualClock;
use attendance_core::Program;
use attendance_core::ProgramCatalog;
use attendance_core::ProgramId;
use attendance_core::SharedAttendanceStore;
use attendance_core::StoreError;
use attendance_core::Timestamp;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn program_id(raw: u64) -> ProgramId {
    ProgramId::from_raw(raw).expect("nonzero program id")
}

fn account_id(raw: u64) -> AccountId {
    AccountId::from_raw(raw).expect("nonzero account id")
}

fn member(raw: u64) -> Identity {
    Identity::Account(account_id(raw))
}

struct Fixture {
    store: InMemoryAttendanceStore,
    clock: ManualClock,
    manager: EnrollmentManager,
}

fn fixture() -> Fixture {
    let store = InMemoryAttendanceStore::new();
    store.upsert_program(Program::new(program_id(1), "Grief Support Circle")).unwrap();
    store.upsert_program(Program::new(program_id(2), "Mindful Parenting")).unwrap();
    store.upsert_program(Program::new(program_id(3), "Retired Workshop").disabled(true)).unwrap();
    store
        .upsert_account(Account {
            account_id: account_id(7),
            username: "ana".to_string(),
            full_name: Some("Ana Reyes".to_string()),
        })
        .unwrap();
    store
        .upsert_account(Account {
            account_id: account_id(8),
            username: "ben".to_string(),
            full_name: None,
        })
        .unwrap();
    let clock = ManualClock::new(Timestamp::from_unix_millis(1_700_000_000_000));
    let manager = EnrollmentManager::new(
        SharedAttendanceStore::from_store(store.clone()),
        Arc::new(clock.clone()),
    );
    Fixture {
        store,
        clock,
        manager,
    }
}

/// Store wrapper that counts every call reaching the backend.
struct CountingStore {
    inner: InMemoryAttendanceStore,
    calls: Arc<AtomicUsize>,
}

impl CountingStore {
    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl ProgramCatalog for CountingStore {
    fn find_active_by_id(&self, program_id: ProgramId) -> Result<Option<Program>, StoreError> {
        self.touch();
        self.inner.find_active_by_id(program_id)
    }

    fn list_active(&self) -> Result<Vec<Program>, StoreError> {
        self.touch();
        self.inner.list_active()
    }
}

impl EnrollmentStore for CountingStore {
    fn find_enrollment(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<Option<Enrollment>, StoreError> {
        self.touch();
        self.inner.find_enrollment(program_id, account_id)
    }

    fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<InsertOutcome, StoreError> {
        self.touch();
        self.inner.insert_enrollment(enrollment)
    }

    fn delete_enrollment(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<bool, StoreError> {
        self.touch();
        self.inner.delete_enrollment(program_id, account_id)
    }

    fn list_enrolled_programs(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<EnrolledProgramView>, StoreError> {
        self.touch();
        self.inner.list_enrolled_programs(account_id)
    }

    fn list_attendees(
        &self,
        program_id: Option<ProgramId>,
    ) -> Result<Vec<AttendeeView>, StoreError> {
        self.touch();
        self.inner.list_attendees(program_id)
    }

    fn find_attendee(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<Option<AttendeeView>, StoreError> {
        self.touch();
        self.inner.find_attendee(program_id, account_id)
    }

    fn count_attendees(&self, program_id: ProgramId) -> Result<u64, StoreError> {
        self.touch();
        self.inner.count_attendees(program_id)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn enroll_then_status_reports_registered() {
    let fx = fixture();
    let record = fx.manager.enroll_in_program(program_id(1), member(7)).unwrap();
    assert_eq!(record.program_id, program_id(1));
    assert_eq!(record.program_name, "Grief Support Circle");
    assert_eq!(record.status, EnrollmentStatus::Registered);

    let state = fx.manager.check_enrollment_status(program_id(1), member(7)).unwrap();
    assert!(state.is_enrolled);
    assert_eq!(state.status, Some(EnrollmentStatus::Registered));
    assert_eq!(state.registration_date, Some(Timestamp::from_unix_millis(1_700_000_000_000)));
}

#[test]
fn status_without_enrollment_is_empty() {
    let fx = fixture();
    let state = fx.manager.check_enrollment_status(program_id(1), member(7)).unwrap();
    assert!(!state.is_enrolled);
    assert!(state.status.is_none());
    assert!(state.registration_date.is_none());
}

#[test]
fn second_enroll_conflicts_and_keeps_one_row() {
    let fx = fixture();
    fx.manager.enroll_in_program(program_id(1), member(7)).unwrap();
    let err = fx.manager.enroll_in_program(program_id(1), member(7)).unwrap_err();
    assert_eq!(
        err,
        EnrollmentError::AlreadyEnrolled {
            status: EnrollmentStatus::Registered,
        }
    );
    assert_eq!(fx.store.enrollment_count().unwrap(), 1);
    assert_eq!(fx.manager.total_attendees(program_id(1)).unwrap().total, 1);
}

#[test]
fn conflict_preserves_original_registration_date() {
    let fx = fixture();
    fx.manager.enroll_in_program(program_id(1), member(7)).unwrap();
    fx.clock.advance_millis(60_000);
    let _ = fx.manager.enroll_in_program(program_id(1), member(7));
    let state = fx.manager.check_enrollment_status(program_id(1), member(7)).unwrap();
    assert_eq!(state.registration_date, Some(Timestamp::from_unix_millis(1_700_000_000_000)));
}

#[test]
fn unenroll_without_enrollment_is_not_found() {
    let fx = fixture();
    let err = fx.manager.unenroll_from_program(program_id(1), member(7)).unwrap_err();
    assert_eq!(err, EnrollmentError::EnrollmentNotFound);
}

#[test]
fn enroll_unenroll_status_round_trip() {
    let fx = fixture();
    fx.manager.enroll_in_program(program_id(2), member(7)).unwrap();
    let confirmation = fx.manager.unenroll_from_program(program_id(2), member(7)).unwrap();
    assert_eq!(confirmation.program_id, program_id(2));
    let state = fx.manager.check_enrollment_status(program_id(2), member(7)).unwrap();
    assert!(!state.is_enrolled);
    let again = fx.manager.unenroll_from_program(program_id(2), member(7)).unwrap_err();
    assert_eq!(again, EnrollmentError::EnrollmentNotFound);
}

#[test]
fn disabled_or_missing_program_rejects_enrollment() {
    let fx = fixture();
    let disabled = fx.manager.enroll_in_program(program_id(3), member(7)).unwrap_err();
    assert_eq!(disabled, EnrollmentError::ProgramNotFound);
    let missing = fx.manager.enroll_in_program(program_id(99), member(7)).unwrap_err();
    assert_eq!(missing, EnrollmentError::ProgramNotFound);
    assert_eq!(fx.store.enrollment_count().unwrap(), 0);
}

#[test]
fn my_programs_orders_newest_registration_first() {
    let fx = fixture();
    fx.manager.enroll_in_program(program_id(1), member(7)).unwrap();
    fx.clock.advance_millis(1_000);
    fx.manager.enroll_in_program(program_id(2), member(7)).unwrap();
    fx.manager.enroll_in_program(program_id(1), member(8)).unwrap();

    let mine = fx.manager.my_enrolled_programs(member(7)).unwrap();
    assert_eq!(mine.total, 2);
    let ids: Vec<ProgramId> = mine.data.iter().map(|row| row.program.program_id).collect();
    assert_eq!(ids, vec![program_id(2), program_id(1)]);
    assert!(mine.data[0].registration_date > mine.data[1].registration_date);
}

#[test]
fn my_programs_hides_programs_disabled_after_enrollment() {
    let fx = fixture();
    fx.manager.enroll_in_program(program_id(1), member(7)).unwrap();
    fx.store.upsert_program(Program::new(program_id(1), "Grief Support Circle").disabled(true)).unwrap();
    let mine = fx.manager.my_enrolled_programs(member(7)).unwrap();
    assert_eq!(mine.total, 0);
    assert!(mine.data.is_empty());
}

#[test]
fn attendee_views_join_program_and_account() {
    let fx = fixture();
    fx.manager.enroll_in_program(program_id(1), member(7)).unwrap();
    fx.clock.advance_millis(10);
    fx.manager.enroll_in_program(program_id(1), member(8)).unwrap();
    fx.clock.advance_millis(10);
    fx.manager.enroll_in_program(program_id(2), member(7)).unwrap();

    let all = fx.manager.all_program_attendees(member(7)).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].program_id, program_id(2));

    let scoped = fx.manager.program_attendees(program_id(1), member(7)).unwrap();
    let accounts: Vec<AccountId> = scoped.iter().map(|row| row.account_id).collect();
    assert_eq!(accounts, vec![account_id(8), account_id(7)]);

    let row = fx.manager.attendee_by_id(program_id(1), account_id(7), member(8)).unwrap();
    assert_eq!(row.username, "ana");
    assert_eq!(row.full_name.as_deref(), Some("Ana Reyes"));
    assert_eq!(row.program_name, "Grief Support Circle");
}

#[test]
fn missing_attendee_is_not_found() {
    let fx = fixture();
    let err = fx.manager.attendee_by_id(program_id(1), account_id(7), member(7)).unwrap_err();
    assert_eq!(err, EnrollmentError::AttendeeNotFound);
}

#[test]
fn unknown_program_counts_zero() {
    let fx = fixture();
    assert_eq!(fx.manager.total_attendees(program_id(404)).unwrap().total, 0);
}

#[test]
fn catalog_lists_only_active_programs_by_date() {
    let fx = fixture();
    let mut dated = Program::new(program_id(2), "Mindful Parenting");
    dated.date = Some(Timestamp::from_unix_millis(2_000));
    fx.store.upsert_program(dated).unwrap();
    let mut later = Program::new(program_id(4), "Career Clinic");
    later.date = Some(Timestamp::from_unix_millis(5_000));
    fx.store.upsert_program(later).unwrap();

    let ids: Vec<ProgramId> =
        fx.manager.active_programs().unwrap().iter().map(|program| program.program_id).collect();
    assert_eq!(ids, vec![program_id(4), program_id(2), program_id(1)]);
    assert_eq!(fx.manager.program(program_id(3)).unwrap_err(), EnrollmentError::ProgramNotFound);
}

#[test]
fn anonymous_callers_never_reach_the_store() {
    let calls = Arc::new(AtomicUsize::new(0));
    let inner = InMemoryAttendanceStore::new();
    inner.upsert_program(Program::new(program_id(1), "Grief Support Circle")).unwrap();
    let store = CountingStore {
        inner,
        calls: Arc::clone(&calls),
    };
    let manager = EnrollmentManager::new(
        SharedAttendanceStore::from_store(store),
        Arc::new(ManualClock::default()),
    );
    let anonymous = Identity::Anonymous;

    assert_eq!(
        manager.check_enrollment_status(program_id(1), anonymous).unwrap_err(),
        EnrollmentError::Unauthenticated
    );
    assert_eq!(
        manager.enroll_in_program(program_id(1), anonymous).unwrap_err(),
        EnrollmentError::Unauthenticated
    );
    assert_eq!(
        manager.unenroll_from_program(program_id(1), anonymous).unwrap_err(),
        EnrollmentError::Unauthenticated
    );
    assert_eq!(
        manager.my_enrolled_programs(anonymous).unwrap_err(),
        EnrollmentError::Unauthenticated
    );
    assert_eq!(
        manager.all_program_attendees(anonymous).unwrap_err(),
        EnrollmentError::Unauthenticated
    );
    assert_eq!(
        manager.attendee_by_id(program_id(1), account_id(7), anonymous).unwrap_err(),
        EnrollmentError::Unauthenticated
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn concurrent_enrolls_create_exactly_one_row() {
    let fx = fixture();
    let workers = 16;
    let handles: Vec<_> = (0 .. workers)
        .map(|_| {
            let manager = fx.manager.clone();
            thread::spawn(move || manager.enroll_in_program(program_id(1), member(7)))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();

    let created = results.iter().filter(|result| result.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|result| matches!(result, Err(EnrollmentError::AlreadyEnrolled { .. })))
        .count();
    assert_eq!(created, 1);
    assert_eq!(conflicts, workers - 1);
    assert_eq!(fx.store.enrollment_count().unwrap(), 1);
}

#[test]
fn state_view_serializes_camel_case() {
    let fx = fixture();
    fx.manager.enroll_in_program(program_id(1), member(7)).unwrap();
    let state = fx.manager.check_enrollment_status(program_id(1), member(7)).unwrap();
    let value = serde_json::to_value(&state).unwrap();
    assert_eq!(value["isEnrolled"], true);
    assert_eq!(value["status"], "registered");
    assert_eq!(value["registrationDate"], "2023-11-14T22:13:20Z");

    let empty = serde_json::to_value(attendance_core::EnrollmentState::not_enrolled()).unwrap();
    assert!(empty["status"].is_null());
    assert!(empty["registrationDate"].is_null());
}
