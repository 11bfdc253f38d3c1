// crates/attendance-core/src/runtime/store.rs
// ============================================================================
// Module: Attendance Stores
// Description: In-memory store and the shared store handle.
// Purpose: Provide a test-friendly backend and a cloneable trait-object wrapper.
// Dependencies: crate::interfaces, crate::model
// ============================================================================

//! ## Overview
//! [`InMemoryAttendanceStore`] keeps programs, accounts, and enrollments in
//! ordered maps behind one mutex. Every operation holds the guard for its full
//! duration, so the duplicate check and insert in
//! [`EnrollmentStore::insert_enrollment`] are atomic.
//!
//! [`SharedAttendanceStore`] wraps any backend behind an `Arc` so hosts can
//! hand the same store to many request handlers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::interfaces::EnrollmentStore;
use crate::interfaces::ProgramCatalog;
use crate::interfaces::StoreError;
use crate::model::Account;
use crate::model::AccountId;
use crate::model::AttendeeView;
use crate::model::CatalogSnapshot;
use crate::model::EnrolledProgramView;
use crate::model::Enrollment;
use crate::model::InsertOutcome;
use crate::model::Program;
use crate::model::ProgramId;

// ============================================================================
// SECTION: Combined Store Trait
// ============================================================================

/// Backend that serves both the program catalog and the enrollment relation.
pub trait AttendanceStore: ProgramCatalog + EnrollmentStore {}

impl<T: ProgramCatalog + EnrollmentStore + ?Sized> AttendanceStore for T {}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Map-backed state guarded by the store mutex.
#[derive(Debug, Default)]
struct MemoryState {
    /// Programs keyed by identifier.
    programs: BTreeMap<ProgramId, Program>,
    /// Accounts keyed by identifier.
    accounts: BTreeMap<AccountId, Account>,
    /// Enrollments keyed by `(program, account)`.
    enrollments: BTreeMap<(ProgramId, AccountId), Enrollment>,
}

impl MemoryState {
    /// Joins an enrollment with its program and account rows.
    ///
    /// Returns `None` when either side of the join is missing.
    fn attendee_row(&self, enrollment: &Enrollment) -> Option<AttendeeView> {
        let program = self.programs.get(&enrollment.program_id)?;
        let account = self.accounts.get(&enrollment.account_id)?;
        Some(AttendeeView {
            program_id: enrollment.program_id,
            account_id: enrollment.account_id,
            registration_date: enrollment.registration_date,
            status: enrollment.status.clone(),
            program_name: program.program_name.clone(),
            username: account.username.clone(),
            full_name: account.full_name.clone(),
        })
    }
}

/// In-memory catalog and enrollment store.
///
/// # Invariants
/// - Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAttendanceStore {
    /// Shared state.
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryAttendanceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a program.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store lock is poisoned.
    pub fn upsert_program(&self, program: Program) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        guard.programs.insert(program.program_id, program);
        Ok(())
    }

    /// Inserts or replaces an account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store lock is poisoned.
    pub fn upsert_account(&self, account: Account) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        guard.accounts.insert(account.account_id, account);
        Ok(())
    }

    /// Upserts every program and account in a catalog snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store lock is poisoned.
    pub fn import(&self, snapshot: CatalogSnapshot) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        for program in snapshot.programs {
            guard.programs.insert(program.program_id, program);
        }
        for account in snapshot.accounts {
            guard.accounts.insert(account.account_id, account);
        }
        Ok(())
    }

    /// Returns the number of stored enrollments.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store lock is poisoned.
    pub fn enrollment_count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.enrollments.len())
    }

    /// Acquires the state lock.
    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Io("in-memory store lock poisoned".to_string()))
    }
}

impl ProgramCatalog for InMemoryAttendanceStore {
    fn find_active_by_id(&self, program_id: ProgramId) -> Result<Option<Program>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.programs.get(&program_id).filter(|program| program.is_active()).cloned())
    }

    fn list_active(&self) -> Result<Vec<Program>, StoreError> {
        let guard = self.lock()?;
        let mut programs: Vec<Program> =
            guard.programs.values().filter(|program| program.is_active()).cloned().collect();
        programs.sort_by_key(|program| (program.date.is_none(), Reverse(program.date)));
        Ok(programs)
    }
}

impl EnrollmentStore for InMemoryAttendanceStore {
    fn find_enrollment(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<Option<Enrollment>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.enrollments.get(&(program_id, account_id)).cloned())
    }

    fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<InsertOutcome, StoreError> {
        let mut guard = self.lock()?;
        let key = (enrollment.program_id, enrollment.account_id);
        if let Some(existing) = guard.enrollments.get(&key) {
            return Ok(InsertOutcome::AlreadyEnrolled(existing.status.clone()));
        }
        guard.enrollments.insert(key, enrollment.clone());
        Ok(InsertOutcome::Created)
    }

    fn delete_enrollment(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<bool, StoreError> {
        let mut guard = self.lock()?;
        Ok(guard.enrollments.remove(&(program_id, account_id)).is_some())
    }

    fn list_enrolled_programs(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<EnrolledProgramView>, StoreError> {
        let guard = self.lock()?;
        let mut rows: Vec<EnrolledProgramView> = guard
            .enrollments
            .values()
            .filter(|enrollment| enrollment.account_id == account_id)
            .filter_map(|enrollment| {
                let program = guard.programs.get(&enrollment.program_id)?;
                program.is_active().then(|| EnrolledProgramView {
                    program: program.clone(),
                    registration_date: enrollment.registration_date,
                    status: enrollment.status.clone(),
                })
            })
            .collect();
        rows.sort_by_key(|row| (Reverse(row.registration_date), row.program.program_id));
        Ok(rows)
    }

    fn list_attendees(
        &self,
        program_id: Option<ProgramId>,
    ) -> Result<Vec<AttendeeView>, StoreError> {
        let guard = self.lock()?;
        let mut rows: Vec<AttendeeView> = guard
            .enrollments
            .values()
            .filter(|enrollment| program_id.is_none_or(|id| enrollment.program_id == id))
            .filter_map(|enrollment| guard.attendee_row(enrollment))
            .collect();
        rows.sort_by_key(|row| (Reverse(row.registration_date), row.program_id, row.account_id));
        Ok(rows)
    }

    fn find_attendee(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<Option<AttendeeView>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .enrollments
            .get(&(program_id, account_id))
            .and_then(|enrollment| guard.attendee_row(enrollment)))
    }

    fn count_attendees(&self, program_id: ProgramId) -> Result<u64, StoreError> {
        let guard = self.lock()?;
        let count = guard.enrollments.keys().filter(|(program, _)| *program == program_id).count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}

// ============================================================================
// SECTION: Shared Store
// ============================================================================

/// Cloneable handle over any attendance store backend.
#[derive(Clone)]
pub struct SharedAttendanceStore {
    /// Backend implementation.
    inner: Arc<dyn AttendanceStore + Send + Sync>,
}

impl SharedAttendanceStore {
    /// Wraps an owned store.
    #[must_use]
    pub fn from_store(store: impl AttendanceStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an already shared store.
    #[must_use]
    pub fn new(inner: Arc<dyn AttendanceStore + Send + Sync>) -> Self {
        Self {
            inner,
        }
    }
}

impl ProgramCatalog for SharedAttendanceStore {
    fn find_active_by_id(&self, program_id: ProgramId) -> Result<Option<Program>, StoreError> {
        self.inner.find_active_by_id(program_id)
    }

    fn list_active(&self) -> Result<Vec<Program>, StoreError> {
        self.inner.list_active()
    }
}

impl EnrollmentStore for SharedAttendanceStore {
    fn find_enrollment(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<Option<Enrollment>, StoreError> {
        self.inner.find_enrollment(program_id, account_id)
    }

    fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<InsertOutcome, StoreError> {
        self.inner.insert_enrollment(enrollment)
    }

    fn delete_enrollment(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<bool, StoreError> {
        self.inner.delete_enrollment(program_id, account_id)
    }

    fn list_enrolled_programs(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<EnrolledProgramView>, StoreError> {
        self.inner.list_enrolled_programs(account_id)
    }

    fn list_attendees(
        &self,
        program_id: Option<ProgramId>,
    ) -> Result<Vec<AttendeeView>, StoreError> {
        self.inner.list_attendees(program_id)
    }

    fn find_attendee(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<Option<AttendeeView>, StoreError> {
        self.inner.find_attendee(program_id, account_id)
    }

    fn count_attendees(&self, program_id: ProgramId) -> Result<u64, StoreError> {
        self.inner.count_attendees(program_id)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.inner.readiness()
    }
}
