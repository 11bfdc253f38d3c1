// crates/attendance-core/src/runtime/manager.rs
// ============================================================================
// Module: Enrollment Manager
// Description: Enrollment state machine over catalog and enrollment stores.
// Purpose: Enforce identity, program, and uniqueness rules for enrollments.
// Dependencies: crate::interfaces, crate::model, thiserror
// ============================================================================

//! ## Overview
//! The [`EnrollmentManager`] implements the enrollment lifecycle:
//! status checks, enroll, unenroll, the caller's program list, and the
//! attendee reporting views. Preconditions are evaluated in a fixed order and
//! short-circuit on the first failure. Anonymous callers are rejected before
//! the store is touched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::interfaces::Clock;
use crate::interfaces::EnrollmentStore;
use crate::interfaces::ProgramCatalog;
use crate::interfaces::StoreError;
use crate::model::AccountId;
use crate::model::AttendeeCount;
use crate::model::AttendeeView;
use crate::model::EnrolledPrograms;
use crate::model::Enrollment;
use crate::model::EnrollmentRecord;
use crate::model::EnrollmentState;
use crate::model::EnrollmentStatus;
use crate::model::Identity;
use crate::model::InsertOutcome;
use crate::model::Program;
use crate::model::ProgramId;
use crate::model::UnenrollConfirmation;
use crate::runtime::store::SharedAttendanceStore;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Enrollment operation failures.
///
/// # Invariants
/// - [`EnrollmentError::Store`] carries backend detail for operators only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrollmentError {
    /// Caller has no verified account.
    #[error("Authentication required")]
    Unauthenticated,
    /// Program does not exist or is disabled.
    #[error("Program not found or is disabled")]
    ProgramNotFound,
    /// No enrollment exists for the pair.
    #[error("Enrollment not found")]
    EnrollmentNotFound,
    /// No attendee row exists for the pair.
    #[error("Attendee not found")]
    AttendeeNotFound,
    /// The pair is already enrolled.
    #[error("You are already enrolled in this program")]
    AlreadyEnrolled {
        /// Status of the existing enrollment.
        status: EnrollmentStatus,
    },
    /// Underlying store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EnrollmentError {
    /// Stable machine-readable label used in audit records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::ProgramNotFound => "program_not_found",
            Self::EnrollmentNotFound => "enrollment_not_found",
            Self::AttendeeNotFound => "attendee_not_found",
            Self::AlreadyEnrolled {
                ..
            } => "already_enrolled",
            Self::Store(_) => "store_error",
        }
    }
}

// ============================================================================
// SECTION: Manager
// ============================================================================

/// Enrollment state machine.
///
/// # Invariants
/// - New enrollments take their registration instant from the injected clock.
/// - Store access happens only after the caller identity is verified.
#[derive(Clone)]
pub struct EnrollmentManager {
    /// Catalog and enrollment backend.
    store: SharedAttendanceStore,
    /// Registration clock.
    clock: Arc<dyn Clock + Send + Sync>,
}

impl EnrollmentManager {
    /// Creates a manager over a store and clock.
    #[must_use]
    pub fn new(store: SharedAttendanceStore, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            store,
            clock,
        }
    }

    /// Returns the backing store handle.
    #[must_use]
    pub const fn store(&self) -> &SharedAttendanceStore {
        &self.store
    }

    /// Reports whether the caller is enrolled in a program.
    ///
    /// # Errors
    ///
    /// Returns [`EnrollmentError::Unauthenticated`] for anonymous callers and
    /// [`EnrollmentError::Store`] when the lookup fails.
    pub fn check_enrollment_status(
        &self,
        program_id: ProgramId,
        identity: Identity,
    ) -> Result<EnrollmentState, EnrollmentError> {
        let account_id = require_account(identity)?;
        let state = self
            .store
            .find_enrollment(program_id, account_id)?
            .map_or_else(EnrollmentState::not_enrolled, EnrollmentState::from_enrollment);
        Ok(state)
    }

    /// Enrolls the caller in an active program.
    ///
    /// # Errors
    ///
    /// Returns, in precedence order, [`EnrollmentError::Unauthenticated`],
    /// [`EnrollmentError::ProgramNotFound`], and
    /// [`EnrollmentError::AlreadyEnrolled`]. Store failures surface as
    /// [`EnrollmentError::Store`].
    pub fn enroll_in_program(
        &self,
        program_id: ProgramId,
        identity: Identity,
    ) -> Result<EnrollmentRecord, EnrollmentError> {
        let account_id = require_account(identity)?;
        let program =
            self.store.find_active_by_id(program_id)?.ok_or(EnrollmentError::ProgramNotFound)?;
        let enrollment = Enrollment {
            program_id,
            account_id,
            registration_date: self.clock.now(),
            status: EnrollmentStatus::Registered,
        };
        match self.store.insert_enrollment(&enrollment)? {
            InsertOutcome::Created => Ok(EnrollmentRecord {
                program_id,
                program_name: program.program_name,
                status: enrollment.status,
            }),
            InsertOutcome::AlreadyEnrolled(status) => Err(EnrollmentError::AlreadyEnrolled {
                status,
            }),
        }
    }

    /// Removes the caller's enrollment.
    ///
    /// # Errors
    ///
    /// Returns [`EnrollmentError::Unauthenticated`] for anonymous callers and
    /// [`EnrollmentError::EnrollmentNotFound`] when nothing was deleted.
    pub fn unenroll_from_program(
        &self,
        program_id: ProgramId,
        identity: Identity,
    ) -> Result<UnenrollConfirmation, EnrollmentError> {
        let account_id = require_account(identity)?;
        if self.store.delete_enrollment(program_id, account_id)? {
            Ok(UnenrollConfirmation {
                program_id,
            })
        } else {
            Err(EnrollmentError::EnrollmentNotFound)
        }
    }

    /// Lists active programs the caller is enrolled in, newest registration
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`EnrollmentError::Unauthenticated`] for anonymous callers.
    pub fn my_enrolled_programs(
        &self,
        identity: Identity,
    ) -> Result<EnrolledPrograms, EnrollmentError> {
        let account_id = require_account(identity)?;
        let rows = self.store.list_enrolled_programs(account_id)?;
        Ok(EnrolledPrograms::new(rows))
    }

    /// Lists every attendee row across programs, newest registration first.
    ///
    /// # Errors
    ///
    /// Returns [`EnrollmentError::Unauthenticated`] for anonymous callers.
    pub fn all_program_attendees(
        &self,
        identity: Identity,
    ) -> Result<Vec<AttendeeView>, EnrollmentError> {
        require_account(identity)?;
        Ok(self.store.list_attendees(None)?)
    }

    /// Lists attendee rows for one program, newest registration first.
    ///
    /// # Errors
    ///
    /// Returns [`EnrollmentError::Unauthenticated`] for anonymous callers.
    pub fn program_attendees(
        &self,
        program_id: ProgramId,
        identity: Identity,
    ) -> Result<Vec<AttendeeView>, EnrollmentError> {
        require_account(identity)?;
        Ok(self.store.list_attendees(Some(program_id))?)
    }

    /// Loads a single attendee row.
    ///
    /// # Errors
    ///
    /// Returns [`EnrollmentError::Unauthenticated`] for anonymous callers and
    /// [`EnrollmentError::AttendeeNotFound`] when the row is absent.
    pub fn attendee_by_id(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
        identity: Identity,
    ) -> Result<AttendeeView, EnrollmentError> {
        require_account(identity)?;
        self.store.find_attendee(program_id, account_id)?.ok_or(EnrollmentError::AttendeeNotFound)
    }

    /// Counts enrollments for a program. Unknown programs count zero.
    ///
    /// # Errors
    ///
    /// Returns [`EnrollmentError::Store`] when the count fails.
    pub fn total_attendees(&self, program_id: ProgramId) -> Result<AttendeeCount, EnrollmentError> {
        let total = self.store.count_attendees(program_id)?;
        Ok(AttendeeCount {
            total,
        })
    }

    /// Lists active programs, latest program date first.
    ///
    /// # Errors
    ///
    /// Returns [`EnrollmentError::Store`] when the listing fails.
    pub fn active_programs(&self) -> Result<Vec<Program>, EnrollmentError> {
        Ok(self.store.list_active()?)
    }

    /// Loads an active program.
    ///
    /// # Errors
    ///
    /// Returns [`EnrollmentError::ProgramNotFound`] when the program is absent
    /// or disabled.
    pub fn program(&self, program_id: ProgramId) -> Result<Program, EnrollmentError> {
        self.store.find_active_by_id(program_id)?.ok_or(EnrollmentError::ProgramNotFound)
    }
}

/// Extracts the verified account or fails with [`EnrollmentError::Unauthenticated`].
const fn require_account(identity: Identity) -> Result<AccountId, EnrollmentError> {
    match identity.account_id() {
        Some(account_id) => Ok(account_id),
        None => Err(EnrollmentError::Unauthenticated),
    }
}
