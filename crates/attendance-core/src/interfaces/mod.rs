// crates/attendance-core/src/interfaces/mod.rs
// ============================================================================
// Module: Attendance Interfaces
// Description: Collaborator traits consumed by the enrollment manager.
// Purpose: Define the catalog, store, and clock seams hosts must provide.
// Dependencies: crate::model, thiserror
// ============================================================================

//! ## Overview
//! The enrollment manager never talks to a database directly. It depends on a
//! [`ProgramCatalog`] for program lookups, an [`EnrollmentStore`] for the
//! enrollment relation, and a [`Clock`] for registration instants. Stores must
//! make [`EnrollmentStore::insert_enrollment`] atomic with respect to the
//! `(program, account)` uniqueness invariant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::model::AccountId;
use crate::model::AttendeeView;
use crate::model::EnrolledProgramView;
use crate::model::Enrollment;
use crate::model::InsertOutcome;
use crate::model::Program;
use crate::model::ProgramId;
use crate::model::Timestamp;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Store errors surfaced by catalog and enrollment backends.
///
/// # Invariants
/// - Messages may contain backend detail and must not be returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("attendance store io error: {0}")]
    Io(String),
    /// Database engine error.
    #[error("attendance store db error: {0}")]
    Db(String),
    /// Stored data failed integrity checks.
    #[error("attendance store corruption: {0}")]
    Corrupt(String),
    /// Stored schema version is incompatible.
    #[error("attendance store version mismatch: {0}")]
    VersionMismatch(String),
    /// Input or stored data is invalid.
    #[error("attendance store invalid data: {0}")]
    Invalid(String),
}

impl StoreError {
    /// Returns a stable label for audit records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Db(_) => "db",
            Self::Corrupt(_) => "corrupt",
            Self::VersionMismatch(_) => "version_mismatch",
            Self::Invalid(_) => "invalid",
        }
    }
}

// ============================================================================
// SECTION: Program Catalog
// ============================================================================

/// Read-only program catalog.
pub trait ProgramCatalog {
    /// Returns the program when it exists and is not disabled.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_active_by_id(&self, program_id: ProgramId) -> Result<Option<Program>, StoreError>;

    /// Lists non-disabled programs, latest program date first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the listing fails.
    fn list_active(&self) -> Result<Vec<Program>, StoreError>;
}

// ============================================================================
// SECTION: Enrollment Store
// ============================================================================

/// Persistence for the enrollment relation.
pub trait EnrollmentStore {
    /// Loads the enrollment for a pair.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_enrollment(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<Option<Enrollment>, StoreError>;

    /// Inserts an enrollment unless one already exists for the pair.
    ///
    /// The existence check and the insert must be atomic: concurrent calls for
    /// the same pair produce exactly one [`InsertOutcome::Created`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<InsertOutcome, StoreError>;

    /// Deletes the enrollment for a pair. Returns true when a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn delete_enrollment(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<bool, StoreError>;

    /// Lists non-disabled programs the account is enrolled in, most recent
    /// registration first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn list_enrolled_programs(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<EnrolledProgramView>, StoreError>;

    /// Lists attendee rows, most recent registration first. `None` lists every
    /// program.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn list_attendees(
        &self,
        program_id: Option<ProgramId>,
    ) -> Result<Vec<AttendeeView>, StoreError>;

    /// Loads a single attendee row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn find_attendee(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<Option<AttendeeView>, StoreError>;

    /// Counts enrollments for a program.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn count_attendees(&self, program_id: ProgramId) -> Result<u64, StoreError>;

    /// Verifies the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is not ready.
    fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Source of registration instants.
pub trait Clock {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}
