// crates/attendance-core/src/model/enrollment.rs
// ============================================================================
// Module: Enrollment Model
// Description: Enrollment records and the views derived from them.
// Purpose: Define the (program, account) relation owned by the enrollment core.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`Enrollment`] links one account to one program. The pair is unique, the
//! registration date is fixed at creation, and the status is an open string
//! enumeration whose only observed value is `registered`.
//!
//! Response views use two wire conventions: status and confirmation payloads
//! are camelCase, while joined reporting rows keep the relational column names
//! (`ProgramID`, `RegistrationDate`, ...).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::model::identifiers::AccountId;
use crate::model::identifiers::ProgramId;
use crate::model::program::Program;
use crate::model::timestamp::Timestamp;

// ============================================================================
// SECTION: Status
// ============================================================================

/// Stored status label for the `registered` state.
pub const STATUS_REGISTERED: &str = "registered";

/// Enrollment status.
///
/// # Invariants
/// - New enrollments are always [`EnrollmentStatus::Registered`].
/// - Unknown stored labels round-trip unchanged through [`EnrollmentStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnrollmentStatus {
    /// Account has registered for the program.
    Registered,
    /// Status label written by another part of the platform.
    Other(String),
}

impl EnrollmentStatus {
    /// Returns the stored label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Registered => STATUS_REGISTERED,
            Self::Other(label) => label,
        }
    }

    /// Maps a stored label to a status.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label == STATUS_REGISTERED {
            Self::Registered
        } else {
            Self::Other(label.to_string())
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for EnrollmentStatus {
    fn from(value: String) -> Self {
        if value == STATUS_REGISTERED { Self::Registered } else { Self::Other(value) }
    }
}

impl From<EnrollmentStatus> for String {
    fn from(value: EnrollmentStatus) -> Self {
        match value {
            EnrollmentStatus::Registered => STATUS_REGISTERED.to_string(),
            EnrollmentStatus::Other(label) => label,
        }
    }
}

// ============================================================================
// SECTION: Enrollment
// ============================================================================

/// Enrollment relation row.
///
/// # Invariants
/// - At most one row exists per `(program_id, account_id)`.
/// - `registration_date` never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Enrolled program.
    #[serde(rename = "ProgramID")]
    pub program_id: ProgramId,
    /// Enrolled account.
    #[serde(rename = "AccountID")]
    pub account_id: AccountId,
    /// Creation instant.
    #[serde(rename = "RegistrationDate")]
    pub registration_date: Timestamp,
    /// Current status.
    #[serde(rename = "Status")]
    pub status: EnrollmentStatus,
}

/// Result of an atomic enrollment insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The enrollment row was created.
    Created,
    /// A row already existed for the pair; nothing was written.
    AlreadyEnrolled(EnrollmentStatus),
}

// ============================================================================
// SECTION: Views
// ============================================================================

/// Enrollment status for the calling account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentState {
    /// True when an enrollment exists.
    pub is_enrolled: bool,
    /// Stored status, `null` when not enrolled.
    pub status: Option<EnrollmentStatus>,
    /// Registration instant, `null` when not enrolled.
    pub registration_date: Option<Timestamp>,
}

impl EnrollmentState {
    /// Status for an account with no enrollment.
    #[must_use]
    pub const fn not_enrolled() -> Self {
        Self {
            is_enrolled: false,
            status: None,
            registration_date: None,
        }
    }

    /// Status derived from an existing enrollment.
    #[must_use]
    pub fn from_enrollment(enrollment: Enrollment) -> Self {
        Self {
            is_enrolled: true,
            status: Some(enrollment.status),
            registration_date: Some(enrollment.registration_date),
        }
    }
}

/// Successful enrollment result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRecord {
    /// Enrolled program.
    pub program_id: ProgramId,
    /// Program display name.
    pub program_name: String,
    /// Status of the new enrollment.
    pub status: EnrollmentStatus,
}

/// Successful unenrollment result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnenrollConfirmation {
    /// Program the caller left.
    pub program_id: ProgramId,
}

/// Program joined with the caller's enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrolledProgramView {
    /// Program catalog fields.
    #[serde(flatten)]
    pub program: Program,
    /// Registration instant.
    #[serde(rename = "RegistrationDate")]
    pub registration_date: Timestamp,
    /// Enrollment status.
    #[serde(rename = "Status")]
    pub status: EnrollmentStatus,
}

/// Programs the caller is enrolled in, most recent registration first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrolledPrograms {
    /// Enrolled program rows.
    pub data: Vec<EnrolledProgramView>,
    /// Number of rows in `data`.
    pub total: usize,
}

impl EnrolledPrograms {
    /// Wraps rows and derives the total.
    #[must_use]
    pub fn new(data: Vec<EnrolledProgramView>) -> Self {
        let total = data.len();
        Self {
            data,
            total,
        }
    }
}

/// Attendee reporting row joining enrollment, program, and account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeView {
    /// Enrolled program.
    #[serde(rename = "ProgramID")]
    pub program_id: ProgramId,
    /// Enrolled account.
    #[serde(rename = "AccountID")]
    pub account_id: AccountId,
    /// Registration instant.
    #[serde(rename = "RegistrationDate")]
    pub registration_date: Timestamp,
    /// Enrollment status.
    #[serde(rename = "Status")]
    pub status: EnrollmentStatus,
    /// Program display name.
    #[serde(rename = "ProgramName")]
    pub program_name: String,
    /// Account login name.
    #[serde(rename = "Username")]
    pub username: String,
    /// Account display name.
    #[serde(rename = "FullName")]
    pub full_name: Option<String>,
}

/// Attendee count for a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeCount {
    /// Number of enrollments.
    pub total: u64,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
