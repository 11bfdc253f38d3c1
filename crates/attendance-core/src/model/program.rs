// crates/attendance-core/src/model/program.rs
// ============================================================================
// Module: Program Catalog Model
// Description: Community program and account records consumed by enrollment.
// Purpose: Describe the read-only catalog rows joined into enrollment views.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Programs and accounts are owned by external collaborators. The enrollment
//! core only reads them: the active flag gates new enrollments and the display
//! fields are joined into reporting rows. Field names on the wire follow the
//! relational column names the web client already consumes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::model::identifiers::AccountId;
use crate::model::identifiers::ProgramId;
use crate::model::timestamp::Timestamp;

// ============================================================================
// SECTION: Program
// ============================================================================

/// Community program offered to accounts.
///
/// # Invariants
/// - `is_disabled == true` programs reject new enrollments and are hidden from
///   catalog listings and "my programs" views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Program identifier.
    #[serde(rename = "ProgramID")]
    pub program_id: ProgramId,
    /// Display name.
    #[serde(rename = "ProgramName")]
    pub program_name: String,
    /// Program category label.
    #[serde(rename = "Type", default)]
    pub program_type: Option<String>,
    /// Scheduled date of the program.
    #[serde(rename = "Date", default)]
    pub date: Option<Timestamp>,
    /// Long-form description.
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    /// Organizer name.
    #[serde(rename = "Organizer", default)]
    pub organizer: Option<String>,
    /// Venue or meeting location.
    #[serde(rename = "Location", default)]
    pub location: Option<String>,
    /// External link for the program.
    #[serde(rename = "Url", default)]
    pub url: Option<String>,
    /// Cover image link.
    #[serde(rename = "ImageUrl", default)]
    pub image_url: Option<String>,
    /// Disabled programs reject new enrollment.
    #[serde(rename = "IsDisabled", default)]
    pub is_disabled: bool,
}

impl Program {
    /// Creates an active program with only the required fields populated.
    #[must_use]
    pub fn new(program_id: ProgramId, program_name: impl Into<String>) -> Self {
        Self {
            program_id,
            program_name: program_name.into(),
            program_type: None,
            date: None,
            description: None,
            organizer: None,
            location: None,
            url: None,
            image_url: None,
            is_disabled: false,
        }
    }

    /// Returns a copy with the disabled flag set.
    #[must_use]
    pub const fn disabled(mut self, is_disabled: bool) -> Self {
        self.is_disabled = is_disabled;
        self
    }

    /// Returns true when the program accepts enrollments.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.is_disabled
    }
}

// ============================================================================
// SECTION: Account
// ============================================================================

/// Account display record joined into attendee rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier.
    #[serde(rename = "AccountID")]
    pub account_id: AccountId,
    /// Login name.
    #[serde(rename = "Username")]
    pub username: String,
    /// Full display name.
    #[serde(rename = "FullName", default)]
    pub full_name: Option<String>,
}

// ============================================================================
// SECTION: Catalog Import
// ============================================================================

/// Catalog snapshot used to seed programs and accounts into a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Programs to upsert.
    #[serde(default)]
    pub programs: Vec<Program>,
    /// Accounts to upsert.
    #[serde(default)]
    pub accounts: Vec<Account>,
}
