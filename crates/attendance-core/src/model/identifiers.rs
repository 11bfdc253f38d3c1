// crates/attendance-core/src/model/identifiers.rs
// ============================================================================
// Module: Attendance Identifiers
// Description: Canonical numeric identifiers for programs and accounts.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Programs and accounts are keyed by positive integers in the relational
//! store. The wrappers here enforce the non-zero, 1-based invariant at
//! construction boundaries (path parsing, row decoding) so the enrollment
//! manager never sees a zero or negative key.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identifier parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Input was not a base-10 integer.
    #[error("identifier is not a number: {0}")]
    NotNumeric(String),
    /// Input was zero or negative.
    #[error("identifier must be positive")]
    NotPositive,
    /// Input exceeded the signed 64-bit storage range.
    #[error("identifier exceeds storage range")]
    OutOfRange,
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Community program identifier.
///
/// # Invariants
/// - Always >= 1 and <= `i64::MAX` (fits a signed `SQLite` integer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramId(NonZeroU64);

impl ProgramId {
    /// Creates a program identifier from a non-zero value.
    #[must_use]
    pub const fn new(id: NonZeroU64) -> Self {
        Self(id)
    }

    /// Creates a program identifier from a raw value (returns `None` if zero).
    #[must_use]
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Returns the raw identifier value (always >= 1).
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }

    /// Decodes a stored signed integer key.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::NotPositive`] for zero or negative keys.
    pub fn from_i64(raw: i64) -> Result<Self, IdentifierError> {
        decode_i64(raw).map(Self)
    }

    /// Encodes the identifier as a signed storage key.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::OutOfRange`] when the value exceeds `i64::MAX`.
    pub fn to_i64(self) -> Result<i64, IdentifierError> {
        encode_i64(self.0)
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.get().fmt(f)
    }
}

impl FromStr for ProgramId {
    type Err = IdentifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_positive(value).map(Self)
    }
}

/// Platform account identifier.
///
/// # Invariants
/// - Always >= 1 and <= `i64::MAX` (fits a signed `SQLite` integer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(NonZeroU64);

impl AccountId {
    /// Creates an account identifier from a non-zero value.
    #[must_use]
    pub const fn new(id: NonZeroU64) -> Self {
        Self(id)
    }

    /// Creates an account identifier from a raw value (returns `None` if zero).
    #[must_use]
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Returns the raw identifier value (always >= 1).
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }

    /// Decodes a stored signed integer key.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::NotPositive`] for zero or negative keys.
    pub fn from_i64(raw: i64) -> Result<Self, IdentifierError> {
        decode_i64(raw).map(Self)
    }

    /// Encodes the identifier as a signed storage key.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::OutOfRange`] when the value exceeds `i64::MAX`.
    pub fn to_i64(self) -> Result<i64, IdentifierError> {
        encode_i64(self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.get().fmt(f)
    }
}

impl FromStr for AccountId {
    type Err = IdentifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_positive(value).map(Self)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a positive base-10 identifier that fits the storage range.
fn parse_positive(value: &str) -> Result<NonZeroU64, IdentifierError> {
    let trimmed = value.trim();
    if trimmed.starts_with('-') {
        return Err(IdentifierError::NotPositive);
    }
    let raw: u64 =
        trimmed.parse().map_err(|_| IdentifierError::NotNumeric(truncate(trimmed)))?;
    if raw > i64::MAX.unsigned_abs() {
        return Err(IdentifierError::OutOfRange);
    }
    NonZeroU64::new(raw).ok_or(IdentifierError::NotPositive)
}

/// Decodes a signed storage key into a non-zero identifier.
fn decode_i64(raw: i64) -> Result<NonZeroU64, IdentifierError> {
    let unsigned = u64::try_from(raw).map_err(|_| IdentifierError::NotPositive)?;
    NonZeroU64::new(unsigned).ok_or(IdentifierError::NotPositive)
}

/// Encodes a non-zero identifier as a signed storage key.
fn encode_i64(value: NonZeroU64) -> Result<i64, IdentifierError> {
    i64::try_from(value.get()).map_err(|_| IdentifierError::OutOfRange)
}

/// Bounds untrusted input echoed back in error messages.
fn truncate(value: &str) -> String {
    value.chars().take(32).collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::AccountId;
    use super::IdentifierError;
    use super::ProgramId;

    #[test]
    fn program_id_parses_positive_integers() {
        let id: ProgramId = "42".parse().expect("parse");
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn program_id_rejects_zero_and_negative() {
        assert_eq!("0".parse::<ProgramId>(), Err(IdentifierError::NotPositive));
        assert_eq!("-3".parse::<ProgramId>(), Err(IdentifierError::NotPositive));
    }

    #[test]
    fn account_id_rejects_non_numeric_input() {
        assert!(matches!("abc".parse::<AccountId>(), Err(IdentifierError::NotNumeric(_))));
        assert!(matches!("1.5".parse::<AccountId>(), Err(IdentifierError::NotNumeric(_))));
    }

    #[test]
    fn identifiers_reject_values_beyond_storage_range() {
        let too_large = (u64::MAX).to_string();
        assert_eq!(too_large.parse::<AccountId>(), Err(IdentifierError::OutOfRange));
    }

    #[test]
    fn storage_keys_round_trip() {
        let id = AccountId::from_i64(7).unwrap();
        assert_eq!(id.to_i64().unwrap(), 7);
        assert_eq!(ProgramId::from_i64(0), Err(IdentifierError::NotPositive));
        assert_eq!(ProgramId::from_i64(-1), Err(IdentifierError::NotPositive));
    }
}
