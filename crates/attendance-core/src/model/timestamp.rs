// crates/attendance-core/src/model/timestamp.rs
// ============================================================================
// Module: Attendance Timestamps
// Description: Canonical timestamp representation for registrations.
// Purpose: Store instants as unix milliseconds and render them as RFC 3339.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Registration dates and program dates are persisted as unix epoch
//! milliseconds and exchanged on the wire as RFC 3339 strings. The core never
//! reads wall-clock time directly; the enrollment manager obtains instants from
//! an injected [`crate::interfaces::Clock`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as _;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Instant expressed as unix epoch milliseconds.
///
/// # Invariants
/// - Ordering follows the millisecond value.
/// - Serializes as an RFC 3339 UTC string; out-of-range values fall back to
///   the raw millisecond integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Converts an [`OffsetDateTime`] into a millisecond timestamp.
    #[must_use]
    pub fn from_datetime(value: OffsetDateTime) -> Self {
        let millis = value.unix_timestamp_nanos() / 1_000_000;
        Self(i64::try_from(millis).unwrap_or(i64::MAX))
    }

    /// Returns the RFC 3339 rendering when the instant is representable.
    #[must_use]
    pub fn to_rfc3339(self) -> Option<String> {
        let nanos = i128::from(self.0) * 1_000_000;
        OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()?.format(&Rfc3339).ok()
    }

    /// Parses an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error message when the input is invalid.
    pub fn parse_rfc3339(value: &str) -> Result<Self, String> {
        OffsetDateTime::parse(value, &Rfc3339)
            .map(Self::from_datetime)
            .map_err(|err| err.to_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Some(text) => f.write_str(&text),
            None => self.0.fmt(f),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_rfc3339() {
            Some(text) => serializer.serialize_str(&text),
            None => serializer.serialize_i64(self.0),
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        /// Accepted wire encodings.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            /// Raw unix milliseconds.
            Millis(i64),
            /// RFC 3339 string.
            Text(String),
        }
        match Wire::deserialize(deserializer)? {
            Wire::Millis(millis) => Ok(Self(millis)),
            Wire::Text(text) => Self::parse_rfc3339(&text).map_err(D::Error::custom),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
