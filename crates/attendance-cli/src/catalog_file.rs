// crates/attendance-cli/src/catalog_file.rs
// ============================================================================
// Module: Catalog Files
// Description: Bounded loading of JSON catalog snapshots.
// Purpose: Read program and account seed data from untrusted files.
// Dependencies: attendance-core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Catalog files hold a [`CatalogSnapshot`] as JSON
//! (`{ "programs": [...], "accounts": [...] }`) using the same column names as
//! API responses. Files are size-checked before parsing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::path::Path;

use attendance_core::CatalogSnapshot;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a catalog file.
pub const MAX_CATALOG_BYTES: usize = 8 * 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog file failures.
#[derive(Debug, Error)]
pub enum CatalogFileError {
    /// File could not be read.
    #[error("catalog read failed: {0}")]
    Io(String),
    /// File exceeds [`MAX_CATALOG_BYTES`].
    #[error("catalog file is {size} bytes, limit is {limit}")]
    TooLarge {
        /// Observed size in bytes.
        size: u64,
        /// Allowed size in bytes.
        limit: usize,
    },
    /// File is not a valid catalog snapshot.
    #[error("catalog parse failed: {0}")]
    Parse(String),
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Reads and parses a catalog snapshot file.
///
/// # Errors
///
/// Returns [`CatalogFileError`] when the file is unreadable, too large, or
/// not a valid snapshot.
pub fn read_catalog(path: &Path) -> Result<CatalogSnapshot, CatalogFileError> {
    let bytes = read_bytes_with_limit(path, MAX_CATALOG_BYTES)?;
    serde_json::from_slice(&bytes).map_err(|err| CatalogFileError::Parse(err.to_string()))
}

/// Reads a file, failing when it exceeds `max_bytes`.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, CatalogFileError> {
    let file = File::open(path).map_err(|err| CatalogFileError::Io(err.to_string()))?;
    let size = file.metadata().map_err(|err| CatalogFileError::Io(err.to_string()))?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(CatalogFileError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|err| CatalogFileError::Io(err.to_string()))?;
    if bytes.len() > max_bytes {
        return Err(CatalogFileError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    #[test]
    fn parses_programs_and_accounts() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{
                "programs": [
                    { "ProgramID": 1, "ProgramName": "Grief Support Circle",
                      "Date": "2024-05-01T18:00:00Z" },
                    { "ProgramID": 2, "ProgramName": "Retired", "IsDisabled": true }
                ],
                "accounts": [{ "AccountID": 7, "Username": "ana" }]
            }"#,
        )
        .unwrap();
        let snapshot = read_catalog(&path).unwrap();
        assert_eq!(snapshot.programs.len(), 2);
        assert!(snapshot.programs[1].is_disabled);
        assert!(snapshot.programs[0].date.is_some());
        assert_eq!(snapshot.accounts[0].username, "ana");
    }

    #[test]
    fn rejects_zero_identifiers() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"{ "programs": [{ "ProgramID": 0, "ProgramName": "x" }] }"#)
            .unwrap();
        assert!(matches!(read_catalog(&path), Err(CatalogFileError::Parse(_))));
    }

    #[test]
    fn rejects_oversized_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, vec![b' '; MAX_CATALOG_BYTES + 1]).unwrap();
        assert!(matches!(read_catalog(&path), Err(CatalogFileError::TooLarge { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = read_catalog(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(CatalogFileError::Io(_))));
    }
}
