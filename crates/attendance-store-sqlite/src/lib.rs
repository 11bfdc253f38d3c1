// crates/attendance-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Attendance Store
// Description: Durable catalog and enrollment backend using SQLite.
// Purpose: Persist programs, accounts, and enrollments with a uniqueness key.
// Dependencies: attendance-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed implementation of the attendance
//! [`ProgramCatalog`](attendance_core::ProgramCatalog) and
//! [`EnrollmentStore`](attendance_core::EnrollmentStore) traits. Enrollment
//! rows are keyed by `(program_id, account_id)` and inserted inside an
//! immediate transaction, so duplicate enrollments are impossible even across
//! processes sharing the database file.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::CatalogImportSummary;
pub use store::MAX_READ_POOL_SIZE;
pub use store::SqliteAttendanceStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
