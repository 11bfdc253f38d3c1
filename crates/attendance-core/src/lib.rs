// crates/attendance-core/src/lib.rs
// ============================================================================
// Module: Attendance Core
// Description: Enrollment state machine for community programs.
// Purpose: Own the (program, account) enrollment lifecycle behind narrow traits.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Attendance core owns the enrollment relation between accounts and community
//! programs. [`EnrollmentManager`] validates callers and programs, then reads
//! or mutates enrollments through the [`EnrollmentStore`] and
//! [`ProgramCatalog`] traits. Hosts supply the caller [`Identity`] explicitly
//! and a [`Clock`] for registration instants.
//!
//! Invariants:
//! - At most one enrollment exists per `(program, account)` pair.
//! - Enrollments are only created for programs that exist and are not disabled.
//! - Anonymous callers are rejected before any store access.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod interfaces;
pub mod model;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use interfaces::Clock;
pub use interfaces::EnrollmentStore;
pub use interfaces::ProgramCatalog;
pub use interfaces::StoreError;
pub use model::*;
pub use runtime::AttendanceStore;
pub use runtime::EnrollmentError;
pub use runtime::EnrollmentManager;
pub use runtime::InMemoryAttendanceStore;
pub use runtime::ManualClock;
pub use runtime::SharedAttendanceStore;
pub use runtime::SystemClock;
