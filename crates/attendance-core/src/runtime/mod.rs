// crates/attendance-core/src/runtime/mod.rs
// ============================================================================
// Module: Attendance Runtime
// Description: Enrollment manager, clocks, and the in-memory store.
// Purpose: Execute enrollment operations against collaborator traits.
// Dependencies: crate::interfaces, crate::model
// ============================================================================

//! ## Overview
//! Runtime components that drive the enrollment lifecycle. The manager is the
//! only entry point hosts call; stores and clocks are injected.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod clock;
pub mod manager;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clock::ManualClock;
pub use clock::SystemClock;
pub use manager::EnrollmentError;
pub use manager::EnrollmentManager;
pub use store::AttendanceStore;
pub use store::InMemoryAttendanceStore;
pub use store::SharedAttendanceStore;
