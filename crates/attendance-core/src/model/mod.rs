// crates/attendance-core/src/model/mod.rs
// ============================================================================
// Module: Attendance Model
// Description: Identifiers, catalog rows, enrollment records, and views.
// Purpose: Group the data model shared by stores, the manager, and hosts.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Core data types for program enrollment. These types carry no storage or
//! transport concerns.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod enrollment;
pub mod identifiers;
pub mod identity;
pub mod program;
pub mod timestamp;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use enrollment::*;
pub use identifiers::*;
pub use identity::*;
pub use program::*;
pub use timestamp::*;
