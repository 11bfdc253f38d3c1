// crates/attendance-cli/src/lib.rs
// ============================================================================
// Module: Program Attendance CLI Library
// Description: Shared helpers for the program-attendance command line.
// Purpose: Keep bind policy and catalog loading testable outside the binary.
// Dependencies: attendance-config, attendance-core
// ============================================================================

//! ## Overview
//! The binary entry point (`src/main.rs`) imports these helpers. Inputs are
//! untrusted: catalog files are size-limited and bind exposure is opt-in.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod catalog_file;
pub mod serve_policy;
