// crates/attendance-config/src/lib.rs
// ============================================================================
// Module: Attendance Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for program-attendance.toml semantics.
// Dependencies: attendance-core, attendance-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `attendance-config` defines the configuration model for the program
//! attendance server: listener and routing settings, the bearer-token table
//! that backs the identity provider, audit logging, and the store backend.
//! Validation is strict and fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
