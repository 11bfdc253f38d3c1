// crates/attendance-api/src/lib.rs
// ============================================================================
// Module: Attendance API
// Description: HTTP JSON API for community program enrollment.
// Purpose: Expose the enrollment core over axum with auth and audit logging.
// Dependencies: attendance-core, attendance-config, axum, tokio
// ============================================================================

//! ## Overview
//! Attendance API serves enrollment, reporting, and catalog routes over HTTP.
//! Handlers are thin wrappers over [`attendance_core::EnrollmentManager`];
//! this crate owns identity resolution, status mapping, and audit records.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
mod routes;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AttendanceAuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::RequestAuditEvent;
pub use audit::StderrAuditSink;
pub use audit::StoreErrorEvent;
pub use auth::AuthError;
pub use auth::BearerTokenIdentityProvider;
pub use auth::IdentityProvider;
pub use auth::RequestContext;
pub use server::ApiServerError;
pub use server::AttendanceServer;
pub use server::build_store;
