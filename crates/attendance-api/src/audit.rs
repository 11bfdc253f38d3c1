// crates/attendance-api/src/audit.rs
// ============================================================================
// Module: Request Audit Logging
// Description: Structured audit events for HTTP request handling.
// Purpose: Emit JSON-line logs without binding to a logging backend.
// Dependencies: attendance-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Every handled request produces a [`RequestAuditEvent`]; backend failures
//! additionally produce a [`StoreErrorEvent`] carrying the detail that is
//! withheld from the client. Sinks serialize events as one JSON object per
//! line so deployments can route them to their own log pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use attendance_core::AccountId;
use attendance_core::StoreError;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Request outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Request completed with a 2xx status.
    Ok,
    /// Request was rejected or failed.
    Error,
}

/// Request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct RequestAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// HTTP method.
    pub method: &'static str,
    /// Route template that handled the request.
    pub route: &'static str,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// Response status code.
    pub status: u16,
    /// Verified caller account when known.
    pub account_id: Option<AccountId>,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Handling time in milliseconds.
    pub duration_ms: u128,
}

/// Inputs required to construct a request audit event.
pub struct RequestAuditEventParams {
    /// HTTP method.
    pub method: &'static str,
    /// Route template that handled the request.
    pub route: &'static str,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// Response status code.
    pub status: u16,
    /// Verified caller account when known.
    pub account_id: Option<AccountId>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Handling time.
    pub elapsed: Duration,
}

impl RequestAuditEvent {
    /// Builds an audit event stamped with the current time.
    #[must_use]
    pub fn new(params: RequestAuditEventParams) -> Self {
        let outcome = if (200 .. 300).contains(&params.status) {
            RequestOutcome::Ok
        } else {
            RequestOutcome::Error
        };
        Self {
            event: "request_audit",
            timestamp_ms: now_ms(),
            method: params.method,
            route: params.route,
            peer_ip: params.peer_ip,
            status: params.status,
            account_id: params.account_id,
            outcome,
            error_kind: params.error_kind,
            duration_ms: params.elapsed.as_millis(),
        }
    }
}

/// Store failure audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct StoreErrorEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Route template that observed the failure.
    pub route: &'static str,
    /// Store error classification.
    pub store_kind: &'static str,
    /// Backend detail; never returned to clients.
    pub detail: String,
}

impl StoreErrorEvent {
    /// Builds a store failure event stamped with the current time.
    #[must_use]
    pub fn new(route: &'static str, error: &StoreError) -> Self {
        Self {
            event: "store_error",
            timestamp_ms: now_ms(),
            route,
            store_kind: error.kind(),
            detail: error.to_string(),
        }
    }
}

/// Milliseconds since the Unix epoch, zero if the clock is before it.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for request events.
pub trait AttendanceAuditSink: Send + Sync {
    /// Record a request audit event.
    fn record(&self, event: &RequestAuditEvent);

    /// Record a store failure event.
    fn record_store_error(&self, _event: &StoreErrorEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AttendanceAuditSink for StderrAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        write_stderr(event);
    }

    fn record_store_error(&self, event: &StoreErrorEvent) {
        write_stderr(event);
    }
}

/// Writes one serialized event to stderr.
fn write_stderr(event: &impl Serialize) {
    if let Ok(payload) = serde_json::to_string(event) {
        let _ = writeln!(io::stderr(), "{payload}");
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized event.
    fn append(&self, event: &impl Serialize) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl AttendanceAuditSink for FileAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        self.append(event);
    }

    fn record_store_error(&self, event: &StoreErrorEvent) {
        self.append(event);
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AttendanceAuditSink for NoopAuditSink {
    fn record(&self, _event: &RequestAuditEvent) {}
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

    use serde_json::Value;

    use super::*;

    fn params(status: u16) -> RequestAuditEventParams {
        RequestAuditEventParams {
            method: "POST",
            route: "/programs/{programId}/enroll",
            peer_ip: Some("127.0.0.1".to_string()),
            status,
            account_id: AccountId::from_raw(7),
            error_kind: None,
            elapsed: Duration::from_millis(12),
        }
    }

    #[test]
    fn outcome_follows_status_class() {
        assert_eq!(RequestAuditEvent::new(params(201)).outcome, RequestOutcome::Ok);
        assert_eq!(RequestAuditEvent::new(params(400)).outcome, RequestOutcome::Error);
        assert_eq!(RequestAuditEvent::new(params(500)).outcome, RequestOutcome::Error);
    }

    #[test]
    fn file_sink_appends_json_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("audit.log");
        let sink = FileAuditSink::new(&path).unwrap();
        sink.record(&RequestAuditEvent::new(params(201)));
        sink.record_store_error(&StoreErrorEvent::new(
            "/me/programs",
            &StoreError::Db("disk I/O error".to_string()),
        ));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> =
            content.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "request_audit");
        assert_eq!(lines[0]["account_id"], 7);
        assert_eq!(lines[0]["outcome"], "ok");
        assert_eq!(lines[0]["duration_ms"], 12);
        assert_eq!(lines[1]["event"], "store_error");
        assert_eq!(lines[1]["store_kind"], "db");
    }
}
