// crates/attendance-api/src/routes.rs
// ============================================================================
// Module: HTTP Routes
// Description: Axum handlers for enrollment, reporting, and catalog reads.
// Purpose: Map HTTP requests onto enrollment operations and back to JSON.
// Dependencies: attendance-core, axum, serde, tokio
// ============================================================================

//! ## Overview
//! Each handler resolves the caller identity, validates path identifiers, and
//! runs the enrollment operation on the blocking pool. Failures map to a JSON
//! `{ "message": ... }` body with a fixed status per error kind; store detail
//! goes to the audit sink and never to the client. Every request is audited
//! once, after the response status is known.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use attendance_core::AccountId;
use attendance_core::EnrollmentError;
use attendance_core::EnrollmentManager;
use attendance_core::EnrollmentRecord;
use attendance_core::EnrollmentStatus;
use attendance_core::EnrollmentStore;
use attendance_core::Identity;
use attendance_core::ProgramId;
use attendance_core::StoreError;
use attendance_core::UnenrollConfirmation;
use axum::Json;
use axum::Router;
use axum::extract::ConnectInfo;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde::Serialize;

use crate::audit::AttendanceAuditSink;
use crate::audit::RequestAuditEvent;
use crate::audit::RequestAuditEventParams;
use crate::audit::StoreErrorEvent;
use crate::auth::IdentityProvider;
use crate::auth::RequestContext;

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared handler state.
pub struct AppState {
    /// Enrollment operations.
    pub manager: EnrollmentManager,
    /// Caller identity resolution.
    pub identity: Arc<dyn IdentityProvider>,
    /// Request audit sink.
    pub audit: Arc<dyn AttendanceAuditSink>,
}

/// Builds the API routes, relative to the configured base path.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/programs", get(list_programs))
        .route("/programs/{program_id}", get(get_program))
        .route("/programs/{program_id}/enroll", post(enroll).delete(unenroll))
        .route("/programs/{program_id}/attendees", get(program_attendees))
        .route("/programs/{program_id}/attendees/status", get(enrollment_status))
        .route("/programs/{program_id}/attendees/count", get(attendee_count))
        .route("/programs/{program_id}/attendees/{account_id}", get(attendee_by_id))
        .route("/attendees", get(all_attendees))
        .route("/me/programs", get(my_programs))
        .with_state(state)
}

// ============================================================================
// SECTION: Route Metadata
// ============================================================================

/// Static description of a route used for responses and audit records.
#[derive(Debug, Clone, Copy)]
struct RouteSpec {
    /// HTTP method.
    method: &'static str,
    /// Route template.
    path: &'static str,
    /// Status returned on success.
    success: StatusCode,
    /// Message returned on backend failure.
    server_error: &'static str,
}

/// Generic backend failure message.
const SERVER_ERROR: &str = "Server error";

/// `GET /health`.
const HEALTH: RouteSpec = RouteSpec {
    method: "GET",
    path: "/health",
    success: StatusCode::OK,
    server_error: SERVER_ERROR,
};

/// `GET /programs`.
const LIST_PROGRAMS: RouteSpec = RouteSpec {
    method: "GET",
    path: "/programs",
    success: StatusCode::OK,
    server_error: SERVER_ERROR,
};

/// `GET /programs/{programId}`.
const GET_PROGRAM: RouteSpec = RouteSpec {
    method: "GET",
    path: "/programs/{programId}",
    success: StatusCode::OK,
    server_error: SERVER_ERROR,
};

/// `POST /programs/{programId}/enroll`.
const ENROLL: RouteSpec = RouteSpec {
    method: "POST",
    path: "/programs/{programId}/enroll",
    success: StatusCode::CREATED,
    server_error: "Server error during enrollment",
};

/// `DELETE /programs/{programId}/enroll`.
const UNENROLL: RouteSpec = RouteSpec {
    method: "DELETE",
    path: "/programs/{programId}/enroll",
    success: StatusCode::OK,
    server_error: "Server error during unenrollment",
};

/// `GET /programs/{programId}/attendees/status`.
const ENROLLMENT_STATUS: RouteSpec = RouteSpec {
    method: "GET",
    path: "/programs/{programId}/attendees/status",
    success: StatusCode::OK,
    server_error: SERVER_ERROR,
};

/// `GET /programs/{programId}/attendees`.
const PROGRAM_ATTENDEES: RouteSpec = RouteSpec {
    method: "GET",
    path: "/programs/{programId}/attendees",
    success: StatusCode::OK,
    server_error: SERVER_ERROR,
};

/// `GET /programs/{programId}/attendees/count`.
const ATTENDEE_COUNT: RouteSpec = RouteSpec {
    method: "GET",
    path: "/programs/{programId}/attendees/count",
    success: StatusCode::OK,
    server_error: SERVER_ERROR,
};

/// `GET /programs/{programId}/attendees/{accountId}`.
const ATTENDEE_BY_ID: RouteSpec = RouteSpec {
    method: "GET",
    path: "/programs/{programId}/attendees/{accountId}",
    success: StatusCode::OK,
    server_error: SERVER_ERROR,
};

/// `GET /attendees`.
const ALL_ATTENDEES: RouteSpec = RouteSpec {
    method: "GET",
    path: "/attendees",
    success: StatusCode::OK,
    server_error: SERVER_ERROR,
};

/// `GET /me/programs`.
const MY_PROGRAMS: RouteSpec = RouteSpec {
    method: "GET",
    path: "/me/programs",
    success: StatusCode::OK,
    server_error: SERVER_ERROR,
};

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Successful enrollment body.
#[derive(Debug, Serialize)]
struct EnrollResponse {
    /// Confirmation message.
    message: &'static str,
    /// Enrollment details.
    #[serde(flatten)]
    record: EnrollmentRecord,
}

/// Successful unenrollment body.
#[derive(Debug, Serialize)]
struct UnenrollResponse {
    /// Confirmation message.
    message: &'static str,
    /// Program the caller left.
    #[serde(flatten)]
    confirmation: UnenrollConfirmation,
}

/// Liveness body.
#[derive(Debug, Serialize)]
struct HealthResponse {
    /// Always `ok` on success.
    status: &'static str,
}

/// Error body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    /// Client-facing message.
    message: String,
    /// Existing status on duplicate enrollment.
    #[serde(skip_serializing_if = "Option::is_none")]
    enrollment_status: Option<EnrollmentStatus>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Handler failures.
#[derive(Debug)]
enum ApiError {
    /// Program path segment is not a positive integer.
    InvalidProgramId,
    /// Account path segment is not a positive integer.
    InvalidAccountId,
    /// Enrollment operation failed.
    Enrollment(EnrollmentError),
    /// Store readiness probe failed.
    Unavailable(StoreError),
    /// Blocking task was cancelled or panicked.
    TaskFailed,
}

impl From<EnrollmentError> for ApiError {
    fn from(value: EnrollmentError) -> Self {
        Self::Enrollment(value)
    }
}

impl ApiError {
    /// HTTP status for the failure.
    const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidProgramId | Self::InvalidAccountId => StatusCode::BAD_REQUEST,
            Self::Enrollment(err) => match err {
                EnrollmentError::Unauthenticated => StatusCode::UNAUTHORIZED,
                EnrollmentError::ProgramNotFound
                | EnrollmentError::EnrollmentNotFound
                | EnrollmentError::AttendeeNotFound => StatusCode::NOT_FOUND,
                EnrollmentError::AlreadyEnrolled {
                    ..
                } => StatusCode::BAD_REQUEST,
                EnrollmentError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::TaskFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Audit label for the failure.
    const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidProgramId => "invalid_program_id",
            Self::InvalidAccountId => "invalid_account_id",
            Self::Enrollment(err) => err.kind(),
            Self::Unavailable(_) => "store_unavailable",
            Self::TaskFailed => "task_failed",
        }
    }

    /// Store failure carried by this error, if any.
    const fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Enrollment(EnrollmentError::Store(err)) | Self::Unavailable(err) => Some(err),
            _ => None,
        }
    }

    /// Client-facing body for the failure.
    fn body(&self, route: RouteSpec) -> ErrorBody {
        let (message, enrollment_status) = match self {
            Self::InvalidProgramId => ("invalid program id".to_string(), None),
            Self::InvalidAccountId => ("invalid account id".to_string(), None),
            Self::Enrollment(
                err @ EnrollmentError::AlreadyEnrolled {
                    status,
                },
            ) => (err.to_string(), Some(status.clone())),
            Self::Enrollment(EnrollmentError::Store(_)) | Self::TaskFailed => {
                (route.server_error.to_string(), None)
            }
            Self::Enrollment(err) => (err.to_string(), None),
            Self::Unavailable(_) => ("Store unavailable".to_string(), None),
        };
        ErrorBody {
            message,
            enrollment_status,
        }
    }
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Runs an operation on the blocking pool, then renders and audits the result.
async fn respond<T, F>(state: &AppState, route: RouteSpec, ctx: &RequestContext, op: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce(&EnrollmentManager, Identity) -> Result<T, ApiError> + Send + 'static,
{
    let started = Instant::now();
    // Rejected credentials degrade to anonymous; operations enforce auth.
    let identity = state.identity.resolve(ctx).unwrap_or_default();
    let manager = state.manager.clone();
    let result = tokio::task::spawn_blocking(move || op(&manager, identity))
        .await
        .unwrap_or_else(|_| Err(ApiError::TaskFailed));
    let (status, error_kind, response) = match result {
        Ok(body) => (route.success, None, (route.success, Json(body)).into_response()),
        Err(err) => {
            if let Some(store_error) = err.store_error() {
                state.audit.record_store_error(&StoreErrorEvent::new(route.path, store_error));
            }
            let status = err.status();
            (status, Some(err.kind()), (status, Json(err.body(route))).into_response())
        }
    };
    state.audit.record(&RequestAuditEvent::new(RequestAuditEventParams {
        method: route.method,
        route: route.path,
        peer_ip: ctx.peer_ip.map(|ip| ip.to_string()),
        status: status.as_u16(),
        account_id: identity.account_id(),
        error_kind,
        elapsed: started.elapsed(),
    }));
    response
}

/// Builds the identity context from connection and headers.
fn request_context(peer: SocketAddr, headers: &HeaderMap) -> RequestContext {
    let auth_header =
        headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()).map(str::to_string);
    RequestContext::http(Some(peer.ip()), auth_header)
}

/// Parses a program path segment.
fn parse_program_id(raw: &str) -> Result<ProgramId, ApiError> {
    raw.parse().map_err(|_| ApiError::InvalidProgramId)
}

/// Parses an account path segment.
fn parse_account_id(raw: &str) -> Result<AccountId, ApiError> {
    raw.parse().map_err(|_| ApiError::InvalidAccountId)
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Reports liveness and store reachability.
async fn health(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let ctx = request_context(peer, &headers);
    respond(&state, HEALTH, &ctx, |manager, _identity| {
        manager.store().readiness().map_err(ApiError::Unavailable)?;
        Ok(HealthResponse {
            status: "ok",
        })
    })
    .await
}

/// Lists active programs.
async fn list_programs(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let ctx = request_context(peer, &headers);
    respond(&state, LIST_PROGRAMS, &ctx, |manager, _identity| Ok(manager.active_programs()?)).await
}

/// Loads one active program.
async fn get_program(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(program_id): Path<String>,
) -> Response {
    let ctx = request_context(peer, &headers);
    respond(&state, GET_PROGRAM, &ctx, move |manager, _identity| {
        let program_id = parse_program_id(&program_id)?;
        Ok(manager.program(program_id)?)
    })
    .await
}

/// Enrolls the caller.
async fn enroll(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(program_id): Path<String>,
) -> Response {
    let ctx = request_context(peer, &headers);
    respond(&state, ENROLL, &ctx, move |manager, identity| {
        let program_id = parse_program_id(&program_id)?;
        let record = manager.enroll_in_program(program_id, identity)?;
        Ok(EnrollResponse {
            message: "Successfully enrolled in program",
            record,
        })
    })
    .await
}

/// Removes the caller's enrollment.
async fn unenroll(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(program_id): Path<String>,
) -> Response {
    let ctx = request_context(peer, &headers);
    respond(&state, UNENROLL, &ctx, move |manager, identity| {
        let program_id = parse_program_id(&program_id)?;
        let confirmation = manager.unenroll_from_program(program_id, identity)?;
        Ok(UnenrollResponse {
            message: "Successfully unenrolled from program",
            confirmation,
        })
    })
    .await
}

/// Reports the caller's enrollment state.
async fn enrollment_status(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(program_id): Path<String>,
) -> Response {
    let ctx = request_context(peer, &headers);
    respond(&state, ENROLLMENT_STATUS, &ctx, move |manager, identity| {
        let program_id = parse_program_id(&program_id)?;
        Ok(manager.check_enrollment_status(program_id, identity)?)
    })
    .await
}

/// Lists attendees of one program.
async fn program_attendees(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(program_id): Path<String>,
) -> Response {
    let ctx = request_context(peer, &headers);
    respond(&state, PROGRAM_ATTENDEES, &ctx, move |manager, identity| {
        let program_id = parse_program_id(&program_id)?;
        Ok(manager.program_attendees(program_id, identity)?)
    })
    .await
}

/// Counts attendees of one program.
async fn attendee_count(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(program_id): Path<String>,
) -> Response {
    let ctx = request_context(peer, &headers);
    respond(&state, ATTENDEE_COUNT, &ctx, move |manager, _identity| {
        let program_id = parse_program_id(&program_id)?;
        Ok(manager.total_attendees(program_id)?)
    })
    .await
}

/// Loads one attendee row.
async fn attendee_by_id(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path((program_id, account_id)): Path<(String, String)>,
) -> Response {
    let ctx = request_context(peer, &headers);
    respond(&state, ATTENDEE_BY_ID, &ctx, move |manager, identity| {
        let program_id = parse_program_id(&program_id)?;
        let account_id = parse_account_id(&account_id)?;
        Ok(manager.attendee_by_id(program_id, account_id, identity)?)
    })
    .await
}

/// Lists attendees across every program.
async fn all_attendees(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let ctx = request_context(peer, &headers);
    respond(&state, ALL_ATTENDEES, &ctx, |manager, identity| {
        Ok(manager.all_program_attendees(identity)?)
    })
    .await
}

/// Lists programs the caller is enrolled in.
async fn my_programs(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let ctx = request_context(peer, &headers);
    respond(&state, MY_PROGRAMS, &ctx, |manager, identity| {
        Ok(manager.my_enrolled_programs(identity)?)
    })
    .await
}
