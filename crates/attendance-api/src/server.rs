// crates/attendance-api/src/server.rs
// ============================================================================
// Module: Attendance Server
// Description: Server construction and HTTP serving for the attendance API.
// Purpose: Wire config, store, identity, and audit into an axum service.
// Dependencies: attendance-config, attendance-core, attendance-store-sqlite,
//               axum, tokio, tower-http
// ============================================================================

//! ## Overview
//! [`AttendanceServer`] validates configuration, selects the store backend,
//! and serves the routes from [`crate::routes`] under the configured base
//! path. Construction fails closed: invalid config, an unopenable store, or an
//! unopenable audit log stop startup before any socket is bound.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use attendance_config::AttendanceConfig;
use attendance_config::ServerAuditConfig;
use attendance_config::StoreConfig;
use attendance_config::StoreType;
use attendance_core::CatalogSnapshot;
use attendance_core::Clock;
use attendance_core::EnrollmentManager;
use attendance_core::InMemoryAttendanceStore;
use attendance_core::SharedAttendanceStore;
use attendance_core::SystemClock;
use attendance_store_sqlite::SqliteAttendanceStore;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;

use crate::audit::AttendanceAuditSink;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;
use crate::auth::BearerTokenIdentityProvider;
use crate::auth::IdentityProvider;
use crate::routes::AppState;
use crate::routes::api_router;

// ============================================================================
// SECTION: Server
// ============================================================================

/// Attendance HTTP server.
pub struct AttendanceServer {
    /// Validated configuration.
    config: AttendanceConfig,
    /// Enrollment operations.
    manager: EnrollmentManager,
    /// Caller identity resolution.
    identity: Arc<dyn IdentityProvider>,
    /// Request audit sink.
    audit: Arc<dyn AttendanceAuditSink>,
}

impl AttendanceServer {
    /// Builds a server from configuration, opening the configured store.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError`] when config, store, or audit setup fails.
    pub fn from_config(config: AttendanceConfig) -> Result<Self, ApiServerError> {
        config.validate().map_err(|err| ApiServerError::Config(err.to_string()))?;
        let store = build_store(&config.store, None)?;
        Self::with_store(config, store, Arc::new(SystemClock))
    }

    /// Builds a server over an existing store and clock.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError`] when config or audit setup fails.
    pub fn with_store(
        config: AttendanceConfig,
        store: SharedAttendanceStore,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self, ApiServerError> {
        config.validate().map_err(|err| ApiServerError::Config(err.to_string()))?;
        let audit = build_audit_sink(&config.server.audit)?;
        let identity = BearerTokenIdentityProvider::from_config(&config.server.auth);
        if identity.is_empty() {
            emit_no_tokens_warning();
        }
        Ok(Self {
            manager: EnrollmentManager::new(store, clock),
            identity: Arc::new(identity),
            audit,
            config,
        })
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn AttendanceAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Replaces the identity provider.
    #[must_use]
    pub fn with_identity_provider(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &AttendanceConfig {
        &self.config
    }

    /// Builds the axum router with base path, body limit, and CORS applied.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError::Config`] when an allowed origin is not a
    /// valid header value.
    pub fn router(&self) -> Result<Router, ApiServerError> {
        let state = Arc::new(AppState {
            manager: self.manager.clone(),
            identity: Arc::clone(&self.identity),
            audit: Arc::clone(&self.audit),
        });
        let api = api_router(state);
        let base_path = self.config.server.base_path.as_str();
        let app = if base_path == "/" { api } else { Router::new().nest(base_path, api) };
        let app = app.layer(DefaultBodyLimit::max(self.config.server.max_body_bytes));
        match cors_layer(&self.config.server.allowed_origins)? {
            Some(cors) => Ok(app.layer(cors)),
            None => Ok(app),
        }
    }

    /// Binds the configured address and serves until interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ApiServerError> {
        let addr = self
            .config
            .server
            .bind_addr()
            .map_err(|err| ApiServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|_| ApiServerError::Transport("http bind failed".to_string()))?;
        self.serve_on(listener).await
    }

    /// Serves on an already bound listener until interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError`] when the router cannot be built or serving
    /// fails.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), ApiServerError> {
        let app = self.router()?;
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|_| ApiServerError::Transport("http server failed".to_string()))
    }
}

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Opens the configured store backend, optionally seeding a catalog.
///
/// # Errors
///
/// Returns [`ApiServerError`] when the backend cannot be opened or seeded.
pub fn build_store(
    config: &StoreConfig,
    catalog: Option<CatalogSnapshot>,
) -> Result<SharedAttendanceStore, ApiServerError> {
    match config.store_type {
        StoreType::Memory => {
            let store = InMemoryAttendanceStore::new();
            if let Some(snapshot) = catalog {
                store.import(snapshot).map_err(|err| ApiServerError::Init(err.to_string()))?;
            }
            Ok(SharedAttendanceStore::from_store(store))
        }
        StoreType::Sqlite => {
            let sqlite_config = config.sqlite_config().ok_or_else(|| {
                ApiServerError::Config("sqlite store requires store.path".to_string())
            })?;
            let store = SqliteAttendanceStore::new(sqlite_config)
                .map_err(|err| ApiServerError::Init(err.to_string()))?;
            if let Some(snapshot) = catalog {
                store
                    .import_catalog(&snapshot)
                    .map_err(|err| ApiServerError::Init(err.to_string()))?;
            }
            Ok(SharedAttendanceStore::from_store(store))
        }
    }
}

/// Builds the audit sink selected by configuration.
fn build_audit_sink(
    config: &ServerAuditConfig,
) -> Result<Arc<dyn AttendanceAuditSink>, ApiServerError> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match config.path.as_deref() {
        Some(path) => {
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| ApiServerError::Init(format!("audit log open failed: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

/// Builds the CORS layer, or `None` when no origins are configured.
fn cors_layer(origins: &[String]) -> Result<Option<CorsLayer>, ApiServerError> {
    if origins.is_empty() {
        return Ok(None);
    }
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin.trim()).map_err(|_| {
                ApiServerError::Config(format!("invalid allowed origin: {origin}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);
    Ok(Some(cors))
}

/// Resolves when the process receives an interrupt.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Warns that no caller can authenticate.
fn emit_no_tokens_warning() {
    let _ = writeln!(
        io::stderr(),
        "program-attendance: WARNING: server.auth has no tokens; authenticated routes will \
         reject every request"
    );
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server startup and transport errors.
#[derive(Debug, Error)]
pub enum ApiServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
