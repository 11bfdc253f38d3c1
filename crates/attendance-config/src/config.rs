// crates/attendance-config/src/config.rs
// ============================================================================
// Module: Attendance Configuration
// Description: Configuration loading and validation for the attendance server.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: attendance-core, attendance-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then the `PROGRAM_ATTENDANCE_CONFIG`
//! environment variable, then `program-attendance.toml` in the working
//! directory. Missing or invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use attendance_core::AccountId;
use attendance_store_sqlite::MAX_READ_POOL_SIZE;
use attendance_store_sqlite::SqliteStoreConfig;
use attendance_store_sqlite::SqliteStoreMode;
use attendance_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "program-attendance.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "PROGRAM_ATTENDANCE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of server auth tokens.
pub(crate) const MAX_AUTH_TOKENS: usize = 64;
/// Maximum length of a server auth token.
pub(crate) const MAX_AUTH_TOKEN_LENGTH: usize = 256;
/// Maximum number of CORS origins.
pub(crate) const MAX_ALLOWED_ORIGINS: usize = 64;
/// Maximum length of a route prefix.
pub(crate) const MAX_BASE_PATH_LENGTH: usize = 128;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Program attendance server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttendanceConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Store backend configuration.
    #[serde(default)]
    pub store: StoreConfig,
}

impl AttendanceConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.store.validate()?;
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Route prefix for every endpoint.
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Origins allowed by CORS. Empty disables cross-origin access.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Bearer token table for the identity provider.
    #[serde(default)]
    pub auth: ServerAuthConfig,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            base_path: default_base_path(),
            max_body_bytes: default_max_body_bytes(),
            allowed_origins: Vec::new(),
            auth: ServerAuthConfig::default(),
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let bind = self.bind.trim();
        if bind.is_empty() {
            return Err(ConfigError::Invalid("server.bind must be non-empty".to_string()));
        }
        bind.parse::<SocketAddr>().map_err(|_| {
            ConfigError::Invalid(format!("server.bind is not a socket address: {bind}"))
        })?;
        validate_base_path(&self.base_path)?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.allowed_origins.len() > MAX_ALLOWED_ORIGINS {
            return Err(ConfigError::Invalid("too many server.allowed_origins".to_string()));
        }
        for origin in &self.allowed_origins {
            let trimmed = origin.trim();
            if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "server.allowed_origins entry must include http:// or https://: {trimmed}"
                )));
            }
        }
        self.auth.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("server.bind is not a socket address".to_string()))
    }
}

/// Bearer token table mapping tokens to accounts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerAuthConfig {
    /// Accepted tokens.
    #[serde(default)]
    pub tokens: Vec<AuthTokenConfig>,
}

impl ServerAuthConfig {
    /// Validates token entries.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.tokens.len() > MAX_AUTH_TOKENS {
            return Err(ConfigError::Invalid("too many auth tokens".to_string()));
        }
        let mut seen = BTreeSet::new();
        for entry in &self.tokens {
            if entry.token.trim().is_empty() {
                return Err(ConfigError::Invalid("auth token must be non-empty".to_string()));
            }
            if entry.token.len() > MAX_AUTH_TOKEN_LENGTH {
                return Err(ConfigError::Invalid("auth token too long".to_string()));
            }
            if entry.account().is_none() {
                return Err(ConfigError::Invalid(format!(
                    "auth token account_id must be between 1 and {}: {}",
                    i64::MAX,
                    entry.account_id
                )));
            }
            if !seen.insert(entry.token.as_str()) {
                return Err(ConfigError::Invalid("duplicate auth token".to_string()));
            }
        }
        Ok(())
    }
}

/// One bearer token entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthTokenConfig {
    /// Opaque bearer token.
    pub token: String,
    /// Account the token authenticates as.
    pub account_id: u64,
}

impl AuthTokenConfig {
    /// Returns the account identifier when it is in the storage range.
    #[must_use]
    pub fn account(&self) -> Option<AccountId> {
        let account = AccountId::from_raw(self.account_id)?;
        account.to_i64().ok().map(|_| account)
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines). Stderr when absent.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("server.audit.path", path)?;
        }
        Ok(())
    }
}

/// Store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Use the in-memory store.
    #[default]
    Memory,
    /// Use the `SQLite`-backed durable store.
    Sqlite,
}

/// Store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Number of reader connections.
    #[serde(default = "default_read_pool_size")]
    pub read_pool_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            read_pool_size: default_read_pool_size(),
        }
    }
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory store must not set path".to_string(),
                    ));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                let path = self
                    .path
                    .as_ref()
                    .ok_or_else(|| ConfigError::Invalid("sqlite store requires path".to_string()))?;
                validate_path_string("store.path", &path.to_string_lossy())?;
                if self.busy_timeout_ms == 0 {
                    return Err(ConfigError::Invalid(
                        "store.busy_timeout_ms must be greater than zero".to_string(),
                    ));
                }
                if self.read_pool_size == 0 || self.read_pool_size > MAX_READ_POOL_SIZE {
                    return Err(ConfigError::Invalid(format!(
                        "store.read_pool_size must be between 1 and {MAX_READ_POOL_SIZE}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Builds the `SQLite` store config when the sqlite backend is selected.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        if self.store_type != StoreType::Sqlite {
            return None;
        }
        let path = self.path.clone()?;
        Some(SqliteStoreConfig {
            path,
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
            read_pool_size: self.read_pool_size,
        })
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates the route prefix.
fn validate_base_path(value: &str) -> Result<(), ConfigError> {
    if !value.starts_with('/') {
        return Err(ConfigError::Invalid("server.base_path must start with '/'".to_string()));
    }
    if value.len() > 1 && value.ends_with('/') {
        return Err(ConfigError::Invalid("server.base_path must not end with '/'".to_string()));
    }
    if value.len() > MAX_BASE_PATH_LENGTH {
        return Err(ConfigError::Invalid("server.base_path exceeds max length".to_string()));
    }
    if value.contains(['{', '}', '*', ':', '?', '#']) || value.contains("//") {
        return Err(ConfigError::Invalid(
            "server.base_path contains reserved characters".to_string(),
        ));
    }
    Ok(())
}

/// Returns the default bind address.
fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

/// Returns the default route prefix.
fn default_base_path() -> String {
    "/api".to_string()
}

/// Returns the default maximum request body size.
pub(crate) const fn default_max_body_bytes() -> usize {
    64 * 1024
}

/// Returns the default audit toggle.
pub(crate) const fn default_audit_enabled() -> bool {
    true
}

/// Returns the default `SQLite` busy timeout.
pub(crate) const fn default_store_busy_timeout_ms() -> u64 {
    5_000
}

/// Returns the default reader pool size.
pub(crate) const fn default_read_pool_size() -> usize {
    4
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
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    fn token(token: &str, account_id: u64) -> AuthTokenConfig {
        AuthTokenConfig {
            token: token.to_string(),
            account_id,
        }
    }

    // ============================================================================
    // SECTION: ServerConfig::validate() Tests
    // ============================================================================

    #[test]
    fn server_config_validate_accepts_default() {
        assert!(ServerConfig::default().validate().is_ok(), "default server config should pass");
    }

    #[test]
    fn server_config_validate_rejects_empty_bind() {
        let config = ServerConfig {
            bind: "  ".to_string(),
            ..ServerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.bind"));
    }

    #[test]
    fn server_config_validate_rejects_unparseable_bind() {
        let config = ServerConfig {
            bind: "localhost".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err(), "hostname without port should fail");
    }

    #[test]
    fn server_config_validate_rejects_zero_body_limit() {
        let config = ServerConfig {
            max_body_bytes: 0,
            ..ServerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_body_bytes"));
    }

    #[test]
    fn server_config_validate_rejects_non_http_origin() {
        let config = ServerConfig {
            allowed_origins: vec!["ftp://example.com".to_string()],
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err(), "non-http origin should fail");
    }

    // ============================================================================
    // SECTION: Base Path Tests
    // ============================================================================

    #[test]
    fn base_path_accepts_root_and_prefix() {
        assert!(validate_base_path("/").is_ok());
        assert!(validate_base_path("/api").is_ok());
        assert!(validate_base_path("/api/v1").is_ok());
    }

    #[test]
    fn base_path_rejects_missing_leading_slash() {
        assert!(validate_base_path("api").is_err());
        assert!(validate_base_path("").is_err());
    }

    #[test]
    fn base_path_rejects_trailing_slash_and_captures() {
        assert!(validate_base_path("/api/").is_err());
        assert!(validate_base_path("/{tenant}").is_err());
        assert!(validate_base_path("/a//b").is_err());
    }

    // ============================================================================
    // SECTION: ServerAuthConfig::validate() Tests
    // ============================================================================

    #[test]
    fn auth_config_accepts_unique_tokens() {
        let config = ServerAuthConfig {
            tokens: vec![token("alpha", 1), token("beta", 2)],
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn auth_config_rejects_duplicate_tokens() {
        let config = ServerAuthConfig {
            tokens: vec![token("alpha", 1), token("alpha", 2)],
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn auth_config_rejects_empty_and_long_tokens() {
        let empty = ServerAuthConfig {
            tokens: vec![token(" ", 1)],
        };
        assert!(empty.validate().is_err());
        let long = ServerAuthConfig {
            tokens: vec![token(&"a".repeat(MAX_AUTH_TOKEN_LENGTH + 1), 1)],
        };
        assert!(long.validate().is_err());
        let at_max = ServerAuthConfig {
            tokens: vec![token(&"a".repeat(MAX_AUTH_TOKEN_LENGTH), 1)],
        };
        assert!(at_max.validate().is_ok());
    }

    #[test]
    fn auth_config_rejects_too_many_tokens() {
        let tokens = (0 ..= MAX_AUTH_TOKENS).map(|idx| token(&format!("t{idx}"), 1)).collect();
        let config = ServerAuthConfig {
            tokens,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn auth_config_rejects_out_of_range_accounts() {
        let zero = ServerAuthConfig {
            tokens: vec![token("alpha", 0)],
        };
        assert!(zero.validate().is_err());
        let huge = ServerAuthConfig {
            tokens: vec![token("alpha", u64::MAX)],
        };
        assert!(huge.validate().is_err());
    }

    // ============================================================================
    // SECTION: StoreConfig::validate() Tests
    // ============================================================================

    #[test]
    fn store_config_memory_rejects_path() {
        let config = StoreConfig {
            path: Some(PathBuf::from("attendance.db")),
            ..StoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn store_config_sqlite_requires_path() {
        let config = StoreConfig {
            store_type: StoreType::Sqlite,
            ..StoreConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("requires path"));
    }

    #[test]
    fn store_config_sqlite_bounds_read_pool() {
        let base = StoreConfig {
            store_type: StoreType::Sqlite,
            path: Some(PathBuf::from("attendance.db")),
            ..StoreConfig::default()
        };
        assert!(base.validate().is_ok());
        let zero = StoreConfig {
            read_pool_size: 0,
            ..base.clone()
        };
        assert!(zero.validate().is_err());
        let too_many = StoreConfig {
            read_pool_size: MAX_READ_POOL_SIZE + 1,
            ..base
        };
        assert!(too_many.validate().is_err());
    }

    #[test]
    fn store_config_sqlite_config_only_for_sqlite() {
        assert!(StoreConfig::default().sqlite_config().is_none());
        let config = StoreConfig {
            store_type: StoreType::Sqlite,
            path: Some(PathBuf::from("data/attendance.db")),
            read_pool_size: 2,
            ..StoreConfig::default()
        };
        let sqlite = config.sqlite_config().unwrap();
        assert_eq!(sqlite.path, PathBuf::from("data/attendance.db"));
        assert_eq!(sqlite.read_pool_size, 2);
    }
}
