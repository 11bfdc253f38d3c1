// crates/attendance-config/tests/config_load.rs
// ============================================================================
// Module: Config Loading Tests
// Description: File-based loading and validation of program-attendance.toml.
// Purpose: Ensure config files parse, validate, and fail closed on bad input.
// Dependencies: attendance-config, tempfile
// ============================================================================

//! ## Overview
//! Writes configuration files to a temp directory and loads them through
//! [`AttendanceConfig::load`], covering the happy path and each class of
//! rejection (size, encoding, syntax, and semantic validation).

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use attendance_config::AttendanceConfig;
use attendance_config::ConfigError;
use attendance_config::StoreType;
use attendance_store_sqlite::SqliteStoreMode;
use attendance_store_sqlite::SqliteSyncMode;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const FULL_CONFIG: &str = r#"
[server]
bind = "127.0.0.1:5000"
base_path = "/api"
max_body_bytes = 65536
allowed_origins = ["http://localhost:5173"]

[server.auth]
tokens = [
    { token = "ana-token", account_id = 7 },
    { token = "ben-token", account_id = 8 },
]

[server.audit]
enabled = true
path = "audit.log"

[store]
type = "sqlite"
path = "data/attendance.db"
busy_timeout_ms = 2500
journal_mode = "delete"
sync_mode = "normal"
read_pool_size = 2
"#;

fn write_config(dir: &TempDir, content: &[u8]) -> PathBuf {
    let path = dir.path().join("program-attendance.toml");
    std::fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn load_parses_full_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, FULL_CONFIG.as_bytes());
    let config = AttendanceConfig::load(Some(&path)).unwrap();

    assert_eq!(config.server.bind_addr().unwrap().port(), 5000);
    assert_eq!(config.server.base_path, "/api");
    assert_eq!(config.server.allowed_origins, vec!["http://localhost:5173".to_string()]);
    assert_eq!(config.server.auth.tokens.len(), 2);
    assert_eq!(config.server.auth.tokens[1].account().unwrap().get(), 8);
    assert_eq!(config.server.audit.path.as_deref(), Some("audit.log"));

    assert_eq!(config.store.store_type, StoreType::Sqlite);
    let sqlite = config.store.sqlite_config().unwrap();
    assert_eq!(sqlite.busy_timeout_ms, 2500);
    assert_eq!(sqlite.journal_mode, SqliteStoreMode::Delete);
    assert_eq!(sqlite.sync_mode, SqliteSyncMode::Normal);
}

#[test]
fn empty_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, b"");
    let config = AttendanceConfig::load(Some(&path)).unwrap();
    assert_eq!(config.server.bind, "127.0.0.1:5000");
    assert_eq!(config.server.base_path, "/api");
    assert!(config.server.audit.enabled);
    assert!(config.server.auth.tokens.is_empty());
    assert_eq!(config.store.store_type, StoreType::Memory);
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(matches!(AttendanceConfig::load(Some(&path)), Err(ConfigError::Io(_))));
}

#[test]
fn oversized_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut content = b"# padding\n".repeat(110_000);
    content.extend_from_slice(b"[server]\n");
    let path = write_config(&dir, &content);
    let err = AttendanceConfig::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("size limit"));
}

#[test]
fn non_utf8_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &[0xff, 0xfe, 0x00]);
    let err = AttendanceConfig::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("utf-8"));
}

#[test]
fn unknown_fields_fail_to_parse() {
    let err = AttendanceConfig::from_toml_str("[server]\nport = 80\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn semantic_errors_are_invalid() {
    let cases = [
        "[server]\nbind = \"nope\"\n",
        "[server]\nbase_path = \"api\"\n",
        "[server]\nmax_body_bytes = 0\n",
        "[server.auth]\ntokens = [{ token = \"a\", account_id = 0 }]\n",
        "[server.auth]\ntokens = [{ token = \"a\", account_id = 1 }, { token = \"a\", account_id = \
         2 }]\n",
        "[store]\ntype = \"sqlite\"\n",
        "[store]\ntype = \"memory\"\npath = \"x.db\"\n",
        "[store]\ntype = \"sqlite\"\npath = \"x.db\"\nread_pool_size = 65\n",
    ];
    for case in cases {
        let result = AttendanceConfig::from_toml_str(case);
        assert!(matches!(result, Err(ConfigError::Invalid(_))), "expected invalid for {case:?}");
    }
}
