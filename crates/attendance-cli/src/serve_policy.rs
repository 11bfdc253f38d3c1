// crates/attendance-cli/src/serve_policy.rs
// ============================================================================
// Module: Serve Policy
// Description: Network exposure checks for the server launcher.
// Purpose: Keep binds on loopback unless exposure is explicitly requested.
// Dependencies: attendance-config, thiserror
// ============================================================================

//! ## Overview
//! Binding to a non-loopback address requires an explicit opt-in (flag or
//! environment) and at least one configured bearer token. TLS is expected to
//! terminate at a reverse proxy in front of the service.

use std::env;
use std::net::SocketAddr;

use attendance_config::AttendanceConfig;
use thiserror::Error;

/// Environment variable enabling non-loopback server binds.
pub const ALLOW_NON_LOOPBACK_ENV: &str = "PROGRAM_ATTENDANCE_ALLOW_NON_LOOPBACK";

/// Bind outcome metadata for startup warnings.
#[derive(Debug, Clone)]
pub struct BindOutcome {
    /// Parsed bind address.
    pub bind_addr: SocketAddr,
    /// True when the server is bound to a non-loopback address.
    pub network_exposed: bool,
    /// Number of configured bearer tokens.
    pub token_count: usize,
    /// Whether audit logging is enabled.
    pub audit_enabled: bool,
}

/// Serve policy failures for bind safety.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServePolicyError {
    /// Environment variable was set to an invalid value.
    #[error("{} has invalid value {value:?} (expected true or false)", ALLOW_NON_LOOPBACK_ENV)]
    InvalidEnv {
        /// Raw environment value.
        value: String,
    },
    /// Bind string failed to parse.
    #[error("invalid bind address {bind:?}: {error}")]
    InvalidBind {
        /// Raw bind value.
        bind: String,
        /// Parse error message.
        error: String,
    },
    /// Non-loopback binding requires explicit opt-in.
    #[error(
        "refusing to bind {bind} without --allow-non-loopback or {}=true",
        ALLOW_NON_LOOPBACK_ENV
    )]
    NonLoopbackOptInRequired {
        /// Bind address.
        bind: String,
    },
    /// Non-loopback binding requires configured tokens.
    #[error("refusing to bind {bind}: server.auth.tokens is empty")]
    NonLoopbackAuthRequired {
        /// Bind address.
        bind: String,
    },
}

/// Resolves the non-loopback opt-in flag from CLI and environment.
///
/// # Errors
/// Returns [`ServePolicyError::InvalidEnv`] when the environment value is invalid.
pub fn resolve_allow_non_loopback(flag: bool) -> Result<bool, ServePolicyError> {
    if flag {
        return Ok(true);
    }
    let Some(value) = env::var_os(ALLOW_NON_LOOPBACK_ENV) else {
        return Ok(false);
    };
    parse_allow_non_loopback_value(&value.to_string_lossy())
}

/// Enforces loopback-by-default binding for the server.
///
/// # Errors
/// Returns [`ServePolicyError`] when the bind violates exposure requirements.
pub fn enforce_local_only(
    config: &AttendanceConfig,
    allow_non_loopback: bool,
) -> Result<BindOutcome, ServePolicyError> {
    let bind = config.server.bind.trim();
    let addr: SocketAddr =
        bind.parse().map_err(|err: std::net::AddrParseError| ServePolicyError::InvalidBind {
            bind: bind.to_string(),
            error: err.to_string(),
        })?;
    let token_count = config.server.auth.tokens.len();
    let audit_enabled = config.server.audit.enabled;
    if addr.ip().is_loopback() {
        return Ok(BindOutcome {
            bind_addr: addr,
            network_exposed: false,
            token_count,
            audit_enabled,
        });
    }
    if !allow_non_loopback {
        return Err(ServePolicyError::NonLoopbackOptInRequired {
            bind: bind.to_string(),
        });
    }
    if token_count == 0 {
        return Err(ServePolicyError::NonLoopbackAuthRequired {
            bind: bind.to_string(),
        });
    }
    Ok(BindOutcome {
        bind_addr: addr,
        network_exposed: true,
        token_count,
        audit_enabled,
    })
}

/// Parses a bool-ish string (true/false/1/0/yes/no/on/off).
fn parse_boolish(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Parses an env value for allow-non-loopback.
fn parse_allow_non_loopback_value(value: &str) -> Result<bool, ServePolicyError> {
    parse_boolish(value).ok_or_else(|| ServePolicyError::InvalidEnv {
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        reason = "Test helpers use expect/expect_err for concise failure messages."
    )]

    use attendance_config::AttendanceConfig;

    use super::ServePolicyError;
    use super::enforce_local_only;
    use super::parse_allow_non_loopback_value;

    const EXPOSED: &str = r#"
[server]
bind = "0.0.0.0:5000"

[server.auth]
tokens = [{ token = "ana-token", account_id = 7 }]
"#;

    #[test]
    fn loopback_needs_no_opt_in() {
        let config = AttendanceConfig::from_toml_str("").expect("default config");
        let outcome = enforce_local_only(&config, false).expect("loopback bind");
        assert!(!outcome.network_exposed);
        assert_eq!(outcome.token_count, 0);
    }

    #[test]
    fn non_loopback_requires_opt_in() {
        let config = AttendanceConfig::from_toml_str(EXPOSED).expect("config");
        let err = enforce_local_only(&config, false).expect_err("expected opt-in error");
        assert!(matches!(err, ServePolicyError::NonLoopbackOptInRequired { .. }));
    }

    #[test]
    fn non_loopback_requires_tokens() {
        let mut config = AttendanceConfig::from_toml_str(EXPOSED).expect("config");
        config.server.auth.tokens.clear();
        let err = enforce_local_only(&config, true).expect_err("expected auth error");
        assert!(matches!(err, ServePolicyError::NonLoopbackAuthRequired { .. }));
    }

    #[test]
    fn non_loopback_allowed_with_opt_in_and_tokens() {
        let config = AttendanceConfig::from_toml_str(EXPOSED).expect("config");
        let outcome = enforce_local_only(&config, true).expect("expected success");
        assert!(outcome.network_exposed);
        assert_eq!(outcome.token_count, 1);
    }

    #[test]
    fn parse_allow_non_loopback_accepts_true() {
        assert!(parse_allow_non_loopback_value(" Yes ").expect("parse env"));
        assert!(!parse_allow_non_loopback_value("0").expect("parse env"));
    }

    #[test]
    fn parse_allow_non_loopback_rejects_invalid() {
        let err = parse_allow_non_loopback_value("maybe").expect_err("expected invalid env");
        assert!(matches!(err, ServePolicyError::InvalidEnv { .. }));
    }
}
