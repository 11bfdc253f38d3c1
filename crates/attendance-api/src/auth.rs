// crates/attendance-api/src/auth.rs
// ============================================================================
// Module: Identity Resolution
// Description: Bearer-token identity provider for HTTP requests.
// Purpose: Turn request credentials into a verified caller identity.
// Dependencies: attendance-config, attendance-core, thiserror
// ============================================================================

//! ## Overview
//! Token issuance lives outside this service. Requests carry an opaque bearer
//! token that the configured table maps to an account. A request without an
//! authorization header resolves to [`Identity::Anonymous`]; a malformed or
//! unknown credential is reported as [`AuthError`] and callers degrade it to
//! anonymous, so enrollment operations reject both the same way.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::net::IpAddr;

use attendance_config::ServerAuthConfig;
use attendance_core::AccountId;
use attendance_core::Identity;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted authorization header length.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Per-request context used for identity resolution.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Peer IP address when available.
    pub peer_ip: Option<IpAddr>,
    /// Authorization header value.
    pub auth_header: Option<String>,
}

impl RequestContext {
    /// Builds an HTTP request context.
    #[must_use]
    pub const fn http(peer_ip: Option<IpAddr>, auth_header: Option<String>) -> Self {
        Self {
            peer_ip,
            auth_header,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Credential errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Credentials were present but not accepted.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
}

// ============================================================================
// SECTION: Traits
// ============================================================================

/// Resolves the caller identity for a request.
pub trait IdentityProvider: Send + Sync {
    /// Returns the caller identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when credentials are present but invalid.
    fn resolve(&self, ctx: &RequestContext) -> Result<Identity, AuthError>;
}

// ============================================================================
// SECTION: Bearer Tokens
// ============================================================================

/// Identity provider backed by a static token table.
pub struct BearerTokenIdentityProvider {
    /// Token to account mapping.
    tokens: BTreeMap<String, AccountId>,
}

impl BearerTokenIdentityProvider {
    /// Builds the provider from server auth configuration.
    ///
    /// Entries with an invalid account id are dropped.
    #[must_use]
    pub fn from_config(config: &ServerAuthConfig) -> Self {
        let tokens = config
            .tokens
            .iter()
            .filter_map(|entry| entry.account().map(|account| (entry.token.clone(), account)))
            .collect();
        Self {
            tokens,
        }
    }

    /// Returns the number of registered tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true when no tokens are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl IdentityProvider for BearerTokenIdentityProvider {
    fn resolve(&self, ctx: &RequestContext) -> Result<Identity, AuthError> {
        let Some(header) = ctx.auth_header.as_deref() else {
            return Ok(Identity::Anonymous);
        };
        let token = parse_bearer_token(header)?;
        self.tokens
            .get(token)
            .copied()
            .map(Identity::Account)
            .ok_or_else(|| AuthError::Unauthenticated("unknown bearer token".to_string()))
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
fn parse_bearer_token(header: &str) -> Result<&str, AuthError> {
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(AuthError::Unauthenticated("authorization header too large".to_string()));
    }
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::Unauthenticated("invalid authorization header".to_string()));
    }
    Ok(token)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
