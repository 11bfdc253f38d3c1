// crates/attendance-core/src/model/identity.rs
// ============================================================================
// Module: Caller Identity
// Description: Explicit caller identity passed into enrollment operations.
// Purpose: Carry the identity provider's verdict without ambient request state.
// Dependencies: crate::model::identifiers
// ============================================================================

//! ## Overview
//! Every enrollment operation takes an [`Identity`] argument. Hosts build it
//! from whatever authentication they run; the core only distinguishes an
//! anonymous caller from one with a verified account identifier.

use crate::model::identifiers::AccountId;

/// Caller identity resolved by the host's identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Identity {
    /// No verified account.
    #[default]
    Anonymous,
    /// Verified account identifier.
    Account(AccountId),
}

impl Identity {
    /// Returns the verified account identifier, if any.
    #[must_use]
    pub const fn account_id(self) -> Option<AccountId> {
        match self {
            Self::Anonymous => None,
            Self::Account(account_id) => Some(account_id),
        }
    }
}

impl From<Option<AccountId>> for Identity {
    fn from(value: Option<AccountId>) -> Self {
        value.map_or(Self::Anonymous, Self::Account)
    }
}
