//! Authenticated caller identity.

use handmade_market_core::Principal;
use serde::{Deserialize, Serialize};

/// A caller authenticated by the identity provider.
///
/// Carries the principal used to scope caller data and the delegation that
/// the backend accepts as proof of that principal. Stored in the session.
///
/// Implements `Debug` manually to redact the delegation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub principal: Principal,
    delegation: String,
    /// Unix timestamp of the login.
    pub authenticated_at: i64,
}

impl Identity {
    #[must_use]
    pub fn new(principal: Principal, delegation: impl Into<String>) -> Self {
        Self {
            principal,
            delegation: delegation.into(),
            authenticated_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Bearer credential forwarded to the backend.
    #[must_use]
    pub fn delegation(&self) -> &str {
        &self.delegation
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("principal", &self.principal)
            .field("delegation", &"[REDACTED]")
            .field("authenticated_at", &self.authenticated_at)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_debug_redacts_delegation() {
        let identity = Identity::new(Principal::parse("abcde-fg").unwrap(), "very-secret-token");
        let debug = format!("{identity:?}");
        assert!(debug.contains("abcde-fg"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("very-secret-token"));
    }
}
