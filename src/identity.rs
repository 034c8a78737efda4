//! Caller identity
//!
//! The ledger never authenticates anyone. Whoever hosts it hands over an
//! opaque identity for the current invocation through [`IdentityProvider`],
//! and that identity doubles as the storage key for `UserData` and
//! `UserSettings`. Authorization policy, if any, lives with the host.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of whoever invoked the current operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallerIdentity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CallerIdentity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Supplies the identity of the caller for the invocation in progress
pub trait IdentityProvider {
    fn caller(&self) -> CallerIdentity;
}

/// Provider that always reports the same caller.
///
/// Used by the CLI host, which runs exactly one operation per process on
/// behalf of the identity it was started with.
#[derive(Debug, Clone)]
pub struct StaticIdentity(CallerIdentity);

impl StaticIdentity {
    pub fn new(identity: impl Into<CallerIdentity>) -> Self {
        Self(identity.into())
    }
}

impl IdentityProvider for StaticIdentity {
    fn caller(&self) -> CallerIdentity {
        self.0.clone()
    }
}

impl<P: IdentityProvider + ?Sized> IdentityProvider for &P {
    fn caller(&self) -> CallerIdentity {
        (**self).caller()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_identity_reports_same_caller() {
        let provider = StaticIdentity::new("uhCAk_alice");
        assert_eq!(provider.caller(), CallerIdentity::new("uhCAk_alice"));
        assert_eq!(provider.caller().to_string(), "uhCAk_alice");
    }

    #[test]
    fn test_identity_serializes_as_plain_string() {
        let json = serde_json::to_string(&CallerIdentity::new("bob")).unwrap();
        assert_eq!(json, "\"bob\"");
    }
}
