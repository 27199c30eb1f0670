//! Unlocking credential passed to every gateway-backed operation.

use std::fmt;

use zeroize::Zeroizing;

/// The password that unlocks the vault collection for the current run.
///
/// The wrapped string is wiped from memory when the last copy is dropped and
/// never appears in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Borrow the secret for handing it to the storage gateway.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Compare against a candidate password typed by the user.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_str() == candidate
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
