//! Unlocked-session value.

use tracing::warn;

use noetiq_core::{Credential, Error, Result};

/// Holds the credential for the current run, or nothing while locked.
///
/// Gateway-backed operations take a `&Credential`, and the only way to get
/// one is [`Session::credential`] on an established session.
#[derive(Debug, Default)]
pub struct Session {
    credential: Option<Credential>,
}

impl Session {
    /// A locked session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the credential. Nothing is validated locally; the first gateway
    /// call that uses it decides whether it is correct.
    pub fn establish(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }

    pub fn clear(&mut self) {
        self.credential = None;
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Like [`Session::credential`] but failing with a credential error
    /// when locked.
    pub fn require(&self) -> Result<&Credential> {
        self.credential
            .as_ref()
            .ok_or_else(|| Error::Credential("Session is locked".to_string()))
    }

    pub fn is_established(&self) -> bool {
        self.credential.is_some()
    }

    /// Clear the session if `error` says the gateway rejected the credential.
    /// Returns whether the session was invalidated.
    pub fn invalidate_on(&mut self, error: &Error) -> bool {
        if error.is_credential() && self.credential.is_some() {
            warn!(component = "session", error = %error, "Credential rejected, locking session");
            self.credential = None;
            return true;
        }
        false
    }

    /// Pass `result` through, locking the session first if it failed on the
    /// credential.
    pub fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.invalidate_on(e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_locked() {
        let session = Session::new();
        assert!(!session.is_established());
        assert!(session.credential().is_none());
        assert!(session.require().unwrap_err().is_credential());
    }

    #[test]
    fn test_establish_and_clear() {
        let mut session = Session::new();
        session.establish(Credential::new("pw"));
        assert!(session.is_established());
        assert!(session.credential().unwrap().matches("pw"));

        session.clear();
        assert!(!session.is_established());
    }

    #[test]
    fn test_invalidate_only_on_credential_errors() {
        let mut session = Session::new();
        session.establish(Credential::new("pw"));

        assert!(!session.invalidate_on(&Error::Transport("timeout".into())));
        assert!(session.is_established());

        assert!(session.invalidate_on(&Error::Credential("Decrypt failed".into())));
        assert!(!session.is_established());
        assert!(!session.invalidate_on(&Error::Credential("again".into())));
    }

    #[test]
    fn test_guard_locks_on_credential_failure_only() {
        let mut session = Session::new();
        session.establish(Credential::new("pw"));

        assert_eq!(session.guard(Ok(3)).unwrap(), 3);
        let transport: Result<()> = Err(Error::Transport("timeout".into()));
        assert!(session.guard(transport).is_err());
        assert!(session.is_established());

        let rejected: Result<()> = Err(Error::Credential("Decrypt failed".into()));
        assert!(session.guard(rejected).unwrap_err().is_credential());
        assert!(!session.is_established());
    }
}
