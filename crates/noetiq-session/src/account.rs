//! Password setup, login, change, and logout flows.

use std::sync::Arc;

use tracing::{error, info};

use noetiq_core::{Credential, Error, Result, StorageGateway};

use crate::session::Session;

/// What the entry screen should offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPoint {
    /// No password has ever been set.
    FirstRun,
    /// A password exists; show the login prompt with its hint.
    ReturningUser { hint: String },
}

/// Input of the change-password dialog.
#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub current: String,
    pub new: String,
    pub confirm: String,
    pub hint: String,
}

impl PasswordChange {
    /// Local checks, in the order the dialog reports them.
    pub fn validate(&self, session: &Credential) -> Result<()> {
        if !session.matches(&self.current) {
            return Err(Error::Validation(
                "Current password is incorrect".to_string(),
            ));
        }
        if self.new != self.confirm {
            return Err(Error::Validation(
                "New password and confirmation do not match".to_string(),
            ));
        }
        if self.new == self.current {
            return Err(Error::Validation(
                "New password must differ from the current one".to_string(),
            ));
        }
        if self.new.is_empty() {
            return Err(Error::Validation("Password is required".to_string()));
        }
        Ok(())
    }
}

/// Account-level flows around the root password.
pub struct Account {
    gateway: Arc<dyn StorageGateway>,
}

impl Account {
    pub fn new(gateway: Arc<dyn StorageGateway>) -> Self {
        Self { gateway }
    }

    pub async fn entry_point(&self) -> Result<EntryPoint> {
        Ok(match self.gateway.read_public().await? {
            None => EntryPoint::FirstRun,
            Some(public) => EntryPoint::ReturningUser { hint: public.hint },
        })
    }

    /// First-run password setup. Establishes the session on success.
    pub async fn setup(
        &self,
        session: &mut Session,
        password: &str,
        confirm: &str,
        hint: &str,
    ) -> Result<()> {
        if password.is_empty() {
            return Err(Error::Validation("Password is required".to_string()));
        }
        if password != confirm {
            return Err(Error::Validation(
                "Password and confirmation do not match".to_string(),
            ));
        }

        self.gateway.set_password(password, hint).await?;
        session.establish(Credential::new(password));
        info!(component = "account", op = "setup", "Password set");
        Ok(())
    }

    /// Establish the session without checking the password; the first
    /// credentialed call reports a wrong one.
    pub fn login(&self, session: &mut Session, password: &str) {
        session.establish(Credential::new(password));
        info!(component = "account", op = "login", "Session established");
    }

    /// Re-encrypt everything under a new password.
    ///
    /// The session switches to the new password only after the gateway
    /// confirms the re-encryption. A credential rejection locks it.
    pub async fn change_password(
        &self,
        session: &mut Session,
        change: &PasswordChange,
    ) -> Result<()> {
        change.validate(session.require()?)?;

        let reencrypted = self
            .gateway
            .reencrypt_data(&change.current, &change.new, &change.hint)
            .await;
        if let Err(e) = session.guard(reencrypted) {
            error!(
                component = "account",
                op = "change_password",
                error = %e,
                "Re-encryption failed"
            );
            return Err(e);
        }

        session.establish(Credential::new(change.new.as_str()));
        info!(component = "account", op = "change_password", "Password changed");
        Ok(())
    }

    pub fn logout(&self, session: &mut Session) {
        session.clear();
        info!(component = "account", op = "logout", "Session cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(current: &str, new: &str, confirm: &str) -> PasswordChange {
        PasswordChange {
            current: current.into(),
            new: new.into(),
            confirm: confirm.into(),
            hint: String::new(),
        }
    }

    #[test]
    fn test_validate_checks_current_first() {
        let cred = Credential::new("pw");
        let err = change("wrong", "a", "b").validate(&cred).unwrap_err();
        assert!(err.to_string().contains("Current password"));
    }

    #[test]
    fn test_validate_rejects_mismatch_and_reuse() {
        let cred = Credential::new("pw");
        assert!(change("pw", "a", "b").validate(&cred).unwrap_err().is_validation());
        assert!(change("pw", "pw", "pw").validate(&cred).unwrap_err().is_validation());
        assert!(change("pw", "", "").validate(&cred).unwrap_err().is_validation());
        assert!(change("pw", "new", "new").validate(&cred).is_ok());
    }
}
