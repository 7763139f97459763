//! Operator session: the bearer credential every service call carries.
//!
//! The session is built once and handed to the pipeline controller. It is only
//! cleared through [`Session::invalidate`], which callers invoke when a service
//! answers 401. Transport failures never clear it: a dropped connection says
//! nothing about whether the token is still good.

use secrecy::{ExposeSecret as _, SecretString};

use crate::error::{Result, SmsFormatError};
use crate::service::Backend;

/// Keyring service name the credential is stored under.
pub const KEYRING_SERVICE: &str = "sms-format";
const KEYRING_USER: &str = "api-token";

/// Somewhere a credential survives between runs.
pub trait CredentialStore: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load(&self) -> Result<Option<SecretString>>;

    /// # Errors
    ///
    /// Returns an error if the backing store rejects the write.
    fn save(&self, credential: &SecretString) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the backing store cannot be cleared.
    fn clear(&self) -> Result<()>;
}

/// Credential persisted in the OS keyring.
pub struct KeyringStore {
    service: String,
    user: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            user: user.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, &self.user)
            .map_err(|e| SmsFormatError::Config(format!("keyring unavailable: {e}")))
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE, KEYRING_USER)
    }
}

impl CredentialStore for KeyringStore {
    fn load(&self) -> Result<Option<SecretString>> {
        match self.entry()?.get_password() {
            Ok(token) if !token.is_empty() => Ok(Some(SecretString::from(token))),
            Ok(_) | Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SmsFormatError::Config(format!("failed to read keyring: {e}"))),
        }
    }

    fn save(&self, credential: &SecretString) -> Result<()> {
        self.entry()?
            .set_password(credential.expose_secret())
            .map_err(|e| SmsFormatError::Config(format!("failed to write keyring: {e}")))
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SmsFormatError::Config(format!("failed to clear keyring: {e}"))),
        }
    }
}

/// What a session probe concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The service accepted the credential
    Valid,
    /// No credential is held; the operator has to log in
    Missing,
}

pub struct Session {
    credential: Option<SecretString>,
    store: Option<Box<dyn CredentialStore>>,
}

impl Session {
    /// A session holding `token` in memory only.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            credential: Some(SecretString::from(token.into())),
            store: None,
        }
    }

    /// A session without credential, for backends that need none.
    pub fn anonymous() -> Self {
        Self {
            credential: None,
            store: None,
        }
    }

    /// Restore the credential persisted in `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn from_store(store: Box<dyn CredentialStore>) -> Result<Self> {
        let credential = store.load()?;
        Ok(Self {
            credential,
            store: Some(store),
        })
    }

    /// Keep `token` and persist it when a store is attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the credential.
    pub fn login(&mut self, token: impl Into<String>) -> Result<()> {
        let credential = SecretString::from(token.into());
        if let Some(store) = &self.store {
            store.save(&credential)?;
        }
        self.credential = Some(credential);
        tracing::info!("Credential stored");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// The bearer token to send.
    ///
    /// # Errors
    ///
    /// Returns [`SmsFormatError::AuthExpired`] when no credential is held.
    pub fn credential(&self) -> Result<&SecretString> {
        self.credential.as_ref().ok_or(SmsFormatError::AuthExpired)
    }

    /// Drop the credential, in memory and in the attached store.
    pub fn invalidate(&mut self) {
        if self.credential.take().is_some() {
            tracing::warn!("Credential invalidated");
        }
        if let Some(store) = &self.store
            && let Err(e) = store.clear()
        {
            tracing::error!("Failed to clear stored credential: {e}");
        }
    }

    /// Ask the backend whether the credential is still accepted.
    ///
    /// A 401 invalidates the session and returns [`SmsFormatError::AuthExpired`].
    /// Any other failure is returned as-is and keeps the credential.
    ///
    /// # Errors
    ///
    /// Returns the probe error.
    pub async fn verify<B: Backend>(&mut self, backend: &B) -> Result<SessionStatus> {
        if !self.is_authenticated() && backend.requires_credential() {
            return Ok(SessionStatus::Missing);
        }
        match backend.check_session(self).await {
            Ok(()) => Ok(SessionStatus::Valid),
            Err(SmsFormatError::AuthExpired) => {
                self.invalidate();
                Err(SmsFormatError::AuthExpired)
            }
            Err(e) => {
                tracing::error!("Error checking session: {e}");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MemoryStore(Arc<Mutex<Option<String>>>);

    impl CredentialStore for MemoryStore {
        fn load(&self) -> Result<Option<SecretString>> {
            Ok(self
                .0
                .lock()
                .expect("store lock")
                .clone()
                .map(SecretString::from))
        }

        fn save(&self, credential: &SecretString) -> Result<()> {
            *self.0.lock().expect("store lock") = Some(credential.expose_secret().to_owned());
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            *self.0.lock().expect("store lock") = None;
            Ok(())
        }
    }

    #[test]
    fn test_anonymous_session_has_no_credential() {
        let session = Session::anonymous();
        assert!(!session.is_authenticated());
        assert!(matches!(session.credential(), Err(SmsFormatError::AuthExpired)));
    }

    #[test]
    fn test_login_persists_and_invalidate_clears() -> Result<()> {
        let store = MemoryStore::default();
        let mut session = Session::from_store(Box::new(store.clone()))?;
        assert!(!session.is_authenticated());

        session.login("tok-123")?;
        assert_eq!(session.credential()?.expose_secret(), "tok-123");
        assert!(store.load()?.is_some());

        session.invalidate();
        assert!(!session.is_authenticated());
        assert!(store.load()?.is_none());
        Ok(())
    }

    #[test]
    fn test_restore_from_store() -> Result<()> {
        let store = MemoryStore::default();
        store.save(&SecretString::from("persisted".to_owned()))?;
        let session = Session::from_store(Box::new(store))?;
        assert_eq!(session.credential()?.expose_secret(), "persisted");
        Ok(())
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let session = Session::new("very-secret");
        assert!(!format!("{session:?}").contains("very-secret"));
    }
}
