//! Session service - the simulated auth collaborator
//!
//! Keeps the current [`UserIdentity`] in memory and mirrors it to the store
//! under `localUser`. The store write always happens before the in-memory
//! identity changes.

use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::domain::result::{Error, Result};
use crate::domain::UserIdentity;
use crate::ports::KeyValueStore;

pub const LOCAL_USER_KEY: &str = "localUser";

pub struct SessionService {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<Option<UserIdentity>>,
}

impl SessionService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            current: RwLock::new(None),
        }
    }

    /// Restore the stored identity, or start a fresh guest session
    pub fn bootstrap(&self) -> Result<UserIdentity> {
        let stored = match self.store.get(LOCAL_USER_KEY)? {
            Some(raw) => match serde_json::from_str::<UserIdentity>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("{}; starting a new guest session", Error::corrupt(LOCAL_USER_KEY, e));
                    None
                }
            },
            None => None,
        };

        match stored {
            Some(user) => {
                self.replace(Some(user.clone()))?;
                Ok(user)
            }
            None => self.switch_to(UserIdentity::anonymous()),
        }
    }

    /// Identity currently in use, `None` before bootstrap or after sign-out
    pub fn current(&self) -> Option<UserIdentity> {
        self.current.read().ok().and_then(|c| c.clone())
    }

    pub fn is_ready(&self) -> bool {
        self.current().is_some()
    }

    pub fn sign_up(&self, email: &str) -> Result<UserIdentity> {
        let email = validate_email(email)?;
        let user = self.switch_to(UserIdentity::registered(email))?;
        info!(user_id = %user.id, "signed up");
        Ok(user)
    }

    /// Sign in with an email address. Credentials are not checked and every
    /// sign-in yields a new user id.
    pub fn sign_in(&self, email: &str) -> Result<UserIdentity> {
        let email = validate_email(email)?;
        let user = self.switch_to(UserIdentity::registered(email))?;
        info!(user_id = %user.id, "signed in");
        Ok(user)
    }

    pub fn sign_in_anonymously(&self) -> Result<UserIdentity> {
        let user = self.switch_to(UserIdentity::anonymous())?;
        info!(user_id = %user.id, "guest session started");
        Ok(user)
    }

    /// Forget the identity. Nothing is re-created automatically.
    pub fn sign_out(&self) -> Result<()> {
        self.store.remove(LOCAL_USER_KEY)?;
        self.replace(None)?;
        info!("signed out");
        Ok(())
    }

    fn switch_to(&self, user: UserIdentity) -> Result<UserIdentity> {
        let json = serde_json::to_string(&user)?;
        self.store.set(LOCAL_USER_KEY, &json)?;
        self.replace(Some(user.clone()))?;
        Ok(user)
    }

    fn replace(&self, user: Option<UserIdentity>) -> Result<()> {
        let mut current = self
            .current
            .write()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))?;
        *current = user;
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<&str> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid {
        return Err(Error::validation(format!("Invalid email address: '{}'", email)));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FlakyStore, MemoryStore};

    #[test]
    fn test_bootstrap_creates_and_persists_guest() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionService::new(store.clone());
        assert!(!session.is_ready());

        let guest = session.bootstrap().unwrap();
        assert!(guest.is_anonymous);
        assert_eq!(session.current(), Some(guest.clone()));

        let again = SessionService::new(store).bootstrap().unwrap();
        assert_eq!(again, guest);
    }

    #[test]
    fn test_corrupt_stored_user_is_replaced() {
        let store = Arc::new(MemoryStore::with_entries([(LOCAL_USER_KEY, "{oops")]));
        let session = SessionService::new(store.clone());

        let guest = session.bootstrap().unwrap();
        assert!(guest.is_anonymous);
        let stored: UserIdentity =
            serde_json::from_str(&store.get(LOCAL_USER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored, guest);
    }

    #[test]
    fn test_sign_in_and_out() {
        let session = SessionService::new(Arc::new(MemoryStore::new()));
        let user = session.sign_in(" ana@example.com ").unwrap();
        assert!(!user.is_anonymous);
        assert!(!user.is_premium);
        assert_eq!(user.email.as_deref(), Some("ana@example.com"));

        session.sign_out().unwrap();
        assert_eq!(session.current(), None);
    }

    #[test]
    fn test_invalid_email_rejected() {
        let session = SessionService::new(Arc::new(MemoryStore::new()));
        assert!(matches!(session.sign_up("nobody"), Err(Error::Validation(_))));
        assert!(matches!(session.sign_in("@x"), Err(Error::Validation(_))));
        assert_eq!(session.current(), None);
    }

    #[test]
    fn test_failed_write_keeps_previous_identity() {
        let flaky = Arc::new(FlakyStore::new(Arc::new(MemoryStore::new())));
        let session = SessionService::new(flaky.clone());
        let guest = session.bootstrap().unwrap();

        flaky.fail_all_writes();
        assert!(session.sign_up("ana@example.com").is_err());
        assert_eq!(session.current(), Some(guest));
    }
}
