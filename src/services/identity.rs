//! In-memory identity provider.
//!
//! Accounts live in a map keyed by lower-cased email. Passwords are stored
//! as salted SHA-256 digests. Auth changes are broadcast on a watch channel.

use std::collections::HashMap;
use std::sync::Mutex;

use rand::Rng;
use sha2::{Digest, Sha256};
use tokio::sync::watch;
use uuid::Uuid;

use super::error::IdentityError;
use super::traits::{IdentityProvider, SignUpDetails};
use crate::models::{User, UserRole};

struct Account {
    salt: [u8; 16],
    password_hash: [u8; 32],
    user: Option<User>,
}

pub struct InMemoryIdentity {
    configured: bool,
    accounts: Mutex<HashMap<String, Account>>,
    auth_state: watch::Sender<Option<User>>,
}

impl Default for InMemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        let (auth_state, _) = watch::channel(None);
        Self {
            configured: true,
            accounts: Mutex::new(HashMap::new()),
            auth_state,
        }
    }

    /// Provider with no backing configuration: every call fails with
    /// `NotConfigured` and subscribers only ever see `None`.
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    fn check_config(&self) -> Result<(), IdentityError> {
        if self.configured {
            Ok(())
        } else {
            Err(IdentityError::NotConfigured)
        }
    }

    fn accounts(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Account>>, IdentityError> {
        self.accounts.lock().map_err(|_| IdentityError::LockPoisoned)
    }

    /// Drop the stored profile for an account, keeping its credentials.
    #[cfg(test)]
    fn forget_profile(&self, email: &str) {
        if let Ok(mut accounts) = self.accounts() {
            if let Some(account) = accounts.get_mut(&normalize_email(email)) {
                account.user = None;
            }
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(salt: &[u8; 16], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

/// Short readable patient id: `PC-` and five digits.
pub fn generate_patient_display_id() -> String {
    let n: u32 = rand::thread_rng().gen_range(10_000..100_000);
    format!("PC-{n}")
}

impl IdentityProvider for InMemoryIdentity {
    fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: UserRole,
        details: SignUpDetails,
    ) -> Result<User, IdentityError> {
        self.check_config()?;
        let key = normalize_email(email);
        let mut accounts = self.accounts()?;
        if accounts.contains_key(&key) {
            return Err(IdentityError::EmailInUse);
        }

        let id = Uuid::new_v4().to_string();
        let mut user = User::new(&id, name, role, email.trim());
        user.phone = details.phone.unwrap_or_default();
        user.linked_patient_id = details.linked_patient_id;
        user.caregiver_name = details.caregiver_name;
        user.caregiver_email = details.caregiver_email;
        user.caregiver_phone = details.caregiver_phone;
        if role == UserRole::Patient {
            user.patient_display_id = Some(generate_patient_display_id());
        }

        let salt: [u8; 16] = rand::thread_rng().gen();
        accounts.insert(
            key,
            Account {
                salt,
                password_hash: hash_password(&salt, password),
                user: Some(user.clone()),
            },
        );
        drop(accounts);

        tracing::info!(user_id = %user.id, role = %role, "Account created");
        self.auth_state.send_replace(Some(user.clone()));
        Ok(user)
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<User, IdentityError> {
        self.check_config()?;
        let accounts = self.accounts()?;
        let account = accounts
            .get(&normalize_email(email))
            .ok_or(IdentityError::InvalidCredentials)?;
        if hash_password(&account.salt, password) != account.password_hash {
            return Err(IdentityError::InvalidCredentials);
        }
        let user = account.user.clone().ok_or(IdentityError::UserDataMissing)?;
        drop(accounts);

        self.auth_state.send_replace(Some(user.clone()));
        Ok(user)
    }

    fn sign_out(&self) -> Result<(), IdentityError> {
        self.check_config()?;
        self.auth_state.send_replace(None);
        Ok(())
    }

    fn reset_password(&self, email: &str) -> Result<(), IdentityError> {
        self.check_config()?;
        if !self.accounts()?.contains_key(&normalize_email(email)) {
            return Err(IdentityError::UnknownEmail);
        }
        tracing::info!("Password reset requested");
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.auth_state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_up_patient(identity: &InMemoryIdentity) -> User {
        identity
            .sign_up(
                "Dana@Example.com",
                "hunter22",
                "Dana Park",
                UserRole::Patient,
                SignUpDetails::default(),
            )
            .unwrap()
    }

    #[test]
    fn patient_sign_up_gets_display_id() {
        let identity = InMemoryIdentity::new();
        let user = sign_up_patient(&identity);
        let display = user.patient_display_id.unwrap();
        assert!(display.starts_with("PC-"));
        assert_eq!(display.len(), 8);
        let n: u32 = display[3..].parse().unwrap();
        assert!((10_000..100_000).contains(&n));
    }

    #[test]
    fn caregiver_has_no_display_id() {
        let identity = InMemoryIdentity::new();
        let details = SignUpDetails {
            linked_patient_id: Some("PC-88231".into()),
            ..Default::default()
        };
        let user = identity
            .sign_up("cg@example.com", "pw", "Care Giver", UserRole::Caregiver, details)
            .unwrap();
        assert!(user.patient_display_id.is_none());
        assert_eq!(user.linked_patient_id.as_deref(), Some("PC-88231"));
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let identity = InMemoryIdentity::new();
        sign_up_patient(&identity);
        let err = identity
            .sign_up("dana@example.com", "x", "Other", UserRole::Caregiver, SignUpDetails::default())
            .unwrap_err();
        assert_eq!(err, IdentityError::EmailInUse);
    }

    #[test]
    fn sign_in_checks_password() {
        let identity = InMemoryIdentity::new();
        let created = sign_up_patient(&identity);

        assert_eq!(identity.sign_in("dana@example.com", "hunter22").unwrap(), created);
        assert_eq!(
            identity.sign_in("dana@example.com", "wrong").unwrap_err(),
            IdentityError::InvalidCredentials
        );
        assert_eq!(
            identity.sign_in("nobody@example.com", "hunter22").unwrap_err(),
            IdentityError::InvalidCredentials
        );
    }

    #[test]
    fn missing_profile_is_reported() {
        let identity = InMemoryIdentity::new();
        sign_up_patient(&identity);
        identity.forget_profile("dana@example.com");
        assert_eq!(
            identity.sign_in("dana@example.com", "hunter22").unwrap_err(),
            IdentityError::UserDataMissing
        );
    }

    #[test]
    fn subscribers_see_auth_changes() {
        let identity = InMemoryIdentity::new();
        let rx = identity.subscribe();
        assert!(rx.borrow().is_none());

        let user = sign_up_patient(&identity);
        assert_eq!(rx.borrow().as_ref().map(|u| u.id.clone()), Some(user.id));

        identity.sign_out().unwrap();
        assert!(rx.borrow().is_none());
    }

    #[test]
    fn unconfigured_provider_refuses_everything() {
        let identity = InMemoryIdentity::unconfigured();
        assert_eq!(identity.sign_in("a@b.c", "x").unwrap_err(), IdentityError::NotConfigured);
        assert_eq!(identity.sign_out().unwrap_err(), IdentityError::NotConfigured);
        assert!(identity.subscribe().borrow().is_none());
    }

    #[test]
    fn reset_password_requires_known_email() {
        let identity = InMemoryIdentity::new();
        sign_up_patient(&identity);
        assert!(identity.reset_password("DANA@example.com").is_ok());
        assert_eq!(
            identity.reset_password("x@example.com").unwrap_err(),
            IdentityError::UnknownEmail
        );
    }
}
