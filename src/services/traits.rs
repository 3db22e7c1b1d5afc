//! Collaborator boundaries. The care logic only talks to these traits; the
//! crate ships an in-memory identity provider and a SQLite repository.

use tokio::sync::watch;

use super::error::{IdentityError, InsightError, RepositoryError};
use crate::models::{Medication, MedicationDraft, MedicationUpdate, User, UserRole};

/// Optional profile fields captured at sign-up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignUpDetails {
    pub phone: Option<String>,
    pub linked_patient_id: Option<String>,
    pub caregiver_name: Option<String>,
    pub caregiver_email: Option<String>,
    pub caregiver_phone: Option<String>,
}

/// Account management and auth-state notifications.
pub trait IdentityProvider: Send + Sync {
    fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: UserRole,
        details: SignUpDetails,
    ) -> Result<User, IdentityError>;

    fn sign_in(&self, email: &str, password: &str) -> Result<User, IdentityError>;

    fn sign_out(&self) -> Result<(), IdentityError>;

    fn reset_password(&self, email: &str) -> Result<(), IdentityError>;

    /// Receives the signed-in user on every auth change, `None` when signed out.
    fn subscribe(&self) -> watch::Receiver<Option<User>>;
}

/// Per-user medication storage.
pub trait MedicationRepository: Send + Sync {
    /// Newest first by creation time.
    fn list(&self, user_id: &str) -> Result<Vec<Medication>, RepositoryError>;

    /// Store a new medication and return it with its assigned id.
    fn add(&self, user_id: &str, draft: MedicationDraft) -> Result<Medication, RepositoryError>;

    fn update(
        &self,
        user_id: &str,
        medication_id: &str,
        update: &MedicationUpdate,
    ) -> Result<(), RepositoryError>;

    fn delete(&self, user_id: &str, medication_id: &str) -> Result<(), RepositoryError>;
}

/// Text generation backing the health insight.
pub trait InsightProvider: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, InsightError>;
}
