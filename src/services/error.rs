//! Collaborator error types. Each collaborator fails on its own terms so
//! the session can decide which failures become user notices.

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdentityError {
    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("This email is already registered.")]
    EmailInUse,

    #[error("User data not found.")]
    UserDataMissing,

    #[error("No user found with this email address.")]
    UnknownEmail,

    #[error("Identity provider is not configured")]
    NotConfigured,

    #[error("Account store lock poisoned")]
    LockPoisoned,
}

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Medication not found: {0}")]
    NotFound(String),

    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InsightError {
    #[error("Insight provider unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed insight response: {0}")]
    MalformedResponse(String),
}
