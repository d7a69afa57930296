use async_trait::async_trait;
use serde::Serialize;

use super::domain::{Attorney, EmailAddress, PageRequest, Prospect};

/// Storage abstraction for prospects and their resumes.
///
/// Implementations persist a prospect and its resume as one unit.
#[async_trait]
pub trait ProspectRepository: Send + Sync {
    /// Inserts resume and prospect atomically. Duplicate emails yield `Conflict`.
    async fn insert(&self, prospect: Prospect) -> Result<Prospect, RepositoryError>;

    /// Most recently updated prospect with this email.
    async fn find_by_email(&self, email: &EmailAddress)
        -> Result<Option<Prospect>, RepositoryError>;

    /// Writes the prospect and its resume if the stored version still equals
    /// `prospect.version`, returning the record with the incremented version.
    /// A version mismatch yields `Stale`.
    async fn update(&self, prospect: Prospect) -> Result<Prospect, RepositoryError>;

    /// Page of prospects ordered by `updated_at`, newest first.
    async fn list(&self, page: PageRequest) -> Result<Vec<Prospect>, RepositoryError>;
}

/// Attorney lookups used by submission and the credential check.
#[async_trait]
pub trait AttorneyDirectory: Send + Sync {
    async fn all(&self) -> Result<Vec<Attorney>, RepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Attorney>, RepositoryError>;

    /// Inserts unless an attorney with the same email exists. Returns whether a row was added.
    async fn insert_if_absent(&self, attorney: Attorney) -> Result<bool, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record was modified by another request")]
    Stale,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound mail hook consumed by the submit operation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// One message addressed to every recipient at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("invalid address '{address}': {reason}")]
    Address { address: String, reason: String },
    #[error("message could not be built: {0}")]
    Message(String),
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}
