//! Prospect intake: contact form, resume edits, submission, and staff follow-up.

pub mod domain;
pub mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Attorney, AttorneyId, EmailAddress, NewProspect, PageRequest, Prospect, ProspectId,
    ProspectState, ProspectView, Resume, ResumeId, ValidationError,
};
pub use lifecycle::{LifecycleError, Transition};
pub use repository::{
    AttorneyDirectory, Notification, NotificationError, Notifier, ProspectRepository,
    RepositoryError,
};
pub use router::{prospect_router, ProspectApi};
pub use service::{ProspectService, ProspectServiceError};
