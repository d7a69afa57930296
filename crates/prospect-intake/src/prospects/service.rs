use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;
use tracing::{info, warn};

use super::domain::{
    resume_content, Attorney, EmailAddress, NewProspect, PageRequest, Prospect, ProspectView,
    ValidationError,
};
use super::lifecycle::{LifecycleError, Transition};
use super::repository::{
    AttorneyDirectory, Notifier, ProspectRepository, RepositoryError,
};
use crate::notify::submission_notification;

/// Service enforcing the prospect lifecycle over the repository ports.
pub struct ProspectService<R, D, N> {
    repository: Arc<R>,
    attorneys: Arc<D>,
    notifier: Arc<N>,
    organization: String,
}

impl<R, D, N> ProspectService<R, D, N>
where
    R: ProspectRepository + 'static,
    D: AttorneyDirectory + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        repository: Arc<R>,
        attorneys: Arc<D>,
        notifier: Arc<N>,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            attorneys,
            notifier,
            organization: organization.into(),
        }
    }

    /// Create a prospect and its resume in the CREATED state.
    pub async fn create(&self, input: NewProspect) -> Result<Prospect, ProspectServiceError> {
        let prospect = Prospect::from_new(input, Utc::now())?;

        if self
            .repository
            .find_by_email(&prospect.email)
            .await?
            .is_some()
        {
            return Err(ProspectServiceError::Conflict(prospect.email));
        }

        let stored = match self.repository.insert(prospect.clone()).await {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => {
                return Err(ProspectServiceError::Conflict(prospect.email))
            }
            Err(other) => return Err(other.into()),
        };

        info!(prospect_id = %stored.id.0, email = %stored.email, "prospect created");
        Ok(stored)
    }

    /// Fetch a prospect by (case-insensitive) email.
    pub async fn get_by_email(&self, email: &str) -> Result<Prospect, ProspectServiceError> {
        let email = EmailAddress::parse(email)?;
        self.repository
            .find_by_email(&email)
            .await?
            .ok_or(ProspectServiceError::NotFound(email))
    }

    pub async fn update_first_name(
        &self,
        email: &str,
        first_name: &str,
    ) -> Result<Prospect, ProspectServiceError> {
        let mut prospect = self.get_by_email(email).await?;
        prospect.ensure_editable("edit")?;

        prospect.first_name = first_name.trim().to_string();
        prospect.updated_at = Utc::now();
        self.persist(prospect).await
    }

    pub async fn update_last_name(
        &self,
        email: &str,
        last_name: &str,
    ) -> Result<Prospect, ProspectServiceError> {
        let mut prospect = self.get_by_email(email).await?;
        prospect.ensure_editable("edit")?;

        prospect.last_name = last_name.trim().to_string();
        prospect.updated_at = Utc::now();
        self.persist(prospect).await
    }

    pub async fn update_resume(
        &self,
        email: &str,
        resume: &str,
    ) -> Result<Prospect, ProspectServiceError> {
        let content = resume_content(resume)?;
        let mut prospect = self.get_by_email(email).await?;
        prospect.ensure_editable("edit")?;

        let now = Utc::now();
        prospect.resume.content = content;
        prospect.resume.updated_at = now;
        prospect.updated_at = now;
        self.persist(prospect).await
    }

    /// Move a CREATED prospect to PENDING and notify it and a random attorney.
    ///
    /// The transition is persisted before the notification is attempted; a
    /// failed send is logged and does not fail the call.
    pub async fn submit(&self, email: &str) -> Result<Prospect, ProspectServiceError> {
        let mut prospect = self.get_by_email(email).await?;
        prospect.apply(Transition::Submit, Utc::now())?;

        let attorneys = self.attorneys.all().await?;
        let attorney = pick_attorney(&attorneys).ok_or(ProspectServiceError::NoAttorneys)?;

        let submitted = self.persist(prospect).await?;
        info!(
            prospect_id = %submitted.id.0,
            attorney = %attorney.email,
            "prospect submitted"
        );

        let notification = submission_notification(&submitted, &attorney, &self.organization);
        if let Err(error) = self.notifier.send(notification).await {
            warn!(
                prospect_id = %submitted.id.0,
                %error,
                "submission notification failed"
            );
        }

        Ok(submitted)
    }

    /// Move a PENDING prospect to REACHED_OUT. Callers must be authenticated.
    pub async fn mark_reached_out(&self, email: &str) -> Result<Prospect, ProspectServiceError> {
        let mut prospect = self.get_by_email(email).await?;
        prospect.apply(Transition::MarkReachedOut, Utc::now())?;

        let marked = self.persist(prospect).await?;
        info!(prospect_id = %marked.id.0, "prospect marked as reached out");
        Ok(marked)
    }

    /// Page of prospects, most recently updated first.
    pub async fn list(&self, page: PageRequest) -> Result<Vec<ProspectView>, ProspectServiceError> {
        let prospects = self.repository.list(page).await?;
        Ok(prospects.iter().map(Prospect::view).collect())
    }

    async fn persist(&self, prospect: Prospect) -> Result<Prospect, ProspectServiceError> {
        match self.repository.update(prospect).await {
            Ok(stored) => Ok(stored),
            Err(RepositoryError::Stale) => Err(ProspectServiceError::Stale),
            Err(other) => Err(other.into()),
        }
    }
}

fn pick_attorney(attorneys: &[Attorney]) -> Option<Attorney> {
    attorneys.choose(&mut rand::thread_rng()).cloned()
}

/// Error raised by the prospect service.
#[derive(Debug, thiserror::Error)]
pub enum ProspectServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("prospect {0} already exists or has been submitted")]
    Conflict(EmailAddress),
    #[error("prospect {0} not found")]
    NotFound(EmailAddress),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("no attorneys available")]
    NoAttorneys,
    #[error("prospect was modified concurrently, retry the request")]
    Stale,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
