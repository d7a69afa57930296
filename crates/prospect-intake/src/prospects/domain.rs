use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier wrapper for prospects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProspectId(pub Uuid);

impl ProspectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProspectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier wrapper for resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResumeId(pub Uuid);

impl ResumeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ResumeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier wrapper for attorneys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttorneyId(pub Uuid);

impl AttorneyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttorneyId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercased, trimmed email address.
///
/// Every prospect email passes through [`EmailAddress::parse`], which makes
/// uniqueness in the store case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = raw.trim().to_lowercase();
        let invalid = || ValidationError::InvalidEmail(raw.trim().to_string());

        let (local, domain) = normalized.split_once('@').ok_or_else(invalid)?;
        if local.is_empty()
            || domain.contains('@')
            || !domain.contains('.')
            || domain.split('.').any(str::is_empty)
            || normalized.chars().any(char::is_whitespace)
        {
            return Err(invalid());
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle position of a prospect. Progression is strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProspectState {
    Created,
    Pending,
    ReachedOut,
}

impl ProspectState {
    pub const fn label(self) -> &'static str {
        match self {
            ProspectState::Created => "CREATED",
            ProspectState::Pending => "PENDING",
            ProspectState::ReachedOut => "REACHED_OUT",
        }
    }
}

impl fmt::Display for ProspectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProspectState {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CREATED" => Ok(Self::Created),
            "PENDING" => Ok(Self::Pending),
            "REACHED_OUT" => Ok(Self::ReachedOut),
            other => Err(ValidationError::UnknownState(other.to_string())),
        }
    }
}

/// Free-text resume owned by exactly one prospect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resume {
    pub id: ResumeId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A person tracked through the intake lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prospect {
    pub id: ProspectId,
    pub first_name: String,
    pub last_name: String,
    pub email: EmailAddress,
    pub state: ProspectState,
    pub resume: Resume,
    /// Optimistic concurrency token, incremented by every persisted write.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prospect {
    /// Builds a fresh CREATED prospect from validated input.
    pub fn from_new(input: NewProspect, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let email = EmailAddress::parse(&input.email)?;
        let content = resume_content(&input.resume)?;

        Ok(Self {
            id: ProspectId::new(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email,
            state: ProspectState::Created,
            resume: Resume {
                id: ResumeId::new(),
                content,
                created_at: now,
                updated_at: now,
            },
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn view(&self) -> ProspectView {
        ProspectView {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            state: self.state,
            resume: self.resume.content.clone(),
        }
    }
}

/// Trims resume text, rejecting blank submissions.
pub fn resume_content(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyResume);
    }
    Ok(trimmed.to_string())
}

/// Staff member who can authenticate and receives submission notifications.
#[derive(Clone, PartialEq, Eq)]
pub struct Attorney {
    pub id: AttorneyId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Attorney {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attorney")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Contact form payload accepted by the create operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProspect {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub resume: String,
}

/// Public projection returned by read and listing endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProspectView {
    pub first_name: String,
    pub last_name: String,
    pub email: EmailAddress,
    pub state: ProspectState,
    pub resume: String,
}

/// Offset pagination window for the admin listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: u32,
    offset: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 5;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self, ValidationError> {
        let limit = limit.unwrap_or(i64::from(Self::DEFAULT_LIMIT));
        if !(1..=i64::from(Self::MAX_LIMIT)).contains(&limit) {
            return Err(ValidationError::LimitOutOfRange(limit));
        }

        let offset = offset.unwrap_or(0);
        let offset = u32::try_from(offset).map_err(|_| ValidationError::OffsetOutOfRange(offset))?;

        Ok(Self {
            limit: limit as u32,
            offset,
        })
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Input rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("resume must not be empty")]
    EmptyResume,
    #[error("limit must be between 1 and 100, got {0}")]
    LimitOutOfRange(i64),
    #[error("offset must be zero or greater, got {0}")]
    OffsetOutOfRange(i64),
    #[error("unknown prospect state '{0}'")]
    UnknownState(String),
}
