use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderValue, Request};
use axum::response::Response;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use serde_json::Value;

use crate::auth::AdminCredentialAuthenticator;
use crate::prospects::domain::{
    Attorney, AttorneyId, EmailAddress, NewProspect, PageRequest, Prospect, ProspectId,
};
use crate::prospects::repository::{
    AttorneyDirectory, Notification, NotificationError, Notifier, ProspectRepository,
    RepositoryError,
};
use crate::prospects::{prospect_router, ProspectService};

pub(super) const ADMIN_USER: &str = "admin";
pub(super) const ADMIN_PASSWORD: &str = "s3cret";

pub(super) type MemoryService = ProspectService<MemoryRepository, MemoryAttorneys, MemoryNotifier>;

pub(super) fn new_prospect(email: &str) -> NewProspect {
    NewProspect {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: email.to_string(),
        resume: "  Five years of immigration casework.  ".to_string(),
    }
}

pub(super) fn attorney(name: &str, email: &str) -> Attorney {
    let now = Utc::now();
    Attorney {
        id: AttorneyId::new(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: "unused".to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub(super) fn build_service() -> (MemoryService, Arc<MemoryRepository>, Arc<MemoryNotifier>) {
    let repository = Arc::new(MemoryRepository::default());
    let attorneys = Arc::new(MemoryAttorneys::with(vec![attorney(
        "Alex Morgan",
        "hello@example.com",
    )]));
    let notifier = Arc::new(MemoryNotifier::default());
    let service = ProspectService::new(
        repository.clone(),
        attorneys,
        notifier.clone(),
        "Acme Legal",
    );
    (service, repository, notifier)
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    prospect_router(
        Arc::new(service),
        Arc::new(AdminCredentialAuthenticator::new(ADMIN_USER, ADMIN_PASSWORD)),
    )
}

pub(super) fn basic_auth(user: &str, password: &str) -> HeaderValue {
    let token = STANDARD.encode(format!("{user}:{password}"));
    HeaderValue::from_str(&format!("Basic {token}")).expect("valid header")
}

pub(super) fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub(super) fn admin_request(method: &str, uri: &str, auth: HeaderValue, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, auth);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<ProspectId, Prospect>>>,
}

impl MemoryRepository {
    pub(super) fn stored(&self, email: &str) -> Option<Prospect> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        guard
            .values()
            .find(|prospect| prospect.email.as_str() == email)
            .cloned()
    }
}

#[async_trait]
impl ProspectRepository for MemoryRepository {
    async fn insert(&self, prospect: Prospect) -> Result<Prospect, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.values().any(|stored| stored.email == prospect.email) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(prospect.id, prospect.clone());
        Ok(prospect)
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Prospect>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|prospect| &prospect.email == email)
            .max_by_key(|prospect| prospect.updated_at)
            .cloned())
    }

    async fn update(&self, prospect: Prospect) -> Result<Prospect, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get(&prospect.id).ok_or(RepositoryError::NotFound)?;
        if stored.version != prospect.version {
            return Err(RepositoryError::Stale);
        }
        let next = Prospect {
            version: prospect.version + 1,
            ..prospect
        };
        guard.insert(next.id, next.clone());
        Ok(next)
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<Prospect>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut prospects: Vec<Prospect> = guard.values().cloned().collect();
        prospects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(prospects
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }
}

/// Lets another writer commit a first-name change between every read and write.
pub(super) struct InterleavingRepository {
    pub(super) inner: MemoryRepository,
    pub(super) competing_first_name: String,
}

impl InterleavingRepository {
    pub(super) fn new(inner: MemoryRepository, competing_first_name: &str) -> Self {
        Self {
            inner,
            competing_first_name: competing_first_name.to_string(),
        }
    }
}

#[async_trait]
impl ProspectRepository for InterleavingRepository {
    async fn insert(&self, prospect: Prospect) -> Result<Prospect, RepositoryError> {
        self.inner.insert(prospect).await
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Prospect>, RepositoryError> {
        self.inner.find_by_email(email).await
    }

    async fn update(&self, prospect: Prospect) -> Result<Prospect, RepositoryError> {
        let current = self
            .inner
            .records
            .lock()
            .expect("repository mutex poisoned")
            .get(&prospect.id)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;
        self.inner
            .update(Prospect {
                first_name: self.competing_first_name.clone(),
                ..current
            })
            .await?;

        self.inner.update(prospect).await
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<Prospect>, RepositoryError> {
        self.inner.list(page).await
    }
}

#[derive(Default)]
pub(super) struct MemoryAttorneys {
    attorneys: Mutex<Vec<Attorney>>,
}

impl MemoryAttorneys {
    pub(super) fn with(attorneys: Vec<Attorney>) -> Self {
        Self {
            attorneys: Mutex::new(attorneys),
        }
    }
}

#[async_trait]
impl AttorneyDirectory for MemoryAttorneys {
    async fn all(&self) -> Result<Vec<Attorney>, RepositoryError> {
        Ok(self.attorneys.lock().expect("attorney mutex poisoned").clone())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Attorney>, RepositoryError> {
        Ok(self
            .attorneys
            .lock()
            .expect("attorney mutex poisoned")
            .iter()
            .find(|attorney| attorney.email == email)
            .cloned())
    }

    async fn insert_if_absent(&self, attorney: Attorney) -> Result<bool, RepositoryError> {
        let mut guard = self.attorneys.lock().expect("attorney mutex poisoned");
        if guard.iter().any(|existing| existing.email == attorney.email) {
            return Ok(false);
        }
        guard.push(attorney);
        Ok(true)
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub(super) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("connection refused".to_string()))
    }
}

pub(super) struct UnavailableRepository;

#[async_trait]
impl ProspectRepository for UnavailableRepository {
    async fn insert(&self, _prospect: Prospect) -> Result<Prospect, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn find_by_email(
        &self,
        _email: &EmailAddress,
    ) -> Result<Option<Prospect>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn update(&self, _prospect: Prospect) -> Result<Prospect, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn list(&self, _page: PageRequest) -> Result<Vec<Prospect>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
