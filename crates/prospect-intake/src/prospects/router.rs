use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use super::domain::{NewProspect, PageRequest};
use super::lifecycle::LifecycleError;
use super::repository::{AttorneyDirectory, Notifier, ProspectRepository};
use super::service::{ProspectService, ProspectServiceError};
use crate::auth::{AuthError, Authenticator, Credentials, Principal};

/// Shared handler state: the lifecycle service plus the admin credential check.
pub struct ProspectApi<R, D, N> {
    pub service: Arc<ProspectService<R, D, N>>,
    pub authenticator: Arc<dyn Authenticator>,
}

impl<R, D, N> Clone for ProspectApi<R, D, N> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            authenticator: self.authenticator.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateFirstName {
    pub(crate) email: String,
    pub(crate) first_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateLastName {
    pub(crate) email: String,
    pub(crate) last_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateResume {
    pub(crate) email: String,
    pub(crate) resume: String,
}

/// Body of the submit and mark requests.
#[derive(Debug, Deserialize)]
pub(crate) struct ProspectEmail {
    pub(crate) email: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
}

/// Router exposing the public self-service form and the admin endpoints.
pub fn prospect_router<R, D, N>(
    service: Arc<ProspectService<R, D, N>>,
    authenticator: Arc<dyn Authenticator>,
) -> Router
where
    R: ProspectRepository + 'static,
    D: AttorneyDirectory + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route("/prospect/", post(create_handler::<R, D, N>))
        .route("/prospect/:email", get(get_handler::<R, D, N>))
        .route("/prospect/first-name", put(first_name_handler::<R, D, N>))
        .route("/prospect/last-name", put(last_name_handler::<R, D, N>))
        .route("/prospect/resume", put(resume_handler::<R, D, N>))
        .route("/prospect/submit", put(submit_handler::<R, D, N>))
        .route("/admin/prospect/mark", post(mark_handler::<R, D, N>))
        .route("/admin/prospect/", get(list_handler::<R, D, N>))
        .with_state(ProspectApi {
            service,
            authenticator,
        })
}

pub(crate) async fn create_handler<R, D, N>(
    State(api): State<ProspectApi<R, D, N>>,
    payload: Result<Json<NewProspect>, JsonRejection>,
) -> Response
where
    R: ProspectRepository + 'static,
    D: AttorneyDirectory + 'static,
    N: Notifier + 'static,
{
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_body(rejection),
    };

    match api.service.create(payload).await {
        Ok(_) => message(StatusCode::CREATED, "Prospect created."),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<R, D, N>(
    State(api): State<ProspectApi<R, D, N>>,
    Path(email): Path<String>,
) -> Response
where
    R: ProspectRepository + 'static,
    D: AttorneyDirectory + 'static,
    N: Notifier + 'static,
{
    match api.service.get_by_email(&email).await {
        Ok(prospect) => (StatusCode::OK, Json(prospect.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn first_name_handler<R, D, N>(
    State(api): State<ProspectApi<R, D, N>>,
    payload: Result<Json<UpdateFirstName>, JsonRejection>,
) -> Response
where
    R: ProspectRepository + 'static,
    D: AttorneyDirectory + 'static,
    N: Notifier + 'static,
{
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_body(rejection),
    };

    match api
        .service
        .update_first_name(&payload.email, &payload.first_name)
        .await
    {
        Ok(_) => message(StatusCode::OK, "First name updated."),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn last_name_handler<R, D, N>(
    State(api): State<ProspectApi<R, D, N>>,
    payload: Result<Json<UpdateLastName>, JsonRejection>,
) -> Response
where
    R: ProspectRepository + 'static,
    D: AttorneyDirectory + 'static,
    N: Notifier + 'static,
{
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_body(rejection),
    };

    match api
        .service
        .update_last_name(&payload.email, &payload.last_name)
        .await
    {
        Ok(_) => message(StatusCode::OK, "Last name updated."),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn resume_handler<R, D, N>(
    State(api): State<ProspectApi<R, D, N>>,
    payload: Result<Json<UpdateResume>, JsonRejection>,
) -> Response
where
    R: ProspectRepository + 'static,
    D: AttorneyDirectory + 'static,
    N: Notifier + 'static,
{
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_body(rejection),
    };

    match api
        .service
        .update_resume(&payload.email, &payload.resume)
        .await
    {
        Ok(_) => message(StatusCode::OK, "Resume updated."),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_handler<R, D, N>(
    State(api): State<ProspectApi<R, D, N>>,
    payload: Result<Json<ProspectEmail>, JsonRejection>,
) -> Response
where
    R: ProspectRepository + 'static,
    D: AttorneyDirectory + 'static,
    N: Notifier + 'static,
{
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_body(rejection),
    };

    match api.service.submit(&payload.email).await {
        Ok(_) => message(StatusCode::OK, "Prospect submitted."),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn mark_handler<R, D, N>(
    State(api): State<ProspectApi<R, D, N>>,
    headers: HeaderMap,
    payload: Result<Json<ProspectEmail>, JsonRejection>,
) -> Response
where
    R: ProspectRepository + 'static,
    D: AttorneyDirectory + 'static,
    N: Notifier + 'static,
{
    let principal = match authorize(api.authenticator.as_ref(), &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_body(rejection),
    };
    debug!(?principal, email = %payload.email, "mark requested");

    match api.service.mark_reached_out(&payload.email).await {
        Ok(_) => message(StatusCode::OK, "Prospect marked as reached out."),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<R, D, N>(
    State(api): State<ProspectApi<R, D, N>>,
    headers: HeaderMap,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response
where
    R: ProspectRepository + 'static,
    D: AttorneyDirectory + 'static,
    N: Notifier + 'static,
{
    if let Err(response) = authorize(api.authenticator.as_ref(), &headers).await {
        return response;
    }

    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return detail(rejection.status(), &rejection.body_text()),
    };

    let page = match PageRequest::new(query.limit, query.offset) {
        Ok(page) => page,
        Err(err) => return error_response(err.into()),
    };

    match api.service.list(page).await {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn authorize(
    authenticator: &dyn Authenticator,
    headers: &HeaderMap,
) -> Result<Principal, Response> {
    let result = match Credentials::from_headers(headers) {
        Ok(credentials) => authenticator.authenticate(&credentials).await,
        Err(err) => Err(err),
    };

    result.map_err(|err| match err {
        AuthError::Repository(_) | AuthError::Hashing(_) => {
            error!(%err, "credential check failed");
            detail(StatusCode::INTERNAL_SERVER_ERROR, "Credential check unavailable")
        }
        _ => {
            let mut response = detail(StatusCode::UNAUTHORIZED, "Invalid credentials");
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Basic"),
            );
            response
        }
    })
}

pub(crate) fn error_response(err: ProspectServiceError) -> Response {
    let status = match &err {
        ProspectServiceError::Validation(_)
        | ProspectServiceError::Conflict(_)
        | ProspectServiceError::Lifecycle(LifecycleError::InvalidState { .. }) => {
            StatusCode::BAD_REQUEST
        }
        ProspectServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ProspectServiceError::Stale => StatusCode::CONFLICT,
        ProspectServiceError::NoAttorneys | ProspectServiceError::Repository(_) => {
            error!(%err, "prospect request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    detail(status, &err.to_string())
}

fn rejected_body(rejection: JsonRejection) -> Response {
    debug!(status = %rejection.status(), "request body rejected");
    detail(rejection.status(), &rejection.body_text())
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn message(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}
