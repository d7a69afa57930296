use super::common::*;
use axum::extract::State;
use axum::http::{header, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::auth::AdminCredentialAuthenticator;
use crate::prospects::domain::{ProspectState, ValidationError};
use crate::prospects::router::{create_handler, error_response, ProspectApi};
use crate::prospects::{prospect_router, ProspectService, ProspectServiceError};

#[tokio::test]
async fn create_route_returns_created() {
    let (service, repository, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/prospect/",
            json!({
                "first_name": "Jane",
                "last_name": "Doe",
                "email": "Jane@X.com",
                "resume": "Paralegal, 5 years",
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["message"], "Prospect created.");
    assert!(repository.stored("jane@x.com").is_some());
}

#[tokio::test]
async fn create_handler_rejects_duplicates_with_detail() {
    let (service, _, _) = build_service();
    let api = ProspectApi {
        service: Arc::new(service),
        authenticator: Arc::new(AdminCredentialAuthenticator::new(ADMIN_USER, ADMIN_PASSWORD)),
    };

    let first = create_handler(State(api.clone()), Ok(axum::Json(new_prospect("jane@x.com")))).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = create_handler(State(api), Ok(axum::Json(new_prospect("JANE@x.com")))).await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(second).await;
    assert!(payload["detail"]
        .as_str()
        .expect("detail string")
        .contains("already exists"));
}

#[tokio::test]
async fn get_route_returns_view_or_not_found() {
    let (service, _, _) = build_service();
    service
        .create(new_prospect("jane@x.com"))
        .await
        .expect("create");
    let router = router_with_service(service);

    let response = router
        .clone()
        .oneshot(
            axum::http::Request::get("/prospect/JANE@x.com")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["email"], "jane@x.com");
    assert_eq!(payload["state"], "CREATED");
    assert_eq!(payload["resume"], "Five years of immigration casework.");

    let missing = router
        .oneshot(
            axum::http::Request::get("/prospect/nobody@x.com")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_routes_reject_submitted_prospects() {
    let (service, _, _) = build_service();
    service
        .create(new_prospect("jane@x.com"))
        .await
        .expect("create");
    let router = router_with_service(service);

    let ok = router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/prospect/first-name",
            json!({ "email": "jane@x.com", "first_name": "Janet" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(ok.status(), StatusCode::OK);

    let submitted = router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/prospect/submit",
            json!({ "email": "jane@x.com" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(submitted.status(), StatusCode::OK);

    for (uri, body) in [
        ("/prospect/first-name", json!({ "email": "jane@x.com", "first_name": "J" })),
        ("/prospect/last-name", json!({ "email": "jane@x.com", "last_name": "R" })),
        ("/prospect/resume", json!({ "email": "jane@x.com", "resume": "New" })),
    ] {
        let response = router
            .clone()
            .oneshot(json_request("PUT", uri, body))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn submit_route_without_attorneys_is_server_error() {
    let service = ProspectService::new(
        Arc::new(MemoryRepository::default()),
        Arc::new(MemoryAttorneys::default()),
        Arc::new(MemoryNotifier::default()),
        "Acme Legal",
    );
    service
        .create(new_prospect("jane@x.com"))
        .await
        .expect("create");
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            "PUT",
            "/prospect/submit",
            json!({ "email": "jane@x.com" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["detail"], "no attorneys available");
}

#[tokio::test]
async fn admin_routes_require_credentials() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let anonymous = router
        .clone()
        .oneshot(
            axum::http::Request::get("/admin/prospect/")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        anonymous.headers().get(header::WWW_AUTHENTICATE),
        Some(&header::HeaderValue::from_static("Basic"))
    );

    let wrong = router
        .oneshot(admin_request(
            "POST",
            "/admin/prospect/mark",
            basic_auth(ADMIN_USER, "wrong"),
            Some(json!({ "email": "jane@x.com" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn mark_route_advances_pending_prospects_once() {
    let (service, repository, _) = build_service();
    service
        .create(new_prospect("jane@x.com"))
        .await
        .expect("create");
    service.submit("jane@x.com").await.expect("submit");
    let router = router_with_service(service);

    let mark = || {
        admin_request(
            "POST",
            "/admin/prospect/mark",
            basic_auth(ADMIN_USER, ADMIN_PASSWORD),
            Some(json!({ "email": "jane@x.com" })),
        )
    };

    let first = router.clone().oneshot(mark()).await.expect("route executes");
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(
        repository.stored("jane@x.com").expect("stored").state,
        ProspectState::ReachedOut
    );

    let second = router.oneshot(mark()).await.expect("route executes");
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_route_validates_and_paginates() {
    let (service, _, _) = build_service();
    for index in 0..7 {
        service
            .create(new_prospect(&format!("p{index}@x.com")))
            .await
            .expect("create");
    }
    let router = router_with_service(service);
    let auth = || basic_auth(ADMIN_USER, ADMIN_PASSWORD);

    let default_page = router
        .clone()
        .oneshot(admin_request("GET", "/admin/prospect/", auth(), None))
        .await
        .expect("route executes");
    assert_eq!(default_page.status(), StatusCode::OK);
    let payload = read_json_body(default_page).await;
    let items = payload.as_array().expect("array payload");
    assert_eq!(items.len(), 5);
    assert!(items[0].get("state").is_some());
    assert!(items[0].get("resume").is_some());

    let tail = router
        .clone()
        .oneshot(admin_request(
            "GET",
            "/admin/prospect/?limit=5&offset=5",
            auth(),
            None,
        ))
        .await
        .expect("route executes");
    let payload = read_json_body(tail).await;
    assert_eq!(payload.as_array().expect("array payload").len(), 2);

    for uri in ["/admin/prospect/?limit=0", "/admin/prospect/?limit=101", "/admin/prospect/?offset=-1"] {
        let response = router
            .clone()
            .oneshot(admin_request("GET", uri, auth(), None))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn repository_outage_is_server_error() {
    let service = ProspectService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryAttorneys::default()),
        Arc::new(MemoryNotifier::default()),
        "Acme Legal",
    );
    let router = prospect_router(
        Arc::new(service),
        Arc::new(AdminCredentialAuthenticator::new(ADMIN_USER, ADMIN_PASSWORD)),
    );

    let response = router
        .oneshot(
            axum::http::Request::get("/prospect/jane@x.com")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert!(payload["detail"]
        .as_str()
        .expect("detail string")
        .contains("database offline"));
}

#[tokio::test]
async fn concurrent_modification_maps_to_conflict_status() {
    let response = error_response(ProspectServiceError::Stale);
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let invalid = error_response(ProspectServiceError::Validation(
        ValidationError::LimitOutOfRange(0),
    ));
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_bodies_and_queries_answer_with_detail() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let missing_field = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/prospect/",
            json!({ "first_name": "Jane", "email": "jane@x.com", "resume": "Resume" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(missing_field.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(missing_field).await;
    assert!(payload["detail"]
        .as_str()
        .expect("detail string")
        .contains("last_name"));

    let empty_submit = router
        .clone()
        .oneshot(json_request("PUT", "/prospect/submit", json!({})))
        .await
        .expect("route executes");
    assert_eq!(empty_submit.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(read_json_body(empty_submit).await["detail"].is_string());

    let bad_limit = router
        .oneshot(admin_request(
            "GET",
            "/admin/prospect/?limit=abc",
            basic_auth(ADMIN_USER, ADMIN_PASSWORD),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(bad_limit.status(), StatusCode::BAD_REQUEST);
    assert!(read_json_body(bad_limit).await["detail"].is_string());
}

#[tokio::test]
async fn anonymous_mark_is_rejected_before_the_body_is_read() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .clone()
        .oneshot(
            axum::http::Request::post("/admin/prospect/mark")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE),
        Some(&header::HeaderValue::from_static("Basic"))
    );

    let authorized_without_body = router
        .oneshot(
            axum::http::Request::post("/admin/prospect/mark")
                .header(header::AUTHORIZATION, basic_auth(ADMIN_USER, ADMIN_PASSWORD))
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(
        authorized_without_body.status(),
        StatusCode::UNSUPPORTED_MEDIA_TYPE
    );
    assert!(read_json_body(authorized_without_body).await["detail"].is_string());
}
