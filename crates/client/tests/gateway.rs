mod common;

use std::sync::Arc;

use api_types::{campaign::CampaignStatus, tenant::TenantStatus};
use axum::http::{Method, StatusCode};
use client::{
    Gateway, GatewayError, MemorySessionStore, OnboardingStep, RecordingNavigator, Route,
    SessionProvider, api::Api, routes::landing_for,
};
use serde_json::json;

use common::{harness, session};

fn campaign_list() -> serde_json::Value {
    json!({
        "campaigns": [
            {
                "id": "c-1",
                "name": "Welcome",
                "subject": "Hello",
                "status": "draft",
                "created_at": "2026-03-01T09:30:00"
            }
        ]
    })
}

#[tokio::test]
async fn scoped_call_without_session_never_reaches_the_network() {
    let h = harness(None).await;

    let err = h.api.campaigns(None, 50).await.unwrap_err();

    assert!(matches!(err, GatewayError::MissingTenantContext));
    assert!(h.backend.requests().is_empty());
    assert_eq!(h.navigator.peek(), None);
}

#[tokio::test]
async fn tenant_header_follows_the_current_session() {
    let h = harness(Some(session("tenant-a", TenantStatus::Active))).await;
    h.backend
        .respond(Method::GET, "/campaigns", StatusCode::OK, campaign_list());

    let campaigns = h
        .api
        .campaigns(Some(CampaignStatus::Draft), 50)
        .await
        .unwrap();
    assert_eq!(campaigns[0].id, "c-1");

    h.store
        .store(session("tenant-b", TenantStatus::Active))
        .unwrap();
    h.api.campaigns(None, 10).await.unwrap();

    let requests = h.backend.requests_to(Method::GET, "/campaigns");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].header("x-tenant-id"), Some("tenant-a"));
    assert_eq!(requests[0].header("authorization"), Some("Bearer jwt-token"));
    assert_eq!(requests[0].query.as_deref(), Some("limit=50&status=draft"));
    assert_eq!(requests[1].header("x-tenant-id"), Some("tenant-b"));
    assert_eq!(requests[1].query.as_deref(), Some("limit=10"));
}

#[tokio::test]
async fn unauthorized_clears_session_and_redirects_to_login() {
    let h = harness(Some(session("tenant-a", TenantStatus::Active))).await;
    h.backend.respond(
        Method::GET,
        "/templates",
        StatusCode::UNAUTHORIZED,
        json!({ "detail": "Could not validate credentials" }),
    );

    let err = h.api.templates(1, 20).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(h.store.current().is_none());
    assert_eq!(h.navigator.take(), Some(Route::Login));

    // the next scoped call fails closed
    let err = h.api.templates(1, 20).await.unwrap_err();
    assert!(matches!(err, GatewayError::MissingTenantContext));
    assert_eq!(h.backend.requests().len(), 1);
}

#[tokio::test]
async fn other_failures_are_returned_untouched() {
    let h = harness(Some(session("tenant-a", TenantStatus::Onboarding))).await;
    h.backend.respond(
        Method::GET,
        "/campaigns/c-9",
        StatusCode::FORBIDDEN,
        json!({ "detail": "Tenant is in 'onboarding' status. Complete onboarding first." }),
    );

    let err = h.api.campaign("c-9").await.unwrap_err();

    assert_eq!(err.status(), Some(reqwest::StatusCode::FORBIDDEN));
    assert_eq!(
        err.user_message(),
        "Tenant is in 'onboarding' status. Complete onboarding first."
    );
    assert!(h.store.current().is_some());
    assert_eq!(h.navigator.peek(), None);
}

#[tokio::test]
async fn login_is_unscoped_and_stores_the_session() {
    let h = harness(None).await;
    h.backend.respond(
        Method::POST,
        "/auth/login",
        StatusCode::OK,
        json!({
            "token": "fresh-token",
            "user_id": "u-1",
            "tenant_id": "tenant-new",
            "tenant_status": "onboarding",
            "onboarding_required": true
        }),
    );

    let session = h.api.login("lin@example.com", "secret").await.unwrap();

    assert_eq!(session.tenant_id.as_str(), "tenant-new");
    assert_eq!(session.full_name, "lin");
    assert_eq!(
        landing_for(&session),
        Route::Onboarding(OnboardingStep::Workspace)
    );
    assert_eq!(h.store.current(), Some(session));

    let requests = h.backend.requests_to(Method::POST, "/auth/login");
    assert_eq!(requests[0].header("x-tenant-id"), None);
    assert_eq!(
        requests[0].body,
        json!({ "email": "lin@example.com", "password": "secret" })
    );
}

#[tokio::test]
async fn failed_login_keeps_existing_session() {
    let existing = session("tenant-a", TenantStatus::Active);
    let h = harness(Some(existing.clone())).await;
    h.backend.respond(
        Method::POST,
        "/auth/login",
        StatusCode::UNAUTHORIZED,
        json!({ "detail": "Incorrect email or password" }),
    );

    let err = h.api.login("ada@example.com", "wrong").await.unwrap_err();

    assert_eq!(err.user_message(), "Incorrect email or password");
    assert_eq!(h.store.current(), Some(existing));
    assert_eq!(h.navigator.peek(), None);
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = Arc::new(MemorySessionStore::with_session(session(
        "tenant-a",
        TenantStatus::Active,
    )));
    let gateway = Gateway::builder()
        .base_url(&format!("http://{addr}"))
        .sessions(store.clone())
        .navigator(Arc::new(RecordingNavigator::new()))
        .build()
        .unwrap();

    let err = Api::new(gateway).contact_lists().await.unwrap_err();

    assert!(matches!(err, GatewayError::Network(_)));
    assert_eq!(err.user_message(), "Something went wrong");
    assert!(store.current().is_some());
}

#[tokio::test]
async fn logout_clears_the_store() {
    let h = harness(Some(session("tenant-a", TenantStatus::Active))).await;

    h.api.logout().unwrap();

    assert!(h.store.current().is_none());
    assert!(h.backend.requests().is_empty());
}
