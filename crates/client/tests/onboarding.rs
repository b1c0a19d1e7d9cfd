mod common;

use api_types::tenant::TenantStatus;
use axum::http::{Method, StatusCode};
use client::{
    OnboardingError, OnboardingStep, OnboardingWizard, Route, SessionProvider, routes::guard,
};
use serde_json::json;

use common::{harness, session};

fn saved(next_stage: &str) -> serde_json::Value {
    json!({ "status": "success", "next_stage": next_stage })
}

#[tokio::test]
async fn onboarding_walks_every_step_and_activates_the_tenant() {
    let h = harness(Some(session("tenant-a", TenantStatus::Onboarding))).await;
    h.backend.respond(
        Method::POST,
        "/onboarding/workspace",
        StatusCode::OK,
        saved("use_case"),
    );
    h.backend.respond(
        Method::POST,
        "/onboarding/use-case",
        StatusCode::OK,
        saved("integrations"),
    );
    h.backend.respond(
        Method::POST,
        "/onboarding/integrations",
        StatusCode::OK,
        saved("scale"),
    );
    h.backend.respond(
        Method::POST,
        "/onboarding/scale",
        StatusCode::OK,
        saved("complete"),
    );
    h.backend.respond(
        Method::POST,
        "/onboarding/complete",
        StatusCode::OK,
        json!({ "status": "active", "message": "Onboarding completed" }),
    );

    assert_eq!(
        guard(Route::Campaigns, h.store.current().as_ref()),
        Some(Route::Onboarding(OnboardingStep::Workspace))
    );

    let mut wizard = OnboardingWizard::new();
    wizard.workspace_name = "Acme".to_string();
    wizard.user_role = Some("Founder".to_string());
    assert_eq!(wizard.submit(&h.api).await.unwrap(), OnboardingStep::UseCase);

    wizard.use_case = Some("marketing".to_string());
    assert_eq!(
        wizard.submit(&h.api).await.unwrap(),
        OnboardingStep::Integrations
    );

    wizard.toggle_integration("api_webhooks");
    wizard.toggle_integration("ecommerce");
    assert_eq!(wizard.submit(&h.api).await.unwrap(), OnboardingStep::Scale);

    wizard.scale = Some("1k_10k".to_string());
    assert_eq!(
        wizard.submit(&h.api).await.unwrap(),
        OnboardingStep::Complete
    );

    let session = wizard.complete(&h.api).await.unwrap().unwrap();
    assert_eq!(session.tenant_status, TenantStatus::Active);
    assert!(wizard.is_completed());
    assert_eq!(guard(Route::Campaigns, h.store.current().as_ref()), None);

    let bodies: Vec<(String, serde_json::Value)> = h
        .backend
        .requests()
        .into_iter()
        .map(|request| (request.path, request.body))
        .collect();
    assert_eq!(
        bodies,
        vec![
            (
                "/onboarding/workspace".to_string(),
                json!({ "workspace_name": "Acme", "user_role": "Founder" })
            ),
            (
                "/onboarding/use-case".to_string(),
                json!({ "primary_use_case": "marketing" })
            ),
            (
                "/onboarding/integrations".to_string(),
                json!({ "integration_sources": ["api_webhooks", "ecommerce"] })
            ),
            (
                "/onboarding/scale".to_string(),
                json!({ "expected_scale": "1k_10k" })
            ),
            ("/onboarding/complete".to_string(), serde_json::Value::Null),
        ]
    );
}

#[tokio::test]
async fn invalid_step_is_not_submitted() {
    let h = harness(Some(session("tenant-a", TenantStatus::Onboarding))).await;

    let mut wizard = OnboardingWizard::new();
    wizard.workspace_name = "Acme".to_string();
    let err = wizard.submit(&h.api).await.unwrap_err();

    assert!(matches!(err, OnboardingError::MissingRole));
    assert_eq!(wizard.step(), OnboardingStep::Workspace);
    assert!(h.backend.requests().is_empty());
}

#[tokio::test]
async fn failed_save_stays_on_the_step() {
    let h = harness(Some(session("tenant-a", TenantStatus::Onboarding))).await;
    h.backend.respond(
        Method::POST,
        "/onboarding/use-case",
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "detail": "database unavailable" }),
    );

    let mut wizard = OnboardingWizard::resume(OnboardingStep::UseCase);
    wizard.use_case = Some("transactional".to_string());
    let err = wizard.submit(&h.api).await.unwrap_err();

    assert_eq!(err.user_message(), "Failed to save. Please try again.");
    assert_eq!(wizard.step(), OnboardingStep::UseCase);
    assert_eq!(
        h.store.current().unwrap().tenant_status,
        TenantStatus::Onboarding
    );
}

#[tokio::test]
async fn completing_an_active_tenant_skips_the_backend() {
    let h = harness(Some(session("tenant-a", TenantStatus::Active))).await;

    let mut wizard = OnboardingWizard::resume(OnboardingStep::Complete);
    let session = wizard.complete(&h.api).await.unwrap().unwrap();

    assert_eq!(session.tenant_status, TenantStatus::Active);
    assert!(h.backend.requests().is_empty());
}
