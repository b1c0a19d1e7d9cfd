mod common;

use std::time::Duration;

use api_types::{contact::ContactList, tenant::TenantStatus};
use axum::http::{Method, StatusCode};
use client::{
    CampaignWizard, LaunchStatus, Route, WizardError,
    wizard::{AudienceChoice, LaunchError, TemplateChoice, default_audiences},
};
use serde_json::json;

use common::{Harness, harness, session};

async fn at_review(h: &Harness) -> CampaignWizard {
    h.backend.respond(
        Method::GET,
        "/templates",
        StatusCode::OK,
        json!({
            "data": [{
                "id": "tpl_1",
                "name": "Monthly Digest",
                "subject": "Digest",
                "compiled_html": "<p>Hi</p>"
            }],
            "total": 1,
            "page": 1,
            "limit": 20
        }),
    );
    let templates = h.api.templates(1, 20).await.unwrap();

    // no /contacts/lists on this backend, the built-in segments are used
    let lists: Vec<ContactList> = match h.api.contact_lists().await {
        Ok(lists) => lists,
        Err(err) if err.status() == Some(reqwest::StatusCode::NOT_FOUND) => default_audiences(),
        Err(err) => panic!("unexpected error: {err}"),
    };

    let mut wizard = CampaignWizard::new();
    wizard.set_details("March Newsletter", "Updates").unwrap();
    wizard.next().unwrap();
    wizard
        .select_audience(AudienceChoice::from(&lists[0]))
        .unwrap();
    wizard.next().unwrap();
    wizard
        .select_template(TemplateChoice::from(&templates.data[0]))
        .unwrap();
    wizard.next().unwrap();
    wizard
}

#[tokio::test]
async fn march_newsletter_is_created_then_sent() {
    let h = harness(Some(session("tenant-a", TenantStatus::Active))).await;
    h.backend.respond(
        Method::POST,
        "/campaigns",
        StatusCode::OK,
        json!({ "id": "c-1", "tenant_id": "tenant-a", "message": "Campaign created" }),
    );
    h.backend.respond(
        Method::POST,
        "/campaigns/c-1/send",
        StatusCode::OK,
        json!({ "status": "queued", "tasks_created": 12450 }),
    );

    let mut wizard = at_review(&h).await;
    let key = wizard.draft().idempotency_key;
    let outcome = wizard.launch(&h.api).await.unwrap();

    assert_eq!(outcome.campaign_id, "c-1");
    assert_eq!(outcome.redirect, Route::Campaigns);
    assert_eq!(outcome.redirect_after, Duration::from_secs(2));
    assert_eq!(
        wizard.status(),
        &LaunchStatus::Success {
            campaign_id: "c-1".to_string()
        }
    );

    let creates = h.backend.requests_to(Method::POST, "/campaigns");
    assert_eq!(creates.len(), 1);
    assert_eq!(
        creates[0].body,
        json!({
            "name": "March Newsletter",
            "subject": "Updates",
            "body_html": "<p>Hi</p>",
            "status": "draft",
            "scheduled_at": null
        })
    );
    let key = key.to_string();
    assert_eq!(creates[0].header("idempotency-key"), Some(key.as_str()));
    assert_eq!(creates[0].header("x-tenant-id"), Some("tenant-a"));

    let sends = h.backend.requests_to(Method::POST, "/campaigns/c-1/send");
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].body, json!({ "contact_list_id": "all" }));

    let paths: Vec<String> = h
        .backend
        .requests()
        .into_iter()
        .filter(|request| request.method == Method::POST)
        .map(|request| request.path)
        .collect();
    assert_eq!(paths, ["/campaigns", "/campaigns/c-1/send"]);
}

#[tokio::test]
async fn rejected_create_never_sends() {
    let h = harness(Some(session("tenant-a", TenantStatus::Active))).await;
    h.backend.respond(
        Method::POST,
        "/campaigns",
        StatusCode::BAD_REQUEST,
        json!({ "detail": "Campaign name already in use" }),
    );

    let mut wizard = at_review(&h).await;
    let err = wizard.launch(&h.api).await.unwrap_err();

    assert!(matches!(err, WizardError::Launch(LaunchError::Create(_))));
    assert_eq!(
        wizard.status(),
        &LaunchStatus::Error {
            message: "Campaign name already in use".to_string(),
            partial: None
        }
    );
    assert!(
        h.backend
            .requests()
            .iter()
            .all(|request| !request.path.ends_with("/send"))
    );
}

#[tokio::test]
async fn failed_send_leaves_a_partial_launch() {
    let h = harness(Some(session("tenant-a", TenantStatus::Active))).await;
    h.backend.respond(
        Method::POST,
        "/campaigns",
        StatusCode::OK,
        json!({ "id": "c-7" }),
    );
    h.backend.respond(
        Method::POST,
        "/campaigns/c-7/send",
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({}),
    );

    let mut wizard = at_review(&h).await;
    let err = wizard.launch(&h.api).await.unwrap_err();

    assert!(matches!(
        err,
        WizardError::Launch(LaunchError::PartialLaunchFailure { ref campaign_id, .. }) if campaign_id == "c-7"
    ));
    assert_eq!(
        wizard.status(),
        &LaunchStatus::Error {
            message: "Failed to launch campaign".to_string(),
            partial: Some("c-7".to_string())
        }
    );
    assert_eq!(wizard.draft().name, "March Newsletter");
}

#[tokio::test]
async fn session_expiring_mid_launch_redirects_to_login() {
    let h = harness(Some(session("tenant-a", TenantStatus::Active))).await;
    h.backend.respond(
        Method::POST,
        "/campaigns",
        StatusCode::UNAUTHORIZED,
        json!({ "detail": "Token expired" }),
    );

    let mut wizard = at_review(&h).await;
    let _ = wizard.launch(&h.api).await.unwrap_err();

    assert_eq!(h.navigator.take(), Some(Route::Login));
    assert!(matches!(wizard.status(), LaunchStatus::Error { partial: None, .. }));
}
