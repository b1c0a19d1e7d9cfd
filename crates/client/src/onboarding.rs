//! Onboarding flow for tenants that just signed up.
//!
//! Each step is validated locally, saved with one backend call and only then
//! advanced. The last step marks the tenant active and updates the stored
//! session so the route guard lets the user into the dashboard.

use api_types::onboarding::{IntegrationsRequest, ScaleRequest, UseCaseRequest, WorkspaceRequest};
use thiserror::Error;

use crate::{api::Api, gateway::GatewayError, routes::OnboardingStep, session::Session};

pub const ROLES: [&str; 4] = ["Founder", "Developer", "Marketer", "Other"];

/// `(value, label)` pairs offered by each choice step.
pub const USE_CASES: [(&str, &str); 4] = [
    ("transactional", "Transactional emails"),
    ("marketing", "Marketing campaigns"),
    ("event_based", "Event-based automation"),
    ("exploring", "Just exploring"),
];

pub const INTEGRATIONS: [(&str, &str); 5] = [
    ("api_webhooks", "API / Webhooks"),
    ("web_app", "Web Application"),
    ("mobile_app", "Mobile App"),
    ("ecommerce", "Ecommerce (Shopify-style)"),
    ("not_sure", "Not sure yet"),
];

pub const SCALES: [(&str, &str); 4] = [
    ("testing", "Just testing"),
    ("less_1k", "Less than 1,000"),
    ("1k_10k", "1,000 - 10,000"),
    ("10k_plus", "10,000+"),
];

#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("Workspace name is required")]
    MissingWorkspaceName,
    #[error("Please select your role")]
    MissingRole,
    #[error("Please select a use case")]
    MissingUseCase,
    #[error("Please select at least one option")]
    MissingIntegrations,
    #[error("Please select an option")]
    MissingScale,
    #[error("onboarding already completed")]
    Finished,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl OnboardingError {
    /// Banner text; backend failures on a step read as a generic save error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Gateway(GatewayError::Network(_)) | Self::Gateway(GatewayError::Http { .. }) => {
                "Failed to save. Please try again.".to_string()
            }
            Self::Gateway(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct OnboardingWizard {
    step: Option<OnboardingStep>,
    pub workspace_name: String,
    pub user_role: Option<String>,
    pub use_case: Option<String>,
    pub integrations: Vec<String>,
    pub scale: Option<String>,
    completed: bool,
}

impl OnboardingWizard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts at `step`, e.g. when the user reopens an onboarding route.
    pub fn resume(step: OnboardingStep) -> Self {
        Self {
            step: Some(step),
            ..Self::default()
        }
    }

    pub fn step(&self) -> OnboardingStep {
        self.step.unwrap_or(OnboardingStep::Workspace)
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn toggle_integration(&mut self, value: &str) {
        if let Some(position) = self.integrations.iter().position(|item| item == value) {
            self.integrations.remove(position);
        } else {
            self.integrations.push(value.to_string());
        }
    }

    pub fn back(&mut self) -> Option<OnboardingStep> {
        if self.completed {
            return None;
        }
        let prev = self.step().prev()?;
        self.step = Some(prev);
        Some(prev)
    }

    /// Validates and saves the current step, then moves to the next one.
    ///
    /// On the last step this completes onboarding.
    pub async fn submit(&mut self, api: &Api) -> Result<OnboardingStep, OnboardingError> {
        if self.completed {
            return Err(OnboardingError::Finished);
        }
        let step = self.step();
        match step {
            OnboardingStep::Workspace => {
                let payload = self.workspace_request()?;
                api.save_workspace(&payload).await?;
            }
            OnboardingStep::UseCase => {
                let payload = self.use_case_request()?;
                api.save_use_case(&payload).await?;
            }
            OnboardingStep::Integrations => {
                let payload = self.integrations_request()?;
                api.save_integrations(&payload).await?;
            }
            OnboardingStep::Scale => {
                let payload = self.scale_request()?;
                api.save_scale(&payload).await?;
            }
            OnboardingStep::Complete => {
                self.complete(api).await?;
                return Ok(OnboardingStep::Complete);
            }
        }
        tracing::info!(step = step.slug(), "onboarding step saved");

        let next = step.next().unwrap_or(OnboardingStep::Complete);
        self.step = Some(next);
        Ok(next)
    }

    /// Marks the tenant active. Skips the backend call when the stored
    /// session is already active.
    pub async fn complete(&mut self, api: &Api) -> Result<Option<Session>, OnboardingError> {
        let already_active = api
            .session()
            .is_some_and(|session| !session.is_onboarding());
        if already_active {
            tracing::debug!("tenant already active, skipping onboarding completion");
        } else {
            api.complete_onboarding().await?;
        }

        let session = api.refresh_user_status()?;
        self.step = Some(OnboardingStep::Complete);
        self.completed = true;
        tracing::info!("onboarding completed");
        Ok(session)
    }

    fn workspace_request(&self) -> Result<WorkspaceRequest, OnboardingError> {
        let workspace_name = self.workspace_name.trim();
        if workspace_name.is_empty() {
            return Err(OnboardingError::MissingWorkspaceName);
        }
        let user_role = self
            .user_role
            .clone()
            .filter(|role| !role.is_empty())
            .ok_or(OnboardingError::MissingRole)?;
        Ok(WorkspaceRequest {
            workspace_name: workspace_name.to_string(),
            user_role,
        })
    }

    fn use_case_request(&self) -> Result<UseCaseRequest, OnboardingError> {
        let primary_use_case = self
            .use_case
            .clone()
            .filter(|value| !value.is_empty())
            .ok_or(OnboardingError::MissingUseCase)?;
        Ok(UseCaseRequest { primary_use_case })
    }

    fn integrations_request(&self) -> Result<IntegrationsRequest, OnboardingError> {
        if self.integrations.is_empty() {
            return Err(OnboardingError::MissingIntegrations);
        }
        Ok(IntegrationsRequest {
            integration_sources: self.integrations.clone(),
        })
    }

    fn scale_request(&self) -> Result<ScaleRequest, OnboardingError> {
        let expected_scale = self
            .scale
            .clone()
            .filter(|value| !value.is_empty())
            .ok_or(OnboardingError::MissingScale)?;
        Ok(ScaleRequest { expected_scale })
    }
}
