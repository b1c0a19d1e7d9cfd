//! Four-step campaign creation wizard.
//!
//! The wizard owns a [`CampaignDraft`] and walks `Details -> Audience ->
//! Content -> Review`. Forward moves are guarded by the fields of the step
//! being left; backward moves never touch the draft. From Review the draft is
//! launched in two calls: create the campaign as a draft, then ask the
//! backend to send it to the chosen list. The second call only happens once
//! the first returned an id.

use std::{future::Future, time::Duration};

use api_types::campaign::{CampaignCreate, CampaignCreated, SendRequest, SendResponse};
use thiserror::Error;
use uuid::Uuid;

use crate::{gateway::GatewayError, routes::Route};

pub use catalog::{Named, default_audiences, filter_by_name};
pub use draft::{AudienceChoice, CampaignDraft, TemplateChoice};

mod catalog;
mod draft;

/// How long the success message stays up before moving to the campaign list.
pub const SUCCESS_REDIRECT_DELAY: Duration = Duration::from_secs(2);

const CREATE_FAILED: &str = "Failed to create campaign";
const SEND_FAILED: &str = "Failed to launch campaign";
const NETWORK_FAILED: &str = "Something went wrong";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WizardStep {
    #[default]
    Details,
    Audience,
    Content,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        Self::Details,
        Self::Audience,
        Self::Content,
        Self::Review,
    ];

    /// 1-based position shown in the step indicator.
    pub fn index(self) -> usize {
        match self {
            Self::Details => 1,
            Self::Audience => 2,
            Self::Content => 3,
            Self::Review => 4,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Details => "Details",
            Self::Audience => "Audience",
            Self::Content => "Content",
            Self::Review => "Review",
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            Self::Details => Some(Self::Audience),
            Self::Audience => Some(Self::Content),
            Self::Content => Some(Self::Review),
            Self::Review => None,
        }
    }

    fn prev(self) -> Option<Self> {
        match self {
            Self::Details => None,
            Self::Audience => Some(Self::Details),
            Self::Content => Some(Self::Audience),
            Self::Review => Some(Self::Content),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LaunchStatus {
    #[default]
    Idle,
    Creating,
    Sending,
    Success {
        campaign_id: String,
    },
    Error {
        message: String,
        /// Id of a campaign that was created but never sent.
        partial: Option<String>,
    },
}

impl LaunchStatus {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Creating | Self::Sending)
    }

    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Creating => Some("Creating campaign..."),
            Self::Sending => Some("Launching campaign..."),
            _ => None,
        }
    }
}

/// What the UI should do after a successful launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub campaign_id: String,
    pub redirect: Route,
    pub redirect_after: Duration,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Campaign name is required")]
    MissingName,
    #[error("Subject line is required")]
    MissingSubject,
    #[error("Please select an audience")]
    MissingAudience,
    #[error("Please select a template")]
    MissingTemplate,
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("campaign creation failed: {0}")]
    Create(#[source] GatewayError),
    #[error("campaign {campaign_id} was created but could not be sent: {source}")]
    PartialLaunchFailure {
        campaign_id: String,
        #[source]
        source: GatewayError,
    },
    #[error("create answered without a campaign id")]
    MissingCampaignId,
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("launch is only possible from the review step")]
    NotAtReview,
    #[error("already at the review step")]
    AlreadyAtReview,
    #[error("already at the first step")]
    AtFirstStep,
    #[error("a launch is in progress")]
    LaunchInFlight,
    #[error("campaign already launched")]
    Finished,
    #[error(transparent)]
    Launch(#[from] LaunchError),
}

/// The two backend calls a launch needs.
pub trait CampaignLauncher {
    fn create_draft(
        &self,
        payload: &CampaignCreate,
        idempotency_key: Uuid,
    ) -> impl Future<Output = Result<CampaignCreated, GatewayError>> + Send;

    fn dispatch(
        &self,
        campaign_id: &str,
        payload: &SendRequest,
    ) -> impl Future<Output = Result<SendResponse, GatewayError>> + Send;
}

#[derive(Debug, Default)]
pub struct CampaignWizard {
    step: WizardStep,
    draft: CampaignDraft,
    status: LaunchStatus,
}

impl CampaignWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &CampaignDraft {
        &self.draft
    }

    pub fn status(&self) -> &LaunchStatus {
        &self.status
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, LaunchStatus::Success { .. })
    }

    fn ensure_editable(&self) -> Result<(), WizardError> {
        if self.is_finished() {
            return Err(WizardError::Finished);
        }
        if self.status.is_in_flight() {
            return Err(WizardError::LaunchInFlight);
        }
        Ok(())
    }

    pub fn set_details(
        &mut self,
        name: impl Into<String>,
        subject: impl Into<String>,
    ) -> Result<(), WizardError> {
        let (name, subject) = (name.into(), subject.into());
        self.edit_draft(|draft| {
            draft.name = name;
            draft.subject = subject;
        })
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), WizardError> {
        let name = name.into();
        self.edit_draft(|draft| draft.name = name)
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) -> Result<(), WizardError> {
        let subject = subject.into();
        self.edit_draft(|draft| draft.subject = subject)
    }

    pub fn select_audience(&mut self, audience: AudienceChoice) -> Result<(), WizardError> {
        self.edit_draft(|draft| draft.audience = Some(audience))
    }

    pub fn select_template(&mut self, template: TemplateChoice) -> Result<(), WizardError> {
        self.edit_draft(|draft| draft.template = Some(template))
    }

    pub fn schedule(
        &mut self,
        scheduled_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<(), WizardError> {
        self.edit_draft(|draft| draft.scheduled_at = scheduled_at)
    }

    /// Applies `edit` to the draft. A change to the create payload gets a
    /// fresh idempotency key, so a key is never reused for a different body.
    fn edit_draft(&mut self, edit: impl FnOnce(&mut CampaignDraft)) -> Result<(), WizardError> {
        self.ensure_editable()?;
        let before = self.draft.create_payload();
        edit(&mut self.draft);
        if self.draft.create_payload() != before {
            self.draft.idempotency_key = Uuid::new_v4();
        }
        Ok(())
    }

    /// Validates the current step and moves forward. On failure nothing
    /// changes.
    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_editable()?;
        let Some(next) = self.step.next() else {
            return Err(WizardError::AlreadyAtReview);
        };
        validate_step(self.step, &self.draft)?;
        self.step = next;
        Ok(next)
    }

    /// Moves one step back, keeping every field of the draft.
    ///
    /// Leaving Review drops a previous launch error.
    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_editable()?;
        let Some(prev) = self.step.prev() else {
            return Err(WizardError::AtFirstStep);
        };
        if self.step == WizardStep::Review {
            self.status = LaunchStatus::Idle;
        }
        self.step = prev;
        Ok(prev)
    }

    pub async fn launch<L: CampaignLauncher>(
        &mut self,
        launcher: &L,
    ) -> Result<LaunchOutcome, WizardError> {
        self.launch_observed(launcher, |_| {}).await
    }

    /// Same as [`CampaignWizard::launch`], calling `observe` on every status
    /// change so a caller can redraw while the requests are pending.
    pub async fn launch_observed<L, F>(
        &mut self,
        launcher: &L,
        mut observe: F,
    ) -> Result<LaunchOutcome, WizardError>
    where
        L: CampaignLauncher,
        F: FnMut(&LaunchStatus),
    {
        self.ensure_editable()?;
        if self.step != WizardStep::Review {
            return Err(WizardError::NotAtReview);
        }
        for step in [WizardStep::Details, WizardStep::Audience, WizardStep::Content] {
            validate_step(step, &self.draft)?;
        }
        if let LaunchStatus::Error {
            partial: Some(campaign_id),
            ..
        } = &self.status
        {
            tracing::warn!(
                %campaign_id,
                "retrying launch after a failed send, a second draft campaign will be created"
            );
        }

        self.set_status(LaunchStatus::Creating, &mut observe);
        let payload = self.draft.create_payload();
        let created = match launcher
            .create_draft(&payload, self.draft.idempotency_key)
            .await
        {
            Ok(created) => created,
            Err(err) => {
                tracing::warn!(name = %payload.name, "campaign creation failed: {err}");
                let message = launch_message(&err, CREATE_FAILED);
                self.set_status(
                    LaunchStatus::Error {
                        message,
                        partial: None,
                    },
                    &mut observe,
                );
                return Err(LaunchError::Create(err).into());
            }
        };

        let campaign_id = created.id;
        if campaign_id.trim().is_empty() {
            tracing::error!("campaign create answered without an id, send skipped");
            self.set_status(
                LaunchStatus::Error {
                    message: CREATE_FAILED.to_string(),
                    partial: None,
                },
                &mut observe,
            );
            return Err(LaunchError::MissingCampaignId.into());
        }

        self.set_status(LaunchStatus::Sending, &mut observe);
        match launcher
            .dispatch(&campaign_id, &self.draft.send_payload())
            .await
        {
            Ok(response) => {
                tracing::info!(
                    %campaign_id,
                    tasks = response.tasks_created,
                    "campaign launched"
                );
            }
            Err(err) => {
                tracing::warn!(
                    %campaign_id,
                    "send failed, draft campaign already exists on the server: {err}"
                );
                let message = launch_message(&err, SEND_FAILED);
                self.set_status(
                    LaunchStatus::Error {
                        message,
                        partial: Some(campaign_id.clone()),
                    },
                    &mut observe,
                );
                return Err(LaunchError::PartialLaunchFailure {
                    campaign_id,
                    source: err,
                }
                .into());
            }
        }

        self.set_status(
            LaunchStatus::Success {
                campaign_id: campaign_id.clone(),
            },
            &mut observe,
        );
        Ok(LaunchOutcome {
            campaign_id,
            redirect: Route::Campaigns,
            redirect_after: SUCCESS_REDIRECT_DELAY,
        })
    }

    fn set_status<F: FnMut(&LaunchStatus)>(&mut self, status: LaunchStatus, observe: &mut F) {
        self.status = status;
        observe(&self.status);
    }
}

fn validate_step(step: WizardStep, draft: &CampaignDraft) -> Result<(), ValidationError> {
    match step {
        WizardStep::Details => {
            if draft.name.is_empty() {
                return Err(ValidationError::MissingName);
            }
            if draft.subject.is_empty() {
                return Err(ValidationError::MissingSubject);
            }
        }
        WizardStep::Audience => {
            if draft.audience.is_none() {
                return Err(ValidationError::MissingAudience);
            }
        }
        WizardStep::Content => {
            if draft.template.is_none() {
                return Err(ValidationError::MissingTemplate);
            }
        }
        WizardStep::Review => {}
    }
    Ok(())
}

fn launch_message(err: &GatewayError, fallback: &str) -> String {
    match err {
        GatewayError::Network(_) => NETWORK_FAILED.to_string(),
        GatewayError::MissingTenantContext => err.user_message(),
        other => other.detail().unwrap_or_else(|| fallback.to_string()),
    }
}
