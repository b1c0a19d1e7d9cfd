use api_types::{
    campaign::{CampaignCreate, CampaignStatus, SendRequest},
    contact::ContactList,
    template::TemplateView,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudienceChoice {
    pub list_id: String,
    pub list_name: String,
}

impl From<&ContactList> for AudienceChoice {
    fn from(list: &ContactList) -> Self {
        Self {
            list_id: list.id.clone(),
            list_name: list.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateChoice {
    pub template_id: String,
    pub template_name: String,
    pub html_content: String,
}

impl From<&TemplateView> for TemplateChoice {
    fn from(template: &TemplateView) -> Self {
        Self {
            template_id: template.id.clone(),
            template_name: template.name.clone(),
            html_content: template.compiled_html.clone(),
        }
    }
}

/// Campaign being assembled by the wizard.
///
/// Fields are filled step by step and never cleared by going back. The
/// idempotency key is reused by every create attempt with the same payload;
/// the wizard replaces it when an edit changes what would be created.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignDraft {
    pub name: String,
    pub subject: String,
    pub audience: Option<AudienceChoice>,
    pub template: Option<TemplateChoice>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub idempotency_key: Uuid,
}

impl Default for CampaignDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            subject: String::new(),
            audience: None,
            template: None,
            scheduled_at: None,
            idempotency_key: Uuid::new_v4(),
        }
    }
}

impl CampaignDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn create_payload(&self) -> CampaignCreate {
        CampaignCreate {
            name: self.name.clone(),
            subject: self.subject.clone(),
            body_html: self
                .template
                .as_ref()
                .map(|template| template.html_content.clone())
                .unwrap_or_default(),
            status: CampaignStatus::Draft,
            scheduled_at: self.scheduled_at,
        }
    }

    pub(crate) fn send_payload(&self) -> SendRequest {
        SendRequest {
            contact_list_id: self.audience.as_ref().map(|audience| audience.list_id.clone()),
            test_emails: None,
        }
    }
}
