use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error body returned by the backend (`{"detail": "..."}`).
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    /// Human readable message carried by `detail`.
    ///
    /// Validation failures come back as a list of objects with a `msg` field,
    /// every other failure as a plain string.
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            serde_json::Value::String(message) => Some(message.clone()),
            serde_json::Value::Array(items) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|msg| msg.as_str()))
                    .collect();
                if messages.is_empty() {
                    None
                } else {
                    Some(messages.join("; "))
                }
            }
            _ => None,
        }
    }
}

pub mod tenant {
    use super::*;

    /// Lifecycle state of a tenant as reported by the backend.
    ///
    /// A tenant in `onboarding` can only reach the onboarding endpoints;
    /// campaigns and templates require `active`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TenantStatus {
        Onboarding,
        Active,
    }

    impl TenantStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Onboarding => "onboarding",
                Self::Active => "active",
            }
        }

        pub fn parse(value: &str) -> Option<Self> {
            match value {
                "onboarding" => Some(Self::Onboarding),
                "active" => Some(Self::Active),
                _ => None,
            }
        }
    }
}

pub mod auth {
    use super::*;
    use crate::tenant::TenantStatus;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginRequest {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SignupRequest {
        pub email: String,
        pub password: String,
        pub full_name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuthResponse {
        pub token: String,
        pub user_id: String,
        pub tenant_id: String,
        pub tenant_status: TenantStatus,
        #[serde(default)]
        pub onboarding_required: bool,
        #[serde(default)]
        pub full_name: Option<String>,
        #[serde(default)]
        pub role: Option<String>,
    }
}

pub mod campaign {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CampaignStatus {
        Draft,
        Scheduled,
        Sending,
        Sent,
        Paused,
        Cancelled,
    }

    impl CampaignStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Draft => "draft",
                Self::Scheduled => "scheduled",
                Self::Sending => "sending",
                Self::Sent => "sent",
                Self::Paused => "paused",
                Self::Cancelled => "cancelled",
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct CampaignCreate {
        pub name: String,
        pub subject: String,
        pub body_html: String,
        pub status: CampaignStatus,
        pub scheduled_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CampaignCreated {
        pub id: String,
        pub tenant_id: Option<String>,
        #[serde(default)]
        pub message: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CampaignUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub subject: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub body_html: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub status: Option<CampaignStatus>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub scheduled_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CampaignUpdated {
        pub status: String,
        pub campaign: CampaignView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CampaignDeleted {
        pub status: String,
        pub id: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct CampaignView {
        pub id: String,
        pub name: String,
        pub subject: String,
        pub status: CampaignStatus,
        #[serde(default)]
        pub body_html: Option<String>,
        /// Raw timestamp as stored by the backend, with or without offset.
        #[serde(default)]
        pub created_at: Option<String>,
        #[serde(default)]
        pub scheduled_at: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CampaignListResponse {
        pub campaigns: Vec<CampaignView>,
    }

    /// Body of `POST /campaigns/{id}/send`.
    ///
    /// The backend requires one of the two targets.
    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    pub struct SendRequest {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub contact_list_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub test_emails: Option<Vec<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SendResponse {
        pub status: String,
        #[serde(default)]
        pub tasks_created: u64,
        #[serde(default)]
        pub message: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CampaignPreview {
        pub subject: String,
        pub html: String,
    }
}

pub mod template {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct TemplateView {
        pub id: String,
        pub name: String,
        pub subject: String,
        #[serde(default)]
        pub category: Option<String>,
        pub compiled_html: String,
        #[serde(default)]
        pub thumbnail: Option<String>,
        #[serde(default)]
        pub version: Option<u32>,
        #[serde(default)]
        pub updated_at: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TemplateListResponse {
        /// Newer backends answer with `data`, older ones with `templates`.
        #[serde(alias = "templates")]
        pub data: Vec<TemplateView>,
        #[serde(default)]
        pub total: Option<u64>,
        #[serde(default)]
        pub page: Option<u32>,
        #[serde(default)]
        pub limit: Option<u32>,
    }
}

pub mod contact {
    use super::*;

    /// An audience segment a campaign can be sent to.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ContactList {
        pub id: String,
        pub name: String,
        pub count: u64,
        #[serde(rename = "type")]
        pub kind: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContactListsResponse {
        pub lists: Vec<ContactList>,
    }
}

pub mod onboarding {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct WorkspaceRequest {
        pub workspace_name: String,
        pub user_role: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UseCaseRequest {
        pub primary_use_case: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct IntegrationsRequest {
        pub integration_sources: Vec<String>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ScaleRequest {
        pub expected_scale: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OnboardingResponse {
        pub status: String,
        #[serde(default)]
        pub next_stage: Option<String>,
        #[serde(default)]
        pub message: Option<String>,
    }
}
