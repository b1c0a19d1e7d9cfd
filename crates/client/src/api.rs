//! Typed Email Engine endpoints on top of the [`Gateway`].

use api_types::{
    auth::{AuthResponse, LoginRequest, SignupRequest},
    campaign::{
        CampaignCreate, CampaignCreated, CampaignDeleted, CampaignListResponse, CampaignPreview,
        CampaignStatus, CampaignUpdate, CampaignUpdated, CampaignView, SendRequest, SendResponse,
    },
    contact::{ContactList, ContactListsResponse},
    onboarding::{
        IntegrationsRequest, OnboardingResponse, ScaleRequest, UseCaseRequest, WorkspaceRequest,
    },
    template::{TemplateListResponse, TemplateView},
    tenant::TenantStatus,
};
use reqwest::Method;
use uuid::Uuid;

use crate::{
    gateway::{Gateway, GatewayError, IDEMPOTENCY_HEADER, header},
    session::Session,
    wizard::CampaignLauncher,
};

type ResultApi<T> = Result<T, GatewayError>;

pub const DEFAULT_CAMPAIGN_LIMIT: u32 = 50;
pub const DEFAULT_TEMPLATE_LIMIT: u32 = 20;

#[derive(Clone)]
pub struct Api {
    gateway: Gateway,
}

impl Api {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn session(&self) -> Option<Session> {
        self.gateway.sessions().current()
    }

    pub async fn login(&self, email: &str, password: &str) -> ResultApi<Session> {
        let payload = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self.gateway.public_post("auth/login", &payload).await?;
        self.start_session(email, response)
    }

    pub async fn signup(&self, email: &str, password: &str, full_name: &str) -> ResultApi<Session> {
        let payload = SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
        };
        let response: AuthResponse = self.gateway.public_post("auth/signup", &payload).await?;
        self.start_session(email, response)
    }

    /// Stores a session obtained outside the login form (social login).
    pub fn adopt_session(&self, session: Session) -> ResultApi<Session> {
        self.gateway.sessions().store(session.clone())?;
        tracing::info!(tenant = %session.tenant_id, "session restored from callback");
        Ok(session)
    }

    fn start_session(&self, email: &str, response: AuthResponse) -> ResultApi<Session> {
        let session = Session::from_login(email, response)?;
        self.gateway.sessions().store(session.clone())?;
        tracing::info!(
            tenant = %session.tenant_id,
            status = session.tenant_status.as_str(),
            "signed in"
        );
        Ok(session)
    }

    pub fn logout(&self) -> ResultApi<()> {
        self.gateway.sessions().clear()?;
        tracing::info!("signed out");
        Ok(())
    }

    /// Marks the stored session active, after onboarding completed server side.
    pub fn refresh_user_status(&self) -> ResultApi<Option<Session>> {
        Ok(self
            .gateway
            .sessions()
            .set_tenant_status(TenantStatus::Active)?)
    }

    pub async fn campaigns(
        &self,
        status: Option<CampaignStatus>,
        limit: u32,
    ) -> ResultApi<Vec<CampaignView>> {
        let mut path = format!("campaigns?limit={limit}");
        if let Some(status) = status {
            path.push_str("&status=");
            path.push_str(status.as_str());
        }
        let response: CampaignListResponse = self.gateway.get(&path).await?;
        Ok(response.campaigns)
    }

    pub async fn campaign(&self, id: &str) -> ResultApi<CampaignView> {
        self.gateway
            .get(&format!("campaigns/{}", segment(id)?))
            .await
    }

    pub async fn create_campaign(
        &self,
        payload: &CampaignCreate,
        idempotency_key: Option<Uuid>,
    ) -> ResultApi<CampaignCreated> {
        match idempotency_key {
            Some(key) => {
                let headers = header(IDEMPOTENCY_HEADER, &key.to_string())?;
                self.gateway
                    .send_with_headers(Method::POST, "campaigns", Some(payload), headers)
                    .await
            }
            None => self.gateway.post("campaigns", payload).await,
        }
    }

    pub async fn update_campaign(
        &self,
        id: &str,
        payload: &CampaignUpdate,
    ) -> ResultApi<CampaignView> {
        let response: CampaignUpdated = self
            .gateway
            .patch(&format!("campaigns/{}", segment(id)?), payload)
            .await?;
        Ok(response.campaign)
    }

    pub async fn delete_campaign(&self, id: &str) -> ResultApi<CampaignDeleted> {
        self.gateway
            .delete(&format!("campaigns/{}", segment(id)?))
            .await
    }

    pub async fn send_campaign(&self, id: &str, payload: &SendRequest) -> ResultApi<SendResponse> {
        self.gateway
            .post(&format!("campaigns/{}/send", segment(id)?), payload)
            .await
    }

    /// Renders the campaign for a sample contact (merge tags and spintax are
    /// resolved server side).
    pub async fn preview_campaign(
        &self,
        id: &str,
        sample_contact: Option<&serde_json::Value>,
    ) -> ResultApi<CampaignPreview> {
        self.gateway
            .send(
                Method::POST,
                &format!("campaigns/{}/preview", segment(id)?),
                sample_contact,
            )
            .await
    }

    pub async fn templates(&self, page: u32, limit: u32) -> ResultApi<TemplateListResponse> {
        self.gateway
            .get(&format!("templates?page={}&limit={limit}", page.max(1)))
            .await
    }

    pub async fn template(&self, id: &str) -> ResultApi<TemplateView> {
        self.gateway
            .get(&format!("templates/{}", segment(id)?))
            .await
    }

    pub async fn contact_lists(&self) -> ResultApi<Vec<ContactList>> {
        let response: ContactListsResponse = self.gateway.get("contacts/lists").await?;
        Ok(response.lists)
    }

    pub async fn save_workspace(&self, payload: &WorkspaceRequest) -> ResultApi<OnboardingResponse> {
        self.gateway.post("onboarding/workspace", payload).await
    }

    pub async fn save_use_case(&self, payload: &UseCaseRequest) -> ResultApi<OnboardingResponse> {
        self.gateway.post("onboarding/use-case", payload).await
    }

    pub async fn save_integrations(
        &self,
        payload: &IntegrationsRequest,
    ) -> ResultApi<OnboardingResponse> {
        self.gateway.post("onboarding/integrations", payload).await
    }

    pub async fn save_scale(&self, payload: &ScaleRequest) -> ResultApi<OnboardingResponse> {
        self.gateway.post("onboarding/scale", payload).await
    }

    pub async fn complete_onboarding(&self) -> ResultApi<OnboardingResponse> {
        self.gateway
            .send::<(), _>(Method::POST, "onboarding/complete", None)
            .await
    }
}

impl CampaignLauncher for Api {
    async fn create_draft(
        &self,
        payload: &CampaignCreate,
        idempotency_key: Uuid,
    ) -> ResultApi<CampaignCreated> {
        self.create_campaign(payload, Some(idempotency_key)).await
    }

    async fn dispatch(&self, campaign_id: &str, payload: &SendRequest) -> ResultApi<SendResponse> {
        self.send_campaign(campaign_id, payload).await
    }
}

/// Rejects identifiers that would change the shape of the path.
fn segment(id: &str) -> ResultApi<&str> {
    if id.is_empty() || id.contains(['/', '?', '#']) {
        return Err(GatewayError::InvalidPath(format!("invalid identifier: {id:?}")));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_rejects_path_breaking_ids() {
        assert_eq!(segment("c-1").unwrap(), "c-1");
        assert!(segment("").is_err());
        assert!(segment("../templates").is_err());
        assert!(segment("c-1?status=sent").is_err());
    }
}
