//! Session and tenant context.
//!
//! A [`Session`] is created by login (or a social-login callback), kept in a
//! [`SessionProvider`] and read by the gateway on every request. It can only
//! be built with a non-blank [`TenantId`], so "authenticated without tenant"
//! is not a representable state: a stored session with a blank tenant fails
//! to load and the store reports no session at all.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use api_types::{auth::AuthResponse, tenant::TenantStatus};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_SESSION_PATH: &str = "config/session.json";
const DEFAULT_ROLE: &str = "owner";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("tenant id missing from session")]
    MissingTenant,
    #[error("session storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Identifier of the tenant every request is scoped to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Returns `None` for empty or blank identifiers.
    pub fn parse(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return None;
        }
        Some(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TenantId {
    type Error = SessionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value).ok_or(SessionError::MissingTenant)
    }
}

impl From<TenantId> for String {
    fn from(value: TenantId) -> Self {
        value.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    pub tenant_id: TenantId,
    pub tenant_status: TenantStatus,
    pub role: String,
    pub token: String,
}

impl Session {
    /// Builds the session from a `/auth/login` or `/auth/signup` answer.
    pub fn from_login(email: &str, response: AuthResponse) -> Result<Self, SessionError> {
        let tenant_id = TenantId::parse(response.tenant_id).ok_or(SessionError::MissingTenant)?;
        Ok(Self {
            user_id: response.user_id,
            email: email.to_string(),
            full_name: response
                .full_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| default_full_name(email)),
            tenant_id,
            tenant_status: response.tenant_status,
            role: response.role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            token: response.token,
        })
    }

    /// Builds the session from the redirect a social-login provider sends
    /// back, e.g. `.../auth/callback?token=...&tenant_id=...`.
    pub fn from_oauth_callback(callback: &str) -> Result<Self, OAuthCallbackError> {
        let url = Url::parse(callback).map_err(|err| OAuthCallbackError::InvalidUrl(err.to_string()))?;
        let param = |key: &str| {
            url.query_pairs()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty())
        };

        if let Some(code) = param("error") {
            return Err(OAuthCallbackError::Provider(code));
        }

        let token = param("token").ok_or(OAuthCallbackError::InvalidResponse)?;
        let tenant_id = param("tenant_id")
            .and_then(TenantId::parse)
            .ok_or(OAuthCallbackError::MissingTenant)?;
        let email = param("email").unwrap_or_default();
        let full_name = param("full_name").unwrap_or_else(|| default_full_name(&email));
        let tenant_status = param("tenant_status")
            .as_deref()
            .and_then(TenantStatus::parse)
            .unwrap_or(TenantStatus::Onboarding);

        Ok(Self {
            user_id: param("user_id").unwrap_or_default(),
            email,
            full_name,
            tenant_id,
            tenant_status,
            role: param("role").unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            token,
        })
    }

    pub fn is_onboarding(&self) -> bool {
        self.tenant_status == TenantStatus::Onboarding
    }
}

fn default_full_name(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_string()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OAuthCallbackError {
    #[error("{}", provider_message(.0))]
    Provider(String),
    #[error("Invalid callback response from provider")]
    InvalidResponse,
    #[error("callback did not include a tenant id")]
    MissingTenant,
    #[error("invalid callback url: {0}")]
    InvalidUrl(String),
}

fn provider_message(code: &str) -> &'static str {
    match code {
        "GoogleNotConfigured" | "GitHubNotConfigured" => {
            "The administrator has not yet configured API keys for this social provider."
        }
        "NoEmailFound" => {
            "We could not securely retrieve your email address from the social provider."
        }
        "AccountDisabled" => "This account has been disabled by the administrator.",
        _ => {
            "There was a problem signing you in with the social provider. Please try again or use standard email login."
        }
    }
}

/// Source of the current session.
///
/// Read by the gateway before every request; written only by login, logout,
/// status refresh and the 401 handler.
pub trait SessionProvider: Send + Sync {
    fn current(&self) -> Option<Session>;

    fn store(&self, session: Session) -> Result<(), SessionError>;

    fn clear(&self) -> Result<(), SessionError>;

    /// Rewrites the tenant status of the stored session, if any.
    fn set_tenant_status(&self, status: TenantStatus) -> Result<Option<Session>, SessionError> {
        let Some(mut session) = self.current() else {
            return Ok(None);
        };
        session.tenant_status = status;
        self.store(session.clone())?;
        Ok(Some(session))
    }
}

/// In-process store, mostly useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            inner: RwLock::new(Some(session)),
        }
    }
}

impl SessionProvider for MemorySessionStore {
    fn current(&self) -> Option<Session> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, session: Session) -> Result<(), SessionError> {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Session persisted as a JSON file between runs.
///
/// The file is read on every [`SessionProvider::current`] call so a logout
/// from another process is seen by the next request.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Option<Session>, SessionError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }
}

impl Default for FileSessionStore {
    fn default() -> Self {
        Self::new(default_session_path())
    }
}

impl SessionProvider for FileSessionStore {
    fn current(&self) -> Option<Session> {
        match self.load() {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "ignoring unreadable session: {err}");
                None
            }
        }
    }

    fn store(&self, session: Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(&session)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

pub fn default_session_path() -> &'static str {
    DEFAULT_SESSION_PATH
}
