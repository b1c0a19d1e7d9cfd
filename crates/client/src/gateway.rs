//! Tenant-scoped request gateway.
//!
//! Every backend call goes through [`Gateway`]. Before anything touches the
//! network the gateway reads the current [`Session`] and either builds a
//! request carrying `Authorization: Bearer` and `X-Tenant-ID`, or refuses with
//! [`GatewayError::MissingTenantContext`]. There is no code path that sends a
//! scoped request without a tenant.
//!
//! Responses are attempted once. A 401 clears the session and redirects to
//! login; every other failure goes back to the caller untouched.
//!
//! [`Session`]: crate::session::Session

use std::{sync::Arc, time::Duration};

use api_types::ErrorBody;
use reqwest::{
    Method, Request, StatusCode, Url,
    header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::{
    routes::{Navigator, Route},
    session::{SessionError, SessionProvider},
};

pub const TENANT_HEADER: &str = "X-Tenant-ID";
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("tenant context missing, request blocked")]
    MissingTenantContext,
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("{status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("unexpected response body: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("invalid request: {0}")]
    InvalidRequest(#[source] reqwest::Error),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("gateway setup failed: {0}")]
    Setup(String),
}

impl GatewayError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// The backend's `detail` message, when the error body carries one.
    pub fn detail(&self) -> Option<String> {
        let Self::Http { body, .. } = self else {
            return None;
        };
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|body| body.message())
    }

    /// Text suitable for a banner in the UI.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingTenantContext => "Your session has expired. Please sign in again.".to_string(),
            Self::Http { status, .. } => self.detail().unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| status.to_string())
            }),
            Self::Network(_) => "Something went wrong".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Gateway {
    base_url: Url,
    http: reqwest::Client,
    sessions: Arc<dyn SessionProvider>,
    navigator: Arc<dyn Navigator>,
}

impl Gateway {
    /// Return a builder for `Gateway`.
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn sessions(&self) -> &Arc<dyn SessionProvider> {
        &self.sessions
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        let relative = path.trim_start_matches('/');
        if relative.is_empty() {
            return Err(GatewayError::InvalidPath(path.to_string()));
        }
        self.base_url
            .join(relative)
            .map_err(|err| GatewayError::InvalidPath(format!("{path}: {err}")))
    }

    /// Builds a tenant-scoped request without sending it.
    ///
    /// Fails with [`GatewayError::MissingTenantContext`] when no session is
    /// stored; nothing is transmitted in that case.
    pub fn prepare<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Request, GatewayError>
    where
        B: Serialize + ?Sized,
    {
        self.prepare_with_headers(method, path, body, HeaderMap::new())
    }

    pub fn prepare_with_headers<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        mut headers: HeaderMap,
    ) -> Result<Request, GatewayError>
    where
        B: Serialize + ?Sized,
    {
        let Some(session) = self.sessions.current() else {
            tracing::error!(%method, path, "no tenant context, blocking request");
            return Err(GatewayError::MissingTenantContext);
        };

        // credentials always come from the session
        headers.remove(TENANT_HEADER);
        headers.remove(AUTHORIZATION);

        let url = self.endpoint(path)?;
        let mut builder = self
            .http
            .request(method.clone(), url)
            .headers(headers)
            .bearer_auth(&session.token)
            .header(TENANT_HEADER, session.tenant_id.as_str());
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let request = builder.build().map_err(GatewayError::InvalidRequest)?;
        tracing::debug!(%method, path, tenant = %session.tenant_id, "prepared request");
        Ok(request)
    }

    pub async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.prepare(method, path, body)?;
        self.execute(request, true).await
    }

    pub async fn send_with_headers<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        headers: HeaderMap,
    ) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.prepare_with_headers(method, path, body, headers)?;
        self.execute(request, true).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        self.send::<(), T>(Method::GET, path, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        self.send::<(), T>(Method::DELETE, path, None).await
    }

    /// Unscoped POST, only for the endpoints that create a session
    /// (`/auth/login`, `/auth/signup`).
    ///
    /// A 401 here means bad credentials, so it does not invalidate anything.
    pub async fn public_post<B, T>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let request = self
            .http
            .post(url)
            .json(body)
            .build()
            .map_err(GatewayError::InvalidRequest)?;
        tracing::debug!(path, "prepared public request");
        self.execute(request, false).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: Request,
        scoped: bool,
    ) -> Result<T, GatewayError> {
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let response = self.http.execute(request).await.map_err(|err| {
            tracing::error!(%method, %path, "network error, no response received: {err}");
            GatewayError::Network(err)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(GatewayError::Network)?;

        if status.is_success() {
            return decode(&body);
        }

        log_failure(&method, &path, status, &body);
        if scoped && status == StatusCode::UNAUTHORIZED {
            self.invalidate_session();
        }
        Err(GatewayError::Http { status, body })
    }

    fn invalidate_session(&self) {
        if let Err(err) = self.sessions.clear() {
            tracing::error!("failed to clear session after 401: {err}");
        }
        self.navigator.redirect(Route::Login);
    }
}

/// Decodes a success body. An empty body (204, or a bare 200) reads as
/// JSON `null`.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, GatewayError> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(GatewayError::Decode)
}

fn log_failure(method: &Method, path: &str, status: StatusCode, body: &str) {
    match status.as_u16() {
        400 => tracing::warn!(%method, path, "bad request: {body}"),
        401 => tracing::warn!(%method, path, "unauthorized, redirecting to login"),
        403 => tracing::warn!(%method, path, "forbidden, tenant access denied"),
        404 => tracing::warn!(%method, path, "not found"),
        500..=599 => tracing::error!(%method, path, %status, "server error"),
        _ => tracing::warn!(%method, path, %status, "request failed: {body}"),
    }
}

#[derive(Default)]
pub struct GatewayBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    sessions: Option<Arc<dyn SessionProvider>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl GatewayBuilder {
    pub fn base_url(mut self, base_url: &str) -> GatewayBuilder {
        self.base_url = Some(base_url.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> GatewayBuilder {
        self.timeout = Some(timeout);
        self
    }

    pub fn sessions(mut self, sessions: Arc<dyn SessionProvider>) -> GatewayBuilder {
        self.sessions = Some(sessions);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> GatewayBuilder {
        self.navigator = Some(navigator);
        self
    }

    /// Construct `Gateway`
    pub fn build(self) -> Result<Gateway, GatewayError> {
        let raw = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let mut base_url = Url::parse(raw)
            .map_err(|err| GatewayError::Setup(format!("invalid base_url: {err}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let sessions = self
            .sessions
            .ok_or_else(|| GatewayError::Setup("missing session provider".to_string()))?;
        let navigator = self
            .navigator
            .ok_or_else(|| GatewayError::Setup("missing navigator".to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(|err| GatewayError::Setup(err.to_string()))?;

        Ok(Gateway {
            base_url,
            http,
            sessions,
            navigator,
        })
    }
}

/// Single-entry header map, used for the idempotency key on create.
pub fn header(name: &'static str, value: &str) -> Result<HeaderMap, GatewayError> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|err| GatewayError::Setup(format!("invalid header name {name}: {err}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|err| GatewayError::Setup(format!("invalid {name} header: {err}")))?;
    let mut headers = HeaderMap::new();
    headers.insert(name, value);
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        routes::RecordingNavigator,
        session::{MemorySessionStore, tests::session},
    };

    fn gateway(store: Arc<MemorySessionStore>) -> Gateway {
        Gateway::builder()
            .base_url("http://127.0.0.1:8000/api")
            .sessions(store)
            .navigator(Arc::new(RecordingNavigator::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn prepare_fails_closed_without_session() {
        let gateway = gateway(Arc::new(MemorySessionStore::new()));
        let err = gateway
            .prepare::<()>(Method::GET, "campaigns", None)
            .unwrap_err();
        assert!(matches!(err, GatewayError::MissingTenantContext));
    }

    #[test]
    fn prepare_attaches_tenant_and_bearer_from_current_session() {
        let store = Arc::new(MemorySessionStore::with_session(session("tenant-a")));
        let gateway = gateway(store.clone());

        let request = gateway
            .prepare(Method::POST, "/campaigns", Some(&serde_json::json!({"name": "x"})))
            .unwrap();
        assert_eq!(request.url().as_str(), "http://127.0.0.1:8000/api/campaigns");
        assert_eq!(request.headers()[TENANT_HEADER], "tenant-a");
        assert_eq!(request.headers()["authorization"], "Bearer jwt-token");

        store.store(session("tenant-b")).unwrap();
        let request = gateway
            .prepare::<()>(Method::GET, "campaigns", None)
            .unwrap();
        assert_eq!(request.headers()[TENANT_HEADER], "tenant-b");
    }

    #[test]
    fn prepare_rejects_empty_path() {
        let store = Arc::new(MemorySessionStore::with_session(session("tenant-a")));
        let err = gateway(store)
            .prepare::<()>(Method::GET, "/", None)
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidPath(_)));
    }

    #[test]
    fn builder_requires_session_provider() {
        let err = Gateway::builder()
            .navigator(Arc::new(RecordingNavigator::new()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, GatewayError::Setup(_)));
    }

    #[test]
    fn http_error_exposes_backend_detail() {
        let err = GatewayError::Http {
            status: StatusCode::FORBIDDEN,
            body: r#"{"detail":"Tenant is in 'onboarding' status."}"#.to_string(),
        };
        assert_eq!(err.detail().as_deref(), Some("Tenant is in 'onboarding' status."));
        assert_eq!(err.user_message(), "Tenant is in 'onboarding' status.");

        let err = GatewayError::Http {
            status: StatusCode::BAD_GATEWAY,
            body: "<html>upstream</html>".to_string(),
        };
        assert_eq!(err.detail(), None);
        assert_eq!(err.user_message(), "Bad Gateway");
    }

    #[test]
    fn caller_headers_cannot_override_credentials() {
        let store = Arc::new(MemorySessionStore::with_session(session("tenant-a")));
        let mut headers = header(TENANT_HEADER, "tenant-b").unwrap();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer forged"));
        headers.insert("idempotency-key", HeaderValue::from_static("k-1"));

        let request = gateway(store)
            .prepare_with_headers::<()>(Method::POST, "campaigns", None, headers)
            .unwrap();
        let tenants: Vec<_> = request.headers().get_all(TENANT_HEADER).iter().collect();
        assert_eq!(tenants, vec!["tenant-a"]);
        let auth: Vec<_> = request.headers().get_all(AUTHORIZATION).iter().collect();
        assert_eq!(auth, vec!["Bearer jwt-token"]);
        assert_eq!(request.headers()["idempotency-key"], "k-1");
    }

    #[test]
    fn empty_success_body_decodes_as_null() {
        decode::<()>("").unwrap();
        decode::<()>("  ").unwrap();
        assert_eq!(decode::<Option<u32>>("").unwrap(), None);
        assert_eq!(decode::<u32>("7").unwrap(), 7);
        assert!(matches!(decode::<u32>(""), Err(GatewayError::Decode(_))));
    }

    #[test]
    fn idempotency_header_is_normalized() {
        let headers = header(IDEMPOTENCY_HEADER, "abc-123").unwrap();
        assert_eq!(headers["idempotency-key"], "abc-123");
    }
}
