//! Client routes, the access rules between them, and the navigation seam the
//! gateway uses to force a user back to login.

use std::sync::{Mutex, PoisonError};

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingStep {
    Workspace,
    UseCase,
    Integrations,
    Scale,
    Complete,
}

impl OnboardingStep {
    pub const ALL: [OnboardingStep; 5] = [
        Self::Workspace,
        Self::UseCase,
        Self::Integrations,
        Self::Scale,
        Self::Complete,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::UseCase => "use-case",
            Self::Integrations => "integrations",
            Self::Scale => "scale",
            Self::Complete => "complete",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Workspace => "Workspace",
            Self::UseCase => "Use case",
            Self::Integrations => "Integrations",
            Self::Scale => "Scale",
            Self::Complete => "Complete",
        }
    }

    /// 1-based position, used by progress indicators.
    pub fn number(self) -> usize {
        match self {
            Self::Workspace => 1,
            Self::UseCase => 2,
            Self::Integrations => 3,
            Self::Scale => 4,
            Self::Complete => 5,
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Self::Workspace => Some(Self::UseCase),
            Self::UseCase => Some(Self::Integrations),
            Self::Integrations => Some(Self::Scale),
            Self::Scale => Some(Self::Complete),
            Self::Complete => None,
        }
    }

    pub fn prev(self) -> Option<Self> {
        match self {
            Self::Workspace => None,
            Self::UseCase => Some(Self::Workspace),
            Self::Integrations => Some(Self::UseCase),
            Self::Scale => Some(Self::Integrations),
            Self::Complete => Some(Self::Scale),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Signup,
    ForgotPassword,
    Dashboard,
    Campaigns,
    NewCampaign,
    Contacts,
    Templates,
    Reports,
    Onboarding(OnboardingStep),
}

impl Route {
    pub fn path(self) -> String {
        match self {
            Self::Landing => "/".to_string(),
            Self::Login => "/login".to_string(),
            Self::Signup => "/signup".to_string(),
            Self::ForgotPassword => "/forgot-password".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::Campaigns => "/campaigns".to_string(),
            Self::NewCampaign => "/campaigns/new".to_string(),
            Self::Contacts => "/contacts".to_string(),
            Self::Templates => "/templates".to_string(),
            Self::Reports => "/reports".to_string(),
            Self::Onboarding(step) => format!("/onboarding/{}", step.slug()),
        }
    }

    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };
        let route = match path {
            "/" | "" => Self::Landing,
            "/login" => Self::Login,
            "/signup" => Self::Signup,
            "/forgot-password" => Self::ForgotPassword,
            "/dashboard" => Self::Dashboard,
            "/campaigns" => Self::Campaigns,
            "/campaigns/new" => Self::NewCampaign,
            "/contacts" => Self::Contacts,
            "/templates" => Self::Templates,
            "/reports" => Self::Reports,
            other => {
                let slug = other.strip_prefix("/onboarding/")?;
                let step = OnboardingStep::ALL
                    .into_iter()
                    .find(|step| step.slug() == slug)?;
                Self::Onboarding(step)
            }
        };
        Some(route)
    }

    pub fn is_public(self) -> bool {
        matches!(
            self,
            Self::Landing | Self::Login | Self::Signup | Self::ForgotPassword
        )
    }

    pub fn is_onboarding(self) -> bool {
        matches!(self, Self::Onboarding(_))
    }

    pub fn is_protected(self) -> bool {
        !self.is_public() && !self.is_onboarding()
    }
}

/// Where a user lands right after signing in.
pub fn landing_for(session: &Session) -> Route {
    if session.is_onboarding() {
        Route::Onboarding(OnboardingStep::Workspace)
    } else {
        Route::Dashboard
    }
}

/// Returns the route the user must be redirected to, or `None` when `route`
/// may be shown as is.
pub fn guard(route: Route, session: Option<&Session>) -> Option<Route> {
    let Some(session) = session else {
        return (!route.is_public()).then_some(Route::Login);
    };

    match route {
        Route::Login | Route::Signup => Some(landing_for(session)),
        Route::Onboarding(_) if !session.is_onboarding() => Some(Route::Dashboard),
        route if route.is_protected() && session.is_onboarding() => {
            Some(Route::Onboarding(OnboardingStep::Workspace))
        }
        _ => None,
    }
}

/// Side channel used to move the user to another screen from code that does
/// not own the UI, such as the gateway's 401 handling.
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: Route);
}

/// Keeps the last requested redirect until the UI picks it up.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    pending: Mutex<Option<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Option<Route> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn peek(&self) -> Option<Route> {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: Route) {
        tracing::debug!(route = %route.path(), "redirect requested");
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::session;
    use api_types::tenant::TenantStatus;

    fn onboarding_session() -> Session {
        let mut session = session("t-1");
        session.tenant_status = TenantStatus::Onboarding;
        session
    }

    #[test]
    fn paths_round_trip() {
        let routes = [
            Route::Landing,
            Route::Login,
            Route::Dashboard,
            Route::NewCampaign,
            Route::Onboarding(OnboardingStep::UseCase),
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
        assert_eq!(Route::parse("/campaigns/?tab=sent"), Some(Route::Campaigns));
        assert_eq!(Route::parse("/onboarding/unknown"), None);
    }

    #[test]
    fn anonymous_users_are_sent_to_login() {
        assert_eq!(guard(Route::Dashboard, None), Some(Route::Login));
        assert_eq!(guard(Route::NewCampaign, None), Some(Route::Login));
        assert_eq!(
            guard(Route::Onboarding(OnboardingStep::Scale), None),
            Some(Route::Login)
        );
        assert_eq!(guard(Route::Login, None), None);
        assert_eq!(guard(Route::Landing, None), None);
    }

    #[test]
    fn onboarding_tenants_are_kept_in_onboarding() {
        let session = onboarding_session();
        assert_eq!(
            guard(Route::Campaigns, Some(&session)),
            Some(Route::Onboarding(OnboardingStep::Workspace))
        );
        assert_eq!(
            guard(Route::Login, Some(&session)),
            Some(Route::Onboarding(OnboardingStep::Workspace))
        );
        assert_eq!(
            guard(Route::Onboarding(OnboardingStep::Scale), Some(&session)),
            None
        );
    }

    #[test]
    fn active_tenants_skip_auth_and_onboarding_pages() {
        let session = session("t-1");
        assert_eq!(guard(Route::Signup, Some(&session)), Some(Route::Dashboard));
        assert_eq!(
            guard(Route::Onboarding(OnboardingStep::Workspace), Some(&session)),
            Some(Route::Dashboard)
        );
        assert_eq!(guard(Route::Campaigns, Some(&session)), None);
        assert_eq!(guard(Route::Landing, Some(&session)), None);
    }

    #[test]
    fn recording_navigator_hands_out_redirect_once() {
        let navigator = RecordingNavigator::new();
        navigator.redirect(Route::Login);
        assert_eq!(navigator.peek(), Some(Route::Login));
        assert_eq!(navigator.take(), Some(Route::Login));
        assert_eq!(navigator.take(), None);
    }
}
