pub use api::Api;
pub use gateway::{Gateway, GatewayBuilder, GatewayError};
pub use onboarding::{OnboardingError, OnboardingWizard};
pub use routes::{Navigator, OnboardingStep, RecordingNavigator, Route};
pub use session::{
    FileSessionStore, MemorySessionStore, OAuthCallbackError, Session, SessionError,
    SessionProvider, TenantId,
};
pub use wizard::{CampaignLauncher, CampaignWizard, LaunchStatus, WizardError, WizardStep};

pub mod api;
pub mod gateway;
pub mod onboarding;
pub mod routes;
pub mod session;
pub mod wizard;
