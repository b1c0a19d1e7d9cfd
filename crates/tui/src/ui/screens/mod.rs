pub mod campaigns;
pub mod login;
pub mod onboarding;
pub mod wizard;
