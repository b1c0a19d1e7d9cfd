use clap::Parser;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/email_engine.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub email: String,
    pub session_path: String,
    pub log_path: String,
    pub log_level: String,
    pub timezone: String,
    pub request_timeout_secs: u64,
    /// Social-login redirect to turn into a session at startup.
    #[serde(skip)]
    pub oauth_callback: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            email: String::new(),
            session_path: client::session::default_session_path().to_string(),
            log_path: "email_engine_tui.log".to_string(),
            log_level: "info".to_string(),
            timezone: "UTC".to_string(),
            request_timeout_secs: 30,
            oauth_callback: None,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "email_engine_tui", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override base URL (e.g. http://127.0.0.1:8000).
    #[arg(long)]
    base_url: Option<String>,
    /// Prefill the login email (password is never read from CLI).
    #[arg(long)]
    email: Option<String>,
    /// Override where the session is persisted.
    #[arg(long)]
    session_path: Option<String>,
    /// Override the log file.
    #[arg(long)]
    log_path: Option<String>,
    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long)]
    timezone: Option<String>,
    /// Social-login callback URL to sign in with.
    #[arg(long)]
    oauth_callback: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("EMAIL_ENGINE"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(email) = args.email {
        settings.email = email;
    }
    if let Some(session_path) = args.session_path {
        settings.session_path = session_path;
    }
    if let Some(log_path) = args.log_path {
        settings.log_path = log_path;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }
    settings.oauth_callback = args.oauth_callback;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overrides_defaults_field_by_field() {
        let settings: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "base_url = \"http://mail.internal:9000\"\ntimezone = \"Europe/Rome\"",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.base_url, "http://mail.internal:9000");
        assert_eq!(settings.timezone, "Europe/Rome");
        assert_eq!(settings.session_path, "config/session.json");
        assert_eq!(settings.request_timeout_secs, 30);
        assert_eq!(settings.oauth_callback, None);
    }
}
