use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("gateway error: {0}")]
    Gateway(#[from] client::GatewayError),
    #[error("session error: {0}")]
    Session(#[from] client::SessionError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("logging setup failed: {0}")]
    Logging(String),
    #[error("terminal error: {0}")]
    Terminal(String),
}
