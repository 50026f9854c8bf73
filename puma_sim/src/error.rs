use puma_kinematics::SettingsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("invalid simulator configuration: {0}")]
    Config(String),
}
