use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Session has been shut down")]
    SessionClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
