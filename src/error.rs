// Error types for the swerve runtime
//
// The per-tick control path never fails; these cover startup and collaborator IO.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Zenoh error: {0}")]
    Zenoh(String),

    #[error("Module {index} error: {reason}")]
    Module { index: usize, reason: String },
}

impl From<zenoh::Error> for DriveError {
    fn from(e: zenoh::Error) -> Self {
        DriveError::Zenoh(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DriveError>;
