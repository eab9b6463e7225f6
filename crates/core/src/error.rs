use thiserror::Error;

pub type BeaconResult<T> = Result<T, BeaconError>;

/// Failures that can occur inside a beacon component. None of these ever
/// cross the public beacon surface; each component recovers locally.
#[derive(Error, Debug)]
pub enum BeaconError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("DOM inspection error: {0}")]
    Dom(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for BeaconError {
    fn from(err: config::ConfigError) -> Self {
        BeaconError::Config(err.to_string())
    }
}
