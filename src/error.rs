//! Error types for Ephemera

use thiserror::Error;

use crate::host::HostError;

#[derive(Error, Debug)]
pub enum EphemeraError {
    #[error("Container identity already registered: {0}")]
    DuplicateIdentity(String),

    #[error(transparent)]
    HostCallFailure(#[from] HostError),

    #[error("Unknown container identity: {0}")]
    UnknownIdentity(String),

    #[error("Unrecognized removal policy: {0}")]
    UnrecognizedPolicy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EphemeraError>;
