use thiserror::Error;

use super::types::Version;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Stored version under '{storage_key}' is not a version number: {raw}")]
    CorruptVersion { storage_key: String, raw: String },

    #[error("Migration '{key}' cannot go down from version {previous} to {current}")]
    Downgrade {
        key: String,
        previous: Version,
        current: Version,
    },

    #[error("Upgrade step {version} of '{key}' failed: {reason}")]
    StepFailed {
        key: String,
        version: Version,
        reason: String,
    },

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, MigrationError>;

impl MigrationError {
    /// Builds a [`MigrationError::StepFailed`] for use inside upgrade steps.
    pub fn step_failed(key: impl Into<String>, version: Version, reason: impl ToString) -> Self {
        Self::StepFailed {
            key: key.into(),
            version,
            reason: reason.to_string(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for MigrationError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for MigrationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for MigrationError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
