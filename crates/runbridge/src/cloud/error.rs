use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Cloud run not found: {0}")]
    NotFound(String),

    #[error("Cloud run already exists: {0}")]
    Conflict(String),

    #[error("Invalid run for sync: {0}")]
    Validation(String),

    #[error("Snapshot packaging failed: {0}")]
    Packaging(#[from] crate::snapshot::SnapshotError),

    #[error("Cloud service unavailable: {0}")]
    Transient(String),
}

impl CloudError {
    /// Whether the caller may retry the operation unchanged
    ///
    /// Only service-unavailability is retryable; validation, packaging and
    /// conflict errors are permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CloudError::Transient(_))
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
