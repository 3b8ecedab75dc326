//! Error types for runbridge crate

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunbridgeError {
    #[error("Core error: {0}")]
    Core(#[from] runbridge_core::CoreError),

    #[error("Run error: {0}")]
    Run(#[from] crate::run::RunError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] crate::snapshot::SnapshotError),

    #[error("Cloud error: {0}")]
    Cloud(#[from] crate::cloud::CloudError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    #[error("Build error: {0}")]
    Build(String),
}

pub type Result<T> = std::result::Result<T, RunbridgeError>;
