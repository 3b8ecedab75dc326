//! Main crate for Runbridge local-to-cloud run tracking
//!
//! This is the SDK layer: it tracks flow runs executed on the local machine
//! and mirrors completed runs into a remote tracking service, with
//! content-addressed snapshot packaging and exactly-once status/property
//! reconciliation.

pub mod client;
pub mod cloud;
pub mod config;
pub mod error;
pub mod query;
pub mod run;
pub mod snapshot;
pub mod storage;

// Re-export core types
pub use runbridge_core::{
    CoreError, ExecutionContext, ExecutionOutcome, FlowExecutor, FlowSource, RunName, RunStatus,
    SnapshotId, TokenUsage,
};

// Re-export client types
pub use client::{CloudClient, CloudClientBuilder, LocalClient, LocalClientBuilder};

// Re-export run types
pub use run::{Run, RunProperties, RunService, RunSubmission};

// Re-export cloud types
pub use cloud::{CloudRun, CloudRunRegistrar, CloudRunStore};

// Re-export error types
pub use error::{Result as RunbridgeResult, RunbridgeError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::{CloudClient, LocalClient};
    pub use crate::query::RunQuery;
    pub use crate::run::RunSubmission;
    pub use runbridge_core::{FlowExecutor, FlowSource, RunName, RunStatus};
}
