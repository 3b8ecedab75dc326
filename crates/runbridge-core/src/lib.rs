//! # Runbridge Core
//!
//! Engine-level abstractions for the Runbridge run tracking SDK: run
//! identity, lifecycle status, flow source shapes and the flow executor
//! contract.

pub mod error;
pub mod executor;
pub mod flow;
pub mod status;
pub mod types;

pub use error::{CoreError, Result};
pub use executor::{
    ExecutionContext, ExecutionOutcome, FlowExecutor, resolve_column_mapping,
};
pub use flow::{FLOW_DEFINITION_FILE, FlowSource, PROMPT_FILE_EXTENSION};
pub use status::RunStatus;
pub use types::{RunName, SnapshotId, TokenUsage};
