//! Flow executor abstraction
//!
//! The execution engine that drives a run to a terminal state is an external
//! collaborator. This module defines the trait it must implement plus the
//! column mapping resolution shared by all executors.

use crate::{CoreError, FlowSource, Result, RunStatus, TokenUsage};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Everything an executor needs to run a flow over a dataset
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// The flow to execute
    pub flow: FlowSource,
    /// Path to a JSONL dataset, one input row per line
    pub data: Option<PathBuf>,
    /// Mapping from flow input names to row references like `${data.url}`
    pub column_mapping: BTreeMap<String, String>,
}

/// What an execution produced
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    /// Terminal status the run reached
    pub status: RunStatus,
    /// One output value per input row
    pub outputs: Vec<serde_json::Value>,
    /// Per-call token usage, if the executor recorded any
    pub token_usage: Vec<TokenUsage>,
    /// Error message when the run failed
    pub error: Option<String>,
}

impl ExecutionOutcome {
    /// Successful outcome
    pub fn completed(outputs: Vec<serde_json::Value>, token_usage: Vec<TokenUsage>) -> Self {
        Self {
            status: RunStatus::Completed,
            outputs,
            token_usage,
            error: None,
        }
    }

    /// Failed outcome carrying the error message
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Failed,
            outputs: Vec::new(),
            token_usage: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Trait for flow execution engines
#[async_trait]
pub trait FlowExecutor: Send + Sync {
    /// Execute a flow to a terminal state
    async fn execute(&self, context: ExecutionContext) -> Result<ExecutionOutcome>;
}

/// Resolve a column mapping against a single input row
///
/// Values of the form `${data.<field>}` are replaced by the named field of
/// the row; anything else is passed through as a literal.
pub fn resolve_column_mapping(
    mapping: &BTreeMap<String, String>,
    row: &serde_json::Value,
) -> Result<BTreeMap<String, serde_json::Value>> {
    let mut resolved = BTreeMap::new();
    for (input, reference) in mapping {
        let value = match reference.strip_prefix("${data.").and_then(|r| r.strip_suffix('}')) {
            Some(field) => row
                .get(field)
                .cloned()
                .ok_or_else(|| {
                    CoreError::Execution(format!(
                        "column mapping for input '{input}' references missing field '{field}'"
                    ))
                })?,
            None => serde_json::Value::String(reference.clone()),
        };
        resolved.insert(input.clone(), value);
    }
    Ok(resolved)
}

/// Built-in executor implementations
pub mod executors {
    use super::*;
    use tokio::fs;

    /// Deterministic executor that echoes resolved inputs
    ///
    /// Reads the JSONL dataset, resolves the column mapping per row and emits
    /// the resolved inputs as outputs, with a fixed-shape token usage record
    /// per row. Same flow and data always produce the same outcome.
    pub struct EchoFlowExecutor;

    #[async_trait]
    impl FlowExecutor for EchoFlowExecutor {
        async fn execute(&self, context: ExecutionContext) -> Result<ExecutionOutcome> {
            let rows = match &context.data {
                Some(path) => read_jsonl(path).await?,
                None => vec![serde_json::Value::Object(Default::default())],
            };

            let mut outputs = Vec::with_capacity(rows.len());
            let mut token_usage = Vec::with_capacity(rows.len());
            for row in &rows {
                let resolved = resolve_column_mapping(&context.column_mapping, row)?;
                let prompt_tokens = resolved
                    .values()
                    .map(|v| v.to_string().len() as u64)
                    .sum::<u64>();
                token_usage.push(TokenUsage::new(prompt_tokens, 8));
                outputs.push(serde_json::json!({ "output": resolved }));
            }

            Ok(ExecutionOutcome::completed(outputs, token_usage))
        }
    }

    /// Read a JSONL file into one value per line
    async fn read_jsonl(path: &PathBuf) -> Result<Vec<serde_json::Value>> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| CoreError::Execution(format!("failed to read data file: {e}")))?;

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line)
                    .map_err(|e| CoreError::Execution(format!("invalid JSONL row: {e}")))
            })
            .collect()
    }
}
