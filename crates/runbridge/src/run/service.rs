use runbridge_core::{ExecutionContext, ExecutionOutcome, FlowExecutor, RunName};
use std::sync::Arc;
use std::time::Duration;

use super::{Result, Run, RunError, RunRepository, RunSubmission};

/// How often `stream` re-reads the run while waiting for a terminal status
const STREAM_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Service for local runs
///
/// Owns the local run lifecycle: submission, execution via the injected
/// executor, lookup, deletion and waiting for completion.
#[derive(Clone)]
pub struct RunService {
    repository: Arc<dyn RunRepository>,
    executor: Arc<dyn FlowExecutor>,
}

impl RunService {
    /// Create a new RunService
    pub fn new(repository: Arc<dyn RunRepository>, executor: Arc<dyn FlowExecutor>) -> Self {
        Self {
            repository,
            executor,
        }
    }

    /// Submit a run and execute it to a terminal status
    ///
    /// Executor failures do not surface here; they mark the run as Failed
    /// with its `error` field populated.
    pub async fn submit(&self, submission: RunSubmission) -> Result<Run> {
        let run = Run::new(submission)?;
        let mut run = self.repository.create(run).await?;
        tracing::info!(name = %run.name, flow = run.flow.kind(), "run submitted");

        run.start()?;
        run = self.repository.update(run).await?;

        let context = ExecutionContext {
            flow: run.flow.clone(),
            data: run.data.clone(),
            column_mapping: run.column_mapping.clone(),
        };

        let outcome = match self.executor.execute(context).await {
            Ok(outcome) => outcome,
            Err(e) => ExecutionOutcome::failed(e.to_string()),
        };

        run.finish(outcome)?;
        let run = self.repository.update(run).await?;
        tracing::info!(name = %run.name, status = %run.status, "run finished");
        Ok(run)
    }

    /// Get a run by name
    pub async fn get(&self, name: &RunName) -> Result<Run> {
        self.repository
            .get(name)
            .await?
            .ok_or_else(|| RunError::NotFound(name.to_string()))
    }

    /// List all runs
    pub async fn list(&self) -> Result<Vec<Run>> {
        self.repository.list().await
    }

    /// Delete a run by name
    ///
    /// Deleting an unknown name fails with NotFound, which callers doing
    /// clean-slate setup can catch and ignore.
    pub async fn delete(&self, name: &RunName) -> Result<()> {
        self.repository.delete(name).await
    }

    /// Wait until the run reaches a terminal status and return the final record
    ///
    /// This is a polling wait. It does not time out on its own; bound it with
    /// `tokio::time::timeout` when needed.
    pub async fn stream(&self, name: &RunName) -> Result<Run> {
        loop {
            let run = self.get(name).await?;
            if run.status.is_terminal() {
                return Ok(run);
            }
            tokio::time::sleep(STREAM_POLL_INTERVAL).await;
        }
    }
}
