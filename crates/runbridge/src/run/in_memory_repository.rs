use async_trait::async_trait;
use runbridge_core::RunName;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{Result, Run, RunError, RunRepository};

/// In-memory implementation of RunRepository
///
/// A single write lock serializes create-vs-delete races on the same name.
#[derive(Clone)]
pub struct InMemoryRunRepository {
    runs: Arc<RwLock<HashMap<RunName, Run>>>,
}

impl InMemoryRunRepository {
    /// Create a new in-memory run repository
    pub fn new() -> Self {
        Self {
            runs: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryRunRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunRepository for InMemoryRunRepository {
    async fn create(&self, run: Run) -> Result<Run> {
        let mut runs = self.runs.write().await;

        if runs.contains_key(&run.name) {
            return Err(RunError::AlreadyExists(run.name.to_string()));
        }

        runs.insert(run.name.clone(), run.clone());
        Ok(run)
    }

    async fn get(&self, name: &RunName) -> Result<Option<Run>> {
        let runs = self.runs.read().await;
        Ok(runs.get(name).cloned())
    }

    async fn list(&self) -> Result<Vec<Run>> {
        let runs = self.runs.read().await;
        Ok(runs.values().cloned().collect())
    }

    async fn update(&self, run: Run) -> Result<Run> {
        let mut runs = self.runs.write().await;

        let existing = runs
            .get(&run.name)
            .ok_or_else(|| RunError::NotFound(run.name.to_string()))?;

        // Status may only move forward
        if existing.status != run.status && !existing.status.can_transition_to(run.status) {
            return Err(RunError::Validation(format!(
                "invalid status transition: {} -> {}",
                existing.status, run.status
            )));
        }

        runs.insert(run.name.clone(), run.clone());
        Ok(run)
    }

    async fn delete(&self, name: &RunName) -> Result<()> {
        let mut runs = self.runs.write().await;

        if runs.remove(name).is_none() {
            return Err(RunError::NotFound(name.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::RunSubmission;
    use runbridge_core::{FlowSource, RunStatus};

    fn test_run(name: &str) -> Run {
        Run::new(
            RunSubmission::new(FlowSource::directory("/tmp/flow"))
                .name(RunName::from_string(name)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryRunRepository::new();
        let run = test_run("test-run");

        let created = repo.create(run).await.unwrap();
        assert_eq!(created.name.as_str(), "test-run");

        let retrieved = repo.get(&created.name).await.unwrap().unwrap();
        assert_eq!(retrieved.name, created.name);
        assert_eq!(retrieved.status, RunStatus::Queued);
    }

    #[tokio::test]
    async fn test_duplicate_name_error() {
        let repo = InMemoryRunRepository::new();
        repo.create(test_run("test-run")).await.unwrap();

        let result = repo.create(test_run("test-run")).await;
        assert!(matches!(result, Err(RunError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_update_enforces_forward_transitions() {
        let repo = InMemoryRunRepository::new();
        let mut run = repo.create(test_run("test-run")).await.unwrap();

        run.start().unwrap();
        let updated = repo.update(run.clone()).await.unwrap();
        assert_eq!(updated.status, RunStatus::Running);

        // A stale copy may not move the run backward
        let mut stale = repo.get(&run.name).await.unwrap().unwrap();
        stale.status = RunStatus::Queued;
        let result = repo.update(stale).await;
        assert!(matches!(result, Err(RunError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryRunRepository::new();
        let run = repo.create(test_run("test-run")).await.unwrap();

        repo.delete(&run.name).await.unwrap();
        assert!(repo.get(&run.name).await.unwrap().is_none());

        // Deleting again reports NotFound
        let result = repo.delete(&run.name).await;
        assert!(matches!(result, Err(RunError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_then_recreate() {
        let repo = InMemoryRunRepository::new();
        repo.create(test_run("test-run")).await.unwrap();
        repo.delete(&RunName::from_string("test-run")).await.unwrap();

        // A fresh run under the same name starts over
        let recreated = repo.create(test_run("test-run")).await.unwrap();
        assert_eq!(recreated.status, RunStatus::Queued);
    }

    #[tokio::test]
    async fn test_list() {
        let repo = InMemoryRunRepository::new();
        repo.create(test_run("run1")).await.unwrap();
        repo.create(test_run("run2")).await.unwrap();

        let runs = repo.list().await.unwrap();
        assert_eq!(runs.len(), 2);
    }
}
