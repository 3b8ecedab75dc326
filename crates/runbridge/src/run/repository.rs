use super::{Result, Run};
use async_trait::async_trait;
use runbridge_core::RunName;

/// Repository trait for local runs
#[async_trait]
pub trait RunRepository: Send + Sync {
    /// Create a new run; fails with AlreadyExists when the name is taken
    async fn create(&self, run: Run) -> Result<Run>;

    /// Get a run by name
    async fn get(&self, name: &RunName) -> Result<Option<Run>>;

    /// List all runs
    async fn list(&self) -> Result<Vec<Run>>;

    /// Update a run; fails with NotFound when the name is unknown
    async fn update(&self, run: Run) -> Result<Run>;

    /// Delete a run by name; fails with NotFound when the name is unknown
    async fn delete(&self, name: &RunName) -> Result<()>;
}
