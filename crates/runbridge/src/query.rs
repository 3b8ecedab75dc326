//! Read path over local and cloud run records
//!
//! Callers use this facade to fetch either side of a synced run by name and
//! assert equivalence. Reads reflect the latest committed state: once `sync`
//! returns, the cloud record it created is observable here.

use runbridge_core::RunName;
use std::sync::Arc;

use crate::cloud::{CloudError, CloudRun, CloudRunStore};
use crate::error::Result;
use crate::run::{Run, RunError, RunRepository};

/// Read-only facade over a local repository and a cloud store
#[derive(Clone)]
pub struct RunQuery {
    local_runs: Arc<dyn RunRepository>,
    cloud_runs: Arc<dyn CloudRunStore>,
}

impl RunQuery {
    /// Create a new RunQuery
    pub fn new(local_runs: Arc<dyn RunRepository>, cloud_runs: Arc<dyn CloudRunStore>) -> Self {
        Self {
            local_runs,
            cloud_runs,
        }
    }

    /// Get the local run record by name
    pub async fn local(&self, name: &RunName) -> Result<Run> {
        self.local_runs
            .get(name)
            .await?
            .ok_or_else(|| RunError::NotFound(name.to_string()).into())
    }

    /// Get the cloud run record by name
    pub async fn cloud(&self, name: &RunName) -> Result<CloudRun> {
        self.cloud_runs
            .get(name)
            .await?
            .ok_or_else(|| CloudError::NotFound(name.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunbridgeError;
    use crate::cloud::InMemoryCloudRunStore;
    use crate::run::InMemoryRunRepository;

    #[tokio::test]
    async fn test_missing_names_report_not_found() {
        let query = RunQuery::new(
            Arc::new(InMemoryRunRepository::new()),
            Arc::new(InMemoryCloudRunStore::new()),
        );
        let name = RunName::from_string("missing");

        let local = query.local(&name).await;
        assert!(matches!(
            local,
            Err(RunbridgeError::Run(RunError::NotFound(_)))
        ));

        let cloud = query.cloud(&name).await;
        assert!(matches!(
            cloud,
            Err(RunbridgeError::Cloud(CloudError::NotFound(_)))
        ));
    }
}
