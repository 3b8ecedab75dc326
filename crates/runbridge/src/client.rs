//! Client objects for local and cloud run tracking
//!
//! Credentials and backends are carried explicitly by these clients and
//! passed to every operation; there is no ambient global client state.

use runbridge_core::FlowExecutor;
use std::sync::Arc;

use crate::cloud::{CloudRun, CloudRunRegistrar, CloudRunStore};
use crate::config::RunbridgeConfig;
use crate::error::{Result, RunbridgeError};
use crate::query::RunQuery;
use crate::run::{InMemoryRunRepository, Run, RunRepository, RunService};
use crate::snapshot::SnapshotPackager;
use crate::storage::{LocalStorage, Storage};

/// Client for runs tracked on the local machine
#[derive(Clone)]
pub struct LocalClient {
    runs: RunService,
    repository: Arc<dyn RunRepository>,
}

impl LocalClient {
    /// Create a new builder
    pub fn builder() -> LocalClientBuilder {
        LocalClientBuilder::new()
    }

    /// The run operations of this client
    pub fn runs(&self) -> &RunService {
        &self.runs
    }

    /// The repository backing this client
    pub fn repository(&self) -> Arc<dyn RunRepository> {
        self.repository.clone()
    }
}

/// Builder for LocalClient
pub struct LocalClientBuilder {
    repository: Option<Arc<dyn RunRepository>>,
    executor: Option<Arc<dyn FlowExecutor>>,
}

impl LocalClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            repository: None,
            executor: None,
        }
    }

    /// Set the run repository (defaults to in-memory)
    pub fn repository(mut self, repository: Arc<dyn RunRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Set the flow executor
    pub fn executor(mut self, executor: Arc<dyn FlowExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<LocalClient> {
        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(InMemoryRunRepository::new()));
        let executor = self
            .executor
            .ok_or_else(|| RunbridgeError::Build("No executor configured".to_string()))?;

        Ok(LocalClient {
            runs: RunService::new(repository.clone(), executor),
            repository,
        })
    }
}

impl Default for LocalClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Client for the remote run tracking service
#[derive(Clone)]
pub struct CloudClient {
    registrar: CloudRunRegistrar,
    store: Arc<dyn CloudRunStore>,
}

impl CloudClient {
    /// Create a new builder
    pub fn builder() -> CloudClientBuilder {
        CloudClientBuilder::new()
    }

    /// Sync a terminal local run to the cloud
    ///
    /// Returns `None` for sync-exempt flow shapes.
    pub async fn sync(&self, run: &Run) -> Result<Option<CloudRun>> {
        Ok(self.registrar.sync(run).await?)
    }

    /// The cloud store backing this client
    pub fn store(&self) -> Arc<dyn CloudRunStore> {
        self.store.clone()
    }

    /// Build a read facade over this client and a local repository
    pub fn query(&self, local: &LocalClient) -> RunQuery {
        RunQuery::new(local.repository(), self.store.clone())
    }
}

/// Builder for CloudClient
pub struct CloudClientBuilder {
    store: Option<Arc<dyn CloudRunStore>>,
    storage: Option<Arc<dyn Storage>>,
    config: RunbridgeConfig,
}

impl CloudClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            store: None,
            storage: None,
            config: RunbridgeConfig::default(),
        }
    }

    /// Set the cloud run store
    pub fn store(mut self, store: Arc<dyn CloudRunStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the snapshot blob storage (defaults to local storage from config)
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set the configuration
    pub fn config(mut self, config: RunbridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<CloudClient> {
        let store = self
            .store
            .ok_or_else(|| RunbridgeError::Build("No cloud store configured".to_string()))?;
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(LocalStorage::from_config(&self.config)));

        Ok(CloudClient {
            registrar: CloudRunRegistrar::new(store.clone(), SnapshotPackager::new(storage)),
            store,
        })
    }
}

impl Default for CloudClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::InMemoryCloudRunStore;
    use runbridge_core::executor::executors::EchoFlowExecutor;

    #[test]
    fn test_local_client_requires_executor() {
        let result = LocalClient::builder().build();
        assert!(matches!(result, Err(RunbridgeError::Build(_))));

        let client = LocalClient::builder()
            .executor(Arc::new(EchoFlowExecutor))
            .build();
        assert!(client.is_ok());
    }

    #[test]
    fn test_cloud_client_requires_store() {
        let result = CloudClient::builder().build();
        assert!(matches!(result, Err(RunbridgeError::Build(_))));

        let client = CloudClient::builder()
            .store(Arc::new(InMemoryCloudRunStore::new()))
            .build();
        assert!(client.is_ok());
    }
}
