use async_trait::async_trait;
use runbridge_core::{RunName, SnapshotId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{CloudError, CloudRun, Result};
use crate::snapshot::Snapshot;

/// Interface to the remote run tracking service
///
/// The real service lives elsewhere; implementations of this trait adapt it.
/// `create` must be atomic: a run is either fully visible or absent, never
/// partial.
#[async_trait]
pub trait CloudRunStore: Send + Sync {
    /// Create a cloud run record; fails with Conflict when the name is taken
    async fn create(&self, run: CloudRun) -> Result<CloudRun>;

    /// Get a cloud run by name
    async fn get(&self, name: &RunName) -> Result<Option<CloudRun>>;

    /// Upload a packaged snapshot and return its resolvable identifier
    async fn upload_snapshot(&self, snapshot: &Snapshot) -> Result<SnapshotId>;
}

/// In-memory implementation of CloudRunStore
///
/// Used by tests and local development in place of the remote service.
#[derive(Clone, Default)]
pub struct InMemoryCloudRunStore {
    runs: Arc<RwLock<HashMap<RunName, CloudRun>>>,
    snapshots: Arc<RwLock<HashSet<SnapshotId>>>,
}

impl InMemoryCloudRunStore {
    /// Create a new in-memory cloud run store
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a snapshot has been uploaded
    pub async fn has_snapshot(&self, id: &SnapshotId) -> bool {
        self.snapshots.read().await.contains(id)
    }
}

#[async_trait]
impl CloudRunStore for InMemoryCloudRunStore {
    async fn create(&self, run: CloudRun) -> Result<CloudRun> {
        let mut runs = self.runs.write().await;

        if runs.contains_key(run.name()) {
            return Err(CloudError::Conflict(run.name().to_string()));
        }

        runs.insert(run.name().clone(), run.clone());
        Ok(run)
    }

    async fn get(&self, name: &RunName) -> Result<Option<CloudRun>> {
        let runs = self.runs.read().await;
        Ok(runs.get(name).cloned())
    }

    async fn upload_snapshot(&self, snapshot: &Snapshot) -> Result<SnapshotId> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(snapshot.id.clone());
        Ok(snapshot.id.clone())
    }
}
