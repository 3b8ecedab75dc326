use std::sync::Arc;

use super::{CloudError, CloudRun, CloudRunStore, Result};
use crate::run::Run;
use crate::snapshot::SnapshotPackager;

/// Mirrors completed local runs into the cloud tracking service
///
/// A run is synced at most once: a second sync for the same name is rejected
/// with a Conflict rather than overwriting the existing record. The snapshot
/// is packaged and uploaded before the record is created, so a failed sync
/// never leaves a visible-but-incomplete cloud run.
#[derive(Clone)]
pub struct CloudRunRegistrar {
    store: Arc<dyn CloudRunStore>,
    packager: SnapshotPackager,
}

impl CloudRunRegistrar {
    /// Create a new CloudRunRegistrar
    pub fn new(store: Arc<dyn CloudRunStore>, packager: SnapshotPackager) -> Self {
        Self { store, packager }
    }

    /// Sync a terminal local run to the cloud
    ///
    /// Returns `Ok(None)` for single-prompt-file flows, which are exempt
    /// from cloud sync by policy: no cloud run is created and no error is
    /// raised.
    pub async fn sync(&self, run: &Run) -> Result<Option<CloudRun>> {
        if !run.status.is_terminal() {
            return Err(CloudError::Validation(format!(
                "run '{}' is not in a terminal state: {}",
                run.name, run.status
            )));
        }

        if run.flow.is_prompt_file() {
            tracing::info!(name = %run.name, "prompt-file run is exempt from cloud sync");
            return Ok(None);
        }

        if self.store.get(&run.name).await?.is_some() {
            return Err(CloudError::Conflict(run.name.to_string()));
        }

        let snapshot = self.packager.package(&run.flow).await?;
        let snapshot_id = self.store.upload_snapshot(&snapshot).await?;

        let cloud_run = CloudRun::from_local(run, snapshot_id)?;
        let created = self.store.create(cloud_run).await?;
        tracing::info!(name = %run.name, snapshot_id = %created.system().snapshot_id, "run synced to cloud");
        Ok(Some(created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::InMemoryCloudRunStore;
    use crate::run::{RunProperties, RunSubmission, property_keys};
    use crate::snapshot::Snapshot;
    use crate::storage::LocalStorage;
    use async_trait::async_trait;
    use runbridge_core::{
        ExecutionOutcome, FLOW_DEFINITION_FILE, FlowSource, RunName, SnapshotId, TokenUsage,
    };

    fn write_flow_dir(dir: &std::path::Path) {
        std::fs::write(dir.join(FLOW_DEFINITION_FILE), r#"{"entry": "hello"}"#).unwrap();
        std::fs::write(dir.join("hello.py"), "def hello(): pass\n").unwrap();
    }

    fn terminal_run(flow: FlowSource) -> Run {
        let mut run = Run::new(
            RunSubmission::new(flow)
                .display_name("sdk-cli-test-run-local-to-cloud")
                .description("test sdk local to cloud")
                .tag("sdk-cli-test", "true"),
        )
        .unwrap();
        run.start().unwrap();
        run.finish(ExecutionOutcome::completed(
            vec![],
            vec![TokenUsage::new(100, 20)],
        ))
        .unwrap();
        run
    }

    fn registrar_over(
        store: Arc<dyn CloudRunStore>,
        blob_dir: &std::path::Path,
    ) -> CloudRunRegistrar {
        let packager = SnapshotPackager::new(Arc::new(LocalStorage::new(blob_dir)));
        CloudRunRegistrar::new(store, packager)
    }

    #[tokio::test]
    async fn test_sync_creates_faithful_cloud_run() {
        let flow_dir = tempfile::tempdir().unwrap();
        let blob_dir = tempfile::tempdir().unwrap();
        write_flow_dir(flow_dir.path());

        let store = Arc::new(InMemoryCloudRunStore::new());
        let registrar = registrar_over(store.clone(), blob_dir.path());
        let run = terminal_run(FlowSource::directory(flow_dir.path()));

        let cloud = registrar.sync(&run).await.unwrap().unwrap();
        assert_eq!(cloud.display_name(), run.display_name);
        assert_eq!(cloud.description(), run.description.as_deref());
        assert_eq!(cloud.tags(), &run.tags);
        assert_eq!(cloud.status(), run.status);

        let properties = cloud.properties();
        assert_eq!(properties[property_keys::LOCAL_TO_CLOUD], "true");
        assert!(!properties[property_keys::SNAPSHOT_ID].is_empty());
        assert_eq!(properties[property_keys::TOTAL_TOKENS], "120");

        // The snapshot referenced by the cloud run was actually uploaded
        assert!(
            store
                .has_snapshot(&SnapshotId::from_string(
                    properties[property_keys::SNAPSHOT_ID].clone()
                ))
                .await
        );
    }

    #[tokio::test]
    async fn test_prompt_file_run_is_skipped_without_error() {
        let blob_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryCloudRunStore::new());
        let registrar = registrar_over(store.clone(), blob_dir.path());

        let run = terminal_run(FlowSource::prompt_file("/tmp/example.prompt"));
        let result = registrar.sync(&run).await.unwrap();
        assert!(result.is_none());
        assert!(store.get(&run.name).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_sync_is_rejected_with_conflict() {
        let flow_dir = tempfile::tempdir().unwrap();
        let blob_dir = tempfile::tempdir().unwrap();
        write_flow_dir(flow_dir.path());

        let store = Arc::new(InMemoryCloudRunStore::new());
        let registrar = registrar_over(store.clone(), blob_dir.path());
        let run = terminal_run(FlowSource::directory(flow_dir.path()));

        let first = registrar.sync(&run).await.unwrap().unwrap();
        let second = registrar.sync(&run).await;
        assert!(matches!(second, Err(CloudError::Conflict(_))));
        assert!(!second.unwrap_err().is_retryable());

        // The first record is untouched
        let stored = store.get(&run.name).await.unwrap().unwrap();
        assert_eq!(stored, first);
    }

    #[tokio::test]
    async fn test_non_terminal_run_is_rejected() {
        let blob_dir = tempfile::tempdir().unwrap();
        let registrar = registrar_over(Arc::new(InMemoryCloudRunStore::new()), blob_dir.path());

        let run = Run::new(RunSubmission::new(FlowSource::directory("/tmp"))).unwrap();
        let result = registrar.sync(&run).await;
        assert!(matches!(result, Err(CloudError::Validation(_))));
    }

    #[tokio::test]
    async fn test_packaging_failure_leaves_no_cloud_run() {
        let blob_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryCloudRunStore::new());
        let registrar = registrar_over(store.clone(), blob_dir.path());

        let run = terminal_run(FlowSource::directory("/definitely/not/here"));
        let result = registrar.sync(&run).await;
        assert!(matches!(result, Err(CloudError::Packaging(_))));
        assert!(!result.unwrap_err().is_retryable());
        assert!(store.get(&run.name).await.unwrap().is_none());
    }

    /// Store stub that always reports the service as unreachable
    struct UnreachableCloudRunStore;

    #[async_trait]
    impl CloudRunStore for UnreachableCloudRunStore {
        async fn create(&self, _run: CloudRun) -> super::Result<CloudRun> {
            Err(CloudError::Transient("connection refused".to_string()))
        }

        async fn get(&self, _name: &RunName) -> super::Result<Option<CloudRun>> {
            Err(CloudError::Transient("connection refused".to_string()))
        }

        async fn upload_snapshot(&self, _snapshot: &Snapshot) -> super::Result<SnapshotId> {
            Err(CloudError::Transient("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_unreachable_service_is_retryable() {
        let flow_dir = tempfile::tempdir().unwrap();
        let blob_dir = tempfile::tempdir().unwrap();
        write_flow_dir(flow_dir.path());

        let registrar = registrar_over(Arc::new(UnreachableCloudRunStore), blob_dir.path());
        let run = terminal_run(FlowSource::directory(flow_dir.path()));

        let result = registrar.sync(&run).await;
        let err = result.unwrap_err();
        assert!(matches!(err, CloudError::Transient(_)));
        assert!(err.is_retryable());
    }
}
