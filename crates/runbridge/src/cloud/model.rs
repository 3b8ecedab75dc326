use chrono::{DateTime, Utc};
use runbridge_core::{RunName, RunStatus, SnapshotId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CloudError, Result};
use crate::run::{Run, property_keys};

/// System-computed properties of a synced run
///
/// These are written exactly once by the registrar when the cloud record is
/// created and are immutable thereafter. Keeping them out of the user map
/// makes collisions impossible by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemProperties {
    pub local_to_cloud: bool,
    pub snapshot_id: SnapshotId,
    pub total_tokens: Option<u64>,
}

impl SystemProperties {
    /// Render as wire-visible property entries
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert(
            property_keys::LOCAL_TO_CLOUD.to_string(),
            self.local_to_cloud.to_string(),
        );
        map.insert(
            property_keys::SNAPSHOT_ID.to_string(),
            self.snapshot_id.to_string(),
        );
        if let Some(total) = self.total_tokens {
            map.insert(property_keys::TOTAL_TOKENS.to_string(), total.to_string());
        }
        map
    }
}

/// The cloud-side mirror of a local run
///
/// Created exactly once per run name and immutable afterwards; there are no
/// mutators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudRun {
    name: RunName,
    display_name: String,
    description: Option<String>,
    tags: BTreeMap<String, String>,
    status: RunStatus,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    system: SystemProperties,
    user: BTreeMap<String, String>,
}

impl CloudRun {
    /// Build the cloud record for a terminal local run
    ///
    /// Identity fields are copied verbatim. Both timestamps must be present
    /// and the snapshot id must be non-empty.
    pub fn from_local(run: &Run, snapshot_id: SnapshotId) -> Result<Self> {
        if !run.status.is_terminal() {
            return Err(CloudError::Validation(format!(
                "run is not in a terminal state: {}",
                run.status
            )));
        }
        if snapshot_id.is_empty() {
            return Err(CloudError::Validation(
                "snapshot id must not be empty".to_string(),
            ));
        }
        let start_time = run.start_time.ok_or_else(|| {
            CloudError::Validation("run has no start time".to_string())
        })?;
        let end_time = run
            .end_time
            .ok_or_else(|| CloudError::Validation("run has no end time".to_string()))?;

        let total_tokens = if run.token_usage.is_empty() {
            None
        } else {
            Some(run.total_tokens())
        };

        Ok(Self {
            name: run.name.clone(),
            display_name: run.display_name.clone(),
            description: run.description.clone(),
            tags: run.tags.clone(),
            status: run.status,
            start_time,
            end_time,
            system: SystemProperties {
                local_to_cloud: true,
                snapshot_id,
                total_tokens,
            },
            user: run.properties.as_map().clone(),
        })
    }

    pub fn name(&self) -> &RunName {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn system(&self) -> &SystemProperties {
        &self.system
    }

    /// The merged, wire-visible property map
    ///
    /// User-supplied entries appear verbatim alongside the system entries;
    /// system keys always win.
    pub fn properties(&self) -> BTreeMap<String, String> {
        let mut map = self.user.clone();
        map.extend(self.system.to_map());
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::{RunProperties, RunSubmission};
    use runbridge_core::{ExecutionOutcome, FlowSource, TokenUsage};

    fn terminal_run() -> Run {
        let mut run = Run::new(
            RunSubmission::new(FlowSource::directory("/tmp/flow"))
                .display_name("local-run")
                .description("desc")
                .tag("team", "eval"),
        )
        .unwrap();
        run.start().unwrap();
        run.finish(ExecutionOutcome::completed(
            vec![],
            vec![TokenUsage::new(30, 12)],
        ))
        .unwrap();
        run
    }

    #[test]
    fn test_from_local_copies_identity_verbatim() {
        let run = terminal_run();
        let cloud = CloudRun::from_local(&run, SnapshotId::from_string("abc123")).unwrap();

        assert_eq!(cloud.name(), &run.name);
        assert_eq!(cloud.display_name(), run.display_name);
        assert_eq!(cloud.description(), run.description.as_deref());
        assert_eq!(cloud.tags(), &run.tags);
        assert_eq!(cloud.status(), run.status);

        let properties = cloud.properties();
        assert_eq!(properties[property_keys::LOCAL_TO_CLOUD], "true");
        assert_eq!(properties[property_keys::SNAPSHOT_ID], "abc123");
        assert_eq!(properties[property_keys::TOTAL_TOKENS], "42");
    }

    #[test]
    fn test_from_local_rejects_non_terminal_run() {
        let run = Run::new(RunSubmission::new(FlowSource::directory("/tmp/flow"))).unwrap();
        let result = CloudRun::from_local(&run, SnapshotId::from_string("abc"));
        assert!(matches!(result, Err(CloudError::Validation(_))));
    }

    #[test]
    fn test_from_local_rejects_empty_snapshot_id() {
        let run = terminal_run();
        let result = CloudRun::from_local(&run, SnapshotId::from_string(""));
        assert!(matches!(result, Err(CloudError::Validation(_))));
    }

    #[test]
    fn test_user_properties_forwarded_without_clobbering() {
        let mut properties = RunProperties::new();
        properties
            .insert(property_keys::EVAL_RUN, "runbridge.BatchRun")
            .unwrap();
        properties
            .insert(
                property_keys::EVAL_ARTIFACTS,
                r#"[{"path": "instance_results.jsonl", "type": "table"}]"#,
            )
            .unwrap();

        let mut run = terminal_run();
        run.properties = properties;

        let cloud = CloudRun::from_local(&run, SnapshotId::from_string("abc")).unwrap();
        let merged = cloud.properties();
        assert_eq!(merged[property_keys::EVAL_RUN], "runbridge.BatchRun");
        assert_eq!(
            merged[property_keys::EVAL_ARTIFACTS],
            r#"[{"path": "instance_results.jsonl", "type": "table"}]"#
        );
        assert_eq!(merged[property_keys::LOCAL_TO_CLOUD], "true");
    }

    #[test]
    fn test_no_token_usage_means_no_total_tokens_property() {
        let mut run = terminal_run();
        run.token_usage.clear();

        let cloud = CloudRun::from_local(&run, SnapshotId::from_string("abc")).unwrap();
        assert!(cloud.properties().get(property_keys::TOTAL_TOKENS).is_none());
    }
}
