use chrono::{DateTime, Utc};
use runbridge_core::{ExecutionOutcome, FlowSource, RunName, RunStatus, TokenUsage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::{Result, RunError};

/// Well-known property keys on synced runs
pub mod property_keys {
    /// Marker set by the registrar on every cloud run mirrored from a local one
    pub const LOCAL_TO_CLOUD: &str = "runbridge.local_to_cloud";
    /// Identifier of the packaged snapshot attached to the cloud run
    pub const SNAPSHOT_ID: &str = "runbridge.snapshot_id";
    /// Aggregate token count across the run
    pub const TOTAL_TOKENS: &str = "runbridge.total_tokens";

    /// Evaluation-run linkage, supplied by callers and forwarded verbatim
    pub const EVAL_RUN: &str = "runbridge.eval_run";
    /// Evaluation artifacts descriptor (JSON array of `{path, type}` entries)
    pub const EVAL_ARTIFACTS: &str = "runbridge.eval_artifacts";

    /// Keys only the registrar may write
    pub const SYSTEM_RESERVED: [&str; 3] = [LOCAL_TO_CLOUD, SNAPSHOT_ID, TOTAL_TOKENS];
}

/// User-supplied run properties
///
/// A free-form string map that rejects system-reserved keys at insert time,
/// so user and system namespaces can never collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct RunProperties(BTreeMap<String, String>);

impl RunProperties {
    /// Create an empty property map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a property, rejecting system-reserved keys
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        if property_keys::SYSTEM_RESERVED.contains(&key.as_str()) {
            return Err(RunError::ReservedProperty(key));
        }
        self.0.insert(key, value.into());
        Ok(())
    }

    /// Get a property value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterate over all properties
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Check if no properties are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validate and build from a plain map
    pub fn try_from_map(map: BTreeMap<String, String>) -> Result<Self> {
        let mut properties = Self::new();
        for (key, value) in map {
            properties.insert(key, value)?;
        }
        Ok(properties)
    }

    /// Borrow the underlying map
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

/// What a caller submits to start a run
#[derive(Debug, Clone)]
pub struct RunSubmission {
    pub flow: FlowSource,
    pub data: Option<PathBuf>,
    pub name: Option<RunName>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub column_mapping: BTreeMap<String, String>,
    pub properties: RunProperties,
}

impl RunSubmission {
    /// Start building a submission for a flow
    pub fn new(flow: FlowSource) -> Self {
        Self {
            flow,
            data: None,
            name: None,
            display_name: None,
            description: None,
            tags: BTreeMap::new(),
            column_mapping: BTreeMap::new(),
            properties: RunProperties::new(),
        }
    }

    /// Set the input dataset path
    pub fn data(mut self, data: impl Into<PathBuf>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set an explicit run name
    pub fn name(mut self, name: RunName) -> Self {
        self.name = Some(name);
        self
    }

    /// Set the display name
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a tag
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Set the column mapping
    pub fn column_mapping(mut self, mapping: BTreeMap<String, String>) -> Self {
        self.column_mapping = mapping;
        self
    }

    /// Set user properties
    pub fn properties(mut self, properties: RunProperties) -> Self {
        self.properties = properties;
        self
    }
}

/// A locally tracked run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub name: RunName,
    pub display_name: String,
    pub description: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub status: RunStatus,
    pub flow: FlowSource,
    pub data: Option<PathBuf>,
    pub column_mapping: BTreeMap<String, String>,
    pub properties: RunProperties,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub outputs: Vec<serde_json::Value>,
    pub token_usage: Vec<TokenUsage>,
    pub error: Option<String>,
}

impl Run {
    /// Create a queued run from a submission
    pub fn new(submission: RunSubmission) -> Result<Self> {
        let name = submission.name.unwrap_or_default();
        if !name.is_storage_safe() {
            return Err(RunError::Validation(format!(
                "run name is not a valid storage key: {name}"
            )));
        }

        let display_name = submission
            .display_name
            .unwrap_or_else(|| name.as_str().to_string());

        Ok(Self {
            name,
            display_name,
            description: submission.description,
            tags: submission.tags,
            status: RunStatus::Queued,
            flow: submission.flow,
            data: submission.data,
            column_mapping: submission.column_mapping,
            properties: submission.properties,
            start_time: None,
            end_time: None,
            created_at: Utc::now(),
            outputs: Vec::new(),
            token_usage: Vec::new(),
            error: None,
        })
    }

    /// Move the run to a new status, enforcing forward-only transitions
    pub fn transition(&mut self, next: RunStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(RunError::Validation(format!(
                "invalid status transition: {} -> {}",
                self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }

    /// Mark the run as started
    pub fn start(&mut self) -> Result<()> {
        self.transition(RunStatus::Running)?;
        self.start_time = Some(Utc::now());
        Ok(())
    }

    /// Apply an execution outcome, moving the run to its terminal status
    pub fn finish(&mut self, outcome: ExecutionOutcome) -> Result<()> {
        self.transition(outcome.status)?;
        self.end_time = Some(Utc::now());
        self.outputs = outcome.outputs;
        self.token_usage = outcome.token_usage;
        self.error = outcome.error;
        Ok(())
    }

    /// Aggregate tokens consumed across the run
    pub fn total_tokens(&self) -> u64 {
        self.token_usage.iter().map(|u| u.total_tokens).sum()
    }
}
