use runbridge_core::{FLOW_DEFINITION_FILE, FlowSource, SnapshotId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

use super::{Result, SnapshotError};
use crate::storage::Storage;

/// An immutable, content-addressed package of a run's flow and code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    /// Storage prefix holding the packaged files and manifest
    pub root: String,
    pub file_count: usize,
}

/// Manifest written alongside the packaged files
///
/// Its presence marks the blob as complete; a package interrupted before the
/// manifest write is never resolvable.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotManifest {
    flow_kind: String,
    entry: Option<String>,
    files: Vec<String>,
}

/// Packages flow sources into content-addressed snapshots
#[derive(Clone)]
pub struct SnapshotPackager {
    storage: Arc<dyn Storage>,
}

impl SnapshotPackager {
    /// Create a new SnapshotPackager over a storage backend
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Package a flow source into a snapshot
    ///
    /// Identical content always yields the same snapshot id; re-packaging
    /// unchanged content does not write a new blob.
    pub async fn package(&self, flow: &FlowSource) -> Result<Snapshot> {
        let (root_dir, entry) = match flow {
            FlowSource::Directory { path } => {
                require_dir(path).await?;
                let definition = path.join(FLOW_DEFINITION_FILE);
                if !definition.is_file() {
                    return Err(SnapshotError::Validation(format!(
                        "flow directory has no {FLOW_DEFINITION_FILE}: {}",
                        path.display()
                    )));
                }
                (path.clone(), None)
            }
            FlowSource::Entry { entry, code_root } => {
                validate_entry(entry)?;
                require_dir(code_root).await?;
                (code_root.clone(), Some(entry.clone()))
            }
            FlowSource::PromptFile { path } => {
                return Err(SnapshotError::NotPackageable(format!(
                    "single-prompt-file flows are not packaged: {}",
                    path.display()
                )));
            }
        };

        let files = collect_files(&root_dir).await?;
        if files.is_empty() {
            return Err(SnapshotError::Validation(format!(
                "flow source contains no files: {}",
                root_dir.display()
            )));
        }

        let id = content_id(&files, entry.as_deref());
        let root = format!("snapshots/{id}");
        let manifest_path = format!("{root}/manifest.json");

        if self.storage.exists(&manifest_path).await? {
            tracing::debug!(%id, "snapshot blob already present, reusing");
            return Ok(Snapshot {
                id,
                root,
                file_count: files.len(),
            });
        }

        for (rel_path, content) in &files {
            self.storage
                .write(&format!("{root}/files/{rel_path}"), content)
                .await?;
        }

        let manifest = SnapshotManifest {
            flow_kind: flow.kind().to_string(),
            entry,
            files: files.iter().map(|(p, _)| p.clone()).collect(),
        };
        let manifest_json = serde_json::to_vec(&manifest)
            .map_err(|e| SnapshotError::SerializationError(e.to_string()))?;
        self.storage.write(&manifest_path, &manifest_json).await?;

        tracing::info!(%id, file_count = files.len(), "packaged snapshot");
        Ok(Snapshot {
            id,
            root,
            file_count: files.len(),
        })
    }
}

/// Check a path exists and is a directory
async fn require_dir(path: &Path) -> Result<()> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(SnapshotError::Validation(format!(
            "not a directory: {}",
            path.display()
        ))),
        Err(_) => Err(SnapshotError::Validation(format!(
            "path does not exist: {}",
            path.display()
        ))),
    }
}

/// Check an entry reference has the `module:function` shape
fn validate_entry(entry: &str) -> Result<()> {
    match entry.split_once(':') {
        Some((module, function)) if !module.is_empty() && !function.is_empty() => Ok(()),
        _ => Err(SnapshotError::Validation(format!(
            "entry reference must look like module:function, got '{entry}'"
        ))),
    }
}

/// Collect all files under a root, sorted by relative path
async fn collect_files(root: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    let mut stack = vec![root.to_path_buf()];
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();

    while let Some(dir) = stack.pop() {
        let mut read_dir = fs::read_dir(&dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                stack.push(path);
            } else {
                let rel_path = path
                    .strip_prefix(root)
                    .map_err(|e| SnapshotError::Validation(e.to_string()))?
                    .to_string_lossy()
                    .replace('\\', "/");
                let content = fs::read(&path).await?;
                files.push((rel_path, content));
            }
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Content-addressed id: SHA-256 over the sorted file paths and contents,
/// plus the entry reference when present
fn content_id(files: &[(String, Vec<u8>)], entry: Option<&str>) -> SnapshotId {
    let mut buffer = Vec::new();
    if let Some(entry) = entry {
        buffer.extend_from_slice(b"entry:");
        buffer.extend_from_slice(entry.as_bytes());
        buffer.push(0);
    }
    for (rel_path, content) in files {
        buffer.extend_from_slice(rel_path.as_bytes());
        buffer.push(0);
        buffer.extend_from_slice(content);
        buffer.push(0);
    }
    SnapshotId::from_string(sha256::digest(buffer.as_slice()))
}
