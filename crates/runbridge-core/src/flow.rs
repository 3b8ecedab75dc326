//! Flow source shapes
//!
//! A run points at exactly one flow source. The set of shapes is closed so
//! that the snapshot packager and the cloud registrar can match on it
//! exhaustively.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the declarative flow definition inside a flow directory
pub const FLOW_DEFINITION_FILE: &str = "flow.json";

/// Extension of single-prompt-file flows
pub const PROMPT_FILE_EXTENSION: &str = "prompt";

/// Where a run's flow comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowSource {
    /// A directory containing a declarative flow definition file
    Directory { path: PathBuf },
    /// A bare callable reference (`module:function`) plus an explicit code root
    Entry { entry: String, code_root: PathBuf },
    /// A single prompt file, exempt from cloud sync
    PromptFile { path: PathBuf },
}

impl FlowSource {
    /// Flow backed by a directory with a definition file
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::Directory { path: path.into() }
    }

    /// Flow backed by a callable entry and a code root
    pub fn entry(entry: impl Into<String>, code_root: impl Into<PathBuf>) -> Self {
        Self::Entry {
            entry: entry.into(),
            code_root: code_root.into(),
        }
    }

    /// Flow backed by a single prompt file
    pub fn prompt_file(path: impl Into<PathBuf>) -> Self {
        Self::PromptFile { path: path.into() }
    }

    /// Infer the flow shape from a filesystem path.
    ///
    /// A directory becomes [`FlowSource::Directory`]; a file with the
    /// `.prompt` extension becomes [`FlowSource::PromptFile`]. Anything
    /// else is rejected, since a bare entry needs an explicit code root.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.is_dir() {
            return Ok(Self::Directory { path });
        }
        if path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == PROMPT_FILE_EXTENSION)
        {
            return Ok(Self::PromptFile { path });
        }
        Err(CoreError::InvalidFlow(format!(
            "not a flow directory or prompt file: {}",
            path.display()
        )))
    }

    /// Check if this is the single-prompt-file shape
    pub fn is_prompt_file(&self) -> bool {
        matches!(self, FlowSource::PromptFile { .. })
    }

    /// Short name of the shape, for logs and errors
    pub fn kind(&self) -> &'static str {
        match self {
            FlowSource::Directory { .. } => "directory",
            FlowSource::Entry { .. } => "entry",
            FlowSource::PromptFile { .. } => "prompt_file",
        }
    }

    /// The directory whose content represents the flow, if any
    pub fn code_root(&self) -> Option<&Path> {
        match self {
            FlowSource::Directory { path } => Some(path),
            FlowSource::Entry { code_root, .. } => Some(code_root),
            FlowSource::PromptFile { .. } => None,
        }
    }
}
