use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::StorageResult;

/// Storage trait for snapshot blob operations
#[async_trait]
pub trait Storage: Send + Sync {
    /// Check if a path exists
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Read file contents
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Write file contents, creating parent directories as needed
    async fn write(&self, path: &str, content: &[u8]) -> StorageResult<()>;

    /// Delete a file or directory tree
    async fn delete(&self, path: &str) -> StorageResult<()>;

    /// List entries directly under a prefix
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Get file metadata
    async fn metadata(&self, path: &str) -> StorageResult<FileMetadata>;
}

/// File metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    pub size: u64,
    pub modified: Option<chrono::DateTime<chrono::Utc>>,
    pub is_dir: bool,
}
