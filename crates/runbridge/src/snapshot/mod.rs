pub mod error;
pub mod packager;

pub use error::{Result, SnapshotError};
pub use packager::{Snapshot, SnapshotPackager};
