pub mod error;
pub mod model;
pub mod registrar;
pub mod store;

pub use error::{CloudError, Result};
pub use model::{CloudRun, SystemProperties};
pub use registrar::CloudRunRegistrar;
pub use store::{CloudRunStore, InMemoryCloudRunStore};
