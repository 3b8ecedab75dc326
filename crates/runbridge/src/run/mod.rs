pub mod error;
pub mod in_memory_repository;
pub mod model;
pub mod postgres_repository;
pub mod repository;
pub mod service;

pub use error::{Result, RunError};
pub use in_memory_repository::InMemoryRunRepository;
pub use model::{Run, RunProperties, RunSubmission, property_keys};
pub use postgres_repository::PostgresRunRepository;
pub use repository::RunRepository;
pub use service::RunService;
