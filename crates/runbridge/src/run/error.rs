use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Run not found: {0}")]
    NotFound(String),

    #[error("Run already exists: {0}")]
    AlreadyExists(String),

    #[error("Property key is system-reserved: {0}")]
    ReservedProperty(String),

    #[error("Invalid run: {0}")]
    Validation(String),

    #[error("Core error: {0}")]
    Core(#[from] runbridge_core::CoreError),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

pub type Result<T> = std::result::Result<T, RunError>;
