//! Error types for runbridge-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Invalid flow source: {0}")]
    InvalidFlow(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
