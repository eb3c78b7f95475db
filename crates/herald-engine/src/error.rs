use thiserror::Error;

use crate::directory::DirectoryError;
use herald_core::CoreError;
use herald_storage::StorageError;

/// Errors surfaced by the notification engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Missing template variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
