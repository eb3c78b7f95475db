use thiserror::Error;

/// Core error types for Herald domain operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid time of day: {0}")]
    InvalidTimeOfDay(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new InvalidTimeOfDay error
    pub fn invalid_time_of_day(message: impl Into<String>) -> Self {
        Self::InvalidTimeOfDay(message.into())
    }

    /// Create a new InvalidSchedule error
    pub fn invalid_schedule(message: impl Into<String>) -> Self {
        Self::InvalidSchedule(message.into())
    }

    /// Create a new InvalidTemplate error
    pub fn invalid_template(message: impl Into<String>) -> Self {
        Self::InvalidTemplate(message.into())
    }

    /// Create a new InvalidStatusTransition error
    pub fn invalid_status_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidStatusTransition {
            from: from.into(),
            to: to.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
