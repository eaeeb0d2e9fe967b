//! Runner error types.

use premise_core::TestError;

/// Result type alias for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Runner errors.
///
/// Test failures are never errors: they are recorded in a
/// [`TestReport`](crate::TestReport). These are faults of the host or of the
/// test program itself.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Invalid run settings.
    #[error("settings error: {0}")]
    Settings(String),

    /// A test was driven out of order (usage error).
    #[error("test usage error: {0}")]
    Test(#[from] TestError),

    /// A spawned test task failed to complete.
    #[error("task join error: {0}")]
    Join(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RunnerError {
    /// Creates a settings error.
    #[must_use]
    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }

    /// Creates a join error.
    #[must_use]
    pub fn join(msg: impl Into<String>) -> Self {
        Self::Join(msg.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}
