//! Error types for premise-core.
//!
//! Three families are kept apart so a host never confuses them:
//! - [`TestError`]: usage errors and arrangement failures of a [`Test`](crate::Test)
//! - [`ActionError`]: the error half of an [`Outcome`](crate::Outcome)
//! - [`CheckError`]: the result of invoking a [`TestAssertion`](crate::TestAssertion)

use std::any::Any;
use std::sync::Arc;

/// Boxed error used wherever caller code may fail with any error type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for test lifecycle operations.
pub type Result<T> = std::result::Result<T, TestError>;

/// Lifecycle errors of a test and its cases.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// `arrange()` was called on a test that was already arranged (or failed to).
    #[error("invalid operation: test has already been arranged")]
    AlreadyArranged,

    /// `act()` was called a second time on the same case.
    #[error("invalid operation: test case has already been acted upon")]
    AlreadyActed,

    /// An assertion was invoked before its case's action completed.
    #[error("invalid operation: test case has not been acted upon")]
    NotActed,

    /// A multi-valued prerequisite produced no values.
    #[error("prerequisite #{index} produced no values")]
    EmptyPrerequisite {
        /// One-based position of the prerequisite in the builder chain.
        index: usize,
    },

    /// A prerequisite producer failed during arrangement.
    #[error("arrangement failed: {0}")]
    Arrangement(BoxError),
}

impl TestError {
    /// Creates an arrangement error.
    #[must_use]
    pub fn arrangement(err: impl Into<BoxError>) -> Self {
        Self::Arrangement(err.into())
    }

    /// Returns true if this error is a programmer error rather than a test outcome.
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::AlreadyArranged | Self::AlreadyActed | Self::NotActed)
    }
}

/// Error captured from an action (or a prerequisite factory).
///
/// Cloning shares the underlying error, so async assertions can own it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ActionError {
    /// The callable panicked.
    #[error("panicked: {0}")]
    Panicked(String),

    /// The callable returned an error.
    #[error("{0}")]
    Error(Arc<dyn std::error::Error + Send + Sync + 'static>),
}

impl ActionError {
    /// Creates an error from anything convertible into a boxed error.
    #[must_use]
    pub fn error(err: impl Into<BoxError>) -> Self {
        Self::Error(Arc::from(err.into()))
    }

    /// Returns true if the callable panicked.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }

    /// Returns the panic message, if the callable panicked.
    #[must_use]
    pub fn panic_message(&self) -> Option<&str> {
        match self {
            Self::Panicked(message) => Some(message),
            Self::Error(_) => None,
        }
    }

    /// Returns the returned error as `E`, if it is one.
    #[must_use]
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Error(err) => err.downcast_ref::<E>(),
            Self::Panicked(_) => None,
        }
    }

    /// Returns true if the returned error is an `E`.
    #[must_use]
    pub fn is<E: std::error::Error + 'static>(&self) -> bool {
        self.downcast_ref::<E>().is_some()
    }

    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::Panicked(panic_message(payload))
    }
}

/// Failure of an assertion invocation.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// The distinguished "assertion failed" condition.
    #[error("assertion failed: {0}")]
    Failed(String),

    /// Any other error raised while checking.
    #[error("unexpected error: {0}")]
    Unexpected(BoxError),

    /// The assertion was invoked out of order.
    #[error(transparent)]
    Usage(#[from] TestError),
}

impl CheckError {
    /// Creates an assertion failure.
    #[must_use]
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Creates an unexpected-error failure.
    #[must_use]
    pub fn unexpected(err: impl Into<BoxError>) -> Self {
        Self::Unexpected(err.into())
    }

    /// Returns true for the distinguished assertion failure.
    #[must_use]
    pub const fn is_assertion_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}
