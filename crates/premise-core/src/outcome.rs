//! Outcome capture.
//!
//! Invoking an action never unwinds past this module: a returned value, a
//! returned `Err` and a panic all become an [`Outcome`].

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;

use crate::error::{ActionError, BoxError};

/// The captured result of invoking an action under test.
#[derive(Debug, Clone)]
pub enum Outcome<R> {
    /// The action returned normally (`()` for procedure-style actions).
    Returned(R),
    /// The action returned an error or panicked.
    Failed(ActionError),
}

impl<R> Outcome<R> {
    /// Invokes `f` exactly once, capturing its value or panic.
    pub fn capture(f: impl FnOnce() -> R) -> Self {
        match capture(f) {
            Ok(value) => Self::Returned(value),
            Err(err) => Self::Failed(err),
        }
    }

    /// Invokes a fallible `f` exactly once; `Err` and panics both become `Failed`.
    pub fn capture_result<E>(f: impl FnOnce() -> std::result::Result<R, E>) -> Self
    where
        E: Into<BoxError>,
    {
        match capture(f) {
            Ok(Ok(value)) => Self::Returned(value),
            Ok(Err(err)) => Self::Failed(ActionError::error(err)),
            Err(err) => Self::Failed(err),
        }
    }

    /// Awaits `future` exactly once, capturing its output or panic.
    pub async fn capture_async<F>(future: F) -> Self
    where
        F: Future<Output = R>,
    {
        match capture_async(future).await {
            Ok(value) => Self::Returned(value),
            Err(err) => Self::Failed(err),
        }
    }

    /// Awaits a fallible `future` exactly once.
    pub async fn capture_async_result<F, E>(future: F) -> Self
    where
        F: Future<Output = std::result::Result<R, E>>,
        E: Into<BoxError>,
    {
        match capture_async(future).await {
            Ok(Ok(value)) => Self::Returned(value),
            Ok(Err(err)) => Self::Failed(ActionError::error(err)),
            Err(err) => Self::Failed(err),
        }
    }

    /// Returns true if the action returned normally.
    #[must_use]
    pub const fn is_returned(&self) -> bool {
        matches!(self, Self::Returned(_))
    }

    /// Returns true if the action failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns the returned value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&R> {
        match self {
            Self::Returned(value) => Some(value),
            Self::Failed(_) => None,
        }
    }

    /// Returns the captured error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&ActionError> {
        match self {
            Self::Returned(_) => None,
            Self::Failed(err) => Some(err),
        }
    }

    /// Converts into a standard `Result`.
    pub fn into_result(self) -> std::result::Result<R, ActionError> {
        match self {
            Self::Returned(value) => Ok(value),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Runs `f`, turning a panic into [`ActionError::Panicked`].
pub(crate) fn capture<T>(f: impl FnOnce() -> T) -> std::result::Result<T, ActionError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| ActionError::from_panic(&*payload))
}

/// Awaits `future`, turning a panic into [`ActionError::Panicked`].
pub(crate) async fn capture_async<F: Future>(
    future: F,
) -> std::result::Result<F::Output, ActionError> {
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|payload| ActionError::from_panic(&*payload))
}
