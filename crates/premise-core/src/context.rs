//! Ambient test context supplied by the host for each run.
//!
//! The context is injectable as a prerequisite (see
//! [`Scenario::given_test_context`](crate::Scenario::given_test_context)) and
//! carries output sinks plus a cooperative cancellation signal.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

/// Host-supplied services available to a running test.
pub trait TestContext: Send + Sync + fmt::Debug {
    /// Writes a line to the test's standard output.
    fn write_output(&self, message: &str);

    /// Writes a line to the test's error output.
    fn write_error(&self, message: &str);

    /// Returns the cancellation signal for the current run.
    fn cancellation(&self) -> Cancellation;
}

/// Shared handle to a test context.
pub type SharedContext = Arc<dyn TestContext>;

/// Receiving side of a cooperative cancellation signal.
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

impl Cancellation {
    /// Creates a linked cancellation handle and signal.
    #[must_use]
    pub fn new() -> (CancellationHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (CancellationHandle { tx: Arc::new(tx) }, Self { rx })
    }

    /// Creates a signal that is never raised.
    #[must_use]
    pub fn never() -> Self {
        let (_handle, signal) = Self::new();
        signal
    }

    /// Returns true once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits until cancellation is requested.
    ///
    /// Never completes if the handle is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::never()
    }
}

/// Sending side of a cancellation signal.
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancellationHandle {
    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns a new receiver for this signal.
    #[must_use]
    pub fn signal(&self) -> Cancellation {
        Cancellation {
            rx: self.tx.subscribe(),
        }
    }
}

/// Context that buffers everything written to it.
///
/// Useful for hosts that attach output to results after the fact, and in tests.
#[derive(Debug, Default)]
pub struct BufferedContext {
    output: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
    cancellation: Cancellation,
}

impl BufferedContext {
    /// Creates a buffered context with no cancellation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffered context observing `cancellation`.
    #[must_use]
    pub fn with_cancellation(cancellation: Cancellation) -> Self {
        Self {
            cancellation,
            ..Self::default()
        }
    }

    /// Returns the lines written to standard output so far.
    #[must_use]
    pub fn output(&self) -> Vec<String> {
        self.output.lock().clone()
    }

    /// Returns the lines written to error output so far.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }

    /// Wraps the context in a [`SharedContext`].
    #[must_use]
    pub fn shared(self) -> SharedContext {
        Arc::new(self)
    }
}

impl TestContext for BufferedContext {
    fn write_output(&self, message: &str) {
        tracing::debug!(line = message, "test output");
        self.output.lock().push(message.to_string());
    }

    fn write_error(&self, message: &str) {
        tracing::debug!(line = message, "test error output");
        self.errors.lock().push(message.to_string());
    }

    fn cancellation(&self) -> Cancellation {
        self.cancellation.clone()
    }
}
