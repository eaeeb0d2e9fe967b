//! Per-test context supplied by the runner.

use std::sync::Arc;

use parking_lot::Mutex;
use premise_core::{Cancellation, TestContext};

/// Context handed to one test: output is logged and kept for the report.
#[derive(Debug)]
pub struct RunContext {
    test: String,
    output: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
    cancellation: Cancellation,
}

impl RunContext {
    /// Creates the context for `test`.
    #[must_use]
    pub fn new(test: impl Into<String>, cancellation: Cancellation) -> Arc<Self> {
        Arc::new(Self {
            test: test.into(),
            output: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            cancellation,
        })
    }

    /// Name of the test this context belongs to.
    #[must_use]
    pub fn test(&self) -> &str {
        &self.test
    }

    /// Drains the captured output lines.
    pub fn take_output(&self) -> Vec<String> {
        std::mem::take(&mut *self.output.lock())
    }

    /// Drains the captured error lines.
    pub fn take_errors(&self) -> Vec<String> {
        std::mem::take(&mut *self.errors.lock())
    }
}

impl TestContext for RunContext {
    fn write_output(&self, message: &str) {
        tracing::info!(test = %self.test, line = message, "test output");
        self.output.lock().push(message.to_string());
    }

    fn write_error(&self, message: &str) {
        tracing::warn!(test = %self.test, line = message, "test error output");
        self.errors.lock().push(message.to_string());
    }

    fn cancellation(&self) -> Cancellation {
        self.cancellation.clone()
    }
}
