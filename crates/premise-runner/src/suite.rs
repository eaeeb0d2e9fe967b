//! Test suites and scheduling.
//!
//! Tests in a suite are independent. Sequential runs check the cancellation
//! signal between tests; parallel runs bound concurrency with a semaphore and
//! stop launching new tests once cancelled. A test that already started always
//! runs to completion. Within a test, cases and assertions stay sequential.

use std::sync::Arc;
use std::time::Instant;

use premise_core::{Cancellation, Test};
use tokio::sync::Semaphore;

use crate::engine::TestRunner;
use crate::error::{Result, RunnerError};
use crate::report::{RunId, RunSummary, TestReport, millis};

/// Named tests to run together.
#[derive(Debug, Default)]
pub struct TestSuite {
    tests: Vec<(String, Arc<Test>)>,
}

impl TestSuite {
    /// Creates an empty suite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `test` under `name`.
    ///
    /// # Errors
    /// Returns an error if the name is empty or already registered.
    pub fn add(&mut self, name: impl Into<String>, test: Test) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(RunnerError::settings("test name cannot be empty"));
        }
        if self.contains(&name) {
            return Err(RunnerError::settings(format!("duplicate test name: {name}")));
        }
        self.tests.push((name, Arc::new(test)));
        Ok(())
    }

    /// Registers `test` under `name`, builder style.
    ///
    /// # Errors
    /// Same as [`add`](Self::add).
    pub fn with(mut self, name: impl Into<String>, test: Test) -> Result<Self> {
        self.add(name, test)?;
        Ok(self)
    }

    /// Returns true if a test named `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tests.iter().any(|(existing, _)| existing == name)
    }

    /// Looks up a test by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Test> {
        self.tests
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, test)| test.as_ref())
    }

    /// Test names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tests.iter().map(|(name, _)| name.as_str())
    }

    /// Number of registered tests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns true if no test is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

impl TestRunner {
    /// Runs every test of `suite` and summarizes the run.
    ///
    /// Reports keep suite order regardless of completion order.
    ///
    /// # Errors
    /// Returns an error on a usage error or if a spawned test task fails.
    /// In parallel mode, tests already started still run to completion first.
    pub async fn run_suite(&self, suite: &TestSuite, cancellation: Cancellation) -> Result<RunSummary> {
        let started = Instant::now();
        let run_id = RunId::new();
        tracing::info!(
            run = %run_id,
            tests = suite.len(),
            parallel = self.settings().parallel,
            "starting run"
        );

        let (reports, not_run) = if self.settings().parallel {
            self.run_parallel(suite, &cancellation).await?
        } else {
            self.run_sequential(suite, &cancellation).await?
        };

        let summary = RunSummary {
            run_id,
            reports,
            not_run,
            duration_ms: millis(started.elapsed()),
        };
        tracing::info!(
            run = %run_id,
            passed = summary.passed(),
            failed = summary.failed(),
            skipped = summary.skipped(),
            not_run = summary.not_run.len(),
            duration_ms = summary.duration_ms,
            "run finished"
        );
        Ok(summary)
    }

    async fn run_sequential(
        &self,
        suite: &TestSuite,
        cancellation: &Cancellation,
    ) -> Result<(Vec<TestReport>, Vec<String>)> {
        let mut reports = Vec::with_capacity(suite.len());
        let mut not_run = Vec::new();

        for (name, test) in &suite.tests {
            if cancellation.is_cancelled() {
                not_run.push(name.clone());
                continue;
            }
            reports.push(self.run_test(name, test, cancellation.clone()).await?);
        }

        if !not_run.is_empty() {
            tracing::info!(not_run = not_run.len(), "run cancelled");
        }
        Ok((reports, not_run))
    }

    async fn run_parallel(
        &self,
        suite: &TestSuite,
        cancellation: &Cancellation,
    ) -> Result<(Vec<TestReport>, Vec<String>)> {
        let semaphore = Arc::new(Semaphore::new(self.settings().max_concurrency));
        let mut handles = Vec::with_capacity(suite.len());
        let mut not_run = Vec::new();

        for (name, test) in &suite.tests {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| RunnerError::join(format!("scheduler closed: {e}")))?;
            if cancellation.is_cancelled() {
                not_run.push(name.clone());
                continue;
            }

            let runner = self.clone();
            let name = name.clone();
            let test = Arc::clone(test);
            let signal = cancellation.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                runner.run_test(&name, &test, signal).await
            }));
        }

        if !not_run.is_empty() {
            tracing::info!(not_run = not_run.len(), "run cancelled");
        }

        // Every spawned test is awaited before the first error is returned.
        let mut reports = Vec::with_capacity(handles.len());
        let mut first_error = None;
        for handle in handles {
            let result = handle
                .await
                .map_err(|e| RunnerError::join(e.to_string()))
                .and_then(|report| report);
            match result {
                Ok(report) => reports.push(report),
                Err(err) => {
                    tracing::warn!(error = %err, "parallel test aborted the run");
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok((reports, not_run)),
        }
    }
}
