//! Execution engine for a single test.
//!
//! # Protocol
//!
//! 1. Record "start".
//! 2. Arrange. A producer failure classifies the test as
//!    [`TestOutcome::ArrangementFailed`] and stops: nothing is acted or asserted.
//! 3. For each case in order: act exactly once, then await every assertion in
//!    turn, each independently so one failure never hides the others.
//! 4. Classify, map to a status through the test's effective configuration,
//!    and record "end".
//!
//! Usage errors (double arrange, double act, assertion before act) are
//! programmer errors and propagate as [`RunnerError::Test`].

use std::sync::Arc;
use std::time::Instant;

use premise_core::{Cancellation, CheckError, Configuration, LabelRequest, SharedContext, Test};

use crate::context::RunContext;
use crate::error::{Result, RunnerError};
use crate::report::{
    AssertionRecord, FailureDetail, Recorder, TestOutcome, TestReport, TracingRecorder, millis,
};
use crate::settings::RunSettings;

/// Drives tests through arrange, act and assert.
#[derive(Debug, Clone)]
pub struct TestRunner {
    settings: Arc<RunSettings>,
    defaults: Configuration,
    recorder: Arc<dyn Recorder>,
}

impl TestRunner {
    /// Creates a runner from validated settings, recording through `tracing`.
    ///
    /// # Errors
    /// Returns an error if the settings are invalid.
    pub fn new(settings: RunSettings) -> Result<Self> {
        settings.validate()?;
        let defaults = settings.defaults()?;
        Ok(Self {
            settings: Arc::new(settings),
            defaults,
            recorder: Arc::new(TracingRecorder),
        })
    }

    /// Replaces the recorder.
    #[must_use]
    pub fn with_recorder(mut self, recorder: Arc<dyn Recorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// The run settings.
    #[must_use]
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// The configuration every test's overrides are applied to.
    #[must_use]
    pub const fn defaults(&self) -> &Configuration {
        &self.defaults
    }

    /// Runs one test to completion and reports it.
    ///
    /// # Errors
    /// Returns [`RunnerError::Test`] on a usage error, for example when `test`
    /// was already arranged or one of its cases already acted.
    pub async fn run_test(
        &self,
        name: &str,
        test: &Test,
        cancellation: Cancellation,
    ) -> Result<TestReport> {
        let started = Instant::now();
        self.recorder.test_started(name);

        let config = test.configuration(&self.defaults);
        let ctx = RunContext::new(name, cancellation);
        let shared: SharedContext = ctx.clone();

        let mut assertions = Vec::new();
        let arrangement_error = match test.arrange(shared).await {
            Ok(()) => {
                self.execute(name, test, &config, &mut assertions).await?;
                None
            }
            Err(err) if err.is_usage() => return Err(err.into()),
            Err(err) => {
                tracing::warn!(test = name, error = %err, "arrangement failed");
                Some(err.to_string())
            }
        };

        let outcome = if arrangement_error.is_some() {
            TestOutcome::ArrangementFailed
        } else if assertions.iter().all(AssertionRecord::passed) {
            TestOutcome::Passed
        } else {
            TestOutcome::Failed
        };

        let report = TestReport {
            name: name.to_string(),
            outcome,
            status: outcome.status(config.arrangement_failure),
            assertions,
            arrangement_error,
            duration_ms: millis(started.elapsed()),
            output: ctx.take_output(),
            errors: ctx.take_errors(),
        };
        self.recorder.test_finished(&report);
        Ok(report)
    }

    async fn execute(
        &self,
        name: &str,
        test: &Test,
        config: &Configuration,
        records: &mut Vec<AssertionRecord>,
    ) -> Result<()> {
        let case_count = test.cases().len();

        for (case_index, case) in test.cases().iter().enumerate() {
            case.act().await?;

            let assertion_count = case.assertions().len();
            for (assertion_index, assertion) in case.assertions().iter().enumerate() {
                let failure = match assertion.invoke_async().await {
                    Ok(()) => None,
                    Err(CheckError::Usage(err)) => return Err(RunnerError::Test(err)),
                    Err(err) => FailureDetail::from_check(&err),
                };
                let label = config.result_naming.label(&LabelRequest {
                    case_count,
                    assertion_count,
                    case: case.description(),
                    assertion: assertion.description(),
                });
                let record = AssertionRecord {
                    case_index,
                    assertion_index,
                    label,
                    failure,
                };
                self.recorder.assertion_recorded(name, &record);
                records.push(record);
            }
        }
        Ok(())
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self {
            settings: Arc::new(RunSettings::default()),
            defaults: Configuration::default(),
            recorder: Arc::new(TracingRecorder),
        }
    }
}
