//! Result recording.
//!
//! The engine classifies every test into a [`TestOutcome`], maps it to an
//! external [`TestStatus`], and hands per-assertion [`AssertionRecord`]s to a
//! [`Recorder`] as they happen.

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use premise_core::{ArrangementFailurePolicy, CheckError};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RunnerError};

/// Unique identifier of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(uuid::Uuid);

impl RunId {
    /// Creates a new random run ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Three-way classification of a test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    /// Arrangement succeeded and every assertion passed.
    Passed,
    /// Arrangement succeeded and at least one assertion failed.
    Failed,
    /// A prerequisite producer failed; nothing was acted or asserted.
    ArrangementFailed,
}

impl TestOutcome {
    /// Maps the outcome to the status a host reports.
    #[must_use]
    pub const fn status(self, policy: ArrangementFailurePolicy) -> TestStatus {
        match (self, policy) {
            (Self::Passed, _) => TestStatus::Passed,
            (Self::Failed, _) | (Self::ArrangementFailed, ArrangementFailurePolicy::Failed) => {
                TestStatus::Failed
            }
            (Self::ArrangementFailed, ArrangementFailurePolicy::Skipped) => TestStatus::Skipped,
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::ArrangementFailed => write!(f, "arrangement failed"),
        }
    }
}

/// Externally reported status of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// Passed.
    Passed,
    /// Failed.
    Failed,
    /// Skipped.
    Skipped,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Why an assertion did not pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The check did not hold.
    AssertionFailure,
    /// The check raised an unrelated error.
    UnexpectedError,
}

/// Details of a failed assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Failure kind.
    pub kind: FailureKind,
    /// Human-readable message.
    pub message: String,
    /// Full error detail for unexpected errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl FailureDetail {
    /// Classifies a check error.
    ///
    /// Returns `None` for usage errors, which are not test outcomes.
    #[must_use]
    pub fn from_check(err: &CheckError) -> Option<Self> {
        match err {
            CheckError::Failed(message) => Some(Self {
                kind: FailureKind::AssertionFailure,
                message: message.clone(),
                detail: None,
            }),
            CheckError::Unexpected(source) => Some(Self {
                kind: FailureKind::UnexpectedError,
                message: source.to_string(),
                detail: Some(format!("{source:?}")),
            }),
            CheckError::Usage(_) => None,
        }
    }
}

/// Result of one assertion of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionRecord {
    /// Zero-based case position.
    pub case_index: usize,
    /// Zero-based assertion position within the case.
    pub assertion_index: usize,
    /// Distinguishing label, if the naming strategy produced one.
    pub label: Option<String>,
    /// Failure details; `None` if the assertion passed.
    pub failure: Option<FailureDetail>,
}

impl AssertionRecord {
    /// Returns true if the assertion passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.failure.is_none()
    }

    /// The label, falling back to the test's name.
    #[must_use]
    pub fn display_name(&self, test: &str) -> String {
        self.label.clone().unwrap_or_else(|| test.to_string())
    }
}

/// Report of one test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    /// Test name.
    pub name: String,
    /// Three-way outcome.
    pub outcome: TestOutcome,
    /// Reported status.
    pub status: TestStatus,
    /// Per-assertion results, case by case.
    pub assertions: Vec<AssertionRecord>,
    /// Arrangement failure message, if arrangement failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrangement_error: Option<String>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Lines the test wrote to its output.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<String>,
    /// Lines the test wrote to its error output.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl TestReport {
    /// Number of failed assertions.
    #[must_use]
    pub fn failed_assertions(&self) -> usize {
        self.assertions.iter().filter(|a| !a.passed()).count()
    }
}

/// Report of a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run identifier.
    pub run_id: RunId,
    /// Reports of the tests that ran, in suite order.
    pub reports: Vec<TestReport>,
    /// Tests never launched because the run was cancelled.
    pub not_run: Vec<String>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl RunSummary {
    /// Number of passed tests.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(TestStatus::Passed)
    }

    /// Number of failed tests.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(TestStatus::Failed)
    }

    /// Number of skipped tests.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(TestStatus::Skipped)
    }

    /// Returns true if no test failed and none was left unrun.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.not_run.is_empty()
    }

    /// Looks up a report by test name.
    #[must_use]
    pub fn report(&self, name: &str) -> Option<&TestReport> {
        self.reports.iter().find(|r| r.name == name)
    }

    /// Serializes the summary as pretty JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| RunnerError::serialization(e.to_string()))
    }

    fn count(&self, status: TestStatus) -> usize {
        self.reports.iter().filter(|r| r.status == status).count()
    }
}

pub(crate) fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Host-side sink for results as they are produced.
pub trait Recorder: Send + Sync + fmt::Debug {
    /// A test is about to be arranged.
    fn test_started(&self, test: &str);

    /// One assertion has been evaluated.
    fn assertion_recorded(&self, test: &str, record: &AssertionRecord);

    /// A test has finished.
    fn test_finished(&self, report: &TestReport);
}

/// Recorder that emits `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRecorder;

impl Recorder for TracingRecorder {
    fn test_started(&self, test: &str) {
        tracing::info!(test, "test started");
    }

    fn assertion_recorded(&self, test: &str, record: &AssertionRecord) {
        match &record.failure {
            None => tracing::debug!(
                test,
                case = record.case_index,
                assertion = %record.display_name(test),
                "assertion passed"
            ),
            Some(failure) => tracing::warn!(
                test,
                case = record.case_index,
                assertion = %record.display_name(test),
                kind = ?failure.kind,
                message = %failure.message,
                "assertion failed"
            ),
        }
    }

    fn test_finished(&self, report: &TestReport) {
        tracing::info!(
            test = %report.name,
            outcome = %report.outcome,
            status = %report.status,
            duration_ms = report.duration_ms,
            "test finished"
        );
    }
}

/// Event captured by a [`MemoryRecorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A test started.
    Started(String),
    /// An assertion was recorded.
    Assertion(String, AssertionRecord),
    /// A test finished.
    Finished(TestReport),
}

/// Recorder that keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    events: Mutex<Vec<RecordedEvent>>,
}

impl MemoryRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Returns the events of one test.
    #[must_use]
    pub fn events_for(&self, test: &str) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| match event {
                RecordedEvent::Started(name) | RecordedEvent::Assertion(name, _) => name == test,
                RecordedEvent::Finished(report) => report.name == test,
            })
            .cloned()
            .collect()
    }
}

impl Recorder for MemoryRecorder {
    fn test_started(&self, test: &str) {
        self.events.lock().push(RecordedEvent::Started(test.to_string()));
    }

    fn assertion_recorded(&self, test: &str, record: &AssertionRecord) {
        self.events
            .lock()
            .push(RecordedEvent::Assertion(test.to_string(), record.clone()));
    }

    fn test_finished(&self, report: &TestReport) {
        self.events.lock().push(RecordedEvent::Finished(report.clone()));
    }
}
