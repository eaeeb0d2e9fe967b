// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # premise-runner
//!
//! Execution engine for premise tests.
//!
//! This crate provides:
//! - [`TestRunner`]: arrange, act, assert and classify one test
//! - [`TestSuite`]: sequential or bounded-parallel runs with cooperative
//!   cancellation
//! - [`RunSettings`]: run-wide defaults loaded from TOML
//! - [`Recorder`]: host-side result recording, plus [`RunSummary`] JSON export
//!
//! ## Example
//!
//! ```rust
//! use premise_core::{Cancellation, Scenario};
//! use premise_runner::{TestRunner, TestSuite};
//!
//! # tokio_test::block_on(async {
//! let suite = TestSuite::new()
//!     .with(
//!         "addition",
//!         Scenario::new()
//!             .given_each_of(|| vec![1, 2])
//!             .when(|x| x + 1)
//!             .then_returns()
//!             .and("is greater than the input", |x, sum| sum > x)
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let summary = TestRunner::default()
//!     .run_suite(&suite, Cancellation::never())
//!     .await
//!     .unwrap();
//! assert_eq!(summary.passed(), 1);
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::significant_drop_tightening)]

pub mod context;
pub mod engine;
pub mod error;
pub mod report;
pub mod settings;
pub mod suite;

pub use context::RunContext;
pub use engine::TestRunner;
pub use error::{Result, RunnerError};
pub use report::{
    AssertionRecord, FailureDetail, FailureKind, MemoryRecorder, RecordedEvent, Recorder, RunId,
    RunSummary, TestOutcome, TestReport, TestStatus, TracingRecorder,
};
pub use settings::RunSettings;
pub use suite::TestSuite;
