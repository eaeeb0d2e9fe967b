//! Premise: Declarative Given/When/Then Tests
//!
//! Tests are declared as prerequisites, one action and assertions over its
//! outcome. Arrangement expands the prerequisites into one case per
//! combination; the runner acts on every case once and records every
//! assertion result.
//!
//! # Quick Start
//!
//! ```rust
//! use premise::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let test = Scenario::new()
//!     .given_each_of(|| vec![2, 1])
//!     .when(|x| 2 / x)
//!     .then_returns()
//!     .and("is positive", |_x, result| *result > 0)
//!     .build();
//!
//! let report = TestRunner::default()
//!     .run_test("divide", &test, Cancellation::never())
//!     .await
//!     .unwrap();
//! assert_eq!(report.outcome, TestOutcome::Passed);
//! # });
//! ```

pub use premise_core as core;
pub use premise_runner as runner;

/// Prelude module for common imports.
pub mod prelude {
    pub use premise_core::{
        ActionError, ArrangementFailurePolicy, Cancellation, CheckError, Configuration, Outcome,
        ResultNamingStrategy, Scenario, SharedContext, Test, TestContext, TestError,
    };
    pub use premise_runner::{
        RunSettings, RunSummary, RunnerError, TestOutcome, TestReport, TestRunner, TestStatus,
        TestSuite,
    };
}
