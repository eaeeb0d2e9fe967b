// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # premise-core
//!
//! Declarative given/when/then test specifications.
//!
//! A test is described as a chain of independent prerequisite producers, one
//! action under test and one or more assertions over the action's outcome.
//! Arranging the test expands it into the cross product of prerequisite
//! values, one [`TestCase`] per combination:
//!
//! - [`Scenario`] and the `Given*`/`When*`/`Then*` builders for declaring tests
//! - [`Test`], [`TestCase`], [`TestAssertion`] for running them (exactly-once
//!   arrange and act)
//! - [`ConfigChain`] / [`Configuration`] for per-test configuration overrides
//! - [`ResultNamingStrategy`] for labelling assertion results
//!
//! ## Example
//!
//! ```rust
//! use premise_core::{BufferedContext, Scenario};
//!
//! let test = Scenario::new()
//!     .given_each_of(|| vec![1, 2, 3])
//!     .and_each_of(|| vec![10, 20])
//!     .when(|a, b| a * b)
//!     .then_returns()
//!     .and("product is at least the multiplier", |_a, b, product| product >= b)
//!     .build();
//!
//! test.arrange_blocking(BufferedContext::new().shared()).unwrap();
//! assert_eq!(test.cases().len(), 6);
//!
//! for case in test.cases() {
//!     case.act_blocking().unwrap();
//!     for assertion in case.assertions() {
//!         assert!(assertion.invoke().is_ok());
//!     }
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::significant_drop_tightening)]

pub mod builder;
pub mod config;
pub mod context;
pub mod cross;
pub mod error;
pub mod model;
pub mod naming;
pub mod outcome;
pub mod producer;

pub use builder::{
    Fails, Given1, Given2, Given3, Given4, Inspects, IntoCheck, Returns, Scenario, Then0, Then1,
    Then2, Then3, Then4, When0, When1, When2, When3, When4,
};
pub use config::{ArrangementFailurePolicy, ConfigChain, Configuration};
pub use context::{BufferedContext, Cancellation, CancellationHandle, SharedContext, TestContext};
pub use cross::{CrossProduct, Row};
pub use error::{ActionError, BoxError, CheckError, Result, TestError};
pub use model::{Test, TestAssertion, TestCase, Trait, TraitProvider};
pub use naming::{
    DefaultNaming, LabelRequest, ResultNamingStrategy, VerboseNaming, strategy_by_name,
};
pub use outcome::Outcome;
pub use producer::{Context, Deferred, EachOf, Fallible, Prerequisite, Single, Value};
