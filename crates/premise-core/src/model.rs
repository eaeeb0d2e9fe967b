//! Runtime object model: [`Test`] → [`TestCase`] → [`TestAssertion`].
//!
//! # Lifecycle
//!
//! ```text
//! Test:     NotArranged ──arrange()──▶ Arranged | Failed
//! TestCase: NotActed    ──act()──────▶ Acted
//! ```
//!
//! Both transitions are one-shot. A second `arrange()` or `act()` is a usage
//! error and never re-runs producers or actions. Assertions read the outcome
//! recorded by `act()` and fail with [`TestError::NotActed`] before it.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigChain, Configuration};
use crate::context::SharedContext;
use crate::cross::{CrossProduct, Row};
use crate::error::{BoxError, CheckError, Result, TestError, panic_message};
use crate::outcome::Outcome;

/// Action bound to a row of prerequisites.
pub(crate) type Action<P, R> =
    Arc<dyn Fn(&P) -> BoxFuture<'static, Outcome<R>> + Send + Sync>;

/// Pending result of one assertion. Synchronous checks resolve immediately.
pub(crate) type CheckFuture = BoxFuture<'static, std::result::Result<(), CheckError>>;

/// Assertion over a row and the outcome of its action.
pub(crate) type Check<P, R> = Arc<dyn Fn(&P, &Outcome<R>) -> CheckFuture + Send + Sync>;

/// Opaque (name, value) tag attached to a test.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trait {
    /// Tag name.
    pub name: String,
    /// Tag value.
    pub value: String,
}

impl Trait {
    /// Creates a trait tag.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Source of trait tags, such as a host's annotation reader.
pub trait TraitProvider {
    /// Returns the tags to attach.
    fn traits(&self) -> Vec<Trait>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrangeState {
    NotArranged,
    Arranging,
    Arranged,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActState {
    NotActed,
    Acting,
    Acted,
}

/// Produces the cases of a test.
#[async_trait]
pub(crate) trait Arrangement: Send + Sync {
    async fn arrange(&self, ctx: SharedContext) -> std::result::Result<Vec<TestCase>, BoxError>;
}

/// A built test: prerequisites, one action and its assertions.
///
/// Cases exist only after a successful [`arrange`](Self::arrange).
pub struct Test {
    arrangement: Arc<dyn Arrangement>,
    config: ConfigChain,
    traits: Vec<Trait>,
    state: Mutex<ArrangeState>,
    cases: OnceLock<Vec<TestCase>>,
}

impl Test {
    pub(crate) fn new(arrangement: impl Arrangement + 'static, config: ConfigChain) -> Self {
        Self {
            arrangement: Arc::new(arrangement),
            config,
            traits: Vec::new(),
            state: Mutex::new(ArrangeState::NotArranged),
            cases: OnceLock::new(),
        }
    }

    /// Attaches a trait tag.
    #[must_use]
    pub fn with_trait(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.traits.push(Trait::new(name, value));
        self
    }

    /// Attaches every tag supplied by `provider`.
    #[must_use]
    pub fn with_traits_from(mut self, provider: &dyn TraitProvider) -> Self {
        self.traits.extend(provider.traits());
        self
    }

    /// Attached trait tags, in attachment order.
    #[must_use]
    pub fn traits(&self) -> &[Trait] {
        &self.traits
    }

    /// Resolves this test's configuration on top of `defaults`.
    #[must_use]
    pub fn configuration(&self, defaults: &Configuration) -> Configuration {
        self.config.resolve(defaults)
    }

    /// Evaluates every prerequisite once and materializes the cases.
    ///
    /// # Errors
    /// - [`TestError::AlreadyArranged`] on any call after the first.
    /// - [`TestError::EmptyPrerequisite`] if a multi-valued producer was empty.
    /// - [`TestError::Arrangement`] if a producer failed or panicked; no case
    ///   is populated.
    pub async fn arrange(&self, ctx: SharedContext) -> Result<()> {
        self.begin_arrange()?;
        tracing::debug!("arranging test");

        match self.arrangement.arrange(ctx).await {
            Ok(cases) => {
                let count = cases.len();
                let stored = self.cases.set(cases).is_ok();
                *self.state.lock() = ArrangeState::Arranged;
                if !stored {
                    return Err(TestError::AlreadyArranged);
                }
                tracing::debug!(cases = count, "test arranged");
                Ok(())
            }
            Err(err) => {
                *self.state.lock() = ArrangeState::Failed;
                let err = match err.downcast::<TestError>() {
                    Ok(test_error) => *test_error,
                    Err(other) => TestError::Arrangement(other),
                };
                tracing::debug!(error = %err, "arrangement failed");
                Err(err)
            }
        }
    }

    /// Blocking form of [`arrange`](Self::arrange).
    ///
    /// # Errors
    /// Same as [`arrange`](Self::arrange).
    pub fn arrange_blocking(&self, ctx: SharedContext) -> Result<()> {
        futures::executor::block_on(self.arrange(ctx))
    }

    /// Returns true once arrangement has succeeded.
    #[must_use]
    pub fn is_arranged(&self) -> bool {
        *self.state.lock() == ArrangeState::Arranged
    }

    /// The cases, in cross-product order. Empty before arrangement.
    #[must_use]
    pub fn cases(&self) -> &[TestCase] {
        self.cases.get().map_or(&[], Vec::as_slice)
    }

    fn begin_arrange(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state != ArrangeState::NotArranged {
            tracing::warn!(state = ?*state, "arrange called more than once");
            return Err(TestError::AlreadyArranged);
        }
        *state = ArrangeState::Arranging;
        Ok(())
    }
}

impl fmt::Debug for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Test")
            .field("state", &*self.state.lock())
            .field("cases", &self.cases().len())
            .field("traits", &self.traits)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
trait Act: Send + Sync {
    async fn act(&self) -> Result<()>;

    fn has_acted(&self) -> bool;
}

/// One combination of prerequisite values bound to the action and assertions.
pub struct TestCase {
    description: Option<String>,
    body: Arc<dyn Act>,
    assertions: Vec<TestAssertion>,
}

impl TestCase {
    /// Textual form of the prerequisite values; `None` for a test with one case.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The bound assertions, in declaration order.
    #[must_use]
    pub fn assertions(&self) -> &[TestAssertion] {
        &self.assertions
    }

    /// Invokes the action exactly once and records its outcome.
    ///
    /// Errors and panics of the action are captured, not returned.
    ///
    /// # Errors
    /// [`TestError::AlreadyActed`] on any call after the first.
    pub async fn act(&self) -> Result<()> {
        let acted = self.body.act().await;
        if let Err(err) = &acted {
            tracing::warn!(case = ?self.description, error = %err, "act called more than once");
        }
        acted
    }

    /// Blocking form of [`act`](Self::act).
    ///
    /// # Errors
    /// Same as [`act`](Self::act).
    pub fn act_blocking(&self) -> Result<()> {
        futures::executor::block_on(self.act())
    }

    /// Returns true once the action's outcome is recorded.
    #[must_use]
    pub fn has_acted(&self) -> bool {
        self.body.has_acted()
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("description", &self.description)
            .field("acted", &self.has_acted())
            .field("assertions", &self.assertions)
            .finish()
    }
}

/// A labelled, deferred check over one case's outcome.
pub struct TestAssertion {
    description: Option<String>,
    check: Arc<dyn Fn() -> CheckFuture + Send + Sync>,
}

impl TestAssertion {
    /// The assertion's label.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Runs the check, awaiting it if it suspends.
    ///
    /// A panic inside the check (for example from `assert!`), before or
    /// after a suspension point, is reported as [`CheckError::Failed`].
    ///
    /// # Errors
    /// - [`CheckError::Failed`] when the check does not hold.
    /// - [`CheckError::Unexpected`] when the check itself errored.
    /// - [`CheckError::Usage`] when the case has not acted yet.
    pub async fn invoke_async(&self) -> std::result::Result<(), CheckError> {
        let pending = match panic::catch_unwind(AssertUnwindSafe(|| (self.check)())) {
            Ok(pending) => pending,
            Err(payload) => return Err(CheckError::Failed(panic_message(&*payload))),
        };
        AssertUnwindSafe(pending)
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(CheckError::Failed(panic_message(&*payload))))
    }

    /// Blocking form of [`invoke_async`](Self::invoke_async).
    ///
    /// # Errors
    /// Same as [`invoke_async`](Self::invoke_async).
    pub fn invoke(&self) -> std::result::Result<(), CheckError> {
        futures::executor::block_on(self.invoke_async())
    }
}

impl fmt::Debug for TestAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestAssertion")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Labelled check as declared on a builder.
pub(crate) struct AssertionSpec<P, R> {
    description: Option<String>,
    check: Check<P, R>,
}

impl<P, R> AssertionSpec<P, R> {
    pub(crate) fn new(description: impl Into<String>, check: Check<P, R>) -> Self {
        Self {
            description: Some(description.into()),
            check,
        }
    }
}

impl<P, R> Clone for AssertionSpec<P, R> {
    fn clone(&self) -> Self {
        Self {
            description: self.description.clone(),
            check: Arc::clone(&self.check),
        }
    }
}

/// Everything a builder chain declared, ready to be arranged.
pub(crate) struct Plan<P, R> {
    prerequisites: CrossProduct<P>,
    action: Action<P, R>,
    assertions: Vec<AssertionSpec<P, R>>,
}

impl<P: Row, R: Send + Sync + 'static> Plan<P, R> {
    pub(crate) fn new(
        prerequisites: CrossProduct<P>,
        action: Action<P, R>,
        assertions: Vec<AssertionSpec<P, R>>,
    ) -> Self {
        Self {
            prerequisites,
            action,
            assertions,
        }
    }

    fn bind(&self, row: P, describe: bool) -> TestCase {
        let description = describe.then(|| row.describe());
        let body = Arc::new(CaseBody {
            row,
            action: Arc::clone(&self.action),
            state: Mutex::new(ActState::NotActed),
            outcome: OnceLock::new(),
        });

        let assertions = self
            .assertions
            .iter()
            .map(|spec| {
                let body = Arc::clone(&body);
                let check = Arc::clone(&spec.check);
                TestAssertion {
                    description: spec.description.clone(),
                    check: Arc::new(move || -> CheckFuture {
                        match body.outcome.get() {
                            Some(outcome) => check(&body.row, outcome),
                            None => future::ready(Err(TestError::NotActed.into())).boxed(),
                        }
                    }),
                }
            })
            .collect();

        TestCase {
            description,
            body,
            assertions,
        }
    }
}

#[async_trait]
impl<P: Row, R: Send + Sync + 'static> Arrangement for Plan<P, R> {
    async fn arrange(&self, ctx: SharedContext) -> std::result::Result<Vec<TestCase>, BoxError> {
        let rows = self.prerequisites.produce(ctx).await?;
        let describe = rows.len() > 1;
        Ok(rows.into_iter().map(|row| self.bind(row, describe)).collect())
    }
}

struct CaseBody<P, R> {
    row: P,
    action: Action<P, R>,
    state: Mutex<ActState>,
    outcome: OnceLock<Outcome<R>>,
}

impl<P, R> CaseBody<P, R> {
    fn begin(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state != ActState::NotActed {
            return Err(TestError::AlreadyActed);
        }
        *state = ActState::Acting;
        Ok(())
    }
}

#[async_trait]
impl<P: Row, R: Send + Sync + 'static> Act for CaseBody<P, R> {
    async fn act(&self) -> Result<()> {
        self.begin()?;
        let outcome = (self.action)(&self.row).await;
        let stored = self.outcome.set(outcome).is_ok();
        *self.state.lock() = ActState::Acted;
        if stored {
            Ok(())
        } else {
            Err(TestError::AlreadyActed)
        }
    }

    fn has_acted(&self) -> bool {
        *self.state.lock() == ActState::Acted
    }
}
