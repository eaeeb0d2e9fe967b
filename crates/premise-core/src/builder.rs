//! Given / When / Then builder chain.
//!
//! ```text
//! Scenario ──given──▶ Given1 ──and──▶ Given2 ──and──▶ Given3 ──and──▶ Given4
//!    │                  │               │               │               │
//!   when               when            when            when            when
//!    ▼                  ▼               ▼               ▼               ▼
//!  When0              When1           When2           When3           When4
//!    │ then_returns / then_fails / then
//!    ▼
//!  Then0 ..= Then4 ──and──▶ ... ──build──▶ Test
//! ```
//!
//! Every step consumes the builder and returns a new one, so callbacks are
//! type-checked against the exact arity declared so far. Builders are cheap to
//! clone and can be forked; forks share the prerequisites and configuration
//! overrides declared before the fork and nothing after.
//!
//! # Example
//!
//! ```rust
//! use premise_core::{BufferedContext, Scenario};
//!
//! let test = Scenario::new()
//!     .given_each_of(|| vec![2, 1])
//!     .when(|x| 2 / x)
//!     .then_returns()
//!     .and("result is positive", |_x, result| *result > 0)
//!     .build();
//!
//! test.arrange_blocking(BufferedContext::new().shared()).unwrap();
//! assert_eq!(test.cases().len(), 2);
//! ```

use std::any::type_name;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::FutureExt;
use futures::future;

use crate::config::{ConfigChain, Configuration};
use crate::context::SharedContext;
use crate::cross::CrossProduct;
use crate::error::{ActionError, BoxError, CheckError};
use crate::model::{Action, AssertionSpec, Check, CheckFuture, Plan, Test};
use crate::outcome::{Outcome, capture};
use crate::producer::{Context, Deferred, EachOf, Fallible, Prerequisite, Single, Value};

/// Assertion mode: the action is expected to return a value.
#[derive(Debug, Clone, Copy)]
pub struct Returns;

/// Assertion mode: the action is expected to fail.
#[derive(Debug, Clone, Copy)]
pub struct Fails;

/// Assertion mode: assertions inspect the raw [`Outcome`].
#[derive(Debug, Clone, Copy)]
pub struct Inspects;

/// Conversion of an assertion callback's return value into a check result.
///
/// Callbacks may return `()` (pass unless they panic), `bool`, or a
/// `Result<(), CheckError>`.
pub trait IntoCheck {
    /// Converts into a check result.
    ///
    /// # Errors
    /// Returns the check failure.
    fn into_check(self) -> Result<(), CheckError>;
}

impl IntoCheck for () {
    fn into_check(self) -> Result<(), CheckError> {
        Ok(())
    }
}

impl IntoCheck for bool {
    fn into_check(self) -> Result<(), CheckError> {
        if self {
            Ok(())
        } else {
            Err(CheckError::failed("condition was false"))
        }
    }
}

impl IntoCheck for Result<(), CheckError> {
    fn into_check(self) -> Result<(), CheckError> {
        self
    }
}

/// Wraps a check that decides without suspending.
fn immediate<P, R, F>(check: F) -> Check<P, R>
where
    P: 'static,
    R: 'static,
    F: Fn(&P, &Outcome<R>) -> Result<(), CheckError> + Send + Sync + 'static,
{
    Arc::new(move |row: &P, outcome: &Outcome<R>| -> CheckFuture {
        future::ready(check(row, outcome)).boxed()
    })
}

/// Awaits a caller check and converts its verdict.
fn settle<C, Fut>(pending: Fut) -> CheckFuture
where
    C: IntoCheck + 'static,
    Fut: Future<Output = C> + Send + 'static,
{
    pending.map(IntoCheck::into_check).boxed()
}

fn rejected(message: String) -> CheckFuture {
    future::ready(Err(CheckError::failed(message))).boxed()
}

fn expect_returned<P: 'static, R: 'static>() -> AssertionSpec<P, R> {
    let check = immediate(|_: &P, outcome: &Outcome<R>| match outcome {
        Outcome::Returned(_) => Ok(()),
        Outcome::Failed(err) => Err(CheckError::failed(format!(
            "expected a returned value, but the action failed: {err}"
        ))),
    });
    AssertionSpec::new("returns a value", check)
}

fn expect_failed<P: 'static, R: 'static>() -> AssertionSpec<P, R> {
    let check = immediate(|_: &P, outcome: &Outcome<R>| match outcome {
        Outcome::Failed(_) => Ok(()),
        Outcome::Returned(_) => Err(CheckError::failed(
            "expected the action to fail, but it returned a value",
        )),
    });
    AssertionSpec::new("fails", check)
}

fn expect_failed_with<E, P, R>() -> AssertionSpec<P, R>
where
    E: std::error::Error + 'static,
    P: 'static,
    R: 'static,
{
    let expected = type_name::<E>();
    let check = immediate(move |_: &P, outcome: &Outcome<R>| match outcome {
        Outcome::Failed(err) if err.is::<E>() => Ok(()),
        Outcome::Failed(err) => Err(CheckError::failed(format!(
            "expected the action to fail with {expected}, but it failed with: {err}"
        ))),
        Outcome::Returned(_) => Err(CheckError::failed(format!(
            "expected the action to fail with {expected}, but it returned a value"
        ))),
    });
    AssertionSpec::new(format!("fails with {expected}"), check)
}

macro_rules! stage {
    ($arity:literal, $Given:ident, $When:ident, $Then:ident, [$($T:ident $t:ident),*]) => {
        #[doc = concat!("Builder with ", stringify!($arity), " prerequisite(s) declared.")]
        pub struct $Given<$($T),*> {
            prerequisites: CrossProduct<($($T,)*)>,
            config: ConfigChain,
        }

        impl<$($T: Value),*> Clone for $Given<$($T),*> {
            fn clone(&self) -> Self {
                Self {
                    prerequisites: self.prerequisites.clone(),
                    config: self.config.clone(),
                }
            }
        }

        impl<$($T: Value),*> $Given<$($T),*> {
            /// Registers a configuration override for tests built from this step.
            #[must_use]
            pub fn using_configuration<F>(mut self, mutation: F) -> Self
            where
                F: Fn(&mut Configuration) + Send + Sync + 'static,
            {
                self.config = self.config.with(mutation);
                self
            }

            /// Declares the action under test.
            pub fn when<R, F>(self, action: F) -> $When<$($T,)* R>
            where
                R: Send + Sync + 'static,
                F: Fn($(&$T),*) -> R + Send + Sync + 'static,
            {
                self.bind::<R>(Arc::new(move |row: &($($T,)*)| {
                    let ($($t,)*) = row;
                    future::ready(Outcome::capture(|| action($($t),*))).boxed()
                }))
            }

            /// Declares a fallible action under test; `Err` becomes a failed outcome.
            pub fn try_when<R, E, F>(self, action: F) -> $When<$($T,)* R>
            where
                R: Send + Sync + 'static,
                E: Into<BoxError>,
                F: Fn($(&$T),*) -> Result<R, E> + Send + Sync + 'static,
            {
                self.bind::<R>(Arc::new(move |row: &($($T,)*)| {
                    let ($($t,)*) = row;
                    future::ready(Outcome::capture_result(|| action($($t),*))).boxed()
                }))
            }

            /// Declares an async action under test. It receives owned clones.
            pub fn when_async<R, Fut, F>(self, action: F) -> $When<$($T,)* R>
            where
                R: Send + Sync + 'static,
                Fut: Future<Output = R> + Send + 'static,
                F: Fn($($T),*) -> Fut + Send + Sync + 'static,
            {
                self.bind::<R>(Arc::new(move |row: &($($T,)*)| {
                    let ($($t,)*) = row;
                    match capture(|| action($($t.clone()),*)) {
                        Ok(pending) => Outcome::capture_async(pending).boxed(),
                        Err(err) => future::ready(Outcome::Failed(err)).boxed(),
                    }
                }))
            }

            /// Declares a fallible async action under test.
            pub fn try_when_async<R, E, Fut, F>(self, action: F) -> $When<$($T,)* R>
            where
                R: Send + Sync + 'static,
                E: Into<BoxError> + Send + 'static,
                Fut: Future<Output = Result<R, E>> + Send + 'static,
                F: Fn($($T),*) -> Fut + Send + Sync + 'static,
            {
                self.bind::<R>(Arc::new(move |row: &($($T,)*)| {
                    let ($($t,)*) = row;
                    match capture(|| action($($t.clone()),*)) {
                        Ok(pending) => Outcome::capture_async_result(pending).boxed(),
                        Err(err) => future::ready(Outcome::Failed(err)).boxed(),
                    }
                }))
            }

            fn bind<R>(self, action: Action<($($T,)*), R>) -> $When<$($T,)* R> {
                $When {
                    prerequisites: self.prerequisites,
                    action,
                    config: self.config,
                }
            }
        }

        #[doc = concat!("Action bound to ", stringify!($arity), " prerequisite(s); awaiting assertions.")]
        pub struct $When<$($T,)* R> {
            prerequisites: CrossProduct<($($T,)*)>,
            action: Action<($($T,)*), R>,
            config: ConfigChain,
        }

        impl<$($T: Value,)* R> Clone for $When<$($T,)* R> {
            fn clone(&self) -> Self {
                Self {
                    prerequisites: self.prerequisites.clone(),
                    action: Arc::clone(&self.action),
                    config: self.config.clone(),
                }
            }
        }

        impl<$($T: Value,)* R: Send + Sync + 'static> $When<$($T,)* R> {
            /// Registers a configuration override for tests built from this step.
            #[must_use]
            pub fn using_configuration<F>(mut self, mutation: F) -> Self
            where
                F: Fn(&mut Configuration) + Send + Sync + 'static,
            {
                self.config = self.config.with(mutation);
                self
            }

            /// Expects the action to return; adds a "returns a value" assertion.
            pub fn then_returns(self) -> $Then<$($T,)* R, Returns> {
                self.into_then(vec![expect_returned()])
            }

            /// Expects the action to fail with any error; adds a "fails" assertion.
            pub fn then_fails(self) -> $Then<$($T,)* R, Fails> {
                self.into_then(vec![expect_failed()])
            }

            /// Expects the action to fail with an `E`; adds a "fails with E" assertion.
            pub fn then_fails_with<E>(self) -> $Then<$($T,)* R, Fails>
            where
                E: std::error::Error + 'static,
            {
                self.into_then(vec![expect_failed_with::<E, _, _>()])
            }

            /// Adds a free-form assertion over the raw outcome. No expectation is implied.
            pub fn then<C, F>(self, description: impl Into<String>, assertion: F) -> $Then<$($T,)* R, Inspects>
            where
                C: IntoCheck,
                F: Fn($(&$T,)* &Outcome<R>) -> C + Send + Sync + 'static,
            {
                self.into_then::<Inspects>(Vec::new()).and(description, assertion)
            }

            /// Adds a free-form async assertion over a clone of the raw outcome.
            pub fn then_async<C, Fut, F>(self, description: impl Into<String>, assertion: F) -> $Then<$($T,)* R, Inspects>
            where
                R: Clone,
                C: IntoCheck + 'static,
                Fut: Future<Output = C> + Send + 'static,
                F: Fn($($T,)* Outcome<R>) -> Fut + Send + Sync + 'static,
            {
                self.into_then::<Inspects>(Vec::new()).and_async(description, assertion)
            }

            fn into_then<M>(self, assertions: Vec<AssertionSpec<($($T,)*), R>>) -> $Then<$($T,)* R, M> {
                $Then {
                    prerequisites: self.prerequisites,
                    action: self.action,
                    assertions,
                    config: self.config,
                    mode: PhantomData,
                }
            }
        }

        #[doc = concat!("Assertions over an action with ", stringify!($arity), " prerequisite(s).")]
        pub struct $Then<$($T,)* R, M> {
            prerequisites: CrossProduct<($($T,)*)>,
            action: Action<($($T,)*), R>,
            assertions: Vec<AssertionSpec<($($T,)*), R>>,
            config: ConfigChain,
            mode: PhantomData<fn() -> M>,
        }

        impl<$($T: Value,)* R, M> Clone for $Then<$($T,)* R, M> {
            fn clone(&self) -> Self {
                Self {
                    prerequisites: self.prerequisites.clone(),
                    action: Arc::clone(&self.action),
                    assertions: self.assertions.clone(),
                    config: self.config.clone(),
                    mode: PhantomData,
                }
            }
        }

        impl<$($T: Value,)* R: Send + Sync + 'static, M> $Then<$($T,)* R, M> {
            /// Registers a configuration override for the built test.
            #[must_use]
            pub fn using_configuration<F>(mut self, mutation: F) -> Self
            where
                F: Fn(&mut Configuration) + Send + Sync + 'static,
            {
                self.config = self.config.with(mutation);
                self
            }

            /// Number of assertions declared so far, defaults included.
            #[must_use]
            pub fn assertion_count(&self) -> usize {
                self.assertions.len()
            }

            /// Finishes the chain.
            #[must_use]
            pub fn build(self) -> Test {
                Test::new(
                    Plan::new(self.prerequisites, self.action, self.assertions),
                    self.config,
                )
            }

            fn push(mut self, description: impl Into<String>, check: Check<($($T,)*), R>) -> Self {
                self.assertions.push(AssertionSpec::new(description, check));
                self
            }
        }

        impl<$($T: Value,)* R: Send + Sync + 'static> $Then<$($T,)* R, Returns> {
            /// Adds an assertion over the returned value. Fails if the action failed.
            #[must_use]
            pub fn and<C, F>(self, description: impl Into<String>, assertion: F) -> Self
            where
                C: IntoCheck,
                F: Fn($(&$T,)* &R) -> C + Send + Sync + 'static,
            {
                self.push(description, immediate(move |row: &($($T,)*), outcome: &Outcome<R>| {
                    let ($($t,)*) = row;
                    match outcome {
                        Outcome::Returned(value) => assertion($($t,)* value).into_check(),
                        Outcome::Failed(err) => Err(CheckError::failed(format!("the action failed: {err}"))),
                    }
                }))
            }

            /// Adds an async assertion over a clone of the returned value.
            #[must_use]
            pub fn and_async<C, Fut, F>(self, description: impl Into<String>, assertion: F) -> Self
            where
                R: Clone,
                C: IntoCheck + 'static,
                Fut: Future<Output = C> + Send + 'static,
                F: Fn($($T,)* R) -> Fut + Send + Sync + 'static,
            {
                self.push(description, Arc::new(move |row: &($($T,)*), outcome: &Outcome<R>| -> CheckFuture {
                    let ($($t,)*) = row;
                    match outcome {
                        Outcome::Returned(value) => settle(assertion($($t.clone(),)* value.clone())),
                        Outcome::Failed(err) => rejected(format!("the action failed: {err}")),
                    }
                }))
            }
        }

        impl<$($T: Value,)* R: Send + Sync + 'static> $Then<$($T,)* R, Fails> {
            /// Adds an assertion over the captured error. Fails if the action returned.
            #[must_use]
            pub fn and<C, F>(self, description: impl Into<String>, assertion: F) -> Self
            where
                C: IntoCheck,
                F: Fn($(&$T,)* &ActionError) -> C + Send + Sync + 'static,
            {
                self.push(description, immediate(move |row: &($($T,)*), outcome: &Outcome<R>| {
                    let ($($t,)*) = row;
                    match outcome {
                        Outcome::Failed(err) => assertion($($t,)* err).into_check(),
                        Outcome::Returned(_) => Err(CheckError::failed("the action returned a value")),
                    }
                }))
            }

            /// Adds an async assertion over the captured error.
            #[must_use]
            pub fn and_async<C, Fut, F>(self, description: impl Into<String>, assertion: F) -> Self
            where
                C: IntoCheck + 'static,
                Fut: Future<Output = C> + Send + 'static,
                F: Fn($($T,)* ActionError) -> Fut + Send + Sync + 'static,
            {
                self.push(description, Arc::new(move |row: &($($T,)*), outcome: &Outcome<R>| -> CheckFuture {
                    let ($($t,)*) = row;
                    match outcome {
                        Outcome::Failed(err) => settle(assertion($($t.clone(),)* err.clone())),
                        Outcome::Returned(_) => rejected("the action returned a value".to_string()),
                    }
                }))
            }
        }

        impl<$($T: Value,)* R: Send + Sync + 'static> $Then<$($T,)* R, Inspects> {
            /// Adds another free-form assertion over the raw outcome.
            #[must_use]
            pub fn and<C, F>(self, description: impl Into<String>, assertion: F) -> Self
            where
                C: IntoCheck,
                F: Fn($(&$T,)* &Outcome<R>) -> C + Send + Sync + 'static,
            {
                self.push(description, immediate(move |row: &($($T,)*), outcome: &Outcome<R>| {
                    let ($($t,)*) = row;
                    assertion($($t,)* outcome).into_check()
                }))
            }

            /// Adds another free-form async assertion over a clone of the outcome.
            #[must_use]
            pub fn and_async<C, Fut, F>(self, description: impl Into<String>, assertion: F) -> Self
            where
                R: Clone,
                C: IntoCheck + 'static,
                Fut: Future<Output = C> + Send + 'static,
                F: Fn($($T,)* Outcome<R>) -> Fut + Send + Sync + 'static,
            {
                self.push(description, Arc::new(move |row: &($($T,)*), outcome: &Outcome<R>| -> CheckFuture {
                    let ($($t,)*) = row;
                    settle(assertion($($t.clone(),)* outcome.clone()))
                }))
            }
        }
    };
}

macro_rules! extend {
    (
        $From:ident [$($T:ident $t:ident),*] => $To:ident [$N:ident $n:ident],
        $prerequisite:ident, $given:ident, $each_of:ident, $try_given:ident, $given_async:ident, $context:ident
    ) => {
        impl<$($T: Value),*> $From<$($T),*> {
            /// Adds a prerequisite from any [`Prerequisite`] implementation.
            pub fn $prerequisite<$N, S>(self, producer: S) -> $To<$($T,)* $N>
            where
                $N: Value,
                S: Prerequisite<$N> + 'static,
            {
                let producer: Arc<dyn Prerequisite<$N>> = Arc::new(producer);
                $To {
                    prerequisites: self.prerequisites.extend(
                        producer,
                        |row: &($($T,)*), $n: &$N| {
                            let ($($t,)*) = row;
                            ($($t.clone(),)* $n.clone(),)
                        },
                    ),
                    config: self.config,
                }
            }

            /// Adds a single-valued prerequisite.
            pub fn $given<$N, F>(self, factory: F) -> $To<$($T,)* $N>
            where
                $N: Value,
                F: Fn() -> $N + Send + Sync + 'static,
            {
                self.$prerequisite(Single::new(factory))
            }

            /// Adds a multi-valued prerequisite: one case per item, in order.
            pub fn $each_of<$N, I, F>(self, items: F) -> $To<$($T,)* $N>
            where
                $N: Value,
                I: IntoIterator<Item = $N> + 'static,
                F: Fn() -> I + Send + Sync + 'static,
            {
                self.$prerequisite(EachOf::new(items))
            }

            /// Adds a single-valued prerequisite whose factory may fail.
            pub fn $try_given<$N, E, F>(self, factory: F) -> $To<$($T,)* $N>
            where
                $N: Value,
                E: Into<BoxError> + 'static,
                F: Fn() -> Result<$N, E> + Send + Sync + 'static,
            {
                self.$prerequisite(Fallible::new(factory))
            }

            /// Adds a single-valued prerequisite produced asynchronously.
            pub fn $given_async<$N, Fut, F>(self, factory: F) -> $To<$($T,)* $N>
            where
                $N: Value,
                Fut: Future<Output = $N> + Send + 'static,
                F: Fn() -> Fut + Send + Sync + 'static,
            {
                self.$prerequisite(Deferred::new(factory))
            }

            /// Adds the host-supplied test context as a prerequisite.
            pub fn $context(self) -> $To<$($T,)* SharedContext> {
                self.$prerequisite(Context)
            }
        }
    };
}

stage!(0, Scenario, When0, Then0, []);
stage!(1, Given1, When1, Then1, [T1 t1]);
stage!(2, Given2, When2, Then2, [T1 t1, T2 t2]);
stage!(3, Given3, When3, Then3, [T1 t1, T2 t2, T3 t3]);
stage!(4, Given4, When4, Then4, [T1 t1, T2 t2, T3 t3, T4 t4]);

extend!(
    Scenario [] => Given1 [T1 t1],
    given_prerequisite, given, given_each_of, try_given, given_async, given_test_context
);
extend!(
    Given1 [T1 t1] => Given2 [T2 t2],
    and_prerequisite, and, and_each_of, and_try, and_async, and_test_context
);
extend!(
    Given2 [T1 t1, T2 t2] => Given3 [T3 t3],
    and_prerequisite, and, and_each_of, and_try, and_async, and_test_context
);
extend!(
    Given3 [T1 t1, T2 t2, T3 t3] => Given4 [T4 t4],
    and_prerequisite, and, and_each_of, and_try, and_async, and_test_context
);

impl Scenario {
    /// Starts a chain with no prerequisites and no configuration overrides.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prerequisites: CrossProduct::unit(),
            config: ConfigChain::new(),
        }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}
