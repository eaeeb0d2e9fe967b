//! Falsification Tests: Category B - Acting and Outcome Capture (F011-F020)
//!
//! # Toyota Way: Poka-Yoke
//! The action under test runs once per case; a second run is a mistake the
//! model refuses to make.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use premise_core::{BufferedContext, CheckError, Outcome, Scenario, SharedContext, TestError};

fn ctx() -> SharedContext {
    BufferedContext::new().shared()
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("overdrawn by {missing}")]
struct Overdrawn {
    missing: u32,
}

fn withdraw(balance: u32, amount: u32) -> Result<u32, Overdrawn> {
    balance.checked_sub(amount).ok_or_else(|| Overdrawn {
        missing: amount - balance,
    })
}

// =============================================================================
// F011-F014: Exactly-Once Invocation
// =============================================================================

/// F011: Acting twice on a case is a usage error on the second call
#[test]
fn f011_second_act_rejected() {
    let test = Scenario::new().when(|| 1).then_returns().build();
    test.arrange_blocking(ctx()).unwrap();
    let case = &test.cases()[0];

    case.act_blocking().unwrap();
    let err = case.act_blocking().unwrap_err();
    assert!(
        matches!(err, TestError::AlreadyActed),
        "F011 FALSIFIED: second act was accepted"
    );
    assert!(err.is_usage());
}

/// F012: The action's side effects happen exactly once per case
#[test]
fn f012_side_effects_once_per_case() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let test = Scenario::new()
        .given_each_of(|| vec![1, 2, 3])
        .when(move |x| {
            counter.fetch_add(1, Ordering::SeqCst);
            x * 10
        })
        .then_returns()
        .build();
    test.arrange_blocking(ctx()).unwrap();

    for case in test.cases() {
        case.act_blocking().unwrap();
        let _ = case.act_blocking();
    }
    assert_eq!(
        calls.load(Ordering::SeqCst),
        3,
        "F012 FALSIFIED: the action ran more than once for some case"
    );
}

/// F013: Assertions can be invoked repeatedly without re-running the action
#[test]
fn f013_assertions_reuse_outcome() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let test = Scenario::new()
        .when(move || counter.fetch_add(1, Ordering::SeqCst))
        .then_returns()
        .and("first call", |n| *n == 0)
        .build();
    test.arrange_blocking(ctx()).unwrap();
    let case = &test.cases()[0];
    case.act_blocking().unwrap();

    for _ in 0..3 {
        for assertion in case.assertions() {
            assert!(assertion.invoke().is_ok());
        }
    }
    assert_eq!(
        calls.load(Ordering::SeqCst),
        1,
        "F013 FALSIFIED: invoking assertions re-ran the action"
    );
}

/// F014: An assertion invoked before acting reports a usage error
#[test]
fn f014_assertion_before_act_rejected() {
    let test = Scenario::new().when(|| 1).then_returns().build();
    test.arrange_blocking(ctx()).unwrap();
    let case = &test.cases()[0];

    let err = case.assertions()[0].invoke().unwrap_err();
    assert!(
        matches!(err, CheckError::Usage(TestError::NotActed)),
        "F014 FALSIFIED: expected NotActed, got {err:?}"
    );
    assert!(!case.has_acted());
}

// =============================================================================
// F015-F020: Outcome Correctness
// =============================================================================

/// F015: A returned value is captured as the outcome's result
#[test]
fn f015_returned_value_captured() {
    let outcome = Outcome::capture(|| 6 * 7);
    assert_eq!(outcome.value(), Some(&42), "F015 FALSIFIED: value not captured");
    assert!(outcome.error().is_none(), "F015 FALSIFIED: error present on success");
}

/// F016: A returned error is captured with its concrete type
#[test]
fn f016_returned_error_captured() {
    let outcome = Outcome::capture_result(|| withdraw(10, 25));
    assert!(outcome.value().is_none(), "F016 FALSIFIED: value present on failure");

    let err = outcome.error().unwrap();
    assert_eq!(
        err.downcast_ref::<Overdrawn>(),
        Some(&Overdrawn { missing: 15 }),
        "F016 FALSIFIED: captured error lost its type"
    );
    assert!(!err.is_panic());
}

/// F017: A panicking action becomes a failed outcome, not a crash
#[test]
fn f017_panic_captured() {
    let test = Scenario::new()
        .given_each_of(|| vec![2, 1, 0])
        .when(|x| 2 / x)
        .then("captures the outcome", |x, outcome| {
            if *x == 0 {
                outcome.error().is_some_and(|e| e.is_panic())
            } else {
                outcome.is_returned()
            }
        })
        .build();
    test.arrange_blocking(ctx()).unwrap();

    for case in test.cases() {
        case.act_blocking().unwrap();
        assert!(
            case.assertions()[0].invoke().is_ok(),
            "F017 FALSIFIED: outcome of {:?} misclassified",
            case.description()
        );
    }
}

/// F018: then_fails_with accepts only the named error type
#[test]
fn f018_fails_with_checks_type() {
    let matching = Scenario::new()
        .given(|| 5_u32)
        .try_when(|balance| withdraw(*balance, 9))
        .then_fails_with::<Overdrawn>()
        .and("reports the shortfall", |_balance, err| {
            err.downcast_ref::<Overdrawn>().map(|o| o.missing) == Some(4)
        })
        .build();
    matching.arrange_blocking(ctx()).unwrap();
    let case = &matching.cases()[0];
    case.act_blocking().unwrap();
    for assertion in case.assertions() {
        assert!(assertion.invoke().is_ok(), "F018 FALSIFIED: matching error rejected");
    }

    let mismatched = Scenario::new()
        .try_when(|| -> Result<u32, std::io::Error> { Err(std::io::Error::other("disk")) })
        .then_fails_with::<Overdrawn>()
        .build();
    mismatched.arrange_blocking(ctx()).unwrap();
    let case = &mismatched.cases()[0];
    case.act_blocking().unwrap();
    let err = case.assertions()[0].invoke().unwrap_err();
    assert!(
        err.is_assertion_failure(),
        "F018 FALSIFIED: wrong error type accepted"
    );
}

/// F019: then_returns fails its default assertion when the action fails
#[test]
fn f019_returns_expectation_detects_failure() {
    let test = Scenario::new()
        .try_when(|| withdraw(1, 2))
        .then_returns()
        .build();
    test.arrange_blocking(ctx()).unwrap();
    let case = &test.cases()[0];
    case.act_blocking().unwrap();

    let err = case.assertions()[0].invoke().unwrap_err();
    assert!(err.is_assertion_failure());
    assert!(
        err.to_string().contains("overdrawn by 1"),
        "F019 FALSIFIED: failure message lost the action error: {err}"
    );
}

/// F020: Async actions are captured like synchronous ones
#[tokio::test]
async fn f020_async_action_captured() {
    let test = Scenario::new()
        .given_each_of(|| vec![3_u32, 30])
        .try_when_async(|amount| async move {
            tokio::task::yield_now().await;
            withdraw(10, amount)
        })
        .then("classifies by amount", |amount, outcome| {
            if *amount <= 10 {
                outcome.value() == Some(&(10 - amount))
            } else {
                outcome.error().is_some_and(|e| e.is::<Overdrawn>())
            }
        })
        .build();
    test.arrange(ctx()).await.unwrap();

    for case in test.cases() {
        case.act().await.unwrap();
        assert!(
            case.assertions()[0].invoke().is_ok(),
            "F020 FALSIFIED: async outcome misclassified for {:?}",
            case.description()
        );
    }
}
