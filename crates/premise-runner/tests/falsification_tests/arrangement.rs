//! Falsification Tests: Category A - Arrangement (F001-F010)
//!
//! # Toyota Way: Jidoka
//! A test that cannot be set up must stop before anything runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use premise_core::{BufferedContext, Scenario, SharedContext, TestError};
use proptest::prelude::*;

fn ctx() -> SharedContext {
    BufferedContext::new().shared()
}

// =============================================================================
// F001-F004: Cross Product Cardinality and Ordering
// =============================================================================

/// F001: A test without prerequisites arranges to exactly one case
#[test]
fn f001_zero_prerequisites_yield_one_case() {
    let test = Scenario::new().when(|| 42).then_returns().build();
    test.arrange_blocking(ctx()).unwrap();

    assert_eq!(
        test.cases().len(),
        1,
        "F001 FALSIFIED: expected exactly one case without prerequisites"
    );
    assert!(
        test.cases()[0].description().is_none(),
        "F001 FALSIFIED: a lone case must not carry a description"
    );
}

/// F002: Case ordering is row-major with the last prerequisite varying fastest
#[test]
fn f002_cases_are_row_major() {
    let test = Scenario::new()
        .given_each_of(|| vec![1, 2, 3])
        .and_each_of(|| vec!["a", "b"])
        .when(|n, s| format!("{n}{s}"))
        .then_returns()
        .build();
    test.arrange_blocking(ctx()).unwrap();

    let descriptions: Vec<_> = test
        .cases()
        .iter()
        .map(|case| case.description().unwrap().to_string())
        .collect();
    assert_eq!(
        descriptions,
        vec![
            "(1, \"a\")",
            "(1, \"b\")",
            "(2, \"a\")",
            "(2, \"b\")",
            "(3, \"a\")",
            "(3, \"b\")",
        ],
        "F002 FALSIFIED: cases are not in row-major order"
    );
}

/// F003: Re-arranging identical builders yields the same case sequence
#[test]
fn f003_arrangement_is_deterministic() {
    let chain = Scenario::new()
        .given_each_of(|| vec![3, 1, 2])
        .and_each_of(|| vec![true, false])
        .when(|n, b| (*n, *b))
        .then_returns();

    let first = chain.clone().build();
    let second = chain.build();
    first.arrange_blocking(ctx()).unwrap();
    second.arrange_blocking(ctx()).unwrap();

    let left: Vec<_> = first.cases().iter().map(|c| c.description()).collect();
    let right: Vec<_> = second.cases().iter().map(|c| c.description()).collect();
    assert_eq!(left, right, "F003 FALSIFIED: identical inputs arranged differently");
}

proptest! {
    /// F004: Case count equals the product of prerequisite cardinalities
    #[test]
    fn f004_case_count_is_product(a in 1usize..6, b in 1usize..6, c in 1usize..6) {
        let test = Scenario::new()
            .given_each_of(move || 0..a)
            .and_each_of(move || 0..b)
            .and_each_of(move || 0..c)
            .when(|x, y, z| x + y + z)
            .then_returns()
            .build();
        test.arrange_blocking(ctx()).unwrap();

        prop_assert_eq!(
            test.cases().len(),
            a * b * c,
            "F004 FALSIFIED: case count is not the product of cardinalities"
        );
    }
}

// =============================================================================
// F005-F007: Producer Evaluation
// =============================================================================

/// F005: Each producer is evaluated once per arrangement, not once per case
#[test]
fn f005_producers_evaluated_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let test = Scenario::new()
        .given_each_of(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![1, 2, 3]
        })
        .and_each_of(|| vec![10, 20])
        .when(|a, b| a + b)
        .then_returns()
        .build();
    test.arrange_blocking(ctx()).unwrap();

    assert_eq!(test.cases().len(), 6);
    assert_eq!(
        calls.load(Ordering::SeqCst),
        1,
        "F005 FALSIFIED: producer evaluated more than once"
    );
}

/// F006: Async prerequisites and the test context take part in the product
#[tokio::test]
async fn f006_async_and_context_prerequisites() {
    let buffered = Arc::new(BufferedContext::new());
    let shared: SharedContext = buffered.clone();

    let test = Scenario::new()
        .given_async(|| async { 7 })
        .and_each_of(|| vec![1, 2])
        .and_test_context()
        .when(|a, b, ctx| {
            ctx.write_output(&format!("{a}+{b}"));
            a + b
        })
        .then_returns()
        .build();
    test.arrange(shared).await.unwrap();
    for case in test.cases() {
        case.act().await.unwrap();
    }

    assert_eq!(
        buffered.output(),
        vec!["7+1", "7+2"],
        "F006 FALSIFIED: async or context prerequisite not delivered to the action"
    );
}

/// F007: A prerequisite producing nothing is an arrangement failure
#[test]
fn f007_empty_prerequisite_fails_arrangement() {
    let test = Scenario::new()
        .given(|| 1_i32)
        .and_each_of(Vec::<u8>::new)
        .when(|a, b| a + i32::from(*b))
        .then_returns()
        .build();

    let err = test.arrange_blocking(ctx()).unwrap_err();
    assert!(
        matches!(err, TestError::EmptyPrerequisite { index: 2 }),
        "F007 FALSIFIED: expected EmptyPrerequisite at position 2, got {err:?}"
    );
    assert!(test.cases().is_empty());
}

// =============================================================================
// F008-F010: Arrangement State Machine
// =============================================================================

/// F008: A failing producer surfaces its error and leaves no cases
#[test]
fn f008_failing_producer_surfaces_error() {
    let test = Scenario::new()
        .try_given(|| -> Result<String, std::io::Error> {
            Err(std::io::Error::other("database unreachable"))
        })
        .when(|s| s.len())
        .then_returns()
        .build();

    let err = test.arrange_blocking(ctx()).unwrap_err();
    assert!(
        matches!(err, TestError::Arrangement(_)),
        "F008 FALSIFIED: expected an arrangement error, got {err:?}"
    );
    assert!(err.to_string().contains("database unreachable"));
    assert!(test.cases().is_empty());
}

/// F009: A second arrange is rejected as a usage error
#[test]
fn f009_double_arrange_rejected() {
    let test = Scenario::new().when(|| ()).then_returns().build();
    test.arrange_blocking(ctx()).unwrap();

    let err = test.arrange_blocking(ctx()).unwrap_err();
    assert!(
        matches!(err, TestError::AlreadyArranged),
        "F009 FALSIFIED: second arrange was not rejected"
    );
    assert!(err.is_usage());
    assert_eq!(test.cases().len(), 1, "F009 FALSIFIED: rejected arrange changed the cases");
}

/// F010: Arranging after a failed arrangement is still rejected
#[test]
fn f010_arrange_after_failure_rejected() {
    let test = Scenario::new()
        .given_each_of(Vec::<i32>::new)
        .when(|x| *x)
        .then_returns()
        .build();

    assert!(test.arrange_blocking(ctx()).is_err());
    let err = test.arrange_blocking(ctx()).unwrap_err();
    assert!(
        matches!(err, TestError::AlreadyArranged),
        "F010 FALSIFIED: a failed test could be arranged again"
    );
}
