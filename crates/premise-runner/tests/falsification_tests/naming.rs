//! Falsification Tests: Category E - Result Naming (F046-F055)
//!
//! # Toyota Way: Visual Management
//! A result label says exactly as much as is needed to tell it apart.

use std::sync::Arc;

use premise_core::{
    Cancellation, DefaultNaming, LabelRequest, ResultNamingStrategy, Scenario, Test, VerboseNaming,
    strategy_by_name,
};
use premise_runner::{RunSettings, TestReport, TestRunner};

async fn run(name: &str, test: &Test) -> TestReport {
    TestRunner::default()
        .run_test(name, test, Cancellation::never())
        .await
        .unwrap()
}

fn labels(report: &TestReport) -> Vec<Option<String>> {
    report.assertions.iter().map(|r| r.label.clone()).collect()
}

// =============================================================================
// F046-F049: Default Truth Table
// =============================================================================

/// F046: Several cases and several assertions combine both descriptions
#[tokio::test]
async fn f046_cases_and_assertions_combined() {
    let test = Scenario::new()
        .given_each_of(|| vec!['a', 'b'])
        .when(|c| c.is_alphabetic())
        .then_returns()
        .and("is a letter", |_c, letter| *letter)
        .build();

    let report = run("letters", &test).await;
    assert_eq!(
        labels(&report),
        vec![
            Some("returns a value for 'a'".to_string()),
            Some("is a letter for 'a'".to_string()),
            Some("returns a value for 'b'".to_string()),
            Some("is a letter for 'b'".to_string()),
        ],
        "F046 FALSIFIED: labels did not combine assertion and case"
    );
}

/// F047: Several cases with one assertion use the case description alone
#[tokio::test]
async fn f047_cases_only() {
    let test = Scenario::new()
        .given_each_of(|| vec![1, 2])
        .and(|| "x")
        .when(|n, s| s.repeat(*n))
        .then("repeats", |n, _s, out| out.value().map(String::len) == Some(*n))
        .build();

    let report = run("repeat", &test).await;
    assert_eq!(
        labels(&report),
        vec![Some("(1, \"x\")".to_string()), Some("(2, \"x\")".to_string())],
        "F047 FALSIFIED: single-assertion labels are not the case description"
    );
}

/// F048: One case with several assertions uses the assertion description alone
#[tokio::test]
async fn f048_assertions_only() {
    let test = Scenario::new()
        .given(|| 4)
        .when(|x| x * x)
        .then_returns()
        .and("is sixteen", |_x, v| *v == 16)
        .build();

    let report = run("square", &test).await;
    assert_eq!(
        labels(&report),
        vec![
            Some("returns a value".to_string()),
            Some("is sixteen".to_string())
        ],
        "F048 FALSIFIED: single-case labels carry a case description"
    );
}

/// F049: One case with one assertion has no label; the host falls back to the test name
#[tokio::test]
async fn f049_no_label_needed() {
    let test = Scenario::new().when(|| 1).then_returns().build();

    let report = run("plain", &test).await;
    assert_eq!(labels(&report), vec![None], "F049 FALSIFIED: unneeded label produced");
    assert_eq!(report.assertions[0].display_name("plain"), "plain");
}

// =============================================================================
// F050-F055: Strategies and Ordering
// =============================================================================

/// F050: Declared order is kept and duplicate descriptions are not collapsed
#[tokio::test]
async fn f050_declared_order_kept() {
    let test = Scenario::new()
        .when(|| 10)
        .then_returns()
        .and("bounded", |v| *v < 100)
        .and("bounded", |v| *v > 0)
        .build();

    let report = run("duplicates", &test).await;
    assert_eq!(
        labels(&report),
        vec![
            Some("returns a value".to_string()),
            Some("bounded".to_string()),
            Some("bounded".to_string()),
        ],
        "F050 FALSIFIED: assertion order or multiplicity changed"
    );
}

/// F051: The verbose strategy labels even a lone assertion
#[tokio::test]
async fn f051_verbose_per_test() {
    let test = Scenario::new()
        .when(|| 1)
        .then_returns()
        .using_configuration(|c| c.result_naming = Arc::new(VerboseNaming))
        .build();

    let report = run("verbose", &test).await;
    assert_eq!(
        labels(&report),
        vec![Some("returns a value".to_string())],
        "F051 FALSIFIED: verbose strategy left the result unlabelled"
    );
}

/// F052: The naming strategy can be chosen through run settings
#[tokio::test]
async fn f052_verbose_from_settings() {
    let settings = RunSettings {
        result_naming: "verbose".to_string(),
        ..RunSettings::default()
    };
    let test = Scenario::new().when(|| 1).then_returns().build();
    let report = TestRunner::new(settings)
        .unwrap()
        .run_test("settings", &test, Cancellation::never())
        .await
        .unwrap();

    assert_eq!(
        labels(&report),
        vec![Some("returns a value".to_string())],
        "F052 FALSIFIED: run settings did not select the strategy"
    );
}

#[derive(Debug)]
struct Numbered;

impl ResultNamingStrategy for Numbered {
    fn name(&self) -> &'static str {
        "numbered"
    }

    fn label(&self, request: &LabelRequest<'_>) -> Option<String> {
        Some(format!(
            "{}/{}",
            request.case.unwrap_or("-"),
            request.assertion.unwrap_or("-")
        ))
    }
}

/// F053: Custom strategies receive the case and assertion descriptions
#[tokio::test]
async fn f053_custom_strategy() {
    let test = Scenario::new()
        .given_each_of(|| vec![1, 2])
        .when(|x| *x)
        .then_returns()
        .using_configuration(|c| c.result_naming = Arc::new(Numbered))
        .build();

    let report = run("custom", &test).await;
    assert_eq!(
        labels(&report),
        vec![
            Some("1/returns a value".to_string()),
            Some("2/returns a value".to_string()),
        ],
        "F053 FALSIFIED: custom strategy bypassed"
    );
}

/// F054: Built-in strategies are found by name and unknown names are not
#[test]
fn f054_strategy_lookup() {
    assert_eq!(strategy_by_name("default").unwrap().name(), "default");
    assert_eq!(strategy_by_name("verbose").unwrap().name(), "verbose");
    assert!(
        strategy_by_name("shouting").is_none(),
        "F054 FALSIFIED: unknown strategy resolved"
    );
}

/// F055: The default truth table holds for every multiplicity combination
#[test]
fn f055_truth_table() {
    let cases = [
        (2, 2, Some("check for row")),
        (2, 1, Some("row")),
        (1, 2, Some("check")),
        (1, 1, None),
    ];
    for (case_count, assertion_count, expected) in cases {
        let label = DefaultNaming.label(&LabelRequest {
            case_count,
            assertion_count,
            case: Some("row"),
            assertion: Some("check"),
        });
        assert_eq!(
            label.as_deref(),
            expected,
            "F055 FALSIFIED: cases={case_count} assertions={assertion_count}"
        );
    }
}
