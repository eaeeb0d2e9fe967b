//! Falsification Tests: Category C - Configuration Overrides (F021-F030)
//!
//! # Toyota Way: Standardized Work
//! Every test resolves its configuration from the same defaults, and only its
//! own chain of overrides changes the result.

use std::io::Write;
use std::sync::Arc;

use premise_core::{
    ArrangementFailurePolicy, Cancellation, ConfigChain, Configuration, Scenario, VerboseNaming,
};
use premise_runner::{RunSettings, RunnerError, TestOutcome, TestRunner, TestStatus};

fn broken_chain() -> premise_core::Given1<u8> {
    Scenario::new().try_given(|| -> Result<u8, std::io::Error> {
        Err(std::io::Error::other("fixture unavailable"))
    })
}

// =============================================================================
// F021-F024: Override Chain Resolution
// =============================================================================

/// F021: Later overrides of the same option win within one chain
#[test]
fn f021_later_override_wins() {
    let test = Scenario::new()
        .using_configuration(|c| c.arrangement_failure = ArrangementFailurePolicy::Failed)
        .given(|| 1)
        .using_configuration(|c| c.arrangement_failure = ArrangementFailurePolicy::Skipped)
        .when(|x| *x)
        .then_returns()
        .build();

    let resolved = test.configuration(&Configuration::default());
    assert_eq!(
        resolved.arrangement_failure,
        ArrangementFailurePolicy::Skipped,
        "F021 FALSIFIED: an earlier override beat a later one"
    );
}

/// F022: Forked builders do not leak later overrides into each other
#[test]
fn f022_forks_do_not_leak() {
    let a = Scenario::new()
        .using_configuration(|c| c.arrangement_failure = ArrangementFailurePolicy::Failed)
        .given(|| 1);

    let b = a.clone().when(|x| *x).then_returns().build();
    let c = a
        .using_configuration(|c| c.arrangement_failure = ArrangementFailurePolicy::Skipped)
        .when(|x| *x)
        .then_returns()
        .build();

    let defaults = Configuration::default();
    assert_eq!(
        b.configuration(&defaults).arrangement_failure,
        ArrangementFailurePolicy::Failed,
        "F022 FALSIFIED: fork B observed fork C's override"
    );
    assert_eq!(
        c.configuration(&defaults).arrangement_failure,
        ArrangementFailurePolicy::Skipped,
        "F022 FALSIFIED: fork C lost its own override"
    );
}

/// F023: An empty chain resolves to the defaults unchanged
#[test]
fn f023_empty_chain_is_identity() {
    let defaults = Configuration::default()
        .with_arrangement_failure(ArrangementFailurePolicy::Failed)
        .with_result_naming(Arc::new(VerboseNaming));
    let resolved = ConfigChain::new().resolve(&defaults);

    assert_eq!(resolved.arrangement_failure, ArrangementFailurePolicy::Failed);
    assert_eq!(
        resolved.result_naming.name(),
        "verbose",
        "F023 FALSIFIED: empty chain changed the defaults"
    );
}

/// F024: Overrides registered after the action apply to the built test
#[test]
fn f024_overrides_on_every_step() {
    let test = Scenario::new()
        .when(|| ())
        .using_configuration(|c| c.result_naming = Arc::new(VerboseNaming))
        .then_returns()
        .using_configuration(|c| c.arrangement_failure = ArrangementFailurePolicy::Failed)
        .build();

    let resolved = test.configuration(&Configuration::default());
    assert_eq!(resolved.result_naming.name(), "verbose");
    assert_eq!(
        resolved.arrangement_failure,
        ArrangementFailurePolicy::Failed,
        "F024 FALSIFIED: override on the final step was dropped"
    );
}

// =============================================================================
// F025-F027: Arrangement Failure Policy
// =============================================================================

/// F025: By default an arrangement failure is reported as skipped
#[tokio::test]
async fn f025_default_policy_skips() {
    let test = broken_chain().when(|x| *x).then_returns().build();
    let report = TestRunner::default()
        .run_test("broken", &test, Cancellation::never())
        .await
        .unwrap();

    assert_eq!(report.outcome, TestOutcome::ArrangementFailed);
    assert_eq!(
        report.status,
        TestStatus::Skipped,
        "F025 FALSIFIED: default policy did not skip"
    );
}

/// F026: A per-test override turns an arrangement failure into a failure
#[tokio::test]
async fn f026_per_test_policy_fails() {
    let test = broken_chain()
        .using_configuration(|c| c.arrangement_failure = ArrangementFailurePolicy::Failed)
        .when(|x| *x)
        .then_returns()
        .build();
    let report = TestRunner::default()
        .run_test("broken", &test, Cancellation::never())
        .await
        .unwrap();

    assert_eq!(
        report.status,
        TestStatus::Failed,
        "F026 FALSIFIED: per-test override ignored"
    );
}

/// F027: Per-test overrides win over run settings
#[tokio::test]
async fn f027_test_override_beats_settings() {
    let settings = RunSettings {
        arrangement_failure: ArrangementFailurePolicy::Failed,
        ..RunSettings::default()
    };
    let test = broken_chain()
        .using_configuration(|c| c.arrangement_failure = ArrangementFailurePolicy::Skipped)
        .when(|x| *x)
        .then_returns()
        .build();
    let report = TestRunner::new(settings)
        .unwrap()
        .run_test("broken", &test, Cancellation::never())
        .await
        .unwrap();

    assert_eq!(
        report.status,
        TestStatus::Skipped,
        "F027 FALSIFIED: run settings overrode the test's own configuration"
    );
}

// =============================================================================
// F028-F030: Run Settings
// =============================================================================

/// F028: Settings load from a TOML file
#[test]
fn f028_settings_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "parallel = true\nmax_concurrency = 3\narrangement_failure = \"failed\"\nresult_naming = \"verbose\""
    )
    .unwrap();

    let settings = RunSettings::load(file.path()).unwrap();
    assert!(settings.parallel);
    assert_eq!(settings.max_concurrency, 3);
    assert_eq!(settings.arrangement_failure, ArrangementFailurePolicy::Failed);

    let defaults = settings.defaults().unwrap();
    assert_eq!(
        defaults.result_naming.name(),
        "verbose",
        "F028 FALSIFIED: naming strategy not resolved from settings"
    );
}

/// F029: Unknown naming strategies are rejected at load time
#[test]
fn f029_unknown_strategy_rejected() {
    let result = RunSettings::from_toml_str("result_naming = \"poetic\"");
    assert!(
        matches!(result, Err(RunnerError::Settings(_))),
        "F029 FALSIFIED: unknown strategy accepted"
    );
}

/// F030: A zero concurrency bound is rejected
#[test]
fn f030_zero_concurrency_rejected() {
    let result = RunSettings::from_toml_str("parallel = true\nmax_concurrency = 0");
    assert!(result.is_err(), "F030 FALSIFIED: zero concurrency accepted");
    assert!(TestRunner::new(RunSettings::parallel(0)).is_err());
}
