//! Result naming strategies.
//!
//! A strategy decides the display label of one assertion result, given how
//! many cases the test has and how many assertions the case has. A `None`
//! label leaves the fallback (typically the test's own name) to the host.

use std::fmt;
use std::sync::Arc;

/// Inputs for labelling one assertion result.
#[derive(Debug, Clone, Copy)]
pub struct LabelRequest<'a> {
    /// Number of cases in the test.
    pub case_count: usize,
    /// Number of assertions in the case.
    pub assertion_count: usize,
    /// Description of the case, if any.
    pub case: Option<&'a str>,
    /// Description of the assertion, if any.
    pub assertion: Option<&'a str>,
}

/// Pluggable labelling policy for assertion results.
pub trait ResultNamingStrategy: Send + Sync + fmt::Debug {
    /// Name the strategy is registered under.
    fn name(&self) -> &'static str;

    /// Returns the label for one assertion result.
    fn label(&self, request: &LabelRequest<'_>) -> Option<String>;
}

/// Labels only where case or assertion multiplicity requires disambiguation.
///
/// | cases | assertions | label                          |
/// |-------|------------|--------------------------------|
/// | > 1   | > 1        | `<assertion> for <case>`       |
/// | > 1   | 1          | `<case>`                       |
/// | 1     | > 1        | `<assertion>`                  |
/// | 1     | 1          | none                           |
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultNaming;

impl ResultNamingStrategy for DefaultNaming {
    fn name(&self) -> &'static str {
        "default"
    }

    fn label(&self, request: &LabelRequest<'_>) -> Option<String> {
        let multiple_cases = request.case_count > 1;
        let multiple_assertions = request.assertion_count > 1;
        match (multiple_cases, multiple_assertions) {
            (true, true) => join(request.assertion, request.case),
            (true, false) => request.case.map(str::to_string),
            (false, true) => request.assertion.map(str::to_string),
            (false, false) => None,
        }
    }
}

/// Always labels with every description available.
#[derive(Debug, Default, Clone, Copy)]
pub struct VerboseNaming;

impl ResultNamingStrategy for VerboseNaming {
    fn name(&self) -> &'static str {
        "verbose"
    }

    fn label(&self, request: &LabelRequest<'_>) -> Option<String> {
        join(request.assertion, request.case)
    }
}

fn join(assertion: Option<&str>, case: Option<&str>) -> Option<String> {
    match (assertion, case) {
        (Some(assertion), Some(case)) => Some(format!("{assertion} for {case}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}

/// Looks up a built-in strategy by name.
#[must_use]
pub fn strategy_by_name(name: &str) -> Option<Arc<dyn ResultNamingStrategy>> {
    match name {
        "default" => Some(Arc::new(DefaultNaming)),
        "verbose" => Some(Arc::new(VerboseNaming)),
        _ => None,
    }
}
