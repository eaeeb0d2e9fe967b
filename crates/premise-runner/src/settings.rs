//! Run settings.
//!
//! Process-wide defaults for a run, loadable from TOML and validated at load
//! time. Per-test overrides declared on builders are applied on top.
//!
//! ```toml
//! parallel = true
//! max_concurrency = 8
//! arrangement_failure = "failed"
//! result_naming = "verbose"
//! ```

use std::path::Path;

use premise_core::{ArrangementFailurePolicy, Configuration, strategy_by_name};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RunnerError};

/// Settings of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Run independent tests concurrently.
    #[serde(default)]
    pub parallel: bool,

    /// Upper bound on concurrently running tests in parallel mode.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Default reporting policy for arrangement failures.
    #[serde(default)]
    pub arrangement_failure: ArrangementFailurePolicy,

    /// Name of the default result naming strategy.
    #[serde(default = "default_result_naming")]
    pub result_naming: String,
}

fn default_max_concurrency() -> usize {
    4
}

fn default_result_naming() -> String {
    "default".to_string()
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            parallel: false,
            max_concurrency: default_max_concurrency(),
            arrangement_failure: ArrangementFailurePolicy::default(),
            result_naming: default_result_naming(),
        }
    }
}

impl RunSettings {
    /// Settings for a parallel run with the given concurrency bound.
    #[must_use]
    pub fn parallel(max_concurrency: usize) -> Self {
        Self {
            parallel: true,
            max_concurrency,
            ..Self::default()
        }
    }

    /// Validates the settings.
    ///
    /// # Errors
    /// Returns an error if a value is out of range or a name is unknown.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(RunnerError::settings("max_concurrency must be greater than 0"));
        }
        if strategy_by_name(&self.result_naming).is_none() {
            return Err(RunnerError::settings(format!(
                "unknown result naming strategy: {}",
                self.result_naming
            )));
        }
        Ok(())
    }

    /// Parses and validates settings from TOML text.
    ///
    /// # Errors
    /// Returns an error if the text cannot be parsed or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)
            .map_err(|e| RunnerError::settings(format!("failed to parse settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| RunnerError::settings(format!("failed to read settings: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// The default configuration every test's overrides are applied to.
    ///
    /// # Errors
    /// Returns an error if the naming strategy is unknown.
    pub fn defaults(&self) -> Result<Configuration> {
        let naming = strategy_by_name(&self.result_naming).ok_or_else(|| {
            RunnerError::settings(format!(
                "unknown result naming strategy: {}",
                self.result_naming
            ))
        })?;
        Ok(Configuration::default()
            .with_arrangement_failure(self.arrangement_failure)
            .with_result_naming(naming))
    }
}
