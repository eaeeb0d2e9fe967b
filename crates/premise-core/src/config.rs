//! Per-test configuration and the override chain.
//!
//! Overrides are registered on builder steps and replayed lazily. The chain
//! is a persistent list: every builder node points at its parent, so two
//! builders forked from a common prefix never observe each other's later
//! overrides.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::naming::{DefaultNaming, ResultNamingStrategy};

/// How a test whose arrangement failed is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrangementFailurePolicy {
    /// Report the test as failed.
    Failed,
    /// Report the test as skipped.
    #[default]
    Skipped,
}

impl fmt::Display for ArrangementFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Effective configuration of one test.
#[derive(Clone)]
pub struct Configuration {
    /// Reporting policy for arrangement failures.
    pub arrangement_failure: ArrangementFailurePolicy,
    /// Labelling policy for assertion results.
    pub result_naming: Arc<dyn ResultNamingStrategy>,
}

impl Configuration {
    /// Sets the arrangement failure policy.
    #[must_use]
    pub const fn with_arrangement_failure(mut self, policy: ArrangementFailurePolicy) -> Self {
        self.arrangement_failure = policy;
        self
    }

    /// Sets the result naming strategy.
    #[must_use]
    pub fn with_result_naming(mut self, strategy: Arc<dyn ResultNamingStrategy>) -> Self {
        self.result_naming = strategy;
        self
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            arrangement_failure: ArrangementFailurePolicy::default(),
            result_naming: Arc::new(DefaultNaming),
        }
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("arrangement_failure", &self.arrangement_failure)
            .field("result_naming", &self.result_naming.name())
            .finish()
    }
}

type Mutation = Arc<dyn Fn(&mut Configuration) + Send + Sync>;

struct Override {
    parent: Option<Arc<Override>>,
    apply: Mutation,
}

/// Persistent list of deferred configuration mutations.
#[derive(Clone, Default)]
pub struct ConfigChain {
    head: Option<Arc<Override>>,
    len: usize,
}

impl ConfigChain {
    /// Creates an empty chain.
    #[must_use]
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    /// Returns a chain with `mutation` appended. `self` is unchanged.
    #[must_use]
    pub fn with<F>(&self, mutation: F) -> Self
    where
        F: Fn(&mut Configuration) + Send + Sync + 'static,
    {
        Self {
            head: Some(Arc::new(Override {
                parent: self.head.clone(),
                apply: Arc::new(mutation),
            })),
            len: self.len + 1,
        }
    }

    /// Number of registered mutations.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no mutation is registered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Applies every mutation, in declaration order, to a copy of `defaults`.
    #[must_use]
    pub fn resolve(&self, defaults: &Configuration) -> Configuration {
        let mut path = Vec::with_capacity(self.len);
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            path.push(&current.apply);
            node = current.parent.as_deref();
        }

        let mut config = defaults.clone();
        for apply in path.into_iter().rev() {
            apply(&mut config);
        }
        config
    }
}

impl fmt::Debug for ConfigChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigChain").field("len", &self.len).finish()
    }
}
