//! JSON configuration of a [`SuperLearner`].
use serde::{Serialize, Deserialize};

use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, SuperLearnerError};
use crate::learner::{make_learner, LearnerSpec, Stack};
use crate::loss::Loss;
use crate::metalearner::MetalearnerKind;
use crate::super_learner::SuperLearner;


/// The configuration of a [`SuperLearner`].
///
/// # Example
/// ```
/// use superlearner::prelude::*;
///
/// let config = SuperLearnerConfig::from_json(r#"{
///     "learners": [
///         { "name": "mean" },
///         { "name": "linear", "params": { "lambda": 0.1 } },
///         { "name": "tree", "params": { "max_depth": 2 } }
///     ],
///     "metalearner": "convex",
///     "loss": "squared_error",
///     "timeout_ms": 60000
/// }"#).unwrap();
/// let super_learner = config.build().unwrap();
/// assert_eq!(super_learner.stack().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuperLearnerConfig {
    /// The learners of the stack.
    pub learners: Vec<LearnerSpec>,
    /// The metalearner.
    #[serde(default)]
    pub metalearner: MetalearnerKind,
    /// The loss. If absent, it is chosen by the outcome type.
    #[serde(default)]
    pub loss: Option<Loss>,
    /// Time limit of each learner's training, in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Drop the learners that fail instead of failing the fit.
    #[serde(default)]
    pub drop_failed_learners: bool,
    /// Process the folds and the learners in parallel.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Print the settings and the progress.
    #[serde(default)]
    pub verbose: bool,
}


fn default_parallel() -> bool {
    true
}


impl SuperLearnerConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }


    /// Read a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }


    /// Serialize this configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }


    /// Build the super learner.
    pub fn build(&self) -> Result<SuperLearner> {
        if self.learners.is_empty() {
            return Err(SuperLearnerError::config(
                "the configuration has no learner"
            ));
        }
        let learners = self.learners.iter()
            .map(make_learner)
            .collect::<Result<Vec<_>>>()?;

        let mut super_learner = SuperLearner::new(Stack::new(learners))
            .metalearner(self.metalearner)
            .drop_failed_learners(self.drop_failed_learners)
            .parallel(self.parallel)
            .verbose(self.verbose);
        if let Some(loss) = self.loss {
            super_learner = super_learner.loss(loss);
        }
        if let Some(millis) = self.timeout_ms {
            super_learner = super_learner.timeout(Duration::from_millis(millis));
        }
        Ok(super_learner)
    }
}
