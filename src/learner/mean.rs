use serde::{Serialize, Deserialize};

use super::core::{Capabilities, FittedLearner, Learner};
use crate::common::helpers;
use crate::error::Result;
use crate::task::Task;


/// A learner that predicts the (weighted) mean of the outcome.
/// This is the usual baseline of a stack.
#[derive(Debug, Clone)]
pub struct MeanLearner {
    name: String,
}


impl MeanLearner {
    /// Construct a new instance of [`MeanLearner`].
    pub fn new() -> Self {
        Self { name: "mean".to_string() }
    }


    /// Set the name of this learner.
    pub fn label<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }
}


impl Default for MeanLearner {
    fn default() -> Self {
        Self::new()
    }
}


impl Learner for MeanLearner {
    fn name(&self) -> &str {
        &self.name
    }


    fn capabilities(&self) -> Capabilities {
        Capabilities {
            continuous: true,
            binary: true,
            categorical: false,
            weights: true,
            offset: false,
        }
    }


    fn train(&self, task: &Task) -> Result<Box<dyn FittedLearner>> {
        self.capabilities().check(&self.name, task)?;
        let mean = helpers::weighted_mean(&task.outcome(), &task.weights());
        let fitted = FittedMean { name: self.name.clone(), mean, };
        Ok(Box::new(fitted))
    }
}


/// Fitted [`MeanLearner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedMean {
    name: String,
    mean: f64,
}


impl FittedMean {
    /// Returns the fitted mean.
    pub fn mean(&self) -> f64 {
        self.mean
    }
}


impl FittedLearner for FittedMean {
    fn name(&self) -> &str {
        &self.name
    }


    fn predict(&self, task: &Task) -> Result<Vec<f64>> {
        Ok(vec![self.mean; task.n_rows()])
    }


    fn coefficients(&self) -> Option<Vec<(String, f64)>> {
        Some(vec![("(intercept)".to_string(), self.mean)])
    }
}
