use serde::{Serialize, Deserialize};

use crate::common::checker;
use crate::error::{Result, SuperLearnerError};
use crate::learner::{core, FittedLearner, PredictionMatrix};
use crate::task::Task;


/// A convex combination of the constituents of a stack.
/// You can read/write this struct by `Serde` trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedCombination {
    name: String,
    learners: Vec<String>,
    weights: Vec<f64>,
}


impl FittedCombination {
    pub(crate) fn new(name: String, learners: Vec<String>, weights: Vec<f64>)
        -> Result<Self>
    {
        if learners.len() != weights.len() || !checker::simplex_condition(&weights) {
            return Err(SuperLearnerError::training(
                name,
                format!("the weights {weights:?} are not a convex combination"),
            ));
        }
        Ok(Self { name, learners, weights, })
    }


    /// Returns the names of the combined learners.
    pub fn learners(&self) -> &[String] {
        &self.learners[..]
    }


    /// Returns the weight on each learner.
    /// The weights are non-negative and sum up to `1`.
    pub fn weights(&self) -> &[f64] {
        &self.weights[..]
    }


    /// Returns the weight on the learner named `name`.
    pub fn weight_of(&self, name: &str) -> Option<f64> {
        self.learners.iter()
            .position(|l| l == name)
            .map(|k| self.weights[k])
    }


    /// Combine the columns of `matrix`.
    /// The columns must be in the order of [`FittedCombination::learners`].
    pub fn combine(&self, matrix: &PredictionMatrix) -> Vec<f64> {
        matrix.combine(&self.weights)
    }
}


impl FittedLearner for FittedCombination {
    fn name(&self) -> &str {
        &self.name
    }


    fn predict(&self, task: &Task) -> Result<Vec<f64>> {
        let columns = core::resolve_covariates(&self.name, task, &self.learners)?;
        let mut predictions = vec![0f64; task.n_rows()];
        for (&j, &w) in columns.iter().zip(&self.weights) {
            if w == 0f64 { continue; }
            predictions.iter_mut()
                .zip(task.column_values(j))
                .for_each(|(p, z)| { *p += w * z; });
        }
        Ok(predictions)
    }


    fn coefficients(&self) -> Option<Vec<(String, f64)>> {
        let coefficients = self.learners.iter()
            .cloned()
            .zip(self.weights.iter().copied())
            .collect();
        Some(coefficients)
    }
}
