use serde::{Serialize, Deserialize};

use super::core::{self, Capabilities, FittedLearner, Learner};
use super::design;
use crate::common::linalg::SquareMatrix;
use crate::error::{Result, SuperLearnerError};
use crate::task::Task;


/// Least squares regression with an intercept
/// and an optional ridge penalty `lambda * ||beta||^2`
/// (the intercept is not penalized).
///
/// Observation weights and an offset are supported:
/// the learner minimizes
/// ```txt
/// sum_i w_i (y_i - offset_i - x_i^T beta)^2 + lambda * ||beta||^2.
/// ```
///
/// # Example
/// ```no_run
/// use superlearner::prelude::*;
///
/// let learner = LinearRegression::new()
///     .lambda(0.1);
/// ```
#[derive(Debug, Clone)]
pub struct LinearRegression {
    name: String,
    lambda: f64,
}


impl LinearRegression {
    /// Construct a new instance of [`LinearRegression`] without penalty.
    pub fn new() -> Self {
        Self { name: "linear".to_string(), lambda: 0f64, }
    }


    /// Set the name of this learner.
    pub fn label<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }


    /// Set the ridge penalty. Default is `0`.
    pub fn lambda(mut self, lambda: f64) -> Self {
        assert!(lambda >= 0f64, "the ridge penalty must be non-negative");
        self.lambda = lambda;
        self
    }
}


impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}


impl Learner for LinearRegression {
    fn name(&self) -> &str {
        &self.name
    }


    fn info(&self) -> Option<Vec<(&str, String)>> {
        Some(vec![("Ridge penalty", format!("{}", self.lambda))])
    }


    fn capabilities(&self) -> Capabilities {
        Capabilities {
            continuous: true,
            binary: false,
            categorical: false,
            weights: true,
            offset: true,
        }
    }


    fn train(&self, task: &Task) -> Result<Box<dyn FittedLearner>> {
        self.capabilities().check(&self.name, task)?;

        let covariates = core::covariate_names(task);
        let columns = (0..covariates.len()).collect::<Vec<_>>();
        let rows = design::design_rows(task, &columns);
        let dim = columns.len() + 1;

        let y = task.outcome();
        let weights = task.weights();
        let offset = task.offset();

        let mut gram = SquareMatrix::zeros(dim);
        let mut rhs = vec![0f64; dim];
        for (i, x) in rows.iter().enumerate() {
            let w = weights[i];
            let target = y[i] - offset.as_ref().map_or(0f64, |o| o[i]);
            gram.add_outer(x, w);
            rhs.iter_mut()
                .zip(x)
                .for_each(|(r, xk)| { *r += w * xk * target; });
        }
        design::add_ridge(&mut gram, dim, self.lambda);

        let beta = design::solve_with_jitter(&gram, &rhs, dim)
            .ok_or_else(|| SuperLearnerError::training(
                self.name.as_str(), "the normal equations are singular"
            ))?;

        let fitted = FittedLinear { name: self.name.clone(), covariates, beta, };
        Ok(Box::new(fitted))
    }
}


/// Fitted [`LinearRegression`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedLinear {
    name: String,
    covariates: Vec<String>,
    // beta[0] is the intercept.
    beta: Vec<f64>,
}


impl FittedLearner for FittedLinear {
    fn name(&self) -> &str {
        &self.name
    }


    fn predict(&self, task: &Task) -> Result<Vec<f64>> {
        let columns = core::resolve_covariates(&self.name, task, &self.covariates)?;
        let offset = task.offset();
        let predictions = design::design_rows(task, &columns)
            .into_iter()
            .enumerate()
            .map(|(i, x)| {
                design::linear_predictor(&x, &self.beta)
                    + offset.as_ref().map_or(0f64, |o| o[i])
            })
            .collect();
        Ok(predictions)
    }


    fn coefficients(&self) -> Option<Vec<(String, f64)>> {
        Some(design::named_coefficients(&self.covariates, &self.beta))
    }
}
