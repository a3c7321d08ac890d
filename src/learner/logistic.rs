use log::warn;
use serde::{Serialize, Deserialize};

use super::core::{self, Capabilities, FittedLearner, Learner};
use super::design;
use crate::common::linalg::SquareMatrix;
use crate::constants::{DEFAULT_MAX_ITER, DEFAULT_TOLERANCE};
use crate::error::{Result, SuperLearnerError};
use crate::task::Task;


/// Logistic regression for a binary outcome,
/// fitted by Newton's method (iteratively reweighted least squares)
/// with an optional ridge penalty `lambda * ||beta||^2`.
/// Observation weights and an offset on the logit scale are supported.
///
/// # Example
/// ```no_run
/// use superlearner::prelude::*;
///
/// let learner = LogisticRegression::new()
///     .lambda(1e-3)
///     .max_iter(50)
///     .tolerance(1e-8);
/// ```
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    name: String,
    lambda: f64,
    max_iter: usize,
    tolerance: f64,
}


impl LogisticRegression {
    /// Construct a new instance of [`LogisticRegression`].
    pub fn new() -> Self {
        Self {
            name: "logistic".to_string(),
            lambda: 0f64,
            max_iter: DEFAULT_MAX_ITER,
            tolerance: DEFAULT_TOLERANCE,
        }
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


    /// Set the maximal number of Newton steps. Default is `100`.
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }


    /// Set the tolerance on the largest coefficient update.
    /// Default is `1e-8`.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}


impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}


impl Learner for LogisticRegression {
    fn name(&self) -> &str {
        &self.name
    }


    fn info(&self) -> Option<Vec<(&str, String)>> {
        let info = Vec::from([
            ("Ridge penalty", format!("{}", self.lambda)),
            ("Max iter", format!("{}", self.max_iter)),
            ("Tolerance", format!("{}", self.tolerance)),
        ]);
        Some(info)
    }


    fn capabilities(&self) -> Capabilities {
        Capabilities {
            continuous: false,
            binary: true,
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
        let offset_at = |i: usize| offset.as_ref().map_or(0f64, |o| o[i]);

        let mut beta = vec![0f64; dim];
        let mut converged = false;
        for _ in 0..self.max_iter {
            let mut hessian = SquareMatrix::zeros(dim);
            let mut gradient = vec![0f64; dim];
            for (i, x) in rows.iter().enumerate() {
                let eta = design::linear_predictor(x, &beta) + offset_at(i);
                let p = sigmoid(eta);
                let w = weights[i];
                hessian.add_outer(x, w * (p * (1f64 - p)).max(1e-10));
                gradient.iter_mut()
                    .zip(x)
                    .for_each(|(g, xk)| { *g += w * (y[i] - p) * xk; });
            }
            design::add_ridge(&mut hessian, dim, self.lambda);
            for k in 1..dim {
                gradient[k] -= self.lambda * beta[k];
            }

            let step = design::solve_with_jitter(&hessian, &gradient, dim)
                .ok_or_else(|| SuperLearnerError::training(
                    self.name.as_str(), "the Hessian is singular"
                ))?;

            beta.iter_mut()
                .zip(&step)
                .for_each(|(b, s)| { *b += s; });

            if beta.iter().any(|b| !b.is_finite()) {
                return Err(SuperLearnerError::training(
                    self.name.as_str(), "the coefficients diverged"
                ));
            }

            let largest = step.iter()
                .fold(0f64, |acc, s| acc.max(s.abs()));
            if largest < self.tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                "learner `{}` did not converge in {} iterations",
                self.name, self.max_iter
            );
        }

        let fitted = FittedLogistic { name: self.name.clone(), covariates, beta, };
        Ok(Box::new(fitted))
    }
}


/// Fitted [`LogisticRegression`].
/// Predictions are probabilities of the outcome `1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedLogistic {
    name: String,
    covariates: Vec<String>,
    beta: Vec<f64>,
}


impl FittedLearner for FittedLogistic {
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
                let eta = design::linear_predictor(&x, &self.beta)
                    + offset.as_ref().map_or(0f64, |o| o[i]);
                sigmoid(eta)
            })
            .collect();
        Ok(predictions)
    }


    fn coefficients(&self) -> Option<Vec<(String, f64)>> {
        Some(design::named_coefficients(&self.covariates, &self.beta))
    }
}


#[inline(always)]
fn sigmoid(eta: f64) -> f64 {
    1f64 / (1f64 + (-eta).exp())
}
