use log::debug;
use serde::{Serialize, Deserialize};

use super::core::{Capabilities, FittedLearner, Learner};
use crate::common::helpers;
use crate::constants::DEFAULT_TOP_K;
use crate::error::{Result, SuperLearnerError};
use crate::task::Task;


/// A screener that keeps the covariates most correlated with the outcome.
///
/// A screener does not predict.
/// Put it in front of a learner with a [`Pipeline`](crate::Pipeline);
/// its [`FittedLearner::chain`] restricts the covariates of the task.
///
/// The covariates are ranked by the absolute (weighted) Pearson correlation
/// with the outcome. A covariate with zero variance has correlation `0`.
/// At most `top_k` covariates are kept, and, if `min_abs_correlation` is set,
/// only those whose correlation reaches it.
/// The top ranked covariate is always kept.
#[derive(Debug, Clone)]
pub struct CorrelationScreener {
    name: String,
    top_k: usize,
    min_abs_correlation: Option<f64>,
}


impl CorrelationScreener {
    /// Construct a new instance of [`CorrelationScreener`].
    pub fn new() -> Self {
        Self {
            name: "screener.correlation".to_string(),
            top_k: DEFAULT_TOP_K,
            min_abs_correlation: None,
        }
    }


    /// Set the name of this learner.
    pub fn label<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }


    /// Set the maximal number of covariates to keep. Default is `5`.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }


    /// Keep only the covariates whose absolute correlation
    /// is at least `threshold`.
    pub fn min_abs_correlation(mut self, threshold: f64) -> Self {
        self.min_abs_correlation = Some(threshold);
        self
    }
}


impl Default for CorrelationScreener {
    fn default() -> Self {
        Self::new()
    }
}


impl Learner for CorrelationScreener {
    fn name(&self) -> &str {
        &self.name
    }


    fn info(&self) -> Option<Vec<(&str, String)>> {
        let threshold = self.min_abs_correlation
            .map_or("-".to_string(), |t| format!("{t}"));
        Some(vec![
            ("Top k", format!("{}", self.top_k)),
            ("Min |correlation|", threshold),
        ])
    }


    fn capabilities(&self) -> Capabilities {
        Capabilities {
            continuous: true,
            binary: true,
            categorical: true,
            weights: true,
            offset: false,
        }
    }


    fn train(&self, task: &Task) -> Result<Box<dyn FittedLearner>> {
        self.capabilities().check(&self.name, task)?;
        if task.n_covariates() == 0 {
            return Err(SuperLearnerError::training(
                self.name.as_str(), "the task has no covariate"
            ));
        }

        let y = task.outcome();
        let w = task.weights();
        let mut ranked = (0..task.n_covariates())
            .map(|j| {
                let r = helpers::weighted_correlation(&task.column_values(j), &y, &w);
                (j, r)
            })
            .collect::<Vec<_>>();
        // Stable sort, so ties keep the covariate order.
        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));

        let threshold = self.min_abs_correlation.unwrap_or(f64::NEG_INFINITY);
        let selected = ranked.iter()
            .enumerate()
            .filter(|(rank, (_, r))| *rank == 0 || r.abs() >= threshold)
            .take(self.top_k)
            .map(|(_, &(j, r))| (task.covariates()[j].name().to_string(), r))
            .collect::<Vec<_>>();

        debug!(
            "learner `{}` kept {:?}",
            self.name,
            selected.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>()
        );

        let fitted = FittedScreener { name: self.name.clone(), selected, };
        Ok(Box::new(fitted))
    }
}


/// Fitted [`CorrelationScreener`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedScreener {
    name: String,
    selected: Vec<(String, f64)>,
}


impl FittedScreener {
    /// Returns the names of the kept covariates.
    pub fn selected(&self) -> Vec<&str> {
        self.selected.iter()
            .map(|(name, _)| name.as_str())
            .collect()
    }
}


impl FittedLearner for FittedScreener {
    fn name(&self) -> &str {
        &self.name
    }


    fn predict(&self, _task: &Task) -> Result<Vec<f64>> {
        Err(SuperLearnerError::unsupported(self.name.as_str(), "predict"))
    }


    fn chain(&self, task: &Task) -> Result<Task> {
        task.select_covariates(&self.selected())
    }


    fn coefficients(&self) -> Option<Vec<(String, f64)>> {
        Some(self.selected.clone())
    }
}
