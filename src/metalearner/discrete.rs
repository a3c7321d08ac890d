use log::info;

use super::combination::FittedCombination;
use crate::common::helpers;
use crate::constants::DISCRETE_NAME;
use crate::error::{Result, SuperLearnerError};
use crate::learner::{core, Capabilities, FittedLearner, Learner};
use crate::loss::{Loss, LossFunction};
use crate::task::Task;


/// The discrete selector.
/// Puts all the weight on the prediction column of minimal risk.
/// Ties are broken by the column order (the first one wins).
#[derive(Debug, Clone)]
pub struct DiscreteSelector {
    name: String,
    loss: Loss,
}


impl DiscreteSelector {
    /// Construct a new instance of [`DiscreteSelector`].
    pub fn new(loss: Loss) -> Self {
        Self { name: DISCRETE_NAME.to_string(), loss, }
    }


    /// Select the column of minimal risk on `task`.
    pub fn fit(&self, task: &Task) -> Result<FittedCombination> {
        self.capabilities().check(&self.name, task)?;
        let learners = core::covariate_names(task);

        let target = task.outcome();
        let weights = task.weights();
        let risks = (0..task.n_covariates())
            .map(|j| {
                self.loss.weighted_eval(&task.column_values(j), &target, &weights)
            })
            .collect::<Vec<_>>();

        let best = helpers::argmin(&risks)
            .ok_or_else(|| SuperLearnerError::training(
                self.name.as_str(), "there is no prediction to select from"
            ))?;
        info!("`{}` selected `{}`", self.name, learners[best]);

        let mut weights = vec![0f64; learners.len()];
        weights[best] = 1f64;
        FittedCombination::new(self.name.clone(), learners, weights)
    }
}


impl Learner for DiscreteSelector {
    fn name(&self) -> &str {
        &self.name
    }


    fn info(&self) -> Option<Vec<(&str, String)>> {
        Some(vec![("Loss", self.loss.to_string())])
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
        Ok(Box::new(self.fit(task)?))
    }
}
