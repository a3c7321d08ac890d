//! Provides [`Learner`] and [`FittedLearner`] traits.
use log::{debug, warn};

use std::fmt;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use crate::error::{Result, SuperLearnerError};
use crate::task::{Column, OutcomeType, Task};


/// The capabilities a learner declares.
/// A learner refuses to train on a task whose outcome type it does not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Supports continuous outcomes.
    pub continuous: bool,
    /// Supports binary outcomes.
    pub binary: bool,
    /// Supports categorical outcomes.
    pub categorical: bool,
    /// Uses observation weights.
    pub weights: bool,
    /// Uses an offset.
    pub offset: bool,
}


impl Capabilities {
    /// Capabilities of a learner that supports every outcome type,
    /// weights, and offsets.
    pub const ALL: Self = Self {
        continuous: true,
        binary: true,
        categorical: true,
        weights: true,
        offset: true,
    };


    /// Returns `true` if the outcome type is supported.
    pub fn supports(&self, outcome_type: OutcomeType) -> bool {
        match outcome_type {
            OutcomeType::Continuous => self.continuous,
            OutcomeType::Binary => self.binary,
            OutcomeType::Categorical(_) => self.categorical,
        }
    }


    /// Returns the capabilities shared by `self` and `other`.
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            continuous: self.continuous && other.continuous,
            binary: self.binary && other.binary,
            categorical: self.categorical && other.categorical,
            weights: self.weights && other.weights,
            offset: self.offset && other.offset,
        }
    }


    /// Fails with [`SuperLearnerError::UnsupportedOutcomeType`]
    /// if the outcome type of `task` is not supported.
    pub fn check(&self, learner: &str, task: &Task) -> Result<()> {
        let outcome_type = task.outcome_type();
        if !self.supports(outcome_type) {
            return Err(SuperLearnerError::UnsupportedOutcomeType {
                learner: learner.to_string(),
                outcome: outcome_type.to_string(),
            });
        }
        if task.has_weights() && !self.weights {
            debug!("learner `{learner}` ignores the observation weights");
        }
        if task.offset().is_some() && !self.offset {
            debug!("learner `{learner}` ignores the offset");
        }
        Ok(())
    }
}


/// A trainable prediction algorithm.
///
/// A `Learner` only holds hyperparameters.
/// [`Learner::train`] never mutates the task nor `self`,
/// so that the same learner can be trained on many tasks at once.
pub trait Learner: Send + Sync {
    /// Returns the name of this learner.
    fn name(&self) -> &str;


    /// Returns the hyperparameters of this learner as `(name, value)` pairs.
    fn info(&self) -> Option<Vec<(&str, String)>> {
        None
    }


    /// Returns the capabilities of this learner.
    fn capabilities(&self) -> Capabilities;


    /// Train this learner on `task`.
    fn train(&self, task: &Task) -> Result<Box<dyn FittedLearner>>;
}


/// The immutable artifact produced by [`Learner::train`].
pub trait FittedLearner: Send + Sync + fmt::Debug {
    /// Returns the name of the learner that produced this artifact.
    fn name(&self) -> &str;


    /// Predict the outcome of every row of `task`.
    /// `task` must have the covariates this learner was trained on.
    fn predict(&self, task: &Task) -> Result<Vec<f64>>;


    /// Transform `task` for the next stage of a [`Pipeline`](crate::Pipeline).
    /// By default, the covariates are replaced
    /// by the predictions of this learner.
    fn chain(&self, task: &Task) -> Result<Task> {
        let predictions = self.predict(task)?;
        let column = Column::continuous(self.name(), predictions);
        task.with_covariates(vec![column])
    }


    /// Returns the learned coefficients as `(name, value)` pairs, if any.
    fn coefficients(&self) -> Option<Vec<(String, f64)>> {
        None
    }
}


/// Train `learner` on `task`, giving up after `limit`.
///
/// With a limit, training runs on a dedicated thread.
/// If no result arrives in time, this function returns
/// [`SuperLearnerError::TimeoutExceeded`] and the thread is detached.
/// Errors that do not name a learner are attributed to `learner`.
/// A task whose rows have zero total weight is a training failure.
pub fn train_with_limit(
    learner: &Arc<dyn Learner>,
    task: &Task,
    limit: Option<Duration>,
) -> Result<Box<dyn FittedLearner>>
{
    let name = learner.name().to_string();
    if task.has_weights() && task.weights().iter().sum::<f64>() <= 0f64 {
        return Err(SuperLearnerError::training(
            name, "the training rows have zero total weight"
        ));
    }
    let result = match limit {
        None => learner.train(task),
        Some(limit) => {
            let (sender, receiver) = mpsc::channel();
            let worker = Arc::clone(learner);
            let task = task.clone();
            thread::Builder::new()
                .name(format!("train-{name}"))
                .spawn(move || {
                    // The receiver is gone after a timeout.
                    let _ = sender.send(worker.train(&task));
                })?;

            match receiver.recv_timeout(limit) {
                Ok(result) => result,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    warn!(
                        "learner `{name}` did not finish within {} ms",
                        limit.as_millis()
                    );
                    Err(SuperLearnerError::TimeoutExceeded {
                        learner: name.clone(),
                        millis: limit.as_millis(),
                    })
                },
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    Err(SuperLearnerError::training(
                        name.as_str(), "the training thread panicked"
                    ))
                },
            }
        },
    };
    result.map_err(|e| e.attributed_to(&name))
}


/// Resolve the positions of the named covariates in `task`.
pub(crate) fn resolve_covariates(learner: &str, task: &Task, names: &[String])
    -> Result<Vec<usize>>
{
    names.iter()
        .map(|name| {
            task.covariate_index(name)
                .ok_or_else(|| SuperLearnerError::config(format!(
                    "learner `{learner}` was trained on covariate `{name}`, \
                    which the task does not have. \
                    Build the task with `TaskBuilder::schema_from`"
                )))
        })
        .collect()
}


/// Returns the covariate names of `task` as owned strings.
pub(crate) fn covariate_names(task: &Task) -> Vec<String> {
    task.covariate_names()
        .into_iter()
        .map(str::to_string)
        .collect()
}
