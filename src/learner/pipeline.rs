use std::fmt;
use std::sync::Arc;

use super::core::{Capabilities, FittedLearner, Learner};
use crate::error::{Result, SuperLearnerError};
use crate::task::Task;


/// A composite learner that chains learners sequentially.
///
/// Stage `0` trains on the original task.
/// Stage `i > 0` trains on the task produced by
/// [`FittedLearner::chain`] of the fitted stage `i - 1`.
/// Derived tasks must keep the rows and the outcome;
/// only the covariates change between stages.
/// Only the final stage predicts.
///
/// # Example
/// ```
/// use superlearner::prelude::*;
///
/// let pipeline = Pipeline::empty()
///     .add(CorrelationScreener::new().top_k(3))
///     .add(LinearRegression::new());
/// assert_eq!(pipeline.name(), "screener.correlation->linear");
/// ```
#[derive(Clone)]
pub struct Pipeline {
    name: Option<String>,
    stages: Vec<Arc<dyn Learner>>,
    joined: String,
}


impl Pipeline {
    /// Construct a pipeline of the given stages.
    pub fn new(stages: Vec<Arc<dyn Learner>>) -> Self {
        let joined = join_names(&stages);
        Self { name: None, stages, joined, }
    }


    /// Construct an empty pipeline.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }


    /// Append a stage.
    pub fn add<L: Learner + 'static>(mut self, stage: L) -> Self {
        self.stages.push(Arc::new(stage));
        self.joined = join_names(&self.stages);
        self
    }


    /// Append a shared stage.
    pub fn add_shared(mut self, stage: Arc<dyn Learner>) -> Self {
        self.stages.push(stage);
        self.joined = join_names(&self.stages);
        self
    }


    /// Set the name of this pipeline.
    /// By default, the name joins the stage names with `->`.
    pub fn label<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }


    /// Returns the stages.
    pub fn stages(&self) -> &[Arc<dyn Learner>] {
        &self.stages[..]
    }


    /// Report the failure of a stage under the name of this pipeline.
    fn stage_error(&self, error: SuperLearnerError) -> SuperLearnerError {
        match error {
            SuperLearnerError::LearnerTrainingFailure { learner, reason } => {
                SuperLearnerError::training(
                    self.name(), format!("stage `{learner}`: {reason}")
                )
            },
            other => other.renamed(self.name()),
        }
    }
}


fn join_names(stages: &[Arc<dyn Learner>]) -> String {
    stages.iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join("->")
}


impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name())
            .finish()
    }
}


impl Learner for Pipeline {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.joined)
    }


    fn capabilities(&self) -> Capabilities {
        self.stages.iter()
            .fold(Capabilities::ALL, |acc, s| acc.intersect(&s.capabilities()))
    }


    fn train(&self, task: &Task) -> Result<Box<dyn FittedLearner>> {
        let Some((last, init)) = self.stages.split_last() else {
            return Err(SuperLearnerError::config(format!(
                "pipeline `{}` has no stage", self.name()
            )));
        };
        self.capabilities().check(self.name(), task)?;

        let mut current = task.clone();
        let mut fitted = Vec::with_capacity(self.stages.len());
        for stage in init {
            let fit = stage.train(&current)
                .map_err(|e| self.stage_error(e))?;
            let next = fit.chain(&current)
                .map_err(|e| self.stage_error(e.attributed_to(stage.name())))?;
            if !next.same_rows_and_outcome(&current) {
                return Err(SuperLearnerError::training(
                    self.name(),
                    format!(
                        "stage `{}` changed the rows or the outcome",
                        stage.name()
                    ),
                ));
            }
            fitted.push(fit);
            current = next;
        }
        fitted.push(last.train(&current).map_err(|e| self.stage_error(e))?);

        let fit = FittedPipeline { name: self.name().to_string(), stages: fitted, };
        Ok(Box::new(fit))
    }
}


/// A trained [`Pipeline`].
/// Every fitted stage is retained and replayed at prediction.
#[derive(Debug)]
pub struct FittedPipeline {
    name: String,
    stages: Vec<Box<dyn FittedLearner>>,
}


impl FittedPipeline {
    /// Returns the fitted stages.
    pub fn stages(&self) -> &[Box<dyn FittedLearner>] {
        &self.stages[..]
    }


    /// Apply every stage but the last one to `task`.
    fn transform(&self, task: &Task) -> Result<Task> {
        let n_stages = self.stages.len();
        self.stages[..n_stages - 1]
            .iter()
            .try_fold(task.clone(), |current, stage| stage.chain(&current))
    }
}


impl FittedLearner for FittedPipeline {
    fn name(&self) -> &str {
        &self.name
    }


    fn predict(&self, task: &Task) -> Result<Vec<f64>> {
        let last = self.stages.len() - 1;
        self.stages[last].predict(&self.transform(task)?)
    }


    fn chain(&self, task: &Task) -> Result<Task> {
        let last = self.stages.len() - 1;
        self.stages[last].chain(&self.transform(task)?)
    }


    fn coefficients(&self) -> Option<Vec<(String, f64)>> {
        self.stages.last().and_then(|s| s.coefficients())
    }
}
