use log::{debug, info};
use rayon::prelude::*;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::core::{self, Capabilities, FittedLearner, Learner};
use super::prediction::PredictionMatrix;
use crate::common::helpers;
use crate::error::{Result, SuperLearnerError};
use crate::task::{Column, Task};


/// A composite learner that trains every constituent
/// independently on the same task.
///
/// Training runs the constituents in parallel,
/// each under an optional time limit.
/// If any constituent fails, the whole stack fails
/// and the error names the first failing constituent
/// in declaration order.
///
/// Constituent names must be unique within a stack;
/// repeated names get the suffixes `_2`, `_3`, ...
///
/// # Example
/// ```
/// use superlearner::prelude::*;
///
/// let stack = Stack::empty()
///     .add(MeanLearner::new())
///     .add(LinearRegression::new())
///     .add(RegressionTree::new().max_depth(2));
/// assert_eq!(stack.learner_names(), &["mean", "linear", "tree"]);
/// ```
#[derive(Clone)]
pub struct Stack {
    name: String,
    learners: Vec<Arc<dyn Learner>>,
    names: Vec<String>,
    timeout: Option<Duration>,
    parallel: bool,
}


impl Stack {
    /// Construct a stack of the given learners.
    pub fn new(learners: Vec<Arc<dyn Learner>>) -> Self {
        let names = helpers::unique_names(learners.iter().map(|l| l.name()));
        Self {
            name: "stack".to_string(),
            learners,
            names,
            timeout: None,
            parallel: true,
        }
    }


    /// Construct an empty stack.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }


    /// Append a learner.
    pub fn add<L: Learner + 'static>(self, learner: L) -> Self {
        self.add_shared(Arc::new(learner))
    }


    /// Append a shared learner.
    pub fn add_shared(mut self, learner: Arc<dyn Learner>) -> Self {
        self.learners.push(learner);
        self.names = helpers::unique_names(self.learners.iter().map(|l| l.name()));
        self
    }


    /// Set the name of this stack.
    pub fn label<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }


    /// Set the time limit of each constituent's training.
    /// By default, there is no limit.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }


    /// Set the flag whether the constituents are trained in parallel.
    /// Default is `true`.
    pub fn parallel(mut self, flag: bool) -> Self {
        self.parallel = flag;
        self
    }


    /// Returns the constituents.
    pub fn learners(&self) -> &[Arc<dyn Learner>] {
        &self.learners[..]
    }


    /// Returns the (unique) names of the constituents.
    pub fn learner_names(&self) -> &[String] {
        &self.names[..]
    }


    /// Returns the number of constituents.
    pub fn len(&self) -> usize {
        self.learners.len()
    }


    /// Returns `true` if the stack has no constituent.
    pub fn is_empty(&self) -> bool {
        self.learners.is_empty()
    }


    /// Returns the time limit of each constituent.
    pub fn time_limit(&self) -> Option<Duration> {
        self.timeout
    }


    /// Train every constituent on `task` and return the individual results,
    /// in declaration order.
    pub fn train_each(&self, task: &Task) -> Vec<Result<Box<dyn FittedLearner>>> {
        let train = |(learner, name): (&Arc<dyn Learner>, &String)| {
            debug!("training `{name}` on {} rows", task.n_rows());
            core::train_with_limit(learner, task, self.timeout)
                .map_err(|e| rename(e, learner.name(), name))
        };

        if self.parallel {
            self.learners.par_iter()
                .zip(self.names.par_iter())
                .map(train)
                .collect()
        } else {
            self.learners.iter()
                .zip(self.names.iter())
                .map(train)
                .collect()
        }
    }


    /// Train every constituent on `task`.
    /// Fails if any constituent fails.
    pub fn train_stack(&self, task: &Task) -> Result<FittedStack> {
        if self.is_empty() {
            return Err(SuperLearnerError::config(format!(
                "stack `{}` has no learner", self.name
            )));
        }

        let fitted = self.train_each(task)
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        info!("trained {} learners of stack `{}`", fitted.len(), self.name);

        Ok(FittedStack::new(self.name.clone(), self.names.clone(), fitted))
    }


    /// Returns the stack of the constituents at `keep`.
    pub(crate) fn select(&self, keep: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            learners: keep.iter().map(|&k| Arc::clone(&self.learners[k])).collect(),
            names: keep.iter().map(|&k| self.names[k].clone()).collect(),
            timeout: self.timeout,
            parallel: self.parallel,
        }
    }
}


impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("name", &self.name)
            .field("learners", &self.names)
            .field("timeout", &self.timeout)
            .field("parallel", &self.parallel)
            .finish()
    }
}


impl Learner for Stack {
    fn name(&self) -> &str {
        &self.name
    }


    fn info(&self) -> Option<Vec<(&str, String)>> {
        Some(vec![("Learners", self.names.join(", "))])
    }


    fn capabilities(&self) -> Capabilities {
        self.learners.iter()
            .fold(Capabilities::ALL, |acc, l| acc.intersect(&l.capabilities()))
    }


    fn train(&self, task: &Task) -> Result<Box<dyn FittedLearner>> {
        Ok(Box::new(self.train_stack(task)?))
    }
}


/// Give the error the name the learner has within the stack.
fn rename(error: SuperLearnerError, own: &str, in_stack: &str) -> SuperLearnerError {
    if own == in_stack || error.learner() != Some(own) {
        return error;
    }
    error.renamed(in_stack)
}


/// A trained [`Stack`].
#[derive(Debug)]
pub struct FittedStack {
    name: String,
    names: Vec<String>,
    fitted: Vec<Box<dyn FittedLearner>>,
}


impl FittedStack {
    pub(crate) fn new(
        name: String,
        names: Vec<String>,
        fitted: Vec<Box<dyn FittedLearner>>,
    ) -> Self
    {
        Self { name, names, fitted, }
    }


    /// Returns the constituent names.
    pub fn names(&self) -> &[String] {
        &self.names[..]
    }


    /// Returns the fitted constituents.
    pub fn fitted(&self) -> &[Box<dyn FittedLearner>] {
        &self.fitted[..]
    }


    /// Returns the number of constituents.
    pub fn len(&self) -> usize {
        self.fitted.len()
    }


    /// Returns `true` if the stack has no constituent.
    pub fn is_empty(&self) -> bool {
        self.fitted.is_empty()
    }


    /// Predict every row of `task` with every constituent.
    /// Column `k` of the output holds the predictions of the `k`-th one.
    pub fn predict_wide(&self, task: &Task) -> Result<PredictionMatrix> {
        let columns = self.fitted.par_iter()
            .map(|f| f.predict(task))
            .collect::<Result<Vec<_>>>()?;
        Ok(PredictionMatrix::new(self.names.clone(), columns))
    }
}


impl FittedLearner for FittedStack {
    fn name(&self) -> &str {
        &self.name
    }


    /// A stack of one learner predicts with that learner.
    /// Otherwise, use [`FittedStack::predict_wide`].
    fn predict(&self, task: &Task) -> Result<Vec<f64>> {
        match &self.fitted[..] {
            [single] => single.predict(task),
            _ => Err(SuperLearnerError::unsupported(
                self.name.as_str(), "predict (use `predict_wide`)"
            )),
        }
    }


    /// The covariates of the output are the constituent predictions.
    fn chain(&self, task: &Task) -> Result<Task> {
        let matrix = self.predict_wide(task)?;
        let columns = matrix.names()
            .iter()
            .zip(matrix.columns())
            .map(|(name, values)| Column::continuous(name.as_str(), values.clone()))
            .collect();
        task.with_covariates(columns)
    }
}
