use crate::constants::{DISCRETE_NAME, ENSEMBLE_NAME};
use crate::cross_validation::{CvRiskTable, DroppedLearner, RiskEntry};
use crate::error::{Result, SuperLearnerError};
use crate::learner::{FittedLearner, FittedStack, PredictionMatrix};
use crate::loss::Loss;
use crate::metalearner::{FittedCombination, MetalearnerKind};
use crate::report::SuperLearnerReport;
use crate::task::{CovariateSchema, OutcomeType, Task};


/// A trained [`SuperLearner`](crate::SuperLearner).
///
/// Owns the stack trained on the whole task, the fitted metalearner,
/// the cross-validated risk table, and the discrete selector.
/// A `FittedSuperLearner` is immutable.
#[derive(Debug)]
pub struct FittedSuperLearner {
    name: String,
    outcome_name: String,
    outcome_type: OutcomeType,
    schema: CovariateSchema,
    n_rows: usize,
    n_folds: usize,
    loss: Loss,
    metalearner_kind: MetalearnerKind,
    fitted_stack: FittedStack,
    metalearner: FittedCombination,
    risk_table: CvRiskTable,
    discrete: usize,
    dropped: Vec<DroppedLearner>,
    oof: PredictionMatrix,
    fold_of_row: Vec<usize>,
}


impl FittedSuperLearner {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        task: &Task,
        loss: Loss,
        metalearner_kind: MetalearnerKind,
        fitted_stack: FittedStack,
        metalearner: FittedCombination,
        risk_table: CvRiskTable,
        discrete: usize,
        dropped: Vec<DroppedLearner>,
        oof: PredictionMatrix,
        fold_of_row: Vec<usize>,
    ) -> Self
    {
        Self {
            name,
            outcome_name: task.outcome_name().to_string(),
            outcome_type: task.outcome_type(),
            schema: task.schema().clone(),
            n_rows: task.n_rows(),
            n_folds: task.n_folds(),
            loss,
            metalearner_kind,
            fitted_stack,
            metalearner,
            risk_table,
            discrete,
            dropped,
            oof,
            fold_of_row,
        }
    }


    /// Predict the outcome of every row of `task` with the ensemble.
    pub fn predict(&self, task: &Task) -> Result<Vec<f64>> {
        let matrix = self.fitted_stack.predict_wide(task)?;
        Ok(self.metalearner.combine(&matrix))
    }


    /// Predict the outcome of every row of `task` with the discrete selector.
    pub fn predict_discrete(&self, task: &Task) -> Result<Vec<f64>> {
        self.fitted_stack.fitted()[self.discrete].predict(task)
    }


    /// Predict the outcome of every row of `task` with every learner.
    pub fn predict_learners(&self, task: &Task) -> Result<PredictionMatrix> {
        self.fitted_stack.predict_wide(task)
    }


    /// Evaluate the ensemble, the discrete selector,
    /// and every learner on `holdout`.
    /// `holdout` should not share rows with the task used for training,
    /// and should be built with [`FittedSuperLearner::schema`]
    /// so that its covariates match the training ones.
    pub fn risk(&self, holdout: &Task) -> Result<CvRiskTable> {
        if holdout.outcome_name() != self.outcome_name {
            return Err(SuperLearnerError::config(format!(
                "the holdout outcome is `{}`, but `{}` was trained on `{}`",
                holdout.outcome_name(), self.name, self.outcome_name
            )));
        }

        let matrix = self.fitted_stack.predict_wide(holdout)?;
        let ensemble = self.metalearner.combine(&matrix);
        let discrete = matrix.column(self.discrete);

        let mut entries = vec![
            RiskEntry::evaluate(ENSEMBLE_NAME, &ensemble, holdout, &self.loss, None),
            RiskEntry::evaluate(DISCRETE_NAME, discrete, holdout, &self.loss, None),
        ];
        entries.extend(
            matrix.names()
                .iter()
                .zip(matrix.columns())
                .map(|(name, column)| {
                    RiskEntry::evaluate(name, column, holdout, &self.loss, None)
                })
        );
        Ok(CvRiskTable::new(self.loss.to_string(), entries))
    }


    /// Returns the imputation rules of the training task.
    /// Pass them to [`TaskBuilder::schema`](crate::TaskBuilder::schema)
    /// to build a task on new data.
    pub fn schema(&self) -> &CovariateSchema {
        &self.schema
    }


    /// Returns the name of the outcome.
    pub fn outcome_name(&self) -> &str {
        &self.outcome_name
    }


    /// Returns the outcome type of the training task.
    pub fn outcome_type(&self) -> OutcomeType {
        self.outcome_type
    }


    /// Returns the number of rows of the training task.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }


    /// Returns the number of folds of the training task.
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }


    /// Returns the loss function.
    pub fn loss(&self) -> Loss {
        self.loss
    }


    /// Returns the kind of the metalearner.
    pub fn metalearner_kind(&self) -> MetalearnerKind {
        self.metalearner_kind
    }


    /// Returns the names of the learners in the ensemble.
    pub fn learner_names(&self) -> &[String] {
        self.fitted_stack.names()
    }


    /// Returns the metalearner weight on each learner,
    /// in the order of [`FittedSuperLearner::learner_names`].
    pub fn weights(&self) -> &[f64] {
        self.metalearner.weights()
    }


    /// Returns the fitted metalearner.
    pub fn metalearner(&self) -> &FittedCombination {
        &self.metalearner
    }


    /// Returns the stack trained on the whole task.
    pub fn fitted_stack(&self) -> &FittedStack {
        &self.fitted_stack
    }


    /// Returns the cross-validated risk table.
    pub fn risk_table(&self) -> &CvRiskTable {
        &self.risk_table
    }


    /// Returns the name of the discrete selector,
    /// the learner with the minimal cross-validated risk.
    pub fn discrete_selector(&self) -> &str {
        &self.fitted_stack.names()[self.discrete]
    }


    /// Returns the learners dropped during the fit.
    pub fn dropped(&self) -> &[DroppedLearner] {
        &self.dropped[..]
    }


    /// Returns the out-of-fold predictions the metalearner was trained on.
    pub fn oof(&self) -> &PredictionMatrix {
        &self.oof
    }


    /// Returns the position of the fold that validated each row.
    pub fn fold_of_row(&self) -> &[usize] {
        &self.fold_of_row[..]
    }


    /// Summarize this fit.
    pub fn report(&self) -> SuperLearnerReport {
        SuperLearnerReport::new(self)
    }
}


impl FittedLearner for FittedSuperLearner {
    fn name(&self) -> &str {
        &self.name
    }


    fn predict(&self, task: &Task) -> Result<Vec<f64>> {
        FittedSuperLearner::predict(self, task)
    }


    fn coefficients(&self) -> Option<Vec<(String, f64)>> {
        self.metalearner.coefficients()
    }
}
