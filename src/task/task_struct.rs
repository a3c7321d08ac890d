use log::debug;

use std::collections::HashSet;
use std::sync::Arc;

use super::column::Column;
use super::folds::{FoldAssignment, FoldStrategy};
use super::imputation::CovariateSchema;
use super::outcome::OutcomeType;
use crate::error::{Result, SuperLearnerError};


/// Struct `Task` bundles an imputed dataset,
/// the roles of its columns, and a cross-validation fold plan.
///
/// A `Task` is an immutable handle.
/// Cloning it is cheap since the columns are shared,
/// and every method that "changes" a task returns a new one.
/// Row subsets ([`Task::subset`], [`Task::view`]) share the backing columns
/// and only hold the positions of their rows.
///
/// Construct a task with [`TaskBuilder`](crate::TaskBuilder).
#[derive(Debug, Clone)]
pub struct Task {
    outcome_name: String,
    outcome_type: OutcomeType,
    outcome: Arc<[f64]>,
    covariates: Arc<[Column]>,
    // Imputation rules that produced the covariates.
    schema: Arc<CovariateSchema>,
    weights: Option<Arc<[f64]>>,
    offset: Option<Arc<[f64]>>,
    clusters: Option<Arc<[usize]>>,
    // Identity of each backing row.
    row_ids: Arc<[usize]>,
    // Positions of the rows of this task in the backing columns.
    rows: Arc<[usize]>,
    folds: Arc<[FoldAssignment]>,
    fold_strategy: FoldStrategy,
    seed: u64,
}


impl Task {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        outcome_name: String,
        outcome_type: OutcomeType,
        outcome: Vec<f64>,
        covariates: Vec<Column>,
        schema: CovariateSchema,
        weights: Option<Vec<f64>>,
        offset: Option<Vec<f64>>,
        clusters: Option<Vec<usize>>,
        folds: Vec<FoldAssignment>,
        fold_strategy: FoldStrategy,
        seed: u64,
    ) -> Self
    {
        let n_rows = outcome.len();
        Self {
            outcome_name,
            outcome_type,
            outcome: outcome.into(),
            covariates: covariates.into(),
            schema: Arc::new(schema),
            weights: weights.map(Into::into),
            offset: offset.map(Into::into),
            clusters: clusters.map(Into::into),
            row_ids: (0..n_rows).collect(),
            rows: (0..n_rows).collect(),
            folds: folds.into(),
            fold_strategy,
            seed,
        }
    }


    /// Returns the number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }


    /// Returns the number of covariates.
    #[inline]
    pub fn n_covariates(&self) -> usize {
        self.covariates.len()
    }


    /// Returns the pair of the number of rows and covariates.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_covariates())
    }


    /// Returns the name of the outcome column.
    pub fn outcome_name(&self) -> &str {
        &self.outcome_name
    }


    /// Returns the outcome type.
    #[inline]
    pub fn outcome_type(&self) -> OutcomeType {
        self.outcome_type
    }


    /// Returns the outcome of the `i`-th row.
    #[inline]
    pub fn outcome_at(&self, i: usize) -> f64 {
        self.outcome[self.rows[i]]
    }


    /// Returns the outcome values.
    pub fn outcome(&self) -> Vec<f64> {
        gather(&self.outcome, &self.rows)
    }


    /// Returns the covariate columns.
    pub fn covariates(&self) -> &[Column] {
        &self.covariates[..]
    }


    /// Returns the covariate names in order.
    pub fn covariate_names(&self) -> Vec<&str> {
        self.covariates.iter()
            .map(|c| c.name())
            .collect()
    }


    /// Returns the imputation rules of the raw covariates.
    /// A task whose covariates were replaced
    /// ([`Task::with_covariates`], [`Task::select_covariates`])
    /// has an empty schema.
    pub fn schema(&self) -> &CovariateSchema {
        &self.schema
    }


    /// Returns the position of the covariate named `name`.
    pub fn covariate_index(&self, name: &str) -> Option<usize> {
        self.covariates.iter()
            .position(|c| c.name() == name)
    }


    /// Returns the value of the `j`-th covariate at the `i`-th row.
    #[inline]
    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.covariates[j].values()[self.rows[i]]
    }


    /// Returns the `i`-th row of the covariates.
    pub fn row(&self, i: usize) -> Vec<f64> {
        let r = self.rows[i];
        self.covariates.iter()
            .map(|c| c.values()[r])
            .collect()
    }


    /// Returns the values of the `j`-th covariate.
    pub fn column_values(&self, j: usize) -> Vec<f64> {
        gather(self.covariates[j].values(), &self.rows)
    }


    /// Returns the observation weights.
    /// A task without a weight column has unit weights.
    pub fn weights(&self) -> Vec<f64> {
        match &self.weights {
            Some(w) => gather(w, &self.rows),
            None => vec![1f64; self.n_rows()],
        }
    }


    /// Returns `true` if the task has a weight column.
    #[inline]
    pub fn has_weights(&self) -> bool {
        self.weights.is_some()
    }


    /// Returns the offset, if the task has one.
    pub fn offset(&self) -> Option<Vec<f64>> {
        self.offset.as_ref()
            .map(|o| gather(o, &self.rows))
    }


    /// Returns the cluster id of each row, if the task has an id column.
    pub fn clusters(&self) -> Option<Vec<usize>> {
        self.clusters.as_ref()
            .map(|c| gather(c, &self.rows))
    }


    /// Returns the identity of each row,
    /// i.e., its position in the task this one is derived from
    /// by [`TaskBuilder`](crate::TaskBuilder).
    /// Derived tasks keep the ids of their rows.
    pub fn row_ids(&self) -> Vec<usize> {
        gather(&self.row_ids, &self.rows)
    }


    /// Returns the fold plan.
    /// A task obtained by [`Task::view`] has no folds.
    pub fn folds(&self) -> &[FoldAssignment] {
        &self.folds[..]
    }


    /// Returns the number of folds.
    #[inline]
    pub fn n_folds(&self) -> usize {
        self.folds.len()
    }


    /// Returns the strategy that generated the fold plan.
    pub fn fold_strategy(&self) -> &FoldStrategy {
        &self.fold_strategy
    }


    /// Returns the seed of this task.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }


    /// Returns the task restricted to the given rows, in the given order.
    /// The fold plan is regenerated on the subset;
    /// if that is impossible (e.g., too few rows), the subset has no folds.
    pub fn subset(&self, positions: &[usize]) -> Result<Self> {
        let mut task = self.view(positions)?;

        let strategy = self.fold_strategy.for_subset();
        let outcome = task.outcome();
        let clusters = task.clusters();
        let folds = strategy.make_folds(
            &outcome, task.outcome_type, clusters.as_deref(), self.seed
        );
        match folds {
            Ok(folds) => { task.folds = folds.into(); },
            Err(e) => {
                debug!("the subset of {} rows has no fold plan: {e}", positions.len());
            },
        }
        task.fold_strategy = strategy;
        Ok(task)
    }


    /// Returns the task restricted to the given rows, without a fold plan.
    pub fn view(&self, positions: &[usize]) -> Result<Self> {
        let n_rows = self.n_rows();
        if let Some(&i) = positions.iter().find(|&&i| i >= n_rows) {
            return Err(SuperLearnerError::config(format!(
                "row {i} is out of range for a task with {n_rows} rows"
            )));
        }

        let rows = positions.iter()
            .map(|&i| self.rows[i])
            .collect::<Vec<_>>();

        let mut task = self.clone();
        task.rows = rows.into();
        task.folds = Vec::new().into();
        Ok(task)
    }


    /// Returns a task with the same rows, outcome, weights, and folds,
    /// whose covariates are `columns`.
    /// Each column holds one value per row of this task.
    pub fn with_covariates(&self, columns: Vec<Column>) -> Result<Self> {
        let n_rows = self.n_rows();
        let mut names = HashSet::new();
        for column in &columns {
            if column.values().len() != n_rows {
                return Err(SuperLearnerError::config(format!(
                    "column `{}` has {} values, but the task has {n_rows} rows",
                    column.name(), column.values().len()
                )));
            }
            if column.name() == self.outcome_name {
                return Err(SuperLearnerError::config(format!(
                    "covariate `{}` collides with the outcome",
                    column.name()
                )));
            }
            if !names.insert(column.name()) {
                return Err(SuperLearnerError::config(format!(
                    "covariate `{}` appears twice", column.name()
                )));
            }
        }

        Ok(self.compact(columns))
    }


    /// Returns a task whose covariate `name` holds `values`.
    pub fn with_column_replaced(&self, name: &str, values: Vec<f64>) -> Result<Self> {
        let j = self.covariate_index(name)
            .ok_or_else(|| SuperLearnerError::config(format!(
                "unknown covariate `{name}`"
            )))?;

        let columns = self.covariates.iter()
            .enumerate()
            .map(|(k, c)| {
                if k == j {
                    c.with_values(values.clone())
                } else {
                    c.with_values(gather(c.values(), &self.rows))
                }
            })
            .collect();
        self.with_covariates(columns)
    }


    /// Returns a task whose covariates are the named ones, in the given order.
    pub fn select_covariates<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let columns = names.iter()
            .map(|name| {
                let name = name.as_ref();
                self.covariate_index(name)
                    .map(|j| self.covariates[j].clone())
                    .ok_or_else(|| SuperLearnerError::config(format!(
                        "unknown covariate `{name}`"
                    )))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut task = self.clone();
        task.schema = self.schema_for(&columns);
        task.covariates = columns.into();
        Ok(task)
    }


    /// Returns `true` if `other` has the same rows and outcome as `self`.
    pub fn same_rows_and_outcome(&self, other: &Self) -> bool {
        self.outcome_name == other.outcome_name
            && self.row_ids() == other.row_ids()
            && self.outcome() == other.outcome()
    }


    /// The schema stays valid only if the covariates keep their names.
    fn schema_for(&self, columns: &[Column]) -> Arc<CovariateSchema> {
        let same = columns.len() == self.covariates.len()
            && columns.iter()
                .zip(self.covariates.iter())
                .all(|(a, b)| a.name() == b.name());
        if same {
            self.schema.clone()
        } else {
            Arc::new(CovariateSchema::default())
        }
    }


    /// Copy the rows of this view into fresh backing columns,
    /// with `covariates` as the new covariates.
    fn compact(&self, covariates: Vec<Column>) -> Self {
        let rows = &self.rows[..];
        Self {
            outcome_name: self.outcome_name.clone(),
            outcome_type: self.outcome_type,
            outcome: gather(&self.outcome, rows).into(),
            schema: self.schema_for(&covariates),
            covariates: covariates.into(),
            weights: self.weights.as_ref().map(|w| gather(w, rows).into()),
            offset: self.offset.as_ref().map(|o| gather(o, rows).into()),
            clusters: self.clusters.as_ref().map(|c| gather(c, rows).into()),
            row_ids: gather(&self.row_ids, rows).into(),
            rows: (0..rows.len()).collect(),
            folds: self.folds.clone(),
            fold_strategy: self.fold_strategy.clone(),
            seed: self.seed,
        }
    }
}


#[inline]
fn gather<T: Copy>(values: &[T], rows: &[usize]) -> Vec<T> {
    rows.iter().map(|&r| values[r]).collect()
}
