use log::info;

use std::collections::{BTreeSet, HashMap, HashSet};

use super::column::Column;
use super::folds::{FoldAssignment, FoldStrategy};
use super::imputation::{self, CovariateSchema};
use super::outcome::OutcomeType;
use super::task_struct::Task;
use crate::constants::DEFAULT_SEED;
use crate::error::{Result, SuperLearnerError};
use crate::table::{RawColumn, Table};


/// A struct that builds [`Task`] from a [`Table`].
///
/// # Example
/// ```
/// use superlearner::prelude::*;
///
/// let table = Table::new()
///     .with_column("x", vec![Some(1f64), None, Some(3f64), None, Some(5f64)]).unwrap()
///     .with_column("y", vec![0.1, 0.9, 0.3, 0.7, 0.5]).unwrap();
///
/// let task = TaskBuilder::new(&table)
///     .outcome("y")
///     .n_folds(2)
///     .build()
///     .unwrap();
///
/// assert_eq!(task.covariate_names(), vec!["x", "delta_x"]);
/// assert_eq!(task.column_values(0), vec![1.0, 3.0, 3.0, 3.0, 5.0]);
/// ```
pub struct TaskBuilder<'a> {
    table: &'a Table,
    outcome: Option<String>,
    covariates: Option<Vec<String>>,
    id_column: Option<String>,
    weights: Option<String>,
    offset: Option<String>,
    fold_strategy: FoldStrategy,
    outcome_type: Option<OutcomeType>,
    schema: Option<CovariateSchema>,
    seed: u64,
}


impl<'a> TaskBuilder<'a> {
    /// Construct a new instance of [`TaskBuilder`].
    /// By default, every column but the outcome, id, weight, and offset
    /// columns is a covariate,
    /// and the fold plan is a stratified 10-fold partition.
    pub fn new(table: &'a Table) -> Self {
        Self {
            table,
            outcome: None,
            covariates: None,
            id_column: None,
            weights: None,
            offset: None,
            fold_strategy: FoldStrategy::default(),
            outcome_type: None,
            schema: None,
            seed: DEFAULT_SEED,
        }
    }


    /// Set the outcome column.
    pub fn outcome<S: AsRef<str>>(mut self, name: S) -> Self {
        self.outcome = Some(name.as_ref().to_string());
        self
    }


    /// Set the covariate columns, in order.
    pub fn covariates<I, S>(mut self, names: I) -> Self
        where I: IntoIterator<Item = S>,
              S: AsRef<str>,
    {
        let names = names.into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        self.covariates = Some(names);
        self
    }


    /// Set the id column.
    /// Rows sharing an id are validated in the same fold.
    pub fn id_column<S: AsRef<str>>(mut self, name: S) -> Self {
        self.id_column = Some(name.as_ref().to_string());
        self
    }


    /// Set the observation weight column.
    pub fn weights<S: AsRef<str>>(mut self, name: S) -> Self {
        self.weights = Some(name.as_ref().to_string());
        self
    }


    /// Set the offset column.
    pub fn offset<S: AsRef<str>>(mut self, name: S) -> Self {
        self.offset = Some(name.as_ref().to_string());
        self
    }


    /// Set the number of folds `V`, keeping the fold strategy.
    /// Default is `10`.
    pub fn n_folds(mut self, n_folds: usize) -> Self {
        self.fold_strategy = match self.fold_strategy {
            FoldStrategy::VFold(_) => FoldStrategy::VFold(n_folds),
            _ => FoldStrategy::Stratified(n_folds),
        };
        self
    }


    /// Set the fold strategy.
    pub fn fold_strategy(mut self, strategy: FoldStrategy) -> Self {
        self.fold_strategy = strategy;
        self
    }


    /// Use the given fold plan.
    /// Row ids are positions after the rows with a missing outcome are dropped.
    pub fn folds(mut self, folds: Vec<FoldAssignment>) -> Self {
        self.fold_strategy = FoldStrategy::Explicit(folds);
        self
    }


    /// Override the detected outcome type.
    pub fn outcome_type(mut self, outcome_type: OutcomeType) -> Self {
        self.outcome_type = Some(outcome_type);
        self
    }


    /// Impute and encode the covariates with the rules of `reference`,
    /// typically the task a super learner was trained on.
    /// The covariates of the built task are then those of `reference`:
    /// the same fill values, level indicators, and missingness indicators
    /// (all zero if the new data has no missing value).
    /// This overrides [`TaskBuilder::covariates`].
    ///
    /// # Example
    /// ```
    /// use superlearner::prelude::*;
    ///
    /// let train = Table::new()
    ///     .with_column("x", vec![Some(1f64), None, Some(3f64), Some(7f64)]).unwrap()
    ///     .with_column("y", vec![0.1, 0.9, 0.3, 0.7]).unwrap();
    /// let train = TaskBuilder::new(&train)
    ///     .outcome("y")
    ///     .n_folds(2)
    ///     .build()
    ///     .unwrap();
    ///
    /// let new = Table::new()
    ///     .with_column("x", vec![Some(2f64), None, Some(5f64)]).unwrap()
    ///     .with_column("y", vec![0.2, 0.4, 0.6]).unwrap();
    /// let new = TaskBuilder::new(&new)
    ///     .outcome("y")
    ///     .schema_from(&train)
    ///     .n_folds(2)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(new.covariate_names(), vec!["x", "delta_x"]);
    /// // The training median fills the missing value.
    /// assert_eq!(new.column_values(0), vec![2.0, 3.0, 5.0]);
    /// ```
    pub fn schema_from(self, reference: &Task) -> Self {
        self.schema(reference.schema().clone())
    }


    /// Impute and encode the covariates with the given rules.
    /// See [`TaskBuilder::schema_from`].
    pub fn schema(mut self, schema: CovariateSchema) -> Self {
        self.schema = Some(schema);
        self
    }


    /// Set the seed of the fold plan. Default is `1234`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }


    /// Build the task.
    pub fn build(self) -> Result<Task> {
        let outcome_name = self.outcome.clone()
            .ok_or_else(|| SuperLearnerError::config(
                "the outcome column is not set. Use `TaskBuilder::outcome`."
            ))?;
        let raw_outcome = self.table.column(&outcome_name)
            .ok_or_else(|| SuperLearnerError::config(format!(
                "outcome column `{outcome_name}` is absent"
            )))?;
        let covariate_names = self.covariate_names(&outcome_name)?;

        // Rows with a missing outcome are excluded.
        let n_total = self.table.shape().0;
        let kept = (0..n_total)
            .filter(|&i| !raw_outcome.is_missing(i))
            .collect::<Vec<_>>();
        let n_dropped = n_total - kept.len();
        if n_dropped > 0 {
            info!("dropped {n_dropped} rows with a missing outcome `{outcome_name}`");
        }
        if kept.is_empty() {
            return Err(SuperLearnerError::config(format!(
                "no row has an observed outcome `{outcome_name}`"
            )));
        }

        let (outcome, outcome_type) = encode_outcome(
            &outcome_name, &raw_outcome.take(&kept), self.outcome_type
        )?;

        let weights = self.auxiliary(self.weights.as_deref(), &kept)?;
        if let Some(w) = &weights {
            if w.iter().any(|&x| !x.is_finite() || x < 0f64)
                || w.iter().sum::<f64>() <= 0f64
            {
                return Err(SuperLearnerError::config(
                    "weights must be non-negative, finite, and not all zero"
                ));
            }
        }
        let offset = self.auxiliary(self.offset.as_deref(), &kept)?;
        let clusters = self.clusters(&kept)?;

        let mut covariates = Vec::new();
        let mut indicators = Vec::new();
        let schema = match &self.schema {
            Some(schema) => {
                for rule in schema.rules() {
                    let raw = self.table[rule.name()].take(&kept);
                    let imputed = rule.apply(&raw)?;
                    covariates.extend(imputed.columns);
                    indicators.extend(imputed.indicator);
                }
                schema.clone()
            },
            None => {
                let mut rules = Vec::with_capacity(covariate_names.len());
                for name in &covariate_names {
                    let raw = self.table[name.as_str()].take(&kept);
                    let (imputed, rule) = imputation::impute(name, &raw)?;
                    covariates.extend(imputed.columns);
                    indicators.extend(imputed.indicator);
                    rules.push(rule);
                }
                CovariateSchema::new(rules)
            },
        };
        covariates.extend(indicators);
        check_unique(&covariates, &outcome_name)?;

        let folds = self.fold_strategy.make_folds(
            &outcome, outcome_type, clusters.as_deref(), self.seed
        )?;
        info!(
            "built a task with {} rows, {} covariates, and {} folds",
            outcome.len(), covariates.len(), folds.len()
        );

        let task = Task::new(
            outcome_name,
            outcome_type,
            outcome,
            covariates,
            schema,
            weights,
            offset,
            clusters,
            folds,
            self.fold_strategy,
            self.seed,
        );
        Ok(task)
    }


    fn covariate_names(&self, outcome: &str) -> Result<Vec<String>> {
        let roles = [
            self.id_column.as_deref(),
            self.weights.as_deref(),
            self.offset.as_deref(),
        ];
        for name in roles.iter().flatten() {
            if !self.table.contains(name) {
                return Err(SuperLearnerError::config(format!(
                    "column `{name}` is absent"
                )));
            }
        }

        let names = match (&self.schema, &self.covariates) {
            (Some(schema), _) => {
                if schema.is_empty() {
                    return Err(SuperLearnerError::config(
                        "the reference schema has no covariate"
                    ));
                }
                schema.raw_names()
            },
            (None, Some(names)) => names.clone(),
            (None, None) => {
                self.table.names()
                    .iter()
                    .filter(|&name| {
                        name != outcome
                            && !roles.contains(&Some(name.as_str()))
                    })
                    .cloned()
                    .collect()
            },
        };

        let mut seen = HashSet::new();
        for name in &names {
            if name == outcome {
                return Err(SuperLearnerError::config(format!(
                    "covariate `{name}` collides with the outcome"
                )));
            }
            if roles.contains(&Some(name.as_str())) {
                return Err(SuperLearnerError::config(format!(
                    "covariate `{name}` is also an id, weight, or offset column"
                )));
            }
            if !self.table.contains(name) {
                return Err(SuperLearnerError::config(format!(
                    "unknown covariate `{name}`"
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(SuperLearnerError::config(format!(
                    "covariate `{name}` is listed twice"
                )));
            }
        }
        Ok(names)
    }


    /// Read a numeric column that must be complete on the kept rows.
    fn auxiliary(&self, name: Option<&str>, kept: &[usize])
        -> Result<Option<Vec<f64>>>
    {
        let Some(name) = name else { return Ok(None); };
        match &self.table[name] {
            RawColumn::Numeric(values) => {
                kept.iter()
                    .map(|&i| values[i])
                    .collect::<Option<Vec<_>>>()
                    .map(Some)
                    .ok_or_else(|| SuperLearnerError::config(format!(
                        "column `{name}` has missing values"
                    )))
            },
            RawColumn::Text(_) => {
                Err(SuperLearnerError::config(format!(
                    "column `{name}` must be numeric"
                )))
            },
        }
    }


    /// Encode the id column as cluster indices.
    fn clusters(&self, kept: &[usize]) -> Result<Option<Vec<usize>>> {
        let Some(name) = self.id_column.as_deref() else { return Ok(None); };

        let column = self.table[name].take(kept);
        let keys = match &column {
            RawColumn::Numeric(values) => {
                values.iter()
                    .map(|v| v.map(|x| x.to_string()))
                    .collect::<Vec<_>>()
            },
            RawColumn::Text(values) => values.clone(),
        };

        let mut codes = HashMap::new();
        let mut clusters = Vec::with_capacity(keys.len());
        for key in keys {
            let key = key.ok_or_else(|| SuperLearnerError::config(format!(
                "id column `{name}` has missing values"
            )))?;
            let next = codes.len();
            clusters.push(*codes.entry(key).or_insert(next));
        }
        Ok(Some(clusters))
    }
}


/// Encode the outcome as `f64` values and detect its type.
/// A text outcome is encoded by the index of its level in sorted order.
fn encode_outcome(
    name: &str,
    column: &RawColumn,
    requested: Option<OutcomeType>,
) -> Result<(Vec<f64>, OutcomeType)>
{
    let (values, detected) = match column {
        RawColumn::Numeric(values) => {
            let values = values.iter().flatten().copied().collect::<Vec<_>>();
            let detected = OutcomeType::detect(&values);
            (values, detected)
        },
        RawColumn::Text(values) => {
            let levels = values.iter()
                .flatten()
                .map(String::as_str)
                .collect::<BTreeSet<_>>();
            let index = levels.iter()
                .enumerate()
                .map(|(k, &level)| (level, k))
                .collect::<HashMap<_, _>>();
            let encoded = values.iter()
                .flatten()
                .map(|v| index[v.as_str()] as f64)
                .collect::<Vec<_>>();
            let detected = if levels.len() <= 2 {
                OutcomeType::Binary
            } else {
                OutcomeType::Categorical(levels.len())
            };
            info!("encoded the levels {levels:?} of outcome `{name}` as 0, 1, ...");
            (encoded, detected)
        },
    };

    let outcome_type = requested.unwrap_or(detected);
    if !outcome_type.admits(&values) {
        return Err(SuperLearnerError::config(format!(
            "outcome `{name}` has values that are invalid for a {outcome_type} outcome"
        )));
    }
    Ok((values, outcome_type))
}


fn check_unique(covariates: &[Column], outcome: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for column in covariates {
        if column.name() == outcome || !seen.insert(column.name()) {
            return Err(SuperLearnerError::config(format!(
                "the derived covariate `{}` collides with another column",
                column.name()
            )));
        }
    }
    Ok(())
}
