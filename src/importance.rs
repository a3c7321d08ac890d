//! Permutation variable importance of a fitted super learner.
use colored::Colorize;
use log::debug;
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use std::fmt;

use crate::constants::{DEFAULT_SEED, FULL_WIDTH, PRINT_WIDTH};
use crate::error::{Result, SuperLearnerError};
use crate::loss::{Loss, LossFunction};
use crate::super_learner::FittedSuperLearner;
use crate::task::Task;


const NAME_WIDTH: usize = 24;


/// How the permuted risk is compared with the original one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportanceKind {
    /// `permuted risk - risk`.
    #[default]
    Difference,
    /// `permuted risk / risk`.
    Ratio,
}


/// Options of [`permutation_importance`].
///
/// # Example
/// ```no_run
/// use superlearner::prelude::*;
///
/// let options = ImportanceOptions::new()
///     .n_repeats(10)
///     .seed(777)
///     .kind(ImportanceKind::Ratio)
///     .group("age", ["age", "delta_age"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceOptions {
    n_repeats: usize,
    seed: u64,
    kind: ImportanceKind,
    loss: Option<Loss>,
    groups: Vec<(String, Vec<String>)>,
}


impl ImportanceOptions {
    /// Construct the default options:
    /// one permutation per covariate, seed `1234`,
    /// and the loss of the fit.
    pub fn new() -> Self {
        Self {
            n_repeats: 1,
            seed: DEFAULT_SEED,
            kind: ImportanceKind::Difference,
            loss: None,
            groups: Vec::new(),
        }
    }


    /// Set the number of permutations per covariate. Default is `1`.
    pub fn n_repeats(mut self, n_repeats: usize) -> Self {
        self.n_repeats = n_repeats;
        self
    }


    /// Set the seed of the permutations. Default is `1234`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }


    /// Set the importance measure.
    /// Default is [`ImportanceKind::Difference`].
    pub fn kind(mut self, kind: ImportanceKind) -> Self {
        self.kind = kind;
        self
    }


    /// Set the loss. By default, the loss of the fit is used.
    pub fn loss(mut self, loss: Loss) -> Self {
        self.loss = Some(loss);
        self
    }


    /// Add a group of covariates permuted jointly, with one permutation.
    /// If any group is given, only the groups are evaluated.
    pub fn group<S, I, T>(mut self, name: S, covariates: I) -> Self
        where S: Into<String>,
              I: IntoIterator<Item = T>,
              T: Into<String>,
    {
        let covariates = covariates.into_iter().map(T::into).collect();
        self.groups.push((name.into(), covariates));
        self
    }
}


impl Default for ImportanceOptions {
    fn default() -> Self {
        Self::new()
    }
}


/// A row of [`ImportanceTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceEntry {
    /// Name of the covariate or the group.
    pub covariate: String,
    /// Mean importance over the permutations.
    pub importance: f64,
    /// Mean risk of the permuted tasks.
    pub permuted_risk: f64,
    /// Standard deviation of the importance over the permutations.
    pub sd: f64,
}


/// Importance of each covariate, sorted by decreasing importance.
/// Negative importances are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceTable {
    kind: ImportanceKind,
    loss: String,
    risk: f64,
    entries: Vec<ImportanceEntry>,
}


impl ImportanceTable {
    /// Returns the importance measure.
    pub fn kind(&self) -> ImportanceKind {
        self.kind
    }


    /// Returns the risk on the original task.
    pub fn risk(&self) -> f64 {
        self.risk
    }


    /// Returns the entries, sorted by decreasing importance.
    pub fn entries(&self) -> &[ImportanceEntry] {
        &self.entries[..]
    }


    /// Returns the importance of `covariate`.
    pub fn importance_of(&self, covariate: &str) -> Option<f64> {
        self.entries.iter()
            .find(|e| e.covariate == covariate)
            .map(|e| e.importance)
    }


    /// Serialize this table to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}


impl fmt::Display for ImportanceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let measure = match self.kind {
            ImportanceKind::Difference => "RISK DIFFERENCE",
            ImportanceKind::Ratio => "RISK RATIO",
        };
        let title = format!("PERMUTATION IMPORTANCE ({measure}, {})", self.loss);
        writeln!(
            f,
            "{:=>FULL_WIDTH$}\n{:^FULL_WIDTH$}\n{:->FULL_WIDTH$}",
            "", title.bold(), "",
        )?;
        writeln!(
            f,
            "  {:<NAME_WIDTH$}{:>PRINT_WIDTH$}  {:>PRINT_WIDTH$}  {:>PRINT_WIDTH$}",
            "COVARIATE".bold().red(),
            "IMPORT.".bold().blue(),
            "S.D.".bold().green(),
            "RISK".bold().yellow(),
        )?;
        for entry in &self.entries {
            writeln!(
                f,
                "  {:<NAME_WIDTH$}{:>PRINT_WIDTH$.5}  {:>PRINT_WIDTH$.5}  {:>PRINT_WIDTH$.5}",
                entry.covariate,
                entry.importance,
                entry.sd,
                entry.permuted_risk,
            )?;
        }
        write!(f, "{:=>FULL_WIDTH$}", "")
    }
}


/// Permutation importance of the covariates of `task` for `fit`.
///
/// For each covariate (or group of covariates),
/// the values are shuffled across rows with the other columns fixed,
/// and the fitted ensemble predicts the permuted task without retraining.
/// The importance is the mean, over the permutations,
/// of the risk difference (or ratio) to the original risk.
///
/// The `r`-th permutation of the `g`-th covariate uses the seed
/// `seed + g * n_repeats + r`, so the table is deterministic.
pub fn permutation_importance(
    fit: &FittedSuperLearner,
    task: &Task,
    options: &ImportanceOptions,
) -> Result<ImportanceTable>
{
    if options.n_repeats == 0 {
        return Err(SuperLearnerError::config(
            "permutation importance needs at least one repeat"
        ));
    }
    let loss = options.loss.unwrap_or(fit.loss());
    let target = task.outcome();
    let weights = task.weights();
    let risk_of = |predictions: &[f64]| {
        loss.weighted_eval(predictions, &target, &weights)
    };

    let risk = risk_of(&fit.predict(task)?);
    if options.kind == ImportanceKind::Ratio && risk == 0f64 {
        return Err(SuperLearnerError::config(
            "the risk ratio is undefined for a zero risk"
        ));
    }

    let groups = if options.groups.is_empty() {
        task.covariate_names()
            .into_iter()
            .map(|name| (name.to_string(), vec![name.to_string()]))
            .collect::<Vec<_>>()
    } else {
        options.groups.clone()
    };
    for (_, covariates) in &groups {
        if let Some(unknown) = covariates.iter().find(|c| task.covariate_index(c).is_none()) {
            return Err(SuperLearnerError::config(format!(
                "unknown covariate `{unknown}`"
            )));
        }
    }

    let n_rows = task.n_rows();
    let n_repeats = options.n_repeats;
    let mut entries = groups.par_iter()
        .enumerate()
        .map(|(g, (name, covariates))| {
            let mut permuted_risks = Vec::with_capacity(n_repeats);
            for r in 0..n_repeats {
                let seed = options.seed
                    .wrapping_add((g * n_repeats + r) as u64);
                let mut rng = StdRng::seed_from_u64(seed);
                let mut permutation = (0..n_rows).collect::<Vec<_>>();
                permutation.shuffle(&mut rng);

                let mut permuted = task.clone();
                for covariate in covariates {
                    let j = permuted.covariate_index(covariate)
                        .ok_or_else(|| SuperLearnerError::config(format!(
                            "unknown covariate `{covariate}`"
                        )))?;
                    let values = permuted.column_values(j);
                    let shuffled = permutation.iter()
                        .map(|&i| values[i])
                        .collect();
                    permuted = permuted.with_column_replaced(covariate, shuffled)?;
                }
                permuted_risks.push(risk_of(&fit.predict(&permuted)?));
            }

            let scores = permuted_risks.iter()
                .map(|&p| match options.kind {
                    ImportanceKind::Difference => p - risk,
                    ImportanceKind::Ratio => p / risk,
                })
                .collect::<Vec<_>>();
            let k = n_repeats as f64;
            let importance = scores.iter().sum::<f64>() / k;
            let sd = if n_repeats > 1 {
                (scores.iter().map(|s| (s - importance).powi(2)).sum::<f64>() / (k - 1f64))
                    .sqrt()
            } else {
                0f64
            };
            debug!("importance of `{name}`: {importance:.6}");

            Ok(ImportanceEntry {
                covariate: name.clone(),
                importance,
                permuted_risk: permuted_risks.iter().sum::<f64>() / k,
                sd,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // Stable, so ties keep the covariate order.
    entries.sort_by(|a, b| b.importance.total_cmp(&a.importance));

    Ok(ImportanceTable {
        kind: options.kind,
        loss: loss.to_string(),
        risk,
        entries,
    })
}
