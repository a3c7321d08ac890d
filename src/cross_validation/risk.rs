use colored::Colorize;
use serde::{Serialize, Deserialize};

use std::fmt;

use crate::common::helpers;
use crate::constants::{FULL_WIDTH, PRINT_WIDTH};
use crate::learner::PredictionMatrix;
use crate::loss::LossFunction;
use crate::task::Task;


const NAME_WIDTH: usize = 20;


/// A row of [`CvRiskTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEntry {
    /// Name of the learner.
    pub learner: String,
    /// Cross-validated risk,
    /// the (weighted) mean loss of the out-of-fold predictions.
    pub risk: f64,
    /// Standard error of the risk.
    pub standard_error: f64,
    /// Mean of the per-fold risks.
    pub fold_mean: f64,
    /// Standard deviation of the per-fold risks.
    pub fold_sd: f64,
    /// Minimal per-fold risk.
    pub fold_min: f64,
    /// Maximal per-fold risk.
    pub fold_max: f64,
}


impl RiskEntry {
    /// An entry with the risk only.
    pub fn from_risk<S: Into<String>>(learner: S, risk: f64) -> Self {
        Self {
            learner: learner.into(),
            risk,
            standard_error: f64::NAN,
            fold_mean: f64::NAN,
            fold_sd: f64::NAN,
            fold_min: f64::NAN,
            fold_max: f64::NAN,
        }
    }


    /// Compute the entry of a learner from its predictions
    /// on every row of `task`.
    /// `fold_of_row[i]` is the fold that validated the `i`-th row.
    pub(crate) fn evaluate<L>(
        learner: &str,
        predictions: &[f64],
        task: &Task,
        loss: &L,
        fold_of_row: Option<&[usize]>,
    ) -> Self
        where L: LossFunction + ?Sized,
    {
        let target = task.outcome();
        let weights = task.weights();
        let pointwise = loss.pointwise(predictions, &target);

        let total = weights.iter().sum::<f64>();
        let risk = helpers::weighted_mean(&pointwise, &weights);
        let variance = pointwise.iter()
            .zip(&weights)
            .map(|(l, w)| w * (l - risk).powi(2))
            .sum::<f64>()
            / total;
        let standard_error = (variance / pointwise.len() as f64).sqrt();

        let mut entry = Self::from_risk(learner, risk);
        entry.standard_error = standard_error;

        let Some(fold_of_row) = fold_of_row else { return entry; };
        let n_folds = fold_of_row.iter().max().map_or(0, |f| f + 1);
        let mut sums = vec![(0f64, 0f64); n_folds];
        for ((&f, l), w) in fold_of_row.iter().zip(&pointwise).zip(&weights) {
            sums[f].0 += w * l;
            sums[f].1 += w;
        }
        let fold_risks = sums.into_iter()
            .filter(|(_, w)| *w > 0f64)
            .map(|(lw, w)| lw / w)
            .collect::<Vec<_>>();
        if fold_risks.is_empty() { return entry; }

        let k = fold_risks.len() as f64;
        let mean = fold_risks.iter().sum::<f64>() / k;
        let sd = if fold_risks.len() > 1 {
            (fold_risks.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (k - 1f64))
                .sqrt()
        } else {
            0f64
        };
        entry.fold_mean = mean;
        entry.fold_sd = sd;
        entry.fold_min = fold_risks.iter().copied().fold(f64::INFINITY, f64::min);
        entry.fold_max = fold_risks.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        entry
    }
}


/// The cross-validated risk of every learner of a stack.
/// Rows follow the declaration order of the learners.
///
/// # Example
/// ```
/// use superlearner::prelude::*;
///
/// let table = CvRiskTable::from_risks(
///     "squared error",
///     [("A", 0.5), ("B", 0.3), ("C", 0.3)],
/// );
/// let best = table.discrete_selector().unwrap();
/// assert_eq!(best.learner, "B");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvRiskTable {
    loss: String,
    entries: Vec<RiskEntry>,
}


impl CvRiskTable {
    /// Construct a risk table from its entries.
    pub fn new<S: Into<String>>(loss: S, entries: Vec<RiskEntry>) -> Self {
        Self { loss: loss.into(), entries, }
    }


    /// Construct a risk table from `(learner, risk)` pairs.
    pub fn from_risks<S, I, T>(loss: S, risks: I) -> Self
        where S: Into<String>,
              I: IntoIterator<Item = (T, f64)>,
              T: Into<String>,
    {
        let entries = risks.into_iter()
            .map(|(learner, risk)| RiskEntry::from_risk(learner, risk))
            .collect();
        Self::new(loss, entries)
    }


    /// Compute the risk table of the out-of-fold predictions.
    pub(crate) fn from_predictions<L>(
        loss: &L,
        task: &Task,
        oof: &PredictionMatrix,
        fold_of_row: &[usize],
    ) -> Self
        where L: LossFunction + ?Sized,
    {
        let entries = oof.names()
            .iter()
            .zip(oof.columns())
            .map(|(name, column)| {
                RiskEntry::evaluate(name, column, task, loss, Some(fold_of_row))
            })
            .collect();
        Self::new(loss.name(), entries)
    }


    /// Returns the table restricted to the entries at `keep`.
    pub(crate) fn select(&self, keep: &[usize]) -> Self {
        let entries = keep.iter()
            .map(|&k| self.entries[k].clone())
            .collect();
        Self::new(self.loss.clone(), entries)
    }


    /// Returns the name of the loss function.
    pub fn loss(&self) -> &str {
        &self.loss
    }


    /// Returns the entries.
    pub fn entries(&self) -> &[RiskEntry] {
        &self.entries[..]
    }


    /// Returns the number of learners.
    pub fn len(&self) -> usize {
        self.entries.len()
    }


    /// Returns `true` if the table has no entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }


    /// Returns the risks in the order of the entries.
    pub fn risks(&self) -> Vec<f64> {
        self.entries.iter()
            .map(|e| e.risk)
            .collect()
    }


    /// Returns the risk of the learner named `learner`.
    pub fn risk_of(&self, learner: &str) -> Option<f64> {
        self.entries.iter()
            .find(|e| e.learner == learner)
            .map(|e| e.risk)
    }


    /// Returns the position of the entry with the minimal risk.
    /// Ties are broken by the order of the entries.
    pub fn discrete_selector_index(&self) -> Option<usize> {
        helpers::argmin(&self.risks())
    }


    /// Returns the entry with the minimal risk.
    /// Ties are broken by the order of the entries.
    pub fn discrete_selector(&self) -> Option<&RiskEntry> {
        self.discrete_selector_index()
            .map(|k| &self.entries[k])
    }
}


impl fmt::Display for CvRiskTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = format!("CV RISK ({})", self.loss);
        writeln!(
            f,
            "{:=>FULL_WIDTH$}\n{:^FULL_WIDTH$}\n{:->FULL_WIDTH$}",
            "", title.bold(), "",
        )?;
        writeln!(
            f,
            "  {:<NAME_WIDTH$}{:>PRINT_WIDTH$}  {:>PRINT_WIDTH$}  {:>PRINT_WIDTH$}  {:>PRINT_WIDTH$}",
            "LEARNER".bold().red(),
            "RISK".bold().blue(),
            "S.E.".bold().green(),
            "FOLD MIN".bold().yellow(),
            "FOLD MAX".bold().cyan(),
        )?;

        let best = self.discrete_selector_index();
        for (k, entry) in self.entries.iter().enumerate() {
            let mark = if Some(k) == best { "*" } else { " " };
            writeln!(
                f,
                "{mark} {:<NAME_WIDTH$}{:>PRINT_WIDTH$.5}  {:>PRINT_WIDTH$.5}  {:>PRINT_WIDTH$.5}  {:>PRINT_WIDTH$.5}",
                entry.learner,
                entry.risk,
                entry.standard_error,
                entry.fold_min,
                entry.fold_max,
            )?;
        }
        write!(f, "{:=>FULL_WIDTH$}", "")
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tie_wins() {
        let table = CvRiskTable::from_risks(
            "squared error",
            [("A", 0.5), ("B", 0.3), ("C", 0.3)],
        );
        assert_eq!(table.discrete_selector_index(), Some(1));
        assert_eq!(table.risk_of("C"), Some(0.3));
        assert!(table.risk_of("D").is_none());
    }

    #[test]
    fn test_empty_table_has_no_selector() {
        let table = CvRiskTable::from_risks("squared error", Vec::<(String, f64)>::new());
        assert!(table.discrete_selector().is_none());
    }
}
