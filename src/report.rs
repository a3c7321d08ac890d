//! Summary of a fitted super learner,
//! printable as a colored table and serializable to JSON.
use colored::Colorize;
use serde::{Serialize, Deserialize};

use std::fmt;

use crate::constants::{FULL_WIDTH, PRINT_WIDTH};
use crate::cross_validation::{CvRiskTable, DroppedLearner};
use crate::error::Result;
use crate::learner::FittedLearner;
use crate::super_learner::FittedSuperLearner;


const STAT_WIDTH: usize = 30;
const NAME_WIDTH: usize = 20;


/// A learner of the ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerSummary {
    /// Name of the learner.
    pub name: String,
    /// Metalearner weight.
    pub weight: f64,
    /// Cross-validated risk.
    pub cv_risk: f64,
    /// Standard error of the cross-validated risk.
    pub standard_error: f64,
    /// Coefficients of the learner trained on the whole task, if any.
    pub coefficients: Option<Vec<(String, f64)>>,
}


/// Summary of a [`FittedSuperLearner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperLearnerReport {
    /// Name of the super learner.
    pub name: String,
    /// Name of the outcome.
    pub outcome: String,
    /// Outcome type.
    pub outcome_type: String,
    /// Loss function.
    pub loss: String,
    /// Metalearner.
    pub metalearner: String,
    /// Number of rows of the training task.
    pub n_rows: usize,
    /// Number of folds.
    pub n_folds: usize,
    /// Name of the discrete selector.
    pub discrete_selector: String,
    /// Learners of the ensemble, in declaration order.
    pub learners: Vec<LearnerSummary>,
    /// Learners dropped during the fit.
    pub dropped: Vec<DroppedLearner>,
    /// Cross-validated risk table.
    pub risk_table: CvRiskTable,
}


impl SuperLearnerReport {
    pub(crate) fn new(fit: &FittedSuperLearner) -> Self {
        let risk_table = fit.risk_table().clone();
        let learners = fit.learner_names()
            .iter()
            .zip(fit.weights())
            .zip(risk_table.entries())
            .zip(fit.fitted_stack().fitted())
            .map(|(((name, &weight), entry), fitted)| {
                LearnerSummary {
                    name: name.clone(),
                    weight,
                    cv_risk: entry.risk,
                    standard_error: entry.standard_error,
                    coefficients: fitted.coefficients(),
                }
            })
            .collect();

        Self {
            name: fit.name().to_string(),
            outcome: fit.outcome_name().to_string(),
            outcome_type: fit.outcome_type().to_string(),
            loss: fit.loss().to_string(),
            metalearner: fit.metalearner_kind().to_string(),
            n_rows: fit.n_rows(),
            n_folds: fit.n_folds(),
            discrete_selector: fit.discrete_selector().to_string(),
            learners,
            dropped: fit.dropped().to_vec(),
            risk_table,
        }
    }


    /// Serialize this report to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}


impl fmt::Display for SuperLearnerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:=>FULL_WIDTH$}\n{:^FULL_WIDTH$}\n{:->FULL_WIDTH$}",
            "", "REPORT".bold(), "",
        )?;
        let stats = [
            ("Ensemble", self.name.clone()),
            ("Outcome", format!("{} ({})", self.outcome, self.outcome_type)),
            ("# of rows", format!("{}", self.n_rows)),
            ("# of folds", format!("{}", self.n_folds)),
            ("Loss", self.loss.clone()),
            ("Metalearner", self.metalearner.clone()),
            ("Discrete selector", self.discrete_selector.clone()),
        ];
        for (key, val) in stats {
            writeln!(
                f,
                "+ {:<STAT_WIDTH$}\t{:>STAT_WIDTH$}",
                key.bold(),
                val.bold().green(),
            )?;
        }

        writeln!(f, "{:->FULL_WIDTH$}", "")?;
        writeln!(
            f,
            "  {:<NAME_WIDTH$}{:>PRINT_WIDTH$}  {:>PRINT_WIDTH$}  {:>PRINT_WIDTH$}",
            "LEARNER".bold().red(),
            "WEIGHT".bold().blue(),
            "CV RISK".bold().green(),
            "S.E.".bold().yellow(),
        )?;
        for learner in &self.learners {
            writeln!(
                f,
                "  {:<NAME_WIDTH$}{:>PRINT_WIDTH$.4}  {:>PRINT_WIDTH$.5}  {:>PRINT_WIDTH$.5}",
                learner.name,
                learner.weight,
                learner.cv_risk,
                learner.standard_error,
            )?;
        }

        if !self.dropped.is_empty() {
            writeln!(f, "{:->FULL_WIDTH$}", "")?;
            for dropped in &self.dropped {
                writeln!(
                    f,
                    "  {} {}: {}",
                    "DROPPED".bold().red(),
                    dropped.learner,
                    dropped.reason,
                )?;
            }
        }
        write!(f, "{:=>FULL_WIDTH$}", "")
    }
}
