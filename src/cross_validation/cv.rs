use colored::Colorize;
use log::{info, warn};
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use super::risk::CvRiskTable;
use crate::constants::PRINT_WIDTH;
use crate::error::{Result, SuperLearnerError};
use crate::learner::{Learner, PredictionMatrix, Stack};
use crate::loss::LossFunction;
use crate::task::{FoldAssignment, Task};


/// Options of [`cross_validate`].
///
/// # Example
/// ```no_run
/// use superlearner::prelude::*;
///
/// let options = CvOptions::new()
///     .drop_failed_learners(true)
///     .verbose(true);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvOptions {
    drop_failed_learners: bool,
    parallel: bool,
    verbose: bool,
}


impl CvOptions {
    /// Construct the default options.
    pub fn new() -> Self {
        Self {
            drop_failed_learners: false,
            parallel: true,
            verbose: false,
        }
    }


    /// If `true`, a learner that fails in some fold
    /// is removed from every fold instead of aborting the computation.
    /// Default is `false`.
    pub fn drop_failed_learners(mut self, flag: bool) -> Self {
        self.drop_failed_learners = flag;
        self
    }


    /// Set the flag whether the folds are processed in parallel.
    /// Default is `true`.
    pub fn parallel(mut self, flag: bool) -> Self {
        self.parallel = flag;
        self
    }


    /// If `true`, prints the progress of each fold.
    /// Default is `false`.
    pub fn verbose(mut self, flag: bool) -> Self {
        self.verbose = flag;
        self
    }


    /// Returns the drop policy.
    pub fn drops_failed_learners(&self) -> bool {
        self.drop_failed_learners
    }


    /// Returns `true` if the folds are processed in parallel.
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }


    /// Returns `true` if the progress is printed.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}


impl Default for CvOptions {
    fn default() -> Self {
        Self::new()
    }
}


/// A learner removed from the computation under the drop policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedLearner {
    /// Name of the learner.
    pub learner: String,
    /// The error that caused the removal.
    pub reason: String,
}


/// The output of [`cross_validate`].
#[derive(Debug, Clone)]
pub struct CvResult {
    oof: PredictionMatrix,
    fold_of_row: Vec<usize>,
    risk_table: CvRiskTable,
    kept: Vec<usize>,
    dropped: Vec<DroppedLearner>,
}


impl CvResult {
    /// Returns the out-of-fold predictions (rows × kept learners).
    pub fn oof(&self) -> &PredictionMatrix {
        &self.oof
    }


    /// Returns the position, in [`Task::folds`],
    /// of the fold that produced the out-of-fold prediction of each row.
    pub fn fold_of_row(&self) -> &[usize] {
        &self.fold_of_row[..]
    }


    /// Returns the cross-validated risk of the kept learners.
    pub fn risk_table(&self) -> &CvRiskTable {
        &self.risk_table
    }


    /// Returns the names of the kept learners.
    pub fn names(&self) -> &[String] {
        self.oof.names()
    }


    /// Returns the positions of the kept learners in the stack.
    pub fn kept(&self) -> &[usize] {
        &self.kept[..]
    }


    /// Returns the dropped learners.
    pub fn dropped(&self) -> &[DroppedLearner] {
        &self.dropped[..]
    }
}


/// Compute the cross-validated risk of each learner of `stack`.
///
/// For each fold of `task`, a fold-local copy of the stack is trained
/// on the training rows and predicts the validation rows.
/// Since every row is validated exactly once,
/// every row gets exactly one out-of-fold prediction per learner.
/// The folds are processed in parallel.
///
/// Any failure aborts the computation,
/// unless [`CvOptions::drop_failed_learners`] is set.
pub fn cross_validate<L>(
    stack: &Stack,
    task: &Task,
    loss: &L,
    options: &CvOptions,
) -> Result<CvResult>
    where L: LossFunction + ?Sized,
{
    let folds = task.folds();
    if folds.is_empty() {
        return Err(SuperLearnerError::config(
            "cross-validation needs a task with a fold plan"
        ));
    }
    if stack.is_empty() {
        return Err(SuperLearnerError::config(format!(
            "stack `{}` has no learner", stack.name()
        )));
    }
    info!(
        "cross-validating {} learners over {} folds",
        stack.len(), folds.len()
    );

    let run = |(k, fold): (usize, &FoldAssignment)| {
        run_fold(stack, task, k, fold, options.verbose)
    };
    let per_fold = if options.parallel {
        folds.par_iter()
            .enumerate()
            .map(run)
            .collect::<Result<Vec<_>>>()?
    } else {
        folds.iter()
            .enumerate()
            .map(run)
            .collect::<Result<Vec<_>>>()?
    };

    let names = stack.learner_names();
    if !options.drop_failed_learners {
        // The first failing learner in declaration order.
        let failing = (0..names.len())
            .find(|&j| per_fold.iter().any(|predictions| predictions[j].is_err()));
        if let Some(j) = failing {
            let error = per_fold.into_iter()
                .find_map(|mut predictions| predictions.swap_remove(j).err())
                .unwrap_or_else(|| SuperLearnerError::training(
                    names[j].as_str(), "failed during cross-validation"
                ));
            return Err(error);
        }
    }

    let mut kept = Vec::with_capacity(names.len());
    let mut dropped = Vec::new();
    for (j, name) in names.iter().enumerate() {
        match per_fold.iter().find_map(|predictions| predictions[j].as_ref().err()) {
            None => { kept.push(j); },
            Some(error) => {
                let reason = error.to_string();
                warn!("dropped learner `{name}`: {reason}");
                dropped.push(DroppedLearner { learner: name.clone(), reason, });
            },
        }
    }

    if kept.is_empty() {
        return Err(SuperLearnerError::training(
            stack.name(), "every learner failed during cross-validation"
        ));
    }

    let n_rows = task.n_rows();
    let mut columns = vec![vec![f64::NAN; n_rows]; kept.len()];
    let mut fold_of_row = vec![0_usize; n_rows];
    for (k, (fold, predictions)) in folds.iter().zip(per_fold).enumerate() {
        for (column, &j) in columns.iter_mut().zip(&kept) {
            let Ok(values) = &predictions[j] else { continue; };
            for (&row, &p) in fold.validation().iter().zip(values) {
                column[row] = p;
            }
        }
        for &row in fold.validation() {
            fold_of_row[row] = k;
        }
    }

    let names = kept.iter().map(|&j| names[j].clone()).collect();
    let oof = PredictionMatrix::new(names, columns);
    let risk_table = CvRiskTable::from_predictions(loss, task, &oof, &fold_of_row);
    if let Some(best) = risk_table.discrete_selector() {
        info!("discrete selector: `{}` (risk {:.6})", best.learner, best.risk);
    }

    Ok(CvResult { oof, fold_of_row, risk_table, kept, dropped, })
}


/// Train the stack on the training rows of `fold`
/// and predict its validation rows.
/// The outer error is a failure of the fold itself;
/// the inner ones are the failures of each learner.
fn run_fold(
    stack: &Stack,
    task: &Task,
    k: usize,
    fold: &FoldAssignment,
    verbose: bool,
) -> Result<Vec<Result<Vec<f64>>>>
{
    let train = task.subset(fold.training())?;
    let valid = task.view(fold.validation())?;

    if verbose {
        println!(
            "{}    {}    {}",
            format!("  [{: >3}'th fold]", k + 1).bold().red(),
            format!("[TRAIN {:>PRINT_WIDTH$}]", train.n_rows()).bold().green(),
            format!("[TEST {:>PRINT_WIDTH$}]", valid.n_rows()).bold().yellow(),
        );
    }

    let predictions = stack.train_each(&train)
        .into_iter()
        .zip(stack.learner_names())
        .map(|(fitted, name)| {
            fitted?.predict(&valid)
                .map_err(|e| e.attributed_to(name))
        })
        .collect();
    Ok(predictions)
}
