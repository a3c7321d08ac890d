use log::info;
use rayon::prelude::*;

use super::SuperLearner;
use crate::constants::{DISCRETE_NAME, ENSEMBLE_NAME};
use crate::cross_validation::CvRiskTable;
use crate::error::{Result, SuperLearnerError};
use crate::learner::PredictionMatrix;
use crate::task::Task;


/// The output of [`SuperLearner::nested_cv`].
#[derive(Debug, Clone)]
pub struct NestedCvResult {
    predictions: PredictionMatrix,
    fold_of_row: Vec<usize>,
    risk_table: CvRiskTable,
}


impl NestedCvResult {
    /// Returns the outer out-of-fold predictions
    /// of the ensemble, the discrete selector, and the learners.
    pub fn predictions(&self) -> &PredictionMatrix {
        &self.predictions
    }


    /// Returns the position of the outer fold that validated each row.
    pub fn fold_of_row(&self) -> &[usize] {
        &self.fold_of_row[..]
    }


    /// Returns the outer cross-validated risk of
    /// the ensemble, the discrete selector, and the learners.
    pub fn risk_table(&self) -> &CvRiskTable {
        &self.risk_table
    }


    /// Returns the outer cross-validated risk of the ensemble.
    pub fn ensemble_risk(&self) -> Option<f64> {
        self.risk_table.risk_of(ENSEMBLE_NAME)
    }
}


impl SuperLearner {
    /// Estimate the risk of the whole procedure by nested cross-validation.
    ///
    /// For each fold of `task`, the super learner is fit on the training rows
    /// (with a fold plan regenerated on them)
    /// and predicts the validation rows.
    /// The ensemble, the discrete selector, and each learner
    /// are evaluated on these outer out-of-fold predictions.
    /// A learner dropped in some outer fold is left out of the table.
    pub fn nested_cv(&self, task: &Task) -> Result<NestedCvResult> {
        let folds = task.folds();
        if folds.is_empty() {
            return Err(SuperLearnerError::config(
                "nested cross-validation needs a task with a fold plan"
            ));
        }
        let loss = self.loss_for(task);

        let outer = folds.par_iter()
            .map(|fold| {
                let train = task.subset(fold.training())?;
                if train.folds().is_empty() {
                    return Err(SuperLearnerError::config(format!(
                        "the training set of outer fold {} is too small \
                        for an inner fold plan",
                        fold.fold_id()
                    )));
                }
                let valid = task.view(fold.validation())?;

                let fit = self.fit(&train)?;
                let ensemble = fit.predict(&valid)?;
                let discrete = fit.predict_discrete(&valid)?;
                let learners = fit.predict_learners(&valid)?;
                Ok((ensemble, discrete, learners))
            })
            .collect::<Result<Vec<_>>>()?;

        // Learners present in every outer fit, in declaration order.
        let names = self.stack.learner_names()
            .iter()
            .filter(|name| {
                outer.iter()
                    .all(|(_, _, learners)| learners.column_by_name(name).is_some())
            })
            .cloned()
            .collect::<Vec<_>>();

        let n_rows = task.n_rows();
        let mut columns = vec![vec![f64::NAN; n_rows]; names.len() + 2];
        let mut fold_of_row = vec![0_usize; n_rows];
        for (k, (fold, (ensemble, discrete, learners))) in folds.iter()
            .zip(&outer)
            .enumerate()
        {
            for (pos, &row) in fold.validation().iter().enumerate() {
                columns[0][row] = ensemble[pos];
                columns[1][row] = discrete[pos];
                for (j, name) in names.iter().enumerate() {
                    if let Some(column) = learners.column_by_name(name) {
                        columns[j + 2][row] = column[pos];
                    }
                }
                fold_of_row[row] = k;
            }
        }

        let mut all_names = vec![ENSEMBLE_NAME.to_string(), DISCRETE_NAME.to_string()];
        all_names.extend(names);
        let predictions = PredictionMatrix::new(all_names, columns);
        let risk_table = CvRiskTable::from_predictions(
            &loss, task, &predictions, &fold_of_row
        );
        if let Some(risk) = risk_table.risk_of(ENSEMBLE_NAME) {
            info!("nested cross-validated risk of `{}`: {risk:.6}", self.name);
        }

        Ok(NestedCvResult { predictions, fold_of_row, risk_table, })
    }
}
