//! This file defines some functions that checks some pre-conditions
//! E.g., fold plans and simplex weights.

use fixedbitset::FixedBitSet;

use crate::constants::SIMPLEX_TOLERANCE;
use crate::error::{Result, SuperLearnerError};
use crate::task::FoldAssignment;


/// Check whether the given folds form a V-fold partition of `n_rows` rows:
/// every row is validated exactly once and
/// the training set of each fold is the complement of its validation set.
pub(crate) fn fold_partition(folds: &[FoldAssignment], n_rows: usize)
    -> Result<()>
{
    if folds.len() < 2 {
        return Err(SuperLearnerError::config(format!(
            "a fold plan needs at least 2 folds, got {}", folds.len()
        )));
    }

    let mut validated = FixedBitSet::with_capacity(n_rows);
    for fold in folds {
        let validation = fold.validation_mask(n_rows)?;
        let training = fold.training_mask(n_rows)?;

        if validation.count_ones(..) != fold.validation().len()
            || training.count_ones(..) != fold.training().len()
        {
            return Err(SuperLearnerError::config(format!(
                "fold {} lists a row twice", fold.fold_id()
            )));
        }
        if fold.validation().is_empty() || fold.training().is_empty() {
            return Err(SuperLearnerError::config(format!(
                "fold {} has an empty training or validation set",
                fold.fold_id()
            )));
        }
        if !validation.is_disjoint(&training)
            || validation.count_ones(..) + training.count_ones(..) != n_rows
        {
            return Err(SuperLearnerError::config(format!(
                "training and validation rows of fold {} \
                do not partition the {n_rows} rows",
                fold.fold_id()
            )));
        }
        if !validated.is_disjoint(&validation) {
            return Err(SuperLearnerError::config(format!(
                "fold {} validates a row that another fold also validates",
                fold.fold_id()
            )));
        }
        validated.union_with(&validation);
    }

    let covered = validated.count_ones(..);
    if covered != n_rows {
        return Err(SuperLearnerError::config(format!(
            "validation sets cover {covered} of {n_rows} rows"
        )));
    }
    Ok(())
}


/// Returns `true` if `weights` is non-negative and sums up to `1`.
#[inline(always)]
pub(crate) fn simplex_condition(weights: &[f64]) -> bool {
    let sum = weights.iter().sum::<f64>();
    (sum - 1f64).abs() < SIMPLEX_TOLERANCE
        && weights.iter().all(|w| *w >= 0f64)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn folds(validations: &[&[usize]], n_rows: usize) -> Vec<FoldAssignment> {
        validations.iter()
            .enumerate()
            .map(|(k, valid)| {
                let training = (0..n_rows)
                    .filter(|i| !valid.contains(i))
                    .collect();
                FoldAssignment::new(k, training, valid.to_vec())
            })
            .collect()
    }

    #[test]
    fn test_partition_success() {
        let folds = folds(&[&[0, 2], &[1, 3], &[4]], 5);
        assert!(fold_partition(&folds, 5).is_ok());
    }

    #[test]
    fn test_partition_overlap() {
        let folds = folds(&[&[0, 2], &[2, 3], &[1, 4]], 5);
        assert!(fold_partition(&folds, 5).is_err());
    }

    #[test]
    fn test_partition_missing_row() {
        let folds = folds(&[&[0, 2], &[1, 3]], 5);
        assert!(fold_partition(&folds, 5).is_err());
    }

    #[test]
    fn test_simplex_condition() {
        assert!(simplex_condition(&[0.25, 0.75, 0.0]));
        assert!(!simplex_condition(&[0.5, 0.6]));
        assert!(!simplex_condition(&[1.5, -0.5]));
    }
}
