use fixedbitset::FixedBitSet;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Serialize, Deserialize};

use std::collections::BTreeMap;

use super::outcome::OutcomeType;
use crate::common::checker;
use crate::constants::DEFAULT_N_FOLDS;
use crate::error::{Result, SuperLearnerError};


/// One fold of a cross-validation plan.
/// Row ids are positions within the task, sorted in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldAssignment {
    fold_id: usize,
    training: Vec<usize>,
    validation: Vec<usize>,
}


impl FoldAssignment {
    /// Construct a new fold.
    pub fn new(fold_id: usize, mut training: Vec<usize>, mut validation: Vec<usize>)
        -> Self
    {
        training.sort_unstable();
        validation.sort_unstable();
        Self { fold_id, training, validation, }
    }


    /// Construct the fold that validates `validation`
    /// and trains on every other row.
    pub fn from_validation(fold_id: usize, validation: Vec<usize>, n_rows: usize)
        -> Self
    {
        let mut mask = FixedBitSet::with_capacity(n_rows);
        validation.iter()
            .filter(|&&i| i < n_rows)
            .for_each(|&i| mask.insert(i));
        let training = (0..n_rows).filter(|&i| !mask.contains(i)).collect();
        Self::new(fold_id, training, validation)
    }


    /// Returns the fold id.
    #[inline]
    pub fn fold_id(&self) -> usize {
        self.fold_id
    }


    /// Returns the training row ids.
    #[inline]
    pub fn training(&self) -> &[usize] {
        &self.training[..]
    }


    /// Returns the validation row ids.
    #[inline]
    pub fn validation(&self) -> &[usize] {
        &self.validation[..]
    }


    /// Returns the validation rows as a bit set over `n_rows` rows.
    pub fn validation_mask(&self, n_rows: usize) -> Result<FixedBitSet> {
        mask(self.fold_id, &self.validation, n_rows)
    }


    /// Returns the training rows as a bit set over `n_rows` rows.
    pub fn training_mask(&self, n_rows: usize) -> Result<FixedBitSet> {
        mask(self.fold_id, &self.training, n_rows)
    }
}


fn mask(fold_id: usize, rows: &[usize], n_rows: usize) -> Result<FixedBitSet> {
    let mut bits = FixedBitSet::with_capacity(n_rows);
    for &i in rows {
        if i >= n_rows {
            return Err(SuperLearnerError::config(format!(
                "fold {fold_id} refers to row {i}, but the task has {n_rows} rows"
            )));
        }
        bits.insert(i);
    }
    Ok(bits)
}


/// The way a fold plan is generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldStrategy {
    /// Random partition into `V` folds of (almost) equal size.
    VFold(usize),
    /// Random partition into `V` folds that keeps
    /// the class proportions of a discrete outcome in every fold.
    /// A continuous outcome falls back to [`FoldStrategy::VFold`].
    Stratified(usize),
    /// One fold per row (or per cluster).
    LeaveOneOut,
    /// A caller supplied plan.
    Explicit(Vec<FoldAssignment>),
}


impl Default for FoldStrategy {
    fn default() -> Self {
        Self::Stratified(DEFAULT_N_FOLDS)
    }
}


impl FoldStrategy {
    /// Returns the strategy used to regenerate folds
    /// on a subset of the rows.
    /// An explicit plan cannot be carried over,
    /// so the subset gets a random plan with the same number of folds.
    pub(crate) fn for_subset(&self) -> Self {
        match self {
            Self::Explicit(folds) => Self::VFold(folds.len()),
            other => other.clone(),
        }
    }


    /// Generate the fold plan for `n_rows` rows.
    ///
    /// If `clusters` is given, rows sharing a cluster
    /// are always validated in the same fold.
    pub(crate) fn make_folds(
        &self,
        outcome: &[f64],
        outcome_type: OutcomeType,
        clusters: Option<&[usize]>,
        seed: u64,
    ) -> Result<Vec<FoldAssignment>>
    {
        let n_rows = outcome.len();
        let units = units(n_rows, clusters);
        let n_units = units.len();

        let groups = match self {
            Self::VFold(v) => {
                check_fold_count(*v, n_units)?;
                v_fold(n_units, *v, seed)
            },
            Self::Stratified(v) => {
                check_fold_count(*v, n_units)?;
                if outcome_type.is_discrete() {
                    let strata = units.iter()
                        .map(|rows| outcome[rows[0]])
                        .collect::<Vec<_>>();
                    stratified(&strata, *v, seed)
                } else {
                    v_fold(n_units, *v, seed)
                }
            },
            Self::LeaveOneOut => {
                check_fold_count(n_units, n_units)?;
                (0..n_units).map(|u| vec![u]).collect()
            },
            Self::Explicit(folds) => {
                checker::fold_partition(folds, n_rows)?;
                return Ok(folds.clone());
            },
        };

        let folds = groups.into_iter()
            .enumerate()
            .map(|(k, group)| {
                let validation = group.into_iter()
                    .flat_map(|u| units[u].iter().copied())
                    .collect();
                FoldAssignment::from_validation(k, validation, n_rows)
            })
            .collect::<Vec<_>>();

        checker::fold_partition(&folds, n_rows)?;
        Ok(folds)
    }
}


fn check_fold_count(v: usize, n_units: usize) -> Result<()> {
    if v < 2 {
        return Err(SuperLearnerError::config(format!(
            "the number of folds must be at least 2, got {v}"
        )));
    }
    if v > n_units {
        return Err(SuperLearnerError::config(format!(
            "cannot split {n_units} rows (or clusters) into {v} folds"
        )));
    }
    Ok(())
}


/// Group the rows into the units that are assigned to folds.
/// Without clusters, each row is a unit.
fn units(n_rows: usize, clusters: Option<&[usize]>) -> Vec<Vec<usize>> {
    match clusters {
        None => (0..n_rows).map(|i| vec![i]).collect(),
        Some(clusters) => {
            let mut map = BTreeMap::<usize, Vec<usize>>::new();
            for (i, &c) in clusters.iter().enumerate() {
                map.entry(c).or_default().push(i);
            }
            map.into_values().collect()
        },
    }
}


/// Shuffle the units and cut them into `v` consecutive chunks.
/// The first `n % v` chunks get one extra unit.
fn v_fold(n_units: usize, v: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices = (0..n_units).collect::<Vec<_>>();
    indices.shuffle(&mut rng);

    let base = n_units / v;
    let remainder = n_units % v;

    let mut groups = Vec::with_capacity(v);
    let mut start = 0;
    for k in 0..v {
        let size = base + usize::from(k < remainder);
        groups.push(indices[start..start + size].to_vec());
        start += size;
    }
    groups
}


/// Shuffle the units of each stratum and deal them to the folds in turn.
/// The dealing continues across strata so that fold sizes stay balanced.
fn stratified(strata: &[f64], v: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut by_class = BTreeMap::<i64, Vec<usize>>::new();
    for (u, &y) in strata.iter().enumerate() {
        by_class.entry(y as i64).or_default().push(u);
    }

    let mut groups = vec![Vec::new(); v];
    let mut position = 0;
    for (_, mut indices) in by_class {
        indices.shuffle(&mut rng);
        for u in indices {
            groups[position % v].push(u);
            position += 1;
        }
    }
    groups
}


#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(folds: &[FoldAssignment], n_rows: usize) {
        let mut seen = vec![0; n_rows];
        for fold in folds {
            for &i in fold.validation() {
                seen[i] += 1;
            }
            assert_eq!(fold.training().len() + fold.validation().len(), n_rows);
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_v_fold_sizes() {
        let outcome = vec![0.5; 23];
        let folds = FoldStrategy::VFold(5)
            .make_folds(&outcome, OutcomeType::Continuous, None, 1234)
            .unwrap();
        let sizes = folds.iter()
            .map(|f| f.validation().len())
            .collect::<Vec<_>>();
        assert_eq!(sizes, vec![5, 5, 5, 4, 4]);
        assert_partition(&folds, 23);
    }

    #[test]
    fn test_stratified_keeps_classes_balanced() {
        let outcome = (0..40).map(|i| if i < 10 { 1.0 } else { 0.0 })
            .collect::<Vec<_>>();
        let folds = FoldStrategy::Stratified(5)
            .make_folds(&outcome, OutcomeType::Binary, None, 7)
            .unwrap();
        assert_partition(&folds, 40);
        for fold in &folds {
            let positives = fold.validation()
                .iter()
                .filter(|&&i| outcome[i] == 1.0)
                .count();
            assert_eq!(positives, 2);
        }
    }

    #[test]
    fn test_clusters_stay_together() {
        let outcome = vec![0.0; 12];
        let clusters = vec![0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5];
        let folds = FoldStrategy::VFold(3)
            .make_folds(&outcome, OutcomeType::Continuous, Some(&clusters), 1)
            .unwrap();
        assert_partition(&folds, 12);
        for fold in &folds {
            for &i in fold.validation() {
                let partner = if i % 2 == 0 { i + 1 } else { i - 1 };
                assert!(fold.validation().contains(&partner));
            }
        }
    }

    #[test]
    fn test_leave_one_out() {
        let outcome = vec![1.0, 2.0, 3.0];
        let folds = FoldStrategy::LeaveOneOut
            .make_folds(&outcome, OutcomeType::Continuous, None, 0)
            .unwrap();
        assert_eq!(folds.len(), 3);
        assert_partition(&folds, 3);
    }

    #[test]
    fn test_too_many_folds() {
        let outcome = vec![1.0, 2.0, 3.0];
        let result = FoldStrategy::VFold(4)
            .make_folds(&outcome, OutcomeType::Continuous, None, 0);
        assert!(result.is_err());
        let result = FoldStrategy::VFold(1)
            .make_folds(&outcome, OutcomeType::Continuous, None, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_same_seed_same_folds() {
        let outcome = vec![0.0; 30];
        let a = FoldStrategy::VFold(3)
            .make_folds(&outcome, OutcomeType::Continuous, None, 99)
            .unwrap();
        let b = FoldStrategy::VFold(3)
            .make_folds(&outcome, OutcomeType::Continuous, None, 99)
            .unwrap();
        assert_eq!(a, b);
    }
}
