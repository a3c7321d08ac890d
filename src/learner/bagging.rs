use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use super::core::{self, Capabilities, FittedLearner, Learner};
use super::tree::{FittedTree, RegressionTree};
use crate::constants::{DEFAULT_N_TREES, DEFAULT_SEED};
use crate::error::{Result, SuperLearnerError};
use crate::task::Task;


/// Bootstrap aggregation of [`RegressionTree`]s.
///
/// The `b`-th tree is grown on a bootstrap sample drawn with
/// the seed `seed + b`, so the ensemble is deterministic for a fixed seed.
/// The trees are grown in parallel.
///
/// # Example
/// ```no_run
/// use superlearner::prelude::*;
///
/// let learner = BaggedTrees::new()
///     .n_trees(100)
///     .seed(7)
///     .tree(RegressionTree::new().max_depth(4));
/// ```
#[derive(Debug, Clone)]
pub struct BaggedTrees {
    name: String,
    n_trees: usize,
    seed: u64,
    tree: RegressionTree,
}


impl BaggedTrees {
    /// Construct a new instance of [`BaggedTrees`].
    pub fn new() -> Self {
        Self {
            name: "bagged_trees".to_string(),
            n_trees: DEFAULT_N_TREES,
            seed: DEFAULT_SEED,
            tree: RegressionTree::new(),
        }
    }


    /// Set the name of this learner.
    pub fn label<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }


    /// Set the number of trees. Default is `50`.
    pub fn n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }


    /// Set the seed of the bootstrap samples. Default is `1234`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }


    /// Set the hyperparameters of each tree.
    pub fn tree(mut self, tree: RegressionTree) -> Self {
        self.tree = tree;
        self
    }
}


impl Default for BaggedTrees {
    fn default() -> Self {
        Self::new()
    }
}


impl Learner for BaggedTrees {
    fn name(&self) -> &str {
        &self.name
    }


    fn info(&self) -> Option<Vec<(&str, String)>> {
        let mut info = Vec::from([
            ("# of trees", format!("{}", self.n_trees)),
            ("Seed", format!("{}", self.seed)),
        ]);
        info.extend(self.tree.info().unwrap_or_default());
        Some(info)
    }


    fn capabilities(&self) -> Capabilities {
        self.tree.capabilities()
    }


    fn train(&self, task: &Task) -> Result<Box<dyn FittedLearner>> {
        self.capabilities().check(&self.name, task)?;
        if self.n_trees == 0 {
            return Err(SuperLearnerError::config(format!(
                "learner `{}` needs at least one tree", self.name
            )));
        }

        let n_rows = task.n_rows();
        if n_rows == 0 {
            return Err(SuperLearnerError::training(
                self.name.as_str(), "the task has no row"
            ));
        }
        let trees = (0..self.n_trees)
            .into_par_iter()
            .map(|b| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(b as u64));
                let bootstrap = (0..n_rows)
                    .map(|_| rng.gen_range(0..n_rows))
                    .collect::<Vec<_>>();
                let sample = task.view(&bootstrap)?;
                self.tree.fit(&sample)
            })
            .collect::<Result<Vec<_>>>()
            .map_err(|e| e.attributed_to(&self.name))?;

        let fitted = FittedBagging {
            name: self.name.clone(),
            covariates: core::covariate_names(task),
            trees,
        };
        Ok(Box::new(fitted))
    }
}


/// Fitted [`BaggedTrees`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedBagging {
    name: String,
    covariates: Vec<String>,
    trees: Vec<FittedTree>,
}


impl FittedBagging {
    /// Returns the fitted trees.
    pub fn trees(&self) -> &[FittedTree] {
        &self.trees[..]
    }
}


impl FittedLearner for FittedBagging {
    fn name(&self) -> &str {
        &self.name
    }


    fn predict(&self, task: &Task) -> Result<Vec<f64>> {
        let columns = core::resolve_covariates(&self.name, task, &self.covariates)?;
        let n_trees = self.trees.len() as f64;
        let predictions = self.trees.par_iter()
            .map(|tree| tree.predict_resolved(task, &columns))
            .reduce(
                || vec![0f64; task.n_rows()],
                |mut acc, p| {
                    acc.iter_mut().zip(p).for_each(|(a, b)| { *a += b; });
                    acc
                },
            )
            .into_iter()
            .map(|p| p / n_trees)
            .collect();
        Ok(predictions)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;
    use crate::task::TaskBuilder;

    #[test]
    fn test_same_seed_same_predictions() {
        let x = (0..40).map(|i| (i as f64 * 0.37).sin()).collect::<Vec<_>>();
        let y = x.iter().map(|v| 3.0 * v + 1.0).collect::<Vec<_>>();
        let table = Table::new()
            .with_column("x", x).unwrap()
            .with_column("y", y).unwrap();
        let task = TaskBuilder::new(&table).outcome("y").n_folds(4).build().unwrap();

        let learner = BaggedTrees::new().n_trees(10).seed(11);
        let a = learner.train(&task).unwrap().predict(&task).unwrap();
        let b = learner.train(&task).unwrap().predict(&task).unwrap();
        assert_eq!(a, b);
    }
}
