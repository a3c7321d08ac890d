//! Regression tree (CART with the squared error).

// Provides the tree nodes.
pub(crate) mod node;

use serde::{Serialize, Deserialize};

use super::core::{self, Capabilities, FittedLearner, Learner};
use crate::constants::{
    DEFAULT_MIN_LEAF,
    DEFAULT_TREE_DEPTH,
    MINIMAL_GAIN,
    MINIMAL_WEIGHT,
};
use crate::error::Result;
use crate::task::Task;

pub use node::Node;


/// A regression tree grown by exact split search on the squared error.
///
/// Each leaf predicts the (weighted) mean of its rows,
/// shrunk towards the overall mean by the L2 penalty `lambda_l2`:
/// ```txt
/// m + sum_i w_i (y_i - m) / (sum_i w_i + lambda_l2).
/// ```
/// With a binary outcome, the leaves predict proportions.
///
/// # Example
/// ```no_run
/// use superlearner::prelude::*;
///
/// let tree = RegressionTree::new()
///     .max_depth(3)
///     .min_samples_leaf(5)
///     .lambda_l2(0.01);
/// ```
#[derive(Debug, Clone)]
pub struct RegressionTree {
    name: String,
    max_depth: usize,
    min_samples_leaf: usize,
    lambda_l2: f64,
}


impl RegressionTree {
    /// Construct a new instance of [`RegressionTree`].
    /// By default,
    /// `RegressionTree` sets the parameters as follows;
    /// ```text
    /// max_depth: 3,
    /// min_samples_leaf: 5,
    /// lambda_l2: 0,
    /// ```
    pub fn new() -> Self {
        Self {
            name: "tree".to_string(),
            max_depth: DEFAULT_TREE_DEPTH,
            min_samples_leaf: DEFAULT_MIN_LEAF,
            lambda_l2: 0f64,
        }
    }


    /// Set the name of this learner.
    pub fn label<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }


    /// Specify the maximal depth of the tree.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }


    /// Specify the minimal number of rows in a leaf.
    pub fn min_samples_leaf(mut self, size: usize) -> Self {
        self.min_samples_leaf = size.max(1);
        self
    }


    /// Set the L2-regularization parameter of the leaf values.
    pub fn lambda_l2(mut self, lambda_l2: f64) -> Self {
        assert!(lambda_l2 >= 0f64);
        self.lambda_l2 = lambda_l2;
        self
    }


    /// Grow a tree on `task`.
    pub(crate) fn fit(&self, task: &Task) -> Result<FittedTree> {
        self.capabilities().check(&self.name, task)?;

        let covariates = core::covariate_names(task);
        let y = task.outcome();
        let w = task.weights();

        let total = w.iter().sum::<f64>().max(MINIMAL_WEIGHT);
        let mean = y.iter().zip(&w).map(|(a, b)| a * b).sum::<f64>() / total;
        let residuals = y.iter().map(|v| v - mean).collect::<Vec<_>>();

        let grower = Grower {
            task,
            residuals: &residuals,
            weights: &w,
            mean,
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf,
            lambda_l2: self.lambda_l2,
        };
        let indices = (0..task.n_rows()).collect::<Vec<_>>();
        let root = grower.grow(indices, 0);

        Ok(FittedTree { name: self.name.clone(), covariates, root, })
    }
}


impl Default for RegressionTree {
    fn default() -> Self {
        Self::new()
    }
}


impl Learner for RegressionTree {
    fn name(&self) -> &str {
        &self.name
    }


    fn info(&self) -> Option<Vec<(&str, String)>> {
        let info = Vec::from([
            ("Max depth", format!("{}", self.max_depth)),
            ("Min samples leaf", format!("{}", self.min_samples_leaf)),
            ("L2 penalty", format!("{}", self.lambda_l2)),
        ]);
        Some(info)
    }


    fn capabilities(&self) -> Capabilities {
        Capabilities {
            continuous: true,
            binary: true,
            categorical: false,
            weights: true,
            offset: false,
        }
    }


    fn train(&self, task: &Task) -> Result<Box<dyn FittedLearner>> {
        Ok(Box::new(self.fit(task)?))
    }
}


struct Grower<'a> {
    task: &'a Task,
    residuals: &'a [f64],
    weights: &'a [f64],
    mean: f64,
    max_depth: usize,
    min_samples_leaf: usize,
    lambda_l2: f64,
}


impl Grower<'_> {
    fn grow(&self, indices: Vec<usize>, depth: usize) -> Node {
        let (grad, hess) = self.sums(&indices);
        let prediction = self.mean + grad / (hess + self.lambda_l2).max(MINIMAL_WEIGHT);

        if depth >= self.max_depth || indices.len() < 2 * self.min_samples_leaf {
            return Node::Leaf { prediction };
        }

        let Some((feature, threshold)) = self.best_split(&indices, grad, hess)
        else {
            return Node::Leaf { prediction };
        };

        let (left, right) = indices.into_iter()
            .partition::<Vec<_>, _>(|&i| self.task.value(i, feature) < threshold);

        // Degenerate splits become leaves.
        if left.is_empty() || right.is_empty() {
            return Node::Leaf { prediction };
        }

        Node::Branch {
            feature,
            threshold,
            left: Box::new(self.grow(left, depth + 1)),
            right: Box::new(self.grow(right, depth + 1)),
        }
    }


    fn sums(&self, indices: &[usize]) -> (f64, f64) {
        indices.iter()
            .fold((0f64, 0f64), |(g, h), &i| {
                let w = self.weights[i];
                (g + w * self.residuals[i], h + w)
            })
    }


    #[inline]
    fn score(&self, grad: f64, hess: f64) -> f64 {
        grad.powi(2) / (hess + self.lambda_l2).max(MINIMAL_WEIGHT)
    }


    /// Find the split with the largest gain.
    /// Ties go to the first covariate and the smallest threshold.
    fn best_split(&self, indices: &[usize], grad: f64, hess: f64)
        -> Option<(usize, f64)>
    {
        let n_items = indices.len();
        let parent = self.score(grad, hess);

        let mut best: Option<(usize, f64, f64)> = None;
        for feature in 0..self.task.n_covariates() {
            let mut sorted = indices.iter()
                .map(|&i| (self.task.value(i, feature), i))
                .collect::<Vec<_>>();
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_grad = 0f64;
            let mut left_hess = 0f64;
            for k in 0..n_items - 1 {
                let (value, i) = sorted[k];
                left_grad += self.weights[i] * self.residuals[i];
                left_hess += self.weights[i];

                let next = sorted[k + 1].0;
                let n_left = k + 1;
                if value == next
                    || n_left < self.min_samples_leaf
                    || n_items - n_left < self.min_samples_leaf
                {
                    continue;
                }

                let gain = self.score(left_grad, left_hess)
                    + self.score(grad - left_grad, hess - left_hess)
                    - parent;
                if gain > MINIMAL_GAIN && best.map_or(true, |(_, _, g)| gain > g) {
                    best = Some((feature, 0.5 * (value + next), gain));
                }
            }
        }
        best.map(|(feature, threshold, _)| (feature, threshold))
    }
}


/// Fitted [`RegressionTree`].
/// This struct can be (de)serialized with `serde`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTree {
    name: String,
    covariates: Vec<String>,
    root: Node,
}


impl FittedTree {
    /// Returns the root node.
    pub fn root(&self) -> &Node {
        &self.root
    }


    /// Returns the covariates the tree was grown on.
    pub fn covariates(&self) -> &[String] {
        &self.covariates[..]
    }


    /// Predict every row of `task` with the covariates at `columns`.
    pub(crate) fn predict_resolved(&self, task: &Task, columns: &[usize]) -> Vec<f64> {
        (0..task.n_rows())
            .map(|i| self.root.predict(task, i, columns))
            .collect()
    }
}


impl FittedLearner for FittedTree {
    fn name(&self) -> &str {
        &self.name
    }


    fn predict(&self, task: &Task) -> Result<Vec<f64>> {
        let columns = core::resolve_covariates(&self.name, task, &self.covariates)?;
        Ok(self.predict_resolved(task, &columns))
    }
}
