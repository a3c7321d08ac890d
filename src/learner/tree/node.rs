//! Defines the inner representation of a fitted regression tree.
use serde::{Serialize, Deserialize};

use crate::task::Task;


/// A node of a fitted regression tree.
/// A row goes to the left child if its value is less than the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// A node that has two children.
    Branch {
        /// Position of the covariate in the fitted covariate list.
        feature: usize,
        /// Splitting threshold.
        threshold: f64,
        /// Left child.
        left: Box<Node>,
        /// Right child.
        right: Box<Node>,
    },
    /// A node that has no child.
    Leaf {
        /// The prediction on this node.
        prediction: f64,
    },
}


impl Node {
    /// Predict the `row`-th row of `task`,
    /// where `columns[k]` is the task position of the `k`-th fitted covariate.
    #[inline]
    pub(crate) fn predict(&self, task: &Task, row: usize, columns: &[usize]) -> f64 {
        let mut node = self;
        loop {
            match node {
                Node::Leaf { prediction } => { return *prediction; },
                Node::Branch { feature, threshold, left, right } => {
                    let value = task.value(row, columns[*feature]);
                    node = if value < *threshold { left } else { right };
                },
            }
        }
    }


    /// Returns the number of leaves of this sub-tree.
    pub fn leaves(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Branch { left, right, .. } => left.leaves() + right.leaves(),
        }
    }


    /// Returns the depth of this sub-tree.
    /// A leaf has depth `0`.
    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Branch { left, right, .. } => {
                1 + left.depth().max(right.depth())
            },
        }
    }
}
