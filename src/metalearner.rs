//! Metalearners combine the out-of-fold predictions of a [`Stack`](crate::Stack).
//!
//! A metalearner is a [`Learner`](crate::Learner)
//! trained on a task whose covariates are the out-of-fold predictions,
//! one column per constituent of the stack.
//! Its fitted form is a [`FittedCombination`],
//! a vector of weights on the probability simplex.

// Provides the fitted combination.
pub(crate) mod combination;
// Provides the convex combination.
pub(crate) mod convex;
// Provides the discrete selector.
pub(crate) mod discrete;

use serde::{Serialize, Deserialize};

use std::fmt;

use crate::error::Result;
use crate::loss::Loss;
use crate::task::Task;

pub use combination::FittedCombination;
pub use convex::ConvexCombination;
pub use discrete::DiscreteSelector;


/// The metalearners a [`SuperLearner`](crate::SuperLearner) can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetalearnerKind {
    /// [`ConvexCombination`].
    #[default]
    Convex,
    /// [`DiscreteSelector`].
    Discrete,
}


impl MetalearnerKind {
    /// Fit the metalearner of this kind on `task`.
    pub(crate) fn fit(&self, loss: Loss, task: &Task) -> Result<FittedCombination> {
        match self {
            Self::Convex => ConvexCombination::new(loss).fit(task),
            Self::Discrete => DiscreteSelector::new(loss).fit(task),
        }
    }
}


impl fmt::Display for MetalearnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Convex => write!(f, "convex combination"),
            Self::Discrete => write!(f, "discrete selector"),
        }
    }
}
