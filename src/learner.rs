//! Provides the [`Learner`] interface, its concrete variants,
//! and the composites [`Stack`] and [`Pipeline`].

// Provides the learner traits and the time-limited training.
pub(crate) mod core;
// Provides the wide prediction matrix.
pub(crate) mod prediction;
// Design matrix utilities shared by the linear learners.
pub(crate) mod design;

// Provides the (weighted) mean.
pub(crate) mod mean;
// Provides the least squares regression.
pub(crate) mod linear;
// Provides the logistic regression.
pub(crate) mod logistic;
// Provides the regression tree.
pub(crate) mod tree;
// Provides bagged regression trees.
pub(crate) mod bagging;
// Provides the correlation screener.
pub(crate) mod screener;

// Provides the parallel composite.
pub(crate) mod stack;
// Provides the sequential composite.
pub(crate) mod pipeline;
// Provides the registry of learners by name.
pub(crate) mod registry;


pub use self::core::{
    Capabilities,
    FittedLearner,
    Learner,
    train_with_limit,
};
pub use prediction::PredictionMatrix;

pub use mean::{MeanLearner, FittedMean};
pub use linear::{LinearRegression, FittedLinear};
pub use logistic::{LogisticRegression, FittedLogistic};
pub use tree::{RegressionTree, FittedTree, Node};
pub use bagging::{BaggedTrees, FittedBagging};
pub use screener::{CorrelationScreener, FittedScreener};

pub use stack::{Stack, FittedStack};
pub use pipeline::{Pipeline, FittedPipeline};
pub use registry::{LearnerSpec, make_learner};
