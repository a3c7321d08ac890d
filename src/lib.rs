#![warn(missing_docs)]

//!
//! A crate that provides the Super Learner,
//! the cross-validated stacking of prediction models.
//!
//! Given a [`Task`] and a [`Stack`] of [`Learner`]s,
//! the [`SuperLearner`]
//!
//! - trains a fold-local copy of the stack on each training fold
//!   and collects the out-of-fold predictions
//!   (see [`cross_validate`]);
//! - selects the learner of minimal cross-validated risk,
//!   the **discrete selector**;
//! - trains a metalearner on the out-of-fold predictions,
//!   which gives convex combination weights
//!   (see [`ConvexCombination`]);
//! - refits the stack on the whole task.
//!
//! The ensemble predicts with the weighted predictions of the refitted stack.
//! [`permutation_importance`] measures the importance of each covariate
//! for a fitted ensemble.
//!
//! # Example
//! ```no_run
//! use superlearner::prelude::*;
//!
//! let table = TableReader::new()
//!     .file("data.csv")
//!     .has_header(true)
//!     .read()
//!     .unwrap();
//! let task = TaskBuilder::new(&table)
//!     .outcome("y")
//!     .n_folds(10)
//!     .build()
//!     .unwrap();
//!
//! let stack = Stack::empty()
//!     .add(MeanLearner::new())
//!     .add(LinearRegression::new())
//!     .add(
//!         Pipeline::empty()
//!             .add(CorrelationScreener::new().top_k(5))
//!             .add(LinearRegression::new())
//!     )
//!     .add(BaggedTrees::new().n_trees(100));
//!
//! let fit = SuperLearner::new(stack).fit(&task).unwrap();
//! println!("{}", fit.report());
//!
//! let importance = permutation_importance(
//!     &fit, &task, &ImportanceOptions::new().n_repeats(5)
//! ).unwrap();
//! println!("{importance}");
//! ```

pub(crate) mod constants;

pub mod error;
pub mod common;
pub mod table;
pub mod task;
pub mod loss;
pub mod learner;
pub mod metalearner;
pub mod cross_validation;
pub mod super_learner;
pub mod importance;
pub mod report;
pub mod config;

pub mod prelude;


pub use error::{Result, SuperLearnerError};

pub use table::{RawColumn, Table, TableReader};

pub use task::{
    Column,
    ColumnKind,
    CovariateSchema,
    Encoding,
    FoldAssignment,
    FoldStrategy,
    ImputationRule,
    OutcomeType,
    Task,
    TaskBuilder,
};

pub use loss::{Loss, LossFunction};

pub use learner::{
    Capabilities,
    FittedLearner,
    Learner,
    PredictionMatrix,
    train_with_limit,

    MeanLearner,
    FittedMean,
    LinearRegression,
    FittedLinear,
    LogisticRegression,
    FittedLogistic,
    RegressionTree,
    FittedTree,
    Node,
    BaggedTrees,
    FittedBagging,
    CorrelationScreener,
    FittedScreener,

    Stack,
    FittedStack,
    Pipeline,
    FittedPipeline,

    LearnerSpec,
    make_learner,
};

pub use metalearner::{
    ConvexCombination,
    DiscreteSelector,
    FittedCombination,
    MetalearnerKind,
};

pub use cross_validation::{
    cross_validate,
    CvOptions,
    CvResult,
    CvRiskTable,
    DroppedLearner,
    RiskEntry,
};

pub use super_learner::{
    FittedSuperLearner,
    NestedCvResult,
    SuperLearner,
};

pub use importance::{
    permutation_importance,
    ImportanceEntry,
    ImportanceKind,
    ImportanceOptions,
    ImportanceTable,
};

pub use report::{LearnerSummary, SuperLearnerReport};

pub use config::SuperLearnerConfig;
