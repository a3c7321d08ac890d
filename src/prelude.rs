//! Exports the standard learners, composites, and traits.
//!
pub use crate::table::{
    RawColumn,
    Table,
    TableReader,
};


pub use crate::task::{
    CovariateSchema,
    FoldAssignment,
    FoldStrategy,
    OutcomeType,
    Task,
    TaskBuilder,
};


pub use crate::loss::{
    Loss,
    LossFunction,
};


pub use crate::learner::{
    // Learner traits
    Learner,
    FittedLearner,
    Capabilities,


    // Learners ---------------------------------
    MeanLearner,
    LinearRegression,
    LogisticRegression,
    RegressionTree,
    BaggedTrees,
    CorrelationScreener,


    // Composites -------------------------------
    Stack,
    FittedStack,
    Pipeline,
    FittedPipeline,
    PredictionMatrix,


    // Registry ---------------------------------
    LearnerSpec,
    make_learner,
};


pub use crate::metalearner::{
    ConvexCombination,
    DiscreteSelector,
    FittedCombination,
    MetalearnerKind,
};


pub use crate::cross_validation::{
    cross_validate,
    CvOptions,
    CvRiskTable,
};


pub use crate::super_learner::{
    SuperLearner,
    FittedSuperLearner,
};


pub use crate::importance::{
    permutation_importance,
    ImportanceKind,
    ImportanceOptions,
};


pub use crate::config::SuperLearnerConfig;
pub use crate::error::SuperLearnerError;
