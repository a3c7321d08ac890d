//! Cross-validated risk of the learners of a stack,
//! and the discrete selector.

// Provides the cross-validation driver.
pub(crate) mod cv;
// Provides the risk table.
pub(crate) mod risk;


pub use cv::{
    cross_validate,
    CvOptions,
    CvResult,
    DroppedLearner,
};
pub use risk::{CvRiskTable, RiskEntry};
