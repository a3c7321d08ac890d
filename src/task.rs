//! Struct `Task` bundles an imputed dataset,
//! the roles of its columns, and a cross-validation fold plan.

// Provides the outcome type.
pub(crate) mod outcome;
// Provides the covariate column struct.
pub(crate) mod column;
// Provides the fold plan.
pub(crate) mod folds;
// Provides missing value imputation.
pub(crate) mod imputation;
// Provides the task struct.
pub(crate) mod task_struct;
// Provides the task builder.
pub(crate) mod builder;


pub use outcome::OutcomeType;
pub use column::{Column, ColumnKind};
pub use folds::{FoldAssignment, FoldStrategy};
pub use imputation::{CovariateSchema, Encoding, ImputationRule};
pub use task_struct::Task;
pub use builder::TaskBuilder;
