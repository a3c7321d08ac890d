//! Defines some common functions used in this library.

/// Defines some useful functions such as the simplex projection.
pub mod helpers;

/// Defines some checker functions.
pub(crate) mod checker;

/// Small dense linear algebra used by the linear learners.
pub(crate) mod linalg;
