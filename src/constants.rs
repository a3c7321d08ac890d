//! Default values shared by several modules.

pub const DEFAULT_N_FOLDS:      usize = 10;
pub const DEFAULT_SEED:           u64 = 1234;
pub const DEFAULT_MAX_ITER:     usize = 100;
pub const DEFAULT_TREE_DEPTH:   usize = 3;
pub const DEFAULT_MIN_LEAF:     usize = 5;
pub const DEFAULT_N_TREES:      usize = 50;
pub const DEFAULT_TOP_K:        usize = 5;
pub const CONVEX_MAX_ITER:      usize = 5_000;

pub const DEFAULT_TOLERANCE:      f64 = 1e-8;
pub const CONVEX_TOLERANCE:       f64 = 1e-10;
pub const SIMPLEX_TOLERANCE:      f64 = 1e-6;
pub const PIVOT_TOLERANCE:        f64 = 1e-12;
pub const PROBABILITY_CLIP:       f64 = 1e-15;
pub const MINIMAL_GAIN:           f64 = 1e-12;
pub const MINIMAL_WEIGHT:         f64 = 1e-12;

pub const MISSING_TOKENS: [&str; 4] = ["", "NA", "NaN", "null"];
pub const INDICATOR_PREFIX:  &str = "delta_";
pub const DISCRETE_NAME:     &str = "discrete_selector";
pub const ENSEMBLE_NAME:     &str = "super_learner";

pub const PRINT_WIDTH:       usize = 9;
pub const FULL_WIDTH:        usize = 64;
