use serde::{Serialize, Deserialize};

use std::fmt;


/// The type of the outcome column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeType {
    /// Real valued outcome.
    Continuous,
    /// Outcome in `{0, 1}`.
    Binary,
    /// Outcome with `k > 2` levels, encoded as `0, 1, ..., k - 1`.
    Categorical(usize),
}


impl OutcomeType {
    /// Detect the outcome type from numeric values.
    /// Values in `{0, 1}` are binary, anything else is continuous.
    pub(crate) fn detect(values: &[f64]) -> Self {
        let binary = !values.is_empty()
            && values.iter().all(|&y| y == 0f64 || y == 1f64);
        if binary { Self::Binary } else { Self::Continuous }
    }


    /// Returns `true` if the outcome takes finitely many values.
    pub fn is_discrete(&self) -> bool {
        !matches!(self, Self::Continuous)
    }


    /// Returns the number of classes of a discrete outcome.
    pub fn n_classes(&self) -> Option<usize> {
        match self {
            Self::Continuous => None,
            Self::Binary => Some(2),
            Self::Categorical(k) => Some(*k),
        }
    }


    /// Check that `values` are valid for this outcome type.
    pub(crate) fn admits(&self, values: &[f64]) -> bool {
        match self {
            Self::Continuous => values.iter().all(|y| y.is_finite()),
            Self::Binary => values.iter().all(|&y| y == 0f64 || y == 1f64),
            Self::Categorical(k) => values.iter()
                .all(|&y| y >= 0f64 && y.fract() == 0f64 && y < *k as f64),
        }
    }
}


impl fmt::Display for OutcomeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continuous => write!(f, "continuous"),
            Self::Binary => write!(f, "binary"),
            Self::Categorical(k) => write!(f, "categorical ({k} levels)"),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(OutcomeType::detect(&[0.0, 1.0, 1.0]), OutcomeType::Binary);
        assert_eq!(OutcomeType::detect(&[0.0, 2.0]), OutcomeType::Continuous);
    }

    #[test]
    fn test_admits() {
        assert!(OutcomeType::Categorical(3).admits(&[0.0, 2.0, 1.0]));
        assert!(!OutcomeType::Categorical(3).admits(&[3.0]));
        assert!(!OutcomeType::Binary.admits(&[0.5]));
    }
}
