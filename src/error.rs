//! Error type shared by every component of this crate.

use thiserror::Error;


/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SuperLearnerError>;


/// Errors raised while building tasks, training learners,
/// or evaluating ensembles.
#[derive(Error, Debug)]
pub enum SuperLearnerError {
    /// Bad task, fold, or learner configuration.
    /// Reported before any training starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The learner does not support the outcome type of the task.
    #[error("learner `{learner}` does not support {outcome} outcomes")]
    UnsupportedOutcomeType {
        /// Name of the learner.
        learner: String,
        /// Outcome type of the task.
        outcome: String,
    },

    /// A numerical or fitting failure of a single learner.
    #[error("learner `{learner}` failed to train: {reason}")]
    LearnerTrainingFailure {
        /// Name of the learner.
        learner: String,
        /// What went wrong.
        reason: String,
    },

    /// The learner did not finish training within the time limit.
    #[error("learner `{learner}` exceeded the time limit of {millis} ms")]
    TimeoutExceeded {
        /// Name of the learner.
        learner: String,
        /// The time limit in milliseconds.
        millis: u128,
    },

    /// The learner cannot perform the requested operation,
    /// e.g., a screener asked for predictions.
    #[error("learner `{learner}` does not support `{operation}`")]
    UnsupportedOperation {
        /// Name of the learner.
        learner: String,
        /// The operation that was requested.
        operation: String,
    },

    /// I/O failure while reading a table or a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by `polars`.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Failure while (de)serializing JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}


impl SuperLearnerError {
    /// Returns the name of the learner this error belongs to, if any.
    pub fn learner(&self) -> Option<&str> {
        match self {
            Self::UnsupportedOutcomeType { learner, .. }
            | Self::LearnerTrainingFailure { learner, .. }
            | Self::TimeoutExceeded { learner, .. }
            | Self::UnsupportedOperation { learner, .. } => Some(learner),
            _ => None,
        }
    }


    /// Returns `true` if this error is a training failure of a learner.
    /// A timeout counts as a training failure.
    pub fn is_training_failure(&self) -> bool {
        matches!(
            self,
            Self::LearnerTrainingFailure { .. } | Self::TimeoutExceeded { .. }
        )
    }


    pub(crate) fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration(message.into())
    }


    pub(crate) fn training<S, T>(learner: S, reason: T) -> Self
        where S: Into<String>,
              T: ToString,
    {
        Self::LearnerTrainingFailure {
            learner: learner.into(),
            reason: reason.to_string(),
        }
    }


    pub(crate) fn unsupported<S, T>(learner: S, operation: T) -> Self
        where S: Into<String>,
              T: Into<String>,
    {
        Self::UnsupportedOperation {
            learner: learner.into(),
            operation: operation.into(),
        }
    }


    /// Replace the learner name of an error that carries one.
    pub(crate) fn renamed(self, name: &str) -> Self {
        match self {
            Self::UnsupportedOutcomeType { outcome, .. } => {
                Self::UnsupportedOutcomeType { learner: name.to_string(), outcome, }
            },
            Self::LearnerTrainingFailure { reason, .. } => {
                Self::training(name, reason)
            },
            Self::TimeoutExceeded { millis, .. } => {
                Self::TimeoutExceeded { learner: name.to_string(), millis, }
            },
            Self::UnsupportedOperation { operation, .. } => {
                Self::unsupported(name, operation)
            },
            other => other,
        }
    }


    /// Attach the learner name to an error that does not carry one.
    pub(crate) fn attributed_to(self, learner: &str) -> Self {
        if self.learner().is_some() {
            self
        } else {
            Self::training(learner, self)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributed_keeps_original_learner() {
        let err = SuperLearnerError::UnsupportedOutcomeType {
            learner: "logistic".into(),
            outcome: "continuous".into(),
        };
        let err = err.attributed_to("stack");
        assert_eq!(err.learner(), Some("logistic"));
    }


    #[test]
    fn test_renamed_keeps_the_details() {
        let err = SuperLearnerError::TimeoutExceeded {
            learner: "tree".into(), millis: 10,
        };
        match err.renamed("tree_2") {
            SuperLearnerError::TimeoutExceeded { learner, millis } => {
                assert_eq!(learner, "tree_2");
                assert_eq!(millis, 10);
            },
            other => panic!("unexpected error: {other}"),
        }
        let err = SuperLearnerError::config("bad").renamed("tree");
        assert_eq!(err.learner(), None);
    }


    #[test]
    fn test_attributed_wraps_untagged_error() {
        let err = SuperLearnerError::config("singular").attributed_to("linear");
        assert_eq!(err.learner(), Some("linear"));
        assert!(err.is_training_failure());
    }
}
