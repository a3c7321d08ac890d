//! Loss functions that define the risk of a prediction function.
use serde::{Serialize, Deserialize};

use std::fmt;

use crate::constants::PROBABILITY_CLIP;
use crate::task::OutcomeType;


/// This trait defines the loss functions.
/// The risk of a prediction function is
/// the (weighted) mean of the pointwise losses.
pub trait LossFunction: Send + Sync {
    /// The name of the loss function.
    fn name(&self) -> &str;


    /// Loss value for a single point.
    fn eval_at_point(&self, prediction: f64, true_value: f64) -> f64;


    /// Derivative of the loss with respect to the prediction.
    fn gradient_at_point(&self, prediction: f64, true_value: f64) -> f64;


    /// Loss values of every point.
    fn pointwise(&self, predictions: &[f64], target: &[f64]) -> Vec<f64> {
        assert_eq!(predictions.len(), target.len());
        predictions.iter()
            .zip(target)
            .map(|(&p, &y)| self.eval_at_point(p, y))
            .collect()
    }


    /// Mean loss.
    fn eval(&self, predictions: &[f64], target: &[f64]) -> f64 {
        let n_items = predictions.len();
        assert_eq!(n_items, target.len());

        predictions.iter()
            .zip(target)
            .map(|(&p, &y)| self.eval_at_point(p, y))
            .sum::<f64>()
            / n_items as f64
    }


    /// Weighted mean loss.
    fn weighted_eval(&self, predictions: &[f64], target: &[f64], weights: &[f64])
        -> f64
    {
        assert_eq!(predictions.len(), target.len());
        assert_eq!(predictions.len(), weights.len());

        let total = weights.iter().sum::<f64>();
        predictions.iter()
            .zip(target)
            .zip(weights)
            .map(|((&p, &y), &w)| w * self.eval_at_point(p, y))
            .sum::<f64>()
            / total
    }
}


/// Some well-known loss functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    /// `(p - y)^2`.
    /// This loss function is also known as
    /// **Mean Squared Error (MSE)**.
    SquaredError,

    /// `|p - y|`.
    /// This loss function is also known as
    /// **Least Absolute Deviation (LAD)**.
    AbsoluteError,

    /// `-y ln(p) - (1 - y) ln(1 - p)` for a binary outcome `y`
    /// and a predicted probability `p`.
    /// The probability is clipped to `[1e-15, 1 - 1e-15]`.
    BinomialLogLikelihood,
}


impl Loss {
    /// The loss used when none is given:
    /// squared error for a continuous outcome,
    /// negative binomial log-likelihood for a binary one.
    pub fn default_for(outcome_type: OutcomeType) -> Self {
        match outcome_type {
            OutcomeType::Binary => Self::BinomialLogLikelihood,
            _ => Self::SquaredError,
        }
    }
}


impl LossFunction for Loss {
    fn name(&self) -> &str {
        match self {
            Self::SquaredError => "squared error",
            Self::AbsoluteError => "absolute error",
            Self::BinomialLogLikelihood => "binomial log-likelihood",
        }
    }


    fn eval_at_point(&self, prediction: f64, true_value: f64) -> f64 {
        match self {
            Self::SquaredError => (prediction - true_value).powi(2),
            Self::AbsoluteError => (prediction - true_value).abs(),
            Self::BinomialLogLikelihood => {
                let p = clip(prediction);
                -true_value * p.ln() - (1f64 - true_value) * (1f64 - p).ln()
            },
        }
    }


    fn gradient_at_point(&self, prediction: f64, true_value: f64) -> f64 {
        match self {
            Self::SquaredError => 2f64 * (prediction - true_value),
            Self::AbsoluteError => (prediction - true_value).signum(),
            Self::BinomialLogLikelihood => {
                let p = clip(prediction);
                (p - true_value) / (p * (1f64 - p))
            },
        }
    }
}


impl fmt::Display for Loss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}


#[inline(always)]
fn clip(p: f64) -> f64 {
    p.clamp(PROBABILITY_CLIP, 1f64 - PROBABILITY_CLIP)
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_squared_error() {
        let loss = Loss::SquaredError;
        assert_relative_eq!(loss.eval(&[1.0, 2.0], &[0.0, 0.0]), 2.5);
        assert_relative_eq!(
            loss.weighted_eval(&[1.0, 2.0], &[0.0, 0.0], &[3.0, 1.0]),
            1.75
        );
    }

    #[test]
    fn test_log_likelihood_is_finite_at_the_boundary() {
        let loss = Loss::BinomialLogLikelihood;
        let value = loss.eval_at_point(0.0, 1.0);
        assert!(value.is_finite());
        assert!(value > 30.0);
        assert_relative_eq!(loss.eval_at_point(0.5, 1.0), 2f64.ln());
    }

    #[test]
    fn test_default_loss() {
        assert_eq!(Loss::default_for(OutcomeType::Binary), Loss::BinomialLogLikelihood);
        assert_eq!(Loss::default_for(OutcomeType::Continuous), Loss::SquaredError);
    }
}
