use log::{debug, info, warn};

use super::combination::FittedCombination;
use crate::common::helpers;
use crate::constants::{
    CONVEX_MAX_ITER,
    CONVEX_TOLERANCE,
    MINIMAL_WEIGHT,
};
use crate::error::{Result, SuperLearnerError};
use crate::learner::{core, Capabilities, FittedLearner, Learner};
use crate::loss::{Loss, LossFunction};
use crate::task::Task;


/// The convex combination metalearner.
///
/// Given the out-of-fold predictions `Z` (rows × learners),
/// `ConvexCombination` solves
/// ```txt
/// minimize  sum_i v_i loss( (Z w)_i, y_i ) / sum_i v_i
/// subject to w >= 0, sum_k w_k = 1,
/// ```
/// where `v` are the observation weights of the task.
/// With the squared error, this is the convex non-negative least squares.
/// With the binomial log-likelihood, it combines the predicted probabilities.
///
/// The problem is solved by the accelerated projected gradient method
/// (monotone FISTA with backtracking),
/// starting from the uniform weights.
/// Each iterate is projected onto the probability simplex
/// by [`helpers::project_to_simplex`].
///
/// # Example
/// ```no_run
/// use superlearner::prelude::*;
///
/// let metalearner = ConvexCombination::new(Loss::SquaredError)
///     .max_iter(1_000)
///     .tolerance(1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct ConvexCombination {
    name: String,
    loss: Loss,
    max_iter: usize,
    tolerance: f64,
}


impl ConvexCombination {
    /// Construct a new instance of [`ConvexCombination`].
    pub fn new(loss: Loss) -> Self {
        Self {
            name: "convex_combination".to_string(),
            loss,
            max_iter: CONVEX_MAX_ITER,
            tolerance: CONVEX_TOLERANCE,
        }
    }


    /// Set the maximal number of iterations.
    /// Default is `5000`.
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }


    /// Set the tolerance on the change of the weights.
    /// Default is `1e-10`.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }


    /// Fit the combination weights on `task`.
    pub fn fit(&self, task: &Task) -> Result<FittedCombination> {
        self.capabilities().check(&self.name, task)?;
        let learners = core::covariate_names(task);
        if learners.is_empty() {
            return Err(SuperLearnerError::training(
                self.name.as_str(), "there is no prediction to combine"
            ));
        }

        let objective = Objective::new(task, self.loss);
        let weights = self.solve(&objective);
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(SuperLearnerError::training(
                self.name.as_str(), "the weights diverged"
            ));
        }
        info!(
            "`{}` weights: {}",
            self.name,
            learners.iter()
                .zip(&weights)
                .map(|(l, w)| format!("{l} = {w:.4}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        FittedCombination::new(self.name.clone(), learners, weights)
    }


    fn solve(&self, objective: &Objective) -> Vec<f64> {
        let dim = objective.dim();
        let mut x = vec![1f64 / dim as f64; dim];
        if dim == 1 { return x; }

        let mut fx = objective.eval(&x);
        let mut y = x.clone();
        let mut t = 1f64;
        let mut step = 1f64;

        for iter in 1..=self.max_iter {
            let fy = objective.eval(&y);
            let gy = objective.gradient(&y);

            // Backtracking
            step *= 2f64;
            let (z, fz) = loop {
                let candidate = y.iter()
                    .zip(&gy)
                    .map(|(yk, gk)| yk - step * gk)
                    .collect::<Vec<_>>();
                let z = helpers::project_to_simplex(&candidate);
                let fz = objective.eval(&z);

                let d = z.iter().zip(&y).map(|(a, b)| a - b).collect::<Vec<_>>();
                let model = fy
                    + helpers::inner_product(&gy, &d)
                    + helpers::inner_product(&d, &d) / (2f64 * step);
                if fz <= model + f64::EPSILON * fy.abs() || step < f64::EPSILON {
                    break (z, fz);
                }
                step *= 0.5;
            };

            let gap = z.iter()
                .zip(&y)
                .map(|(a, b)| (a - b).abs())
                .fold(0f64, f64::max);

            let t_next = (1f64 + (1f64 + 4f64 * t * t).sqrt()) / 2f64;
            let (x_next, f_next) = if fz <= fx {
                (z.clone(), fz)
            } else {
                (x.clone(), fx)
            };
            y = (0..dim)
                .map(|k| {
                    x_next[k]
                        + (t / t_next) * (z[k] - x_next[k])
                        + ((t - 1f64) / t_next) * (x_next[k] - x[k])
                })
                .collect();

            x = x_next;
            fx = f_next;
            t = t_next;

            if gap < self.tolerance {
                debug!("`{}` converged after {iter} iterations", self.name);
                return clean(x);
            }
        }

        warn!(
            "`{}` reached the maximal number of iterations ({})",
            self.name, self.max_iter
        );
        clean(x)
    }
}


/// Zero out the negligible weights and renormalize.
fn clean(mut weights: Vec<f64>) -> Vec<f64> {
    weights.iter_mut()
        .for_each(|w| { if *w < MINIMAL_WEIGHT { *w = 0f64; } });
    if weights.iter().all(|w| *w == 0f64) {
        let dim = weights.len() as f64;
        return vec![1f64 / dim; weights.len()];
    }
    helpers::normalize(&mut weights);
    weights
}


/// The weighted empirical risk of `Z w`.
struct Objective {
    columns: Vec<Vec<f64>>,
    target: Vec<f64>,
    weights: Vec<f64>,
    loss: Loss,
}


impl Objective {
    fn new(task: &Task, loss: Loss) -> Self {
        let columns = (0..task.n_covariates())
            .map(|j| task.column_values(j))
            .collect();
        let mut weights = task.weights();
        helpers::normalize(&mut weights);
        Self { columns, target: task.outcome(), weights, loss, }
    }


    fn dim(&self) -> usize {
        self.columns.len()
    }


    fn predict(&self, w: &[f64]) -> Vec<f64> {
        let mut predictions = vec![0f64; self.target.len()];
        for (column, &wk) in self.columns.iter().zip(w) {
            if wk == 0f64 { continue; }
            predictions.iter_mut()
                .zip(column)
                .for_each(|(p, z)| { *p += wk * z; });
        }
        predictions
    }


    fn eval(&self, w: &[f64]) -> f64 {
        self.predict(w).into_iter()
            .zip(&self.target)
            .zip(&self.weights)
            .map(|((p, &y), &v)| v * self.loss.eval_at_point(p, y))
            .sum()
    }


    fn gradient(&self, w: &[f64]) -> Vec<f64> {
        let derivatives = self.predict(w).into_iter()
            .zip(&self.target)
            .zip(&self.weights)
            .map(|((p, &y), &v)| v * self.loss.gradient_at_point(p, y))
            .collect::<Vec<_>>();
        self.columns.iter()
            .map(|column| helpers::inner_product(column, &derivatives))
            .collect()
    }
}


impl Learner for ConvexCombination {
    fn name(&self) -> &str {
        &self.name
    }


    fn info(&self) -> Option<Vec<(&str, String)>> {
        Some(vec![
            ("Loss", self.loss.to_string()),
            ("Max iter.", format!("{}", self.max_iter)),
            ("Tolerance", format!("{}", self.tolerance)),
        ])
    }


    fn capabilities(&self) -> Capabilities {
        Capabilities {
            continuous: true,
            binary: true,
            categorical: false,
            weights: true,
            offset: false,
        }
    }


    fn train(&self, task: &Task) -> Result<Box<dyn FittedLearner>> {
        Ok(Box::new(self.fit(task)?))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::checker;
    use crate::table::Table;
    use crate::task::{Column, TaskBuilder};
    use approx::assert_abs_diff_eq;

    fn prediction_task(columns: Vec<(&str, Vec<f64>)>, y: Vec<f64>) -> Task {
        let n_rows = y.len();
        let table = Table::new()
            .with_column("x", vec![0.0; n_rows]).unwrap()
            .with_column("y", y).unwrap();
        let task = TaskBuilder::new(&table).outcome("y").n_folds(2).build().unwrap();
        let columns = columns.into_iter()
            .map(|(name, values)| Column::continuous(name, values))
            .collect();
        task.with_covariates(columns).unwrap()
    }

    #[test]
    fn test_exact_mixture() {
        let a = (0..30).map(|i| i as f64).collect::<Vec<_>>();
        let b = (0..30).map(|i| ((i * 7) % 11) as f64).collect::<Vec<_>>();
        let y = a.iter().zip(&b).map(|(a, b)| 0.3 * a + 0.7 * b).collect();
        let task = prediction_task(vec![("a", a), ("b", b)], y);

        let fit = ConvexCombination::new(Loss::SquaredError).fit(&task).unwrap();
        assert_abs_diff_eq!(fit.weights()[0], 0.3, epsilon = 1e-4);
        assert_abs_diff_eq!(fit.weights()[1], 0.7, epsilon = 1e-4);
    }

    #[test]
    fn test_identical_predictions_get_equal_weights() {
        let p = (0..20).map(|i| (i as f64).sqrt()).collect::<Vec<_>>();
        let y = (0..20).map(|i| i as f64 / 4.0).collect();
        let task = prediction_task(vec![("a", p.clone()), ("b", p.clone()), ("c", p)], y);

        let fit = ConvexCombination::new(Loss::SquaredError).fit(&task).unwrap();
        for w in fit.weights() {
            assert_abs_diff_eq!(*w, 1.0 / 3.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_useless_learner_gets_no_weight() {
        let good = (0..40).map(|i| (i % 2) as f64 * 0.9 + 0.05).collect::<Vec<_>>();
        let bad = (0..40).map(|i| 1.0 - ((i % 2) as f64 * 0.9 + 0.05)).collect::<Vec<_>>();
        let y = (0..40).map(|i| (i % 2) as f64).collect();
        let task = prediction_task(vec![("good", good), ("bad", bad)], y);

        let fit = ConvexCombination::new(Loss::BinomialLogLikelihood)
            .fit(&task)
            .unwrap();
        assert_abs_diff_eq!(fit.weights()[0], 1.0, epsilon = 1e-6);
        assert!(checker::simplex_condition(fit.weights()));
    }
}
