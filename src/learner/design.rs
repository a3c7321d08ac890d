//! Design matrices shared by the generalized linear learners.
use crate::common::linalg::SquareMatrix;
use crate::task::Task;


/// Rows `[1, x_1, ..., x_d]` of the covariates at `columns`.
pub(crate) fn design_rows(task: &Task, columns: &[usize]) -> Vec<Vec<f64>> {
    (0..task.n_rows())
        .map(|i| {
            let mut row = Vec::with_capacity(columns.len() + 1);
            row.push(1f64);
            row.extend(columns.iter().map(|&j| task.value(i, j)));
            row
        })
        .collect()
}


/// Returns `x^T beta`.
#[inline]
pub(crate) fn linear_predictor(x: &[f64], beta: &[f64]) -> f64 {
    x.iter()
        .zip(beta)
        .map(|(a, b)| a * b)
        .sum()
}


/// Add `lambda` to the diagonal, except for the intercept.
pub(crate) fn add_ridge(gram: &mut SquareMatrix, dim: usize, lambda: f64) {
    if lambda <= 0f64 { return; }
    for k in 1..dim {
        gram.add(k, k, lambda);
    }
}


/// Solve `gram * x = rhs`.
/// If `gram` is singular, retry once with a tiny ridge on every coefficient.
pub(crate) fn solve_with_jitter(gram: &SquareMatrix, rhs: &[f64], dim: usize)
    -> Option<Vec<f64>>
{
    if let Some(x) = gram.solve(rhs) {
        return Some(x);
    }
    let jitter = 1e-8 * gram.diagonal_scale().max(1f64);
    let mut jittered = gram.clone();
    for k in 0..dim {
        jittered.add(k, k, jitter);
    }
    jittered.solve(rhs)
}


/// Pair the coefficient values with the names `(intercept), x_1, ...`.
pub(crate) fn named_coefficients(names: &[String], beta: &[f64])
    -> Vec<(String, f64)>
{
    std::iter::once("(intercept)".to_string())
        .chain(names.iter().cloned())
        .zip(beta.iter().copied())
        .collect()
}
