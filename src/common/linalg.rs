//! Dense solvers for the small normal equations
//! that the linear learners produce.

use crate::constants::PIVOT_TOLERANCE;


/// A square matrix stored in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SquareMatrix {
    dim: usize,
    entries: Vec<f64>,
}


impl SquareMatrix {
    /// Construct the `dim x dim` zero matrix.
    pub(crate) fn zeros(dim: usize) -> Self {
        Self { dim, entries: vec![0f64; dim * dim], }
    }


    #[inline(always)]
    pub(crate) fn get(&self, i: usize, j: usize) -> f64 {
        self.entries[i * self.dim + j]
    }


    #[inline(always)]
    pub(crate) fn add(&mut self, i: usize, j: usize, value: f64) {
        self.entries[i * self.dim + j] += value;
    }


    /// Add `weight * x x^T` to `self`.
    pub(crate) fn add_outer(&mut self, x: &[f64], weight: f64) {
        for (i, xi) in x.iter().enumerate() {
            let row = &mut self.entries[i * self.dim..(i + 1) * self.dim];
            row.iter_mut()
                .zip(x)
                .for_each(|(a, xj)| { *a += weight * xi * xj; });
        }
    }


    /// Mean absolute value of the diagonal.
    pub(crate) fn diagonal_scale(&self) -> f64 {
        if self.dim == 0 { return 0f64; }
        (0..self.dim).map(|i| self.get(i, i).abs())
            .sum::<f64>()
            / self.dim as f64
    }


    /// Solves `self * x = b` by Gaussian elimination
    /// with partial pivoting.
    /// Returns `None` if the matrix is (numerically) singular.
    pub(crate) fn solve(&self, b: &[f64]) -> Option<Vec<f64>> {
        let n = self.dim;
        assert_eq!(n, b.len());

        let width = n + 1;
        let mut aug = vec![0f64; n * width];
        for i in 0..n {
            aug[i * width..i * width + n]
                .copy_from_slice(&self.entries[i * n..(i + 1) * n]);
            aug[i * width + n] = b[i];
        }

        let scale = self.diagonal_scale().max(1f64);
        for i in 0..n {
            let pivot_row = (i..n)
                .max_by(|&p, &q| {
                    aug[p * width + i].abs()
                        .total_cmp(&aug[q * width + i].abs())
                })?;
            if aug[pivot_row * width + i].abs() < PIVOT_TOLERANCE * scale {
                return None;
            }
            if pivot_row != i {
                for j in 0..width {
                    aug.swap(i * width + j, pivot_row * width + j);
                }
            }

            let pivot = aug[i * width + i];
            for j in i..width {
                aug[i * width + j] /= pivot;
            }
            for k in 0..n {
                if k == i { continue; }
                let factor = aug[k * width + i];
                if factor == 0f64 { continue; }
                for j in i..width {
                    aug[k * width + j] -= factor * aug[i * width + j];
                }
            }
        }

        let x = (0..n).map(|i| aug[i * width + n]).collect::<Vec<_>>();
        if x.iter().all(|v| v.is_finite()) { Some(x) } else { None }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solve_2x2() {
        let mut a = SquareMatrix::zeros(2);
        a.add(0, 0, 2.0);
        a.add(0, 1, 1.0);
        a.add(1, 0, 1.0);
        a.add(1, 1, 3.0);
        let x = a.solve(&[3.0, 5.0]).unwrap();
        assert_relative_eq!(x[0], 0.8, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.4, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_matrix() {
        let mut a = SquareMatrix::zeros(2);
        a.add_outer(&[1.0, 2.0], 1.0);
        assert!(a.solve(&[1.0, 2.0]).is_none());
    }
}
