use serde::{Serialize, Deserialize};


/// Predictions of several learners on the same rows.
/// Column `k` holds the predictions of the `k`-th learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionMatrix {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
}


impl PredictionMatrix {
    /// Construct a new matrix from columns of equal length.
    pub fn new(names: Vec<String>, columns: Vec<Vec<f64>>) -> Self {
        assert_eq!(names.len(), columns.len());
        let n_rows = columns.first().map_or(0, Vec::len);
        assert!(columns.iter().all(|c| c.len() == n_rows));
        Self { names, columns, n_rows, }
    }


    /// Returns the number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }


    /// Returns the number of learners.
    #[inline]
    pub fn n_learners(&self) -> usize {
        self.columns.len()
    }


    /// Returns the learner names.
    pub fn names(&self) -> &[String] {
        &self.names[..]
    }


    /// Returns the predictions of the `k`-th learner.
    pub fn column(&self, k: usize) -> &[f64] {
        &self.columns[k][..]
    }


    /// Returns the predictions of the learner named `name`.
    pub fn column_by_name(&self, name: &str) -> Option<&[f64]> {
        self.names.iter()
            .position(|n| n == name)
            .map(|k| self.column(k))
    }


    /// Returns the columns.
    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns[..]
    }


    /// Returns the predictions of every learner at the `i`-th row.
    pub fn row(&self, i: usize) -> Vec<f64> {
        self.columns.iter()
            .map(|c| c[i])
            .collect()
    }


    /// Returns `sum_k weights[k] * column(k)`.
    pub fn combine(&self, weights: &[f64]) -> Vec<f64> {
        assert_eq!(weights.len(), self.n_learners());
        let mut output = vec![0f64; self.n_rows];
        for (column, &w) in self.columns.iter().zip(weights) {
            if w == 0f64 { continue; }
            output.iter_mut()
                .zip(column)
                .for_each(|(o, p)| { *o += w * p; });
        }
        output
    }


    /// Returns the matrix restricted to the learners in `keep`.
    pub fn select(&self, keep: &[usize]) -> Self {
        let names = keep.iter().map(|&k| self.names[k].clone()).collect();
        let columns = keep.iter().map(|&k| self.columns[k].clone()).collect();
        Self::new(names, columns)
    }
}
