use std::sync::Arc;


/// The kind of a covariate column of a [`Task`](crate::Task).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Real valued covariate.
    Continuous,
    /// Covariate in `{0, 1}`, including the level indicators
    /// of a categorical column.
    Binary,
    /// Missingness indicator, `1` for imputed rows.
    Indicator,
}


/// A complete (imputed) covariate column.
/// The values are shared between every task derived from the same data.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    values: Arc<[f64]>,
}


impl Column {
    /// Construct a new column.
    pub fn new<S: Into<String>>(name: S, kind: ColumnKind, values: Vec<f64>)
        -> Self
    {
        Self { name: name.into(), kind, values: values.into(), }
    }


    /// Construct a continuous column.
    pub fn continuous<S: Into<String>>(name: S, values: Vec<f64>) -> Self {
        Self::new(name, ColumnKind::Continuous, values)
    }


    /// Returns the column name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }


    /// Returns the column kind.
    #[inline]
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }


    /// Returns the values of the backing storage.
    /// Use [`Task::value`](crate::Task::value) to read the rows of a task.
    #[inline]
    pub(crate) fn values(&self) -> &[f64] {
        &self.values[..]
    }


    /// Returns a copy of this column with the values replaced.
    pub(crate) fn with_values(&self, values: Vec<f64>) -> Self {
        Self::new(self.name.clone(), self.kind, values)
    }
}
