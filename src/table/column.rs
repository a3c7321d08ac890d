/// A column of a raw table.
/// `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum RawColumn {
    /// Numeric column (continuous or binary values).
    Numeric(Vec<Option<f64>>),
    /// Text column, treated as categorical.
    Text(Vec<Option<String>>),
}


impl RawColumn {
    /// Returns the number of items in this column.
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(values) => values.len(),
            Self::Text(values) => values.len(),
        }
    }


    /// Returns `true` if this column has no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }


    /// Returns `true` if the `row`-th item is missing.
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Self::Numeric(values) => values[row].is_none(),
            Self::Text(values) => values[row].is_none(),
        }
    }


    /// Returns the number of missing items.
    pub fn n_missing(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_missing(i)).count()
    }


    /// Returns `true` if this column holds text.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }


    /// Keep the rows listed in `rows`, in that order.
    pub(crate) fn take(&self, rows: &[usize]) -> Self {
        match self {
            Self::Numeric(values) => {
                Self::Numeric(rows.iter().map(|&i| values[i]).collect())
            },
            Self::Text(values) => {
                Self::Text(rows.iter().map(|&i| values[i].clone()).collect())
            },
        }
    }
}


impl From<Vec<f64>> for RawColumn {
    fn from(values: Vec<f64>) -> Self {
        let values = values.into_iter()
            .map(|v| if v.is_nan() { None } else { Some(v) })
            .collect();
        Self::Numeric(values)
    }
}


impl From<Vec<Option<f64>>> for RawColumn {
    fn from(values: Vec<Option<f64>>) -> Self {
        Self::Numeric(values)
    }
}


impl From<Vec<&str>> for RawColumn {
    fn from(values: Vec<&str>) -> Self {
        let values = values.into_iter()
            .map(|v| Some(v.to_string()))
            .collect();
        Self::Text(values)
    }
}


impl From<Vec<Option<&str>>> for RawColumn {
    fn from(values: Vec<Option<&str>>) -> Self {
        let values = values.into_iter()
            .map(|v| v.map(str::to_string))
            .collect();
        Self::Text(values)
    }
}


impl From<Vec<String>> for RawColumn {
    fn from(values: Vec<String>) -> Self {
        Self::Text(values.into_iter().map(Some).collect())
    }
}
