use std::path::Path;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::collections::HashMap;
use std::ops::Index;

use polars::prelude::*;
use rayon::prelude::*;

use super::column::RawColumn;
use crate::constants::MISSING_TOKENS;
use crate::error::{Result, SuperLearnerError};


/// Struct `Table` holds a raw dataset with named columns.
/// Each column is either numeric or text,
/// and any item may be missing.
///
/// A `Table` is never modified by the library.
/// [`TaskBuilder`](crate::TaskBuilder) reads it and
/// constructs an imputed, immutable [`Task`](crate::Task).
///
/// # Example
/// ```
/// use superlearner::prelude::*;
///
/// let table = Table::new()
///     .with_column("x", vec![Some(1f64), None, Some(3f64)]).unwrap()
///     .with_column("y", vec![0.5, 1.5, 2.5]).unwrap();
/// assert_eq!(table.shape(), (3, 2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Table {
    names: Vec<String>,
    name_to_index: HashMap<String, usize>,
    columns: Vec<RawColumn>,
    n_rows: usize,
}


impl Table {
    /// Construct an empty table.
    pub fn new() -> Self {
        Self::default()
    }


    /// Append a column named `name` and return `self`.
    /// Fails if the name is already used
    /// or if the length differs from the other columns.
    pub fn with_column<S, C>(mut self, name: S, column: C) -> Result<Self>
        where S: AsRef<str>,
              C: Into<RawColumn>,
    {
        self.push_column(name, column)?;
        Ok(self)
    }


    /// Append a numeric column. `None` marks a missing value.
    pub fn push_numeric<S>(&mut self, name: S, values: Vec<Option<f64>>)
        -> Result<()>
        where S: AsRef<str>
    {
        self.push_column(name, RawColumn::Numeric(values))
    }


    /// Append a text column. `None` marks a missing value.
    pub fn push_text<S>(&mut self, name: S, values: Vec<Option<String>>)
        -> Result<()>
        where S: AsRef<str>
    {
        self.push_column(name, RawColumn::Text(values))
    }


    /// Append a column.
    pub fn push_column<S, C>(&mut self, name: S, column: C) -> Result<()>
        where S: AsRef<str>,
              C: Into<RawColumn>,
    {
        let name = name.as_ref().to_string();
        let column = column.into();

        if self.name_to_index.contains_key(&name) {
            return Err(SuperLearnerError::config(format!(
                "column `{name}` appears twice in the table"
            )));
        }
        if !self.columns.is_empty() && column.len() != self.n_rows {
            return Err(SuperLearnerError::config(format!(
                "column `{name}` has {} rows, but the table has {} rows",
                column.len(), self.n_rows
            )));
        }

        self.n_rows = column.len();
        self.name_to_index.insert(name.clone(), self.names.len());
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }


    /// Read a CSV format file to `Table` type.
    /// The tokens `""`, `NA`, `NaN`, and `null` are read as missing values.
    pub fn from_csv<P>(file: P, has_header: bool) -> Result<Self>
        where P: AsRef<Path>,
    {
        let file = File::open(file)?;
        Self::from_reader(BufReader::new(file), has_header, &MISSING_TOKENS)
    }


    /// Read CSV formatted lines from `reader`.
    ///
    /// A column whose non-missing items all parse as `f64`
    /// becomes a numeric column; any other column becomes a text column.
    /// Without a header row, the columns are named `Feat. [1]`, `Feat. [2]`, ...
    pub fn from_reader<R, S>(reader: R, has_header: bool, missing: &[S])
        -> Result<Self>
        where R: BufRead,
              S: AsRef<str>,
    {
        let mut lines = reader.lines();

        let mut names = Vec::new();
        if has_header {
            let line = lines.next()
                .ok_or_else(|| SuperLearnerError::config(
                    "the CSV input is empty, but a header row is expected"
                ))??;
            names = split_line(&line);
        }

        let mut tokens: Vec<Vec<String>> = Vec::new();
        for (row, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            let items = split_line(&line);

            if names.is_empty() {
                names = (1..=items.len())
                    .map(|i| format!("Feat. [{i}]"))
                    .collect();
            }
            if tokens.is_empty() {
                tokens = vec![Vec::new(); names.len()];
            }
            if items.len() != names.len() {
                return Err(SuperLearnerError::config(format!(
                    "line {} of the CSV input has {} items, expected {}",
                    row + 1 + usize::from(has_header),
                    items.len(),
                    names.len()
                )));
            }

            for (column, item) in tokens.iter_mut().zip(items) {
                column.push(item);
            }
        }
        if tokens.is_empty() {
            tokens = vec![Vec::new(); names.len()];
        }

        let missing = missing.iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>();
        let columns = tokens.into_par_iter()
            .map(|column| parse_column(column, &missing))
            .collect::<Vec<_>>();

        let mut table = Self::new();
        for (name, column) in names.into_iter().zip(columns) {
            table.push_column(name, column)?;
        }
        Ok(table)
    }


    /// Convert `polars::DataFrame` into `Table`.
    /// Numeric and boolean series are cast to `f64`,
    /// `Utf8` series become text columns, and nulls become missing values.
    pub fn from_dataframe(data: &DataFrame) -> Result<Self> {
        let mut table = Self::new();
        for series in data.get_columns() {
            let column = match series.dtype() {
                DataType::Utf8 => {
                    let values = series.utf8()?
                        .into_iter()
                        .map(|v| v.map(str::to_string))
                        .collect::<Vec<_>>();
                    RawColumn::Text(values)
                },
                _ => {
                    let values = series.cast(&DataType::Float64)?
                        .f64()?
                        .into_iter()
                        .map(|v| v.filter(|x| !x.is_nan()))
                        .collect::<Vec<_>>();
                    RawColumn::Numeric(values)
                },
            };
            table.push_column(series.name(), column)?;
        }
        Ok(table)
    }


    /// Returns the pair of the number of rows and columns.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.columns.len())
    }


    /// Returns the column names in order.
    pub fn names(&self) -> &[String] {
        &self.names[..]
    }


    /// Returns the column named `name`, if any.
    pub fn column<S: AsRef<str>>(&self, name: S) -> Option<&RawColumn> {
        self.name_to_index.get(name.as_ref())
            .map(|&i| &self.columns[i])
    }


    /// Returns `true` if the table has a column named `name`.
    pub fn contains<S: AsRef<str>>(&self, name: S) -> bool {
        self.name_to_index.contains_key(name.as_ref())
    }
}


impl<S> Index<S> for Table
    where S: AsRef<str>
{
    type Output = RawColumn;
    fn index(&self, name: S) -> &Self::Output {
        let name = name.as_ref();
        let index = self.name_to_index.get(name)
            .unwrap_or_else(|| panic!("the column `{name}` does not exist"));
        &self.columns[*index]
    }
}


fn split_line(line: &str) -> Vec<String> {
    line.split(',')
        .map(|x| x.trim().trim_matches('"').to_string())
        .collect()
}


fn parse_column(tokens: Vec<String>, missing: &[&str]) -> RawColumn {
    let is_missing = |token: &str| missing.contains(&token);

    let numeric = tokens.iter()
        .filter(|t| !is_missing(t))
        .all(|t| t.parse::<f64>().is_ok());

    if numeric {
        let values = tokens.iter()
            .map(|t| {
                if is_missing(t) { return None; }
                t.parse::<f64>().ok().filter(|x| !x.is_nan())
            })
            .collect();
        RawColumn::Numeric(values)
    } else {
        let values = tokens.into_iter()
            .map(|t| if is_missing(&t) { None } else { Some(t) })
            .collect();
        RawColumn::Text(values)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_with_missing_values() {
        let csv = "x,group,y\n1,a,0.5\nNA,b,1.5\n3,,NA\n";
        let table = Table::from_reader(csv.as_bytes(), true, &MISSING_TOKENS)
            .unwrap();

        assert_eq!(table.shape(), (3, 3));
        assert_eq!(
            table["x"],
            RawColumn::Numeric(vec![Some(1.0), None, Some(3.0)])
        );
        assert!(table["group"].is_text());
        assert_eq!(table["group"].n_missing(), 1);
        assert_eq!(table["y"].n_missing(), 1);
    }

    #[test]
    fn test_read_csv_without_header() {
        let csv = "1,2\n3,4\n";
        let table = Table::from_reader(csv.as_bytes(), false, &MISSING_TOKENS)
            .unwrap();
        assert_eq!(table.names(), &["Feat. [1]", "Feat. [2]"]);
        assert_eq!(table.shape(), (2, 2));
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let csv = "a,b\n1,2\n3\n";
        let result = Table::from_reader(csv.as_bytes(), true, &MISSING_TOKENS);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_column_name() {
        let result = Table::new()
            .with_column("x", vec![1.0, 2.0]).unwrap()
            .with_column("x", vec![3.0, 4.0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_dataframe() {
        let x = Series::new("x", &[Some(1.0), None, Some(3.0)]);
        let flag = Series::new("flag", &[true, false, true]);
        let name = Series::new("name", &["a", "b", "c"]);
        let df = DataFrame::new(vec![x, flag, name]).unwrap();
        let table = Table::from_dataframe(&df).unwrap();
        assert_eq!(table.shape(), (3, 3));
        assert_eq!(table["x"].n_missing(), 1);
        assert_eq!(
            table["flag"],
            RawColumn::Numeric(vec![Some(1.0), Some(0.0), Some(1.0)])
        );
        assert!(table["name"].is_text());
    }
}
