use std::path::Path;
use std::fs::File;
use std::io::BufReader;

use super::table_struct::Table;
use crate::constants::MISSING_TOKENS;
use crate::error::{Result, SuperLearnerError};


/// A struct that returns [`Table`].
/// Using this struct, one can read a CSV format file to [`Table`].
/// # Example
/// ```no_run
/// use superlearner::prelude::*;
///
/// let table = TableReader::new()
///     .file("/path/to/csv/file.csv")
///     .has_header(true)
///     .missing_tokens(["", "NA", "?"])
///     .read()
///     .unwrap();
/// ```
pub struct TableReader<P> {
    file: Option<P>,
    has_header: bool,
    missing_tokens: Vec<String>,
}


impl<P> TableReader<P> {
    /// Construct a new instance of [`TableReader`].
    pub fn new() -> Self {
        Self {
            file: None,
            has_header: false,
            missing_tokens: MISSING_TOKENS.iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }


    /// Set the flag whether the file has the header row or not.
    /// Default is `false.`
    pub fn has_header(mut self, flag: bool) -> Self {
        self.has_header = flag;
        self
    }


    /// Set the tokens read as missing values.
    /// Default is `["", "NA", "NaN", "null"]`.
    pub fn missing_tokens<I, S>(mut self, tokens: I) -> Self
        where I: IntoIterator<Item = S>,
              S: AsRef<str>,
    {
        self.missing_tokens = tokens.into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        self
    }
}


impl<P> Default for TableReader<P> {
    fn default() -> Self {
        Self::new()
    }
}


impl<P> TableReader<P>
    where P: AsRef<Path>
{
    /// Set the file name.
    pub fn file(mut self, file: P) -> Self {
        self.file = Some(file);
        self
    }


    /// Reads the file based on the arguments.
    /// This method consumes `self.`
    pub fn read(self) -> Result<Table> {
        let file = self.file
            .ok_or_else(|| SuperLearnerError::config(
                "the file name is not set. Use `TableReader::file`."
            ))?;
        let file = File::open(file.as_ref())?;
        Table::from_reader(
            BufReader::new(file),
            self.has_header,
            &self.missing_tokens[..],
        )
    }
}
