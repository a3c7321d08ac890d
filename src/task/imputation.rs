//! Missing value imputation performed while a task is built.
//!
//! - Continuous columns are filled with the median of the observed values.
//! - Binary and categorical columns are filled with the mode.
//!   Ties go to the smallest value (or the first level in sorted order).
//! - Every column with at least one missing value gets
//!   an indicator column `delta_<name>` that is `1` on the imputed rows.
//! - Text columns are expanded into the indicators `<name>_<level>`
//!   of every level but the first.
//!
//! The fill values, levels, and indicators learned on one table
//! form an [`ImputationRule`] per raw column.
//! Applying the rules of a training task to new data
//! yields the covariates the trained learners expect.
use log::{info, warn};
use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;

use super::column::{Column, ColumnKind};
use crate::common::helpers;
use crate::constants::INDICATOR_PREFIX;
use crate::error::{Result, SuperLearnerError};
use crate::table::RawColumn;


/// Imputed columns of one raw column.
pub(crate) struct Imputed {
    /// The covariates replacing the raw column.
    pub(crate) columns: Vec<Column>,
    /// The missingness indicator, if the rule has one.
    pub(crate) indicator: Option<Column>,
}


/// How the missing values of a raw column are filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Encoding {
    /// A numeric column filled with `fill`.
    Numeric {
        /// `true` if every observed value is `0` or `1`.
        binary: bool,
        /// The median (continuous) or the mode (binary).
        fill: f64,
    },
    /// A text column expanded into level indicators.
    Text {
        /// Every level in sorted order. The first one is the baseline.
        levels: Vec<String>,
        /// The most frequent level.
        fill: String,
    },
}


/// The imputation of one raw covariate column,
/// learned on the table a task is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationRule {
    name: String,
    encoding: Encoding,
    indicator: bool,
}


impl ImputationRule {
    /// Learn the rule of the raw column `name`.
    pub(crate) fn learn(name: &str, column: &RawColumn) -> Result<Self> {
        let encoding = match column {
            RawColumn::Numeric(values) => {
                let observed = values.iter()
                    .flatten()
                    .copied()
                    .collect::<Vec<_>>();
                let binary = observed.iter().all(|&x| x == 0f64 || x == 1f64);
                let fill = if binary {
                    helpers::mode(&observed)
                } else {
                    helpers::median(&observed)
                };
                let fill = fill.ok_or_else(|| no_observed_value(name))?;
                Encoding::Numeric { binary, fill, }
            },
            RawColumn::Text(values) => {
                let mut counts = BTreeMap::<&str, usize>::new();
                for v in values.iter().flatten() {
                    *counts.entry(v.as_str()).or_insert(0) += 1;
                }

                // `BTreeMap` iterates the levels in sorted order,
                // so a strict comparison keeps the first level among ties.
                let mut mode: Option<(&str, usize)> = None;
                for (&level, &count) in counts.iter() {
                    match mode {
                        Some((_, c)) if count <= c => {},
                        _ => { mode = Some((level, count)); },
                    }
                }
                let (fill, _) = mode.ok_or_else(|| no_observed_value(name))?;
                let levels = counts.keys()
                    .map(|level| level.to_string())
                    .collect();
                Encoding::Text { levels, fill: fill.to_string(), }
            },
        };

        let indicator = column.n_missing() > 0;
        Ok(Self { name: name.to_string(), encoding, indicator, })
    }


    /// Returns the name of the raw column.
    pub fn name(&self) -> &str {
        &self.name
    }


    /// Returns the encoding of the raw column.
    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }


    /// Returns `true` if the rule adds a missingness indicator.
    pub fn has_indicator(&self) -> bool {
        self.indicator
    }


    /// Returns the names of the covariates this rule produces,
    /// except the indicator.
    pub fn covariate_names(&self) -> Vec<String> {
        match &self.encoding {
            Encoding::Numeric { .. } => vec![self.name.clone()],
            Encoding::Text { levels, .. } => {
                levels.iter()
                    .skip(1)
                    .map(|level| format!("{}_{level}", self.name))
                    .collect()
            },
        }
    }


    /// Returns the name of the missingness indicator.
    pub fn indicator_name(&self) -> Option<String> {
        self.indicator
            .then(|| format!("{INDICATOR_PREFIX}{}", self.name))
    }


    /// Fill the missing values of `column` and encode it.
    pub(crate) fn apply(&self, column: &RawColumn) -> Result<Imputed> {
        let name = self.name.as_str();
        let n_missing = column.n_missing();
        if n_missing > 0 && !self.indicator {
            warn!(
                "covariate `{name}` had no missing value when the rule was learned. \
                 Its {n_missing} missing values are filled without an indicator"
            );
        }

        let columns = match (&self.encoding, column) {
            (Encoding::Numeric { binary, fill }, RawColumn::Numeric(values)) => {
                let kind = if *binary {
                    ColumnKind::Binary
                } else {
                    ColumnKind::Continuous
                };
                let filled = values.iter()
                    .map(|v| v.unwrap_or(*fill))
                    .collect::<Vec<_>>();
                if n_missing > 0 {
                    info!("imputed {n_missing} missing values of `{name}` with {fill}");
                }
                vec![Column::new(name, kind, filled)]
            },
            (Encoding::Text { levels, fill }, RawColumn::Text(values)) => {
                let n_unknown = values.iter()
                    .flatten()
                    .filter(|v| !levels.contains(*v))
                    .count();
                if n_unknown > 0 {
                    warn!(
                        "covariate `{name}` has {n_unknown} values of unseen levels. \
                         They are encoded as the baseline level"
                    );
                }
                if n_missing > 0 {
                    info!("imputed {n_missing} missing values of `{name}` with level `{fill}`");
                }
                levels.iter()
                    .skip(1)
                    .map(|level| {
                        let dummy = values.iter()
                            .map(|v| {
                                let v = v.as_deref().unwrap_or(fill.as_str());
                                if v == level.as_str() { 1f64 } else { 0f64 }
                            })
                            .collect::<Vec<_>>();
                        Column::new(format!("{name}_{level}"), ColumnKind::Binary, dummy)
                    })
                    .collect()
            },
            _ => {
                return Err(SuperLearnerError::config(format!(
                    "covariate `{name}` is numeric in one table and text in the other"
                )));
            },
        };

        let indicator = self.indicator_name()
            .map(|indicator| {
                let values = (0..column.len())
                    .map(|i| if column.is_missing(i) { 1f64 } else { 0f64 })
                    .collect::<Vec<_>>();
                Column::new(indicator, ColumnKind::Indicator, values)
            });

        Ok(Imputed { columns, indicator, })
    }
}


/// The imputation rules of every raw covariate of a task, in order.
///
/// Build a task on new data with the schema of a training task
/// through [`TaskBuilder::schema_from`](crate::TaskBuilder::schema_from).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CovariateSchema {
    rules: Vec<ImputationRule>,
}


impl CovariateSchema {
    pub(crate) fn new(rules: Vec<ImputationRule>) -> Self {
        Self { rules }
    }


    /// Returns the rules, one per raw covariate.
    pub fn rules(&self) -> &[ImputationRule] {
        &self.rules[..]
    }


    /// Returns `true` if the schema has no rule.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }


    /// Returns the names of the raw covariate columns.
    pub fn raw_names(&self) -> Vec<String> {
        self.rules.iter()
            .map(|rule| rule.name().to_string())
            .collect()
    }


    /// Returns the names of the covariates, indicators last.
    pub fn covariate_names(&self) -> Vec<String> {
        let mut names = self.rules.iter()
            .flat_map(|rule| rule.covariate_names())
            .collect::<Vec<_>>();
        names.extend(self.rules.iter().filter_map(|rule| rule.indicator_name()));
        names
    }
}


/// Learn the rule of a raw column and apply it.
pub(crate) fn impute(name: &str, column: &RawColumn)
    -> Result<(Imputed, ImputationRule)>
{
    let rule = ImputationRule::learn(name, column)?;
    let imputed = rule.apply(column)?;
    Ok((imputed, rule))
}


fn no_observed_value(name: &str) -> SuperLearnerError {
    SuperLearnerError::config(format!(
        "covariate `{name}` has no observed value"
    ))
}


#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(values: &[Option<f64>]) -> RawColumn {
        RawColumn::Numeric(values.to_vec())
    }

    fn text(values: &[Option<&str>]) -> RawColumn {
        RawColumn::Text(
            values.iter().map(|v| v.map(str::to_string)).collect()
        )
    }

    #[test]
    fn test_numeric_median_imputation() {
        let column = numeric(&[Some(1.0), None, Some(3.0), None, Some(5.0)]);
        let (imputed, rule) = impute("x", &column).unwrap();

        assert_eq!(imputed.columns.len(), 1);
        assert_eq!(imputed.columns[0].values(), &[1.0, 3.0, 3.0, 3.0, 5.0]);
        assert_eq!(imputed.columns[0].kind(), ColumnKind::Continuous);

        let indicator = imputed.indicator.unwrap();
        assert_eq!(indicator.name(), "delta_x");
        assert_eq!(indicator.values(), &[0.0, 1.0, 0.0, 1.0, 0.0]);
        assert_eq!(rule.encoding(), &Encoding::Numeric { binary: false, fill: 3.0 });
    }

    #[test]
    fn test_binary_mode_imputation() {
        let column = numeric(&[Some(1.0), Some(0.0), None, Some(1.0)]);
        let (imputed, _) = impute("b", &column).unwrap();
        assert_eq!(imputed.columns[0].kind(), ColumnKind::Binary);
        assert_eq!(imputed.columns[0].values(), &[1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_complete_column_has_no_indicator() {
        let (imputed, rule) = impute("x", &numeric(&[Some(2.0), Some(4.0)])).unwrap();
        assert!(imputed.indicator.is_none());
        assert!(!rule.has_indicator());
    }

    #[test]
    fn test_text_levels_and_mode() {
        let column = text(&[Some("b"), Some("a"), None, Some("c"), Some("b")]);
        let (imputed, rule) = impute("g", &column).unwrap();
        let names = imputed.columns.iter()
            .map(|c| c.name())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["g_b", "g_c"]);
        assert_eq!(rule.covariate_names(), vec!["g_b", "g_c"]);
        // The missing row takes the mode `b`.
        assert_eq!(imputed.columns[0].values(), &[1.0, 0.0, 1.0, 0.0, 1.0]);
        assert_eq!(imputed.columns[1].values(), &[0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(imputed.indicator.unwrap().values(), &[0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fully_missing_column() {
        assert!(impute("x", &numeric(&[None, None])).is_err());
    }

    #[test]
    fn test_rule_applied_to_new_data() {
        let train = numeric(&[Some(1.0), None, Some(3.0), Some(7.0)]);
        let rule = ImputationRule::learn("x", &train).unwrap();

        // Complete data keeps the indicator, with zeros only.
        let complete = rule.apply(&numeric(&[Some(2.0), Some(9.0)])).unwrap();
        assert_eq!(complete.columns[0].values(), &[2.0, 9.0]);
        assert_eq!(complete.indicator.unwrap().values(), &[0.0, 0.0]);

        // Missing values take the training median, not their own.
        let missing = rule.apply(&numeric(&[None, Some(100.0), None])).unwrap();
        assert_eq!(missing.columns[0].values(), &[3.0, 100.0, 3.0]);

        // Even a fully missing column is filled.
        let empty = rule.apply(&numeric(&[None, None])).unwrap();
        assert_eq!(empty.columns[0].values(), &[3.0, 3.0]);

        assert!(rule.apply(&text(&[Some("a")])).is_err());
    }

    #[test]
    fn test_text_rule_keeps_training_levels() {
        let train = text(&[Some("a"), Some("b"), Some("c"), Some("b")]);
        let rule = ImputationRule::learn("g", &train).unwrap();

        // Level `c` is absent and level `d` is unseen.
        let imputed = rule.apply(&text(&[Some("b"), Some("d"), None])).unwrap();
        let names = imputed.columns.iter()
            .map(|c| c.name())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["g_b", "g_c"]);
        assert_eq!(imputed.columns[0].values(), &[1.0, 0.0, 1.0]);
        assert_eq!(imputed.columns[1].values(), &[0.0, 0.0, 0.0]);
        // No missing value while learning, hence no indicator.
        assert!(imputed.indicator.is_none());
    }
}
