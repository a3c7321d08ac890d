//! A closed registry that builds learners from names and parameters.
//!
//! | name                   | parameters                                           |
//! |------------------------|------------------------------------------------------|
//! | `mean`                 |                                                      |
//! | `linear`               | `lambda`                                             |
//! | `logistic`             | `lambda`, `max_iter`, `tolerance`                    |
//! | `tree`                 | `max_depth`, `min_samples_leaf`, `lambda_l2`         |
//! | `bagged_trees`         | `n_trees`, `seed`, and the parameters of `tree`      |
//! | `screener.correlation` | `top_k`, `min_abs_correlation`                       |
//! | `pipeline`             | `stages` (a list of learner specs)                   |
//! | `stack`                | `learners` (a list of learner specs), `timeout_ms`   |
//!
//! Every learner also accepts `label`, the name it is reported with.
use serde::{Serialize, Deserialize};
use serde_json::Value;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::bagging::BaggedTrees;
use super::core::Learner;
use super::linear::LinearRegression;
use super::logistic::LogisticRegression;
use super::mean::MeanLearner;
use super::pipeline::Pipeline;
use super::screener::CorrelationScreener;
use super::stack::Stack;
use super::tree::RegressionTree;
use crate::error::{Result, SuperLearnerError};


/// The name and hyperparameters of a learner.
///
/// # Example
/// ```
/// use superlearner::prelude::*;
///
/// let spec: LearnerSpec = serde_json::from_str(
///     r#"{ "name": "tree", "params": { "max_depth": 2, "label": "stump" } }"#
/// ).unwrap();
/// let learner = make_learner(&spec).unwrap();
/// assert_eq!(learner.name(), "stump");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerSpec {
    /// The registry name.
    pub name: String,
    /// The hyperparameters.
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}


impl LearnerSpec {
    /// Construct a spec without parameters.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into(), params: BTreeMap::new(), }
    }


    /// Set a parameter.
    pub fn param<S, V>(mut self, key: S, value: V) -> Self
        where S: Into<String>,
              V: Into<Value>,
    {
        self.params.insert(key.into(), value.into());
        self
    }
}


/// Build the learner described by `spec`.
/// Unknown names, unknown parameters,
/// and parameters of the wrong type are configuration errors.
pub fn make_learner(spec: &LearnerSpec) -> Result<Arc<dyn Learner>> {
    let params = Params::new(spec);

    let learner: Arc<dyn Learner> = match spec.name.as_str() {
        "mean" => {
            params.allow(&[])?;
            let mut learner = MeanLearner::new();
            if let Some(label) = params.label()? { learner = learner.label(label); }
            Arc::new(learner)
        },
        "linear" => {
            params.allow(&["lambda"])?;
            let mut learner = LinearRegression::new();
            if let Some(lambda) = params.non_negative("lambda")? {
                learner = learner.lambda(lambda);
            }
            if let Some(label) = params.label()? { learner = learner.label(label); }
            Arc::new(learner)
        },
        "logistic" => {
            params.allow(&["lambda", "max_iter", "tolerance"])?;
            let mut learner = LogisticRegression::new();
            if let Some(lambda) = params.non_negative("lambda")? {
                learner = learner.lambda(lambda);
            }
            if let Some(max_iter) = params.usize("max_iter")? {
                learner = learner.max_iter(max_iter);
            }
            if let Some(tolerance) = params.non_negative("tolerance")? {
                learner = learner.tolerance(tolerance);
            }
            if let Some(label) = params.label()? { learner = learner.label(label); }
            Arc::new(learner)
        },
        "tree" => {
            params.allow(&TREE_PARAMS)?;
            let mut learner = tree(&params)?;
            if let Some(label) = params.label()? { learner = learner.label(label); }
            Arc::new(learner)
        },
        "bagged_trees" => {
            let mut allowed = vec!["n_trees", "seed"];
            allowed.extend(TREE_PARAMS);
            params.allow(&allowed)?;
            let mut learner = BaggedTrees::new().tree(tree(&params)?);
            if let Some(n_trees) = params.usize("n_trees")? {
                learner = learner.n_trees(n_trees);
            }
            if let Some(seed) = params.u64("seed")? {
                learner = learner.seed(seed);
            }
            if let Some(label) = params.label()? { learner = learner.label(label); }
            Arc::new(learner)
        },
        "screener.correlation" => {
            params.allow(&["top_k", "min_abs_correlation"])?;
            let mut learner = CorrelationScreener::new();
            if let Some(top_k) = params.usize("top_k")? {
                learner = learner.top_k(top_k);
            }
            if let Some(threshold) = params.non_negative("min_abs_correlation")? {
                learner = learner.min_abs_correlation(threshold);
            }
            if let Some(label) = params.label()? { learner = learner.label(label); }
            Arc::new(learner)
        },
        "pipeline" => {
            params.allow(&["stages"])?;
            let stages = params.specs("stages")?
                .iter()
                .map(make_learner)
                .collect::<Result<Vec<_>>>()?;
            let mut learner = Pipeline::new(stages);
            if let Some(label) = params.label()? { learner = learner.label(label); }
            Arc::new(learner)
        },
        "stack" => {
            params.allow(&["learners", "timeout_ms"])?;
            let learners = params.specs("learners")?
                .iter()
                .map(make_learner)
                .collect::<Result<Vec<_>>>()?;
            let mut learner = Stack::new(learners);
            if let Some(millis) = params.u64("timeout_ms")? {
                learner = learner.timeout(Duration::from_millis(millis));
            }
            if let Some(label) = params.label()? { learner = learner.label(label); }
            Arc::new(learner)
        },
        other => {
            return Err(SuperLearnerError::config(format!(
                "unknown learner `{other}`"
            )));
        },
    };
    Ok(learner)
}


const TREE_PARAMS: [&str; 3] = ["max_depth", "min_samples_leaf", "lambda_l2"];


fn tree(params: &Params<'_>) -> Result<RegressionTree> {
    let mut tree = RegressionTree::new();
    if let Some(depth) = params.usize("max_depth")? {
        tree = tree.max_depth(depth);
    }
    if let Some(size) = params.usize("min_samples_leaf")? {
        tree = tree.min_samples_leaf(size);
    }
    if let Some(lambda) = params.non_negative("lambda_l2")? {
        tree = tree.lambda_l2(lambda);
    }
    Ok(tree)
}


struct Params<'a> {
    learner: &'a str,
    values: &'a BTreeMap<String, Value>,
}


impl<'a> Params<'a> {
    fn new(spec: &'a LearnerSpec) -> Self {
        Self { learner: &spec.name, values: &spec.params, }
    }


    fn allow(&self, keys: &[&str]) -> Result<()> {
        for key in self.values.keys() {
            if key != "label" && !keys.contains(&key.as_str()) {
                return Err(SuperLearnerError::config(format!(
                    "learner `{}` has no parameter `{key}`", self.learner
                )));
            }
        }
        Ok(())
    }


    fn invalid(&self, key: &str, expected: &str) -> SuperLearnerError {
        SuperLearnerError::config(format!(
            "parameter `{key}` of learner `{}` must be {expected}",
            self.learner
        ))
    }


    fn label(&self) -> Result<Option<String>> {
        self.values.get("label")
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.invalid("label", "a string"))
            })
            .transpose()
    }


    fn non_negative(&self, key: &str) -> Result<Option<f64>> {
        self.values.get(key)
            .map(|v| {
                v.as_f64()
                    .filter(|x| x.is_finite() && *x >= 0f64)
                    .ok_or_else(|| self.invalid(key, "a non-negative number"))
            })
            .transpose()
    }


    fn u64(&self, key: &str) -> Result<Option<u64>> {
        self.values.get(key)
            .map(|v| {
                v.as_u64()
                    .ok_or_else(|| self.invalid(key, "a non-negative integer"))
            })
            .transpose()
    }


    fn usize(&self, key: &str) -> Result<Option<usize>> {
        Ok(self.u64(key)?.map(|v| v as usize))
    }


    fn specs(&self, key: &str) -> Result<Vec<LearnerSpec>> {
        let value = self.values.get(key)
            .ok_or_else(|| self.invalid(key, "given"))?;
        serde_json::from_value(value.clone())
            .map_err(|_| self.invalid(key, "a list of learner specs"))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_nested_learner() {
        let spec: LearnerSpec = serde_json::from_str(r#"{
            "name": "pipeline",
            "params": {
                "stages": [
                    { "name": "screener.correlation", "params": { "top_k": 2 } },
                    { "name": "linear", "params": { "lambda": 0.5 } }
                ]
            }
        }"#).unwrap();
        let learner = make_learner(&spec).unwrap();
        assert_eq!(learner.name(), "screener.correlation->linear");
    }

    #[test]
    fn test_unknown_name_and_parameter() {
        assert!(make_learner(&LearnerSpec::new("svm")).is_err());
        let spec = LearnerSpec::new("tree").param("depth", 2);
        assert!(make_learner(&spec).is_err());
        let spec = LearnerSpec::new("tree").param("max_depth", "deep");
        assert!(make_learner(&spec).is_err());
        let spec = LearnerSpec::new("linear").param("lambda", -1.0);
        assert!(make_learner(&spec).is_err());
    }
}
