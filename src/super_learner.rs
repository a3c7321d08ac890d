//! The Super Learner:
//! cross-validated stacking of the learners of a [`Stack`].

// Provides the fitted super learner.
pub(crate) mod fitted;
// Provides the nested cross-validation.
pub(crate) mod nested;

use colored::Colorize;
use log::{info, warn};

use std::time::Duration;

use crate::constants::{ENSEMBLE_NAME, FULL_WIDTH};
use crate::cross_validation::{cross_validate, CvOptions, DroppedLearner};
use crate::error::{Result, SuperLearnerError};
use crate::learner::{Capabilities, FittedLearner, FittedStack, Learner, Stack};
use crate::loss::{Loss, LossFunction};
use crate::metalearner::MetalearnerKind;
use crate::task::{Column, Task};

pub use fitted::FittedSuperLearner;
pub use nested::NestedCvResult;


const STAT_WIDTH: usize = 30;


/// The Super Learner.
///
/// `SuperLearner::fit` proceeds as follows.
/// 1. [`cross_validate`] the stack over the folds of the task,
///    which gives the out-of-fold predictions and the cross-validated risks.
///    The learner with the minimal risk is the discrete selector.
/// 2. Train the stack on the whole task.
/// 3. Train the metalearner on the out-of-fold predictions.
///
/// The ensemble prediction is the combination,
/// with the metalearner weights,
/// of the predictions of the stack trained on the whole task.
///
/// # Example
/// ```no_run
/// use superlearner::prelude::*;
///
/// let table = Table::from_csv("data.csv", true).unwrap();
/// let task = TaskBuilder::new(&table)
///     .outcome("y")
///     .n_folds(5)
///     .seed(777)
///     .build()
///     .unwrap();
///
/// let stack = Stack::empty()
///     .add(MeanLearner::new())
///     .add(LinearRegression::new())
///     .add(RegressionTree::new().max_depth(3));
/// let fit = SuperLearner::new(stack)
///     .metalearner(MetalearnerKind::Convex)
///     .verbose(true)
///     .fit(&task)
///     .unwrap();
///
/// println!("{}", fit.risk_table());
/// let predictions = fit.predict(&task).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct SuperLearner {
    name: String,
    stack: Stack,
    metalearner: MetalearnerKind,
    loss: Option<Loss>,
    options: CvOptions,
}


impl SuperLearner {
    /// Construct a super learner over the learners of `stack`.
    pub fn new(stack: Stack) -> Self {
        Self {
            name: ENSEMBLE_NAME.to_string(),
            stack,
            metalearner: MetalearnerKind::Convex,
            loss: None,
            options: CvOptions::new(),
        }
    }


    /// Set the name of this learner.
    pub fn label<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }


    /// Set the metalearner. Default is [`MetalearnerKind::Convex`].
    pub fn metalearner(mut self, kind: MetalearnerKind) -> Self {
        self.metalearner = kind;
        self
    }


    /// Set the loss function.
    /// By default, the loss is chosen by the outcome type,
    /// see [`Loss::default_for`].
    pub fn loss(mut self, loss: Loss) -> Self {
        self.loss = Some(loss);
        self
    }


    /// Set the time limit of each learner's training.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.stack = self.stack.timeout(limit);
        self
    }


    /// If `true`, a learner that fails in some fold, or in the full refit,
    /// is dropped from the ensemble instead of failing the fit.
    /// Default is `false`.
    pub fn drop_failed_learners(mut self, flag: bool) -> Self {
        self.options = self.options.drop_failed_learners(flag);
        self
    }


    /// Set the flag whether the folds and the learners
    /// are processed in parallel. Default is `true`.
    pub fn parallel(mut self, flag: bool) -> Self {
        self.options = self.options.parallel(flag);
        self.stack = self.stack.parallel(flag);
        self
    }


    /// If `true`, prints the settings and the progress of each fold.
    /// Default is `false`.
    pub fn verbose(mut self, flag: bool) -> Self {
        self.options = self.options.verbose(flag);
        self
    }


    /// Returns the stack.
    pub fn stack(&self) -> &Stack {
        &self.stack
    }


    /// Returns the metalearner.
    pub fn metalearner_kind(&self) -> MetalearnerKind {
        self.metalearner
    }


    /// Returns the loss used on `task`.
    pub fn loss_for(&self, task: &Task) -> Loss {
        self.loss.unwrap_or_else(|| Loss::default_for(task.outcome_type()))
    }


    /// Train the super learner on `task`.
    pub fn fit(&self, task: &Task) -> Result<FittedSuperLearner> {
        self.capabilities().check(&self.name, task)?;
        let loss = self.loss_for(task);
        if self.options.is_verbose() {
            self.print_stats(&loss);
        }

        let cv = cross_validate(&self.stack, task, &loss, &self.options)?;
        let mut dropped = cv.dropped().to_vec();

        // Full refit of the learners that survived the cross-validation.
        let stack = self.stack.select(cv.kept());
        let mut keep = Vec::with_capacity(stack.len());
        let mut fitted = Vec::with_capacity(stack.len());
        for (k, (result, name)) in stack.train_each(task)
            .into_iter()
            .zip(stack.learner_names())
            .enumerate()
        {
            match result {
                Ok(f) => {
                    keep.push(k);
                    fitted.push(f);
                },
                Err(e) if self.options.drops_failed_learners() => {
                    warn!("dropped learner `{name}` after the full refit: {e}");
                    dropped.push(DroppedLearner {
                        learner: name.clone(),
                        reason: e.to_string(),
                    });
                },
                Err(e) => { return Err(e); },
            }
        }
        if fitted.is_empty() {
            return Err(SuperLearnerError::training(
                self.name.as_str(), "every learner failed the full refit"
            ));
        }

        let oof = cv.oof().select(&keep);
        let risk_table = cv.risk_table().select(&keep);
        let names = oof.names().to_vec();
        let fitted_stack = FittedStack::new(self.stack.name().to_string(), names, fitted);

        let columns = oof.names()
            .iter()
            .zip(oof.columns())
            .map(|(name, values)| Column::continuous(name.as_str(), values.clone()))
            .collect();
        let meta_task = task.with_covariates(columns)?;
        let metalearner = self.metalearner.fit(loss, &meta_task)?;

        let discrete = risk_table.discrete_selector_index()
            .ok_or_else(|| SuperLearnerError::training(
                self.name.as_str(), "the risk table is empty"
            ))?;
        info!(
            "`{}` trained with {} learners ({} dropped)",
            self.name, fitted_stack.len(), dropped.len()
        );

        Ok(FittedSuperLearner::new(
            self.name.clone(),
            task,
            loss,
            self.metalearner,
            fitted_stack,
            metalearner,
            risk_table,
            discrete,
            dropped,
            oof,
            cv.fold_of_row().to_vec(),
        ))
    }


    fn print_stats(&self, loss: &Loss) {
        let header = format!(
            "{:=>FULL_WIDTH$}\n{:^FULL_WIDTH$}\n{:->FULL_WIDTH$}",
            "", "SUPER LEARNER".bold(), "",
        );
        println!("\n{header}");
        for (learner, name) in self.stack.learners().iter().zip(self.stack.learner_names()) {
            println!(
                "+ {:<STAT_WIDTH$}\t{:>STAT_WIDTH$}",
                "Learner".bold(),
                name.bold().green(),
            );
            if let Some(info) = learner.info() {
                let line = info.into_iter()
                    .map(|(key, val)| {
                        format!(
                            "    + {:<STAT_WIDTH$}\t{:>width$}",
                            key,
                            val.bold().yellow(),
                            width = STAT_WIDTH - 8
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                println!("{line}");
            }
        }
        println!(
            "\
            + {:<STAT_WIDTH$}\t{:>STAT_WIDTH$}\n\
            + {:<STAT_WIDTH$}\t{:>STAT_WIDTH$}\n\
            {:=^FULL_WIDTH$}\n\
            ",
            "Metalearner".bold(),
            self.metalearner.to_string().bold().green(),
            "Loss".bold(),
            loss.name().bold().green(),
            "".bold(),
        );
    }
}


impl Learner for SuperLearner {
    fn name(&self) -> &str {
        &self.name
    }


    fn info(&self) -> Option<Vec<(&str, String)>> {
        let loss = self.loss.map_or("default".to_string(), |l| l.to_string());
        Some(vec![
            ("Learners", self.stack.learner_names().join(", ")),
            ("Metalearner", self.metalearner.to_string()),
            ("Loss", loss),
        ])
    }


    /// The learners of the stack check their own capabilities
    /// when they are trained.
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

