#![allow(dead_code)]
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Bernoulli, Distribution, Normal};

use superlearner::prelude::*;

use std::collections::HashSet;
use std::thread;
use std::time::Duration;


pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}


fn gaussian(n_rows: usize, rng: &mut StdRng) -> Vec<f64> {
    let normal = Normal::new(0f64, 1f64).unwrap();
    (0..n_rows).map(|_| normal.sample(rng)).collect()
}


/// `y = 0.5 + 2 * x1 - x2 + noise`. `x3` is unrelated to `y`.
pub fn linear_table(n_rows: usize, noise: f64, seed: u64) -> Table {
    let mut rng = StdRng::seed_from_u64(seed);
    let x1 = gaussian(n_rows, &mut rng);
    let x2 = gaussian(n_rows, &mut rng);
    let x3 = gaussian(n_rows, &mut rng);
    let eps = gaussian(n_rows, &mut rng);

    let y = (0..n_rows)
        .map(|i| 0.5 + 2.0 * x1[i] - x2[i] + noise * eps[i])
        .collect::<Vec<_>>();

    Table::new()
        .with_column("x1", x1).unwrap()
        .with_column("x2", x2).unwrap()
        .with_column("x3", x3).unwrap()
        .with_column("y", y).unwrap()
}


/// `P(y = 1) = sigmoid(1.5 * x1 - x2)`.
pub fn binary_table(n_rows: usize, seed: u64) -> Table {
    let mut rng = StdRng::seed_from_u64(seed);
    let x1 = gaussian(n_rows, &mut rng);
    let x2 = gaussian(n_rows, &mut rng);

    let y = (0..n_rows)
        .map(|i| {
            let p = 1.0 / (1.0 + (-(1.5 * x1[i] - x2[i])).exp());
            let coin = Bernoulli::new(p).unwrap();
            if coin.sample(&mut rng) { 1.0 } else { 0.0 }
        })
        .collect::<Vec<_>>();

    Table::new()
        .with_column("x1", x1).unwrap()
        .with_column("x2", x2).unwrap()
        .with_column("y", y).unwrap()
}


pub fn task_of(table: &Table, n_folds: usize) -> Task {
    TaskBuilder::new(table)
        .outcome("y")
        .n_folds(n_folds)
        .build()
        .unwrap()
}


/// A learner that predicts a fixed value.
pub struct Constant {
    pub name: String,
    pub value: f64,
}


impl Constant {
    pub fn new(name: &str, value: f64) -> Self {
        Self { name: name.to_string(), value, }
    }
}


impl Learner for Constant {
    fn name(&self) -> &str {
        &self.name
    }


    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }


    fn train(&self, _task: &Task) -> superlearner::Result<Box<dyn FittedLearner>> {
        let fit = FittedConstant { name: self.name.clone(), value: self.value, };
        Ok(Box::new(fit))
    }
}


#[derive(Debug)]
pub struct FittedConstant {
    name: String,
    value: f64,
}


impl FittedLearner for FittedConstant {
    fn name(&self) -> &str {
        &self.name
    }


    fn predict(&self, task: &Task) -> superlearner::Result<Vec<f64>> {
        Ok(vec![self.value; task.n_rows()])
    }
}


/// A learner that always fails to train.
pub struct Failing {
    pub name: String,
}


impl Failing {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), }
    }
}


impl Learner for Failing {
    fn name(&self) -> &str {
        &self.name
    }


    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }


    fn train(&self, _task: &Task) -> superlearner::Result<Box<dyn FittedLearner>> {
        Err(SuperLearnerError::LearnerTrainingFailure {
            learner: self.name.clone(),
            reason: "singular design".to_string(),
        })
    }
}


/// A learner that sleeps before fitting the mean.
pub struct Sleepy {
    pub delay: Duration,
}


impl Learner for Sleepy {
    fn name(&self) -> &str {
        "sleepy"
    }


    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }


    fn train(&self, task: &Task) -> superlearner::Result<Box<dyn FittedLearner>> {
        thread::sleep(self.delay);
        MeanLearner::new().train(task)
    }
}


/// A learner that remembers its training rows.
/// It predicts `1` on a row it was trained on, `0` otherwise.
pub struct Memorizer;


impl Learner for Memorizer {
    fn name(&self) -> &str {
        "memorizer"
    }


    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }


    fn train(&self, task: &Task) -> superlearner::Result<Box<dyn FittedLearner>> {
        let seen = task.row_ids().into_iter().collect();
        Ok(Box::new(FittedMemorizer { seen, }))
    }
}


#[derive(Debug)]
pub struct FittedMemorizer {
    seen: HashSet<usize>,
}


impl FittedLearner for FittedMemorizer {
    fn name(&self) -> &str {
        "memorizer"
    }


    fn predict(&self, task: &Task) -> superlearner::Result<Vec<f64>> {
        let predictions = task.row_ids()
            .into_iter()
            .map(|i| if self.seen.contains(&i) { 1.0 } else { 0.0 })
            .collect();
        Ok(predictions)
    }
}
