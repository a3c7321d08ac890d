mod common;

use approx::assert_abs_diff_eq;
use superlearner::prelude::*;


fn regression_stack() -> Stack {
    Stack::empty()
        .add(MeanLearner::new())
        .add(LinearRegression::new())
        .add(RegressionTree::new().max_depth(3))
}


/// `x` is missing on every 7-th row when `with_missing` holds.
/// `g` takes the first `n_levels` of `a`, `b`, `c`.
fn mixed_table(n_rows: usize, with_missing: bool, n_levels: usize) -> Table {
    let levels = ["a", "b", "c"];
    let x = (0..n_rows)
        .map(|i| (i % 17) as f64 / 4.0)
        .collect::<Vec<_>>();
    let g = (0..n_rows)
        .map(|i| levels[i % n_levels])
        .collect::<Vec<_>>();
    let y = (0..n_rows)
        .map(|i| {
            let shift = if g[i] == "b" { 1.0 } else { 0.0 };
            1.0 + 2.0 * x[i] + shift + 0.3 * (i as f64).sin()
        })
        .collect::<Vec<_>>();
    let x = x.into_iter()
        .enumerate()
        .map(|(i, v)| (!with_missing || i % 7 != 0).then_some(v))
        .collect::<Vec<_>>();

    Table::new()
        .with_column("x", x).unwrap()
        .with_column("g", g).unwrap()
        .with_column("y", y).unwrap()
}


fn assert_simplex(weights: &[f64]) {
    assert!(weights.iter().all(|&w| w >= 0.0));
    assert_abs_diff_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-6);
}


/// Tests for `SuperLearner`.
#[cfg(test)]
pub mod super_learner_tests {
    use super::*;

    #[test]
    fn convex_weights_favor_the_true_model() {
        common::init_logger();
        let table = common::linear_table(200, 0.5, 1);
        let task = common::task_of(&table, 5);

        let fit = SuperLearner::new(regression_stack())
            .fit(&task)
            .unwrap();

        assert_eq!(fit.learner_names(), &["mean", "linear", "tree"]);
        assert_simplex(fit.weights());
        assert_eq!(fit.discrete_selector(), "linear");
        assert_eq!(fit.loss(), Loss::SquaredError);
        assert_eq!(fit.n_folds(), 5);
        assert_eq!(fit.oof().n_rows(), 200);
        assert_eq!(fit.fold_of_row().len(), 200);

        let linear = fit.metalearner().weight_of("linear").unwrap();
        assert!(linear > 0.5, "the linear learner got the weight {linear}");
    }


    #[test]
    fn ensemble_predicts_the_weighted_stack() {
        let table = common::linear_table(120, 0.5, 2);
        let task = common::task_of(&table, 4);

        let fit = SuperLearner::new(regression_stack())
            .fit(&task)
            .unwrap();

        let ensemble = fit.predict(&task).unwrap();
        let learners = fit.predict_learners(&task).unwrap();
        assert_eq!(learners.n_learners(), 3);
        for (i, &p) in ensemble.iter().enumerate() {
            let expected = learners.row(i)
                .iter()
                .zip(fit.weights())
                .map(|(q, w)| q * w)
                .sum::<f64>();
            assert_abs_diff_eq!(p, expected, epsilon = 1e-9);
        }

        let discrete = fit.predict_discrete(&task).unwrap();
        assert_eq!(discrete, learners.column_by_name("linear").unwrap().to_vec());
    }


    #[test]
    fn holdout_risk() {
        let train = common::task_of(&common::linear_table(150, 0.5, 3), 5);
        let holdout = common::task_of(&common::linear_table(80, 0.5, 4), 5);

        let fit = SuperLearner::new(regression_stack())
            .fit(&train)
            .unwrap();
        let table = fit.risk(&holdout).unwrap();

        let names = table.entries()
            .iter()
            .map(|e| e.learner.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["super_learner", "discrete_selector", "mean", "linear", "tree"]
        );
        let ensemble = table.risk_of("super_learner").unwrap();
        let mean = table.risk_of("mean").unwrap();
        assert!(ensemble < mean);
        println!("{table}");

        let other = TaskBuilder::new(&common::linear_table(30, 0.5, 5))
            .outcome("x3")
            .n_folds(3)
            .build()
            .unwrap();
        assert!(matches!(fit.risk(&other), Err(SuperLearnerError::Configuration(_))));
    }


    #[test]
    fn discrete_metalearner_selects_one_learner() {
        let table = common::linear_table(100, 0.5, 6);
        let task = common::task_of(&table, 5);

        let fit = SuperLearner::new(regression_stack())
            .metalearner(MetalearnerKind::Discrete)
            .fit(&task)
            .unwrap();

        assert_eq!(fit.weights(), &[0.0, 1.0, 0.0]);
        assert_eq!(fit.predict(&task).unwrap(), fit.predict_discrete(&task).unwrap());
    }


    #[test]
    fn binary_outcome_with_log_likelihood() {
        let table = common::binary_table(200, 7);
        let task = common::task_of(&table, 5);

        let stack = Stack::empty()
            .add(MeanLearner::new())
            .add(LogisticRegression::new())
            .add(BaggedTrees::new().n_trees(10));
        let fit = SuperLearner::new(stack).fit(&task).unwrap();

        assert_eq!(fit.outcome_type(), OutcomeType::Binary);
        assert_eq!(fit.loss(), Loss::BinomialLogLikelihood);
        assert_simplex(fit.weights());
        let predictions = fit.predict(&task).unwrap();
        assert!(predictions.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }


    #[test]
    fn categorical_outcome_is_unsupported() {
        let table = Table::new()
            .with_column("x", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
            .with_column("y", vec!["a", "b", "c", "a", "b", "c"]).unwrap();
        let task = TaskBuilder::new(&table)
            .outcome("y")
            .fold_strategy(FoldStrategy::VFold(2))
            .build()
            .unwrap();
        assert_eq!(task.outcome_type(), OutcomeType::Categorical(3));

        let result = SuperLearner::new(Stack::empty().add(MeanLearner::new()))
            .fit(&task);
        assert!(matches!(
            result,
            Err(SuperLearnerError::UnsupportedOutcomeType { .. })
        ));
    }


    #[test]
    fn failed_learners_are_dropped() {
        let table = common::linear_table(60, 0.5, 8);
        let task = common::task_of(&table, 3);
        let stack = regression_stack().add(common::Failing::new("broken"));

        let result = SuperLearner::new(stack.clone()).fit(&task);
        assert!(result.is_err());

        let fit = SuperLearner::new(stack)
            .drop_failed_learners(true)
            .fit(&task)
            .unwrap();
        assert_eq!(fit.learner_names(), &["mean", "linear", "tree"]);
        assert_eq!(fit.dropped().len(), 1);
        assert_eq!(fit.dropped()[0].learner, "broken");
        assert_simplex(fit.weights());
    }


    #[test]
    fn fit_is_reproducible() {
        let table = common::linear_table(80, 0.5, 9);
        let task = common::task_of(&table, 4);
        let super_learner = SuperLearner::new(
            regression_stack().add(BaggedTrees::new().n_trees(5))
        );

        let first = super_learner.fit(&task).unwrap();
        let second = super_learner.clone().parallel(false).fit(&task).unwrap();
        assert_eq!(first.weights(), second.weights());
        assert_eq!(first.risk_table(), second.risk_table());
        assert_eq!(first.predict(&task).unwrap(), second.predict(&task).unwrap());
    }


    #[test]
    fn report_serializes_to_json() {
        let table = common::linear_table(60, 0.5, 10);
        let task = common::task_of(&table, 3);
        let fit = SuperLearner::new(regression_stack())
            .verbose(true)
            .fit(&task)
            .unwrap();

        let report = fit.report();
        assert_eq!(report.outcome, "y");
        assert_eq!(report.n_rows, 60);
        assert_eq!(report.learners.len(), 3);
        assert_eq!(report.discrete_selector, fit.discrete_selector());
        println!("{report}");

        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["learners"][1]["name"], "linear");
        assert_eq!(value["n_folds"], 3);
    }


    #[test]
    fn super_learner_from_config() {
        let config = SuperLearnerConfig::from_json(r#"{
            "learners": [
                { "name": "mean" },
                {
                    "name": "pipeline",
                    "params": {
                        "stages": [
                            { "name": "screener.correlation", "params": { "top_k": 1 } },
                            { "name": "linear" }
                        ]
                    }
                },
                { "name": "tree", "params": { "max_depth": 2 } }
            ],
            "metalearner": "convex",
            "timeout_ms": 60000
        }"#).unwrap();

        let table = common::linear_table(80, 0.5, 11);
        let task = common::task_of(&table, 4);
        let fit = config.build().unwrap().fit(&task).unwrap();

        assert_eq!(
            fit.learner_names(),
            &["mean", "screener.correlation->linear", "tree"]
        );
        assert_simplex(fit.weights());

        let round_trip = SuperLearnerConfig::from_json(&config.to_json().unwrap())
            .unwrap();
        assert_eq!(round_trip, config);
    }


    #[test]
    fn nested_cross_validation() {
        common::init_logger();
        let table = common::linear_table(120, 0.5, 12);
        let task = common::task_of(&table, 4);

        let result = SuperLearner::new(regression_stack())
            .nested_cv(&task)
            .unwrap();

        assert_eq!(
            result.predictions().names(),
            &["super_learner", "discrete_selector", "mean", "linear", "tree"]
        );
        assert_eq!(result.fold_of_row().len(), 120);
        assert!(result.predictions().columns()
            .iter()
            .all(|column| column.iter().all(|p| p.is_finite())));

        let ensemble = result.ensemble_risk().unwrap();
        let mean = result.risk_table().risk_of("mean").unwrap();
        assert!(ensemble < mean);
    }


    #[test]
    fn holdout_with_another_missing_pattern() {
        let train = common::task_of(&mixed_table(140, true, 3), 5);
        assert_eq!(train.covariate_names(), vec!["x", "g_b", "g_c", "delta_x"]);

        let fit = SuperLearner::new(regression_stack())
            .fit(&train)
            .unwrap();

        // The holdout has no missing value and no level `c`.
        let table = mixed_table(60, false, 2);
        let holdout = TaskBuilder::new(&table)
            .outcome("y")
            .schema_from(&train)
            .n_folds(3)
            .build()
            .unwrap();
        assert_eq!(holdout.covariate_names(), train.covariate_names());
        let delta = holdout.covariate_index("delta_x").unwrap();
        assert!(holdout.column_values(delta).iter().all(|&v| v == 0.0));
        let g_c = holdout.covariate_index("g_c").unwrap();
        assert!(holdout.column_values(g_c).iter().all(|&v| v == 0.0));

        assert_eq!(fit.predict(&holdout).unwrap().len(), 60);
        let risk = fit.risk(&holdout).unwrap();
        assert!(risk.risk_of("super_learner").unwrap() < risk.risk_of("mean").unwrap());

        // The schema kept by the fit gives the same task.
        let same = TaskBuilder::new(&table)
            .outcome("y")
            .schema(fit.schema().clone())
            .n_folds(3)
            .build()
            .unwrap();
        assert_eq!(same.covariate_names(), holdout.covariate_names());
        assert_eq!(fit.predict(&same).unwrap(), fit.predict(&holdout).unwrap());

        // Without the schema, the covariates differ from the training ones.
        let unaligned = common::task_of(&table, 3);
        assert_eq!(unaligned.covariate_names(), vec!["x", "g_b"]);
        assert!(matches!(
            fit.risk(&unaligned),
            Err(SuperLearnerError::Configuration(_))
        ));
    }


    #[test]
    fn generated_names_avoid_declared_ones() {
        let table = common::linear_table(60, 0.5, 14);
        let task = common::task_of(&table, 3);
        let stack = Stack::empty()
            .add(RegressionTree::new().max_depth(1))
            .add(RegressionTree::new().max_depth(2))
            .add(RegressionTree::new().max_depth(3).label("tree_2"));
        assert_eq!(stack.learner_names(), &["tree", "tree_3", "tree_2"]);

        let fit = SuperLearner::new(stack).fit(&task).unwrap();
        assert_eq!(fit.learner_names(), &["tree", "tree_3", "tree_2"]);
        assert_simplex(fit.weights());
    }
}
