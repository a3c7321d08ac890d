mod common;

use approx::assert_abs_diff_eq;
use superlearner::prelude::*;

use std::time::Duration;


/// Tests for the learners, `Stack`, and `Pipeline`.
#[cfg(test)]
pub mod stack_tests {
    use super::*;

    #[test]
    fn unsupported_outcome_names_the_learner() {
        common::init_logger();
        let table = common::linear_table(40, 0.1, 1);
        let task = common::task_of(&table, 4);

        let stack = Stack::empty()
            .add(MeanLearner::new())
            .add(LogisticRegression::new())
            .add(LinearRegression::new());
        let results = stack.train_each(&task);
        assert!(results[0].is_ok());
        assert!(results[2].is_ok());

        let error = stack.train_stack(&task).unwrap_err();
        match error {
            SuperLearnerError::UnsupportedOutcomeType { learner, outcome } => {
                assert_eq!(learner, "logistic");
                assert_eq!(outcome, "continuous");
            },
            other => panic!("unexpected error: {other}"),
        }
    }


    #[test]
    fn pipeline_failures_name_the_pipeline() {
        let table = common::linear_table(40, 0.1, 1);
        let task = common::task_of(&table, 4);

        let stack = Stack::empty()
            .add(MeanLearner::new())
            .add(
                Pipeline::empty()
                    .add(CorrelationScreener::new().top_k(2))
                    .add(LogisticRegression::new())
            )
            .add(LinearRegression::new());
        match stack.train_stack(&task).unwrap_err() {
            SuperLearnerError::UnsupportedOutcomeType { learner, .. } => {
                assert_eq!(learner, "screener.correlation->logistic");
            },
            other => panic!("unexpected error: {other}"),
        }

        let stack = Stack::empty()
            .add(MeanLearner::new())
            .add(
                Pipeline::empty()
                    .add(CorrelationScreener::new().top_k(2))
                    .add(common::Failing::new("broken"))
            );
        match stack.train_stack(&task).unwrap_err() {
            SuperLearnerError::LearnerTrainingFailure { learner, reason } => {
                assert_eq!(learner, "screener.correlation->broken");
                assert!(reason.contains("stage `broken`"));
            },
            other => panic!("unexpected error: {other}"),
        }
    }


    #[test]
    fn stack_names_are_unique() {
        let stack = Stack::empty()
            .add(MeanLearner::new())
            .add(LinearRegression::new())
            .add(LinearRegression::new().lambda(1.0));
        assert_eq!(stack.learner_names(), &["mean", "linear", "linear_2"]);
        assert_eq!(stack.len(), 3);
    }


    #[test]
    fn stack_predicts_wide() {
        let table = common::linear_table(60, 0.0, 2);
        let task = common::task_of(&table, 5);

        let stack = Stack::empty()
            .add(MeanLearner::new())
            .add(LinearRegression::new())
            .add(RegressionTree::new().max_depth(3));
        let fit = stack.train_stack(&task).unwrap();
        let matrix = fit.predict_wide(&task).unwrap();

        assert_eq!(matrix.n_rows(), 60);
        assert_eq!(matrix.n_learners(), 3);
        assert_eq!(matrix.names(), fit.names());

        // Noiseless linear data is interpolated by least squares.
        let y = task.outcome();
        let linear = matrix.column_by_name("linear").unwrap();
        for (p, t) in linear.iter().zip(&y) {
            assert_abs_diff_eq!(p, t, epsilon = 1e-6);
        }

        let mean = y.iter().sum::<f64>() / y.len() as f64;
        assert!(matrix.column(0).iter().all(|&p| (p - mean).abs() < 1e-9));
    }


    #[test]
    fn linear_regression_recovers_coefficients() {
        let table = common::linear_table(100, 0.0, 3);
        let task = common::task_of(&table, 5);

        let fit = LinearRegression::new().train(&task).unwrap();
        let coefficients = fit.coefficients().unwrap();
        let expected = [("(intercept)", 0.5), ("x1", 2.0), ("x2", -1.0), ("x3", 0.0)];
        for ((name, value), (expected_name, expected_value)) in
            coefficients.iter().zip(expected)
        {
            assert_eq!(name, expected_name);
            assert_abs_diff_eq!(*value, expected_value, epsilon = 1e-6);
        }
    }


    #[test]
    fn logistic_regression_on_binary_outcome() {
        let table = common::binary_table(300, 4);
        let task = common::task_of(&table, 5);

        let fit = LogisticRegression::new().train(&task).unwrap();
        let predictions = fit.predict(&task).unwrap();
        assert!(predictions.iter().all(|&p| (0.0..=1.0).contains(&p)));

        let coefficients = fit.coefficients().unwrap();
        let x1 = coefficients.iter().find(|(n, _)| n == "x1").unwrap().1;
        let x2 = coefficients.iter().find(|(n, _)| n == "x2").unwrap().1;
        assert!(x1 > 0.0);
        assert!(x2 < 0.0);
    }


    #[test]
    fn training_is_deterministic() {
        let table = common::linear_table(80, 0.5, 5);
        let task = common::task_of(&table, 5);

        let learner = BaggedTrees::new().n_trees(10).seed(99);
        let first = learner.train(&task).unwrap().predict(&task).unwrap();
        let second = learner.train(&task).unwrap().predict(&task).unwrap();
        assert_eq!(first, second);
    }


    #[test]
    fn timeout_is_reported() {
        common::init_logger();
        let table = common::linear_table(20, 0.1, 6);
        let task = common::task_of(&table, 2);

        let stack = Stack::empty()
            .add(MeanLearner::new())
            .add(common::Sleepy { delay: Duration::from_secs(2), })
            .timeout(Duration::from_millis(50));

        let results = stack.train_each(&task);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(SuperLearnerError::TimeoutExceeded { learner, millis }) => {
                assert_eq!(learner, "sleepy");
                assert_eq!(*millis, 50);
            },
            other => panic!("unexpected result: {other:?}"),
        }
    }


    #[test]
    fn pipeline_screens_then_fits() {
        let table = common::linear_table(120, 0.1, 7);
        let task = common::task_of(&table, 5);

        let pipeline = Pipeline::empty()
            .add(CorrelationScreener::new().top_k(1))
            .add(LinearRegression::new());
        assert_eq!(pipeline.name(), "screener.correlation->linear");

        let fit = pipeline.train(&task).unwrap();
        let names = fit.coefficients()
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["(intercept)", "x1"]);
        assert_eq!(fit.predict(&task).unwrap().len(), 120);
    }


    #[test]
    fn screener_alone_cannot_predict() {
        let table = common::linear_table(30, 0.1, 8);
        let task = common::task_of(&table, 3);

        let fit = CorrelationScreener::new().top_k(2).train(&task).unwrap();
        let error = fit.predict(&task).unwrap_err();
        assert!(matches!(error, SuperLearnerError::UnsupportedOperation { .. }));
    }


    #[test]
    fn learners_from_the_registry() {
        let table = common::linear_table(50, 0.1, 9);
        let task = common::task_of(&table, 5);

        let specs = vec![
            LearnerSpec::new("mean"),
            LearnerSpec::new("linear").param("lambda", 0.1),
            LearnerSpec::new("tree").param("max_depth", 2).param("label", "stump"),
            LearnerSpec::new("bagged_trees").param("n_trees", 5),
        ];
        let learners = specs.iter()
            .map(make_learner)
            .collect::<superlearner::Result<Vec<_>>>()
            .unwrap();
        let stack = Stack::new(learners);
        assert_eq!(
            stack.learner_names(),
            &["mean", "linear", "stump", "bagged_trees"]
        );

        let fit = stack.train_stack(&task).unwrap();
        assert_eq!(fit.predict_wide(&task).unwrap().n_learners(), 4);
    }
}
