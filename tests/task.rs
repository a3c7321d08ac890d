mod common;

use polars::prelude::{DataFrame, NamedFrom, Series};
use superlearner::prelude::*;


fn assert_partition(task: &Task) {
    let n_rows = task.n_rows();
    let mut seen = vec![0_usize; n_rows];
    for fold in task.folds() {
        assert_eq!(fold.training().len() + fold.validation().len(), n_rows);
        for &i in fold.validation() {
            assert!(!fold.training().contains(&i));
            seen[i] += 1;
        }
    }
    assert!(seen.iter().all(|&c| c == 1), "folds do not partition the rows");
}


/// Tests for `TaskBuilder` and `Task`.
#[cfg(test)]
pub mod task_tests {
    use super::*;

    #[test]
    fn median_imputation_with_indicator() {
        common::init_logger();
        let table = Table::new()
            .with_column("x", vec![Some(1f64), None, Some(3f64), None, Some(5f64)])
            .unwrap()
            .with_column("y", vec![1.0, 2.0, 3.0, 4.0, 5.0])
            .unwrap();

        let task = TaskBuilder::new(&table)
            .outcome("y")
            .n_folds(2)
            .build()
            .unwrap();

        assert_eq!(task.covariate_names(), vec!["x", "delta_x"]);
        let x = task.covariate_index("x").unwrap();
        let delta = task.covariate_index("delta_x").unwrap();
        assert_eq!(task.column_values(x), vec![1.0, 3.0, 3.0, 3.0, 5.0]);
        assert_eq!(task.column_values(delta), vec![0.0, 1.0, 0.0, 1.0, 0.0]);
        assert_eq!(task.outcome_type(), OutcomeType::Continuous);
    }


    #[test]
    fn complete_columns_get_no_indicator() {
        let table = common::linear_table(30, 0.1, 1);
        let task = common::task_of(&table, 3);
        assert_eq!(task.covariate_names(), vec!["x1", "x2", "x3"]);
        assert_eq!(task.shape(), (30, 3));
    }


    #[test]
    fn missing_outcome_rows_are_dropped() {
        let table = Table::new()
            .with_column("x", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
            .with_column("y", vec![Some(0.5), None, Some(1.5), Some(2.5), None, Some(0.1)])
            .unwrap();
        let task = TaskBuilder::new(&table)
            .outcome("y")
            .n_folds(2)
            .build()
            .unwrap();

        assert_eq!(task.n_rows(), 4);
        assert_eq!(task.outcome(), vec![0.5, 1.5, 2.5, 0.1]);
        let x = task.covariate_index("x").unwrap();
        assert_eq!(task.column_values(x), vec![1.0, 3.0, 4.0, 6.0]);
    }


    #[test]
    fn folds_partition_the_rows() {
        let table = common::binary_table(53, 11);
        let strategies = [
            FoldStrategy::VFold(5),
            FoldStrategy::Stratified(4),
            FoldStrategy::LeaveOneOut,
        ];
        for strategy in strategies {
            let task = TaskBuilder::new(&table)
                .outcome("y")
                .fold_strategy(strategy.clone())
                .build()
                .unwrap();
            assert_partition(&task);
            assert_eq!(task.fold_strategy(), &strategy);
        }
    }


    #[test]
    fn clusters_are_validated_together() {
        let n_rows = 24;
        let ids = (0..n_rows).map(|i| (i / 3) as f64).collect::<Vec<_>>();
        let x = (0..n_rows).map(|i| i as f64).collect::<Vec<_>>();
        let y = (0..n_rows).map(|i| (i % 5) as f64 * 0.3).collect::<Vec<_>>();
        let table = Table::new()
            .with_column("id", ids.clone()).unwrap()
            .with_column("x", x).unwrap()
            .with_column("y", y).unwrap();

        let task = TaskBuilder::new(&table)
            .outcome("y")
            .id_column("id")
            .n_folds(4)
            .build()
            .unwrap();

        assert_eq!(task.covariate_names(), vec!["x"]);
        assert_partition(&task);
        for fold in task.folds() {
            for &i in fold.validation() {
                let cluster = i / 3;
                for j in 3 * cluster..3 * cluster + 3 {
                    assert!(fold.validation().contains(&j));
                }
            }
        }
    }


    #[test]
    fn same_seed_gives_same_folds() {
        let table = common::linear_table(40, 0.1, 5);
        let build = |seed| {
            TaskBuilder::new(&table)
                .outcome("y")
                .n_folds(5)
                .seed(seed)
                .build()
                .unwrap()
        };
        assert_eq!(build(7).folds(), build(7).folds());
        assert_ne!(build(7).folds(), build(8).folds());
    }


    #[test]
    fn explicit_folds() {
        let table = common::linear_table(6, 0.1, 2);
        let folds = vec![
            FoldAssignment::from_validation(0, vec![0, 1, 2], 6),
            FoldAssignment::from_validation(1, vec![3, 4, 5], 6),
        ];
        let task = TaskBuilder::new(&table)
            .outcome("y")
            .folds(folds.clone())
            .build()
            .unwrap();
        assert_eq!(task.folds(), &folds[..]);

        // Row 2 is validated twice and row 5 never.
        let overlapping = vec![
            FoldAssignment::from_validation(0, vec![0, 1, 2], 6),
            FoldAssignment::from_validation(1, vec![2, 3, 4], 6),
        ];
        let result = TaskBuilder::new(&table)
            .outcome("y")
            .folds(overlapping)
            .build();
        assert!(matches!(result, Err(SuperLearnerError::Configuration(_))));
    }


    #[test]
    fn invalid_configurations() {
        let table = common::linear_table(10, 0.1, 3);

        // No outcome.
        assert!(TaskBuilder::new(&table).build().is_err());
        // Unknown outcome.
        assert!(TaskBuilder::new(&table).outcome("z").build().is_err());
        // Unknown covariate.
        assert!(
            TaskBuilder::new(&table)
                .outcome("y")
                .covariates(["x1", "w"])
                .build()
                .is_err()
        );
        // More folds than rows.
        assert!(TaskBuilder::new(&table).outcome("y").n_folds(11).build().is_err());
        // A single fold.
        assert!(TaskBuilder::new(&table).outcome("y").n_folds(1).build().is_err());

        // A fully missing covariate.
        let table = Table::new()
            .with_column("x", vec![None::<f64>, None, None, None]).unwrap()
            .with_column("y", vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let result = TaskBuilder::new(&table).outcome("y").n_folds(2).build();
        assert!(matches!(result, Err(SuperLearnerError::Configuration(_))));
    }


    #[test]
    fn negative_weights_are_rejected() {
        let table = common::linear_table(8, 0.1, 4)
            .with_column("w", vec![1.0, 1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0])
            .unwrap();
        let result = TaskBuilder::new(&table)
            .outcome("y")
            .weights("w")
            .n_folds(2)
            .build();
        assert!(result.is_err());
    }


    #[test]
    fn weights_are_not_covariates() {
        let table = common::linear_table(8, 0.1, 4)
            .with_column("w", vec![1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0, 2.0])
            .unwrap();
        let task = TaskBuilder::new(&table)
            .outcome("y")
            .weights("w")
            .n_folds(2)
            .build()
            .unwrap();
        assert!(task.has_weights());
        assert_eq!(task.covariate_index("w"), None);
        assert_eq!(task.weights()[1], 2.0);
    }


    #[test]
    fn csv_with_missing_values() {
        let csv = "\
            age,group,y\n\
            31,a,1\n\
            NA,b,0\n\
            45,,1\n\
            28,b,NA\n\
            52,a,0\n\
            39,b,1\n";
        let table = Table::from_reader(csv.as_bytes(), true, &["", "NA"])
            .unwrap();
        assert_eq!(table.shape(), (6, 3));
        assert!(table["group"].is_text());

        let task = TaskBuilder::new(&table)
            .outcome("y")
            .n_folds(2)
            .build()
            .unwrap();

        assert_eq!(task.n_rows(), 5);
        assert_eq!(task.outcome_type(), OutcomeType::Binary);
        assert_eq!(
            task.covariate_names(),
            vec!["age", "group_b", "delta_age", "delta_group"]
        );
        let age = task.covariate_index("age").unwrap();
        // Median of 31, 45, 52, 39.
        assert_eq!(task.column_values(age)[1], 42.0);
    }


    #[test]
    fn table_from_dataframe() {
        let x = Series::new("x", &[Some(1.0), Some(2.0), None, Some(4.0)]);
        let color = Series::new("color", &["red", "blue", "red", "green"]);
        let y = Series::new("y", &[0.3, 0.1, 0.7, 0.2]);
        let df = DataFrame::new(vec![x, color, y]).unwrap();
        let table = Table::from_dataframe(&df).unwrap();
        assert_eq!(table.shape(), (4, 3));

        let task = TaskBuilder::new(&table)
            .outcome("y")
            .n_folds(2)
            .build()
            .unwrap();
        assert_eq!(
            task.covariate_names(),
            vec!["x", "color_green", "color_red", "delta_x"]
        );
    }


    #[test]
    fn subset_regenerates_folds_and_view_has_none() {
        let table = common::linear_table(40, 0.1, 9);
        let task = common::task_of(&table, 4);

        let fold = &task.folds()[0];
        let train = task.subset(fold.training()).unwrap();
        assert_eq!(train.n_rows(), fold.training().len());
        assert_eq!(train.n_folds(), 4);
        assert_partition(&train);

        let valid = task.view(fold.validation()).unwrap();
        assert_eq!(valid.n_folds(), 0);
        assert_eq!(valid.row_ids(), fold.validation().to_vec());
    }
}
