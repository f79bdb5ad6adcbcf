use chrono::{Duration, TimeZone, Utc};
use grade_analytics::{
    AverageHistoryPoint, AverageStrategy, Grade, ScoreField, amplify_for_display,
    build_average_history, compute_strategy_average, compute_subject_average,
};
use proptest::prelude::*;

const SUBJECTS: [&str; 3] = ["math", "fr", "hist"];

fn grade_strategy() -> impl Strategy<Value = Grade> {
    (
        0usize..SUBJECTS.len(),
        0i64..120,
        0.0..25.0f64,
        prop::sample::select(vec![10.0, 15.0, 20.0, 40.0, 100.0]),
        prop::sample::select(vec![0.5, 1.0, 2.0, 3.0]),
        any::<bool>(),
    )
        .prop_map(|(subject, day, value, out_of, coefficient, bonus)| {
            let given_at = Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap() + Duration::days(day);
            let grade = Grade::new(SUBJECTS[subject], SUBJECTS[subject], given_at)
                .with_out_of(out_of)
                .with_coefficient(coefficient)
                .with_student(value.min(out_of));
            if bonus { grade.as_bonus() } else { grade }
        })
}

fn weightless(grade: &Grade) -> Grade {
    grade.clone().with_coefficient(0.0)
}

proptest! {
    #[test]
    fn zero_weight_grades_change_nothing(
        grades in prop::collection::vec(grade_strategy(), 0..12),
        extra in prop::collection::vec(grade_strategy(), 1..4),
    ) {
        let mut padded = grades.clone();
        padded.extend(extra.iter().map(weightless));

        for strategy in AverageStrategy::ALL {
            let before = compute_strategy_average(&grades, strategy, ScoreField::Student);
            let after = compute_strategy_average(&padded, strategy, ScoreField::Student);
            prop_assert!((before - after).abs() < 1e-9);
        }
    }

    #[test]
    fn subject_average_never_exceeds_twenty(
        grades in prop::collection::vec(grade_strategy(), 0..12),
    ) {
        let average = compute_subject_average(&grades, ScoreField::Student);
        prop_assert!(average == -1.0 || (0.0..=20.0).contains(&average));
    }

    #[test]
    fn optional_grade_never_lowers_its_subject(
        regular in prop::collection::vec(grade_strategy(), 0..8),
        optional in grade_strategy(),
    ) {
        let regular: Vec<Grade> = regular.into_iter().filter(|g| g.subject_id == optional.subject_id).collect();
        let mut with_optional = regular.clone();
        with_optional.push(optional.as_optional());

        let without = compute_subject_average(&regular, ScoreField::Student);
        let with = compute_subject_average(&with_optional, ScoreField::Student);
        prop_assert!(with >= without - 1e-9);
    }

    #[test]
    fn history_follows_input(
        grades in prop::collection::vec(grade_strategy(), 0..15),
    ) {
        for strategy in AverageStrategy::ALL {
            let history = build_average_history(&grades, strategy, ScoreField::Student);
            prop_assert_eq!(history.len(), grades.len());
            prop_assert!(history.windows(2).all(|w| w[0].date <= w[1].date));
        }
    }

    #[test]
    fn chart_keeps_original_snapshots(
        averages in prop::collection::vec(0.0..20.0f64, 0..30),
        scale in prop::sample::select(vec![10.0, 20.0, 100.0]),
    ) {
        let start = Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap();
        let history: Vec<AverageHistoryPoint> = averages
            .iter()
            .enumerate()
            .map(|(i, &average)| AverageHistoryPoint { date: start + Duration::days(i as i64), average })
            .collect();

        let points = amplify_for_display(&history, scale);
        prop_assert_eq!(points.len(), history.len());
        for (point, snapshot) in points.iter().zip(&history) {
            prop_assert_eq!(point.original_value, snapshot.average);
            prop_assert_eq!(point.original_date, snapshot.date);
            prop_assert!(point.value.is_finite());
        }
    }
}
