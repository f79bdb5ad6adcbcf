//! Interchangeable ways of reducing a grade collection to one average.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::analytics::subject::{NO_AVERAGE, group_by_subject, pool_average, subject_average};
use crate::analytics::utility::{mean, median};
use crate::analytics::validator::normalized_value;
use crate::model::{Grade, ScoreField};

/// Averaging strategy selectable by the caller.
///
/// | Identifier      | Reduction                                        |
/// |-----------------|--------------------------------------------------|
/// | `subject-mean`  | mean of the per-subject averages                 |
/// | `weighted-pool` | one weighted mean across every record            |
/// | `median`        | median of the eligible values on the /20 basis   |
///
/// Every strategy reports 0 when nothing is eligible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AverageStrategy {
    #[default]
    SubjectMean,
    WeightedPool,
    Median,
}

impl AverageStrategy {
    pub const ALL: [AverageStrategy; 3] = [
        AverageStrategy::SubjectMean,
        AverageStrategy::WeightedPool,
        AverageStrategy::Median,
    ];

    pub fn compute<G: Borrow<Grade>>(self, grades: &[G], field: ScoreField) -> f64 {
        match self {
            AverageStrategy::SubjectMean => subject_mean(grades, field),
            AverageStrategy::WeightedPool => pool_average(grades, field),
            AverageStrategy::Median => median_score(grades, field),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AverageStrategy::SubjectMean => "subject-mean",
            AverageStrategy::WeightedPool => "weighted-pool",
            AverageStrategy::Median => "median",
        }
    }
}

impl fmt::Display for AverageStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AverageStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subject-mean" => Ok(AverageStrategy::SubjectMean),
            "weighted-pool" => Ok(AverageStrategy::WeightedPool),
            "median" => Ok(AverageStrategy::Median),
            other => bail!(
                "unknown averaging strategy '{other}' (expected subject-mean, weighted-pool or median)"
            ),
        }
    }
}

/// Mean of the subject averages, skipping subjects without one.
pub fn subject_mean<G: Borrow<Grade>>(grades: &[G], field: ScoreField) -> f64 {
    let averages: Vec<f64> = group_by_subject(grades)
        .iter()
        .map(|group| subject_average(&group.grades, field))
        .filter(|average| *average != NO_AVERAGE)
        .collect();

    mean(&averages)
}

/// Median of the eligible records' own values on the /20 basis.
pub fn median_score<G: Borrow<Grade>>(grades: &[G], field: ScoreField) -> f64 {
    let values: Vec<f64> = grades
        .iter()
        .filter_map(|grade| normalized_value(grade.borrow(), field))
        .collect();

    median(&values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn grade(subject: &str, day: i64, value: f64, out_of: f64) -> Grade {
        let given_at = Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap() + Duration::days(day);
        Grade::new(subject, subject, given_at)
            .with_out_of(out_of)
            .with_student(value)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_collection_is_zero_for_every_strategy() {
        let grades: Vec<Grade> = vec![];
        for strategy in AverageStrategy::ALL {
            assert_eq!(strategy.compute(&grades, ScoreField::Student), 0.0);
        }
    }

    #[test]
    fn test_subject_mean_weights_subjects_equally() {
        let grades = vec![
            grade("math", 0, 10.0, 20.0),
            grade("math", 1, 12.0, 20.0),
            grade("math", 2, 14.0, 20.0),
            grade("art", 3, 18.0, 20.0),
        ];
        // math 12, art 18
        assert!(close(subject_mean(&grades, ScoreField::Student), 15.0));
    }

    #[test]
    fn test_subject_mean_skips_subjects_without_average() {
        let mut ungraded = grade("art", 1, 0.0, 20.0);
        ungraded.student_score = None;
        let grades = vec![grade("math", 0, 12.0, 20.0), ungraded];

        assert!(close(subject_mean(&grades, ScoreField::Student), 12.0));
    }

    #[test]
    fn test_weighted_pool_ignores_subject_boundaries() {
        let grades = vec![
            grade("math", 0, 10.0, 20.0),
            grade("math", 1, 12.0, 20.0),
            grade("math", 2, 14.0, 20.0),
            grade("art", 3, 18.0, 20.0),
        ];
        // 54 / 80 * 20
        assert!(close(
            AverageStrategy::WeightedPool.compute(&grades, ScoreField::Student),
            13.5
        ));
    }

    #[test]
    fn test_strategies_agree_with_one_grade_per_subject() {
        let grades = vec![
            grade("math", 0, 9.0, 20.0),
            grade("art", 1, 17.0, 20.0),
            grade("history", 2, 13.0, 20.0),
        ];
        let by_subject = AverageStrategy::SubjectMean.compute(&grades, ScoreField::Student);
        let pooled = AverageStrategy::WeightedPool.compute(&grades, ScoreField::Student);

        assert!(close(by_subject, pooled));
        assert!(close(by_subject, 13.0));
    }

    #[test]
    fn test_median_reads_values_on_twenty() {
        let grades = vec![
            grade("math", 0, 8.0, 10.0),
            grade("math", 1, 30.0, 40.0),
            grade("art", 2, 11.0, 20.0),
        ];
        // 16, 15, 11
        assert!(close(AverageStrategy::Median.compute(&grades, ScoreField::Student), 15.0));
    }

    #[test]
    fn test_median_skips_bonus_records() {
        let grades = vec![
            grade("math", 0, 12.0, 20.0),
            grade("math", 1, 19.0, 20.0).as_bonus(),
        ];
        assert!(close(AverageStrategy::Median.compute(&grades, ScoreField::Student), 12.0));
    }

    #[test]
    fn test_strategy_identifiers_round_trip() {
        for strategy in AverageStrategy::ALL {
            assert_eq!(strategy.to_string().parse::<AverageStrategy>().unwrap(), strategy);
        }
        assert!("mode".parse::<AverageStrategy>().is_err());
        assert_eq!(
            serde_json::to_string(&AverageStrategy::WeightedPool).unwrap(),
            "\"weighted-pool\""
        );
    }
}
