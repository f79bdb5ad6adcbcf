//! Per-subject averages, including the best-of policy for optional grades.

use std::borrow::Borrow;
use std::collections::HashMap;

use tracing::trace;

use crate::analytics::validator::{Contribution, SCALE, contribution};
use crate::model::{Grade, ScoreField};

/// Returned by [`subject_average`] when no record of the subject was eligible.
pub const NO_AVERAGE: f64 = -1.0;

/// Whether an accumulation runs on behalf of a caller or inside an optional
/// grade's with/without comparison. Nested runs count optional grades as
/// regular ones so the comparison cannot recurse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reentry {
    Top,
    Nested,
}

/// Sums the contributions of every eligible record in `grades`.
pub fn accumulate<G: Borrow<Grade>>(grades: &[G], field: ScoreField, reentry: Reentry) -> Contribution {
    let mut total = Contribution::default();

    for (index, grade) in grades.iter().enumerate() {
        let grade: &Grade = grade.borrow();
        let Some(part) = contribution(grade, field) else {
            continue;
        };

        if grade.optional
            && field == ScoreField::Student
            && reentry == Reentry::Top
            && !keeps_optional(grades, index)
        {
            trace!(subject = %grade.subject_id, given_at = %grade.given_at, "Optional grade dropped");
            continue;
        }

        total += part;
    }

    total
}

/// An optional grade stays only if leaving it out would not raise its
/// subject's average.
fn keeps_optional<G: Borrow<Grade>>(grades: &[G], index: usize) -> bool {
    let target: &Grade = grades[index].borrow();
    let subject_id = target.subject_id.as_str();

    let mut with = Vec::new();
    let mut without = Vec::new();
    for (i, grade) in grades.iter().enumerate() {
        let grade: &Grade = grade.borrow();
        if grade.subject_id != subject_id {
            continue;
        }
        with.push(grade);
        if i != index {
            without.push(grade);
        }
    }

    let avg_with = average_of(accumulate(&with, ScoreField::Student, Reentry::Nested));
    let avg_without = average_of(accumulate(&without, ScoreField::Student, Reentry::Nested));
    avg_without <= avg_with
}

/// Reads a summed contribution as a /20 average capped at 20.
fn average_of(total: Contribution) -> f64 {
    match total.on_scale() {
        Some(average) => average.min(SCALE),
        None => NO_AVERAGE,
    }
}

/// Average of one subject's grades on a 0-20 scale, or [`NO_AVERAGE`].
pub fn subject_average<G: Borrow<Grade>>(grades: &[G], field: ScoreField) -> f64 {
    average_of(accumulate(grades, field, Reentry::Top))
}

/// Same reduction as [`subject_average`] over an arbitrary pool of records,
/// reporting 0 instead of [`NO_AVERAGE`] when nothing is eligible.
pub fn pool_average<G: Borrow<Grade>>(grades: &[G], field: ScoreField) -> f64 {
    let total = accumulate(grades, field, Reentry::Top);
    total.on_scale().map_or(0.0, |average| average.min(SCALE))
}

/// The records of one subject, borrowed from the caller's collection.
#[derive(Debug, Clone)]
pub struct SubjectGroup<'a> {
    pub subject_id: &'a str,
    pub subject_name: &'a str,
    pub grades: Vec<&'a Grade>,
}

/// Groups records by `subject_id`, keeping subjects in first-appearance order.
pub fn group_by_subject<G: Borrow<Grade>>(grades: &[G]) -> Vec<SubjectGroup<'_>> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<SubjectGroup<'_>> = Vec::new();

    for grade in grades {
        let grade: &Grade = grade.borrow();
        let position = *positions.entry(grade.subject_id.as_str()).or_insert_with(|| {
            groups.push(SubjectGroup {
                subject_id: &grade.subject_id,
                subject_name: &grade.subject_name,
                grades: Vec::new(),
            });
            groups.len() - 1
        });
        groups[position].grades.push(grade);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Score;
    use chrono::{Duration, TimeZone, Utc};

    fn grade(subject: &str, day: i64, value: f64) -> Grade {
        let given_at = Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap() + Duration::days(day);
        Grade::new(subject, subject, given_at).with_student(value)
    }

    fn assert_average(grades: &[Grade], field: ScoreField, expected: f64) {
        let actual = subject_average(grades, field);
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn test_two_grades_average() {
        let grades = vec![grade("A", 0, 15.0), grade("A", 1, 10.0)];
        assert_average(&grades, ScoreField::Student, 12.5);
    }

    #[test]
    fn test_overshoot_is_clamped_to_twenty() {
        let grades = vec![grade("A", 0, 22.0)];
        assert_average(&grades, ScoreField::Student, 20.0);
    }

    #[test]
    fn test_empty_subject_is_sentinel() {
        let grades: Vec<Grade> = vec![];
        assert_eq!(subject_average(&grades, ScoreField::Student), NO_AVERAGE);

        let absent = vec![grade("A", 0, 0.0).with_score(ScoreField::Student, Score::disabled("Abs"))];
        assert_eq!(subject_average(&absent, ScoreField::Student), NO_AVERAGE);
    }

    #[test]
    fn test_weights_apply() {
        let grades = vec![
            grade("A", 0, 10.0).with_coefficient(3.0),
            grade("A", 1, 18.0),
        ];
        // (30 + 18) / (60 + 20) * 20
        assert_average(&grades, ScoreField::Student, 12.0);
    }

    #[test]
    fn test_bonus_raises_subject_average() {
        let grades = vec![grade("A", 0, 12.0), grade("A", 1, 16.0).as_bonus()];
        // (12 + 6) / (20 + 1) * 20
        let expected = 18.0 / 21.0 * 20.0;
        assert!((subject_average(&grades, ScoreField::Student) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_bonus_below_half_is_ignored() {
        let grades = vec![grade("A", 0, 12.0), grade("A", 1, 6.0).as_bonus()];
        assert_average(&grades, ScoreField::Student, 12.0);
    }

    #[test]
    fn test_low_optional_grade_is_dropped() {
        let grades = vec![grade("A", 0, 14.0), grade("A", 1, 6.0).as_optional()];
        assert_average(&grades, ScoreField::Student, 14.0);
    }

    #[test]
    fn test_high_optional_grade_is_kept() {
        let grades = vec![grade("A", 0, 10.0), grade("A", 1, 16.0).as_optional()];
        assert_average(&grades, ScoreField::Student, 13.0);
    }

    #[test]
    fn test_lone_optional_grade_is_kept() {
        let grades = vec![grade("A", 0, 4.0).as_optional()];
        assert_average(&grades, ScoreField::Student, 4.0);
    }

    #[test]
    fn test_optional_policy_only_for_student_field() {
        let grades = vec![
            grade("A", 0, 14.0).with_score(ScoreField::Average, Score::new(14.0)),
            grade("A", 1, 6.0)
                .as_optional()
                .with_score(ScoreField::Average, Score::new(6.0)),
        ];
        assert_average(&grades, ScoreField::Average, 10.0);
    }

    #[test]
    fn test_nested_accumulation_keeps_optional_grades() {
        let grades = vec![grade("A", 0, 14.0), grade("A", 1, 6.0).as_optional()];
        let total = accumulate(&grades, ScoreField::Student, Reentry::Nested);
        assert_eq!(total, Contribution::new(20.0, 40.0));
    }

    #[test]
    fn test_pool_average_uses_zero_for_no_data() {
        let grades: Vec<Grade> = vec![];
        assert_eq!(pool_average(&grades, ScoreField::Student), 0.0);
    }

    #[test]
    fn test_group_by_subject_keeps_first_appearance_order() {
        let grades = vec![grade("B", 0, 10.0), grade("A", 1, 12.0), grade("B", 2, 14.0)];
        let groups = group_by_subject(&grades);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].subject_id, "B");
        assert_eq!(groups[0].grades.len(), 2);
        assert_eq!(groups[1].subject_id, "A");
        assert_eq!(groups[1].grades.len(), 1);
    }
}
