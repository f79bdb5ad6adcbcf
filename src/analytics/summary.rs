//! Per-subject report card built from the same reductions as the chart.

use std::borrow::Borrow;

use serde::Serialize;

use crate::analytics::strategy::AverageStrategy;
use crate::analytics::subject::{NO_AVERAGE, group_by_subject, subject_average};
use crate::analytics::validator::eligible_score;
use crate::model::{Grade, ScoreField};

/// Averages of one subject over each score field. `None` means the subject
/// had no eligible record for that field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectSummary {
    pub subject_id: String,
    pub subject_name: String,
    pub grade_count: usize,
    pub eligible_count: usize,
    pub student: Option<f64>,
    pub class_average: Option<f64>,
    pub class_min: Option<f64>,
    pub class_max: Option<f64>,
}

/// Overall value of one strategy over the student field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyAverage {
    pub strategy: AverageStrategy,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeSummary {
    pub grade_count: usize,
    pub subjects: Vec<SubjectSummary>,
    pub overall: Vec<StrategyAverage>,
}

fn known(average: f64) -> Option<f64> {
    (average != NO_AVERAGE).then_some(average)
}

/// Summarizes `grades` subject by subject, in first-appearance order.
pub fn summarize<G: Borrow<Grade>>(grades: &[G]) -> GradeSummary {
    let subjects = group_by_subject(grades)
        .into_iter()
        .map(|group| {
            let field_average = |field| known(subject_average(&group.grades, field));
            SubjectSummary {
                subject_id: group.subject_id.to_string(),
                subject_name: group.subject_name.to_string(),
                grade_count: group.grades.len(),
                eligible_count: group
                    .grades
                    .iter()
                    .filter(|grade| eligible_score(grade, ScoreField::Student).is_some())
                    .count(),
                student: field_average(ScoreField::Student),
                class_average: field_average(ScoreField::Average),
                class_min: field_average(ScoreField::Min),
                class_max: field_average(ScoreField::Max),
            }
        })
        .collect();

    let overall = AverageStrategy::ALL
        .into_iter()
        .map(|strategy| StrategyAverage {
            strategy,
            average: strategy.compute(grades, ScoreField::Student),
        })
        .collect();

    GradeSummary {
        grade_count: grades.len(),
        subjects,
        overall,
    }
}
