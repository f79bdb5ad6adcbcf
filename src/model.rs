//! Grade records and the points the analytics pipeline produces from them.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single optional numeric measurement.
///
/// `disabled` means there is no usable number (ungraded, exempted, absent).
/// `status` is a display code only and never takes part in a computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub status: String,
}

impl Score {
    pub fn new(value: f64) -> Self {
        Score {
            value: Some(value),
            disabled: false,
            status: String::new(),
        }
    }

    /// A score carrying only a status code, e.g. `"Abs"` or `"NN"`.
    pub fn disabled(status: &str) -> Self {
        Score {
            value: None,
            disabled: true,
            status: status.to_string(),
        }
    }

    /// The numeric value when the score is usable in a reduction.
    pub fn usable(&self) -> Option<f64> {
        if self.disabled {
            return None;
        }
        self.value.filter(|v| v.is_finite())
    }
}

fn default_coefficient() -> f64 {
    1.0
}

/// One graded assignment, already normalized by the provider layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub subject_id: String,
    #[serde(default)]
    pub subject_name: String,
    pub given_at: DateTime<Utc>,
    #[serde(default)]
    pub out_of: Option<Score>,
    #[serde(default = "default_coefficient")]
    pub coefficient: f64,
    #[serde(default)]
    pub student_score: Option<Score>,
    #[serde(default)]
    pub average_score: Option<Score>,
    #[serde(default)]
    pub min_score: Option<Score>,
    #[serde(default)]
    pub max_score: Option<Score>,
    #[serde(default)]
    pub bonus: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub created_by_account: String,
}

impl Grade {
    /// Creates an ungraded record out of 20 with coefficient 1.
    pub fn new(subject_id: &str, subject_name: &str, given_at: DateTime<Utc>) -> Self {
        Grade {
            subject_id: subject_id.to_string(),
            subject_name: subject_name.to_string(),
            given_at,
            out_of: Some(Score::new(20.0)),
            coefficient: 1.0,
            student_score: None,
            average_score: None,
            min_score: None,
            max_score: None,
            bonus: false,
            optional: false,
            created_by_account: String::new(),
        }
    }

    pub fn with_out_of(mut self, out_of: f64) -> Self {
        self.out_of = Some(Score::new(out_of));
        self
    }

    pub fn with_coefficient(mut self, coefficient: f64) -> Self {
        self.coefficient = coefficient;
        self
    }

    /// Sets the score stored under `field`.
    pub fn with_score(mut self, field: ScoreField, score: Score) -> Self {
        *field.slot(&mut self) = Some(score);
        self
    }

    pub fn with_student(self, value: f64) -> Self {
        self.with_score(ScoreField::Student, Score::new(value))
    }

    pub fn as_bonus(mut self) -> Self {
        self.bonus = true;
        self
    }

    pub fn as_optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Scale denominator, when the record defines one.
    pub fn scale(&self) -> Option<f64> {
        self.out_of.as_ref().and_then(|s| s.value).filter(|v| v.is_finite())
    }
}

/// Which of the four scores of a [`Grade`] a reduction runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreField {
    /// The student's own score.
    Student,
    /// The class average for the assignment.
    Average,
    /// The lowest score in the class.
    Min,
    /// The highest score in the class.
    Max,
}

impl ScoreField {
    pub const ALL: [ScoreField; 4] = [
        ScoreField::Student,
        ScoreField::Average,
        ScoreField::Min,
        ScoreField::Max,
    ];

    pub fn of(self, grade: &Grade) -> Option<&Score> {
        match self {
            ScoreField::Student => grade.student_score.as_ref(),
            ScoreField::Average => grade.average_score.as_ref(),
            ScoreField::Min => grade.min_score.as_ref(),
            ScoreField::Max => grade.max_score.as_ref(),
        }
    }

    fn slot(self, grade: &mut Grade) -> &mut Option<Score> {
        match self {
            ScoreField::Student => &mut grade.student_score,
            ScoreField::Average => &mut grade.average_score,
            ScoreField::Min => &mut grade.min_score,
            ScoreField::Max => &mut grade.max_score,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScoreField::Student => "student",
            ScoreField::Average => "average",
            ScoreField::Min => "min",
            ScoreField::Max => "max",
        }
    }
}

impl fmt::Display for ScoreField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoreField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(ScoreField::Student),
            "average" => Ok(ScoreField::Average),
            "min" => Ok(ScoreField::Min),
            "max" => Ok(ScoreField::Max),
            other => bail!("unknown score field '{other}' (expected student, average, min or max)"),
        }
    }
}

/// Snapshot of a running average right after the grade given at `date`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageHistoryPoint {
    pub date: DateTime<Utc>,
    pub average: f64,
}

/// A chart-ready point.
///
/// `value` and `date` are display coordinates and may be distorted;
/// `original_value` and `original_date` are always the true snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPoint {
    pub value: f64,
    pub date: DateTime<Utc>,
    pub original_value: f64,
    pub original_date: DateTime<Utc>,
}
