//! Per-record eligibility and rescaling onto the common /20 basis.

use std::ops::AddAssign;

use crate::model::{Grade, ScoreField};

/// The common basis every contribution is expressed against.
pub const SCALE: f64 = 20.0;

/// Denominators within this distance below [`SCALE`] are rescaled when the
/// coefficient is fractional.
const NEAR_SCALE_TOLERANCE: f64 = 5.0;

/// A weighted value and the weighted denominator it is measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Contribution {
    pub value: f64,
    pub denominator: f64,
}

impl Contribution {
    pub fn new(value: f64, denominator: f64) -> Self {
        Contribution { value, denominator }
    }

    /// The contribution read on a /20 scale, or `None` for an empty denominator.
    pub fn on_scale(&self) -> Option<f64> {
        if self.denominator == 0.0 {
            return None;
        }
        let ratio = self.value / self.denominator * SCALE;
        ratio.is_finite().then_some(ratio)
    }
}

impl AddAssign for Contribution {
    fn add_assign(&mut self, rhs: Self) {
        self.value += rhs.value;
        self.denominator += rhs.denominator;
    }
}

/// Returns `(value, out_of)` when `grade` may take part in a reduction over `field`.
///
/// A record is eligible when the score exists, is enabled, holds a finite
/// non-negative value, the scale is a positive number and the coefficient is
/// non-zero.
pub fn eligible_score(grade: &Grade, field: ScoreField) -> Option<(f64, f64)> {
    if grade.coefficient == 0.0 || !grade.coefficient.is_finite() {
        return None;
    }
    let value = field.of(grade)?.usable()?;
    if value < 0.0 {
        return None;
    }
    let out_of = grade.scale().filter(|o| *o > 0.0)?;
    Some((value, out_of))
}

/// Whether a score must be brought onto the /20 basis before accumulating.
pub fn needs_rescale(value: f64, out_of: f64, coefficient: f64) -> bool {
    value > SCALE
        || out_of > SCALE
        || (coefficient < 1.0 && (out_of - SCALE) >= -NEAR_SCALE_TOLERANCE)
}

/// Weighted contribution of a regular (non-bonus) score.
pub fn normalize(value: f64, out_of: f64, coefficient: f64) -> Contribution {
    if needs_rescale(value, out_of, coefficient) {
        let rescaled = value / out_of * SCALE;
        Contribution::new(rescaled * coefficient, SCALE * coefficient)
    } else {
        Contribution::new(value * coefficient, out_of * coefficient)
    }
}

/// Bonus points above half the scale, counted against a denominator of 1.
/// Bonuses below half contribute nothing.
pub fn bonus_contribution(value: f64, out_of: f64) -> Option<Contribution> {
    let above_half = value - out_of / 2.0;
    (above_half >= 0.0).then(|| Contribution::new(above_half, 1.0))
}

fn counts_as_bonus(grade: &Grade, field: ScoreField) -> bool {
    grade.bonus && field == ScoreField::Student
}

/// Contribution of a single record, before the optional best-of policy.
pub fn contribution(grade: &Grade, field: ScoreField) -> Option<Contribution> {
    let (value, out_of) = eligible_score(grade, field)?;
    if counts_as_bonus(grade, field) {
        return bonus_contribution(value, out_of);
    }
    Some(normalize(value, out_of, grade.coefficient))
}

/// The record's own value on the /20 basis, unweighted.
///
/// Bonus records have no value of their own on a scale and yield `None`.
pub fn normalized_value(grade: &Grade, field: ScoreField) -> Option<f64> {
    if counts_as_bonus(grade, field) {
        return None;
    }
    let (value, out_of) = eligible_score(grade, field)?;
    normalize(value, out_of, grade.coefficient).on_scale()
}
