//! Chronological replay of an averaging strategy.

use std::borrow::Borrow;

use tracing::debug;

use crate::analytics::strategy::AverageStrategy;
use crate::model::{AverageHistoryPoint, Grade, ScoreField};

/// Builds one snapshot per record, in ascending `given_at` order.
///
/// Each snapshot recomputes `strategy` over every record given up to and
/// including that one. The cost is quadratic in the number of records, which
/// stays small for a single school term.
pub fn build_average_history<G: Borrow<Grade>>(
    grades: &[G],
    strategy: AverageStrategy,
    field: ScoreField,
) -> Vec<AverageHistoryPoint> {
    let mut sorted: Vec<&Grade> = grades.iter().map(Borrow::borrow).collect();
    sorted.sort_by_key(|grade| grade.given_at);

    let history: Vec<AverageHistoryPoint> = sorted
        .iter()
        .enumerate()
        .map(|(index, grade)| AverageHistoryPoint {
            date: grade.given_at,
            average: strategy.compute(&sorted[..=index], field),
        })
        .collect();

    debug!(points = history.len(), %strategy, %field, "Average history built");
    history
}
