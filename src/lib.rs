pub mod analytics;
pub mod model;
pub mod output;
pub mod parser;

use std::borrow::Borrow;

pub use analytics::strategy::AverageStrategy;
pub use analytics::subject::NO_AVERAGE;
pub use analytics::summary::{GradeSummary, summarize};
pub use model::{AverageHistoryPoint, Grade, GraphPoint, Score, ScoreField};

/// Average of one subject's grades on a 0-20 scale, or [`NO_AVERAGE`] (-1)
/// when none of them is eligible.
pub fn compute_subject_average<G: Borrow<Grade>>(grades: &[G], field: ScoreField) -> f64 {
    analytics::subject::subject_average(grades, field)
}

/// Overall average under `strategy`; 0 when nothing is eligible.
pub fn compute_strategy_average<G: Borrow<Grade>>(
    grades: &[G],
    strategy: AverageStrategy,
    field: ScoreField,
) -> f64 {
    strategy.compute(grades, field)
}

/// One snapshot of `strategy` per record, in chronological order.
pub fn build_average_history<G: Borrow<Grade>>(
    grades: &[G],
    strategy: AverageStrategy,
    field: ScoreField,
) -> Vec<AverageHistoryPoint> {
    analytics::history::build_average_history(grades, strategy, field)
}

/// Chart points for an axis spanning `scale`, keeping the true values for read-out.
pub fn amplify_for_display(history: &[AverageHistoryPoint], scale: f64) -> Vec<GraphPoint> {
    analytics::amplifier::amplify_for_display(history, scale)
}
