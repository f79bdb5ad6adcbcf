//! Display-only transform turning an average history into chart points.
//!
//! Real progressions are often flat (a term average moving by a few tenths)
//! or dominated by one early extreme value. The steps below keep small
//! movements visible and stop a single outlier from flattening the rest of
//! the curve. Every point keeps its true value and date for read-out, so the
//! distortion never leaks into reported statistics.
//!
//! All constants are fixed: charts rendered from the same history must look
//! the same everywhere.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, trace};

use crate::analytics::utility::{mean, round2};
use crate::model::{AverageHistoryPoint, GraphPoint};

/// Smallest number of trailing points forming the recent window.
const MIN_RECENT_WINDOW: usize = 5;
/// Share of the series forming the recent window when that is larger.
const RECENT_WINDOW_SHARE: f64 = 0.5;

/// Distance from the recent mean beyond which a point is an outlier.
const OUTLIER_THRESHOLD: f64 = 3.0;
/// Factor applied to the part of an outlier's deviation beyond the threshold.
const OUTLIER_DAMPING: f64 = 0.3;

/// Neighbors taken on each side when looking for local peaks.
const NEIGHBOR_RADIUS: usize = 2;
/// Minimum distance from the neighbor mean for a point to count as a peak.
const PEAK_THRESHOLD: f64 = 0.2;
/// Gain applied to a peak's distance from its neighbor mean.
const PEAK_GAIN: f64 = 3.5;

/// Global axis usage (percent) under which the series is stretched.
const LOW_GLOBAL_USAGE: f64 = 30.0;
/// Recent-window axis usage (percent) under which the series is stretched.
const LOW_RECENT_USAGE: f64 = 20.0;
/// Share of the axis a stretched series should span.
const TARGET_SPREAD_SHARE: f64 = 0.4;
/// Upper bound on the stretch factor.
const MAX_STRETCH: f64 = 4.0;

/// Display spacing between consecutive points, half a day.
fn point_spacing() -> Duration {
    Duration::hours(12)
}

#[derive(Debug, Clone, Copy)]
struct Extent {
    min: f64,
    max: f64,
}

impl Extent {
    fn of(values: &[f64]) -> Self {
        values.iter().fold(
            Extent {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            },
            |extent, v| Extent {
                min: extent.min.min(*v),
                max: extent.max.max(*v),
            },
        )
    }

    fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Number of trailing points forming the recent window.
fn recent_window(count: usize) -> usize {
    let share = (count as f64 * RECENT_WINDOW_SHARE).ceil() as usize;
    MIN_RECENT_WINDOW.max(share).min(count)
}

/// Pulls points far from `center` back towards it, keeping the side they lie on.
fn compress_outliers(values: &[f64], center: f64) -> Vec<f64> {
    values
        .iter()
        .map(|&value| {
            let deviation = value - center;
            if deviation.abs() > OUTLIER_THRESHOLD {
                let excess = deviation.abs() - OUTLIER_THRESHOLD;
                center + deviation.signum() * (OUTLIER_THRESHOLD + excess * OUTLIER_DAMPING)
            } else {
                value
            }
        })
        .collect()
}

/// Exaggerates each point's distance from the mean of its neighbors.
fn amplify_peaks(values: &[f64]) -> Vec<f64> {
    let last = values.len().saturating_sub(1);

    values
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            let start = index.saturating_sub(NEIGHBOR_RADIUS);
            let end = (index + NEIGHBOR_RADIUS).min(last);
            let neighbors: Vec<f64> = (start..=end)
                .filter(|&j| j != index)
                .map(|j| values[j])
                .collect();

            if neighbors.is_empty() {
                return value;
            }

            let neighbor_mean = mean(&neighbors);
            if (value - neighbor_mean).abs() > PEAK_THRESHOLD {
                neighbor_mean + (value - neighbor_mean) * PEAK_GAIN
            } else {
                value
            }
        })
        .collect()
}

/// Spreads a narrow series around `center` so it spans a readable part of the axis.
fn stretch(values: Vec<f64>, center: f64, scale: f64) -> Vec<f64> {
    let spread = Extent::of(&values).range();
    let target = TARGET_SPREAD_SHARE * scale;

    if !(spread > 0.0 && spread < target) {
        return values;
    }

    let factor = MAX_STRETCH.min(target / spread);
    debug!(spread, target, factor, "Stretching flat series");

    values
        .into_iter()
        .map(|value| center + (value - center) * factor)
        .collect()
}

fn display_date(first: DateTime<Utc>, index: usize) -> DateTime<Utc> {
    first + point_spacing() * index as i32
}

/// Turns an average history into chart points for an axis spanning `scale`.
///
/// Points with a non-finite average are dropped. The output is as long as
/// what remains; `original_value`/`original_date` carry the true snapshot.
pub fn amplify_for_display(history: &[AverageHistoryPoint], scale: f64) -> Vec<GraphPoint> {
    let points: Vec<&AverageHistoryPoint> = history
        .iter()
        .filter(|point| point.average.is_finite())
        .collect();

    let Some(first) = points.first() else {
        return Vec::new();
    };
    let first_date = first.date;

    let originals: Vec<f64> = points.iter().map(|point| point.average).collect();
    let global = Extent::of(&originals);

    let window = recent_window(originals.len());
    let recent_values = &originals[originals.len() - window..];
    let recent = Extent::of(recent_values);
    let recent_mean = mean(recent_values);

    let recent_usage = recent.range() / scale * 100.0;
    let global_usage = global.range() / scale * 100.0;
    trace!(
        count = originals.len(),
        window,
        recent_mean,
        recent_usage,
        global_usage,
        "Amplifying history"
    );

    let compressed = compress_outliers(&originals, recent_mean);
    let amplified = amplify_peaks(&compressed);

    let low_usage = global_usage < LOW_GLOBAL_USAGE || recent_usage < LOW_RECENT_USAGE;
    let values = if low_usage && global.range() > 0.0 {
        stretch(amplified, recent_mean, scale)
    } else {
        amplified
    };

    points
        .iter()
        .zip(values)
        .enumerate()
        .map(|(index, (point, value))| GraphPoint {
            value: round2(value),
            date: display_date(first_date, index),
            original_value: point.average,
            original_date: point.date,
        })
        .collect()
}
