//! Driver performance scoring
//!
//! Composite of three signals over the recent lap window: raw pace against
//! the best lap, lap-time consistency, and within-lap speed smoothness.

use crate::model::{PerformanceSnapshot, Rating, Sample, Trend};

const SPEED_WEIGHT: f64 = 0.4;
const CONSISTENCY_WEIGHT: f64 = 0.3;
const SMOOTHNESS_WEIGHT: f64 = 0.3;

/// Score the lap being completed. `window_times` is the recent lap-time
/// window (up to 10 laps) ending with `current_time`; `lap_samples` are the
/// completed lap's raw samples for the smoothness term; `prior` holds the
/// snapshots of earlier laps for the trend. Returns `None` until two laps
/// exist to compare.
pub fn score(
    window_times: &[f64],
    current_time: f64,
    lap_samples: &[Sample],
    prior: &[PerformanceSnapshot],
    lap_number: u32,
) -> Option<PerformanceSnapshot> {
    if window_times.len() < 2 {
        return None;
    }

    let best_time = window_times.iter().copied().fold(f64::INFINITY, f64::min);
    let speed_score = if best_time > 0.0 {
        (100.0 - ((current_time - best_time) / best_time) * 100.0).max(0.0)
    } else {
        0.0
    };

    let consistency_score = (100.0 - stddev(window_times) * 10.0).max(0.0);

    let smoothness_score = if lap_samples.len() > 1 {
        let changes: f64 = lap_samples
            .windows(2)
            .map(|w| (w[1].speed - w[0].speed).abs())
            .sum();
        let avg_change = changes / (lap_samples.len() - 1) as f64;
        (100.0 - avg_change * 5.0).max(0.0)
    } else {
        75.0
    };

    let overall_score = speed_score * SPEED_WEIGHT
        + consistency_score * CONSISTENCY_WEIGHT
        + smoothness_score * SMOOTHNESS_WEIGHT;

    Some(PerformanceSnapshot {
        lap: lap_number,
        overall_score,
        speed_score,
        consistency_score,
        smoothness_score,
        rating: rating_for(overall_score),
        trend: trend_from(prior),
    })
}

fn rating_for(score: f64) -> Rating {
    if score >= 95.0 {
        Rating::SPlus
    } else if score >= 90.0 {
        Rating::S
    } else if score >= 85.0 {
        Rating::APlus
    } else if score >= 80.0 {
        Rating::A
    } else if score >= 75.0 {
        Rating::BPlus
    } else if score >= 70.0 {
        Rating::B
    } else if score >= 60.0 {
        Rating::C
    } else {
        Rating::D
    }
}

/// Direction of the overall score across the last (up to five) snapshots.
/// Stable until at least three snapshots exist.
fn trend_from(prior: &[PerformanceSnapshot]) -> Trend {
    if prior.len() < 3 {
        return Trend::Stable;
    }

    let window = &prior[prior.len().saturating_sub(5)..];
    let delta = window[window.len() - 1].overall_score - window[0].overall_score;
    if delta > 3.0 {
        Trend::Improving
    } else if delta < -3.0 {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Population standard deviation.
fn stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
