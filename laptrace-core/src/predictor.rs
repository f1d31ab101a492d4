//! Live lap predictor
//!
//! Two per-sample products while a lap is in progress: the delta against
//! the optimal-lap reference at the same sector progress, and a lap-time
//! forecast from completed sector times weighted by similarity to
//! historical laps.

use crate::model::{LapForecast, LapRecord, Sample};
use crate::optimal::OptimalLap;
use crate::sectors::SectorMap;

/// Historical laps required before forecasting.
const MIN_HISTORY: usize = 3;

/// Gap vs the optimal sector reference at the equivalent progress point.
/// Positive means ahead of the reference. Zero when no reference exists.
///
/// Progress through the current sector (by index within the fixed sector
/// span) picks a position in the optimal sector's point list; the delta is
/// that point's elapsed time minus the elapsed time of the lap in progress.
pub fn delta_vs_optimal(
    optimal: &OptimalLap,
    sectors: &SectorMap,
    current_index: usize,
    current_sector: usize,
    elapsed: f64,
) -> f64 {
    let Some(reference) = optimal.sector(current_sector) else {
        return 0.0;
    };
    if reference.points.is_empty() {
        return 0.0;
    }

    let progress = match sectors.index_span(current_sector) {
        Some((start, end)) if end > start => {
            (current_index.saturating_sub(start)) as f64 / (end - start) as f64
        }
        _ => 0.0,
    };

    let len = reference.points.len();
    let position = ((progress * len as f64).floor() as usize).min(len - 1);

    let reference_elapsed = reference.points[position].timestamp - reference.points[0].timestamp;
    reference_elapsed - elapsed
}

/// Forecast the in-progress lap's total time from its completed sector
/// times, weighting each historical lap by similarity of those sectors.
/// None until enough history and at least two comparable laps exist.
pub fn forecast(
    history: &[LapRecord],
    buffer: &[Sample],
    sectors: &SectorMap,
    current_sector: usize,
    optimal: &OptimalLap,
) -> Option<LapForecast> {
    if history.len() < MIN_HISTORY {
        return None;
    }

    // Sector times of the lap in progress, for every sector up to and
    // including the current one that has at least two points so far.
    let mut observed: Vec<(usize, f64)> = Vec::new();
    for sector_id in 0..=current_sector {
        let mut first: Option<f64> = None;
        let mut last: Option<f64> = None;
        for (i, sample) in buffer.iter().enumerate() {
            if sectors.sector_of(i) == sector_id {
                if first.is_none() {
                    first = Some(sample.timestamp);
                }
                last = Some(sample.timestamp);
            }
        }
        if let (Some(first), Some(last)) = (first, last) {
            if last > first {
                observed.push((sector_id, last - first));
            }
        }
    }
    if observed.is_empty() {
        return None;
    }

    // Training pairs: same-sector times -> total time, from laps that have
    // every observed sector.
    let mut pairs: Vec<(Vec<f64>, f64)> = Vec::new();
    for lap in history {
        let times: Vec<f64> = observed
            .iter()
            .filter_map(|(sector_id, _)| lap.sectors.get(sector_id).map(|s| s.time))
            .collect();
        if times.len() == observed.len() {
            pairs.push((times, lap.total_time));
        }
    }
    if pairs.len() < 2 {
        return None;
    }

    let similarities: Vec<f64> = pairs
        .iter()
        .map(|(times, _)| {
            let distance: f64 = times
                .iter()
                .zip(observed.iter())
                .map(|(t, (_, current))| (t - current).abs())
                .sum();
            1.0 / (1.0 + distance)
        })
        .collect();

    let total: f64 = similarities.iter().sum();
    let predicted_lap_time = pairs
        .iter()
        .zip(similarities.iter())
        .map(|((_, y), s)| (s / total) * y)
        .sum();
    let confidence = similarities
        .iter()
        .map(|s| s / total)
        .fold(0.0, f64::max);

    Some(LapForecast {
        predicted_lap_time,
        confidence,
        optimal_time: optimal.total_time(),
    })
}
