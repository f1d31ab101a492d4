//! Tire degradation estimate
//!
//! Pace fade is the proxy for wear: a first-order least-squares fit of
//! average lap speed against lap number over the recent window. Grip is
//! anchored to the first lap of that window; the critical pace threshold is
//! 93% of it (7% pace loss reads as 70% grip).

use crate::model::{TireCondition, TireStatus, LAPS_REMAINING_UNKNOWN};

/// Laps needed before a regression is attempted.
const MIN_LAPS: usize = 3;
/// Grip below this triggers a pit recommendation.
const PIT_GRIP_THRESHOLD: f64 = 75.0;
/// Fraction of the reference pace treated as the critical speed.
const CRITICAL_PACE_FRACTION: f64 = 0.93;

/// Assess tire state from the recent `(lap_number, avg_speed)` window, which
/// ends with the lap being completed. Reports fresh tires until the window
/// holds [`MIN_LAPS`] laps.
pub fn assess(recent: &[(u32, f64)], current_avg_speed: f64) -> TireStatus {
    let Some(&(current_lap, _)) = recent.last() else {
        return TireStatus::new_tires(0);
    };
    if recent.len() < MIN_LAPS {
        return TireStatus::new_tires(current_lap);
    }

    let degradation_rate = regression_slope(recent).abs();

    let initial_speed = recent[0].1;
    let speed_loss_percent = if initial_speed > 0.0 {
        (((initial_speed - current_avg_speed) / initial_speed) * 100.0).max(0.0)
    } else {
        0.0
    };
    let grip_level = (100.0 - speed_loss_percent).max(0.0);

    let critical_speed = initial_speed * CRITICAL_PACE_FRACTION;
    let laps_remaining = if degradation_rate > 0.01 && current_avg_speed > critical_speed {
        ((current_avg_speed - critical_speed) / degradation_rate).floor() as u32
    } else {
        LAPS_REMAINING_UNKNOWN
    };

    let pit_recommended = grip_level < PIT_GRIP_THRESHOLD || laps_remaining < 3;

    TireStatus {
        lap: current_lap,
        grip_level,
        degradation_rate,
        speed_loss_percent,
        laps_remaining,
        pit_recommended,
        status: condition_for_grip(grip_level),
    }
}

fn condition_for_grip(grip: f64) -> TireCondition {
    if grip >= 95.0 {
        TireCondition::Excellent
    } else if grip >= 85.0 {
        TireCondition::Good
    } else if grip >= 75.0 {
        TireCondition::Fair
    } else if grip >= 65.0 {
        TireCondition::Worn
    } else {
        TireCondition::Critical
    }
}

/// Slope of the least-squares line through `(lap_number, avg_speed)`.
fn regression_slope(points: &[(u32, f64)]) -> f64 {
    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|&(x, _)| x as f64).sum();
    let sum_y: f64 = points.iter().map(|&(_, y)| y).sum();
    let sum_xy: f64 = points.iter().map(|&(x, y)| x as f64 * y).sum();
    let sum_x2: f64 = points.iter().map(|&(x, _)| (x as f64).powi(2)).sum();

    let denom = n * sum_x2 - sum_x * sum_x;
    if denom.abs() < f64::EPSILON {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denom
}
