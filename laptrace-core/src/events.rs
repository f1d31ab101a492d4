//! Event extraction from a completed lap
//!
//! All detectors run over the lap's speed trace: corners from local minima
//! of the smoothed trace, brake/acceleration zones from raw sample-to-sample
//! deltas, overtaking zones from windowed means and corner-exit gains.
//! Corner executions are additionally scored against the historical best at
//! the same ordinal position to surface coaching opportunities.

use crate::geo::haversine_distance;
use crate::model::{
    AccelEvent, AccelZoneKind, BrakeEvent, BrakeIntensity, BrakeOptimization, CornerEvent,
    CornerImprovement, CornerKind, CornerObservation, OvertakingKind, OvertakingZone, Sample,
};
use std::collections::BTreeMap;

/// Speed below which a smoothed local minimum counts as a corner (km/h).
const CORNER_SPEED_THRESHOLD: f64 = 40.0;
/// Sample-to-sample speed drop that counts as braking (km/h).
const BRAKE_THRESHOLD: f64 = 3.0;
/// Drop above which braking is classified as hard (km/h).
const HARD_BRAKE_THRESHOLD: f64 = 10.0;
/// Sample-to-sample speed gain that counts as acceleration (km/h).
const ACCEL_THRESHOLD: f64 = 2.0;
/// Windowed mean speed above which a stretch is an overtaking straight.
const OVERTAKE_STRAIGHT_SPEED: f64 = 50.0;
/// Brake zones within this distance are treated as the same zone (m).
const SAME_ZONE_RADIUS_M: f64 = 10.0;

impl CornerKind {
    /// Classify a corner from its severity fraction (0-1) and apex speed.
    pub fn classify(severity: f64, apex_speed: f64) -> Self {
        if severity > 0.5 {
            CornerKind::Hairpin
        } else if severity > 0.3 {
            CornerKind::Slow
        } else if apex_speed > 35.0 {
            CornerKind::Fast
        } else {
            CornerKind::Medium
        }
    }
}

/// Find corners: smoothed-speed local minima below the corner threshold.
/// Entry/exit are read five samples either side of the apex.
pub fn detect_corners(samples: &[Sample], smoothed: &[f64]) -> Vec<CornerEvent> {
    let mut corners = Vec::new();
    if smoothed.len() < 11 {
        return corners;
    }

    for i in 5..smoothed.len() - 5 {
        let is_minimum = smoothed[i] < smoothed[i - 3] && smoothed[i] < smoothed[i + 3];
        if !is_minimum || smoothed[i] >= CORNER_SPEED_THRESHOLD {
            continue;
        }

        let entry_speed = smoothed[i - 5];
        let apex_speed = smoothed[i];
        let exit_speed = smoothed[i + 5];

        let speed_loss = entry_speed - apex_speed;
        let severity = if entry_speed > 0.0 {
            speed_loss / entry_speed
        } else {
            0.0
        };
        let exit_acceleration = exit_speed - apex_speed;

        corners.push(CornerEvent {
            index: i,
            lat: samples[i].lat,
            lon: samples[i].lon,
            entry_speed,
            apex_speed,
            exit_speed,
            speed_loss,
            severity: severity * 100.0,
            exit_acceleration,
            kind: CornerKind::classify(severity, apex_speed),
        });
    }

    corners
}

/// Score each corner against its per-ordinal history and emit improvement
/// records for corners driven more than 10% below the best-ever score.
///
/// Corners are correlated across laps by ordinal position within the lap
/// (the k-th detected corner), which drifts when detection counts differ
/// between laps.
pub fn analyze_corner_performance(
    corner_log: &mut BTreeMap<usize, Vec<CornerObservation>>,
    corners: &[CornerEvent],
    lap_number: u32,
) -> Vec<CornerImprovement> {
    let mut analysis = Vec::new();

    for (ordinal, corner) in corners.iter().enumerate() {
        // higher exit acceleration with minimal speed loss scores best
        let performance_score = corner.exit_acceleration * 2.0 - corner.speed_loss;

        let history = corner_log.entry(ordinal).or_default();
        history.push(CornerObservation {
            lap: lap_number,
            performance_score,
            entry_speed: corner.entry_speed,
            apex_speed: corner.apex_speed,
            exit_speed: corner.exit_speed,
            lat: corner.lat,
            lon: corner.lon,
        });

        if history.len() < 2 {
            continue;
        }

        let best_score = history
            .iter()
            .map(|c| c.performance_score)
            .fold(f64::NEG_INFINITY, f64::max);
        let improvement_potential = if best_score != 0.0 {
            (best_score - performance_score) / best_score.abs() * 100.0
        } else {
            0.0
        };

        if improvement_potential > 10.0 {
            let best_exit = history
                .iter()
                .map(|c| c.exit_speed)
                .fold(f64::NEG_INFINITY, f64::max);
            analysis.push(CornerImprovement {
                corner_number: ordinal + 1,
                improvement_potential,
                current_exit: corner.exit_speed,
                best_exit,
                recommendation: corner_recommendation(corner, history),
                lat: corner.lat,
                lon: corner.lon,
            });
        }
    }

    analysis
}

/// Coaching text from entry/exit deltas against the best historical
/// execution (best by exit speed) of the same corner.
fn corner_recommendation(current: &CornerEvent, history: &[CornerObservation]) -> String {
    let Some(best) = history
        .iter()
        .max_by(|a, b| a.exit_speed.total_cmp(&b.exit_speed))
    else {
        return "Good corner execution".to_string();
    };

    let entry_diff = current.entry_speed - best.entry_speed;
    let exit_diff = current.exit_speed - best.exit_speed;

    if entry_diff < -3.0 {
        "Entry too slow - brake later".to_string()
    } else if exit_diff < -2.0 {
        "Exit too slow - earlier throttle application".to_string()
    } else if entry_diff > 3.0 {
        "Entry too fast - brake earlier for better exit".to_string()
    } else {
        "Good corner execution".to_string()
    }
}

/// Brake zones: consecutive-sample speed drops above the brake threshold.
pub fn detect_brake_zones(samples: &[Sample]) -> Vec<BrakeEvent> {
    let mut zones = Vec::new();

    for i in 1..samples.len().saturating_sub(1) {
        let deceleration = samples[i - 1].speed - samples[i].speed;
        if deceleration > BRAKE_THRESHOLD {
            zones.push(BrakeEvent {
                index: i,
                lat: samples[i].lat,
                lon: samples[i].lon,
                speed_before: samples[i - 1].speed,
                speed_after: samples[i].speed,
                deceleration_rate: deceleration,
                intensity: if deceleration > HARD_BRAKE_THRESHOLD {
                    BrakeIntensity::Hard
                } else {
                    BrakeIntensity::Moderate
                },
            });
        }
    }

    zones
}

/// Acceleration zones: consecutive-sample speed gains above the threshold,
/// split into corner exits and straight-line pulls by the starting speed.
pub fn detect_accel_zones(samples: &[Sample]) -> Vec<AccelEvent> {
    let mut zones = Vec::new();

    for i in 1..samples.len().saturating_sub(1) {
        let acceleration = samples[i].speed - samples[i - 1].speed;
        if acceleration > ACCEL_THRESHOLD {
            zones.push(AccelEvent {
                index: i,
                lat: samples[i].lat,
                lon: samples[i].lon,
                speed_before: samples[i - 1].speed,
                speed_after: samples[i].speed,
                acceleration_rate: acceleration,
                zone_type: if samples[i - 1].speed < 30.0 {
                    AccelZoneKind::CornerExit
                } else {
                    AccelZoneKind::Straight
                },
            });
        }
    }

    zones
}

/// Overtaking zones: sustained high-speed stretches (slipstream chances)
/// and slow corners with a strong exit gain (run onto the next straight).
pub fn detect_overtaking_zones(samples: &[Sample]) -> Vec<OvertakingZone> {
    let mut zones = Vec::new();
    let n = samples.len();

    if n > 10 {
        for i in 5..n - 5 {
            let window = &samples[i - 5..i + 5];
            let avg_speed = window.iter().map(|s| s.speed).sum::<f64>() / window.len() as f64;
            if avg_speed > OVERTAKE_STRAIGHT_SPEED {
                zones.push(OvertakingZone {
                    index: i,
                    lat: samples[i].lat,
                    lon: samples[i].lon,
                    kind: OvertakingKind::HighSpeedStraight,
                    avg_speed: Some(avg_speed),
                    exit_speed: None,
                    confidence: 0.85,
                    recommendation: "Use slipstream for overtake".to_string(),
                });
            }
        }
    }

    if n > 5 {
        for i in 1..n - 5 {
            if samples[i].speed < 35.0 && samples[i + 5].speed > samples[i].speed + 10.0 {
                zones.push(OvertakingZone {
                    index: i,
                    lat: samples[i].lat,
                    lon: samples[i].lon,
                    kind: OvertakingKind::CornerExit,
                    avg_speed: None,
                    exit_speed: Some(samples[i + 5].speed),
                    confidence: 0.70,
                    recommendation: "Better exit = overtake next straight".to_string(),
                });
            }
        }
    }

    zones
}

/// Match this lap's brake zones against the cross-lap history by location
/// and recommend earlier/later braking where entry speeds diverge.
pub fn optimize_brake_points(
    history: &[BrakeEvent],
    current: &[BrakeEvent],
) -> Vec<BrakeOptimization> {
    let mut optimizations = Vec::new();

    for zone in current {
        for reference in history {
            let distance =
                haversine_distance(zone.lat, zone.lon, reference.lat, reference.lon);
            if distance >= SAME_ZONE_RADIUS_M {
                continue;
            }

            let speed_diff = reference.speed_before - zone.speed_before;
            if speed_diff.abs() > 2.0 {
                let brake_earlier = speed_diff > 0.0;
                optimizations.push(BrakeOptimization {
                    lat: zone.lat,
                    lon: zone.lon,
                    current_entry: zone.speed_before,
                    reference_entry: reference.speed_before,
                    brake_earlier,
                    time_gain_estimate: speed_diff.abs() * 0.05,
                    recommendation: format!(
                        "{} by ~{:.0} km/h",
                        if brake_earlier {
                            "Brake earlier"
                        } else {
                            "Brake later"
                        },
                        speed_diff.abs()
                    ),
                });
            }
        }
    }

    optimizations
}
