//! Tests for the event extractor: corner classification boundaries, brake
//! and acceleration zones, overtaking heuristics and corner coaching.

use laptrace_core::events::{
    analyze_corner_performance, detect_accel_zones, detect_brake_zones, detect_corners,
    detect_overtaking_zones, optimize_brake_points,
};
use laptrace_core::geo::smooth_speeds;
use laptrace_core::model::{
    AccelZoneKind, BrakeIntensity, CornerKind, OvertakingKind, Sample,
};
use std::collections::BTreeMap;

/// Samples strung along a line with 1s spacing and the given speeds.
fn samples_with_speeds(speeds: &[f64]) -> Vec<Sample> {
    speeds
        .iter()
        .enumerate()
        .map(|(i, &speed)| Sample {
            timestamp: i as f64,
            lat: 45.0 + i as f64 * 1e-4,
            lon: 9.0,
            speed,
        })
        .collect()
}

#[test]
fn corner_classification_boundaries() {
    // entry 50 / apex 20: severity 0.6 -> hairpin
    assert_eq!(CornerKind::classify(0.6, 20.0), CornerKind::Hairpin);
    // entry 40 / apex 30: severity 0.25, apex below 35 -> medium
    assert_eq!(CornerKind::classify(0.25, 30.0), CornerKind::Medium);
    // mild severity with a quick apex -> fast
    assert_eq!(CornerKind::classify(0.25, 36.0), CornerKind::Fast);
    // heavy but not hairpin-heavy -> slow
    assert_eq!(CornerKind::classify(0.35, 30.0), CornerKind::Slow);
    // boundary values fall to the weaker class
    assert_eq!(CornerKind::classify(0.5, 20.0), CornerKind::Slow);
    assert_eq!(CornerKind::classify(0.3, 36.0), CornerKind::Fast);
}

#[test]
fn a_speed_dip_is_detected_as_a_corner() {
    // straight at 55, hard dip to ~18, recovery to 45
    let mut speeds = vec![55.0; 12];
    speeds.extend([48.0, 40.0, 30.0, 22.0, 18.0, 22.0, 30.0, 38.0, 45.0]);
    speeds.extend(vec![45.0; 12]);

    let samples = samples_with_speeds(&speeds);
    let smoothed = smooth_speeds(&speeds);
    let corners = detect_corners(&samples, &smoothed);

    assert!(!corners.is_empty(), "the dip must register as a corner");
    let corner = &corners[0];
    assert!(corner.apex_speed < 40.0);
    assert!(corner.speed_loss > 0.0);
    assert!((corner.speed_loss - (corner.entry_speed - corner.apex_speed)).abs() < 1e-9);
    assert!(
        (corner.exit_acceleration - (corner.exit_speed - corner.apex_speed)).abs() < 1e-9
    );
    assert!((0.0..=100.0).contains(&corner.severity));
    assert_eq!(corner.lat, samples[corner.index].lat);
}

#[test]
fn constant_speed_has_no_corners() {
    let speeds = vec![30.0; 40];
    let samples = samples_with_speeds(&speeds);
    let corners = detect_corners(&samples, &smooth_speeds(&speeds));
    assert!(corners.is_empty());
}

#[test]
fn brake_zones_split_by_intensity() {
    // 3 km/h steps are ignored; >3 moderate; >10 hard
    let speeds = vec![60.0, 57.0, 52.0, 40.0, 39.0, 39.0];
    let samples = samples_with_speeds(&speeds);
    let zones = detect_brake_zones(&samples);

    assert_eq!(zones.len(), 2);
    assert_eq!(zones[0].index, 2);
    assert_eq!(zones[0].intensity, BrakeIntensity::Moderate);
    assert!((zones[0].deceleration_rate - 5.0).abs() < 1e-9);
    assert_eq!(zones[1].index, 3);
    assert_eq!(zones[1].intensity, BrakeIntensity::Hard);
    assert!((zones[1].deceleration_rate - 12.0).abs() < 1e-9);
}

#[test]
fn accel_zones_split_by_starting_speed() {
    // +5 from 25 km/h (corner exit), +4 from 50 km/h (straight)
    let speeds = vec![25.0, 30.0, 30.5, 50.0, 54.0, 54.0];
    let samples = samples_with_speeds(&speeds);
    let zones = detect_accel_zones(&samples);

    let exit = zones.iter().find(|z| z.index == 1).expect("corner exit");
    assert_eq!(exit.zone_type, AccelZoneKind::CornerExit);
    let pull = zones.iter().find(|z| z.index == 4).expect("straight pull");
    assert_eq!(pull.zone_type, AccelZoneKind::Straight);
}

#[test]
fn overtaking_zones_flag_straights_and_corner_exits() {
    // a long 60 km/h stretch, then a slow corner with a strong exit
    let mut speeds = vec![60.0; 20];
    speeds.extend([30.0, 30.0, 32.0, 35.0, 40.0, 46.0, 50.0, 52.0, 54.0, 55.0, 55.0]);
    let samples = samples_with_speeds(&speeds);

    let zones = detect_overtaking_zones(&samples);
    assert!(zones
        .iter()
        .any(|z| z.kind == OvertakingKind::HighSpeedStraight && z.confidence == 0.85));
    let exit = zones
        .iter()
        .find(|z| z.kind == OvertakingKind::CornerExit)
        .expect("corner exit zone");
    assert_eq!(exit.confidence, 0.70);
    assert!(exit.exit_speed.unwrap() > 40.0);
}

#[test]
fn corner_history_flags_a_degraded_execution() {
    let mut corner_log = BTreeMap::new();

    // lap 1: clean corner, strong exit
    let good = vec![
        55.0, 55.0, 55.0, 55.0, 55.0, 55.0, 50.0, 42.0, 33.0, 26.0, 22.0, 26.0, 33.0, 42.0,
        50.0, 54.0, 55.0, 55.0, 55.0, 55.0, 55.0, 55.0,
    ];
    let samples = samples_with_speeds(&good);
    let corners = detect_corners(&samples, &smooth_speeds(&good));
    assert!(!corners.is_empty());
    let analysis = analyze_corner_performance(&mut corner_log, &corners, 1);
    assert!(analysis.is_empty(), "the first lap has nothing to compare");

    // lap 2: same corner taken much worse (bogged-down exit)
    let bad = vec![
        55.0, 55.0, 55.0, 55.0, 55.0, 55.0, 48.0, 38.0, 28.0, 20.0, 15.0, 16.0, 17.0, 19.0,
        21.0, 23.0, 25.0, 27.0, 29.0, 31.0, 33.0, 35.0,
    ];
    let samples = samples_with_speeds(&bad);
    let corners = detect_corners(&samples, &smooth_speeds(&bad));
    assert!(!corners.is_empty());
    let analysis = analyze_corner_performance(&mut corner_log, &corners, 2);

    assert!(
        !analysis.is_empty(),
        "a clearly worse execution must be flagged"
    );
    let worst = &analysis[0];
    assert!(worst.improvement_potential > 10.0);
    assert!(!worst.recommendation.is_empty());
    assert_eq!(worst.corner_number, 1);
}

#[test]
fn brake_coaching_matches_zones_by_location() {
    let reference = samples_with_speeds(&[60.0, 45.0, 40.0, 40.0]);
    let history = detect_brake_zones(&reference);
    assert!(!history.is_empty());

    // same place, braking from 10 km/h less
    let current_samples = samples_with_speeds(&[50.0, 40.0, 38.0, 38.0]);
    let current = detect_brake_zones(&current_samples);
    assert!(!current.is_empty());

    let tips = optimize_brake_points(&history, &current);
    assert!(!tips.is_empty());
    assert!(tips[0].brake_earlier, "reference entry was faster");
    assert!(tips[0].time_gain_estimate > 0.0);

    // zones far apart never match
    let far_samples: Vec<Sample> = current_samples
        .iter()
        .map(|s| Sample {
            lat: s.lat + 0.01,
            ..*s
        })
        .collect();
    let far = detect_brake_zones(&far_samples);
    assert!(optimize_brake_points(&history, &far).is_empty());
}
