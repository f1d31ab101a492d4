//! Shared helpers: a synthetic circular circuit with controllable per-third
//! pacing, fed through the engine the same way a live stream would be.

#![allow(dead_code)]

use laptrace_core::model::{IngestOutcome, LapCompletion, Sample};
use laptrace_core::RacingEngine;

/// Points per synthetic lap. With a 500 m radius the spacing comes out at
/// ~20.9 m, so only a true return to the start can close the loop.
pub const POINTS_PER_LAP: usize = 150;
const CIRCLE_RADIUS_M: f64 = 500.0;
const BASE_LAT: f64 = 45.0;
const BASE_LON: f64 = 9.0;
const M_PER_DEG_LAT: f64 = 111_320.0;

/// Coordinate of the i-th point on the closed loop; index 0 is the
/// start/finish point and indices wrap.
pub fn circle_point(i: usize) -> (f64, f64) {
    let theta = 2.0 * std::f64::consts::PI * (i % POINTS_PER_LAP) as f64 / POINTS_PER_LAP as f64;
    let lat = BASE_LAT + CIRCLE_RADIUS_M * theta.sin() / M_PER_DEG_LAT;
    let lon = BASE_LON
        + CIRCLE_RADIUS_M * (1.0 - theta.cos()) / (M_PER_DEG_LAT * BASE_LAT.to_radians().cos());
    (lat, lon)
}

/// One lap of samples starting at `t_start`. `thirds` are the seconds spent
/// in each third of the lap by point count, so sector pacing can be
/// controlled per lap.
pub fn lap_samples(t_start: f64, thirds: [f64; 3], speed: impl Fn(usize) -> f64) -> Vec<Sample> {
    let mut samples = Vec::with_capacity(POINTS_PER_LAP);
    let mut t = t_start;

    for i in 0..POINTS_PER_LAP {
        if i > 0 {
            let dt = if i <= 49 {
                thirds[0] / 49.0
            } else if i <= 99 {
                thirds[1] / 50.0
            } else {
                thirds[2] / 50.0
            };
            t += dt;
        }
        let (lat, lon) = circle_point(i);
        samples.push(Sample {
            timestamp: t,
            lat,
            lon,
            speed: speed(i),
        });
    }

    samples
}

/// Feed whole laps through the engine, closing the final one with an extra
/// sample back at the start line. Returns one completion per lap.
pub fn run_laps(engine: &mut RacingEngine, laps: &[([f64; 3], f64)]) -> Vec<LapCompletion> {
    run_timed_laps(engine, 0.0, laps).0
}

/// Like [`run_laps`] but starting the clock at `t0`, for feeding several
/// batches into the same engine. Returns the completions and the timestamp
/// of the closing sample left in the buffer.
pub fn run_timed_laps(
    engine: &mut RacingEngine,
    t0: f64,
    laps: &[([f64; 3], f64)],
) -> (Vec<LapCompletion>, f64) {
    let mut completions = Vec::new();
    let mut t = t0;
    let mut last_speed = 0.0;

    for (thirds, speed) in laps {
        let samples = lap_samples(t, *thirds, |_| *speed);
        t = samples[samples.len() - 1].timestamp + 0.4;
        last_speed = *speed;

        for sample in samples {
            match engine.process_sample(sample).expect("sample accepted") {
                IngestOutcome::LapCompleted(completion) => completions.push(*completion),
                IngestOutcome::Live(_) => {}
            }
        }
    }

    // close the final lap; this sample seeds the next one
    let (lat, lon) = circle_point(0);
    let closing = Sample {
        timestamp: t,
        lat,
        lon,
        speed: last_speed,
    };
    if let IngestOutcome::LapCompleted(completion) =
        engine.process_sample(closing).expect("sample accepted")
    {
        completions.push(*completion);
    }

    (completions, t)
}
