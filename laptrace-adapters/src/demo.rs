//! Demo source that generates synthetic GPS laps for testing
//!
//! Simulates a kart circuit as a closed loop of segments (straights,
//! braking zones, corners, acceleration phases) traced around a geographic
//! center at a fixed 10 Hz simulation step. The stream is fully
//! deterministic: no wall clock, noise comes from a seeded hash, and pace
//! fades slightly lap over lap so the degradation analytics have a real
//! trend to pick up.

use anyhow::Result;
use laptrace_core::model::Sample;
use laptrace_core::source::SampleSource;

/// Simulation step in seconds (10 Hz).
const STEP_SECS: f64 = 0.1;

/// Closed-loop track length in meters.
const TRACK_LENGTH_M: f64 = 1100.0;

/// Circuit center, somewhere in karting country.
const CENTER_LAT: f64 = 45.6206;
const CENTER_LON: f64 = 9.2854;

/// Meters per degree of latitude (WGS84, mid-latitudes).
const M_PER_DEG_LAT: f64 = 111_320.0;

// =============================================================================
// Track definition — a sequence of segments that form a lap
// =============================================================================

#[derive(Clone, Copy)]
enum SegmentKind {
    Straight, // full throttle, top speed
    Braking,  // scrubbing speed into a corner
    Corner,   // constant-ish cornering speed
    Accel,    // pulling out of a corner
}

#[derive(Clone, Copy)]
struct TrackSegment {
    kind: SegmentKind,
    /// Fraction of the lap distance this segment covers.
    length_frac: f64,
    /// Speed in km/h at the end of the segment.
    target_speed: f64,
}

/// A kart circuit: three straights, a hairpin, two slow corners and a
/// sweeper. Fractions sum to 1.0.
fn demo_track() -> Vec<TrackSegment> {
    vec![
        // Start/finish straight
        TrackSegment { kind: SegmentKind::Straight, length_frac: 0.16, target_speed: 72.0 },
        // T1: hairpin
        TrackSegment { kind: SegmentKind::Braking,  length_frac: 0.03, target_speed: 30.0 },
        TrackSegment { kind: SegmentKind::Corner,   length_frac: 0.05, target_speed: 26.0 },
        TrackSegment { kind: SegmentKind::Accel,    length_frac: 0.06, target_speed: 55.0 },
        // Short straight
        TrackSegment { kind: SegmentKind::Straight, length_frac: 0.10, target_speed: 65.0 },
        // T2: medium left
        TrackSegment { kind: SegmentKind::Braking,  length_frac: 0.02, target_speed: 38.0 },
        TrackSegment { kind: SegmentKind::Corner,   length_frac: 0.04, target_speed: 34.0 },
        TrackSegment { kind: SegmentKind::Accel,    length_frac: 0.05, target_speed: 58.0 },
        // Back straight
        TrackSegment { kind: SegmentKind::Straight, length_frac: 0.14, target_speed: 75.0 },
        // T3: tight right
        TrackSegment { kind: SegmentKind::Braking,  length_frac: 0.03, target_speed: 32.0 },
        TrackSegment { kind: SegmentKind::Corner,   length_frac: 0.04, target_speed: 28.0 },
        TrackSegment { kind: SegmentKind::Accel,    length_frac: 0.05, target_speed: 56.0 },
        // T4: fast sweeper onto the final straight
        TrackSegment { kind: SegmentKind::Corner,   length_frac: 0.05, target_speed: 38.0 },
        TrackSegment { kind: SegmentKind::Accel,    length_frac: 0.04, target_speed: 60.0 },
        // Run to start/finish
        TrackSegment { kind: SegmentKind::Straight, length_frac: 0.14, target_speed: 70.0 },
    ]
}

/// Target speed at a lap-distance fraction: smooth interpolation from the
/// previous segment's target to the current one.
fn speed_at(track: &[TrackSegment], lap_frac: f64) -> f64 {
    let lap_frac = lap_frac.rem_euclid(1.0);

    let mut elapsed = 0.0;
    let mut seg_idx = track.len() - 1;
    for (i, seg) in track.iter().enumerate() {
        if elapsed + seg.length_frac > lap_frac {
            seg_idx = i;
            break;
        }
        elapsed += seg.length_frac;
    }

    let seg = track[seg_idx];
    let seg_t = ((lap_frac - elapsed) / seg.length_frac).clamp(0.0, 1.0);

    let prev_target = if seg_idx > 0 {
        track[seg_idx - 1].target_speed
    } else {
        track[track.len() - 1].target_speed
    };

    lerp(prev_target, seg.target_speed, smoothstep(seg_t))
}

fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Simple deterministic noise from a seed
fn noise(seed: f64) -> f64 {
    let x = (seed * 12.9898 + 78.233).sin() * 43_758.547;
    x - x.floor()
}

/// Small jitter centered around 0
fn jitter(seed: f64, amplitude: f64) -> f64 {
    (noise(seed) - 0.5) * 2.0 * amplitude
}

// =============================================================================
// DemoCircuit
// =============================================================================

pub struct DemoCircuit {
    active: bool,
    track: Vec<TrackSegment>,
    /// Simulated seconds since start().
    sim_time: f64,
    /// Distance along the current lap in meters.
    arc: f64,
    lap: u32,
    sample_count: u64,
}

impl DemoCircuit {
    pub fn new() -> Self {
        Self {
            active: false,
            track: demo_track(),
            sim_time: 0.0,
            arc: 0.0,
            lap: 1,
            sample_count: 0,
        }
    }

    /// Lap-over-lap pace fade standing in for tire wear.
    fn pace_factor(&self) -> f64 {
        (1.0 - 0.005 * (self.lap as f64 - 1.0)).max(0.88)
    }

    fn generate_sample(&mut self) -> Sample {
        self.sample_count += 1;
        let n = self.sample_count as f64; // noise seed

        let lap_frac = self.arc / TRACK_LENGTH_M;
        let speed = (speed_at(&self.track, lap_frac) * self.pace_factor()
            + jitter(n, 0.4)
            + jitter(self.lap as f64 * 7.31, 0.6))
        .max(3.0);

        // Position on a circular path; one full turn per lap.
        let radius = TRACK_LENGTH_M / (2.0 * std::f64::consts::PI);
        let theta = self.arc / radius;
        let lat = CENTER_LAT
            + (radius * theta.cos()) / M_PER_DEG_LAT
            + jitter(n * 1.1, 2.0e-6);
        let lon = CENTER_LON
            + (radius * theta.sin()) / (M_PER_DEG_LAT * CENTER_LAT.to_radians().cos())
            + jitter(n * 1.2, 2.0e-6);

        let sample = Sample {
            timestamp: self.sim_time,
            lat,
            lon,
            speed,
        };

        // Advance the simulation by one step.
        self.arc += speed / 3.6 * STEP_SECS;
        self.sim_time += STEP_SECS;
        if self.arc >= TRACK_LENGTH_M {
            self.arc -= TRACK_LENGTH_M;
            self.lap += 1;
        }

        sample
    }
}

impl Default for DemoCircuit {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for DemoCircuit {
    fn key(&self) -> &str {
        "demo"
    }

    fn name(&self) -> &str {
        "Demo Circuit"
    }

    fn detect(&self) -> bool {
        true
    }

    fn start(&mut self) -> Result<()> {
        self.active = true;
        self.sim_time = 0.0;
        self.arc = 0.0;
        self.lap = 1;
        self.sample_count = 0;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.active = false;
        Ok(())
    }

    fn next_sample(&mut self) -> Result<Option<Sample>> {
        if !self.active {
            return Ok(None);
        }
        Ok(Some(self.generate_sample()))
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
