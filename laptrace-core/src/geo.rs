//! Geographic and signal primitives
//!
//! Great-circle math on the haversine sphere plus the speed-trace smoothing
//! used by the event extractor. Coordinates are WGS84 degrees; the geo crate
//! takes points as (x, y) = (lon, lat).

use geo::{HaversineBearing, HaversineDistance, Point};

/// Savitzky-Golay window for speed smoothing.
const SG_WINDOW: usize = 11;
const SG_HALF: usize = SG_WINDOW / 2;

/// Haversine distance between two coordinates, in meters.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    Point::new(lon1, lat1).haversine_distance(&Point::new(lon2, lat2))
}

/// Initial bearing from the first coordinate to the second, in degrees
/// normalized to [0, 360).
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    Point::new(lon1, lat1)
        .haversine_bearing(Point::new(lon2, lat2))
        .rem_euclid(360.0)
}

/// Smooth a speed trace with a quadratic Savitzky-Golay filter over an
/// 11-sample window. Traces shorter than the window pass through unchanged.
///
/// Interior samples use the closed-form quadratic kernel; the half-window at
/// each end is re-evaluated from a least-squares parabola fitted to the
/// leading/trailing window, matching the usual "interp" edge treatment.
pub fn smooth_speeds(speeds: &[f64]) -> Vec<f64> {
    let n = speeds.len();
    if n < SG_WINDOW {
        return speeds.to_vec();
    }

    let mut out = Vec::with_capacity(n);

    let (a, b, c) = fit_quadratic(&speeds[..SG_WINDOW]);
    for x in 0..SG_HALF {
        let x = x as f64;
        out.push(a + b * x + c * x * x);
    }

    for i in SG_HALF..n - SG_HALF {
        let mut acc = 0.0;
        for d in -(SG_HALF as isize)..=(SG_HALF as isize) {
            // quadratic kernel weight for an 11-point window: (89 - 5d^2)/429
            let w = (89.0 - 5.0 * (d * d) as f64) / 429.0;
            acc += w * speeds[(i as isize + d) as usize];
        }
        out.push(acc);
    }

    let (a, b, c) = fit_quadratic(&speeds[n - SG_WINDOW..]);
    for x in SG_WINDOW - SG_HALF..SG_WINDOW {
        let x = x as f64;
        out.push(a + b * x + c * x * x);
    }

    out
}

/// Least-squares parabola `y = a + b·x + c·x²` over `x = 0..ys.len()`,
/// solved from the normal equations by Cramer's rule.
fn fit_quadratic(ys: &[f64]) -> (f64, f64, f64) {
    let n = ys.len() as f64;
    let (mut s1, mut s2, mut s3, mut s4) = (0.0, 0.0, 0.0, 0.0);
    let (mut t0, mut t1, mut t2) = (0.0, 0.0, 0.0);

    for (i, &y) in ys.iter().enumerate() {
        let x = i as f64;
        let x2 = x * x;
        s1 += x;
        s2 += x2;
        s3 += x2 * x;
        s4 += x2 * x2;
        t0 += y;
        t1 += x * y;
        t2 += x2 * y;
    }

    let det = |m: [[f64; 3]; 3]| -> f64 {
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    };

    // distinct x positions keep the system well-conditioned
    let d = det([[n, s1, s2], [s1, s2, s3], [s2, s3, s4]]);
    let da = det([[t0, s1, s2], [t1, s2, s3], [t2, s3, s4]]);
    let db = det([[n, t0, s2], [s1, t1, s3], [s2, t2, s4]]);
    let dc = det([[n, s1, t0], [s1, s2, t1], [s2, s3, t2]]);

    (da / d, db / d, dc / d)
}
