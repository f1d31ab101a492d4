//! Track sector map
//!
//! The first completed lap fixes the sector boundaries for the rest of the
//! session: cumulative haversine distance along the lap is split into
//! equal-length segments and the resulting sample-index cutoffs are reused
//! to classify every later lap's points. Later laps may be shorter or longer
//! than the reference lap; indices past the last cutoff clip into the final
//! sector.

use crate::geo::haversine_distance;
use crate::model::Sample;
use serde::{Deserialize, Serialize};

/// Default number of sectors a track is split into.
pub const DEFAULT_SECTORS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorMap {
    /// `[0, i1, ..., N-1]` sample-index cutoffs; empty until the first lap
    /// has been measured. Write-once.
    boundaries: Vec<usize>,
    num_sectors: usize,
}

impl SectorMap {
    pub fn new(num_sectors: usize) -> Self {
        SectorMap {
            boundaries: Vec::new(),
            num_sectors,
        }
    }

    pub fn is_ready(&self) -> bool {
        !self.boundaries.is_empty()
    }

    pub fn num_sectors(&self) -> usize {
        self.num_sectors
    }

    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    /// Restore boundaries from a saved session.
    pub fn restore(&mut self, boundaries: Vec<usize>) {
        self.boundaries = boundaries;
    }

    /// Measure sector boundaries from the reference lap. No-op once set or
    /// when the lap is too short to carry one boundary per sector.
    pub fn measure(&mut self, samples: &[Sample]) {
        if self.is_ready() || samples.len() < self.num_sectors * 3 {
            return;
        }

        let total: f64 = samples
            .windows(2)
            .map(|w| haversine_distance(w[0].lat, w[0].lon, w[1].lat, w[1].lon))
            .sum();
        let sector_length = total / self.num_sectors as f64;

        let mut boundaries = vec![0];
        let mut cumulative = 0.0;
        for (i, w) in samples.windows(2).enumerate() {
            cumulative += haversine_distance(w[0].lat, w[0].lon, w[1].lat, w[1].lon);
            if cumulative >= sector_length * boundaries.len() as f64
                && boundaries.len() < self.num_sectors
            {
                boundaries.push(i);
            }
        }
        boundaries.push(samples.len() - 1);

        tracing::debug!(?boundaries, track_length_m = total, "sector map fixed");
        self.boundaries = boundaries;
    }

    /// Sector for a sample index: the smallest sector whose upper cutoff is
    /// still above the index, clipping into the last sector beyond the final
    /// cutoff. Sector 0 when no boundaries exist yet.
    pub fn sector_of(&self, index: usize) -> usize {
        if self.boundaries.is_empty() {
            return 0;
        }
        for (k, &cutoff) in self.boundaries[1..].iter().enumerate() {
            if index < cutoff {
                return k;
            }
        }
        self.boundaries.len().saturating_sub(2)
    }

    /// Index range `[start, end)` covered by a sector in the reference lap,
    /// used to express progress through the current sector.
    pub fn index_span(&self, sector: usize) -> Option<(usize, usize)> {
        let start = *self.boundaries.get(sector)?;
        let end = *self.boundaries.get(sector + 1)?;
        Some((start, end))
    }
}
