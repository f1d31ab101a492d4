//! Optimal-lap composition
//!
//! Keeps the fastest observed execution of every sector across the session
//! and derives the theoretical best lap, the racing line and the per-sector
//! improvement zones from it. Entries replace only on strict improvement,
//! so a tie keeps the earlier lap.

use crate::model::{
    Analysis, DataStatus, GeoPoint, ImprovementZone, LapRecord, OptimalLapView, OptimalSector,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimalLap {
    sectors: BTreeMap<usize, OptimalSector>,
}

impl OptimalLap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn sectors(&self) -> &BTreeMap<usize, OptimalSector> {
        &self.sectors
    }

    pub fn sector(&self, id: usize) -> Option<&OptimalSector> {
        self.sectors.get(&id)
    }

    /// Restore the composition from a saved session.
    pub fn restore(&mut self, sectors: BTreeMap<usize, OptimalSector>) {
        self.sectors = sectors;
    }

    /// Fold a completed lap in, replacing any sector it beat. Returns the
    /// ids of the sectors that improved.
    pub fn update(&mut self, lap: &LapRecord) -> Vec<usize> {
        let mut improved = Vec::new();

        for (&sector_id, summary) in &lap.sectors {
            let current_best = self
                .sectors
                .get(&sector_id)
                .map(|s| s.time)
                .unwrap_or(f64::INFINITY);

            if summary.time < current_best {
                self.sectors.insert(
                    sector_id,
                    OptimalSector {
                        time: summary.time,
                        points: summary.points.clone(),
                        lap_number: lap.lap_number,
                        avg_speed: summary.avg_speed,
                        max_speed: summary.max_speed,
                    },
                );
                improved.push(sector_id);
            }
        }

        if !improved.is_empty() {
            tracing::debug!(lap = lap.lap_number, sectors = ?improved, "optimal lap improved");
        }
        improved
    }

    /// Sum of the best sector times, when any exist.
    pub fn total_time(&self) -> Option<f64> {
        if self.sectors.is_empty() {
            return None;
        }
        Some(self.sectors.values().map(|s| s.time).sum())
    }

    /// Gap between the fastest real lap and the composition. Non-negative
    /// by construction; zero only when one lap holds every sector best.
    pub fn improvement_potential(&self, history: &[LapRecord]) -> f64 {
        let (Some(optimal_time), Some(fastest)) = (
            self.total_time(),
            history
                .iter()
                .map(|l| l.total_time)
                .min_by(f64::total_cmp),
        ) else {
            return 0.0;
        };
        fastest - optimal_time
    }

    pub fn view(&self, history: &[LapRecord]) -> Analysis<OptimalLapView> {
        match self.total_time() {
            Some(optimal_time) => Analysis::Ready(OptimalLapView {
                optimal_time,
                sectors: self.sectors.clone(),
                improvement_potential: self.improvement_potential(history),
            }),
            None => Analysis::pending(DataStatus::NoData),
        }
    }

    /// The best-sector points concatenated in sector order.
    pub fn racing_line(&self) -> Vec<GeoPoint> {
        self.sectors
            .values()
            .flat_map(|s| s.points.iter().map(|p| GeoPoint {
                lat: p.lat,
                lon: p.lon,
            }))
            .collect()
    }

    /// Where the latest lap lost time against the composition, worst sector
    /// first. Empty until three laps exist to make the comparison fair.
    pub fn improvement_zones(&self, history: &[LapRecord]) -> Vec<ImprovementZone> {
        if history.len() < 3 {
            return Vec::new();
        }
        let Some(latest) = history.last() else {
            return Vec::new();
        };

        let mut zones: Vec<ImprovementZone> = latest
            .sectors
            .iter()
            .filter_map(|(&sector_id, summary)| {
                let best = self.sectors.get(&sector_id)?;
                let time_loss = summary.time - best.time;
                Some(ImprovementZone {
                    sector: sector_id,
                    time_loss,
                    percentage_loss: if best.time > 0.0 {
                        time_loss / best.time * 100.0
                    } else {
                        0.0
                    },
                    optimal_avg_speed: best.avg_speed,
                    current_avg_speed: summary.avg_speed,
                    speed_deficit: best.avg_speed - summary.avg_speed,
                })
            })
            .collect();

        zones.sort_by(|a, b| b.time_loss.total_cmp(&a.time_loss));
        zones
    }
}
