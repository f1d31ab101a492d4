//! The streaming lap-processing engine
//!
//! Single-writer state machine: samples arrive one at a time, the in-flight
//! lap accumulates in a buffer, and crossing the lap boundary triggers the
//! full analysis cascade (sectors, events, tire, performance, strategy,
//! optimal-lap composition). Between boundaries every sample gets a
//! lightweight live response. All queries are plain reads.

use crate::error::TelemetryError;
use crate::geo::{self, haversine_distance};
use crate::model::{
    Analysis, BestLap, BrakeEvent, CornerImprovement, CornerObservation, Dashboard, DataStatus,
    GeoPoint, ImprovementZone, IngestOutcome, LapCompletion, LapRecord, LiveUpdate,
    OptimalLapView, OvertakingZone, PerformanceSnapshot, Sample, SectorSummary, SessionMetadata,
    SessionStats, StrategyRecord, TireStatus,
};
use crate::optimal::OptimalLap;
use crate::sectors::{SectorMap, DEFAULT_SECTORS};
use crate::session::{self, SessionSnapshot};
use crate::{events, performance, predictor, strategy, tire};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Samples a lap buffer must hold before the boundary detector may fire.
const BOUNDARY_MIN_SAMPLES: usize = 50;
/// Radius around the lap's first sample that closes the loop (meters).
const BOUNDARY_RADIUS_M: f64 = 20.0;
/// Laps shorter than this are discarded as noise rather than recorded.
const MIN_LAP_SAMPLES: usize = 10;
/// Recent-lap window used by the tire and performance models.
const HISTORY_WINDOW: usize = 10;
/// Laps shown on the dashboard.
const DASHBOARD_LAPS: usize = 15;

const DEFAULT_RACE_LAPS: u32 = 20;

pub struct RacingEngine {
    /// In-progress lap, arrival order.
    buffer: Vec<Sample>,
    lap_start_time: f64,
    sector_map: SectorMap,
    lap_history: Vec<LapRecord>,
    optimal: OptimalLap,
    /// Corner execution history keyed by ordinal corner index.
    corner_log: BTreeMap<usize, Vec<CornerObservation>>,
    /// Cross-lap brake zones, for brake-point coaching.
    brake_zone_log: Vec<BrakeEvent>,
    tire_history: Vec<TireStatus>,
    performance_history: Vec<PerformanceSnapshot>,
    strategy_log: Vec<StrategyRecord>,
    /// Most recent lap's overtaking zones.
    overtaking: Vec<OvertakingZone>,
    race_total_laps: u32,
    session_start: DateTime<Utc>,
    session_dir: PathBuf,
}

impl RacingEngine {
    pub fn new() -> Self {
        let session_dir = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("laptrace")
            .join("sessions");

        RacingEngine {
            buffer: Vec::new(),
            lap_start_time: 0.0,
            sector_map: SectorMap::new(DEFAULT_SECTORS),
            lap_history: Vec::new(),
            optimal: OptimalLap::new(),
            corner_log: BTreeMap::new(),
            brake_zone_log: Vec::new(),
            tire_history: Vec::new(),
            performance_history: Vec::new(),
            strategy_log: Vec::new(),
            overtaking: Vec::new(),
            race_total_laps: DEFAULT_RACE_LAPS,
            session_start: Utc::now(),
            session_dir,
        }
    }

    /// Override where session snapshots are written.
    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_dir = dir.into();
        self
    }

    // === Ingest ===

    /// Feed one telemetry sample through the pipeline.
    ///
    /// Returns the live per-sample response, or the full lap record and
    /// strategy read-out when this sample closed a lap. A malformed sample
    /// is rejected without touching any state; the stream continues.
    pub fn process_sample(&mut self, sample: Sample) -> Result<IngestOutcome, TelemetryError> {
        if !sample.is_well_formed() {
            return Err(TelemetryError::malformed(format!(
                "lat={} lon={} speed={} timestamp={}",
                sample.lat, sample.lon, sample.speed, sample.timestamp
            )));
        }

        if self.buffer.is_empty() {
            self.lap_start_time = sample.timestamp;
            self.buffer.push(sample);
            return Ok(IngestOutcome::Live(self.live_update()));
        }

        let origin = self.buffer[0];
        let closes_loop = self.buffer.len() >= BOUNDARY_MIN_SAMPLES
            && haversine_distance(origin.lat, origin.lon, sample.lat, sample.lon)
                < BOUNDARY_RADIUS_M;

        if closes_loop {
            let completed = std::mem::take(&mut self.buffer);
            // the triggering sample seeds the next lap
            self.buffer.push(sample);
            self.lap_start_time = sample.timestamp;

            if completed.len() < MIN_LAP_SAMPLES {
                tracing::warn!(samples = completed.len(), "discarding degenerate lap");
                return Ok(IngestOutcome::Live(self.live_update()));
            }

            let (lap_data, race_strategy) = self.finalize_lap(completed);
            return Ok(IngestOutcome::LapCompleted(Box::new(LapCompletion {
                lap_completed: true,
                lap_data,
                race_strategy,
            })));
        }

        self.buffer.push(sample);
        Ok(IngestOutcome::Live(self.live_update()))
    }

    /// Per-sample response between lap boundaries.
    fn live_update(&self) -> LiveUpdate {
        let index = self.buffer.len().saturating_sub(1);
        let current_sector = self.sector_map.sector_of(index);
        let elapsed = self
            .buffer
            .last()
            .map(|s| s.timestamp - self.lap_start_time)
            .unwrap_or(0.0);

        LiveUpdate {
            lap_completed: false,
            delta: predictor::delta_vs_optimal(
                &self.optimal,
                &self.sector_map,
                index,
                current_sector,
                elapsed,
            ),
            current_sector,
            prediction: predictor::forecast(
                &self.lap_history,
                &self.buffer,
                &self.sector_map,
                current_sector,
                &self.optimal,
            ),
            optimal_lap_time: self.optimal.total_time(),
        }
    }

    /// Run the full analysis cascade over a finished lap buffer.
    fn finalize_lap(&mut self, samples: Vec<Sample>) -> (LapRecord, Analysis<StrategyRecord>) {
        let lap_number = self.lap_history.len() as u32 + 1;

        // the first completed lap fixes the sector boundaries for good
        self.sector_map.measure(&samples);

        let sectors = self.partition_sectors(&samples);

        let total_time = samples[samples.len() - 1].timestamp - samples[0].timestamp;
        let speeds: Vec<f64> = samples.iter().map(|s| s.speed).collect();
        let avg_speed = speeds.iter().sum::<f64>() / speeds.len() as f64;
        let max_speed = speeds.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min_speed = speeds.iter().copied().fold(f64::INFINITY, f64::min);

        let smoothed = geo::smooth_speeds(&speeds);
        let corners = events::detect_corners(&samples, &smoothed);
        let corner_analysis =
            events::analyze_corner_performance(&mut self.corner_log, &corners, lap_number);
        let brake_zones = events::detect_brake_zones(&samples);
        let accel_zones = events::detect_accel_zones(&samples);
        let brake_optimization = events::optimize_brake_points(&self.brake_zone_log, &brake_zones);
        let overtaking_zones = events::detect_overtaking_zones(&samples);
        self.overtaking = overtaking_zones.clone();

        // tire and performance windows end with the lap being completed
        let mut pace_window: Vec<(u32, f64)> = self
            .lap_history
            .iter()
            .map(|l| (l.lap_number, l.avg_speed))
            .collect();
        pace_window.push((lap_number, avg_speed));
        let start = pace_window.len().saturating_sub(HISTORY_WINDOW);
        let tire_status = tire::assess(&pace_window[start..], avg_speed);
        if lap_number as usize >= 3 {
            self.tire_history.push(tire_status.clone());
        }

        let mut time_window: Vec<f64> = self.lap_history.iter().map(|l| l.total_time).collect();
        time_window.push(total_time);
        let start = time_window.len().saturating_sub(HISTORY_WINDOW);
        let performance = performance::score(
            &time_window[start..],
            total_time,
            &samples,
            &self.performance_history,
            lap_number,
        );
        if let Some(snapshot) = &performance {
            self.performance_history.push(snapshot.clone());
        }

        let record = LapRecord {
            lap_number,
            total_time,
            avg_speed,
            max_speed,
            min_speed,
            sectors,
            corners,
            corner_analysis,
            brake_zones: brake_zones.clone(),
            accel_zones,
            brake_optimization,
            overtaking_zones,
            tire_status,
            performance,
            timestamp: Utc::now(),
        };

        self.lap_history.push(record.clone());
        self.optimal.update(&record);
        self.brake_zone_log.extend(brake_zones);

        let race_strategy = strategy::advise(
            &self.lap_history,
            lap_number,
            self.race_total_laps,
            self.tire_history.last(),
            self.performance_history.last(),
        );
        if let Analysis::Ready(strategy) = &race_strategy {
            self.strategy_log.push(strategy.clone());
        }

        tracing::info!(
            lap = lap_number,
            total_time,
            avg_speed,
            corners = record.corners.len(),
            "lap completed"
        );

        (record, race_strategy)
    }

    /// Split a lap into per-sector summaries using the fixed index cutoffs.
    /// Sectors that caught fewer than two points are left out.
    fn partition_sectors(&self, samples: &[Sample]) -> BTreeMap<usize, SectorSummary> {
        let mut partitions: BTreeMap<usize, Vec<Sample>> = BTreeMap::new();
        for (i, sample) in samples.iter().enumerate() {
            partitions
                .entry(self.sector_map.sector_of(i))
                .or_default()
                .push(*sample);
        }

        partitions
            .into_iter()
            .filter(|(_, points)| points.len() >= 2)
            .map(|(id, points)| {
                let speeds: Vec<f64> = points.iter().map(|p| p.speed).collect();
                let summary = SectorSummary {
                    time: points[points.len() - 1].timestamp - points[0].timestamp,
                    avg_speed: speeds.iter().sum::<f64>() / speeds.len() as f64,
                    max_speed: speeds.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                    min_speed: speeds.iter().copied().fold(f64::INFINITY, f64::min),
                    points,
                };
                (id, summary)
            })
            .collect()
    }

    // === Queries (never mutate) ===

    pub fn dashboard(&self) -> Dashboard {
        let from = self.lap_history.len().saturating_sub(DASHBOARD_LAPS);
        Dashboard {
            current_position: self.buffer.last().copied(),
            optimal_lap: self.optimal.view(&self.lap_history),
            lap_history: self.lap_history[from..].to_vec(),
            racing_line: self.optimal.racing_line(),
            improvement_zones: self.optimal.improvement_zones(&self.lap_history),
            latest_lap: self.lap_history.last().cloned(),
            tire_status: self.tire_status(),
            performance: self.performance(),
            race_strategy: self.race_strategy(),
            overtaking_zones: self.overtaking.clone(),
            session_stats: self.session_stats(),
        }
    }

    pub fn optimal_lap(&self) -> Analysis<OptimalLapView> {
        self.optimal.view(&self.lap_history)
    }

    pub fn racing_line(&self) -> Vec<GeoPoint> {
        self.optimal.racing_line()
    }

    pub fn improvement_zones(&self) -> Vec<ImprovementZone> {
        self.optimal.improvement_zones(&self.lap_history)
    }

    /// The most recent `limit` laps, oldest first.
    pub fn lap_history(&self, limit: usize) -> Vec<LapRecord> {
        let from = self.lap_history.len().saturating_sub(limit);
        self.lap_history[from..].to_vec()
    }

    pub fn lap_count(&self) -> usize {
        self.lap_history.len()
    }

    /// Samples accumulated in the in-progress lap.
    pub fn current_lap_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn tire_status(&self) -> TireStatus {
        if self.lap_history.len() < 3 {
            return TireStatus::new_tires(self.lap_history.len() as u32);
        }
        self.tire_history
            .last()
            .cloned()
            .unwrap_or_else(|| TireStatus::new_tires(self.lap_history.len() as u32))
    }

    pub fn performance(&self) -> Analysis<PerformanceSnapshot> {
        self.performance_history.last().cloned().into()
    }

    pub fn race_strategy(&self) -> Analysis<StrategyRecord> {
        self.strategy_log.last().cloned().into()
    }

    /// Improvement opportunities found on the latest lap.
    pub fn corner_analysis(&self) -> Vec<CornerImprovement> {
        self.lap_history
            .last()
            .map(|l| l.corner_analysis.clone())
            .unwrap_or_default()
    }

    pub fn overtaking_zones(&self) -> Vec<OvertakingZone> {
        self.overtaking.clone()
    }

    pub fn session_stats(&self) -> Analysis<SessionStats> {
        let Some(best) = self
            .lap_history
            .iter()
            .min_by(|a, b| a.total_time.total_cmp(&b.total_time))
        else {
            return Analysis::pending(DataStatus::NoData);
        };

        let times: Vec<f64> = self.lap_history.iter().map(|l| l.total_time).collect();
        let average_lap_time = times.iter().sum::<f64>() / times.len() as f64;
        let last_5_avg = (times.len() >= 5).then(|| {
            let tail = &times[times.len() - 5..];
            tail.iter().sum::<f64>() / tail.len() as f64
        });

        let slowest = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let fastest = times.iter().copied().fold(f64::INFINITY, f64::min);
        let consistency = if fastest > 0.0 {
            ((1.0 - (slowest - fastest) / fastest) * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        Analysis::Ready(SessionStats {
            total_laps: self.lap_history.len(),
            best_lap: BestLap {
                lap_number: best.lap_number,
                total_time: best.total_time,
                avg_speed: best.avg_speed,
            },
            best_lap_time: best.total_time,
            best_lap_number: best.lap_number,
            average_lap_time,
            last_5_avg,
            consistency,
        })
    }

    // === Control ===

    /// Set the race distance the strategy advisor plans against.
    pub fn set_race_total_laps(&mut self, total: u32) -> Result<(), TelemetryError> {
        if total < 1 {
            return Err(TelemetryError::InvalidRaceLength(total));
        }
        self.race_total_laps = total;
        Ok(())
    }

    pub fn race_total_laps(&self) -> u32 {
        self.race_total_laps
    }

    /// Snapshot the whole session to disk. Returns the snapshot path.
    pub fn save_session(&self, filename: Option<&str>) -> Result<PathBuf, TelemetryError> {
        let best = self
            .lap_history
            .iter()
            .min_by(|a, b| a.total_time.total_cmp(&b.total_time));

        let snapshot = SessionSnapshot {
            lap_history: self.lap_history.clone(),
            optimal_lap: self.optimal.sectors().clone(),
            sector_boundaries: self.sector_map.boundaries().to_vec(),
            corner_data: self.corner_log.clone(),
            brake_zones: self.brake_zone_log.clone(),
            tire_degradation_history: self.tire_history.clone(),
            driver_performance_metrics: self.performance_history.clone(),
            race_strategy_log: self.strategy_log.clone(),
            overtaking_opportunities: self.overtaking.clone(),
            session_metadata: SessionMetadata {
                date: Utc::now(),
                duration_secs: (Utc::now() - self.session_start).num_milliseconds() as f64
                    / 1000.0,
                total_laps: self.lap_history.len(),
                best_lap_time: best.map(|l| l.total_time),
                best_lap_number: best.map(|l| l.lap_number),
            },
        };

        session::save(&snapshot, &self.session_dir, filename)
    }

    /// Restore a saved session, replacing all in-memory state. On failure
    /// the engine is left untouched.
    pub fn load_session(&mut self, path: &Path) -> Result<(), TelemetryError> {
        let snapshot = session::load(path)?;

        self.lap_history = snapshot.lap_history;
        let mut sector_map = SectorMap::new(self.sector_map.num_sectors());
        sector_map.restore(snapshot.sector_boundaries);
        self.sector_map = sector_map;
        self.optimal.restore(snapshot.optimal_lap);
        self.corner_log = snapshot.corner_data;
        self.brake_zone_log = snapshot.brake_zones;
        self.tire_history = snapshot.tire_degradation_history;
        self.performance_history = snapshot.driver_performance_metrics;
        self.strategy_log = snapshot.race_strategy_log;
        self.overtaking = snapshot.overtaking_opportunities;
        self.buffer.clear();
        self.lap_start_time = 0.0;

        Ok(())
    }
}

impl Default for RacingEngine {
    fn default() -> Self {
        Self::new()
    }
}
