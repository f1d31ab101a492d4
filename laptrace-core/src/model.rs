//! Unified data model for the lap analytics engine
//!
//! Defines the sample/lap/event records that flow through the pipeline and
//! the derived analytics products (tire, performance, strategy, prediction).
//!
//! Numerical conventions:
//! - speeds in km/h, times in seconds, distances in meters
//! - latitude/longitude in WGS84 degrees
//! - percentages and scores on a 0-100 scale

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single GPS+speed telemetry sample.
///
/// Timestamps are seconds on a monotonically non-decreasing clock within a
/// lap; the absolute epoch does not matter, only differences do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: f64,
    pub lat: f64,
    pub lon: f64,
    pub speed: f64,
}

impl Sample {
    /// True when every field is a usable number (finite, speed >= 0).
    pub fn is_well_formed(&self) -> bool {
        self.timestamp.is_finite()
            && self.lat.is_finite()
            && self.lon.is_finite()
            && self.speed.is_finite()
            && self.speed >= 0.0
    }
}

/// A bare coordinate, used for racing-line output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

// === Per-lap records ===

/// Timing and speed summary for one sector of a lap, including the raw
/// points that fell into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorSummary {
    pub time: f64,
    pub avg_speed: f64,
    pub max_speed: f64,
    pub min_speed: f64,
    pub points: Vec<Sample>,
}

/// Complete record of one finished lap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    /// 1-based, strictly increasing across the session.
    pub lap_number: u32,
    pub total_time: f64,
    pub avg_speed: f64,
    pub max_speed: f64,
    pub min_speed: f64,
    /// Sector id -> summary. Point ranges are disjoint and ordered; their
    /// union is the lap's sample list.
    pub sectors: BTreeMap<usize, SectorSummary>,
    pub corners: Vec<CornerEvent>,
    pub corner_analysis: Vec<CornerImprovement>,
    pub brake_zones: Vec<BrakeEvent>,
    pub accel_zones: Vec<AccelEvent>,
    pub brake_optimization: Vec<BrakeOptimization>,
    pub overtaking_zones: Vec<OvertakingZone>,
    /// Tire estimate captured at lap completion.
    pub tire_status: TireStatus,
    /// Driver score captured at lap completion; absent until enough laps
    /// exist to compare against.
    pub performance: Option<PerformanceSnapshot>,
    /// Wall-clock completion stamp (informational only).
    pub timestamp: DateTime<Utc>,
}

// === Events ===

/// Corner classes by severity and apex speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CornerKind {
    Hairpin,
    Slow,
    Medium,
    Fast,
}

/// A detected corner: local minimum in the smoothed speed trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornerEvent {
    /// Sample index of the apex within the lap.
    pub index: usize,
    pub lat: f64,
    pub lon: f64,
    pub entry_speed: f64,
    pub apex_speed: f64,
    pub exit_speed: f64,
    pub speed_loss: f64,
    /// Severity percentage 0-100 (speed loss relative to entry speed).
    pub severity: f64,
    pub exit_acceleration: f64,
    #[serde(rename = "type")]
    pub kind: CornerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BrakeIntensity {
    Hard,
    Moderate,
}

/// A braking event between two consecutive samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrakeEvent {
    pub index: usize,
    pub lat: f64,
    pub lon: f64,
    pub speed_before: f64,
    pub speed_after: f64,
    pub deceleration_rate: f64,
    pub intensity: BrakeIntensity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccelZoneKind {
    CornerExit,
    Straight,
}

/// An acceleration event between two consecutive samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccelEvent {
    pub index: usize,
    pub lat: f64,
    pub lon: f64,
    pub speed_before: f64,
    pub speed_after: f64,
    pub acceleration_rate: f64,
    pub zone_type: AccelZoneKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OvertakingKind {
    HighSpeedStraight,
    CornerExit,
}

/// A track location favourable for a pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertakingZone {
    pub index: usize,
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "type")]
    pub kind: OvertakingKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_speed: Option<f64>,
    /// Heuristic confidence 0-1.
    pub confidence: f64,
    pub recommendation: String,
}

/// One lap's execution of a given corner, kept per ordinal corner index so
/// laps can be compared against the historical best.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornerObservation {
    pub lap: u32,
    pub performance_score: f64,
    pub entry_speed: f64,
    pub apex_speed: f64,
    pub exit_speed: f64,
    pub lat: f64,
    pub lon: f64,
}

/// Improvement opportunity for a corner that was driven measurably worse
/// than the historical best at the same ordinal position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornerImprovement {
    /// 1-based ordinal of the corner within the lap.
    pub corner_number: usize,
    /// How far below the best-ever score this lap was, in percent.
    pub improvement_potential: f64,
    pub current_exit: f64,
    pub best_exit: f64,
    pub recommendation: String,
    pub lat: f64,
    pub lon: f64,
}

/// Brake-point coaching derived from comparing a lap's brake zones against
/// the accumulated cross-lap brake history at the same location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrakeOptimization {
    pub lat: f64,
    pub lon: f64,
    pub current_entry: f64,
    pub reference_entry: f64,
    pub brake_earlier: bool,
    pub time_gain_estimate: f64,
    pub recommendation: String,
}

// === Tire model ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TireCondition {
    NewTires,
    Excellent,
    Good,
    Fair,
    Worn,
    Critical,
}

/// Sentinel for "no usable degradation estimate yet".
pub const LAPS_REMAINING_UNKNOWN: u32 = 999;

/// Tire wear estimate from the average-speed regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TireStatus {
    pub lap: u32,
    /// 0-100, anchored at 100 for fresh tires.
    pub grip_level: f64,
    /// km/h lost per lap (absolute regression slope).
    pub degradation_rate: f64,
    pub speed_loss_percent: f64,
    /// Laps until the critical pace threshold, or [`LAPS_REMAINING_UNKNOWN`].
    pub laps_remaining: u32,
    pub pit_recommended: bool,
    pub status: TireCondition,
}

impl TireStatus {
    /// The fresh-tires report used until enough laps exist to regress over.
    pub fn new_tires(lap: u32) -> Self {
        TireStatus {
            lap,
            grip_level: 100.0,
            degradation_rate: 0.0,
            speed_loss_percent: 0.0,
            laps_remaining: LAPS_REMAINING_UNKNOWN,
            pit_recommended: false,
            status: TireCondition::NewTires,
        }
    }
}

// === Driver performance ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "S+")]
    SPlus,
    S,
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    C,
    D,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::SPlus => "S+",
            Rating::S => "S",
            Rating::APlus => "A+",
            Rating::A => "A",
            Rating::BPlus => "B+",
            Rating::B => "B",
            Rating::C => "C",
            Rating::D => "D",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

/// Composite driver score for one lap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub lap: u32,
    pub overall_score: f64,
    pub speed_score: f64,
    pub consistency_score: f64,
    pub smoothness_score: f64,
    pub rating: Rating,
    pub trend: Trend,
}

// === Race strategy ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RacePhase {
    Opening,
    Early,
    Middle,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyMode {
    SettleIn,
    MaintainPace,
    AttackMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdviceCategory {
    Tires,
    Pace,
    Driving,
    Strategy,
    RaceInfo,
}

/// One advisory line from the strategy rule engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub category: AdviceCategory,
    pub icon: String,
    pub message: String,
    pub action: String,
    pub expected_gain: String,
}

/// Full strategy output for one completed lap, advisories ordered
/// high-priority first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecord {
    pub lap: u32,
    pub laps_remaining: i64,
    /// Race progress in percent.
    pub race_progress: f64,
    pub race_phase: RacePhase,
    pub strategy_mode: StrategyMode,
    pub recommendations: Vec<Advisory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_action: Option<Advisory>,
}

// === Optimal lap ===

/// Best observed execution of one sector across the whole session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalSector {
    pub time: f64,
    pub points: Vec<Sample>,
    /// Lap that set this sector time.
    pub lap_number: u32,
    pub avg_speed: f64,
    pub max_speed: f64,
}

/// The composed theoretical-best lap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimalLapView {
    pub optimal_time: f64,
    pub sectors: BTreeMap<usize, OptimalSector>,
    /// Gap between the fastest real lap and the composed optimal;
    /// non-negative, zero only when one lap holds every sector best.
    pub improvement_potential: f64,
}

/// Per-sector time loss of the latest lap against the optimal composition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImprovementZone {
    pub sector: usize,
    pub time_loss: f64,
    pub percentage_loss: f64,
    pub optimal_avg_speed: f64,
    pub current_avg_speed: f64,
    pub speed_deficit: f64,
}

// === Live prediction ===

/// Weighted nearest-neighbour lap-time forecast from partial sector times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapForecast {
    pub predicted_lap_time: f64,
    /// Largest similarity weight; 0-1.
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimal_time: Option<f64>,
}

/// Per-sample response while a lap is in progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveUpdate {
    pub lap_completed: bool,
    /// Signed gap vs the optimal-lap reference at the same sector progress
    /// (positive = ahead of the reference).
    pub delta: f64,
    pub current_sector: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<LapForecast>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimal_lap_time: Option<f64>,
}

/// Response for the sample that closed a lap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapCompletion {
    pub lap_completed: bool,
    pub lap_data: LapRecord,
    pub race_strategy: Analysis<StrategyRecord>,
}

/// Outcome of ingesting one sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IngestOutcome {
    Live(LiveUpdate),
    LapCompleted(Box<LapCompletion>),
}

// === Analytics availability ===

/// Why an analytic has no record yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataStatus {
    NoData,
    InsufficientData,
}

/// An analytic that may not have enough history behind it yet.
///
/// Internally the two cases stay distinct; at the JSON boundary the pending
/// case flattens to `{"status": "..."}` via the untagged representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Analysis<T> {
    Ready(T),
    Pending { status: DataStatus },
}

impl<T> Analysis<T> {
    pub fn pending(status: DataStatus) -> Self {
        Analysis::Pending { status }
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Analysis::Ready(value) => Some(value),
            Analysis::Pending { .. } => None,
        }
    }
}

impl<T> From<Option<T>> for Analysis<T> {
    /// `None` maps to `INSUFFICIENT_DATA`.
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Analysis::Ready(v),
            None => Analysis::pending(DataStatus::InsufficientData),
        }
    }
}

// === Session-level views ===

/// Fastest lap of the session, as a compact reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestLap {
    pub lap_number: u32,
    pub total_time: f64,
    pub avg_speed: f64,
}

/// Aggregate session statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    pub total_laps: usize,
    pub best_lap: BestLap,
    pub best_lap_time: f64,
    pub best_lap_number: u32,
    pub average_lap_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_5_avg: Option<f64>,
    /// 0-100; 100 means every lap took the same time.
    pub consistency: f64,
}

/// Everything a live timing screen needs in one read.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub current_position: Option<Sample>,
    pub optimal_lap: Analysis<OptimalLapView>,
    /// Most recent laps, oldest first (at most 15).
    pub lap_history: Vec<LapRecord>,
    pub racing_line: Vec<GeoPoint>,
    pub improvement_zones: Vec<ImprovementZone>,
    pub latest_lap: Option<LapRecord>,
    pub tire_status: TireStatus,
    pub performance: Analysis<PerformanceSnapshot>,
    pub race_strategy: Analysis<StrategyRecord>,
    pub overtaking_zones: Vec<OvertakingZone>,
    pub session_stats: Analysis<SessionStats>,
}

/// Session metadata stored alongside snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub date: DateTime<Utc>,
    pub duration_secs: f64,
    pub total_laps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_lap_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_lap_number: Option<u32>,
}
