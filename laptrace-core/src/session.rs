//! Session persistence
//!
//! Snapshots the whole engine state to a timestamped file pair: a
//! MessagePack payload (named-field encoding, so it round-trips through the
//! same serde model as the JSON boundary) plus a JSON sidecar for casual
//! inspection. Loading reads either format, picked by extension.

use crate::error::TelemetryError;
use crate::model::{
    BrakeEvent, CornerObservation, LapRecord, OptimalSector, OvertakingZone,
    PerformanceSnapshot, SessionMetadata, StrategyRecord, TireStatus,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Everything needed to restore an engine mid-session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub lap_history: Vec<LapRecord>,
    pub optimal_lap: BTreeMap<usize, OptimalSector>,
    pub sector_boundaries: Vec<usize>,
    pub corner_data: BTreeMap<usize, Vec<CornerObservation>>,
    pub brake_zones: Vec<BrakeEvent>,
    pub tire_degradation_history: Vec<TireStatus>,
    pub driver_performance_metrics: Vec<PerformanceSnapshot>,
    pub race_strategy_log: Vec<StrategyRecord>,
    pub overtaking_opportunities: Vec<OvertakingZone>,
    pub session_metadata: SessionMetadata,
}

/// Write a snapshot into `dir`, deriving a timestamped filename when none is
/// given. Returns the path of the binary payload.
pub fn save(
    snapshot: &SessionSnapshot,
    dir: &Path,
    filename: Option<&str>,
) -> Result<PathBuf, TelemetryError> {
    std::fs::create_dir_all(dir)?;

    let filename = match filename {
        Some(name) => name.to_string(),
        None => format!(
            "racing_session_{}.mpk",
            Utc::now().format("%Y%m%d_%H%M%S")
        ),
    };
    let path = dir.join(filename);

    let mut writer = BufWriter::new(File::create(&path)?);
    rmp_serde::encode::write_named(&mut writer, snapshot)?;
    writer.flush()?;

    let sidecar = path.with_extension("json");
    let mut writer = BufWriter::new(File::create(&sidecar)?);
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.flush()?;

    tracing::info!(path = %path.display(), laps = snapshot.lap_history.len(), "session saved");
    Ok(path)
}

/// Read a snapshot back from disk.
pub fn load(path: &Path) -> Result<SessionSnapshot, TelemetryError> {
    let reader = BufReader::new(File::open(path)?);

    let snapshot = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_reader(reader)?
    } else {
        rmp_serde::decode::from_read(reader)?
    };

    tracing::info!(path = %path.display(), "session loaded");
    Ok(snapshot)
}
