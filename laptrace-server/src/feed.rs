//! Sample feed lifecycle manager
//!
//! This module handles:
//! - Polling sources for feed availability
//! - Starting/stopping sources as feeds appear/disappear
//! - Pulling samples from the active source into the engine
//! - Broadcasting ingest outcomes to subscribers

use crate::state::AppState;
use anyhow::Result;
use laptrace_adapters::{DemoCircuit, ReplaySource};
use laptrace_core::TelemetryError;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const DETECTION_INTERVAL: Duration = Duration::from_secs(1);
/// Matches the 10 Hz cadence the demo circuit simulates.
const SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Main feed loop. Respects the cancellation token stored in state so
/// tests and shutdown can stop it.
pub async fn run(state: AppState) {
    // Register sources: an NDJSON replay when configured, the demo circuit
    // always (as a fallback feed).
    if let Ok(path) = std::env::var("LAPTRACE_REPLAY") {
        match ReplaySource::open(&path) {
            Ok(replay) => {
                info!(path = %path, samples = replay.len(), "replay source registered");
                state.register_source(Box::new(replay)).await;
            }
            Err(e) => error!("Failed to open replay {}: {:#}", path, e),
        }
    }
    state.register_source(Box::new(DemoCircuit::new())).await;

    let cancel = CancellationToken::new();
    {
        let mut slot = state.feed_cancel.write().await;
        *slot = Some(cancel.clone());
    }

    info!("Sample feed started");
    let mut last_detection: Option<Instant> = None;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        if last_detection.map_or(true, |t| t.elapsed() >= DETECTION_INTERVAL) {
            last_detection = Some(Instant::now());
            if let Err(e) = detection_cycle(&state).await {
                error!("Error in detection cycle: {}", e);
            }
        }

        if let Err(e) = ingest_cycle(&state).await {
            error!("Error ingesting sample: {}", e);
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(SAMPLE_INTERVAL) => {}
        }
    }

    info!("Sample feed stopped");
}

/// Check the active source is still live and activate the first detected
/// source when none is.
async fn detection_cycle(state: &AppState) -> Result<()> {
    let mut sources = state.sources.write().await;
    let mut active_source = state.active_source.write().await;

    if let Some(ref active_key) = *active_source {
        if let Some(source) = sources.iter_mut().find(|s| s.key() == active_key) {
            if !source.is_active() {
                info!("Source {} went inactive, releasing", source.name());
                if let Err(e) = source.stop() {
                    error!("Error stopping source {}: {}", source.name(), e);
                }
                *active_source = None;
            }
            return Ok(());
        }
    }

    for source in sources.iter_mut() {
        if source.detect() && !source.is_active() {
            info!("Feed {} detected, starting source", source.name());
            match source.start() {
                Ok(()) => {
                    *active_source = Some(source.key().to_string());
                    info!("Source {} started successfully", source.name());
                    break;
                }
                Err(e) => {
                    error!("Failed to start source {}: {}", source.name(), e);
                }
            }
        }
    }

    Ok(())
}

/// Pull one sample from the active source and run it through the engine.
async fn ingest_cycle(state: &AppState) -> Result<()> {
    let active_key = {
        let active = state.active_source.read().await;
        active.clone()
    };

    let Some(active_key) = active_key else {
        return Ok(());
    };

    let sample = {
        let mut sources = state.sources.write().await;
        match sources.iter_mut().find(|s| s.key() == active_key) {
            Some(source) => source.next_sample()?,
            None => None,
        }
    };

    let Some(sample) = sample else {
        return Ok(());
    };

    let outcome = {
        let mut engine = state.engine.write().await;
        engine.process_sample(sample)
    };

    match outcome {
        Ok(outcome) => {
            // Ignore error if no receivers (they'll get the next update)
            let _ = state.updates_tx.send(outcome);
        }
        Err(e @ TelemetryError::MalformedSample { .. }) => {
            // A single bad sample never stops the stream
            warn!("Dropped sample from {}: {}", active_key, e);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
