//! Application state management

use laptrace_core::model::IngestOutcome;
use laptrace_core::{RacingEngine, SampleSource};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

/// Shared application state
///
/// The engine sits behind a single RwLock: sample ingest takes the write
/// half, queries take the read half, so no sample is ever processed
/// concurrently with a query.
#[derive(Clone)]
pub struct AppState {
    /// The analytics engine; the only mutable state in the process.
    pub engine: Arc<RwLock<RacingEngine>>,

    /// All registered sample sources
    pub sources: Arc<RwLock<Vec<Box<dyn SampleSource>>>>,

    /// Key of the currently active source
    pub active_source: Arc<RwLock<Option<String>>>,

    /// Broadcast channel for ingest outcomes (live deltas and completed
    /// laps); multiple consumers can subscribe.
    pub updates_tx: broadcast::Sender<IngestOutcome>,

    /// Cancellation token for the background feed task
    pub feed_cancel: Arc<RwLock<Option<CancellationToken>>>,
}

impl AppState {
    pub fn new() -> Self {
        // Capacity for a couple of seconds of live updates at 10 Hz
        let (updates_tx, _) = broadcast::channel(64);

        Self {
            engine: Arc::new(RwLock::new(RacingEngine::new())),
            sources: Arc::new(RwLock::new(Vec::new())),
            active_source: Arc::new(RwLock::new(None)),
            updates_tx,
            feed_cancel: Arc::new(RwLock::new(None)),
        }
    }

    /// Build state around a pre-configured engine (custom session dir etc.)
    pub fn with_engine(engine: RacingEngine) -> Self {
        let (updates_tx, _) = broadcast::channel(64);
        Self {
            engine: Arc::new(RwLock::new(engine)),
            sources: Arc::new(RwLock::new(Vec::new())),
            active_source: Arc::new(RwLock::new(None)),
            updates_tx,
            feed_cancel: Arc::new(RwLock::new(None)),
        }
    }

    /// Register a sample source
    pub async fn register_source(&self, source: Box<dyn SampleSource>) {
        let mut sources = self.sources.write().await;
        sources.push(source);
    }

    /// Subscribe to ingest outcomes
    pub fn subscribe(&self) -> broadcast::Receiver<IngestOutcome> {
        self.updates_tx.subscribe()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
