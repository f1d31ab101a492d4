//! Sample source trait definition

use crate::model::Sample;
use anyhow::Result;

/// Trait for telemetry sample sources
///
/// Each source is responsible for:
/// - Detecting whether its data feed is available
/// - Producing GPS+speed samples in arrival order
/// - Owning whatever connection or file handle backs the feed
pub trait SampleSource: Send + Sync {
    /// Stable key used to select this source (e.g. "demo", "replay")
    fn key(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Check whether the feed is available
    ///
    /// This should be a lightweight check (e.g. file existence); it is
    /// polled while the source is idle.
    fn detect(&self) -> bool;

    /// Start producing samples. Initialize any connections or resources.
    fn start(&mut self) -> Result<()>;

    /// Stop producing samples and release resources.
    fn stop(&mut self) -> Result<()>;

    /// Read the next sample
    ///
    /// Returns:
    /// - `Ok(Some(sample))` if a new sample is available
    /// - `Ok(None)` if no new data (non-blocking) or the feed is exhausted
    /// - `Err(_)` if an error occurred
    fn next_sample(&mut self) -> Result<Option<Sample>>;

    /// Whether the source is currently producing samples
    fn is_active(&self) -> bool;
}
