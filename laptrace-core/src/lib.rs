//! LapTrace Core Library
//!
//! This crate provides the streaming lap analytics engine: lap-boundary
//! detection over a GPS+speed sample stream, sector decomposition, event
//! extraction, tire/performance/strategy analytics, live prediction and
//! session persistence.

pub mod engine;
pub mod error;
pub mod events;
pub mod geo;
pub mod model;
pub mod optimal;
pub mod performance;
pub mod predictor;
pub mod sectors;
pub mod session;
pub mod source;
pub mod strategy;
pub mod tire;

pub use engine::RacingEngine;
pub use error::TelemetryError;
pub use model::{IngestOutcome, LapRecord, Sample};
pub use source::SampleSource;
