//! Error types for the analytics engine
//!
//! Ingest rejects individual bad samples without disturbing the stream;
//! analytics degrade to status sentinels instead of erroring; only session
//! I/O surfaces real failures to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A sample with a non-finite or out-of-domain field. The engine state
    /// is untouched; the stream continues with the next sample.
    #[error("malformed sample: {reason}")]
    MalformedSample { reason: String },

    /// Race length must be at least one lap.
    #[error("invalid race length: {0} laps")]
    InvalidRaceLength(u32),

    #[error("session io: {0}")]
    SessionIo(#[from] std::io::Error),

    #[error("session encode: {0}")]
    SessionEncode(#[from] rmp_serde::encode::Error),

    #[error("session decode: {0}")]
    SessionDecode(#[from] rmp_serde::decode::Error),

    #[error("session json: {0}")]
    SessionJson(#[from] serde_json::Error),
}

impl TelemetryError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        TelemetryError::MalformedSample {
            reason: reason.into(),
        }
    }
}
