//! Shared type definitions for event data

use serde::{Deserialize, Serialize};

use super::playback_types::TransportPhase;
use crate::TrackId;

/// Serializable projection of a track
///
/// Deferred sources appear with an empty `music_src`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub id: TrackId,
    pub name: String,
    pub singer: String,
    pub cover: String,
    pub music_src: String,
    pub duration: Option<f64>,
}

/// Snapshot of the player handed to host events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Current track, if any
    pub track: Option<TrackSummary>,
    pub name: String,
    pub singer: String,
    pub cover: String,
    /// Resolved URL of the loaded source
    pub music_src: String,
    pub volume: f64,
    /// Position in seconds
    pub current_time: f64,
    /// Duration in seconds, 0 until known
    pub duration: f64,
    pub paused: bool,
    pub phase: TransportPhase,
    pub lyric: String,
    pub current_lyric: Option<String>,
    pub play_index: Option<usize>,
}

/// Error surfaced to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Native media error code when the transport reported one
    pub code: Option<u16>,
    pub message: String,
}

impl ErrorReport {
    pub fn new(code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Error synthesized by the player itself, without a native code
    pub fn synthesized(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}
