//! Event types for the JKMP player
//!
//! Provides the host event definitions and the EventBus that carries them.

mod playback_types;
mod shared_types;

pub use playback_types::{PlaybackMode, Theme, TransportPhase};
pub use shared_types::{AudioInfo, ErrorReport, TrackSummary};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::TrackId;

/// Host-facing player events
///
/// Each is emitted at most once per input the player handles, and serializes
/// to JSON tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// A different track was selected and its source loaded
    TrackChanged {
        track_id: TrackId,
        info: AudioInfo,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Index of the current track changed
    IndexChanged {
        index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    Play {
        info: AudioInfo,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    Pause {
        info: AudioInfo,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Current track reached its end
    Ended {
        track_id: Option<TrackId>,
        playlist: Vec<TrackSummary>,
        info: AudioInfo,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Load or playback failure
    ///
    /// Only emitted while a source is loaded.
    Error {
        error: ErrorReport,
        track_id: Option<TrackId>,
        playlist: Vec<TrackSummary>,
        info: AudioInfo,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Position tick
    Progress {
        info: AudioInfo,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    VolumeChanged {
        volume: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    Seeked {
        info: AudioInfo,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playlist contents changed (append, remove, reorder, replace)
    ListsChanged {
        track_id: Option<TrackId>,
        playlist: Vec<TrackSummary>,
        info: AudioInfo,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    ModeChanged {
        mode: PlaybackMode,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    Reordered {
        from_index: usize,
        to_index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Player torn down; no further events follow
    Destroyed {
        track_id: Option<TrackId>,
        playlist: Vec<TrackSummary>,
        info: AudioInfo,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    LyricLineChanged {
        line: usize,
        text: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Transport aborted the current load
    Aborted {
        track_id: Option<TrackId>,
        playlist: Vec<TrackSummary>,
        info: AudioInfo,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    ThemeChanged {
        theme: Theme,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Current track restarted from the beginning
    Reloaded {
        info: AudioInfo,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlayerEvent {
    /// Event name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::TrackChanged { .. } => "TrackChanged",
            PlayerEvent::IndexChanged { .. } => "IndexChanged",
            PlayerEvent::Play { .. } => "Play",
            PlayerEvent::Pause { .. } => "Pause",
            PlayerEvent::Ended { .. } => "Ended",
            PlayerEvent::Error { .. } => "Error",
            PlayerEvent::Progress { .. } => "Progress",
            PlayerEvent::VolumeChanged { .. } => "VolumeChanged",
            PlayerEvent::Seeked { .. } => "Seeked",
            PlayerEvent::ListsChanged { .. } => "ListsChanged",
            PlayerEvent::ModeChanged { .. } => "ModeChanged",
            PlayerEvent::Reordered { .. } => "Reordered",
            PlayerEvent::Destroyed { .. } => "Destroyed",
            PlayerEvent::LyricLineChanged { .. } => "LyricLineChanged",
            PlayerEvent::Aborted { .. } => "Aborted",
            PlayerEvent::ThemeChanged { .. } => "ThemeChanged",
            PlayerEvent::Reloaded { .. } => "Reloaded",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Distribution bus for host events
///
/// Wraps a tokio broadcast channel: publishing never blocks, and slow
/// subscribers observe `Lagged` rather than stalling the player.
///
/// # Examples
///
/// ```
/// use jkmp_common::events::{EventBus, PlayerEvent, PlaybackMode};
///
/// let bus = EventBus::new(100);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(PlayerEvent::ModeChanged {
///     mode: PlaybackMode::Shuffle,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(PlayerEvent::ModeChanged { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlayerEvent,
    ) -> Result<usize, broadcast::error::SendError<PlayerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
