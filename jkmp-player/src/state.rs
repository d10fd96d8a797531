//! Playback state owned by the orchestrator
//!
//! Plain data: the orchestrator is the only writer, so none of this needs
//! locking.

use jkmp_common::events::{PlaybackMode, Theme, TrackSummary, TransportPhase};
use jkmp_common::{Track, TrackId};
use serde::Serialize;

use crate::playback::playlist::Playlist;

/// Fallback when restoring from mute with nothing remembered
pub const FALLBACK_VOLUME: f64 = 0.1;

/// Media transport state as seen by the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct TransportState {
    pub phase: TransportPhase,
    /// Seconds
    pub current_time: f64,
    /// Seconds, 0 until known
    pub duration: f64,
    /// Percent of the track buffered, 0..=100
    pub buffered_progress: f64,
    /// 0..=1
    pub volume: f64,
    /// Last non-zero volume, restored by unmute
    pub remembered_volume: f64,
}

impl TransportState {
    pub fn new(volume: f64) -> Self {
        let volume = volume.clamp(0.0, 1.0);
        Self {
            phase: TransportPhase::Idle,
            current_time: 0.0,
            duration: 0.0,
            buffered_progress: 0.0,
            volume,
            remembered_volume: volume,
        }
    }

    /// Back to idle defaults; volume settings survive
    pub fn reset(&mut self) {
        *self = Self {
            volume: self.volume,
            remembered_volume: self.remembered_volume,
            ..Self::new(0.0)
        };
    }

    /// Prepare for a freshly loaded source
    pub fn begin_load(&mut self, declared_duration: Option<f64>) {
        self.phase = TransportPhase::Loading;
        self.current_time = 0.0;
        self.buffered_progress = 0.0;
        self.duration = declared_duration.unwrap_or(0.0).max(0.0);
    }

    pub fn is_playing(&self) -> bool {
        self.phase == TransportPhase::Playing
    }

    /// Volume unmute restores to; never 0
    pub fn restore_volume(&self) -> f64 {
        if self.remembered_volume > 0.0 {
            self.remembered_volume
        } else {
            FALLBACK_VOLUME
        }
    }
}

/// Reference to the current track
///
/// Only the id is stored; the index is always derived against the live
/// playlist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackPointer {
    pub current_id: Option<TrackId>,
}

impl PlaybackPointer {
    pub fn current_index(&self, playlist: &Playlist) -> Option<usize> {
        self.current_id.as_ref().and_then(|id| playlist.index_of(id))
    }

    pub fn is(&self, id: &TrackId) -> bool {
        self.current_id.as_ref() == Some(id)
    }

    pub fn clear(&mut self) {
        self.current_id = None;
    }
}

/// Decides whether a playable source starts on its own
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoPlayGate {
    /// Set by the first load-and-play, or forced by the host
    pub initial: bool,
    /// Armed by an explicit user selection or play toggle
    pub user_click: bool,
    /// Set once the restored snapshot's paused flag has been honoured
    pub remember_primed: bool,
}

impl AutoPlayGate {
    pub fn new(auto_play: bool) -> Self {
        Self {
            initial: auto_play,
            ..Default::default()
        }
    }

    pub fn is_open(&self, global_auto_play: bool) -> bool {
        self.initial || global_auto_play || self.user_click
    }

    pub fn arm_user_click(&mut self) {
        self.user_click = true;
    }

    /// Called at the end of every load-and-play
    pub fn consume(&mut self) {
        self.initial = true;
        self.remember_primed = true;
        self.user_click = false;
    }
}

/// Metadata of the loaded track, with its resolved source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NowPlaying {
    pub name: String,
    pub singer: String,
    pub cover: String,
    pub music_src: String,
    pub lyric: String,
}

impl NowPlaying {
    pub fn from_track(track: &Track, resolved_src: &str) -> Self {
        Self {
            name: track.name.clone(),
            singer: track.singer.clone(),
            cover: track.cover.clone(),
            music_src: resolved_src.to_string(),
            lyric: track.lyric.clone(),
        }
    }

    pub fn has_source(&self) -> bool {
        !self.music_src.is_empty()
    }
}

/// Point-in-time view of the player for hosts and the CLI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStatus {
    pub current_id: Option<TrackId>,
    pub current_index: Option<usize>,
    pub name: String,
    pub phase: TransportPhase,
    pub current_time: f64,
    pub duration: f64,
    pub buffered_progress: f64,
    pub volume: f64,
    pub mode: PlaybackMode,
    /// Effective theme, never `Auto`
    pub theme: Theme,
    pub mode_banner_visible: bool,
    pub current_lyric: Option<String>,
    pub playlist: Vec<TrackSummary>,
    pub destroyed: bool,
}
