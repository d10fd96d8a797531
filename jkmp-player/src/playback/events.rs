//! Internal player inputs and follow-up effects (not exposed to hosts)
//!
//! Everything that can change player state arrives as a [`PlayerInput`] on
//! one queue and runs to completion. Work a handler cannot finish inline is
//! returned as an [`Effect`] for the runtime to schedule. Host-facing events
//! are `jkmp_common::events::PlayerEvent`.

use jkmp_common::config::PlayerConfig;
use jkmp_common::events::{PlaybackMode, Theme};
use jkmp_common::{SourceResolver, Track, TrackId};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::session::SessionAction;
use crate::state::PlayerStatus;
use crate::transport::TransportEvent;

/// One unit of work for the orchestrator queue
#[derive(Debug)]
pub enum PlayerInput {
    /// Host or user intent
    Command(Command),

    /// Lifecycle event from the media transport
    Transport(TransportEvent),

    /// A deferred music source finished resolving
    Resolved {
        generation: u64,
        track_id: TrackId,
        purpose: ResolvePurpose,
        result: std::result::Result<String, String>,
    },

    /// Scheduled continuation (next tick or timer)
    FollowUp(FollowUp),

    /// The lyric timeline moved to another line
    LyricLine {
        generation: u64,
        line: usize,
        text: String,
    },

    /// System dark-theme preference changed
    SystemTheme { dark: bool },
}

/// Imperative control surface
#[derive(Debug)]
pub enum Command {
    /// Ingest the initial playlist and load its head track
    Mount(Vec<Track>),
    Destroy,
    SelectTrack(TrackId),
    UpdatePlayIndex(usize),
    PlayByIndex(usize),
    PlayNext,
    PlayPrev,
    TogglePlay,
    Reload,
    /// `None` removes everything
    Remove(Option<TrackId>),
    Clear,
    Reorder { from: usize, to: usize },
    /// `at == None` is rejected
    AppendAudio { at: Option<usize>, tracks: Vec<Track> },
    /// Host supplied a new playlist; replace or merge per configuration
    SetPlaylist(Vec<Track>),
    ReplaceAll { tracks: Vec<Track>, options: ReplaceOptions },
    SetVolume(f64),
    Mute,
    Unmute,
    ResetVolume,
    CyclePlayMode,
    SetPlayMode(PlaybackMode),
    Seek(f64),
    SetTheme(Theme),
    /// Action from the platform media session
    Session(SessionAction),
    Status(oneshot::Sender<PlayerStatus>),
}

/// How `replace_all` seeds the new playlist
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceOptions {
    /// Restore mode, theme, volume and position from the stored snapshot
    pub remember: bool,
    pub play_mode: Option<PlaybackMode>,
    pub theme: Option<Theme>,
    pub play_index: usize,
    /// Open the auto-play gate for the new list
    pub auto_play_initial: bool,
}

impl ReplaceOptions {
    pub fn from_config(config: &PlayerConfig) -> Self {
        Self {
            remember: config.remember,
            play_mode: config.play_mode,
            theme: Some(config.theme),
            play_index: config.default_play_index,
            auto_play_initial: config.auto_play,
        }
    }
}

/// Continuations scheduled by handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    /// Build the lyric timeline for the track loaded under `generation`
    InitLyric { generation: u64 },
    /// Clear the mode banner unless a newer cycle re-armed it
    HideModeBanner { token: u64 },
    /// Removal animation window elapsed
    FinishRemoval { track_id: TrackId },
}

/// Why a deferred source is being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvePurpose {
    /// User or policy selection: full track change with host events
    Select,
    /// Head track of a newly mounted or replaced playlist
    Initial,
}

/// Deferred source resolution handed to the runtime
pub struct PendingResolution {
    pub generation: u64,
    pub track_id: TrackId,
    pub purpose: ResolvePurpose,
    pub resolver: Arc<dyn SourceResolver>,
}

impl PendingResolution {
    /// Await the resolver and package the outcome as a queue input
    pub async fn run(self) -> PlayerInput {
        let result = self.resolver.resolve().await;
        PlayerInput::Resolved {
            generation: self.generation,
            track_id: self.track_id,
            purpose: self.purpose,
            result,
        }
    }
}

impl fmt::Debug for PendingResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResolution")
            .field("generation", &self.generation)
            .field("track_id", &self.track_id)
            .field("purpose", &self.purpose)
            .finish_non_exhaustive()
    }
}

/// Work a handler could not finish inline
#[derive(Debug)]
pub enum Effect {
    /// Run on the next tick, behind inputs already queued
    Defer(FollowUp),
    /// Run once the delay elapses
    After(Duration, FollowUp),
    /// Resolve a deferred source off the queue
    Resolve(PendingResolution),
}

#[cfg(test)]
mod tests {
    use super::*;
    use jkmp_common::MusicSource;

    #[tokio::test]
    async fn test_pending_resolution_carries_generation() {
        let source = MusicSource::deferred(|| async { Ok::<_, String>("mem://late".to_string()) });
        let MusicSource::Deferred(resolver) = source else {
            panic!("expected deferred source");
        };
        let pending = PendingResolution {
            generation: 9,
            track_id: TrackId::from("late"),
            purpose: ResolvePurpose::Select,
            resolver,
        };
        assert!(format!("{:?}", pending).contains("generation: 9"));

        match pending.run().await {
            PlayerInput::Resolved { generation, track_id, result, .. } => {
                assert_eq!(generation, 9);
                assert_eq!(track_id.as_str(), "late");
                assert_eq!(result.unwrap(), "mem://late");
            }
            other => panic!("unexpected input: {:?}", other),
        }
    }

    #[test]
    fn test_replace_options_from_config() {
        let config = PlayerConfig {
            default_play_index: 2,
            auto_play: false,
            ..Default::default()
        };
        let options = ReplaceOptions::from_config(&config);
        assert_eq!(options.play_index, 2);
        assert!(!options.auto_play_initial);
        assert_eq!(options.theme, Some(Theme::Dark));
    }
}
