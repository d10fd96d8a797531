//! Transport event handling
//!
//! **Responsibilities:**
//! - React to the media transport (can-play, play, pause, ended, error, ...)
//! - Load-and-play under the auto-play gate
//! - Error path: report, then advance under the error mode when configured
//!
//! Every handler tolerates an empty playlist and repeated delivery.

use chrono::Utc;
use jkmp_common::events::{ErrorReport, PlaybackMode, PlayerEvent, TransportPhase};
use jkmp_common::TrackId;
use rand::Rng;
use tracing::{debug, trace, warn};

use super::core::Player;
use crate::error::Error;
use crate::playback::mode;
use crate::transport::{Transport, TransportEvent};

/// Reported when load-and-play finds nothing loaded
pub const NO_SOURCE_REASON: &str = "Failed to load because no supported source was found.";

impl<T: Transport> Player<T> {
    pub(super) fn on_transport_event(&mut self, event: TransportEvent) {
        trace!(?event, "Transport event");
        match event {
            TransportEvent::Waiting => {
                if self.pointer.current_id.is_some() {
                    self.load_and_play();
                }
            }
            TransportEvent::CanPlay => self.on_can_play(),
            TransportEvent::Error => {
                let report = self
                    .transport
                    .last_error()
                    .unwrap_or_else(|| ErrorReport::synthesized("Media error"));
                self.handle_error(report);
            }
            TransportEvent::Stalled => {
                let report = self
                    .transport
                    .last_error()
                    .unwrap_or_else(|| ErrorReport::synthesized("Media data stalled"));
                self.handle_error(report);
            }
            TransportEvent::Ended => self.on_ended(),
            TransportEvent::Pause => self.on_pause(),
            TransportEvent::Play => self.on_play(),
            TransportEvent::TimeUpdate => self.on_time_update(),
            TransportEvent::VolumeChange => self.on_volume_change(),
            TransportEvent::Abort => self.on_abort(),
            TransportEvent::Progress => self.on_progress(),
            TransportEvent::Seeked => self.on_seeked(),
        }
    }

    /// Start playback if the gate allows, else settle in `Paused`
    ///
    /// With persistence on, the first call after a restore honours the
    /// snapshot's paused flag; later calls always play.
    pub(super) fn load_and_play(&mut self) {
        self.state.phase = TransportPhase::Loading;
        if !self.transport.has_source() {
            self.handle_error(ErrorReport::synthesized(NO_SOURCE_REASON));
            return;
        }

        let should_play = if self.config.remember {
            let restored_paused = !self.gate.remember_primed
                && self.snapshot.as_ref().is_some_and(|s| s.paused);
            !restored_paused
        } else {
            self.gate.is_open(self.config.auto_play)
        };
        self.gate.consume();

        if should_play {
            self.state.phase = TransportPhase::Playing;
            if let Err(report) = self.transport.play() {
                Error::Transport(report.clone()).log("load_and_play");
                self.handle_error(report);
            }
        } else {
            debug!("Auto-play gate closed, staying paused");
            self.state.phase = TransportPhase::Paused;
        }
    }

    fn on_can_play(&mut self) {
        if self.pointer.current_id.is_none() {
            debug!("Ignoring can-play with nothing selected");
            return;
        }
        self.state.phase = TransportPhase::Paused;
        self.refresh_duration();
        if let Some(position) = self.pending_resume.take() {
            debug!(position, "Resuming restored position");
            self.transport.seek(position);
            self.state.current_time = position;
        }
        if self.gate.is_open(self.config.auto_play) {
            self.load_and_play();
        }
    }

    /// Report a failure and, when configured, move on
    ///
    /// A cascade of failures stops once every track has been tried.
    pub(super) fn handle_error(&mut self, report: ErrorReport) {
        self.stop_lyric();
        warn!(error = %report, track = ?self.pointer.current_id, "Playback error");

        if self.now_playing.has_source() {
            self.broadcast(PlayerEvent::Error {
                error: report,
                track_id: self.pointer.current_id.clone(),
                playlist: self.playlist.summaries(),
                info: self.audio_info(),
                timestamp: Utc::now(),
            });
        }

        if !self.config.load_audio_error_play_next || self.playlist.is_empty() {
            return;
        }
        let at_last = matches!(
            self.mode,
            PlaybackMode::Sequential | PlaybackMode::SequentialLoop
        ) && self.current_index().is_some()
            && self.current_index() == self.playlist.last_index();
        if at_last {
            debug!("Failed track is the last one, not advancing");
            return;
        }
        if let Some(id) = self.pointer.current_id.clone() {
            self.failed_ids.insert(id);
        }
        let untried: Vec<TrackId> = self
            .playlist
            .tracks()
            .iter()
            .filter(|t| !self.failed_ids.contains(&t.id))
            .map(|t| t.id.clone())
            .collect();
        if untried.is_empty() {
            warn!(attempts = self.failed_ids.len(), "Every track failed to load, giving up");
            return;
        }

        match mode::for_error(self.mode) {
            // Shuffle only picks among tracks that have not failed yet
            PlaybackMode::Shuffle => {
                let id = untried[self.rng.gen_range(0..untried.len())].clone();
                self.select_track(&id, true);
            }
            error_mode => self.advance(error_mode, true),
        }
    }

    fn on_ended(&mut self) {
        // Left over from the track that was playing before the current load
        if self.state.phase == TransportPhase::Loading {
            debug!(track = ?self.pointer.current_id, "Ignoring ended while loading");
            return;
        }
        self.broadcast(PlayerEvent::Ended {
            track_id: self.pointer.current_id.clone(),
            playlist: self.playlist.summaries(),
            info: self.audio_info(),
            timestamp: Utc::now(),
        });
        if self.playlist.is_empty() {
            return;
        }
        self.advance(self.mode, true);
    }

    fn on_pause(&mut self) {
        if self.pointer.current_id.is_some() {
            self.state.phase = TransportPhase::Paused;
        }
        if let Some(lyric) = self.lyric.as_mut() {
            lyric.pause();
        }
        self.broadcast(PlayerEvent::Pause {
            info: self.audio_info(),
            timestamp: Utc::now(),
        });
    }

    fn on_play(&mut self) {
        self.state.phase = TransportPhase::Playing;
        self.failed_ids.clear();
        if let Some(lyric) = self.lyric.as_mut() {
            lyric.resume();
        }
        self.broadcast(PlayerEvent::Play {
            info: self.audio_info(),
            timestamp: Utc::now(),
        });
    }

    fn on_time_update(&mut self) {
        if self.pointer.current_id.is_none() {
            return;
        }
        let position = self.transport.current_time().max(0.0);
        self.state.current_time = position;
        self.refresh_duration();
        if let Some(lyric) = self.lyric.as_mut() {
            lyric.sync(position);
        }
        if self.config.remember {
            self.save_snapshot();
        }
        self.broadcast(PlayerEvent::Progress {
            info: self.audio_info(),
            timestamp: Utc::now(),
        });
    }

    fn on_volume_change(&mut self) {
        let volume = self.transport.volume().clamp(0.0, 1.0);
        self.state.volume = volume;
        self.broadcast(PlayerEvent::VolumeChanged {
            volume,
            timestamp: Utc::now(),
        });
    }

    fn on_abort(&mut self) {
        self.broadcast(PlayerEvent::Aborted {
            track_id: self.pointer.current_id.clone(),
            playlist: self.playlist.summaries(),
            info: self.audio_info(),
            timestamp: Utc::now(),
        });
        if self.playlist.is_empty() {
            return;
        }
        self.transport.pause();
        if self.gate.initial {
            if let Err(report) = self.transport.play() {
                Error::Transport(report).log("on_abort");
            }
        }
        self.stop_lyric();
    }

    fn on_progress(&mut self) {
        self.refresh_duration();
        let duration = self.state.duration;
        let Some(end) = self.transport.buffered_end() else {
            return;
        };
        if duration <= 0.0 {
            return;
        }
        self.state.buffered_progress = (end / duration * 100.0).clamp(0.0, 100.0);
    }

    fn on_seeked(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        let position = self.transport.current_time().max(0.0);
        self.state.current_time = position;
        if let Some(lyric) = self.lyric.as_mut() {
            lyric.seek(position);
        }
        if self.state.is_playing() {
            self.load_and_play();
        } else {
            self.stop_lyric();
        }
        self.push_position_state();
        self.broadcast(PlayerEvent::Seeked {
            info: self.audio_info(),
            timestamp: Utc::now(),
        });
    }
}
