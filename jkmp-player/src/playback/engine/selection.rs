//! Track selection module
//!
//! **Responsibilities:**
//! - Select-by-id (toggle when already current)
//! - Next / previous / reload through the mode policy
//! - Deferred source resolution and stale-result filtering
//! - Play-mode cycling with the transient banner

use chrono::Utc;
use jkmp_common::events::{ErrorReport, PlaybackMode, PlayerEvent, TransportPhase};
use jkmp_common::{MusicSource, TrackId};
use tracing::{debug, info, warn};

use super::core::Player;
use crate::error::{Error, Result};
use crate::playback::events::{Effect, FollowUp, PendingResolution, ResolvePurpose};
use crate::playback::mode::{self, Step};
use crate::state::NowPlaying;
use crate::transport::Transport;

impl<T: Transport> Player<T> {
    /// Index of `id` in a non-empty playlist
    pub(super) fn locate(&self, id: &TrackId) -> Result<usize> {
        if self.playlist.is_empty() {
            return Err(Error::EmptyPlaylist);
        }
        self.playlist
            .index_of(id)
            .ok_or_else(|| Error::TrackNotFound(id.clone()))
    }

    /// Make `id` current, or toggle play/pause when it already is
    ///
    /// `force_restart` reloads even when `id` is current.
    pub(super) fn select_track(&mut self, id: &TrackId, force_restart: bool) {
        if let Err(e) = self.locate(id) {
            e.log("select_track");
            return;
        }
        if self.pointer.is(id) && !force_restart {
            self.toggle_current();
            return;
        }
        self.request_load(id, ResolvePurpose::Select);
    }

    fn toggle_current(&mut self) {
        if self.state.is_playing() {
            self.state.phase = TransportPhase::Paused;
            self.transport.pause();
        } else {
            self.state.phase = TransportPhase::Playing;
            if let Err(report) = self.transport.play() {
                Error::Transport(report.clone()).log("toggle_current");
                self.handle_error(report);
            }
        }
    }

    /// Start loading `id`, resolving its source first when deferred
    ///
    /// Each request supersedes every earlier one still in flight.
    pub(super) fn request_load(&mut self, id: &TrackId, purpose: ResolvePurpose) {
        self.generation += 1;
        let Some(source) = self.playlist.find(id).map(|t| t.music_src.clone()) else {
            Error::TrackNotFound(id.clone()).log("request_load");
            return;
        };
        match source {
            MusicSource::Direct(url) => self.on_source_ready(id, &url, purpose),
            MusicSource::Deferred(resolver) => {
                debug!(track = %id, generation = self.generation, "Resolving deferred source");
                self.effects.push(Effect::Resolve(PendingResolution {
                    generation: self.generation,
                    track_id: id.clone(),
                    purpose,
                    resolver,
                }));
            }
        }
    }

    pub(super) fn on_resolved(
        &mut self,
        generation: u64,
        track_id: TrackId,
        purpose: ResolvePurpose,
        result: std::result::Result<String, String>,
    ) {
        if generation != self.generation {
            debug!(
                track = %track_id,
                generation,
                current = self.generation,
                "Discarding stale source resolution"
            );
            return;
        }
        match result {
            Ok(url) => self.on_source_ready(&track_id, &url, purpose),
            Err(reason) => {
                let err = Error::Resolution(reason);
                err.log("resolve_source");
                self.handle_error(ErrorReport::synthesized(err.to_string()));
            }
        }
    }

    fn on_source_ready(&mut self, id: &TrackId, url: &str, purpose: ResolvePurpose) {
        match purpose {
            ResolvePurpose::Select => self.commit_selection(id, url),
            ResolvePurpose::Initial => {
                self.commit_load(id, url);
            }
        }
    }

    /// Point at `id`, reset transport state and hand the source to the
    /// transport. Returns false when nothing was loaded.
    pub(super) fn commit_load(&mut self, id: &TrackId, url: &str) -> bool {
        let Some(track) = self.playlist.find(id).cloned() else {
            Error::TrackNotFound(id.clone()).log("commit_load");
            return false;
        };
        self.stop_lyric();
        self.pointer.current_id = Some(id.clone());
        self.now_playing = NowPlaying::from_track(&track, url);
        self.state.begin_load(track.duration);
        self.current_lyric = None;

        debug!(track = %id, url, "Loading source");
        if let Err(report) = self.transport.load(url) {
            Error::Transport(report.clone()).log("commit_load");
            self.handle_error(report);
            return false;
        }
        self.push_session_metadata();
        self.effects.push(Effect::Defer(FollowUp::InitLyric {
            generation: self.generation,
        }));
        true
    }

    fn commit_selection(&mut self, id: &TrackId, url: &str) {
        self.pending_resume = None;
        self.gate.arm_user_click();
        if !self.commit_load(id, url) {
            return;
        }
        info!(track = %id, name = %self.now_playing.name, "Track changed");
        self.broadcast(PlayerEvent::TrackChanged {
            track_id: id.clone(),
            info: self.audio_info(),
            timestamp: Utc::now(),
        });
        if let Some(index) = self.current_index() {
            self.broadcast(PlayerEvent::IndexChanged {
                index,
                timestamp: Utc::now(),
            });
        }
    }

    /// Apply the mode policy in one direction
    pub(super) fn advance(&mut self, mode: PlaybackMode, is_next: bool) {
        if self.playlist.is_empty() {
            Error::EmptyPlaylist.log("advance");
            return;
        }
        let current = self.current_index();
        let step = mode::resolve(mode, is_next, current, self.playlist.len(), &mut self.rng);
        debug!(%mode, is_next, ?current, ?step, "Advance");

        match step {
            Step::Play(index) => {
                let Some(id) = self.playlist.id_at(index).cloned() else {
                    return;
                };
                // Shuffle over one track lands on the current id
                if self.pointer.is(&id) {
                    self.restart_current();
                } else {
                    self.select_track(&id, true);
                }
            }
            Step::Restart => self.restart_current(),
            Step::Halt => {
                debug!("Reached the end of the playlist");
                self.transport.pause();
            }
            Step::Stay => warn!(%mode, is_next, "No track in that direction"),
        }
    }

    fn restart_current(&mut self) {
        let Some(id) = self.pointer.current_id.clone() else {
            return;
        };
        self.transport.seek(0.0);
        self.state.current_time = 0.0;
        self.select_track(&id, true);
    }

    pub(super) fn play_next(&mut self) {
        self.skip(true);
    }

    pub(super) fn play_prev(&mut self) {
        self.skip(false);
    }

    fn skip(&mut self, is_next: bool) {
        if self.playlist.is_empty() {
            Error::EmptyPlaylist.log(if is_next { "play_next" } else { "play_prev" });
            return;
        }
        self.advance(mode::for_skip(self.mode), is_next);
    }

    /// Play/pause from the host's control
    pub(super) fn toggle_play(&mut self) {
        if self.playlist.is_empty() {
            Error::EmptyPlaylist.log("toggle_play");
            return;
        }
        if self.state.is_playing() {
            self.transport.pause();
            return;
        }
        self.gate.arm_user_click();
        self.load_and_play();
    }

    /// Restart the current track from the beginning
    pub(super) fn reload(&mut self) {
        if self.playlist.is_empty() {
            Error::EmptyPlaylist.log("reload");
            return;
        }
        self.advance(PlaybackMode::SingleLoop, true);
        self.broadcast(PlayerEvent::Reloaded {
            info: self.audio_info(),
            timestamp: Utc::now(),
        });
    }

    /// Select by index, clamped into range; no-op when already current
    pub(super) fn update_play_index(&mut self, index: usize) {
        let Some(index) = self.playlist.clamp_index(index) else {
            Error::EmptyPlaylist.log("update_play_index");
            return;
        };
        if self.current_index() == Some(index) {
            return;
        }
        if let Some(id) = self.playlist.id_at(index).cloned() {
            self.select_track(&id, true);
        }
    }

    /// Next mode in the cycle; shows the banner for `play_mode_show_time_ms`
    pub(super) fn cycle_play_mode(&mut self) {
        self.mode = self.mode.next();
        self.banner_visible = true;
        self.banner_token += 1;
        self.effects.push(Effect::After(
            self.config.play_mode_show_time(),
            FollowUp::HideModeBanner {
                token: self.banner_token,
            },
        ));
        info!(mode = %self.mode, "Play mode changed");
        self.broadcast(PlayerEvent::ModeChanged {
            mode: self.mode,
            timestamp: Utc::now(),
        });
    }

    pub(super) fn set_play_mode(&mut self, mode: PlaybackMode) {
        if mode != self.mode {
            debug!(from = %self.mode, to = %mode, "Play mode set");
            self.mode = mode;
        }
    }
}
