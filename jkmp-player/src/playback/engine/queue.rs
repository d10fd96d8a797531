//! Playlist mutation module
//!
//! **Responsibilities:**
//! - Remove (delayed, with a prospective lists-changed), clear
//! - Reorder, append, replace-all, merge
//! - Reset to idle when the playlist empties

use chrono::Utc;
use jkmp_common::events::{AudioInfo, PlaybackMode, PlayerEvent};
use jkmp_common::{Track, TrackId};
use tracing::{debug, info};

use super::core::Player;
use crate::error::Error;
use crate::playback::events::{Effect, FollowUp, ReplaceOptions, ResolvePurpose};
use crate::state::NowPlaying;
use crate::transport::Transport;

impl<T: Transport> Player<T> {
    /// Remove one track, or clear everything when `id` is `None`
    ///
    /// Hosts are told the resulting list right away; the removal itself runs
    /// after `removal_delay_ms`.
    pub(super) fn remove(&mut self, id: Option<TrackId>) {
        if self.playlist.is_empty() {
            Error::EmptyPlaylist.log("remove");
            return;
        }
        let Some(id) = id else {
            self.clear();
            return;
        };
        if self.playlist.index_of(&id).is_none() {
            Error::TrackNotFound(id).log("remove");
            return;
        }
        if self.pointer.is(&id) {
            self.stop_lyric();
        }
        self.emit_lists_changed(self.playlist.summaries_without(&id));
        debug!(track = %id, delay_ms = self.config.removal_delay_ms, "Scheduling removal");
        self.effects.push(Effect::After(
            self.config.removal_delay(),
            FollowUp::FinishRemoval { track_id: id },
        ));
    }

    pub(super) fn finish_removal(&mut self, id: &TrackId) {
        let Some((index, track)) = self.playlist.remove(id) else {
            debug!(track = %id, "Track already gone before removal ran");
            return;
        };
        info!(track = %id, name = %track.name, "Removed track");

        if self.playlist.is_empty() {
            self.reset_to_idle();
            return;
        }
        if self.pointer.is(id) {
            let next = if index < self.playlist.len() { index } else { 0 };
            if let Some(next_id) = self.playlist.id_at(next).cloned() {
                self.select_track(&next_id, true);
            }
        }
    }

    pub(super) fn clear(&mut self) {
        self.broadcast(PlayerEvent::ListsChanged {
            track_id: None,
            playlist: Vec::new(),
            info: AudioInfo::default(),
            timestamp: Utc::now(),
        });
        self.reset_to_idle();
        info!("Playlist cleared");
    }

    /// Stop the transport and forget the playlist and current track
    pub(super) fn reset_to_idle(&mut self) {
        self.transport.pause();
        if let Some(mut lyric) = self.lyric.take() {
            lyric.stop();
        }
        self.playlist.clear();
        self.pointer.clear();
        self.state.reset();
        self.now_playing = NowPlaying::default();
        self.current_lyric = None;
        self.pending_resume = None;
        self.failed_ids.clear();
        self.generation += 1;
        debug!("Player reset to idle");
    }

    pub(super) fn reorder(&mut self, from: usize, to: usize) {
        if let Err(e) = self.playlist.move_item(from, to) {
            e.log("reorder");
            return;
        }
        debug!(from, to, "Reordered playlist");
        self.broadcast(PlayerEvent::Reordered {
            from_index: from,
            to_index: to,
            timestamp: Utc::now(),
        });
        self.emit_lists_changed(self.playlist.summaries());
    }

    pub(super) fn append_audio(&mut self, at: Option<usize>, tracks: Vec<Track>) {
        let Some(at) = at else {
            Error::Configuration("append_audio needs an insertion index".to_string())
                .log("append_audio");
            return;
        };
        let count = tracks.len();
        let at = self.playlist.insert_at(at, tracks);
        debug!(count, at, "Appended tracks");
        self.emit_lists_changed(self.playlist.summaries());
    }

    /// New playlist, replacing or merging per `clear_prior_audio_lists`
    pub(super) fn set_playlist(&mut self, tracks: Vec<Track>) {
        if self.config.clear_prior_audio_lists {
            let options = ReplaceOptions::from_config(&self.config);
            self.replace_all(tracks, options);
        } else {
            self.merge(tracks);
        }
    }

    pub(super) fn replace_all(&mut self, tracks: Vec<Track>, options: ReplaceOptions) {
        self.reset_to_idle();
        if tracks.is_empty() {
            self.emit_lists_changed(Vec::new());
            return;
        }
        self.playlist.replace(tracks);

        let head = if options.remember {
            self.snapshot = self.read_stored_snapshot();
            self.apply_snapshot_settings();
            let volume = self.state.volume;
            self.transport.set_volume(volume);
            self.choose_head(true, options.play_index)
        } else {
            self.mode = options.play_mode.unwrap_or(PlaybackMode::Sequential);
            if let Some(theme) = options.theme {
                self.set_theme(theme);
            }
            self.choose_head(false, options.play_index)
        };
        self.gate.initial = options.auto_play_initial;

        info!(tracks = self.playlist.len(), head = ?head, mode = %self.mode, "Playlist replaced");
        if let Some(id) = head {
            self.request_load(&id, ResolvePurpose::Initial);
        }
        self.emit_lists_changed(self.playlist.summaries());
    }

    /// Append tracks not already present, loading the head if nothing is
    pub(super) fn merge(&mut self, tracks: Vec<Track>) {
        let added = self.playlist.merge(tracks);
        debug!(added, total = self.playlist.len(), "Merged tracks");
        if self.pointer.current_id.is_none() {
            if let Some(id) = self.choose_head(false, self.config.default_play_index) {
                self.request_load(&id, ResolvePurpose::Initial);
            }
        }
        self.emit_lists_changed(self.playlist.summaries());
    }
}
