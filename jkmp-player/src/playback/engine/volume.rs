//! Volume, seeking and media-session actions

use jkmp_common::events::ErrorReport;
use tracing::{debug, warn};

use super::core::Player;
use crate::error::Error;
use crate::session::SessionAction;
use crate::transport::Transport;

impl<T: Transport> Player<T> {
    pub(super) fn set_volume(&mut self, volume: f64) {
        if !volume.is_finite() {
            Error::Configuration(format!("volume must be finite, got {}", volume))
                .log("set_volume");
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        self.apply_volume(volume);
        if volume > 0.0 {
            self.state.remembered_volume = volume;
        }
    }

    fn apply_volume(&mut self, volume: f64) {
        self.state.volume = volume;
        self.transport.set_volume(volume);
    }

    pub(super) fn mute(&mut self) {
        if self.state.volume > 0.0 {
            self.state.remembered_volume = self.state.volume;
        }
        self.apply_volume(0.0);
    }

    /// Back to the last non-zero volume
    pub(super) fn unmute(&mut self) {
        let volume = self.state.restore_volume();
        self.apply_volume(volume);
    }

    /// Seek within the loaded track, clamped to its duration
    pub(super) fn seek(&mut self, position: f64) {
        if self.pointer.current_id.is_none() || !self.transport.has_source() {
            warn!(position, "Nothing loaded to seek in");
            return;
        }
        if !position.is_finite() {
            Error::Transport(ErrorReport::synthesized(format!(
                "invalid seek position {}",
                position
            )))
            .log("seek");
            return;
        }
        let end = if self.state.duration > 0.0 {
            self.state.duration
        } else {
            f64::MAX
        };
        self.transport.seek(position.clamp(0.0, end));
    }

    pub(super) fn on_session_action(&mut self, action: SessionAction) {
        debug!(?action, "Media session action");
        match action {
            SessionAction::Play | SessionAction::Pause => self.toggle_play(),
            SessionAction::SeekBackward(offset) => {
                let step = offset.unwrap_or(self.config.seek_step_secs);
                let target = (self.transport.current_time() - step).max(0.0);
                self.seek(target);
            }
            SessionAction::SeekForward(offset) => {
                let step = offset.unwrap_or(self.config.seek_step_secs);
                let target = self.transport.current_time() + step;
                self.seek(target);
            }
            SessionAction::SeekTo(position) => self.seek(position),
            SessionAction::PreviousTrack => self.play_prev(),
            SessionAction::NextTrack => self.play_next(),
        }
    }
}
