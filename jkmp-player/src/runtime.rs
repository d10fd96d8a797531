//! Async driver for the orchestrator
//!
//! [`PlayerRuntime`] pulls inputs off the player's queue one at a time and
//! schedules the effects each one leaves behind: deferred follow-ups go back
//! on the queue, timers and source resolutions run as tokio tasks that
//! enqueue their result. Hosts talk to it through a cloneable
//! [`PlayerHandle`].

use jkmp_common::config::PlayerConfig;
use jkmp_common::events::{PlaybackMode, PlayerEvent, Theme};
use jkmp_common::{Track, TrackId};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::playback::events::{Command, Effect, PlayerInput, ReplaceOptions};
use crate::playback::{Collaborators, Player, PlayerInbox};
use crate::session::SessionAction;
use crate::state::PlayerStatus;
use crate::transport::Transport;

/// Owns a [`Player`] and its input queue
pub struct PlayerRuntime<T: Transport> {
    player: Player<T>,
    inbox: PlayerInbox,
    tx: mpsc::UnboundedSender<PlayerInput>,
}

impl<T: Transport + 'static> PlayerRuntime<T> {
    pub fn new(transport: T, config: PlayerConfig, collaborators: Collaborators) -> Self {
        let (player, inbox) = Player::new(transport, config, collaborators);
        let tx = player.input_sender();
        Self { player, inbox, tx }
    }

    pub fn handle(&self) -> PlayerHandle {
        PlayerHandle::new(self.tx.clone())
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.player.subscribe_events()
    }

    pub fn player(&self) -> &Player<T> {
        &self.player
    }

    /// Process inputs until the player is destroyed
    pub async fn run(mut self) {
        info!("Player runtime started");
        self.dispatch_effects();
        while let Some(input) = self.inbox.recv().await {
            self.player.handle(input);
            self.dispatch_effects();
            if self.player.is_destroyed() {
                break;
            }
        }
        info!("Player runtime stopped");
    }

    /// Run on a background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    fn dispatch_effects(&mut self) {
        for effect in self.player.take_effects() {
            match effect {
                Effect::Defer(follow_up) => {
                    let _ = self.tx.send(PlayerInput::FollowUp(follow_up));
                }
                Effect::After(delay, follow_up) => {
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(PlayerInput::FollowUp(follow_up));
                    });
                }
                Effect::Resolve(pending) => {
                    debug!(?pending, "Spawning source resolution");
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let input = pending.run().await;
                        let _ = tx.send(input);
                    });
                }
            }
        }
    }
}

/// Cloneable control surface for a running player
///
/// Every method enqueues a command and returns immediately; outcomes arrive
/// as host events.
#[derive(Clone)]
pub struct PlayerHandle {
    tx: mpsc::UnboundedSender<PlayerInput>,
}

impl PlayerHandle {
    pub fn new(tx: mpsc::UnboundedSender<PlayerInput>) -> Self {
        Self { tx }
    }

    fn send(&self, command: Command) -> bool {
        if self.tx.send(PlayerInput::Command(command)).is_err() {
            warn!("Player is gone, dropping command");
            return false;
        }
        true
    }

    pub fn mount(&self, tracks: Vec<Track>) -> bool {
        self.send(Command::Mount(tracks))
    }

    pub fn destroy(&self) -> bool {
        self.send(Command::Destroy)
    }

    pub fn select_track(&self, id: TrackId) -> bool {
        self.send(Command::SelectTrack(id))
    }

    pub fn update_play_index(&self, index: usize) -> bool {
        self.send(Command::UpdatePlayIndex(index))
    }

    pub fn play_by_index(&self, index: usize) -> bool {
        self.send(Command::PlayByIndex(index))
    }

    pub fn play_next(&self) -> bool {
        self.send(Command::PlayNext)
    }

    pub fn play_prev(&self) -> bool {
        self.send(Command::PlayPrev)
    }

    pub fn toggle_play(&self) -> bool {
        self.send(Command::TogglePlay)
    }

    pub fn reload(&self) -> bool {
        self.send(Command::Reload)
    }

    /// `None` clears the playlist
    pub fn remove(&self, id: Option<TrackId>) -> bool {
        self.send(Command::Remove(id))
    }

    pub fn clear(&self) -> bool {
        self.send(Command::Clear)
    }

    pub fn reorder(&self, from: usize, to: usize) -> bool {
        self.send(Command::Reorder { from, to })
    }

    pub fn append_audio(&self, at: Option<usize>, tracks: Vec<Track>) -> bool {
        self.send(Command::AppendAudio { at, tracks })
    }

    pub fn set_playlist(&self, tracks: Vec<Track>) -> bool {
        self.send(Command::SetPlaylist(tracks))
    }

    pub fn replace_all(&self, tracks: Vec<Track>, options: ReplaceOptions) -> bool {
        self.send(Command::ReplaceAll { tracks, options })
    }

    pub fn set_volume(&self, volume: f64) -> bool {
        self.send(Command::SetVolume(volume))
    }

    pub fn mute(&self) -> bool {
        self.send(Command::Mute)
    }

    pub fn unmute(&self) -> bool {
        self.send(Command::Unmute)
    }

    pub fn reset_volume(&self) -> bool {
        self.send(Command::ResetVolume)
    }

    pub fn cycle_play_mode(&self) -> bool {
        self.send(Command::CyclePlayMode)
    }

    pub fn set_play_mode(&self, mode: PlaybackMode) -> bool {
        self.send(Command::SetPlayMode(mode))
    }

    pub fn seek(&self, position: f64) -> bool {
        self.send(Command::Seek(position))
    }

    pub fn set_theme(&self, theme: Theme) -> bool {
        self.send(Command::SetTheme(theme))
    }

    pub fn session_action(&self, action: SessionAction) -> bool {
        self.send(Command::Session(action))
    }

    /// Snapshot of the player, or `None` once it is destroyed
    pub async fn status(&self) -> Option<PlayerStatus> {
        let (reply, rx) = oneshot::channel();
        if !self.send(Command::Status(reply)) {
            return None;
        }
        rx.await.ok()
    }
}
