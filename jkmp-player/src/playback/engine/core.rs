//! Orchestrator lifecycle and state
//!
//! **Responsibilities:**
//! - Construction: attach transport, subscribe theme observer and media session,
//!   read the stored snapshot, apply the initial volume
//! - Input dispatch (one input runs to completion)
//! - Host event projection (`AudioInfo`, `PlayerStatus`)
//! - Lyric timeline replacement, media-session pushes, theme tracking
//! - Teardown (`destroy` and `Drop`)

use chrono::Utc;
use jkmp_common::config::PlayerConfig;
use jkmp_common::events::{AudioInfo, EventBus, PlaybackMode, PlayerEvent, Theme, TrackSummary};
use jkmp_common::{Track, TrackId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, trace, warn};

use crate::lyrics::{LrcTimelineFactory, LyricSink, LyricTimeline, LyricTimelineFactory};
use crate::persistence::{read_snapshot, write_snapshot, PlaybackSnapshot, SnapshotStore};
use crate::playback::events::{Command, Effect, FollowUp, PlayerInput, ResolvePurpose};
use crate::playback::playlist::Playlist;
use crate::session::{
    MediaSession, PositionState, SessionActions, SessionMetadata, ThemeObserver, ThemeSink,
};
use crate::state::{AutoPlayGate, NowPlaying, PlaybackPointer, PlayerStatus, TransportState};
use crate::transport::{Transport, TransportEvents};

/// Host event buffer per subscriber
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Receiving end of the player's input queue
pub type PlayerInbox = mpsc::UnboundedReceiver<PlayerInput>;

/// Optional capabilities injected at construction
#[derive(Default)]
pub struct Collaborators {
    pub store: Option<Arc<dyn SnapshotStore>>,
    /// Only installed when `show_media_session` is configured
    pub session: Option<Box<dyn MediaSession>>,
    pub theme_observer: Option<Box<dyn ThemeObserver>>,
    /// Defaults to [`LrcTimelineFactory`]
    pub lyric_factory: Option<Box<dyn LyricTimelineFactory>>,
    /// Share an existing bus instead of creating one
    pub event_bus: Option<EventBus>,
}

/// Playback orchestrator
///
/// Owns the playlist, the current-track pointer, transport state, volume
/// and mode policy. Every state change goes through [`Player::handle`];
/// follow-up work is collected as [`Effect`]s for the caller to schedule.
pub struct Player<T: Transport> {
    pub(super) transport: T,
    pub(super) config: PlayerConfig,
    pub(super) playlist: Playlist,
    pub(super) pointer: PlaybackPointer,
    pub(super) state: TransportState,
    pub(super) now_playing: NowPlaying,
    pub(super) mode: PlaybackMode,
    /// Configured theme, possibly `Auto`
    pub(super) theme: Theme,
    pub(super) system_dark: bool,
    pub(super) gate: AutoPlayGate,
    /// Bumped per load request; stale continuations carry an older value
    pub(super) generation: u64,
    pub(super) banner_visible: bool,
    pub(super) banner_token: u64,
    /// Tracks that failed since the last successful play or user selection
    pub(super) failed_ids: HashSet<TrackId>,
    /// Position restored from the snapshot, applied at the next can-play
    pub(super) pending_resume: Option<f64>,
    pub(super) snapshot: Option<PlaybackSnapshot>,
    pub(super) lyric: Option<Box<dyn LyricTimeline>>,
    pub(super) current_lyric: Option<String>,
    pub(super) lyric_factory: Box<dyn LyricTimelineFactory>,
    pub(super) store: Option<Arc<dyn SnapshotStore>>,
    pub(super) session: Option<Box<dyn MediaSession>>,
    pub(super) theme_observer: Option<Box<dyn ThemeObserver>>,
    pub(super) rng: StdRng,
    pub(super) events: EventBus,
    pub(super) input_tx: mpsc::UnboundedSender<PlayerInput>,
    pub(super) effects: Vec<Effect>,
    pub(super) destroyed: bool,
}

impl<T: Transport> Player<T> {
    /// Create the orchestrator and its input queue
    ///
    /// The transport is attached here and detached by [`Player::destroy`] or
    /// on drop.
    pub fn new(
        mut transport: T,
        config: PlayerConfig,
        collaborators: Collaborators,
    ) -> (Self, PlayerInbox) {
        let config = config.normalized();
        let (input_tx, inbox) = mpsc::unbounded_channel();

        transport.attach(TransportEvents::new(input_tx.clone()));

        let Collaborators {
            store,
            session,
            theme_observer,
            lyric_factory,
            event_bus,
        } = collaborators;

        let mut theme_observer = theme_observer;
        let system_dark = theme_observer
            .as_ref()
            .map(|observer| observer.prefers_dark())
            .unwrap_or(true);
        if let Some(observer) = theme_observer.as_mut() {
            observer.subscribe(ThemeSink::new(input_tx.clone()));
        }

        let session = match session {
            Some(mut session) if config.show_media_session => {
                session.install(SessionActions::new(input_tx.clone()));
                Some(session)
            }
            Some(_) => {
                debug!("Media session supplied but show_media_session is off");
                None
            }
            None => None,
        };

        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut player = Self {
            transport,
            playlist: Playlist::new(),
            pointer: PlaybackPointer::default(),
            state: TransportState::new(config.default_volume),
            now_playing: NowPlaying::default(),
            mode: config.initial_play_mode(),
            theme: config.theme,
            system_dark,
            gate: AutoPlayGate::new(config.auto_play),
            generation: 0,
            banner_visible: false,
            banner_token: 0,
            failed_ids: HashSet::new(),
            pending_resume: None,
            snapshot: None,
            lyric: None,
            current_lyric: None,
            lyric_factory: lyric_factory.unwrap_or_else(|| Box::new(LrcTimelineFactory)),
            store,
            session,
            theme_observer,
            rng,
            events: event_bus.unwrap_or_else(|| EventBus::new(EVENT_CHANNEL_CAPACITY)),
            input_tx,
            effects: Vec::new(),
            destroyed: false,
            config,
        };

        if player.config.remember {
            player.snapshot = player.read_stored_snapshot();
            player.apply_snapshot_settings();
        }
        let volume = player.state.volume;
        player.transport.set_volume(volume);

        info!(
            mode = %player.mode,
            volume,
            remember = player.config.remember,
            auto_play = player.config.auto_play,
            "Player created"
        );
        (player, inbox)
    }

    /// Ingest the initial playlist and load its head track
    ///
    /// With persistence on, the stored current track (if still listed) and
    /// its position win over `default_play_index`.
    pub fn mount(&mut self, tracks: Vec<Track>) {
        if tracks.is_empty() {
            debug!("Mounted with an empty playlist");
            return;
        }
        self.playlist = Playlist::from_tracks(tracks);
        let head = self.choose_head(self.config.remember, self.config.default_play_index);
        info!(tracks = self.playlist.len(), head = ?head, "Player mounted");
        if let Some(id) = head {
            self.request_load(&id, ResolvePurpose::Initial);
        }
    }

    /// Process one input to completion
    pub fn handle(&mut self, input: PlayerInput) {
        if self.destroyed {
            debug!(?input, "Player destroyed, ignoring input");
            return;
        }
        match input {
            PlayerInput::Command(command) => self.handle_command(command),
            PlayerInput::Transport(event) => self.on_transport_event(event),
            PlayerInput::Resolved {
                generation,
                track_id,
                purpose,
                result,
            } => self.on_resolved(generation, track_id, purpose, result),
            PlayerInput::FollowUp(follow_up) => self.on_follow_up(follow_up),
            PlayerInput::LyricLine {
                generation,
                line,
                text,
            } => self.on_lyric_line(generation, line, text),
            PlayerInput::SystemTheme { dark } => self.on_system_theme(dark),
        }
    }

    fn handle_command(&mut self, command: Command) {
        trace!(?command, "Command");
        if matches!(
            command,
            Command::SelectTrack(_)
                | Command::UpdatePlayIndex(_)
                | Command::PlayByIndex(_)
                | Command::PlayNext
                | Command::PlayPrev
                | Command::TogglePlay
                | Command::Reload
                | Command::Session(_)
        ) {
            self.failed_ids.clear();
        }
        match command {
            Command::Mount(tracks) => self.mount(tracks),
            Command::Destroy => self.destroy(),
            Command::SelectTrack(id) => self.select_track(&id, false),
            Command::UpdatePlayIndex(index) | Command::PlayByIndex(index) => {
                self.update_play_index(index)
            }
            Command::PlayNext => self.play_next(),
            Command::PlayPrev => self.play_prev(),
            Command::TogglePlay => self.toggle_play(),
            Command::Reload => self.reload(),
            Command::Remove(id) => self.remove(id),
            Command::Clear => self.clear(),
            Command::Reorder { from, to } => self.reorder(from, to),
            Command::AppendAudio { at, tracks } => self.append_audio(at, tracks),
            Command::SetPlaylist(tracks) => self.set_playlist(tracks),
            Command::ReplaceAll { tracks, options } => self.replace_all(tracks, options),
            Command::SetVolume(volume) => self.set_volume(volume),
            Command::Mute => self.mute(),
            Command::Unmute | Command::ResetVolume => self.unmute(),
            Command::CyclePlayMode => self.cycle_play_mode(),
            Command::SetPlayMode(mode) => self.set_play_mode(mode),
            Command::Seek(position) => self.seek(position),
            Command::SetTheme(theme) => self.set_theme(theme),
            Command::Session(action) => self.on_session_action(action),
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn on_follow_up(&mut self, follow_up: FollowUp) {
        match follow_up {
            FollowUp::InitLyric { generation } => self.init_lyric(generation),
            FollowUp::HideModeBanner { token } => {
                if token == self.banner_token {
                    self.banner_visible = false;
                }
            }
            FollowUp::FinishRemoval { track_id } => self.finish_removal(&track_id),
        }
    }

    /// Drain the follow-ups produced by the inputs handled so far
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Tear down: detach the transport, drop platform hooks, stop lyrics
    ///
    /// Emits `Destroyed` once; the player ignores every later input.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.transport.detach();
        self.release_platform_hooks();
        if let Some(mut lyric) = self.lyric.take() {
            lyric.stop();
        }
        self.broadcast(PlayerEvent::Destroyed {
            track_id: self.pointer.current_id.clone(),
            playlist: self.playlist.summaries(),
            info: self.audio_info(),
            timestamp: Utc::now(),
        });
        self.destroyed = true;
        self.effects.clear();
        info!("Player destroyed");
    }

    fn release_platform_hooks(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.uninstall();
        }
        if let Some(observer) = self.theme_observer.as_mut() {
            observer.unsubscribe();
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to host events
    pub fn subscribe_events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Another handle onto the input queue
    pub fn input_sender(&self) -> mpsc::UnboundedSender<PlayerInput> {
        self.input_tx.clone()
    }

    pub fn status(&self) -> PlayerStatus {
        PlayerStatus {
            current_id: self.pointer.current_id.clone(),
            current_index: self.current_index(),
            name: self.now_playing.name.clone(),
            phase: self.state.phase,
            current_time: self.state.current_time,
            duration: self.state.duration,
            buffered_progress: self.state.buffered_progress,
            volume: self.state.volume,
            mode: self.mode,
            theme: self.effective_theme(),
            mode_banner_visible: self.banner_visible,
            current_lyric: self.current_lyric.clone(),
            playlist: self.playlist.summaries(),
            destroyed: self.destroyed,
        }
    }

    // ========================================
    // Projections
    // ========================================

    pub(super) fn current_index(&self) -> Option<usize> {
        self.pointer.current_index(&self.playlist)
    }

    pub(super) fn current_track(&self) -> Option<&Track> {
        self.pointer
            .current_id
            .as_ref()
            .and_then(|id| self.playlist.find(id))
    }

    pub(super) fn audio_info(&self) -> AudioInfo {
        AudioInfo {
            track: self.current_track().map(Track::summary),
            name: self.now_playing.name.clone(),
            singer: self.now_playing.singer.clone(),
            cover: self.now_playing.cover.clone(),
            music_src: self.now_playing.music_src.clone(),
            volume: self.state.volume,
            current_time: self.state.current_time,
            duration: self.state.duration,
            paused: !self.state.is_playing(),
            phase: self.state.phase,
            lyric: self.now_playing.lyric.clone(),
            current_lyric: self.current_lyric.clone(),
            play_index: self.current_index(),
        }
    }

    pub(super) fn broadcast(&self, event: PlayerEvent) {
        trace!(event = event.event_type(), "Host event");
        self.events.emit_lossy(event);
    }

    pub(super) fn emit_lists_changed(&self, playlist: Vec<TrackSummary>) {
        self.broadcast(PlayerEvent::ListsChanged {
            track_id: self.pointer.current_id.clone(),
            playlist,
            info: self.audio_info(),
            timestamp: Utc::now(),
        });
    }

    /// Declared duration wins; otherwise whatever the transport reports
    pub(super) fn refresh_duration(&mut self) {
        let declared = self.current_track().and_then(|t| t.duration);
        self.state.duration = declared
            .or_else(|| self.transport.duration())
            .filter(|d| d.is_finite())
            .unwrap_or(0.0)
            .max(0.0);
    }

    // ========================================
    // Lyrics
    // ========================================

    pub(super) fn stop_lyric(&mut self) {
        if let Some(lyric) = self.lyric.as_mut() {
            lyric.stop();
        }
    }

    /// Replace the timeline with one for the track loaded under `generation`
    fn init_lyric(&mut self, generation: u64) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Skipping stale lyric init");
            return;
        }
        if let Some(mut old) = self.lyric.take() {
            old.stop();
        }
        let sink = LyricSink::new(self.input_tx.clone(), generation);
        let mut timeline = self.lyric_factory.create(&self.now_playing.lyric, sink);
        self.current_lyric = timeline.first_line();
        if self.state.is_playing() {
            timeline.start();
        }
        self.lyric = Some(timeline);
    }

    fn on_lyric_line(&mut self, generation: u64, line: usize, text: String) {
        if generation != self.generation {
            trace!(generation, line, "Dropping line change from replaced timeline");
            return;
        }
        self.current_lyric = Some(text.clone());
        self.broadcast(PlayerEvent::LyricLineChanged {
            line,
            text,
            timestamp: Utc::now(),
        });
    }

    // ========================================
    // Media session
    // ========================================

    fn position_state(&self) -> PositionState {
        PositionState {
            duration: self.state.duration,
            position: self.state.current_time,
            playback_rate: 1.0,
        }
    }

    pub(super) fn push_session_metadata(&mut self) {
        let metadata = SessionMetadata::new(
            &self.now_playing.name,
            &self.now_playing.singer,
            &self.now_playing.cover,
        );
        let position = self.position_state();
        if let Some(session) = self.session.as_mut() {
            session.set_metadata(&metadata);
            session.set_position_state(position);
        }
    }

    pub(super) fn push_position_state(&mut self) {
        let position = self.position_state();
        if let Some(session) = self.session.as_mut() {
            session.set_position_state(position);
        }
    }

    // ========================================
    // Theme
    // ========================================

    /// Light or dark; `Auto` follows the system preference
    pub fn effective_theme(&self) -> Theme {
        match self.theme {
            Theme::Auto if self.system_dark => Theme::Dark,
            Theme::Auto => Theme::Light,
            theme => theme,
        }
    }

    pub(super) fn set_theme(&mut self, theme: Theme) {
        let before = self.effective_theme();
        self.theme = theme;
        self.announce_theme_change(before);
    }

    fn on_system_theme(&mut self, dark: bool) {
        let before = self.effective_theme();
        self.system_dark = dark;
        self.announce_theme_change(before);
    }

    fn announce_theme_change(&self, before: Theme) {
        let after = self.effective_theme();
        if after != before {
            debug!(%before, %after, "Theme changed");
            self.broadcast(PlayerEvent::ThemeChanged {
                theme: after,
                timestamp: Utc::now(),
            });
        }
    }

    // ========================================
    // Persistence
    // ========================================

    pub(super) fn read_stored_snapshot(&self) -> Option<PlaybackSnapshot> {
        self.store.as_deref().and_then(|store| read_snapshot(store))
    }

    /// Mode, theme and volume from the stored snapshot
    pub(super) fn apply_snapshot_settings(&mut self) {
        let Some(snapshot) = self.snapshot.clone() else {
            return;
        };
        debug!(
            mode = %snapshot.playback_mode,
            theme = %snapshot.theme,
            volume = snapshot.volume,
            "Restoring play status"
        );
        self.mode = snapshot.playback_mode;
        self.theme = snapshot.theme;
        self.state.volume = snapshot.volume;
        if snapshot.volume > 0.0 {
            self.state.remembered_volume = snapshot.volume;
        }
    }

    /// Pick the track a new playlist starts on
    ///
    /// `remember` prefers the snapshot's track when it is still listed,
    /// arming its position for resume.
    pub(super) fn choose_head(&mut self, remember: bool, play_index: usize) -> Option<TrackId> {
        if remember {
            if let Some(snapshot) = &self.snapshot {
                if let Some(id) = snapshot
                    .current_id
                    .as_ref()
                    .filter(|id| self.playlist.index_of(id).is_some())
                {
                    if snapshot.current_time > 0.0 {
                        self.pending_resume = Some(snapshot.current_time);
                    }
                    return Some(id.clone());
                }
            }
        }
        let index = self.playlist.clamp_index(play_index)?;
        self.playlist.id_at(index).cloned()
    }

    pub(super) fn save_snapshot(&self) {
        let Some(store) = self.store.as_deref() else {
            return;
        };
        let snapshot = PlaybackSnapshot {
            current_time: self.state.current_time,
            current_id: self.pointer.current_id.clone(),
            theme: self.theme,
            playback_mode: self.mode,
            volume: self.state.volume,
            name: self.now_playing.name.clone(),
            cover: self.now_playing.cover.clone(),
            singer: self.now_playing.singer.clone(),
            music_src: self.now_playing.music_src.clone(),
            paused: !self.state.is_playing(),
        };
        if let Err(e) = write_snapshot(store, &snapshot) {
            warn!(error = %e, "Failed to save play status");
        }
    }
}

impl<T: Transport> Drop for Player<T> {
    fn drop(&mut self) {
        if !self.destroyed {
            self.transport.detach();
            self.release_platform_hooks();
        }
    }
}
