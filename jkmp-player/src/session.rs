//! Platform integration: media session and system theme
//!
//! Both are injected capabilities. Handlers they call back into are
//! delivered as inputs on the player queue, never invoked directly.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;

use crate::playback::events::{Command, PlayerInput};

/// Artwork sizes advertised with session metadata
pub const ARTWORK_SIZES: [&str; 6] = [
    "96x96", "128x128", "192x192", "256x256", "384x384", "512x512",
];

/// Control requested through the platform media session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionAction {
    Play,
    Pause,
    /// Offset in seconds; `None` uses the configured step
    SeekBackward(Option<f64>),
    SeekForward(Option<f64>),
    /// Absolute position in seconds
    SeekTo(f64),
    PreviousTrack,
    NextTrack,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artwork {
    pub src: String,
    pub sizes: String,
    pub mime_type: String,
}

/// Now-playing metadata pushed on every track load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub artwork: Vec<Artwork>,
}

impl SessionMetadata {
    /// Album falls back to the track name; no cover means no artwork
    pub fn new(name: &str, singer: &str, cover: &str) -> Self {
        let artwork = if cover.is_empty() {
            Vec::new()
        } else {
            ARTWORK_SIZES
                .iter()
                .map(|size| Artwork {
                    src: cover.to_string(),
                    sizes: size.to_string(),
                    mime_type: "image/png".to_string(),
                })
                .collect()
        };
        Self {
            title: name.to_string(),
            artist: singer.to_string(),
            album: name.to_string(),
            artwork,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionState {
    pub duration: f64,
    pub position: f64,
    pub playback_rate: f64,
}

/// Delivers session actions to the player queue
#[derive(Debug, Clone)]
pub struct SessionActions {
    tx: mpsc::UnboundedSender<PlayerInput>,
}

impl SessionActions {
    pub fn new(tx: mpsc::UnboundedSender<PlayerInput>) -> Self {
        Self { tx }
    }

    pub fn dispatch(&self, action: SessionAction) {
        let _ = self.tx.send(PlayerInput::Command(Command::Session(action)));
    }
}

/// Platform media session (lock screen, media keys)
pub trait MediaSession: Send {
    /// Register action handlers
    fn install(&mut self, actions: SessionActions);

    /// Drop action handlers
    fn uninstall(&mut self);

    fn set_metadata(&mut self, metadata: &SessionMetadata);

    fn set_position_state(&mut self, state: PositionState);
}

/// Media session that only logs; for headless hosts
#[derive(Debug, Default)]
pub struct LoggingSession {
    actions: Option<SessionActions>,
}

impl LoggingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the platform invoking a handler
    pub fn trigger(&self, action: SessionAction) {
        if let Some(actions) = &self.actions {
            actions.dispatch(action);
        }
    }
}

impl MediaSession for LoggingSession {
    fn install(&mut self, actions: SessionActions) {
        self.actions = Some(actions);
        info!("Media session handlers installed");
    }

    fn uninstall(&mut self) {
        self.actions = None;
        info!("Media session handlers removed");
    }

    fn set_metadata(&mut self, metadata: &SessionMetadata) {
        info!(title = %metadata.title, artist = %metadata.artist, "Now playing");
    }

    fn set_position_state(&mut self, state: PositionState) {
        tracing::debug!(
            position = state.position,
            duration = state.duration,
            "Media session position"
        );
    }
}

/// Delivers system theme changes to the player queue
#[derive(Debug, Clone)]
pub struct ThemeSink {
    tx: mpsc::UnboundedSender<PlayerInput>,
}

impl ThemeSink {
    pub fn new(tx: mpsc::UnboundedSender<PlayerInput>) -> Self {
        Self { tx }
    }

    pub fn notify(&self, dark: bool) {
        let _ = self.tx.send(PlayerInput::SystemTheme { dark });
    }
}

/// System dark-theme preference (media query)
pub trait ThemeObserver: Send {
    fn prefers_dark(&self) -> bool;

    fn subscribe(&mut self, sink: ThemeSink);

    fn unsubscribe(&mut self);
}

/// Preference that never changes
#[derive(Debug, Clone, Copy)]
pub struct StaticThemeObserver {
    dark: bool,
}

impl StaticThemeObserver {
    pub fn new(dark: bool) -> Self {
        Self { dark }
    }
}

impl ThemeObserver for StaticThemeObserver {
    fn prefers_dark(&self) -> bool {
        self.dark
    }

    fn subscribe(&mut self, _sink: ThemeSink) {}

    fn unsubscribe(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_artwork() {
        let meta = SessionMetadata::new("Song", "Singer", "http://img.test/c.png");
        assert_eq!(meta.album, "Song");
        assert_eq!(meta.artwork.len(), ARTWORK_SIZES.len());
        assert_eq!(meta.artwork[0].sizes, "96x96");

        assert!(SessionMetadata::new("Song", "Singer", "").artwork.is_empty());
    }

    #[test]
    fn test_logging_session_routes_actions_to_queue() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = LoggingSession::new();
        session.trigger(SessionAction::NextTrack);
        assert!(rx.try_recv().is_err());

        session.install(SessionActions::new(tx));
        session.trigger(SessionAction::SeekBackward(None));
        match rx.try_recv().unwrap() {
            PlayerInput::Command(Command::Session(SessionAction::SeekBackward(None))) => {}
            other => panic!("unexpected input: {:?}", other),
        }

        session.uninstall();
        session.trigger(SessionAction::Play);
        assert!(rx.try_recv().is_err());
    }
}
