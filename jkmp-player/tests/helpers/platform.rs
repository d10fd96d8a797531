//! Media session and theme observer doubles

use std::sync::{Arc, Mutex};

use jkmp_player::session::{
    MediaSession, PositionState, SessionAction, SessionActions, SessionMetadata, ThemeObserver,
    ThemeSink,
};

#[derive(Debug, Default)]
pub struct SessionLog {
    pub installed: bool,
    pub uninstalled: bool,
    pub metadata: Vec<SessionMetadata>,
    pub positions: Vec<PositionState>,
    pub actions: Option<SessionActions>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSession {
    pub log: Arc<Mutex<SessionLog>>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke a handler the way the platform would
    pub fn trigger(&self, action: SessionAction) {
        if let Some(actions) = &self.log.lock().unwrap().actions {
            actions.dispatch(action);
        }
    }

    pub fn titles(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .metadata
            .iter()
            .map(|m| m.title.clone())
            .collect()
    }
}

impl MediaSession for RecordingSession {
    fn install(&mut self, actions: SessionActions) {
        let mut log = self.log.lock().unwrap();
        log.installed = true;
        log.actions = Some(actions);
    }

    fn uninstall(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.uninstalled = true;
        log.actions = None;
    }

    fn set_metadata(&mut self, metadata: &SessionMetadata) {
        self.log.lock().unwrap().metadata.push(metadata.clone());
    }

    fn set_position_state(&mut self, state: PositionState) {
        self.log.lock().unwrap().positions.push(state);
    }
}

/// System theme preference the test flips by hand
#[derive(Debug, Clone)]
pub struct ManualThemeObserver {
    dark: bool,
    pub sink: Arc<Mutex<Option<ThemeSink>>>,
}

impl ManualThemeObserver {
    pub fn new(dark: bool) -> Self {
        Self {
            dark,
            sink: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set_dark(&self, dark: bool) {
        if let Some(sink) = self.sink.lock().unwrap().as_ref() {
            sink.notify(dark);
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.sink.lock().unwrap().is_some()
    }
}

impl ThemeObserver for ManualThemeObserver {
    fn prefers_dark(&self) -> bool {
        self.dark
    }

    fn subscribe(&mut self, sink: ThemeSink) {
        *self.sink.lock().unwrap() = Some(sink);
    }

    fn unsubscribe(&mut self) {
        *self.sink.lock().unwrap() = None;
    }
}
