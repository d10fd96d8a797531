//! Last-play-status persistence
//!
//! A key-value text store holding one JSON snapshot of the player, written
//! on every progress tick when persistence is enabled and read once at
//! startup.

use jkmp_common::events::{PlaybackMode, Theme};
use jkmp_common::TrackId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

use crate::error::Result;

/// Key the snapshot is stored under
pub const LAST_PLAY_STATUS_KEY: &str = "lastPlayStatus";

/// Key-value text store
pub trait SnapshotStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// What the player remembers between runs
///
/// Field names are camelCase on disk; the older `playId`, `playMode`,
/// `soundValue` and `pause` names are accepted when reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackSnapshot {
    pub current_time: f64,
    #[serde(alias = "playId")]
    pub current_id: Option<TrackId>,
    pub theme: Theme,
    #[serde(alias = "playMode")]
    pub playback_mode: PlaybackMode,
    #[serde(alias = "soundValue")]
    pub volume: f64,
    pub name: String,
    pub cover: String,
    pub singer: String,
    pub music_src: String,
    #[serde(alias = "pause")]
    pub paused: bool,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            current_id: None,
            theme: Theme::Dark,
            playback_mode: PlaybackMode::Sequential,
            volume: 1.0,
            name: String::new(),
            cover: String::new(),
            singer: String::new(),
            music_src: String::new(),
            paused: false,
        }
    }
}

/// Read the snapshot; missing or unparsable yields `None` (logged)
pub fn read_snapshot(store: &dyn SnapshotStore) -> Option<PlaybackSnapshot> {
    let text = match store.load(LAST_PLAY_STATUS_KEY) {
        Ok(Some(text)) => text,
        Ok(None) => {
            debug!("No stored play status");
            return None;
        }
        Err(e) => {
            warn!(error = %e, "Failed to read stored play status, using defaults");
            return None;
        }
    };
    match serde_json::from_str::<PlaybackSnapshot>(&text) {
        Ok(mut snapshot) => {
            snapshot.volume = if snapshot.volume.is_finite() {
                snapshot.volume.clamp(0.0, 1.0)
            } else {
                1.0
            };
            snapshot.current_time = snapshot.current_time.max(0.0);
            Some(snapshot)
        }
        Err(e) => {
            warn!(error = %e, "Stored play status is not valid JSON, using defaults");
            None
        }
    }
}

pub fn write_snapshot(store: &dyn SnapshotStore, snapshot: &PlaybackSnapshot) -> Result<()> {
    let text = serde_json::to_string(snapshot).map_err(jkmp_common::Error::from)?;
    store.save(LAST_PLAY_STATUS_KEY, &text)
}

/// In-process store; clones share contents
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key under a state folder
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SnapshotStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(jkmp_common::Error::from(e).into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(jkmp_common::Error::from)?;
        // Atomic replace via rename
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(jkmp_common::Error::from)?;
        fs::rename(&tmp, &path).map_err(jkmp_common::Error::from)?;
        Ok(())
    }
}
