//! Configuration loading and state folder resolution

use crate::events::{PlaybackMode, Theme};
use crate::time::millis_to_duration;
use crate::{Error, Result, Track};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable overriding the state folder
pub const STATE_DIR_ENV: &str = "JKMP_STATE_DIR";

/// Player behaviour settings
///
/// Every key is optional in the TOML file; missing keys take the defaults
/// below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Global auto-play: start playback as soon as a source can play
    pub auto_play: bool,
    /// Persist and restore the last play status
    pub remember: bool,
    pub default_play_mode: PlaybackMode,
    /// Host-forced mode, overrides `default_play_mode`
    pub play_mode: Option<PlaybackMode>,
    /// Initial volume in [0, 1]
    pub default_volume: f64,
    /// Skip to the next track when the current one fails to load
    pub load_audio_error_play_next: bool,
    /// How long the mode banner stays up after cycling
    pub play_mode_show_time_ms: u64,
    /// `set_playlist` replaces instead of merging
    pub clear_prior_audio_lists: bool,
    pub default_play_index: usize,
    pub theme: Theme,
    pub show_media_session: bool,
    /// Delay between a removal request and the actual removal
    pub removal_delay_ms: u64,
    /// Media-session seek step when the platform gives no offset
    pub seek_step_secs: f64,
    /// Fixed seed for shuffle (reproducible runs)
    pub shuffle_seed: Option<u64>,
    /// Where snapshots are stored; see [`resolve_state_dir`]
    pub state_dir: Option<PathBuf>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            auto_play: true,
            remember: false,
            default_play_mode: PlaybackMode::Sequential,
            play_mode: None,
            default_volume: 1.0,
            load_audio_error_play_next: true,
            play_mode_show_time_ms: 600,
            clear_prior_audio_lists: false,
            default_play_index: 0,
            theme: Theme::Dark,
            show_media_session: false,
            removal_delay_ms: 350,
            seek_step_secs: 10.0,
            shuffle_seed: None,
            state_dir: None,
        }
    }
}

impl PlayerConfig {
    /// Parse from TOML text, clamping out-of-range values
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PlayerConfig = toml::from_str(content)?;
        Ok(config.normalized())
    }

    /// Load from a TOML file
    ///
    /// A missing file is not an error: a warning is logged and defaults are
    /// used. A file that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                debug!(path = %path.display(), "Loading player config");
                Self::from_toml_str(&content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Clamp values into their legal ranges
    pub fn normalized(mut self) -> Self {
        if !self.default_volume.is_finite() {
            warn!(value = self.default_volume, "Non-finite default_volume, using 1.0");
            self.default_volume = 1.0;
        }
        self.default_volume = self.default_volume.clamp(0.0, 1.0);
        if !self.seek_step_secs.is_finite() || self.seek_step_secs <= 0.0 {
            self.seek_step_secs = 10.0;
        }
        self
    }

    /// Mode in effect at startup
    pub fn initial_play_mode(&self) -> PlaybackMode {
        self.play_mode.unwrap_or(self.default_play_mode)
    }

    pub fn play_mode_show_time(&self) -> Duration {
        millis_to_duration(self.play_mode_show_time_ms)
    }

    pub fn removal_delay(&self) -> Duration {
        millis_to_duration(self.removal_delay_ms)
    }
}

/// State folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. `state_dir` key of the config file
/// 4. OS-dependent default
pub fn resolve_state_dir(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config: &PlayerConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.state_dir {
        return path.clone();
    }

    default_state_dir()
}

/// OS-dependent default state folder
pub fn default_state_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("jkmp"))
        .unwrap_or_else(|| PathBuf::from("./jkmp_data"))
}

/// Per-user config file location, if the platform has one
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("jkmp").join("config.toml"))
}

#[derive(Debug, Default, Deserialize)]
struct PlaylistFile {
    #[serde(default)]
    tracks: Vec<Track>,
}

/// Read a playlist from a TOML file of `[[tracks]]` tables
pub fn load_playlist(path: &Path) -> Result<Vec<Track>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(format!("playlist {}", path.display()))
        } else {
            Error::Io(e)
        }
    })?;
    let file: PlaylistFile = toml::from_str(&content)?;
    debug!(path = %path.display(), tracks = file.tracks.len(), "Loaded playlist");
    Ok(file.tracks)
}
