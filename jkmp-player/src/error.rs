//! Error types for jkmp-player
//!
//! Internal operations return [`Result`]; the public control surface never
//! fails and instead logs through [`Error::log`] or emits a host error event.

use jkmp_common::events::ErrorReport;
use jkmp_common::TrackId;
use thiserror::Error;
use tracing::{error, warn};

/// Main error type for jkmp-player
#[derive(Error, Debug)]
pub enum Error {
    /// Operation needs at least one track
    #[error("Playlist is empty")]
    EmptyPlaylist,

    /// Track id not present in the playlist
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    /// Deferred music source could not be resolved
    #[error("Source resolution failed: {0}")]
    Resolution(String),

    /// Media transport refused a command
    #[error("Transport error: {0}")]
    Transport(ErrorReport),

    /// Invalid request from the host
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Index {index} out of range for playlist of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// I/O, JSON and TOML errors from the common crate
    #[error(transparent)]
    Common(#[from] jkmp_common::Error),
}

impl Error {
    /// Expected during normal use (empty list, stale id)
    pub fn is_user_warning(&self) -> bool {
        matches!(self, Error::EmptyPlaylist | Error::TrackNotFound(_))
    }

    /// Log at the level matching the error's kind
    pub fn log(&self, operation: &str) {
        if self.is_user_warning() {
            warn!(operation, "{}", self);
        } else {
            error!(operation, "{}", self);
        }
    }
}

/// Convenience Result type using jkmp-player Error
pub type Result<T> = std::result::Result<T, Error>;
