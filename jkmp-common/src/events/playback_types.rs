//! Playback-related type definitions
//!
//! Playback mode policy names, transport phase and theme.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Error;

/// Policy deciding what next/previous/on-end resolve to
///
/// Cycled in declared order by the mode button.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackMode {
    /// Play through once, stop after the last track
    #[default]
    #[serde(alias = "order")]
    Sequential,
    /// Play through and wrap around
    #[serde(alias = "orderLoop")]
    SequentialLoop,
    /// Repeat the current track
    SingleLoop,
    /// Random track other than the current one
    #[serde(alias = "shufflePlay")]
    Shuffle,
}

impl PlaybackMode {
    /// All modes in cycling order
    pub const ALL: [PlaybackMode; 4] = [
        PlaybackMode::Sequential,
        PlaybackMode::SequentialLoop,
        PlaybackMode::SingleLoop,
        PlaybackMode::Shuffle,
    ];

    /// Next mode in cycling order (wraps)
    pub fn next(self) -> PlaybackMode {
        let pos = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }

    /// camelCase name as used in snapshots and config
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackMode::Sequential => "sequential",
            PlaybackMode::SequentialLoop => "sequentialLoop",
            PlaybackMode::SingleLoop => "singleLoop",
            PlaybackMode::Shuffle => "shuffle",
        }
    }
}

impl std::fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlaybackMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" | "order" => Ok(PlaybackMode::Sequential),
            "sequentialLoop" | "orderLoop" => Ok(PlaybackMode::SequentialLoop),
            "singleLoop" => Ok(PlaybackMode::SingleLoop),
            "shuffle" | "shufflePlay" => Ok(PlaybackMode::Shuffle),
            other => Err(Error::InvalidInput(format!("unknown play mode: {}", other))),
        }
    }
}

/// Transport phase enumeration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportPhase {
    /// No track loaded
    #[default]
    Idle,
    /// Source requested, not yet playable
    Loading,
    Playing,
    Paused,
}

impl std::fmt::Display for TransportPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportPhase::Idle => write!(f, "idle"),
            TransportPhase::Loading => write!(f, "loading"),
            TransportPhase::Playing => write!(f, "playing"),
            TransportPhase::Paused => write!(f, "paused"),
        }
    }
}

/// Theme preference
///
/// `Auto` follows the system preference; the effective theme is always
/// `Light` or `Dark`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
    Auto,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
            Theme::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "auto" => Ok(Theme::Auto),
            other => Err(Error::InvalidInput(format!("unknown theme: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_cycles_in_declared_order() {
        let mut mode = PlaybackMode::Sequential;
        let mut seen = vec![mode];
        for _ in 0..3 {
            mode = mode.next();
            seen.push(mode);
        }
        assert_eq!(seen, PlaybackMode::ALL.to_vec());
        assert_eq!(mode.next(), PlaybackMode::Sequential);
    }

    #[test]
    fn test_mode_accepts_legacy_names() {
        let mode: PlaybackMode = serde_json::from_str("\"orderLoop\"").unwrap();
        assert_eq!(mode, PlaybackMode::SequentialLoop);
        assert_eq!("shufflePlay".parse::<PlaybackMode>().unwrap(), PlaybackMode::Shuffle);
        assert_eq!(serde_json::to_string(&PlaybackMode::SingleLoop).unwrap(), "\"singleLoop\"");
        assert!("random".parse::<PlaybackMode>().is_err());
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("auto".parse::<Theme>().unwrap(), Theme::Auto);
        assert_eq!(Theme::default(), Theme::Dark);
    }
}
