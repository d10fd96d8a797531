//! Playback orchestration: playlist, mode policy, inputs and the engine

pub mod engine;
pub mod events;
pub mod mode;
pub mod playlist;

pub use engine::{Collaborators, Player, PlayerInbox};
pub use events::{Command, Effect, PlayerInput, ReplaceOptions};
pub use playlist::Playlist;
