//! # JKMP Player Library (jkmp-player)
//!
//! Playlist audio player orchestrator.
//!
//! **Purpose:** Own the playlist, current-track pointer, transport state,
//! volume and play-mode policy; drive a pluggable media transport and report
//! everything to the host as [`jkmp_common::events::PlayerEvent`]s.
//!
//! **Architecture:** One input queue per player. Commands, transport events,
//! resolved sources and timers are all [`playback::PlayerInput`]s handled to
//! completion by [`playback::Player`]; [`runtime::PlayerRuntime`] drives the
//! queue on tokio.

pub mod error;
pub mod lyrics;
pub mod persistence;
pub mod playback;
pub mod runtime;
pub mod session;
pub mod state;
pub mod transport;

pub use error::{Error, Result};
pub use playback::{Collaborators, Player};
pub use runtime::{PlayerHandle, PlayerRuntime};
pub use state::PlayerStatus;
pub use transport::{SimulatedTransport, Transport, TransportEvent};
