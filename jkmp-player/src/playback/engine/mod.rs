//! Playback orchestrator
//!
//! **Module Structure:**
//! - `core.rs`: Lifecycle, input dispatch, state projection, lyric/session/theme glue
//! - `selection.rs`: Track selection, mode policy application, source resolution
//! - `transport_events.rs`: Reactions to transport events, load-and-play, error path
//! - `queue.rs`: Playlist mutations (remove, clear, reorder, append, replace, merge)
//! - `volume.rs`: Volume, mute, seeking and media-session actions

mod core;
mod queue;
mod selection;
mod transport_events;
mod volume;

pub use self::core::{Collaborators, Player, PlayerInbox, EVENT_CHANNEL_CAPACITY};
pub use self::transport_events::NO_SOURCE_REASON;
