//! # JKMP Common Library
//!
//! Shared code for the JKMP player workspace:
//! - Track model and deferred music sources
//! - Host event types (PlayerEvent enum) and the EventBus
//! - Configuration loading and state folder resolution
//! - Utility functions (ids, time)

pub mod config;
pub mod error;
pub mod events;
pub mod time;
pub mod track;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use track::{MusicSource, SourceResolver, Track, TrackId};
