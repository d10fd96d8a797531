//! Test helper modules for jkmp-player integration tests
//!
//! Provides reusable test infrastructure components:
//! - MockTransport: records transport commands, emits nothing by itself
//! - RecordingSession / ManualThemeObserver: platform hooks tests can poke
//! - Harness: drives a Player synchronously, holding timers and resolutions
//!   until the test releases them

#![allow(dead_code)]

pub mod harness;
pub mod mock_transport;
pub mod platform;

pub use harness::{tracks, Harness};
pub use mock_transport::{Call, MockTransport};
pub use platform::{ManualThemeObserver, RecordingSession};
