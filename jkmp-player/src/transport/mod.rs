//! Media transport abstraction
//!
//! The transport is the decode/playback resource. The orchestrator is its
//! only writer: it issues commands through [`Transport`] and receives
//! lifecycle events on its input queue through the [`TransportEvents`] sink
//! handed over at attach time.

mod simulated;

pub use simulated::SimulatedTransport;

use jkmp_common::events::ErrorReport;
use tokio::sync::mpsc;

use crate::playback::events::PlayerInput;

/// Lifecycle events a transport emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// Playback stalled waiting for data
    Waiting,
    /// Enough data to start
    CanPlay,
    /// Media error; details via [`Transport::last_error`]
    Error,
    Stalled,
    Ended,
    Pause,
    Play,
    TimeUpdate,
    VolumeChange,
    /// Load aborted before completion
    Abort,
    /// Buffered range grew
    Progress,
    Seeked,
}

/// Sink a transport reports events into
#[derive(Debug, Clone)]
pub struct TransportEvents {
    tx: mpsc::UnboundedSender<PlayerInput>,
}

impl TransportEvents {
    pub fn new(tx: mpsc::UnboundedSender<PlayerInput>) -> Self {
        Self { tx }
    }

    /// Returns false once the player has gone away
    pub fn send(&self, event: TransportEvent) -> bool {
        self.tx.send(PlayerInput::Transport(event)).is_ok()
    }
}

/// Commands and queries over a media decode/playback engine
///
/// Commands are fire-and-forget except `load` and `play`, which may be
/// rejected synchronously. Asynchronous outcomes arrive as events.
pub trait Transport: Send {
    /// Start reporting events into `events`
    fn attach(&mut self, events: TransportEvents);

    /// Stop reporting events; later events are dropped
    fn detach(&mut self);

    fn load(&mut self, url: &str) -> Result<(), ErrorReport>;

    fn play(&mut self) -> Result<(), ErrorReport>;

    fn pause(&mut self);

    /// Position in seconds
    fn seek(&mut self, position: f64);

    /// 0..=1
    fn set_volume(&mut self, volume: f64);

    fn current_time(&self) -> f64;

    /// `None` until the media reports it
    fn duration(&self) -> Option<f64>;

    fn volume(&self) -> f64;

    /// End of the last buffered range, in seconds
    fn buffered_end(&self) -> Option<f64>;

    /// False when the loaded source was empty or unsupported
    fn has_source(&self) -> bool;

    fn last_error(&self) -> Option<ErrorReport>;
}
