//! Headless clock-driven transport
//!
//! Plays nothing: a ticker task advances a virtual position while "playing"
//! and reports the same lifecycle events a real media element would. Used by
//! the CLI and runtime tests.
//!
//! Sources are URLs whose query string shapes the simulated media:
//! `duration=<secs>` (default 30) and `fail=1` (media error after load).
//! An empty URL has no source.

use jkmp_common::events::ErrorReport;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::{Transport, TransportEvent, TransportEvents};

const DEFAULT_DURATION_SECS: f64 = 30.0;
/// Read-ahead reported as buffered beyond the position
const BUFFER_AHEAD_SECS: f64 = 15.0;
/// Media error code for an unsupported source
const SRC_NOT_SUPPORTED: u16 = 4;

#[derive(Debug, Clone, PartialEq)]
struct SimSource {
    url: String,
    duration: f64,
    fails: bool,
}

impl SimSource {
    fn parse(url: &str) -> Option<Self> {
        if url.trim().is_empty() {
            return None;
        }
        let mut source = SimSource {
            url: url.to_string(),
            duration: DEFAULT_DURATION_SECS,
            fails: false,
        };
        let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "duration" => {
                    if let Ok(secs) = value.parse::<f64>() {
                        if secs.is_finite() && secs > 0.0 {
                            source.duration = secs;
                        }
                    }
                }
                "fail" => source.fails = value != "0",
                _ => {}
            }
        }
        Some(source)
    }
}

#[derive(Debug)]
struct SimState {
    events: Option<TransportEvents>,
    source: Option<SimSource>,
    /// Bumped per load so a superseded load never reports
    load_seq: u64,
    ready: bool,
    position: f64,
    paused: bool,
    volume: f64,
    buffered_end: Option<f64>,
    error: Option<ErrorReport>,
}

impl SimState {
    fn emit(&self, event: TransportEvent) {
        if let Some(events) = &self.events {
            trace!(?event, "Simulated transport event");
            events.send(event);
        }
    }

    fn duration(&self) -> Option<f64> {
        self.source.as_ref().filter(|_| self.ready).map(|s| s.duration)
    }

    /// Complete load `seq`, unless a newer load superseded it
    fn finish_load(&mut self, seq: u64) {
        if seq != self.load_seq {
            return;
        }
        match &self.source {
            Some(source) if !source.fails => {
                self.ready = true;
                self.buffered_end = Some(BUFFER_AHEAD_SECS.min(source.duration));
                self.emit(TransportEvent::Progress);
                self.emit(TransportEvent::CanPlay);
            }
            Some(source) => {
                self.error = Some(ErrorReport::new(
                    Some(SRC_NOT_SUPPORTED),
                    format!("Simulated decode failure for {}", source.url),
                ));
                self.emit(TransportEvent::Error);
            }
            None => {
                self.error = Some(ErrorReport::new(
                    Some(SRC_NOT_SUPPORTED),
                    "Empty source",
                ));
                self.emit(TransportEvent::Error);
            }
        }
    }

    /// Advance the virtual clock by `secs` of media time
    fn tick(&mut self, secs: f64) {
        let Some(duration) = self.duration() else {
            return;
        };
        if self.paused {
            return;
        }
        self.position = (self.position + secs).min(duration);
        self.buffered_end = Some((self.position + BUFFER_AHEAD_SECS).min(duration));
        self.emit(TransportEvent::TimeUpdate);
        self.emit(TransportEvent::Progress);
        if self.position >= duration {
            self.paused = true;
            self.emit(TransportEvent::Ended);
        }
    }
}

/// Transport driven by a virtual clock
pub struct SimulatedTransport {
    shared: Arc<Mutex<SimState>>,
    tick: Duration,
    /// Media seconds per wall-clock second
    speed: f64,
    load_latency: Duration,
    ticker: Option<JoinHandle<()>>,
}

impl SimulatedTransport {
    pub fn new(tick: Duration, speed: f64) -> Self {
        Self {
            shared: Arc::new(Mutex::new(SimState {
                events: None,
                source: None,
                load_seq: 0,
                ready: false,
                position: 0.0,
                paused: true,
                volume: 1.0,
                buffered_end: None,
                error: None,
            })),
            tick,
            speed: if speed.is_finite() && speed > 0.0 { speed } else { 1.0 },
            load_latency: Duration::from_millis(50),
            ticker: None,
        }
    }

    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_ticker(&mut self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No tokio runtime; simulated clock will not advance");
            return;
        };
        let shared = Arc::clone(&self.shared);
        let tick = self.tick;
        let media_secs = tick.as_secs_f64() * self.speed;
        self.ticker = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                interval.tick().await;
                shared
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .tick(media_secs);
            }
        }));
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(Duration::from_millis(250), 1.0)
    }
}

impl Transport for SimulatedTransport {
    fn attach(&mut self, events: TransportEvents) {
        self.state().events = Some(events);
        if self.ticker.is_none() {
            self.spawn_ticker();
        }
    }

    fn detach(&mut self) {
        self.state().events = None;
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn load(&mut self, url: &str) -> Result<(), ErrorReport> {
        let seq = {
            let mut state = self.state();
            state.load_seq += 1;
            state.source = SimSource::parse(url);
            state.ready = false;
            state.position = 0.0;
            state.paused = true;
            state.buffered_end = None;
            state.error = None;
            state.load_seq
        };
        debug!(url, seq, "Simulated load");

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let shared = Arc::clone(&self.shared);
                let latency = self.load_latency;
                runtime.spawn(async move {
                    tokio::time::sleep(latency).await;
                    shared
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .finish_load(seq);
                });
            }
            Err(_) => self.state().finish_load(seq),
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), ErrorReport> {
        let mut state = self.state();
        if state.source.is_none() {
            return Err(ErrorReport::new(
                Some(SRC_NOT_SUPPORTED),
                "No source to play",
            ));
        }
        if state.paused {
            state.paused = false;
            state.emit(TransportEvent::Play);
        }
        Ok(())
    }

    fn pause(&mut self) {
        let mut state = self.state();
        if !state.paused {
            state.paused = true;
            state.emit(TransportEvent::Pause);
        }
    }

    fn seek(&mut self, position: f64) {
        let mut state = self.state();
        let end = state.duration().unwrap_or(0.0);
        state.position = position.clamp(0.0, end);
        state.emit(TransportEvent::Seeked);
        state.emit(TransportEvent::TimeUpdate);
    }

    fn set_volume(&mut self, volume: f64) {
        let mut state = self.state();
        state.volume = volume.clamp(0.0, 1.0);
        state.emit(TransportEvent::VolumeChange);
    }

    fn current_time(&self) -> f64 {
        self.state().position
    }

    fn duration(&self) -> Option<f64> {
        self.state().duration()
    }

    fn volume(&self) -> f64 {
        self.state().volume
    }

    fn buffered_end(&self) -> Option<f64> {
        self.state().buffered_end
    }

    fn has_source(&self) -> bool {
        self.state().source.is_some()
    }

    fn last_error(&self) -> Option<ErrorReport> {
        self.state().error.clone()
    }
}

impl Drop for SimulatedTransport {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::events::PlayerInput;
    use tokio::sync::mpsc;

    fn drain(rx: &mut mpsc::UnboundedReceiver<PlayerInput>) -> Vec<TransportEvent> {
        let mut events = Vec::new();
        while let Ok(input) = rx.try_recv() {
            if let PlayerInput::Transport(event) = input {
                events.push(event);
            }
        }
        events
    }

    #[test]
    fn test_parse_source() {
        let source = SimSource::parse("sim://a?duration=2.5&fail=1").unwrap();
        assert_eq!(source.duration, 2.5);
        assert!(source.fails);
        assert_eq!(SimSource::parse("sim://b").unwrap().duration, DEFAULT_DURATION_SECS);
        assert!(SimSource::parse("  ").is_none());
    }

    #[test]
    fn test_load_without_runtime_reports_synchronously() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut transport = SimulatedTransport::default();
        transport.attach(TransportEvents::new(tx));

        transport.load("sim://a?duration=3").unwrap();
        assert_eq!(drain(&mut rx), vec![TransportEvent::Progress, TransportEvent::CanPlay]);
        assert_eq!(transport.duration(), Some(3.0));

        transport.load("sim://bad?fail=1").unwrap();
        assert_eq!(drain(&mut rx), vec![TransportEvent::Error]);
        assert_eq!(transport.last_error().unwrap().code, Some(SRC_NOT_SUPPORTED));
    }

    #[test]
    fn test_play_requires_source() {
        let mut transport = SimulatedTransport::default();
        transport.load("").unwrap();
        assert!(!transport.has_source());
        assert!(transport.play().is_err());
    }

    #[test]
    fn test_tick_reaches_end() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut transport = SimulatedTransport::default();
        transport.attach(TransportEvents::new(tx));
        transport.load("sim://a?duration=1").unwrap();
        transport.play().unwrap();
        drain(&mut rx);

        transport.state().tick(0.6);
        assert_eq!(transport.current_time(), 0.6);
        transport.state().tick(0.6);
        assert_eq!(transport.current_time(), 1.0);

        let events = drain(&mut rx);
        assert_eq!(events.last(), Some(&TransportEvent::Ended));
    }

    #[tokio::test]
    async fn test_detach_stops_reporting() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut transport = SimulatedTransport::new(Duration::from_millis(10), 1.0)
            .with_load_latency(Duration::from_millis(5));
        transport.attach(TransportEvents::new(tx));
        transport.detach();

        transport.load("sim://a").unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(drain(&mut rx).is_empty());
    }
}
