//! Transport double that records every command

use std::sync::{Arc, Mutex, MutexGuard};

use jkmp_common::events::ErrorReport;
use jkmp_player::transport::{Transport, TransportEvents};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Attach,
    Detach,
    Load(String),
    Play,
    Pause,
    Seek(f64),
    SetVolume(f64),
}

#[derive(Debug, Default)]
pub struct MockState {
    pub calls: Vec<Call>,
    pub source: Option<String>,
    pub position: f64,
    pub duration: Option<f64>,
    pub volume: f64,
    pub buffered_end: Option<f64>,
    pub last_error: Option<ErrorReport>,
    /// Returned by every `load` while set
    pub reject_load: Option<ErrorReport>,
    /// Returned by every `play` while set
    pub reject_play: Option<ErrorReport>,
    pub events: Option<TransportEvents>,
}

/// Cloning shares the recorded state
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn loads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Load(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn is_attached(&self) -> bool {
        self.state().events.is_some()
    }
}

impl Transport for MockTransport {
    fn attach(&mut self, events: TransportEvents) {
        let mut state = self.state();
        state.events = Some(events);
        state.calls.push(Call::Attach);
    }

    fn detach(&mut self) {
        let mut state = self.state();
        state.events = None;
        state.calls.push(Call::Detach);
    }

    fn load(&mut self, url: &str) -> Result<(), ErrorReport> {
        let mut state = self.state();
        state.calls.push(Call::Load(url.to_string()));
        if let Some(report) = state.reject_load.clone() {
            return Err(report);
        }
        state.source = Some(url.to_string());
        state.position = 0.0;
        Ok(())
    }

    fn play(&mut self) -> Result<(), ErrorReport> {
        let mut state = self.state();
        state.calls.push(Call::Play);
        match state.reject_play.clone() {
            Some(report) => Err(report),
            None => Ok(()),
        }
    }

    fn pause(&mut self) {
        self.state().calls.push(Call::Pause);
    }

    fn seek(&mut self, position: f64) {
        let mut state = self.state();
        state.position = position;
        state.calls.push(Call::Seek(position));
    }

    fn set_volume(&mut self, volume: f64) {
        let mut state = self.state();
        state.volume = volume;
        state.calls.push(Call::SetVolume(volume));
    }

    fn current_time(&self) -> f64 {
        self.state().position
    }

    fn duration(&self) -> Option<f64> {
        self.state().duration
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
        self.state().last_error.clone()
    }
}
