//! Synchronous driver around a Player with a MockTransport

use std::time::Duration;

use jkmp_common::config::PlayerConfig;
use jkmp_common::events::PlayerEvent;
use jkmp_common::{MusicSource, Track};
use jkmp_player::playback::events::{Command, Effect, FollowUp, PendingResolution, PlayerInput};
use jkmp_player::playback::{Collaborators, Player, PlayerInbox};
use jkmp_player::transport::TransportEvent;
use jkmp_player::PlayerStatus;
use tokio::sync::broadcast::{self, error::TryRecvError};

use super::mock_transport::MockTransport;

/// `count` tracks with ids `t0..`, sources `sim://t0..` and names `Track 0..`
pub fn tracks(count: usize) -> Vec<Track> {
    (0..count)
        .map(|i| {
            Track::new(format!("Track {}", i), MusicSource::direct(format!("sim://t{}", i)))
                .with_id(format!("t{}", i))
                .with_singer("Tester")
        })
        .collect()
}

/// Runs every input to completion, then settles deferred follow-ups and
/// anything the player queued for itself. Timers and source resolutions are
/// held until the test releases them.
pub struct Harness {
    pub player: Player<MockTransport>,
    pub inbox: PlayerInbox,
    pub transport: MockTransport,
    pub events: broadcast::Receiver<PlayerEvent>,
    pub timers: Vec<(Duration, FollowUp)>,
    pub resolutions: Vec<PendingResolution>,
}

impl Harness {
    pub fn new(config: PlayerConfig) -> Self {
        Self::with_collaborators(config, Collaborators::default())
    }

    pub fn with_collaborators(config: PlayerConfig, collaborators: Collaborators) -> Self {
        let transport = MockTransport::new();
        let (player, inbox) = Player::new(transport.clone(), config, collaborators);
        let events = player.subscribe_events();
        let mut harness = Self {
            player,
            inbox,
            transport,
            events,
            timers: Vec::new(),
            resolutions: Vec::new(),
        };
        harness.settle();
        harness
    }

    /// Mounted with `count` tracks, head loaded and reported playable
    pub fn mounted(config: PlayerConfig, count: usize) -> Self {
        let mut harness = Self::new(config);
        harness.send(Command::Mount(tracks(count)));
        harness.transport_event(TransportEvent::CanPlay);
        harness
    }

    /// Mounted and playing the head track, with history cleared
    pub fn playing(config: PlayerConfig, count: usize) -> Self {
        let mut harness = Self::new(config);
        harness.mount_and_play(tracks(count));
        harness
    }

    /// Mount, report the head playable and playing, then clear history
    pub fn mount_and_play(&mut self, tracks: Vec<Track>) {
        self.send(Command::Mount(tracks));
        self.transport_event(TransportEvent::CanPlay);
        self.transport_event(TransportEvent::Play);
        self.transport.clear_calls();
        self.drain_events();
    }

    pub fn send(&mut self, command: Command) {
        self.deliver(PlayerInput::Command(command));
    }

    pub fn transport_event(&mut self, event: TransportEvent) {
        self.deliver(PlayerInput::Transport(event));
    }

    pub fn deliver(&mut self, input: PlayerInput) {
        self.player.handle(input);
        self.settle();
    }

    pub fn settle(&mut self) {
        loop {
            let mut progressed = false;
            for effect in self.player.take_effects() {
                match effect {
                    Effect::Defer(follow_up) => {
                        self.player.handle(PlayerInput::FollowUp(follow_up));
                        progressed = true;
                    }
                    Effect::After(delay, follow_up) => self.timers.push((delay, follow_up)),
                    Effect::Resolve(pending) => self.resolutions.push(pending),
                }
            }
            while let Ok(input) = self.inbox.try_recv() {
                self.player.handle(input);
                progressed = true;
            }
            if !progressed {
                break;
            }
        }
    }

    /// Fire every pending timer as if its delay elapsed
    pub fn fire_timers(&mut self) {
        let timers = std::mem::take(&mut self.timers);
        for (_, follow_up) in timers {
            self.player.handle(PlayerInput::FollowUp(follow_up));
        }
        self.settle();
    }

    /// Complete every pending resolution in request order
    pub async fn resolve_all(&mut self) {
        let pending = std::mem::take(&mut self.resolutions);
        for resolution in pending {
            let input = resolution.run().await;
            self.player.handle(input);
        }
        self.settle();
    }

    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        events
    }

    pub fn event_types(&mut self) -> Vec<&'static str> {
        self.drain_events().iter().map(|e| e.event_type()).collect()
    }

    pub fn status(&self) -> PlayerStatus {
        self.player.status()
    }

    pub fn current_id(&self) -> Option<String> {
        self.status().current_id.map(|id| id.to_string())
    }
}
