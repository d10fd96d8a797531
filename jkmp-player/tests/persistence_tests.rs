//! Remembered play status tests
//!
//! Covers saving on progress, restoring track/position/mode/volume/theme on
//! mount and replace, the paused-snapshot gate, and the file-backed store.

mod helpers;

use std::sync::Arc;

use helpers::{tracks, Call, Harness};
use jkmp_common::config::{resolve_state_dir, PlayerConfig, STATE_DIR_ENV};
use jkmp_common::events::{PlaybackMode, Theme, TransportPhase};
use jkmp_common::TrackId;
use jkmp_player::persistence::{
    read_snapshot, write_snapshot, FileStore, MemoryStore, PlaybackSnapshot, SnapshotStore,
    LAST_PLAY_STATUS_KEY,
};
use jkmp_player::playback::events::{Command, ReplaceOptions};
use jkmp_player::playback::Collaborators;
use jkmp_player::transport::TransportEvent;
use serial_test::serial;

fn remembering(store: Arc<dyn SnapshotStore>) -> Harness {
    let config = PlayerConfig {
        remember: true,
        ..Default::default()
    };
    let collaborators = Collaborators {
        store: Some(store),
        ..Default::default()
    };
    Harness::with_collaborators(config, collaborators)
}

fn seeded(snapshot: PlaybackSnapshot) -> MemoryStore {
    let store = MemoryStore::new();
    write_snapshot(&store, &snapshot).unwrap();
    store
}

fn at(id: &str, current_time: f64) -> PlaybackSnapshot {
    PlaybackSnapshot {
        current_id: Some(TrackId::from(id)),
        current_time,
        ..Default::default()
    }
}

fn tick(h: &mut Harness, position: f64) {
    h.transport.state().position = position;
    h.transport_event(TransportEvent::TimeUpdate);
}

#[test]
fn test_progress_saves_snapshot() {
    let store = MemoryStore::new();
    let mut h = remembering(Arc::new(store.clone()));
    h.mount_and_play(tracks(2));

    tick(&mut h, 12.0);

    let saved = read_snapshot(&store).expect("snapshot saved");
    assert_eq!(saved.current_id, Some(TrackId::from("t0")));
    assert_eq!(saved.current_time, 12.0);
    assert_eq!(saved.name, "Track 0");
    assert_eq!(saved.music_src, "sim://t0");
    assert_eq!(saved.volume, 1.0);
    assert!(!saved.paused);
}

#[test]
fn test_progress_does_not_save_without_remember() {
    let store = MemoryStore::new();
    let collaborators = Collaborators {
        store: Some(Arc::new(store.clone())),
        ..Default::default()
    };
    let mut h = Harness::with_collaborators(PlayerConfig::default(), collaborators);
    h.mount_and_play(tracks(1));

    tick(&mut h, 5.0);

    assert_eq!(store.load(LAST_PLAY_STATUS_KEY).unwrap(), None);
}

#[test]
fn test_restore_resumes_track_position_and_settings() {
    let store = seeded(PlaybackSnapshot {
        playback_mode: PlaybackMode::SingleLoop,
        volume: 0.3,
        theme: Theme::Light,
        ..at("t1", 42.0)
    });
    let mut h = remembering(Arc::new(store));

    let status = h.status();
    assert_eq!(status.mode, PlaybackMode::SingleLoop);
    assert_eq!(status.volume, 0.3);
    assert_eq!(status.theme, Theme::Light);
    assert_eq!(h.transport.calls(), vec![Call::Attach, Call::SetVolume(0.3)]);

    h.send(Command::Mount(tracks(3)));
    assert_eq!(h.transport.loads(), vec!["sim://t1"]);
    h.transport.clear_calls();

    h.transport_event(TransportEvent::CanPlay);

    assert_eq!(h.transport.calls(), vec![Call::Seek(42.0), Call::Play]);
    assert_eq!(h.status().current_time, 42.0);
}

#[test]
fn test_paused_snapshot_stays_paused_until_user_plays() {
    let store = seeded(PlaybackSnapshot {
        paused: true,
        ..at("t0", 3.0)
    });
    let mut h = remembering(Arc::new(store));
    h.send(Command::Mount(tracks(2)));

    h.transport_event(TransportEvent::CanPlay);
    assert_eq!(h.transport.count(&Call::Play), 0);
    assert_eq!(h.status().phase, TransportPhase::Paused);

    h.send(Command::TogglePlay);
    assert_eq!(h.transport.count(&Call::Play), 1);
}

#[test]
fn test_legacy_field_names_are_read() {
    let store = MemoryStore::new();
    store
        .save(
            LAST_PLAY_STATUS_KEY,
            r#"{"playId":"t2","soundValue":0.5,"pause":false,"playMode":"orderLoop"}"#,
        )
        .unwrap();
    let mut h = remembering(Arc::new(store));

    h.send(Command::Mount(tracks(3)));

    assert_eq!(h.status().mode, PlaybackMode::SequentialLoop);
    assert_eq!(h.status().volume, 0.5);
    assert_eq!(h.transport.loads(), vec!["sim://t2"]);
}

#[test]
fn test_snapshot_for_missing_track_falls_back_to_default_index() {
    let store = seeded(at("gone", 30.0));
    let mut h = remembering(Arc::new(store));

    h.send(Command::Mount(tracks(2)));
    h.transport_event(TransportEvent::CanPlay);

    assert_eq!(h.transport.loads(), vec!["sim://t0"]);
    assert!(!h.transport.calls().iter().any(|c| matches!(c, Call::Seek(_))));
}

#[test]
fn test_unreadable_snapshot_is_ignored() {
    let store = MemoryStore::new();
    store.save(LAST_PLAY_STATUS_KEY, "{not json").unwrap();
    let mut h = remembering(Arc::new(store));

    h.send(Command::Mount(tracks(2)));

    assert_eq!(h.status().volume, 1.0);
    assert_eq!(h.transport.loads(), vec!["sim://t0"]);
}

#[test]
fn test_remember_off_ignores_stored_snapshot() {
    let store = seeded(PlaybackSnapshot {
        volume: 0.2,
        ..at("t1", 10.0)
    });
    let collaborators = Collaborators {
        store: Some(Arc::new(store)),
        ..Default::default()
    };
    let mut h = Harness::with_collaborators(PlayerConfig::default(), collaborators);

    h.send(Command::Mount(tracks(2)));

    assert_eq!(h.status().volume, 1.0);
    assert_eq!(h.transport.loads(), vec!["sim://t0"]);
}

#[test]
fn test_replace_all_with_remember_restores_snapshot() {
    let store = MemoryStore::new();
    let collaborators = Collaborators {
        store: Some(Arc::new(store.clone())),
        ..Default::default()
    };
    let mut h = Harness::with_collaborators(PlayerConfig::default(), collaborators);
    h.mount_and_play(tracks(2));
    write_snapshot(
        &store,
        &PlaybackSnapshot {
            playback_mode: PlaybackMode::Shuffle,
            volume: 0.7,
            ..at("t1", 7.0)
        },
    )
    .unwrap();

    h.send(Command::ReplaceAll {
        tracks: tracks(3),
        options: ReplaceOptions {
            remember: true,
            play_mode: None,
            theme: None,
            play_index: 0,
            auto_play_initial: true,
        },
    });

    assert_eq!(
        h.transport.calls(),
        vec![
            Call::Pause,
            Call::SetVolume(0.7),
            Call::Load("sim://t1".to_string())
        ]
    );
    assert_eq!(h.status().mode, PlaybackMode::Shuffle);

    h.transport.clear_calls();
    h.transport_event(TransportEvent::CanPlay);
    assert_eq!(h.transport.calls(), vec![Call::Seek(7.0), Call::Play]);
}

#[test]
fn test_file_store_carries_status_across_players() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut first = remembering(Arc::new(FileStore::new(dir.path())));
        first.mount_and_play(tracks(3));
        first.send(Command::UpdatePlayIndex(1));
        first.transport_event(TransportEvent::CanPlay);
        first.transport_event(TransportEvent::Play);
        tick(&mut first, 15.0);
    }

    let mut second = remembering(Arc::new(FileStore::new(dir.path())));
    second.send(Command::Mount(tracks(3)));
    assert_eq!(second.transport.loads(), vec!["sim://t1"]);

    second.transport.clear_calls();
    second.transport_event(TransportEvent::CanPlay);
    assert_eq!(second.transport.calls(), vec![Call::Seek(15.0), Call::Play]);
}

#[test]
#[serial]
fn test_state_dir_from_environment_receives_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var(STATE_DIR_ENV, dir.path());
    let config = PlayerConfig {
        remember: true,
        ..Default::default()
    };
    let state_dir = resolve_state_dir(None, STATE_DIR_ENV, &config);
    std::env::remove_var(STATE_DIR_ENV);
    assert_eq!(state_dir, dir.path());

    let mut h = remembering(Arc::new(FileStore::new(state_dir)));
    h.mount_and_play(tracks(1));
    tick(&mut h, 2.0);

    assert!(dir.path().join("lastPlayStatus.json").exists());
}
