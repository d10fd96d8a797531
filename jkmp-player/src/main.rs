//! JKMP Player (jkmp-player) - Main entry point
//!
//! Headless playlist player driven by line commands on stdin. Playback runs
//! on the simulated transport, so a playlist of `sim://` sources plays in
//! real time without an audio device.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use jkmp_common::config::{self, load_playlist, resolve_state_dir, PlayerConfig, STATE_DIR_ENV};
use jkmp_common::events::{PlaybackMode, PlayerEvent, Theme};
use jkmp_common::time::format_clock;
use jkmp_player::persistence::FileStore;
use jkmp_player::session::{LoggingSession, SessionAction, StaticThemeObserver};
use jkmp_player::{Collaborators, PlayerHandle, PlayerRuntime, SimulatedTransport};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for jkmp-player
#[derive(Parser, Debug)]
#[command(name = "jkmp-player")]
#[command(about = "Headless playlist audio player")]
#[command(version)]
struct Args {
    /// Playlist file of `[[tracks]]` tables
    playlist: Option<PathBuf>,

    /// Player configuration file
    #[arg(short, long, env = "JKMP_CONFIG")]
    config: Option<PathBuf>,

    /// Folder for the remembered play status (overrides JKMP_STATE_DIR)
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Start playing as soon as the first track can play
    #[arg(long)]
    auto_play: bool,

    /// Simulated transport tick interval in milliseconds
    #[arg(long, default_value = "250")]
    tick_ms: u64,

    /// Simulated playback speed multiplier
    #[arg(long, default_value = "1.0")]
    speed: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jkmp_player=debug,jkmp_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config_path = args.config.clone().or_else(config::default_config_path);
    let mut config = match &config_path {
        Some(path) => PlayerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PlayerConfig::default(),
    };
    if args.auto_play {
        config.auto_play = true;
    }

    let tracks = match &args.playlist {
        Some(path) => load_playlist(path)
            .with_context(|| format!("Failed to load playlist {}", path.display()))?,
        None => {
            warn!("No playlist given, starting empty");
            Vec::new()
        }
    };
    info!("Starting JKMP player with {} tracks", tracks.len());

    let mut collaborators = Collaborators {
        theme_observer: Some(Box::new(StaticThemeObserver::new(true))),
        ..Default::default()
    };
    if config.remember {
        let state_dir = resolve_state_dir(args.state_dir.as_deref(), STATE_DIR_ENV, &config);
        info!("Play status folder: {}", state_dir.display());
        collaborators.store = Some(Arc::new(FileStore::new(state_dir)));
    }
    if config.show_media_session {
        collaborators.session = Some(Box::new(LoggingSession::new()));
    }

    let transport = SimulatedTransport::new(Duration::from_millis(args.tick_ms.max(1)), args.speed);
    let runtime = PlayerRuntime::new(transport, config, collaborators);
    let handle = runtime.handle();
    tokio::spawn(log_events(runtime.subscribe_events()));
    let task = runtime.spawn();

    handle.mount(tracks);
    info!("Player ready; type `help` for commands");

    tokio::select! {
        _ = shutdown_signal() => {},
        _ = read_commands(handle.clone()) => {
            info!("Command input closed, shutting down");
        },
    }

    handle.destroy();
    task.await.context("Player task failed")?;
    info!("Shutdown complete");
    Ok(())
}

const HELP: &str = "\
commands:
  play | pause | p      toggle playback
  next | n, prev        skip
  reload                restart the current track
  goto <index>          play the track at index
  remove [index]        remove a track (no index clears)
  move <from> <to>      reorder
  vol <0..1>, mute, unmute
  seek <secs>, ff, rew  seek (ff/rew use the configured step)
  mode [name]           cycle or set the play mode
  theme <light|dark|auto>
  status, quit";

async fn read_commands(handle: PlayerHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !run_command(&handle, line.trim()).await {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read command: {}", e);
                break;
            }
        }
    }
}

fn parse_arg<V: FromStr>(arg: Option<&str>) -> Option<V> {
    arg.and_then(|a| a.parse().ok())
}

/// Run one command line; false means quit
async fn run_command(handle: &PlayerHandle, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return true;
    };
    let arg = parts.next();
    let extra = parts.next();

    match verb {
        "play" | "pause" | "p" => {
            handle.toggle_play();
        }
        "next" | "n" => {
            handle.play_next();
        }
        "prev" => {
            handle.play_prev();
        }
        "reload" => {
            handle.reload();
        }
        "goto" => match parse_arg::<usize>(arg) {
            Some(index) => {
                handle.play_by_index(index);
            }
            None => warn!("usage: goto <index>"),
        },
        "remove" => match (arg, handle.status().await) {
            (None, _) => {
                handle.remove(None);
            }
            (Some(_), Some(status)) => {
                match parse_arg::<usize>(arg).and_then(|i| status.playlist.get(i)) {
                    Some(track) => {
                        handle.remove(Some(track.id.clone()));
                    }
                    None => warn!("usage: remove [index]"),
                }
            }
            (Some(_), None) => {}
        },
        "move" => match (parse_arg::<usize>(arg), parse_arg::<usize>(extra)) {
            (Some(from), Some(to)) => {
                handle.reorder(from, to);
            }
            _ => warn!("usage: move <from> <to>"),
        },
        "vol" => match parse_arg::<f64>(arg) {
            Some(volume) => {
                handle.set_volume(volume);
            }
            None => warn!("usage: vol <0..1>"),
        },
        "mute" => {
            handle.mute();
        }
        "unmute" => {
            handle.unmute();
        }
        "seek" => match parse_arg::<f64>(arg) {
            Some(position) => {
                handle.seek(position);
            }
            None => warn!("usage: seek <secs>"),
        },
        "ff" => {
            handle.session_action(SessionAction::SeekForward(None));
        }
        "rew" => {
            handle.session_action(SessionAction::SeekBackward(None));
        }
        "mode" => match arg {
            None => {
                handle.cycle_play_mode();
            }
            Some(name) => match PlaybackMode::from_str(name) {
                Ok(mode) => {
                    handle.set_play_mode(mode);
                }
                Err(e) => warn!("{}", e),
            },
        },
        "theme" => match parse_arg::<Theme>(arg) {
            Some(theme) => {
                handle.set_theme(theme);
            }
            None => warn!("usage: theme <light|dark|auto>"),
        },
        "status" => {
            if let Some(status) = handle.status().await {
                match serde_json::to_string_pretty(&status) {
                    Ok(json) => println!("{}", json),
                    Err(e) => warn!("Failed to render status: {}", e),
                }
            }
        }
        "help" | "?" => println!("{}", HELP),
        "quit" | "q" | "exit" => return false,
        other => warn!("Unknown command `{}` (try `help`)", other),
    }
    true
}

async fn log_events(mut events: broadcast::Receiver<PlayerEvent>) {
    loop {
        match events.recv().await {
            Ok(PlayerEvent::Progress { .. }) => {}
            Ok(PlayerEvent::TrackChanged { info, .. }) => {
                info!(
                    "Now playing: {} - {} [{}]",
                    info.singer,
                    info.name,
                    format_clock(info.duration)
                );
            }
            Ok(PlayerEvent::LyricLineChanged { text, .. }) => info!("  {}", text),
            Ok(PlayerEvent::ModeChanged { mode, .. }) => info!("Play mode: {}", mode),
            Ok(PlayerEvent::Error { error, .. }) => warn!("Playback error: {}", error),
            Ok(PlayerEvent::Destroyed { .. }) => break,
            Ok(event) => debug!(event = event.event_type(), "Player event"),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
