//! Headless board replay: join a room, load its history into a recording
//! surface and summarize what was drawn.

use inksync_core::surface::DrawOp;
use inksync_core::{
    CompositeMode, ConfigError, DrawSession, RecordingSurface, SessionConfig, Transport,
    TransportError,
};
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Room used when none is configured.
pub const DEFAULT_ROOM: &str = "default";

/// Container width used for the headless layout.
pub const DEFAULT_WIDTH: f64 = 1280.0;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("No relay server configured (set INKSYNC_SERVER or pass it as the first argument)")]
    MissingServer,
    #[error("Timed out after {0:?} waiting for the board history")]
    Timeout(Duration),
}

/// What a replay drew.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub room: String,
    pub peer_id: Option<String>,
    pub width: f64,
    pub height: f64,
    pub strokes: usize,
    pub segments: usize,
    pub dots: usize,
    pub erased: usize,
}

/// Build the configuration from an optional config file, environment
/// variables and positional arguments (`[server] [room]`), later sources
/// taking precedence.
pub fn resolve_config(
    args: &[String],
    env: impl Fn(&str) -> Option<String>,
) -> Result<SessionConfig, AppError> {
    let mut config = match env("INKSYNC_CONFIG") {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(server) = env("INKSYNC_SERVER") {
        config.server = Some(server);
    }
    if let Some(room) = env("INKSYNC_ROOM") {
        config.room = Some(room);
    }
    if let Some(server) = args.first() {
        config.server = Some(server.clone());
    }
    if let Some(room) = args.get(1) {
        config.room = Some(room.clone());
    }
    Ok(config)
}

/// Join the configured room over `transport` and replay its history.
pub fn replay_board<T: Transport + ?Sized>(
    transport: &mut T,
    config: &SessionConfig,
    width: f64,
    timeout: Duration,
) -> Result<ReplaySummary, AppError> {
    let room = config.room.clone().unwrap_or_else(|| DEFAULT_ROOM.to_string());
    let mut session = DrawSession::with_surface(RecordingSurface::new(), config);
    let layout = session.mount(width, 1.0);
    session.join_room(room.clone());

    let started = Instant::now();
    loop {
        session.pump(transport);
        if session.is_joined() && !session.is_loading() {
            break;
        }
        if started.elapsed() >= timeout {
            return Err(AppError::Timeout(timeout));
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    let calls = session.surface().map(|s| s.calls()).unwrap_or_default();
    let summary = ReplaySummary {
        room,
        peer_id: session.local_peer().map(str::to_string),
        width: layout.logical.width,
        height: layout.logical.height,
        strokes: session.last_snapshot().map_or(0, |o| o.strokes_replayed),
        segments: calls.iter().filter(|c| matches!(c.op, DrawOp::Segment(_))).count(),
        dots: calls.iter().filter(|c| c.is_dot()).count(),
        erased: calls
            .iter()
            .filter(|c| c.composite == CompositeMode::DestinationOut)
            .count(),
    };
    log::info!(
        "Replayed {} strokes in room {} ({} segments, {} dots)",
        summary.strokes,
        summary.room,
        summary.segments,
        summary.dots
    );
    Ok(summary)
}
