pub mod player;
pub mod registry;
pub mod session;

use serde::Serialize;
use thiserror::Error;

/// One candidate embed-provider URL for a title. Lower `priority` is tried
/// first. Recomputed per request; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamServer {
    pub name: String,
    pub embed_url: String,
    pub priority: u32,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("playback session not found: {0}")]
    NotFound(String),
    #[error("max concurrent playback sessions reached ({0})")]
    MaxSessions(usize),
}

pub use player::{LoadState, PlayerEvent, PlayerState, TimerAction};
pub use registry::{episode_servers, movie_servers, provider_origins};
pub use session::{PlaybackSessionManager, SessionConfig};
