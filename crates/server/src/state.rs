use std::sync::Arc;

use cinehub_streaming::session::PlaybackSessionManager;
use cinehub_tmdb::TmdbClient;

use crate::config::ServerConfig;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub tmdb: Arc<TmdbClient>,
    pub sessions: Arc<PlaybackSessionManager>,
    pub config: Arc<ServerConfig>,
}
