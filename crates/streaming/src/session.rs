//! Server-side playback sessions driving the fallback player.
//!
//! Each session owns one `PlayerState` and at most one pending load timer.
//! The timer is realized as a spawned sleep tagged with the session's epoch;
//! any Restart or Cancel bumps the epoch, so a superseded timer wakes up,
//! sees a newer epoch, and does nothing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::player::{PlayerEvent, PlayerState, TimerAction};
use crate::{SessionError, StreamServer};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long to wait for a load signal before advancing.
    pub load_timeout: Duration,
    /// Sessions untouched for this long are reaped by `cleanup_idle`.
    pub idle_timeout: Duration,
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            load_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(600),
            max_sessions: 256,
        }
    }
}

struct PlaybackSession {
    state: PlayerState,
    epoch: u64,
    last_touched: Instant,
}

/// Manages all active playback sessions.
pub struct PlaybackSessionManager {
    config: SessionConfig,
    sessions: Arc<Mutex<HashMap<String, PlaybackSession>>>,
}

impl PlaybackSessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a session for a server list. Returns the session id and the
    /// initial state snapshot.
    pub async fn create(
        self: &Arc<Self>,
        servers: Vec<StreamServer>,
    ) -> Result<(String, PlayerState), SessionError> {
        let (state, timer) = PlayerState::new(servers);
        let session_id = uuid::Uuid::new_v4().to_string();

        {
            let mut sessions = self.sessions.lock().await;
            if sessions.len() >= self.config.max_sessions {
                return Err(SessionError::MaxSessions(self.config.max_sessions));
            }
            sessions.insert(
                session_id.clone(),
                PlaybackSession {
                    state: state.clone(),
                    epoch: 0,
                    last_touched: Instant::now(),
                },
            );
        }

        if timer == TimerAction::Restart {
            Arc::clone(self).arm_timer(session_id.clone(), 0);
        }

        info!(session_id = %session_id, "playback session created");
        Ok((session_id, state))
    }

    /// Snapshot of a session's state. Touches the session for idle tracking.
    pub async fn get(&self, session_id: &str) -> Result<PlayerState, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.into()))?;
        session.last_touched = Instant::now();
        Ok(session.state.clone())
    }

    /// Apply an externally injected event and manage the load timer
    /// accordingly.
    pub async fn dispatch(
        self: &Arc<Self>,
        session_id: &str,
        event: PlayerEvent,
    ) -> Result<PlayerState, SessionError> {
        let (snapshot, rearm) = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions
                .get_mut(session_id)
                .ok_or_else(|| SessionError::NotFound(session_id.into()))?;
            session.last_touched = Instant::now();

            let action = session.state.apply(event);
            if action != TimerAction::None {
                // Both Restart and Cancel invalidate the pending timer.
                session.epoch += 1;
            }
            let rearm = (action == TimerAction::Restart).then_some(session.epoch);
            (session.state.clone(), rearm)
        };

        if let Some(epoch) = rearm {
            Arc::clone(self).arm_timer(session_id.to_string(), epoch);
        }
        Ok(snapshot)
    }

    /// Discard a session (the player is ephemeral; navigation away drops it).
    pub async fn remove(&self, session_id: &str) -> Result<(), SessionError> {
        if self.sessions.lock().await.remove(session_id).is_some() {
            info!(session_id, "playback session removed");
            Ok(())
        } else {
            Err(SessionError::NotFound(session_id.into()))
        }
    }

    /// Reap idle sessions. Call this periodically.
    pub async fn cleanup_idle(&self) {
        let idle = self.config.idle_timeout;
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.last_touched.elapsed() < idle);
        let reaped = before - sessions.len();
        if reaped > 0 {
            info!(reaped, "cleaned up idle playback sessions");
        }
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn arm_timer(self: Arc<Self>, session_id: String, epoch: u64) {
        let timeout = self.config.load_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;

            let rearm = {
                let mut sessions = self.sessions.lock().await;
                let Some(session) = sessions.get_mut(&session_id) else {
                    return;
                };
                if session.epoch != epoch {
                    // A load or manual switch superseded this timer.
                    debug!(session_id = %session_id, "stale load timer ignored");
                    return;
                }
                let action = session.state.apply(PlayerEvent::TimedOut);
                if action != TimerAction::None {
                    session.epoch += 1;
                }
                (action == TimerAction::Restart).then_some(session.epoch)
            };

            if let Some(next_epoch) = rearm {
                Arc::clone(&self).arm_timer(session_id, next_epoch);
            }
        });
    }
}
