//! Fallback player state machine.
//!
//! Given a ranked server list, the player keeps one server active, detects
//! load failure or timeout, and advances to the next server, looping over
//! the list at most once automatically. Timers and iframe load callbacks
//! are externally injected events; the reducer itself is pure.

use serde::Serialize;

use crate::StreamServer;

/// Load state of the active embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Loading,
    Loaded,
    Failed,
}

/// Externally injected playback events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The embed frame signalled a successful load.
    FrameLoaded,
    /// The embed frame signalled an error.
    FrameFailed,
    /// No load signal arrived within the timeout window.
    TimedOut,
    /// Explicit user "this server doesn't work" report.
    NotWorking,
    /// Explicit user selection of a server by index.
    Select(usize),
}

/// What the driver should do with the pending load timer after an event.
///
/// There is at most one pending timer per session; `Cancel` and `Restart`
/// both invalidate it so a stale timeout never fires against a newer
/// selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    None,
    Restart,
    Cancel,
}

/// Ephemeral per-mount playback state. Discarded on navigation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerState {
    servers: Vec<StreamServer>,
    active_index: usize,
    load_state: LoadState,
    has_looped: bool,
    attempts: u32,
}

impl PlayerState {
    /// Start playback on the highest-priority server. An empty server list
    /// yields a `Failed` state with no active server and no timer.
    pub fn new(mut servers: Vec<StreamServer>) -> (Self, TimerAction) {
        servers.sort_by_key(|s| s.priority);
        let empty = servers.is_empty();
        let state = Self {
            servers,
            active_index: 0,
            load_state: if empty {
                LoadState::Failed
            } else {
                LoadState::Loading
            },
            has_looped: false,
            attempts: 0,
        };
        let timer = if empty {
            TimerAction::None
        } else {
            TimerAction::Restart
        };
        (state, timer)
    }

    pub fn servers(&self) -> &[StreamServer] {
        &self.servers
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// The active server, or `None` when no servers are configured.
    pub fn active(&self) -> Option<&StreamServer> {
        self.servers.get(self.active_index)
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn has_looped(&self) -> bool {
        self.has_looped
    }

    /// Pure reducer: `state × event → state`, plus a timer instruction for
    /// the driver.
    pub fn apply(&mut self, event: PlayerEvent) -> TimerAction {
        if self.servers.is_empty() {
            return TimerAction::None;
        }
        match event {
            PlayerEvent::FrameLoaded => {
                self.load_state = LoadState::Loaded;
                TimerAction::Cancel
            }
            PlayerEvent::TimedOut => {
                // A timeout only matters while still waiting on a load.
                if self.load_state != LoadState::Loading {
                    return TimerAction::None;
                }
                self.advance()
            }
            PlayerEvent::FrameFailed | PlayerEvent::NotWorking => self.advance(),
            PlayerEvent::Select(index) => {
                if index >= self.servers.len() {
                    return TimerAction::None;
                }
                self.active_index = index;
                self.load_state = LoadState::Loading;
                TimerAction::Restart
            }
        }
    }

    fn advance(&mut self) -> TimerAction {
        if self.active_index + 1 < self.servers.len() {
            self.active_index += 1;
            self.attempts += 1;
            self.load_state = LoadState::Loading;
            TimerAction::Restart
        } else if !self.has_looped && self.servers.len() > 1 {
            // Loop back exactly once; a second exhaustion stays put.
            self.active_index = 0;
            self.has_looped = true;
            self.load_state = LoadState::Loading;
            TimerAction::Restart
        } else {
            self.load_state = LoadState::Failed;
            TimerAction::Cancel
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn servers(n: usize) -> Vec<StreamServer> {
        (1..=n)
            .map(|i| StreamServer {
                name: format!("Server {i}"),
                embed_url: format!("https://embed.example/{i}"),
                priority: i as u32,
            })
            .collect()
    }

    #[test]
    fn starts_on_the_highest_priority_server() {
        let mut list = servers(3);
        list.reverse();
        let (state, timer) = PlayerState::new(list);
        assert_eq!(state.active_index(), 0);
        assert_eq!(state.active().unwrap().priority, 1);
        assert_eq!(state.load_state(), LoadState::Loading);
        assert_eq!(timer, TimerAction::Restart);
    }

    #[test]
    fn empty_list_means_no_playback_and_no_timer() {
        let (mut state, timer) = PlayerState::new(Vec::new());
        assert!(state.active().is_none());
        assert_eq!(state.load_state(), LoadState::Failed);
        assert_eq!(timer, TimerAction::None);
        // Events on an empty list are inert.
        assert_eq!(state.apply(PlayerEvent::FrameFailed), TimerAction::None);
        assert_eq!(state.apply(PlayerEvent::Select(0)), TimerAction::None);
    }

    #[test]
    fn successful_load_cancels_the_timer() {
        let (mut state, _) = PlayerState::new(servers(2));
        assert_eq!(state.apply(PlayerEvent::FrameLoaded), TimerAction::Cancel);
        assert_eq!(state.load_state(), LoadState::Loaded);
        assert_eq!(state.active_index(), 0);
    }

    #[test]
    fn failure_advances_to_the_next_server() {
        let (mut state, _) = PlayerState::new(servers(3));
        assert_eq!(state.apply(PlayerEvent::FrameFailed), TimerAction::Restart);
        assert_eq!(state.active_index(), 1);
        assert_eq!(state.load_state(), LoadState::Loading);
    }

    #[test]
    fn single_server_fails_without_looping() {
        let (mut state, _) = PlayerState::new(servers(1));
        assert_eq!(state.apply(PlayerEvent::FrameFailed), TimerAction::Cancel);
        assert_eq!(state.active_index(), 0);
        assert_eq!(state.load_state(), LoadState::Failed);
        assert!(!state.has_looped());
    }

    #[test]
    fn exhaustion_loops_back_exactly_once() {
        let (mut state, _) = PlayerState::new(servers(3));
        // First pass: 0 -> 1 -> 2.
        state.apply(PlayerEvent::FrameFailed);
        state.apply(PlayerEvent::FrameFailed);
        assert_eq!(state.active_index(), 2);
        // Exhausted: loops to 0 once.
        assert_eq!(state.apply(PlayerEvent::FrameFailed), TimerAction::Restart);
        assert_eq!(state.active_index(), 0);
        assert!(state.has_looped());
        assert_eq!(state.load_state(), LoadState::Loading);
        // Second pass: 0 -> 1 -> 2, then stays at the last index, Failed.
        state.apply(PlayerEvent::FrameFailed);
        state.apply(PlayerEvent::FrameFailed);
        assert_eq!(state.apply(PlayerEvent::FrameFailed), TimerAction::Cancel);
        assert_eq!(state.active_index(), 2);
        assert_eq!(state.load_state(), LoadState::Failed);
    }

    #[test]
    fn active_index_stays_in_bounds() {
        let (mut state, _) = PlayerState::new(servers(2));
        for _ in 0..10 {
            state.apply(PlayerEvent::FrameFailed);
            assert!(state.active_index() < state.servers().len());
        }
    }

    #[test]
    fn stale_timeout_is_ignored_after_load() {
        let (mut state, _) = PlayerState::new(servers(2));
        state.apply(PlayerEvent::FrameLoaded);
        assert_eq!(state.apply(PlayerEvent::TimedOut), TimerAction::None);
        assert_eq!(state.load_state(), LoadState::Loaded);
        assert_eq!(state.active_index(), 0);
    }

    #[test]
    fn timeout_while_loading_advances() {
        let (mut state, _) = PlayerState::new(servers(2));
        assert_eq!(state.apply(PlayerEvent::TimedOut), TimerAction::Restart);
        assert_eq!(state.active_index(), 1);
    }

    #[test]
    fn manual_select_restarts_without_touching_the_loop_flag() {
        let (mut state, _) = PlayerState::new(servers(3));
        // Exhaust the list once so the loop flag is set.
        for _ in 0..3 {
            state.apply(PlayerEvent::FrameFailed);
        }
        assert!(state.has_looped());
        assert_eq!(state.apply(PlayerEvent::Select(2)), TimerAction::Restart);
        assert_eq!(state.active_index(), 2);
        assert_eq!(state.load_state(), LoadState::Loading);
        assert!(state.has_looped());
    }

    #[test]
    fn select_out_of_range_is_ignored() {
        let (mut state, _) = PlayerState::new(servers(2));
        assert_eq!(state.apply(PlayerEvent::Select(5)), TimerAction::None);
        assert_eq!(state.active_index(), 0);
    }

    #[test]
    fn manual_retry_still_works_after_exhaustion() {
        let (mut state, _) = PlayerState::new(servers(2));
        // Exhaust with the automatic loop: 0 -> 1 -> loop 0 -> 1 -> Failed.
        for _ in 0..4 {
            state.apply(PlayerEvent::FrameFailed);
        }
        assert_eq!(state.load_state(), LoadState::Failed);
        assert_eq!(state.apply(PlayerEvent::Select(0)), TimerAction::Restart);
        assert_eq!(state.load_state(), LoadState::Loading);
    }

    #[test]
    fn user_report_advances_like_a_failure() {
        let (mut state, _) = PlayerState::new(servers(2));
        state.apply(PlayerEvent::FrameLoaded);
        // Loaded but unplayable; the user reports it.
        assert_eq!(state.apply(PlayerEvent::NotWorking), TimerAction::Restart);
        assert_eq!(state.active_index(), 1);
        assert_eq!(state.load_state(), LoadState::Loading);
    }
}
