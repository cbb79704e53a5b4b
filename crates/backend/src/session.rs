// Backend session ownership and the state shared with engine hooks

use parking_lot::Mutex;
use std::sync::Arc;
use twinplay_core::{Bitrate, LoadError, PlaybackState, PlayerEvent, PlayerListeners, VideoSize};
use twinplay_engine::Engine;

/// The live engine for one `prepare` call.
///
/// Dropping the session releases the engine, so release runs exactly once
/// whether the session ends through `stop`, `release` or a new `prepare`.
pub(crate) struct BackendSession<E: ?Sized + Engine> {
    engine: Box<E>,
    generation: u64,
}

impl<E: ?Sized + Engine> BackendSession<E> {
    pub(crate) fn new(engine: Box<E>, generation: u64) -> Self {
        Self { engine, generation }
    }

    pub(crate) fn engine(&self) -> &E {
        &self.engine
    }

    pub(crate) fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

impl<E: ?Sized + Engine> Drop for BackendSession<E> {
    fn drop(&mut self) {
        log::info!("releasing engine for session {}", self.generation);
        self.engine.release();
    }
}

/// Cached values observed from engine callbacks
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionState {
    pub generation: u64,
    pub state: PlaybackState,
    pub play_when_ready: bool,
    pub video_size: Option<VideoSize>,
    pub buffered_percentage: u8,
    pub bitrate: Option<Bitrate>,
    /// First `Ready` of the session was reported
    pub prepared: bool,
    last_reported: Option<(bool, PlaybackState)>,
}

impl SessionState {
    /// Apply an engine-observed state and collect the events it implies.
    /// A repeated `(play_when_ready, state)` pair reports nothing.
    pub(crate) fn apply_state(
        &mut self,
        play_when_ready: bool,
        next: PlaybackState,
        events: &mut Vec<PlayerEvent>,
    ) {
        let previous = self.state;
        if !PlaybackState::is_expected_transition(previous, next) {
            if previous.is_terminal() {
                log::debug!("ignoring {} while {}", next, previous);
                return;
            }
            log::warn!("unexpected state transition {} -> {}", previous, next);
        }

        self.state = next;
        self.play_when_ready = play_when_ready;

        if self.last_reported == Some((play_when_ready, next)) {
            return;
        }
        self.last_reported = Some((play_when_ready, next));

        events.push(PlayerEvent::StateChanged {
            play_when_ready,
            state: next,
        });

        if previous != PlaybackState::Buffering && next == PlaybackState::Buffering {
            events.push(PlayerEvent::BufferStateChanged {
                buffering: true,
                buffered_percentage: self.buffered_percentage,
            });
        } else if previous == PlaybackState::Buffering && next != PlaybackState::Buffering {
            events.push(PlayerEvent::BufferStateChanged {
                buffering: false,
                buffered_percentage: self.buffered_percentage,
            });
        }

        if next == PlaybackState::Ready && !self.prepared {
            self.prepared = true;
            events.push(PlayerEvent::Prepared);
        }

        if next == PlaybackState::Ended && previous != PlaybackState::Ended {
            events.push(PlayerEvent::Completion);
        }
    }

    /// Enter `Errored` and report it like any other state change.
    /// Engine states that follow are ignored until the next session.
    pub(crate) fn fail(&mut self, events: &mut Vec<PlayerEvent>) {
        let play_when_ready = self.play_when_ready;
        self.apply_state(play_when_ready, PlaybackState::Errored, events);
    }
}

/// State and registry shared between an adapter and its hook forwarders
pub(crate) struct SessionContext {
    state: Mutex<SessionState>,
    listeners: Arc<PlayerListeners>,
}

impl SessionContext {
    pub(crate) fn new(listeners: Arc<PlayerListeners>) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            listeners,
        }
    }

    /// Start tracking a new session; hooks from older sessions go stale
    pub(crate) fn begin(&self) -> u64 {
        let mut state = self.state.lock();
        let generation = state.generation + 1;
        *state = SessionState {
            generation,
            state: PlaybackState::Preparing,
            ..SessionState::default()
        };
        generation
    }

    /// Forget the current session without starting a new one
    pub(crate) fn end(&self) {
        let mut state = self.state.lock();
        let generation = state.generation + 1;
        *state = SessionState {
            generation,
            ..SessionState::default()
        };
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.state.lock())
    }

    pub(crate) fn set_play_when_ready(&self, play_when_ready: bool) {
        self.state.lock().play_when_ready = play_when_ready;
    }

    /// Run `f` against the cache if `generation` is still current, then
    /// deliver whatever events it produced with the lock released.
    pub(crate) fn update(
        &self,
        generation: u64,
        f: impl FnOnce(&mut SessionState, &mut Vec<PlayerEvent>),
    ) {
        let mut events = Vec::new();
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                log::debug!(
                    "ignoring callback from stale session {} (current {})",
                    generation,
                    state.generation
                );
                return;
            }
            f(&mut state, &mut events);
        }

        for event in &events {
            self.listeners.dispatch(event);
        }
    }

    pub(crate) fn load_error(&self, generation: u64, cause: &str) {
        if self.state.lock().generation != generation {
            return;
        }
        log::warn!("load error: {}", cause);
        self.listeners.dispatch_internal_error(&LoadError::new(cause));
    }
}
