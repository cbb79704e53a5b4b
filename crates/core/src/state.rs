// Normalized playback state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized lifecycle stage of the current backend session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// No session, or the session was stopped
    #[default]
    Idle,
    /// `prepare` was issued and the engine has not reported yet
    Preparing,
    /// Engine is waiting for data
    Buffering,
    /// Engine can play from the current position
    Ready,
    /// Playback reached the end of the media
    Ended,
    /// Engine reported a fatal error
    Errored,
}

impl PlaybackState {
    /// Adaptive engine state codes
    pub const ADAPTIVE_STATE_IDLE: i32 = 1;
    pub const ADAPTIVE_STATE_BUFFERING: i32 = 2;
    pub const ADAPTIVE_STATE_READY: i32 = 3;
    pub const ADAPTIVE_STATE_ENDED: i32 = 4;

    /// Map a raw adaptive engine state code. Unknown codes yield `None`.
    pub fn from_adaptive_code(code: i32) -> Option<Self> {
        match code {
            Self::ADAPTIVE_STATE_IDLE => Some(PlaybackState::Idle),
            Self::ADAPTIVE_STATE_BUFFERING => Some(PlaybackState::Buffering),
            Self::ADAPTIVE_STATE_READY => Some(PlaybackState::Ready),
            Self::ADAPTIVE_STATE_ENDED => Some(PlaybackState::Ended),
            _ => None,
        }
    }

    /// No further playback without outside action: a new `prepare` for
    /// `Errored`, a seek or a new `prepare` for `Ended`
    pub fn is_terminal(self) -> bool {
        matches!(self, PlaybackState::Ended | PlaybackState::Errored)
    }

    /// Whether `from -> to` is a transition the state machine expects.
    ///
    /// Unexpected moves out of a terminal state are dropped by the adapters;
    /// anywhere else engines are the source of truth and odd sequences are
    /// only flagged.
    pub fn is_expected_transition(from: PlaybackState, to: PlaybackState) -> bool {
        use PlaybackState::*;

        match (from, to) {
            (Errored, Errored) | (Errored, Preparing) => true,
            (Errored, _) => false,

            (_, Errored) => true,
            (_, Idle) => true,
            (_, Preparing) => true,

            (Preparing, Buffering) | (Preparing, Ready) => true,

            (Buffering, Ready) | (Buffering, Ended) => true,
            (Ready, Buffering) | (Ready, Ended) => true,

            // Seeking after the end restarts buffering
            (Ended, Buffering) | (Ended, Ready) => true,

            (a, b) => a == b,
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Preparing => "preparing",
            PlaybackState::Buffering => "buffering",
            PlaybackState::Ready => "ready",
            PlaybackState::Ended => "ended",
            PlaybackState::Errored => "errored",
        };
        f.write_str(name)
    }
}
