// Normalized player event taxonomy

use crate::error::PlayerError;
use crate::state::PlaybackState;
use std::fmt;

/// Video dimensions as reported by the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
    /// Rotation the renderer did not apply itself
    pub unapplied_rotation_degrees: i32,
    pub pixel_width_height_ratio: f32,
}

impl VideoSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            unapplied_rotation_degrees: 0,
            pixel_width_height_ratio: 1.0,
        }
    }

    /// Display aspect ratio, 0.0 when height is unknown
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        (self.width as f32 * self.pixel_width_height_ratio) / self.height as f32
    }
}

/// Bits per second
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bitrate(pub u64);

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bps", self.0)
    }
}

/// Informational notifications with no state impact
#[derive(Debug, Clone, PartialEq)]
pub enum InfoEvent {
    /// Renderer dropped frames since the last report
    DroppedFrames { count: u32, elapsed_ms: u64 },

    /// Native info code without a dedicated mapping
    Native { what: i32, extra: i32 },
}

/// Player event types
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Fatal playback error
    Error(PlayerError),

    /// Session reached its first ready state
    Prepared,

    /// Buffering started/finished or buffered amount changed
    BufferStateChanged {
        buffering: bool,
        buffered_percentage: u8,
    },

    /// Playback reached the end of the media
    Completion,

    /// Normalized state changed
    StateChanged {
        play_when_ready: bool,
        state: PlaybackState,
    },

    Info(InfoEvent),

    /// Selected stream bitrate changed
    BitrateChanged { bitrate: Bitrate },

    /// Periodic progress while playing
    Heartbeat { position_ms: u64, duration_ms: u64 },

    VideoSizeChanged(VideoSize),
}

/// Discriminant of a `PlayerEvent`, used to key subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Error,
    Prepared,
    BufferStateChanged,
    Completion,
    StateChanged,
    Info,
    BitrateChanged,
    Heartbeat,
    VideoSizeChanged,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::Error,
        EventKind::Prepared,
        EventKind::BufferStateChanged,
        EventKind::Completion,
        EventKind::StateChanged,
        EventKind::Info,
        EventKind::BitrateChanged,
        EventKind::Heartbeat,
        EventKind::VideoSizeChanged,
    ];
}

impl PlayerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PlayerEvent::Error(_) => EventKind::Error,
            PlayerEvent::Prepared => EventKind::Prepared,
            PlayerEvent::BufferStateChanged { .. } => EventKind::BufferStateChanged,
            PlayerEvent::Completion => EventKind::Completion,
            PlayerEvent::StateChanged { .. } => EventKind::StateChanged,
            PlayerEvent::Info(_) => EventKind::Info,
            PlayerEvent::BitrateChanged { .. } => EventKind::BitrateChanged,
            PlayerEvent::Heartbeat { .. } => EventKind::Heartbeat,
            PlayerEvent::VideoSizeChanged(_) => EventKind::VideoSizeChanged,
        }
    }
}
