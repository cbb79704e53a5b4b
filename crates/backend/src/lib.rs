// Backend adapters
// Each adapter wraps one engine family and turns its native callbacks into
// normalized player events pushed to the shared listener registry.

pub mod adaptive;
pub mod native;
mod session;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use adaptive::AdaptiveAdapter;
pub use native::NativeAdapter;

use twinplay_core::{BackendKind, ContentType, PlaybackState, Result};

/// Uniform control and query surface over one engine family.
///
/// With no live session every control is a no-op and every query returns
/// its default (`0`, `false`, `Idle`).
pub trait BackendAdapter: Send {
    fn kind(&self) -> BackendKind;

    /// Replace any live session with a new one loading `uri`.
    /// Playback starts as soon as the engine is ready.
    fn prepare(&mut self, uri: &str, content_type: ContentType) -> Result<()>;

    fn set_play_when_ready(&mut self, play_when_ready: bool);

    fn play_when_ready(&self) -> bool;

    fn seek_to(&mut self, position_ms: u64);

    /// Stop playback and end the session
    fn stop(&mut self);

    /// Release the engine. Safe from any state, any number of times.
    fn release(&mut self);

    fn playhead_position(&self) -> u64;

    fn media_duration(&self) -> u64;

    fn buffered_percentage(&self) -> u8;

    fn video_width(&self) -> u32;

    fn video_height(&self) -> u32;

    fn playback_state(&self) -> PlaybackState;

    fn has_session(&self) -> bool;
}
