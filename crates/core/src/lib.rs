// Core types for the twinplay player facade: errors, normalized state,
// the event taxonomy and the listener registry.

pub mod error;
pub mod event;
pub mod listeners;
pub mod media;
pub mod state;

// Re-export commonly used types
pub use error::{LoadError, PlayerError, Result};
pub use event::{Bitrate, EventKind, InfoEvent, PlayerEvent, VideoSize};
pub use listeners::{
    BitrateChangedListener, BufferStateListener, CompletionListener, ErrorListener,
    HeartbeatListener, InfoListener, InternalErrorListener, ListenerSet, PlayerListeners,
    PreparedListener, StateChangedListener, VideoSizeChangedListener,
};
pub use media::{BackendKind, ContentType};
pub use state::PlaybackState;
