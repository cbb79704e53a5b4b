// Engine contracts
// The playback engines are black boxes. Each backend adapter drives one
// engine through these traits and receives its raw callbacks through the
// matching listener trait.

pub mod source;

pub use source::{MediaSource, MediaSourceFactory, SourceKind};

use std::sync::Arc;
use twinplay_core::Result;

/// Controls and queries every engine family provides
pub trait Engine: Send {
    fn set_play_when_ready(&mut self, play_when_ready: bool);

    fn play_when_ready(&self) -> bool;

    /// Seek to a position (in milliseconds)
    fn seek_to(&mut self, position_ms: u64);

    /// Current playhead position in milliseconds
    fn current_position(&self) -> u64;

    /// Media duration in milliseconds, 0 when unknown
    fn duration(&self) -> u64;

    fn stop(&mut self);

    /// Release all engine resources. Called exactly once per engine.
    fn release(&mut self);
}

/// Third-party adaptive streaming engine
pub trait AdaptiveEngine: Engine {
    fn add_listener(&mut self, listener: Arc<dyn AdaptiveEngineListener>);

    /// Begin asynchronous loading of `source`
    fn prepare(&mut self, source: MediaSource);

    /// Buffered position as a percentage of duration (0-100)
    fn buffered_percentage(&self) -> u8;
}

/// Platform media player engine
pub trait NativeEngine: Engine {
    fn set_listener(&mut self, listener: Arc<dyn NativeEngineListener>);

    /// Set the data source and begin asynchronous preparation.
    /// Fails when the engine rejects the data source outright.
    fn prepare_async(&mut self, uri: &str) -> Result<()>;
}

/// Format of the video stream selected by the adaptive engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoFormat {
    pub mime_type: Option<String>,
    pub bitrate: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Raw callbacks of the adaptive engine.
///
/// Engines may call these on their own thread. Hooks with a default body
/// carry nothing the player exposes today.
pub trait AdaptiveEngineListener: Send + Sync {
    fn on_player_state_changed(&self, play_when_ready: bool, state_code: i32);

    fn on_player_error(&self, cause: &str);

    /// Data-source failure while loading
    fn on_load_error(&self, cause: &str);

    fn on_video_size_changed(
        &self,
        width: u32,
        height: u32,
        unapplied_rotation_degrees: i32,
        pixel_width_height_ratio: f32,
    );

    fn on_dropped_frames(&self, count: u32, elapsed_ms: u64);

    fn on_video_input_format_changed(&self, _format: &VideoFormat) {}

    fn on_video_enabled(&self) {}

    fn on_video_disabled(&self) {}

    fn on_video_decoder_initialized(
        &self,
        _decoder_name: &str,
        _initialized_timestamp_ms: u64,
        _initialization_duration_ms: u64,
    ) {
    }

    fn on_rendered_first_frame(&self) {}

    fn on_timeline_changed(&self) {}

    fn on_tracks_changed(&self) {}

    fn on_loading_changed(&self, _is_loading: bool) {}

    fn on_position_discontinuity(&self) {}
}

/// Raw callbacks of the platform media player
pub trait NativeEngineListener: Send + Sync {
    fn on_prepared(&self);

    fn on_completion(&self);

    fn on_buffering_update(&self, percent: u8);

    fn on_info(&self, what: i32, extra: i32);

    fn on_error(&self, what: i32, extra: i32);

    fn on_video_size_changed(&self, width: u32, height: u32);

    fn on_seek_complete(&self) {}
}

/// Creates one adaptive engine per playback session
pub trait AdaptiveEngineFactory: Send + Sync {
    fn create_engine(&self) -> Result<Box<dyn AdaptiveEngine>>;
}

/// Creates one native engine per playback session
pub trait NativeEngineFactory: Send + Sync {
    fn create_engine(&self) -> Result<Box<dyn NativeEngine>>;
}
