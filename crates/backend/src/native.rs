// Adapter for the platform media player

use crate::session::{BackendSession, SessionContext};
use crate::BackendAdapter;
use std::sync::Arc;
use twinplay_core::{
    BackendKind, ContentType, InfoEvent, PlaybackState, PlayerError, PlayerEvent,
    PlayerListeners, Result, VideoSize,
};
use twinplay_engine::{NativeEngine, NativeEngineFactory, NativeEngineListener};

/// Info codes reported through `on_info`
pub const MEDIA_INFO_VIDEO_RENDERING_START: i32 = 3;
pub const MEDIA_INFO_BUFFERING_START: i32 = 701;
pub const MEDIA_INFO_BUFFERING_END: i32 = 702;

/// Error codes reported through `on_error`
pub const MEDIA_ERROR_UNKNOWN: i32 = 1;
pub const MEDIA_ERROR_SERVER_DIED: i32 = 100;
pub const MEDIA_ERROR_IO: i32 = -1004;
pub const MEDIA_ERROR_MALFORMED: i32 = -1007;
pub const MEDIA_ERROR_UNSUPPORTED: i32 = -1010;
pub const MEDIA_ERROR_TIMED_OUT: i32 = -110;

/// Backend adapter over a `NativeEngine`
pub struct NativeAdapter {
    factory: Arc<dyn NativeEngineFactory>,
    context: Arc<SessionContext>,
    session: Option<BackendSession<dyn NativeEngine>>,
}

impl NativeAdapter {
    pub fn new(factory: Arc<dyn NativeEngineFactory>, listeners: Arc<PlayerListeners>) -> Self {
        Self {
            factory,
            context: Arc::new(SessionContext::new(listeners)),
            session: None,
        }
    }

    pub fn supports(content_type: ContentType) -> bool {
        matches!(content_type, ContentType::H264 | ContentType::Hls)
    }

    fn end_session(&mut self) {
        if self.session.take().is_some() {
            self.context.end();
        }
    }
}

impl BackendAdapter for NativeAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn prepare(&mut self, uri: &str, content_type: ContentType) -> Result<()> {
        log::info!("native prepare {} ({})", uri, content_type);
        if !Self::supports(content_type) {
            return Err(PlayerError::UnsupportedContentType {
                content_type: content_type.to_string(),
                backend: BackendKind::Native.to_string(),
            });
        }

        self.end_session();

        let mut engine = self.factory.create_engine()?;
        let generation = self.context.begin();

        engine.set_listener(Arc::new(NativeForwarder {
            context: self.context.clone(),
            generation,
        }));

        engine.set_play_when_ready(true);
        self.context.set_play_when_ready(true);

        // The engine is released with the session if the data source is refused
        let mut session = BackendSession::new(engine, generation);
        if let Err(err) = session.engine_mut().prepare_async(uri) {
            log::error!("native engine refused {}: {}", uri, err);
            drop(session);
            self.context.end();
            return Err(err);
        }

        self.session = Some(session);
        Ok(())
    }

    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        match &mut self.session {
            Some(session) => {
                session.engine_mut().set_play_when_ready(play_when_ready);
                self.context.set_play_when_ready(play_when_ready);
            }
            None => log::debug!("set_play_when_ready ignored: no session"),
        }
    }

    fn play_when_ready(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.engine().play_when_ready())
            .unwrap_or(false)
    }

    fn seek_to(&mut self, position_ms: u64) {
        match &mut self.session {
            Some(session) => session.engine_mut().seek_to(position_ms),
            None => log::debug!("seek_to ignored: no session"),
        }
    }

    fn stop(&mut self) {
        if let Some(session) = &mut self.session {
            log::info!("stopping session {}", session.generation());
            session.engine_mut().stop();
        }
        self.end_session();
    }

    fn release(&mut self) {
        self.end_session();
    }

    fn playhead_position(&self) -> u64 {
        self.session
            .as_ref()
            .map(|s| s.engine().current_position())
            .unwrap_or(0)
    }

    fn media_duration(&self) -> u64 {
        self.session
            .as_ref()
            .map(|s| s.engine().duration())
            .unwrap_or(0)
    }

    // The platform player only reports buffering through callbacks
    fn buffered_percentage(&self) -> u8 {
        if self.session.is_none() {
            return 0;
        }
        self.context.read(|s| s.buffered_percentage)
    }

    fn video_width(&self) -> u32 {
        if self.session.is_none() {
            return 0;
        }
        self.context
            .read(|s| s.video_size.map(|v| v.width).unwrap_or(0))
    }

    fn video_height(&self) -> u32 {
        if self.session.is_none() {
            return 0;
        }
        self.context
            .read(|s| s.video_size.map(|v| v.height).unwrap_or(0))
    }

    fn playback_state(&self) -> PlaybackState {
        if self.session.is_none() {
            return PlaybackState::Idle;
        }
        self.context.read(|s| s.state)
    }

    fn has_session(&self) -> bool {
        self.session.is_some()
    }
}

struct NativeForwarder {
    context: Arc<SessionContext>,
    generation: u64,
}

impl NativeForwarder {
    fn transition(&self, next: PlaybackState) {
        self.context.update(self.generation, |state, events| {
            let play_when_ready = state.play_when_ready;
            state.apply_state(play_when_ready, next, events)
        });
    }
}

impl NativeEngineListener for NativeForwarder {
    fn on_prepared(&self) {
        self.transition(PlaybackState::Ready);
    }

    fn on_completion(&self) {
        self.transition(PlaybackState::Ended);
    }

    fn on_buffering_update(&self, percent: u8) {
        let percent = percent.min(100);
        self.context.update(self.generation, |state, events| {
            if state.buffered_percentage == percent {
                return;
            }
            state.buffered_percentage = percent;
            events.push(PlayerEvent::BufferStateChanged {
                buffering: state.state == PlaybackState::Buffering,
                buffered_percentage: percent,
            });
        });
    }

    fn on_info(&self, what: i32, extra: i32) {
        match what {
            MEDIA_INFO_BUFFERING_START => self.transition(PlaybackState::Buffering),
            MEDIA_INFO_BUFFERING_END => self.transition(PlaybackState::Ready),
            MEDIA_INFO_VIDEO_RENDERING_START => log::debug!("first frame rendered"),
            _ => self.context.update(self.generation, |_, events| {
                events.push(PlayerEvent::Info(InfoEvent::Native { what, extra }));
            }),
        }
    }

    fn on_error(&self, what: i32, extra: i32) {
        let prepared = self.context.read(|s| s.prepared);
        let load_failure = matches!(extra, MEDIA_ERROR_IO | MEDIA_ERROR_TIMED_OUT);

        if load_failure && !prepared {
            self.context
                .update(self.generation, |state, events| state.fail(events));
            self.context
                .load_error(self.generation, &format!("native error ({}, {})", what, extra));
            return;
        }

        let message = match what {
            MEDIA_ERROR_SERVER_DIED => format!("media server died ({})", extra),
            MEDIA_ERROR_UNKNOWN => format!("unknown error ({})", extra),
            _ => format!("native error ({}, {})", what, extra),
        };
        log::error!("native playback error: {}", message);
        self.context.update(self.generation, |state, events| {
            state.fail(events);
            events.push(PlayerEvent::Error(PlayerError::playback(message)));
        });
    }

    fn on_video_size_changed(&self, width: u32, height: u32) {
        let size = VideoSize::new(width, height);
        self.context.update(self.generation, |state, events| {
            state.video_size = Some(size);
            events.push(PlayerEvent::VideoSizeChanged(size));
        });
    }
}
