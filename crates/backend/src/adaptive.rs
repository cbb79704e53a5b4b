// Adapter for the adaptive streaming engine

use crate::session::{BackendSession, SessionContext};
use crate::BackendAdapter;
use std::sync::Arc;
use twinplay_core::{
    BackendKind, Bitrate, ContentType, InfoEvent, PlaybackState, PlayerError, PlayerEvent,
    PlayerListeners, Result, VideoSize,
};
use twinplay_engine::{
    AdaptiveEngine, AdaptiveEngineFactory, AdaptiveEngineListener, MediaSourceFactory,
    VideoFormat,
};

/// Backend adapter over an `AdaptiveEngine`
pub struct AdaptiveAdapter {
    factory: Arc<dyn AdaptiveEngineFactory>,
    sources: MediaSourceFactory,
    context: Arc<SessionContext>,
    session: Option<BackendSession<dyn AdaptiveEngine>>,
}

impl AdaptiveAdapter {
    pub fn new(
        factory: Arc<dyn AdaptiveEngineFactory>,
        sources: MediaSourceFactory,
        listeners: Arc<PlayerListeners>,
    ) -> Self {
        Self {
            factory,
            sources,
            context: Arc::new(SessionContext::new(listeners)),
            session: None,
        }
    }

    fn end_session(&mut self) {
        if self.session.take().is_some() {
            self.context.end();
        }
    }
}

impl BackendAdapter for AdaptiveAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Adaptive
    }

    fn prepare(&mut self, uri: &str, content_type: ContentType) -> Result<()> {
        log::info!("adaptive prepare {} ({})", uri, content_type);
        self.end_session();

        let mut engine = match self.factory.create_engine() {
            Ok(engine) => engine,
            Err(err) => {
                log::error!("failed to create adaptive engine: {}", err);
                return Err(err);
            }
        };

        let generation = self.context.begin();

        // Hooks go in before prepare or the earliest callbacks are lost
        engine.add_listener(Arc::new(AdaptiveForwarder {
            context: self.context.clone(),
            generation,
        }));

        engine.set_play_when_ready(true);
        self.context.set_play_when_ready(true);

        let source = self.sources.create(content_type, uri);
        engine.prepare(source);

        self.session = Some(BackendSession::new(engine, generation));
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

    fn buffered_percentage(&self) -> u8 {
        self.session
            .as_ref()
            .map(|s| s.engine().buffered_percentage())
            .unwrap_or(0)
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

/// Receives raw engine callbacks for one session
struct AdaptiveForwarder {
    context: Arc<SessionContext>,
    generation: u64,
}

impl AdaptiveEngineListener for AdaptiveForwarder {
    fn on_player_state_changed(&self, play_when_ready: bool, state_code: i32) {
        let Some(next) = PlaybackState::from_adaptive_code(state_code) else {
            log::warn!("unknown adaptive state code {}", state_code);
            return;
        };
        self.context.update(self.generation, |state, events| {
            state.apply_state(play_when_ready, next, events)
        });
    }

    fn on_player_error(&self, cause: &str) {
        log::error!("adaptive playback error: {}", cause);
        self.context.update(self.generation, |state, events| {
            state.fail(events);
            events.push(PlayerEvent::Error(PlayerError::playback(cause)));
        });
    }

    fn on_load_error(&self, cause: &str) {
        self.context.load_error(self.generation, cause);
    }

    fn on_video_size_changed(
        &self,
        width: u32,
        height: u32,
        unapplied_rotation_degrees: i32,
        pixel_width_height_ratio: f32,
    ) {
        let size = VideoSize {
            width,
            height,
            unapplied_rotation_degrees,
            pixel_width_height_ratio,
        };
        self.context.update(self.generation, |state, events| {
            state.video_size = Some(size);
            events.push(PlayerEvent::VideoSizeChanged(size));
        });
    }

    fn on_dropped_frames(&self, count: u32, elapsed_ms: u64) {
        self.context.update(self.generation, |_, events| {
            events.push(PlayerEvent::Info(InfoEvent::DroppedFrames {
                count,
                elapsed_ms,
            }));
        });
    }

    fn on_video_input_format_changed(&self, format: &VideoFormat) {
        let Some(bitrate) = format.bitrate.map(Bitrate) else {
            log::debug!("video format without bitrate: {:?}", format.mime_type);
            return;
        };
        self.context.update(self.generation, |state, events| {
            if state.bitrate != Some(bitrate) {
                state.bitrate = Some(bitrate);
                events.push(PlayerEvent::BitrateChanged { bitrate });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineCall, FakeAdaptiveFactory, RecordingListeners};

    fn adapter() -> (AdaptiveAdapter, Arc<FakeAdaptiveFactory>, RecordingListeners) {
        let factory = Arc::new(FakeAdaptiveFactory::new());
        let recording = RecordingListeners::new();
        let adapter = AdaptiveAdapter::new(
            factory.clone(),
            MediaSourceFactory::new("test-agent"),
            recording.listeners(),
        );
        (adapter, factory, recording)
    }

    #[test]
    fn test_queries_without_session() {
        let (adapter, _, _) = adapter();

        assert_eq!(adapter.playhead_position(), 0);
        assert_eq!(adapter.media_duration(), 0);
        assert_eq!(adapter.buffered_percentage(), 0);
        assert_eq!(adapter.video_width(), 0);
        assert_eq!(adapter.video_height(), 0);
        assert!(!adapter.play_when_ready());
        assert_eq!(adapter.playback_state(), PlaybackState::Idle);
    }

    #[test]
    fn test_prepare_attaches_listener_before_prepare() {
        let (mut adapter, factory, _) = adapter();

        adapter
            .prepare("https://cdn.example/movie.mp4", ContentType::H264)
            .unwrap();

        let engine = factory.latest().unwrap();
        let calls = engine.calls();
        let attach = calls.iter().position(|c| *c == EngineCall::AddListener);
        let prepare = calls.iter().position(|c| matches!(c, EngineCall::Prepare(_)));
        assert!(attach.unwrap() < prepare.unwrap());
        assert!(calls.contains(&EngineCall::SetPlayWhenReady(true)));
        assert_eq!(adapter.playback_state(), PlaybackState::Preparing);
    }

    #[test]
    fn test_buffering_then_ready() {
        let (mut adapter, factory, recording) = adapter();
        adapter
            .prepare("https://cdn.example/movie.mp4", ContentType::H264)
            .unwrap();
        let engine = factory.latest().unwrap();

        engine.state_changed(true, PlaybackState::ADAPTIVE_STATE_BUFFERING);
        engine.state_changed(true, PlaybackState::ADAPTIVE_STATE_READY);

        assert_eq!(
            recording.states(),
            vec![PlaybackState::Buffering, PlaybackState::Ready]
        );
        assert_eq!(recording.prepared_count(), 1);
        assert!(recording.errors().is_empty());
        assert_eq!(adapter.playback_state(), PlaybackState::Ready);
    }

    #[test]
    fn test_unknown_state_code_is_ignored() {
        let (mut adapter, factory, recording) = adapter();
        adapter.prepare("https://cdn.example/a.mpd", ContentType::Dash).unwrap();

        factory.latest().unwrap().state_changed(true, 99);

        assert!(recording.states().is_empty());
        assert_eq!(adapter.playback_state(), PlaybackState::Preparing);
    }

    #[test]
    fn test_video_size_cached_and_broadcast() {
        let (mut adapter, factory, recording) = adapter();
        adapter.prepare("https://cdn.example/a.m3u8", ContentType::Hls).unwrap();

        factory
            .latest()
            .unwrap()
            .with_listeners(|l| l.on_video_size_changed(1920, 1080, 90, 1.5));

        assert_eq!(adapter.video_width(), 1920);
        assert_eq!(adapter.video_height(), 1080);
        assert_eq!(
            recording.video_sizes(),
            vec![VideoSize {
                width: 1920,
                height: 1080,
                unapplied_rotation_degrees: 90,
                pixel_width_height_ratio: 1.5,
            }]
        );
    }

    #[test]
    fn test_load_error_goes_to_internal_channel_only() {
        let (mut adapter, factory, recording) = adapter();
        adapter.prepare("https://cdn.example/a.mpd", ContentType::Dash).unwrap();
        let engine = factory.latest().unwrap();

        engine.with_listeners(|l| l.on_load_error("HTTP 404"));
        engine.with_listeners(|l| l.on_player_error("renderer crashed"));

        assert_eq!(recording.load_errors(), vec!["load error: HTTP 404".to_string()]);
        assert_eq!(
            recording.errors(),
            vec!["playback error: renderer crashed".to_string()]
        );
        assert_eq!(adapter.playback_state(), PlaybackState::Errored);
    }

    #[test]
    fn test_errored_survives_later_engine_states() {
        let (mut adapter, factory, recording) = adapter();
        adapter.prepare("https://cdn.example/a.mpd", ContentType::Dash).unwrap();
        let engine = factory.latest().unwrap();

        engine.state_changed(true, PlaybackState::ADAPTIVE_STATE_READY);
        engine.with_listeners(|l| l.on_player_error("decoder failure"));
        engine.state_changed(true, PlaybackState::ADAPTIVE_STATE_IDLE);
        engine.state_changed(true, PlaybackState::ADAPTIVE_STATE_READY);

        assert_eq!(adapter.playback_state(), PlaybackState::Errored);
        assert_eq!(
            recording.states(),
            vec![PlaybackState::Ready, PlaybackState::Errored]
        );
        assert_eq!(recording.errors().len(), 1);
    }

    #[test]
    fn test_new_prepare_leaves_errored() {
        let (mut adapter, factory, recording) = adapter();
        adapter.prepare("https://cdn.example/a.mpd", ContentType::Dash).unwrap();
        factory
            .latest()
            .unwrap()
            .with_listeners(|l| l.on_player_error("decoder failure"));

        adapter.prepare("https://cdn.example/b.mpd", ContentType::Dash).unwrap();
        factory
            .latest()
            .unwrap()
            .state_changed(true, PlaybackState::ADAPTIVE_STATE_READY);

        assert_eq!(adapter.playback_state(), PlaybackState::Ready);
        assert_eq!(
            recording.states(),
            vec![PlaybackState::Errored, PlaybackState::Ready]
        );
    }

    #[test]
    fn test_decoder_lifecycle_hooks_are_swallowed() {
        let (mut adapter, factory, recording) = adapter();
        adapter.prepare("https://cdn.example/a.mpd", ContentType::Dash).unwrap();

        factory.latest().unwrap().with_listeners(|l| {
            l.on_video_enabled();
            l.on_video_decoder_initialized("c2.android.avc.decoder", 10, 5);
            l.on_rendered_first_frame();
            l.on_timeline_changed();
            l.on_tracks_changed();
            l.on_loading_changed(true);
            l.on_position_discontinuity();
            l.on_video_input_format_changed(&VideoFormat::default());
            l.on_video_disabled();
        });

        assert_eq!(recording.total(), 0);
    }

    #[test]
    fn test_bitrate_and_dropped_frames() {
        let (mut adapter, factory, recording) = adapter();
        adapter.prepare("https://cdn.example/a.mpd", ContentType::Dash).unwrap();
        let engine = factory.latest().unwrap();

        let format = VideoFormat {
            bitrate: Some(2_500_000),
            ..VideoFormat::default()
        };
        engine.with_listeners(|l| {
            l.on_video_input_format_changed(&format);
            l.on_video_input_format_changed(&format);
            l.on_dropped_frames(7, 2000);
        });

        assert_eq!(recording.bitrates(), vec![Bitrate(2_500_000)]);
        assert_eq!(
            recording.infos(),
            vec![InfoEvent::DroppedFrames {
                count: 7,
                elapsed_ms: 2000,
            }]
        );
    }

    #[test]
    fn test_controls_without_session_are_noops() {
        let (mut adapter, factory, recording) = adapter();

        adapter.seek_to(1000);
        adapter.set_play_when_ready(true);
        adapter.stop();
        adapter.release();
        adapter.release();

        assert_eq!(factory.created(), 0);
        assert_eq!(recording.total(), 0);
    }

    #[test]
    fn test_release_is_idempotent_and_releases_engine_once() {
        let (mut adapter, factory, recording) = adapter();
        adapter.prepare("https://cdn.example/a.mpd", ContentType::Dash).unwrap();
        let engine = factory.latest().unwrap();

        adapter.release();
        adapter.release();

        assert_eq!(engine.release_count(), 1);
        assert!(!adapter.has_session());
        assert_eq!(recording.total(), 0);
    }

    #[test]
    fn test_stale_session_callbacks_are_dropped() {
        let (mut adapter, factory, recording) = adapter();
        adapter.prepare("https://cdn.example/a.mpd", ContentType::Dash).unwrap();
        let first = factory.latest().unwrap();
        adapter.prepare("https://cdn.example/b.mpd", ContentType::Dash).unwrap();

        first.state_changed(true, PlaybackState::ADAPTIVE_STATE_READY);

        assert_eq!(first.release_count(), 1);
        assert!(recording.states().is_empty());
        assert_eq!(adapter.playback_state(), PlaybackState::Preparing);
    }

    #[test]
    fn test_engine_creation_failure() {
        let (mut adapter, factory, _) = adapter();
        factory.fail_next();

        let result = adapter.prepare("https://cdn.example/a.mpd", ContentType::Dash);

        assert!(result.is_err());
        assert!(!adapter.has_session());
    }

    #[test]
    fn test_queries_delegate_to_engine() {
        let (mut adapter, factory, _) = adapter();
        adapter.prepare("https://cdn.example/a.mpd", ContentType::Dash).unwrap();
        let engine = factory.latest().unwrap();
        engine.set_progress(12_000, 60_000, 40);

        adapter.seek_to(30_000);
        adapter.set_play_when_ready(false);

        assert_eq!(adapter.playhead_position(), 30_000);
        assert_eq!(adapter.media_duration(), 60_000);
        assert_eq!(adapter.buffered_percentage(), 40);
        assert!(!adapter.play_when_ready());
    }
}
