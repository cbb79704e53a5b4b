// Player facade: one control and query surface over whichever backend is active

use crate::config::PlayerConfig;
use crate::heartbeat::HeartbeatThrottle;
use std::sync::Arc;
use std::time::Instant;
use twinplay_backend::{AdaptiveAdapter, BackendAdapter, NativeAdapter};
use twinplay_core::{
    BackendKind, ContentType, PlaybackState, PlayerError, PlayerEvent, PlayerListeners, Result,
};
use twinplay_engine::{AdaptiveEngineFactory, MediaSourceFactory, NativeEngineFactory};

/// Engine family to play through, with the factory that creates its engines
#[derive(Clone)]
pub enum Backend {
    Native(Arc<dyn NativeEngineFactory>),
    Adaptive(Arc<dyn AdaptiveEngineFactory>),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Native(_) => BackendKind::Native,
            Backend::Adaptive(_) => BackendKind::Adaptive,
        }
    }

    fn into_adapter(
        self,
        config: &PlayerConfig,
        listeners: Arc<PlayerListeners>,
    ) -> Box<dyn BackendAdapter> {
        match self {
            Backend::Native(factory) => Box::new(NativeAdapter::new(factory, listeners)),
            Backend::Adaptive(factory) => Box::new(AdaptiveAdapter::new(
                factory,
                MediaSourceFactory::new(config.user_agent.clone()),
                listeners,
            )),
        }
    }
}

/// Application entry point.
///
/// Listeners are registered on `listeners()` and stay registered across
/// `prepare` calls and backend switches. The player keeps no playback state
/// of its own; every query is answered by the active backend.
pub struct Player {
    config: PlayerConfig,
    listeners: Arc<PlayerListeners>,
    adapter: Box<dyn BackendAdapter>,
    heartbeat: HeartbeatThrottle,
}

impl Player {
    pub fn new(backend: Backend, config: PlayerConfig) -> Self {
        crate::init_logging();
        log::info!("Creating player with {} backend", backend.kind());

        let listeners = Arc::new(PlayerListeners::new());
        let adapter = backend.into_adapter(&config, listeners.clone());
        let heartbeat = HeartbeatThrottle::new(config.heartbeat_interval());

        Self {
            config,
            listeners,
            adapter,
            heartbeat,
        }
    }

    pub fn listeners(&self) -> &PlayerListeners {
        &self.listeners
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.adapter.kind()
    }

    /// Release the current backend and continue with `backend`.
    /// Registered listeners carry over.
    pub fn switch_backend(&mut self, backend: Backend) {
        log::info!("Switching backend {} -> {}", self.adapter.kind(), backend.kind());
        self.adapter.release();
        self.adapter = backend.into_adapter(&self.config, self.listeners.clone());
        self.heartbeat.reset();
    }

    /// Start loading `uri`; playback begins once the engine is ready.
    ///
    /// Precondition: a previous session is stopped or released first.
    /// Calling `prepare` again simply replaces it.
    pub fn prepare(&mut self, uri: &str, content_type: ContentType) -> Result<()> {
        self.heartbeat.reset();
        self.adapter.prepare(uri, content_type)
    }

    /// `prepare` with a content type name such as `"mp4"` or `"dash"`
    pub fn prepare_str(&mut self, uri: &str, content_type: &str) -> Result<()> {
        let content_type = content_type.parse::<ContentType>()?;
        self.prepare(uri, content_type)
    }

    pub fn play(&mut self) {
        self.set_play_when_ready(true);
    }

    pub fn pause(&mut self) {
        self.set_play_when_ready(false);
    }

    pub fn set_play_when_ready(&mut self, play_when_ready: bool) {
        self.adapter.set_play_when_ready(play_when_ready);
    }

    pub fn seek_to(&mut self, position_ms: u64) {
        self.adapter.seek_to(position_ms);
    }

    pub fn stop(&mut self) {
        self.adapter.stop();
        self.heartbeat.reset();
    }

    pub fn release(&mut self) {
        self.adapter.release();
        self.heartbeat.reset();
    }

    pub fn is_playing(&self) -> bool {
        self.adapter.play_when_ready() && self.adapter.playback_state() == PlaybackState::Ready
    }

    pub fn play_when_ready(&self) -> bool {
        self.adapter.play_when_ready()
    }

    pub fn playhead_position(&self) -> u64 {
        self.adapter.playhead_position()
    }

    pub fn media_duration(&self) -> u64 {
        self.adapter.media_duration()
    }

    pub fn buffered_percentage(&self) -> u8 {
        self.adapter.buffered_percentage()
    }

    pub fn video_width(&self) -> u32 {
        self.adapter.video_width()
    }

    pub fn video_height(&self) -> u32 {
        self.adapter.video_height()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.adapter.playback_state()
    }

    /// Drive heartbeats from the host loop
    pub fn tick(&self) -> bool {
        self.tick_at(Instant::now())
    }

    /// Emit a heartbeat if playing and the interval has elapsed.
    /// Returns whether one was emitted.
    pub fn tick_at(&self, now: Instant) -> bool {
        if !self.is_playing() || !self.heartbeat.try_beat(now) {
            return false;
        }
        self.listeners.dispatch(&PlayerEvent::Heartbeat {
            position_ms: self.adapter.playhead_position(),
            duration_ms: self.adapter.media_duration(),
        });
        true
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.adapter.release();
    }
}

/// Assembles a `Player` from whichever engine factories the host provides
#[derive(Default)]
pub struct PlayerBuilder {
    config: PlayerConfig,
    native: Option<Arc<dyn NativeEngineFactory>>,
    adaptive: Option<Arc<dyn AdaptiveEngineFactory>>,
}

impl PlayerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: PlayerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn native_factory(mut self, factory: Arc<dyn NativeEngineFactory>) -> Self {
        self.native = Some(factory);
        self
    }

    pub fn adaptive_factory(mut self, factory: Arc<dyn AdaptiveEngineFactory>) -> Self {
        self.adaptive = Some(factory);
        self
    }

    /// Use the configured backend, or the other one if its factory is missing
    pub fn build(self) -> Result<Player> {
        let native = self.native.map(Backend::Native);
        let adaptive = self.adaptive.map(Backend::Adaptive);

        let backend = match self.config.backend {
            BackendKind::Native => native.or(adaptive),
            BackendKind::Adaptive => adaptive.or(native),
        };

        match backend {
            Some(backend) => {
                if backend.kind() != self.config.backend {
                    log::warn!(
                        "{} backend unavailable, falling back to {}",
                        self.config.backend,
                        backend.kind()
                    );
                }
                Ok(Player::new(backend, self.config))
            }
            None => Err(PlayerError::NoEngineFactory),
        }
    }
}
