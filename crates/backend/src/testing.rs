// Scriptable fake engines and a recording listener registry for tests

use parking_lot::Mutex;
use std::sync::Arc;
use twinplay_core::{
    Bitrate, InfoEvent, LoadError, PlaybackState, PlayerError, PlayerEvent, PlayerListeners,
    Result, VideoSize,
};
use twinplay_engine::{
    AdaptiveEngine, AdaptiveEngineFactory, AdaptiveEngineListener, Engine, MediaSource,
    NativeEngine, NativeEngineFactory, NativeEngineListener,
};

/// Calls an engine received, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    AddListener,
    Prepare(String),
    SetPlayWhenReady(bool),
    SeekTo(u64),
    Stop,
    Release,
}

#[derive(Debug, Default)]
struct FakeEngineState {
    calls: Vec<EngineCall>,
    play_when_ready: bool,
    position_ms: u64,
    duration_ms: u64,
    buffered_percentage: u8,
    source: Option<MediaSource>,
}

/// Engine behaviour shared by both fakes
#[derive(Clone, Default)]
struct FakeEngineCore {
    state: Arc<Mutex<FakeEngineState>>,
}

impl FakeEngineCore {
    fn record(&self, call: EngineCall) {
        self.state.lock().calls.push(call);
    }
}

impl Engine for FakeEngineCore {
    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        let mut state = self.state.lock();
        state.play_when_ready = play_when_ready;
        state.calls.push(EngineCall::SetPlayWhenReady(play_when_ready));
    }

    fn play_when_ready(&self) -> bool {
        self.state.lock().play_when_ready
    }

    fn seek_to(&mut self, position_ms: u64) {
        let mut state = self.state.lock();
        state.position_ms = position_ms;
        state.calls.push(EngineCall::SeekTo(position_ms));
    }

    fn current_position(&self) -> u64 {
        self.state.lock().position_ms
    }

    fn duration(&self) -> u64 {
        self.state.lock().duration_ms
    }

    fn stop(&mut self) {
        self.record(EngineCall::Stop);
    }

    fn release(&mut self) {
        self.record(EngineCall::Release);
    }
}

/// Test-side handle to a fake engine created by a fake factory
pub struct FakeEngineHandle<L: ?Sized> {
    core: FakeEngineCore,
    listeners: Arc<Mutex<Vec<Arc<L>>>>,
}

impl<L: ?Sized> Clone for FakeEngineHandle<L> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            listeners: self.listeners.clone(),
        }
    }
}

impl<L: ?Sized> FakeEngineHandle<L> {
    fn new() -> Self {
        Self {
            core: FakeEngineCore::default(),
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.core.state.lock().calls.clone()
    }

    pub fn release_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == EngineCall::Release)
            .count()
    }

    pub fn set_progress(&self, position_ms: u64, duration_ms: u64, buffered_percentage: u8) {
        let mut state = self.core.state.lock();
        state.position_ms = position_ms;
        state.duration_ms = duration_ms;
        state.buffered_percentage = buffered_percentage;
    }

    pub fn source(&self) -> Option<MediaSource> {
        self.core.state.lock().source.clone()
    }

    /// Invoke every registered hook listener, as the engine thread would
    pub fn with_listeners(&self, f: impl Fn(&L)) {
        let listeners = self.listeners.lock().clone();
        for listener in &listeners {
            f(&**listener);
        }
    }
}

impl FakeEngineHandle<dyn AdaptiveEngineListener> {
    pub fn state_changed(&self, play_when_ready: bool, state_code: i32) {
        self.with_listeners(|l| l.on_player_state_changed(play_when_ready, state_code));
    }
}

impl FakeEngineHandle<dyn NativeEngineListener> {
    pub fn prepared(&self) {
        self.with_listeners(|l| l.on_prepared());
    }

    pub fn info(&self, what: i32, extra: i32) {
        self.with_listeners(|l| l.on_info(what, extra));
    }

    pub fn error(&self, what: i32, extra: i32) {
        self.with_listeners(|l| l.on_error(what, extra));
    }
}

pub type FakeAdaptiveHandle = FakeEngineHandle<dyn AdaptiveEngineListener>;
pub type FakeNativeHandle = FakeEngineHandle<dyn NativeEngineListener>;

struct FakeAdaptiveEngine {
    handle: FakeAdaptiveHandle,
}

impl Engine for FakeAdaptiveEngine {
    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        self.handle.core.set_play_when_ready(play_when_ready)
    }

    fn play_when_ready(&self) -> bool {
        self.handle.core.play_when_ready()
    }

    fn seek_to(&mut self, position_ms: u64) {
        self.handle.core.seek_to(position_ms)
    }

    fn current_position(&self) -> u64 {
        self.handle.core.current_position()
    }

    fn duration(&self) -> u64 {
        self.handle.core.duration()
    }

    fn stop(&mut self) {
        self.handle.core.stop()
    }

    fn release(&mut self) {
        self.handle.core.release()
    }
}

impl AdaptiveEngine for FakeAdaptiveEngine {
    fn add_listener(&mut self, listener: Arc<dyn AdaptiveEngineListener>) {
        self.handle.core.record(EngineCall::AddListener);
        self.handle.listeners.lock().push(listener);
    }

    fn prepare(&mut self, source: MediaSource) {
        let mut state = self.handle.core.state.lock();
        state.calls.push(EngineCall::Prepare(source.uri.clone()));
        state.source = Some(source);
    }

    fn buffered_percentage(&self) -> u8 {
        self.handle.core.state.lock().buffered_percentage
    }
}

struct FakeNativeEngine {
    handle: FakeNativeHandle,
    reject_data_source: bool,
}

impl Engine for FakeNativeEngine {
    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        self.handle.core.set_play_when_ready(play_when_ready)
    }

    fn play_when_ready(&self) -> bool {
        self.handle.core.play_when_ready()
    }

    fn seek_to(&mut self, position_ms: u64) {
        self.handle.core.seek_to(position_ms)
    }

    fn current_position(&self) -> u64 {
        self.handle.core.current_position()
    }

    fn duration(&self) -> u64 {
        self.handle.core.duration()
    }

    fn stop(&mut self) {
        self.handle.core.stop()
    }

    fn release(&mut self) {
        self.handle.core.release()
    }
}

impl NativeEngine for FakeNativeEngine {
    fn set_listener(&mut self, listener: Arc<dyn NativeEngineListener>) {
        self.handle.core.record(EngineCall::AddListener);
        *self.handle.listeners.lock() = vec![listener];
    }

    fn prepare_async(&mut self, uri: &str) -> Result<()> {
        if self.reject_data_source {
            return Err(PlayerError::DataSource(format!("cannot open {}", uri)));
        }
        self.handle.core.record(EngineCall::Prepare(uri.to_string()));
        Ok(())
    }
}

struct FactoryState<L: ?Sized> {
    created: Vec<FakeEngineHandle<L>>,
    fail_next: bool,
    reject_data_source: bool,
}

/// Hands out fake adaptive engines and keeps a handle to each
pub struct FakeAdaptiveFactory {
    state: Mutex<FactoryState<dyn AdaptiveEngineListener>>,
}

impl FakeAdaptiveFactory {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FactoryState {
                created: Vec::new(),
                fail_next: false,
                reject_data_source: false,
            }),
        }
    }

    /// The next `create_engine` call fails
    pub fn fail_next(&self) {
        self.state.lock().fail_next = true;
    }

    pub fn latest(&self) -> Option<FakeAdaptiveHandle> {
        self.state.lock().created.last().cloned()
    }

    pub fn created(&self) -> usize {
        self.state.lock().created.len()
    }
}

impl Default for FakeAdaptiveFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl AdaptiveEngineFactory for FakeAdaptiveFactory {
    fn create_engine(&self) -> Result<Box<dyn AdaptiveEngine>> {
        let mut state = self.state.lock();
        if std::mem::take(&mut state.fail_next) {
            return Err(PlayerError::playback("engine unavailable"));
        }
        let handle = FakeEngineHandle::new();
        state.created.push(handle.clone());
        Ok(Box::new(FakeAdaptiveEngine { handle }))
    }
}

/// Hands out fake native engines and keeps a handle to each
pub struct FakeNativeFactory {
    state: Mutex<FactoryState<dyn NativeEngineListener>>,
}

impl FakeNativeFactory {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FactoryState {
                created: Vec::new(),
                fail_next: false,
                reject_data_source: false,
            }),
        }
    }

    /// Engines created from now on refuse their data source
    pub fn reject_data_source(&self) {
        self.state.lock().reject_data_source = true;
    }

    pub fn latest(&self) -> Option<FakeNativeHandle> {
        self.state.lock().created.last().cloned()
    }

    pub fn created(&self) -> usize {
        self.state.lock().created.len()
    }
}

impl Default for FakeNativeFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeEngineFactory for FakeNativeFactory {
    fn create_engine(&self) -> Result<Box<dyn NativeEngine>> {
        let mut state = self.state.lock();
        if std::mem::take(&mut state.fail_next) {
            return Err(PlayerError::playback("engine unavailable"));
        }
        let handle = FakeEngineHandle::new();
        state.created.push(handle.clone());
        Ok(Box::new(FakeNativeEngine {
            handle,
            reject_data_source: state.reject_data_source,
        }))
    }
}

/// Listener registry that records everything delivered to it
#[derive(Clone)]
pub struct RecordingListeners {
    listeners: Arc<PlayerListeners>,
    events: Arc<Mutex<Vec<PlayerEvent>>>,
    load_errors: Arc<Mutex<Vec<LoadError>>>,
}

impl RecordingListeners {
    pub fn new() -> Self {
        let recording = Self {
            listeners: Arc::new(PlayerListeners::new()),
            events: Arc::new(Mutex::new(Vec::new())),
            load_errors: Arc::new(Mutex::new(Vec::new())),
        };
        recording.attach(&recording.listeners);
        recording
    }

    /// Subscribe recorders for every kind on `listeners`
    pub fn attach(&self, listeners: &PlayerListeners) {
        let events = self.events.clone();
        listeners.add_error_listener(Arc::new(move |e: &PlayerError| {
            events.lock().push(PlayerEvent::Error(e.clone()))
        }));
        let events = self.events.clone();
        listeners.add_prepared_listener(Arc::new(move || events.lock().push(PlayerEvent::Prepared)));
        let events = self.events.clone();
        listeners.add_buffer_state_listener(Arc::new(move |buffering: bool, percentage: u8| {
            events.lock().push(PlayerEvent::BufferStateChanged {
                buffering,
                buffered_percentage: percentage,
            })
        }));
        let events = self.events.clone();
        listeners.add_completion_listener(Arc::new(move || {
            events.lock().push(PlayerEvent::Completion)
        }));
        let events = self.events.clone();
        listeners.add_state_changed_listener(Arc::new(
            move |play_when_ready: bool, state: PlaybackState| {
                events.lock().push(PlayerEvent::StateChanged {
                    play_when_ready,
                    state,
                })
            },
        ));
        let events = self.events.clone();
        listeners.add_info_listener(Arc::new(move |info: &InfoEvent| {
            events.lock().push(PlayerEvent::Info(info.clone()))
        }));
        let events = self.events.clone();
        listeners.add_bitrate_changed_listener(Arc::new(move |bitrate: Bitrate| {
            events.lock().push(PlayerEvent::BitrateChanged { bitrate })
        }));
        let events = self.events.clone();
        listeners.add_heartbeat_listener(Arc::new(move |position_ms: u64, duration_ms: u64| {
            events.lock().push(PlayerEvent::Heartbeat {
                position_ms,
                duration_ms,
            })
        }));
        let events = self.events.clone();
        listeners.add_video_size_changed_listener(Arc::new(move |size: VideoSize| {
            events.lock().push(PlayerEvent::VideoSizeChanged(size))
        }));
        let load_errors = self.load_errors.clone();
        listeners.add_internal_error_listener(Arc::new(move |e: &LoadError| {
            load_errors.lock().push(e.clone())
        }));
    }

    pub fn listeners(&self) -> Arc<PlayerListeners> {
        self.listeners.clone()
    }

    pub fn events(&self) -> Vec<PlayerEvent> {
        self.events.lock().clone()
    }

    pub fn total(&self) -> usize {
        self.events.lock().len() + self.load_errors.lock().len()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
        self.load_errors.lock().clear();
    }

    pub fn states(&self) -> Vec<PlaybackState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PlayerEvent::StateChanged { state, .. } => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn prepared_count(&self) -> usize {
        self.count(|e| matches!(e, PlayerEvent::Prepared))
    }

    pub fn completion_count(&self) -> usize {
        self.count(|e| matches!(e, PlayerEvent::Completion))
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PlayerEvent::Error(err) => Some(err.to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn load_errors(&self) -> Vec<String> {
        self.load_errors
            .lock()
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    pub fn buffer_states(&self) -> Vec<(bool, u8)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PlayerEvent::BufferStateChanged {
                    buffering,
                    buffered_percentage,
                } => Some((buffering, buffered_percentage)),
                _ => None,
            })
            .collect()
    }

    pub fn video_sizes(&self) -> Vec<VideoSize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PlayerEvent::VideoSizeChanged(size) => Some(size),
                _ => None,
            })
            .collect()
    }

    pub fn bitrates(&self) -> Vec<Bitrate> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PlayerEvent::BitrateChanged { bitrate } => Some(bitrate),
                _ => None,
            })
            .collect()
    }

    pub fn infos(&self) -> Vec<InfoEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PlayerEvent::Info(info) => Some(info),
                _ => None,
            })
            .collect()
    }

    pub fn heartbeats(&self) -> Vec<(u64, u64)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PlayerEvent::Heartbeat {
                    position_ms,
                    duration_ms,
                } => Some((position_ms, duration_ms)),
                _ => None,
            })
            .collect()
    }

    fn count(&self, f: impl Fn(&PlayerEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| f(e)).count()
    }
}

impl Default for RecordingListeners {
    fn default() -> Self {
        Self::new()
    }
}
