// Listener registry: per-kind subscriber sets with snapshot dispatch
// Listeners may add or remove subscriptions (including themselves) while an
// event is being delivered; the in-flight delivery keeps its snapshot.

use crate::error::{LoadError, PlayerError};
use crate::event::{Bitrate, EventKind, InfoEvent, PlayerEvent, VideoSize};
use crate::state::PlaybackState;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Listener traits
/// Implementations should be lightweight and non-blocking: they run on the
/// engine's callback thread.
pub trait ErrorListener: Send + Sync {
    fn on_error(&self, error: &PlayerError);
}

pub trait PreparedListener: Send + Sync {
    fn on_prepared(&self);
}

pub trait BufferStateListener: Send + Sync {
    fn on_buffer_state_changed(&self, buffering: bool, buffered_percentage: u8);
}

pub trait CompletionListener: Send + Sync {
    fn on_completion(&self);
}

pub trait StateChangedListener: Send + Sync {
    fn on_state_changed(&self, play_when_ready: bool, state: PlaybackState);
}

pub trait InfoListener: Send + Sync {
    fn on_info(&self, info: &InfoEvent);
}

pub trait BitrateChangedListener: Send + Sync {
    fn on_bitrate_changed(&self, bitrate: Bitrate);
}

pub trait HeartbeatListener: Send + Sync {
    fn on_heartbeat(&self, position_ms: u64, duration_ms: u64);
}

pub trait VideoSizeChangedListener: Send + Sync {
    fn on_video_size_changed(&self, size: VideoSize);
}

/// Receives load/IO failures from the data-source layer
pub trait InternalErrorListener: Send + Sync {
    fn on_load_error(&self, error: &LoadError);
}

impl<F> ErrorListener for F
where
    F: Fn(&PlayerError) + Send + Sync,
{
    fn on_error(&self, error: &PlayerError) {
        self(error)
    }
}

impl<F> PreparedListener for F
where
    F: Fn() + Send + Sync,
{
    fn on_prepared(&self) {
        self()
    }
}

impl<F> BufferStateListener for F
where
    F: Fn(bool, u8) + Send + Sync,
{
    fn on_buffer_state_changed(&self, buffering: bool, buffered_percentage: u8) {
        self(buffering, buffered_percentage)
    }
}

impl<F> CompletionListener for F
where
    F: Fn() + Send + Sync,
{
    fn on_completion(&self) {
        self()
    }
}

impl<F> StateChangedListener for F
where
    F: Fn(bool, PlaybackState) + Send + Sync,
{
    fn on_state_changed(&self, play_when_ready: bool, state: PlaybackState) {
        self(play_when_ready, state)
    }
}

impl<F> InfoListener for F
where
    F: Fn(&InfoEvent) + Send + Sync,
{
    fn on_info(&self, info: &InfoEvent) {
        self(info)
    }
}

impl<F> BitrateChangedListener for F
where
    F: Fn(Bitrate) + Send + Sync,
{
    fn on_bitrate_changed(&self, bitrate: Bitrate) {
        self(bitrate)
    }
}

impl<F> HeartbeatListener for F
where
    F: Fn(u64, u64) + Send + Sync,
{
    fn on_heartbeat(&self, position_ms: u64, duration_ms: u64) {
        self(position_ms, duration_ms)
    }
}

impl<F> VideoSizeChangedListener for F
where
    F: Fn(VideoSize) + Send + Sync,
{
    fn on_video_size_changed(&self, size: VideoSize) {
        self(size)
    }
}

impl<F> InternalErrorListener for F
where
    F: Fn(&LoadError) + Send + Sync,
{
    fn on_load_error(&self, error: &LoadError) {
        self(error)
    }
}

/// Copy-on-write list of listener handles.
///
/// The lock only guards the pointer to the current list. Dispatch takes a
/// snapshot and releases the lock before calling anyone, so mutation during
/// delivery clones the list instead of disturbing the iteration.
pub struct ListenerSet<L: ?Sized> {
    listeners: Mutex<Arc<Vec<Arc<L>>>>,
}

impl<L: ?Sized> ListenerSet<L> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Arc::new(Vec::new())),
        }
    }

    /// Register a handle. Registering the same handle twice delivers twice.
    pub fn add(&self, listener: Arc<L>) {
        let mut current = self.listeners.lock();
        Arc::make_mut(&mut current).push(listener);
    }

    /// Remove every registration of `listener`. Unknown handles are ignored.
    pub fn remove(&self, listener: &Arc<L>) {
        let mut current = self.listeners.lock();
        if !current.iter().any(|l| same_listener(l, listener)) {
            return;
        }
        Arc::make_mut(&mut current).retain(|l| !same_listener(l, listener));
    }

    pub fn contains(&self, listener: &Arc<L>) -> bool {
        self.listeners
            .lock()
            .iter()
            .any(|l| same_listener(l, listener))
    }

    /// Current subscribers; later mutation does not affect the returned list
    pub fn snapshot(&self) -> Arc<Vec<Arc<L>>> {
        self.listeners.lock().clone()
    }

    /// Call `f` for each subscriber in a snapshot taken now
    pub fn for_each(&self, mut f: impl FnMut(&L)) {
        let snapshot = self.snapshot();
        for listener in snapshot.iter() {
            f(listener);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    pub fn clear(&self) {
        *self.listeners.lock() = Arc::new(Vec::new());
    }
}

impl<L: ?Sized> Default for ListenerSet<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> fmt::Debug for ListenerSet<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.len())
            .finish()
    }
}

// Handle identity is the data pointer; vtable pointers are not stable
fn same_listener<L: ?Sized>(a: &Arc<L>, b: &Arc<L>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Registry of every listener kind the player exposes
#[derive(Default)]
pub struct PlayerListeners {
    error: ListenerSet<dyn ErrorListener>,
    prepared: ListenerSet<dyn PreparedListener>,
    buffer_state: ListenerSet<dyn BufferStateListener>,
    completion: ListenerSet<dyn CompletionListener>,
    state_changed: ListenerSet<dyn StateChangedListener>,
    info: ListenerSet<dyn InfoListener>,
    bitrate_changed: ListenerSet<dyn BitrateChangedListener>,
    heartbeat: ListenerSet<dyn HeartbeatListener>,
    video_size_changed: ListenerSet<dyn VideoSizeChangedListener>,
    internal_error: ListenerSet<dyn InternalErrorListener>,
}

impl PlayerListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error_listener(&self, listener: Arc<dyn ErrorListener>) {
        self.error.add(listener);
    }

    pub fn remove_error_listener(&self, listener: &Arc<dyn ErrorListener>) {
        self.error.remove(listener);
    }

    pub fn add_prepared_listener(&self, listener: Arc<dyn PreparedListener>) {
        self.prepared.add(listener);
    }

    pub fn remove_prepared_listener(&self, listener: &Arc<dyn PreparedListener>) {
        self.prepared.remove(listener);
    }

    pub fn add_buffer_state_listener(&self, listener: Arc<dyn BufferStateListener>) {
        self.buffer_state.add(listener);
    }

    pub fn remove_buffer_state_listener(&self, listener: &Arc<dyn BufferStateListener>) {
        self.buffer_state.remove(listener);
    }

    pub fn add_completion_listener(&self, listener: Arc<dyn CompletionListener>) {
        self.completion.add(listener);
    }

    pub fn remove_completion_listener(&self, listener: &Arc<dyn CompletionListener>) {
        self.completion.remove(listener);
    }

    pub fn add_state_changed_listener(&self, listener: Arc<dyn StateChangedListener>) {
        self.state_changed.add(listener);
    }

    pub fn remove_state_changed_listener(&self, listener: &Arc<dyn StateChangedListener>) {
        self.state_changed.remove(listener);
    }

    pub fn add_info_listener(&self, listener: Arc<dyn InfoListener>) {
        self.info.add(listener);
    }

    pub fn remove_info_listener(&self, listener: &Arc<dyn InfoListener>) {
        self.info.remove(listener);
    }

    pub fn add_bitrate_changed_listener(&self, listener: Arc<dyn BitrateChangedListener>) {
        self.bitrate_changed.add(listener);
    }

    pub fn remove_bitrate_changed_listener(&self, listener: &Arc<dyn BitrateChangedListener>) {
        self.bitrate_changed.remove(listener);
    }

    pub fn add_heartbeat_listener(&self, listener: Arc<dyn HeartbeatListener>) {
        self.heartbeat.add(listener);
    }

    pub fn remove_heartbeat_listener(&self, listener: &Arc<dyn HeartbeatListener>) {
        self.heartbeat.remove(listener);
    }

    pub fn add_video_size_changed_listener(&self, listener: Arc<dyn VideoSizeChangedListener>) {
        self.video_size_changed.add(listener);
    }

    pub fn remove_video_size_changed_listener(
        &self,
        listener: &Arc<dyn VideoSizeChangedListener>,
    ) {
        self.video_size_changed.remove(listener);
    }

    pub fn add_internal_error_listener(&self, listener: Arc<dyn InternalErrorListener>) {
        self.internal_error.add(listener);
    }

    pub fn remove_internal_error_listener(&self, listener: &Arc<dyn InternalErrorListener>) {
        self.internal_error.remove(listener);
    }

    /// Deliver `event` to every subscriber of its kind, on the calling thread
    pub fn dispatch(&self, event: &PlayerEvent) {
        log::trace!("dispatch {:?}", event);

        match event {
            PlayerEvent::Error(error) => self.error.for_each(|l| l.on_error(error)),
            PlayerEvent::Prepared => self.prepared.for_each(|l| l.on_prepared()),
            PlayerEvent::BufferStateChanged {
                buffering,
                buffered_percentage,
            } => self
                .buffer_state
                .for_each(|l| l.on_buffer_state_changed(*buffering, *buffered_percentage)),
            PlayerEvent::Completion => self.completion.for_each(|l| l.on_completion()),
            PlayerEvent::StateChanged {
                play_when_ready,
                state,
            } => self
                .state_changed
                .for_each(|l| l.on_state_changed(*play_when_ready, *state)),
            PlayerEvent::Info(info) => self.info.for_each(|l| l.on_info(info)),
            PlayerEvent::BitrateChanged { bitrate } => self
                .bitrate_changed
                .for_each(|l| l.on_bitrate_changed(*bitrate)),
            PlayerEvent::Heartbeat {
                position_ms,
                duration_ms,
            } => self
                .heartbeat
                .for_each(|l| l.on_heartbeat(*position_ms, *duration_ms)),
            PlayerEvent::VideoSizeChanged(size) => self
                .video_size_changed
                .for_each(|l| l.on_video_size_changed(*size)),
        }
    }

    /// Deliver a load failure on the internal error channel
    pub fn dispatch_internal_error(&self, error: &LoadError) {
        log::trace!("dispatch internal {:?}", error);
        self.internal_error.for_each(|l| l.on_load_error(error));
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::Error => self.error.len(),
            EventKind::Prepared => self.prepared.len(),
            EventKind::BufferStateChanged => self.buffer_state.len(),
            EventKind::Completion => self.completion.len(),
            EventKind::StateChanged => self.state_changed.len(),
            EventKind::Info => self.info.len(),
            EventKind::BitrateChanged => self.bitrate_changed.len(),
            EventKind::Heartbeat => self.heartbeat.len(),
            EventKind::VideoSizeChanged => self.video_size_changed.len(),
        }
    }

    pub fn internal_error_listener_count(&self) -> usize {
        self.internal_error.len()
    }

    /// Drop every subscription, internal channel included
    pub fn clear(&self) {
        self.error.clear();
        self.prepared.clear();
        self.buffer_state.clear();
        self.completion.clear();
        self.state_changed.clear();
        self.info.clear();
        self.bitrate_changed.clear();
        self.heartbeat.clear();
        self.video_size_changed.clear();
        self.internal_error.clear();
    }
}

impl fmt::Debug for PlayerListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("PlayerListeners");
        for kind in EventKind::ALL {
            s.field(&format!("{:?}", kind), &self.listener_count(kind));
        }
        s.field("InternalError", &self.internal_error.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Weak;

    /// Records state changes, tagged with its name
    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<(&'static str, PlaybackState)>>>,
    }

    impl StateChangedListener for Recorder {
        fn on_state_changed(&self, _play_when_ready: bool, state: PlaybackState) {
            self.log.lock().push((self.name, state));
        }
    }

    fn recorder(
        name: &'static str,
        log: &Arc<Mutex<Vec<(&'static str, PlaybackState)>>>,
    ) -> Arc<dyn StateChangedListener> {
        Arc::new(Recorder {
            name,
            log: log.clone(),
        })
    }

    fn state_event(state: PlaybackState) -> PlayerEvent {
        PlayerEvent::StateChanged {
            play_when_ready: true,
            state,
        }
    }

    #[test]
    fn test_dispatch_reaches_only_matching_kind() {
        let listeners = PlayerListeners::new();
        let errors = Arc::new(Mutex::new(0));
        let prepared = Arc::new(Mutex::new(0));

        let errors_clone = errors.clone();
        listeners.add_error_listener(Arc::new(move |_: &PlayerError| {
            *errors_clone.lock() += 1;
        }));
        let prepared_clone = prepared.clone();
        listeners.add_prepared_listener(Arc::new(move || {
            *prepared_clone.lock() += 1;
        }));

        listeners.dispatch(&PlayerEvent::Prepared);
        listeners.dispatch(&PlayerEvent::Completion);

        assert_eq!(*errors.lock(), 0);
        assert_eq!(*prepared.lock(), 1);
    }

    #[test]
    fn test_duplicate_registration_delivers_twice_and_remove_drops_both() {
        let listeners = PlayerListeners::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = recorder("a", &log);

        listeners.add_state_changed_listener(a.clone());
        listeners.add_state_changed_listener(a.clone());
        listeners.dispatch(&state_event(PlaybackState::Ready));
        assert_eq!(log.lock().len(), 2);

        listeners.remove_state_changed_listener(&a);
        assert_eq!(listeners.listener_count(EventKind::StateChanged), 0);
        listeners.dispatch(&state_event(PlaybackState::Ended));
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn test_remove_unregistered_is_noop() {
        let listeners = PlayerListeners::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = recorder("a", &log);
        let b = recorder("b", &log);

        listeners.add_state_changed_listener(a.clone());
        listeners.remove_state_changed_listener(&b);
        listeners.remove_state_changed_listener(&b);

        listeners.dispatch(&state_event(PlaybackState::Buffering));
        assert_eq!(*log.lock(), vec![("a", PlaybackState::Buffering)]);
    }

    /// Removes a target handle (possibly itself) when called
    struct Remover {
        listeners: Weak<PlayerListeners>,
        target: Mutex<Option<Arc<dyn StateChangedListener>>>,
        calls: Mutex<u32>,
    }

    impl StateChangedListener for Remover {
        fn on_state_changed(&self, _play_when_ready: bool, _state: PlaybackState) {
            *self.calls.lock() += 1;
            if let (Some(listeners), Some(target)) =
                (self.listeners.upgrade(), self.target.lock().as_ref())
            {
                listeners.remove_state_changed_listener(target);
            }
        }
    }

    #[test]
    fn test_self_removal_during_dispatch() {
        let listeners = Arc::new(PlayerListeners::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let remover = Arc::new(Remover {
            listeners: Arc::downgrade(&listeners),
            target: Mutex::new(None),
            calls: Mutex::new(0),
        });
        let remover_handle: Arc<dyn StateChangedListener> = remover.clone();
        *remover.target.lock() = Some(remover_handle.clone());

        listeners.add_state_changed_listener(remover_handle);
        listeners.add_state_changed_listener(recorder("after", &log));

        listeners.dispatch(&state_event(PlaybackState::Buffering));
        listeners.dispatch(&state_event(PlaybackState::Ready));

        assert_eq!(*remover.calls.lock(), 1);
        assert_eq!(
            *log.lock(),
            vec![
                ("after", PlaybackState::Buffering),
                ("after", PlaybackState::Ready),
            ]
        );
    }

    #[test]
    fn test_removing_later_listener_does_not_affect_inflight_dispatch() {
        let listeners = Arc::new(PlayerListeners::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let victim = recorder("victim", &log);

        let remover = Arc::new(Remover {
            listeners: Arc::downgrade(&listeners),
            target: Mutex::new(Some(victim.clone())),
            calls: Mutex::new(0),
        });

        listeners.add_state_changed_listener(remover);
        listeners.add_state_changed_listener(victim);

        // Snapshot taken before the removal still includes the victim
        listeners.dispatch(&state_event(PlaybackState::Ready));
        assert_eq!(*log.lock(), vec![("victim", PlaybackState::Ready)]);

        listeners.dispatch(&state_event(PlaybackState::Ended));
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn test_listener_added_during_dispatch_waits_for_next_event() {
        let listeners = Arc::new(PlayerListeners::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let late = recorder("late", &log);

        let weak = Arc::downgrade(&listeners);
        let added = Mutex::new(false);
        listeners.add_state_changed_listener(Arc::new(move |_: bool, _: PlaybackState| {
            let mut added = added.lock();
            if !*added {
                *added = true;
                if let Some(listeners) = weak.upgrade() {
                    listeners.add_state_changed_listener(late.clone());
                }
            }
        }));

        listeners.dispatch(&state_event(PlaybackState::Buffering));
        assert!(log.lock().is_empty());

        listeners.dispatch(&state_event(PlaybackState::Ready));
        assert_eq!(*log.lock(), vec![("late", PlaybackState::Ready)]);
    }

    #[test]
    fn test_internal_errors_use_separate_channel() {
        let listeners = PlayerListeners::new();
        let playback = Arc::new(Mutex::new(Vec::new()));
        let internal = Arc::new(Mutex::new(Vec::new()));

        let playback_clone = playback.clone();
        listeners.add_error_listener(Arc::new(move |e: &PlayerError| {
            playback_clone.lock().push(e.clone());
        }));
        let internal_clone = internal.clone();
        listeners.add_internal_error_listener(Arc::new(move |e: &LoadError| {
            internal_clone.lock().push(e.clone());
        }));

        listeners.dispatch_internal_error(&LoadError::new("404"));
        listeners.dispatch(&PlayerEvent::Error(PlayerError::playback("decoder died")));

        assert_eq!(*internal.lock(), vec![LoadError::new("404")]);
        assert_eq!(*playback.lock(), vec![PlayerError::playback("decoder died")]);
    }

    #[test]
    fn test_clear() {
        let listeners = PlayerListeners::new();
        listeners.add_completion_listener(Arc::new(|| {}));
        listeners.add_heartbeat_listener(Arc::new(|_: u64, _: u64| {}));
        listeners.add_internal_error_listener(Arc::new(|_: &LoadError| {}));

        listeners.clear();

        for kind in EventKind::ALL {
            assert_eq!(listeners.listener_count(kind), 0);
        }
        assert_eq!(listeners.internal_error_listener_count(), 0);
    }

    #[test]
    fn test_snapshot_is_stable() {
        let set: ListenerSet<dyn CompletionListener> = ListenerSet::new();
        let a: Arc<dyn CompletionListener> = Arc::new(|| {});
        set.add(a.clone());

        let snapshot = set.snapshot();
        set.remove(&a);

        assert_eq!(snapshot.len(), 1);
        assert!(set.is_empty());
        assert!(!set.contains(&a));
    }
}
