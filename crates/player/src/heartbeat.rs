// Heartbeat throttling
// Progress is polled often by the host loop; listeners only hear about it
// once per interval.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

pub(crate) struct HeartbeatThrottle {
    interval: Duration,
    last_beat: Mutex<Option<Instant>>,
}

impl HeartbeatThrottle {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_beat: Mutex::new(None),
        }
    }

    /// Claim the beat at `now` if the interval has elapsed since the last one
    pub(crate) fn try_beat(&self, now: Instant) -> bool {
        let mut last_beat = self.last_beat.lock();
        match *last_beat {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                *last_beat = Some(now);
                true
            }
        }
    }

    /// Next beat fires immediately
    pub(crate) fn reset(&self) {
        *self.last_beat.lock() = None;
    }
}
