use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Monotonic clock abstraction used for expiry bookkeeping.
///
/// - now(): returns a monotonic Instant
/// - elapsed_since(): saturating duration from an earlier Instant
pub trait Clock {
    fn now(&self) -> Instant;

    /// Time elapsed since `epoch`, saturating at zero when `epoch` is in the future.
    fn elapsed_since(&self, epoch: Instant) -> Duration {
        self.now().saturating_duration_since(epoch)
    }
}

/// Default, real-time monotonic clock backed by std::time::Instant.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic clock whose time only moves when advanced.
///
/// now() = origin + offset. Clones share the same offset, so a clone handed to
/// a cache can be advanced from the test body.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
        self.origin + off
    }
}
