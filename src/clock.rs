//! Wall-clock port trait.
//!
//! The CONNECTING timeout is measured as elapsed wall-clock time between
//! polls, not as an operation cancellation. The clock is a port so host
//! tests can drive the timeout deterministically.

/// Monotonic millisecond clock.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin. Must never go backwards.
    fn now_ms(&self) -> u64;
}

/// Process-monotonic clock backed by `std::time::Instant`.
pub struct StdClock {
    origin: std::time::Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}
