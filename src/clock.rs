// Monotonic tick source. The bridge treats time as a free-running 32-bit
// millisecond counter that wraps; both the producer side (timer arming) and
// the poll side (timer firing) read the same clock through this trait.

use std::sync::Arc;
use std::time::Instant;

/// A monotonic millisecond counter that wraps at `u32::MAX`.
pub trait TickClock {
    /// Current tick count. Successive reads never move backwards except by
    /// wrapping around the top of the range.
    fn now_ms(&self) -> u32;
}

impl<C: TickClock + ?Sized> TickClock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

impl<C: TickClock + ?Sized> TickClock for Arc<C> {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Host clock counting milliseconds since construction.
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    start: Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickClock for StdClock {
    fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}
