//! Millisecond time source
//!
//! Timestamps are wrapping `u32` milliseconds since node start, the same
//! width the wire frame carries. Differences must use `wrapping_sub`.

use std::cell::Cell;
use std::time::Instant;

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin, wrapping at `u32::MAX`
    fn now_ms(&self) -> u32;
}

/// Clock backed by [`Instant`], origin at construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        // Truncation is the wrap.
        self.origin.elapsed().as_millis() as u32
    }
}

/// Manually driven clock for simulation and tests
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u32>,
}

impl ManualClock {
    pub fn new(start_ms: u32) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    /// Set the current time
    pub fn set(&self, now_ms: u32) {
        self.now.set(now_ms);
    }

    /// Move the clock forward, wrapping like a hardware counter
    pub fn advance(&self, delta_ms: u32) {
        self.now.set(self.now.get().wrapping_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(100);
        clock.advance(50);
        assert_eq!(clock.now_ms(), 150);
    }

    #[test]
    fn test_manual_clock_wraps() {
        let clock = ManualClock::new(u32::MAX - 10);
        clock.advance(20);
        assert_eq!(clock.now_ms(), 9);
    }

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b.wrapping_sub(a) < 1000);
    }

    #[test]
    fn test_clock_through_reference() {
        let clock = ManualClock::new(7);
        let by_ref: &ManualClock = &clock;
        assert_eq!(Clock::now_ms(&by_ref), 7);
    }
}
