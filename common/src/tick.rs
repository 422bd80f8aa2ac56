//! Millisecond tick counter shared between the tick source and the GUI.
//!
//! The tick source (a timer interrupt or a high-priority task) is the only
//! writer: it calls [`TickCounter::advance`] once per period. The render loop
//! reads the counter at the start of every cycle. Both sides only touch one
//! atomic, so no lock is needed and the tick context never blocks.
//!
//! The counter is a `u32` and wraps after ~49.7 days. Durations are always
//! computed with [`TickCounter::elapsed_since`] (wrapping subtraction), so
//! the wrap is invisible to animations.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::error::SetupError;

/// Monotonic millisecond counter.
pub struct TickCounter {
    ms: AtomicU32,
}

impl TickCounter {
    /// Create a counter at zero.
    pub const fn new() -> Self { Self { ms: AtomicU32::new(0) } }

    /// Advance by `elapsed_ms`. Called from the tick source only.
    #[inline]
    pub fn advance(
        &self,
        elapsed_ms: u32,
    ) {
        self.ms.fetch_add(elapsed_ms, Ordering::Release);
    }

    /// Current value in milliseconds.
    #[inline]
    pub fn now(&self) -> u32 { self.ms.load(Ordering::Acquire) }

    /// Milliseconds since `earlier`, correct across one counter wrap.
    #[inline]
    pub fn elapsed_since(
        &self,
        earlier: u32,
    ) -> u32 {
        self.now().wrapping_sub(earlier)
    }
}

impl Default for TickCounter {
    fn default() -> Self { Self::new() }
}

/// Something that calls [`TickCounter::advance`] periodically once started.
///
/// The firmware implements this by spawning an embassy task; tests and the
/// simulator drive the counter by hand and implement it as a no-op.
pub trait TickSource<'t> {
    /// Start advancing `ticks` by `period_ms` every `period_ms`.
    fn start(
        &mut self,
        ticks: &'t TickCounter,
        period_ms: u32,
    ) -> Result<(), SetupError>;
}

/// Tick source for callers that advance the counter themselves.
pub struct ManualTicks;

impl<'t> TickSource<'t> for ManualTicks {
    fn start(
        &mut self,
        _ticks: &'t TickCounter,
        _period_ms: u32,
    ) -> Result<(), SetupError> {
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::config::TICK_PERIOD_MS;

    #[test]
    fn test_starts_at_zero() {
        assert_eq!(TickCounter::new().now(), 0);
    }

    #[test]
    fn test_n_ticks_advance_by_n_periods() {
        let ticks = TickCounter::new();
        ticks.advance(17);
        let before = ticks.now();

        let mut last = before;
        for _ in 0..2_000 {
            ticks.advance(TICK_PERIOD_MS);
            let now = ticks.now();
            assert!(now >= last, "tick counter went backwards");
            last = now;
        }

        assert_eq!(ticks.now(), before + 2_000 * TICK_PERIOD_MS);
    }

    #[test]
    fn test_elapsed_across_wrap() {
        let ticks = TickCounter::new();
        ticks.advance(u32::MAX - 4);
        let earlier = ticks.now();
        ticks.advance(10);
        assert_eq!(ticks.elapsed_since(earlier), 10);
    }

    #[test]
    fn test_concurrent_readers_see_monotonic_values() {
        let ticks = Arc::new(TickCounter::new());

        let writer = {
            let ticks = Arc::clone(&ticks);
            thread::spawn(move || {
                for _ in 0..10_000 {
                    ticks.advance(1);
                }
            })
        };

        let reader = {
            let ticks = Arc::clone(&ticks);
            thread::spawn(move || {
                let mut last = 0;
                for _ in 0..10_000 {
                    let now = ticks.now();
                    assert!(now >= last);
                    last = now;
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(ticks.now(), 10_000);
    }

    #[test]
    fn test_manual_source_starts() {
        let ticks = TickCounter::new();
        assert_eq!(ManualTicks.start(&ticks, TICK_PERIOD_MS), Ok(()));
        assert_eq!(ticks.now(), 0);
    }
}
