//! Render loop statistics.
//!
//! Counters are accumulated by the render loop from the per-cycle reports
//! of the engine. Handler time is measured in ticks (milliseconds), so the
//! same numbers come out of the firmware and the virtual-time simulator.

use core::fmt::Write;

use heapless::String;

use crate::engine::CycleReport;

/// Accumulated render loop counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopStats {
    /// Handler invocations.
    pub cycles: u64,
    /// Cycles that redrew at least one area.
    pub refreshes: u32,
    /// Flush requests acknowledged as written.
    pub flushes: u32,
    /// Flush requests acknowledged as failed.
    pub failed_flushes: u32,
    /// Failed stripes written again.
    pub retries: u32,
    /// Stripes dropped after the last retry failed.
    pub dropped: u32,

    // Handler time in ticks
    pub handler_ms: u32,
    pub handler_min_ms: u32,
    pub handler_max_ms: u32,
    handler_avg_ms: f32,
}

impl LoopStats {
    const EMA_ALPHA: f32 = 0.1;

    pub const fn new() -> Self {
        Self {
            cycles: 0,
            refreshes: 0,
            flushes: 0,
            failed_flushes: 0,
            retries: 0,
            dropped: 0,
            handler_ms: 0,
            handler_min_ms: u32::MAX,
            handler_max_ms: 0,
            handler_avg_ms: 0.0,
        }
    }

    /// Record one handler invocation that took `handler_ms` ticks.
    pub fn record_cycle(
        &mut self,
        report: &CycleReport,
        handler_ms: u32,
    ) {
        if report.refreshed {
            self.refreshes += 1;
        }
        self.flushes += report.flushes;
        self.failed_flushes += report.failures;
        self.retries += report.retries;
        self.dropped += report.dropped;

        self.handler_ms = handler_ms;
        self.handler_min_ms = self.handler_min_ms.min(handler_ms);
        self.handler_max_ms = self.handler_max_ms.max(handler_ms);
        if self.cycles == 0 {
            self.handler_avg_ms = handler_ms as f32;
        } else {
            self.handler_avg_ms =
                Self::EMA_ALPHA * handler_ms as f32 + (1.0 - Self::EMA_ALPHA) * self.handler_avg_ms;
        }

        self.cycles += 1;
    }

    /// Smoothed handler time in ticks.
    #[inline]
    pub const fn handler_avg_ms(&self) -> u32 { self.handler_avg_ms as u32 }
}

impl Default for LoopStats {
    fn default() -> Self { Self::new() }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LoopStats {
    fn format(
        &self,
        f: defmt::Formatter<'_>,
    ) {
        defmt::write!(
            f,
            "cycles={} refreshes={} flushes={} failed={} retries={} dropped={} handler={}ms avg={}ms max={}ms",
            self.cycles,
            self.refreshes,
            self.flushes,
            self.failed_flushes,
            self.retries,
            self.dropped,
            self.handler_ms,
            self.handler_avg_ms(),
            self.handler_max_ms,
        )
    }
}

// =============================================================================
// Formatting Helpers
// =============================================================================

/// Format a tick count as HH:MM:SS.
pub fn uptime_string(now_ms: u32) -> String<12> {
    let secs = now_ms / 1_000;
    let hours = secs / 3_600;
    let mins = (secs % 3_600) / 60;
    let secs = secs % 60;

    // u32::MAX ms is "1193:02:47", which fits
    let mut s = String::new();
    write!(s, "{hours:02}:{mins:02}:{secs:02}").ok();
    s
}

// =============================================================================
// Tests
// =============================================================================
