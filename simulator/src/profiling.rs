//! Host-side cycle timing.
//!
//! The loop's own statistics are in ticks, which on virtual time only say
//! how much simulated time passed. This measures what a cycle actually
//! costs on the host.

use std::time::{Duration, Instant};

/// Wall-clock cost of render loop cycles.
pub struct CycleTimer {
    // Cycle timing (microseconds)
    pub cycle_us: u32,
    pub cycle_min_us: u32,
    pub cycle_max_us: u32,
    cycle_avg_us: f32,

    pub total_cycles: u64,

    start_time: Instant,
}

impl CycleTimer {
    const EMA_ALPHA: f32 = 0.1;

    pub fn new() -> Self {
        Self {
            cycle_us: 0,
            cycle_min_us: u32::MAX,
            cycle_max_us: 0,
            cycle_avg_us: 0.0,
            total_cycles: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one cycle that took `elapsed`.
    pub fn record(
        &mut self,
        elapsed: Duration,
    ) {
        let us = elapsed.as_micros() as u32;
        self.cycle_us = us;
        self.cycle_min_us = self.cycle_min_us.min(us);
        self.cycle_max_us = self.cycle_max_us.max(us);

        if self.total_cycles == 0 {
            self.cycle_avg_us = us as f32;
        } else {
            self.cycle_avg_us = Self::EMA_ALPHA.mul_add(us as f32, (1.0 - Self::EMA_ALPHA) * self.cycle_avg_us);
        }

        self.total_cycles += 1;
    }

    /// Smoothed cycle time in microseconds.
    #[inline]
    pub const fn cycle_avg_us(&self) -> u32 { self.cycle_avg_us as u32 }

    /// Wall time since the timer was created.
    #[inline]
    pub fn wall_time(&self) -> Duration { self.start_time.elapsed() }
}

impl Default for CycleTimer {
    fn default() -> Self { Self::new() }
}
