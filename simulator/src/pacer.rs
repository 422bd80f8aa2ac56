//! Virtual-time pacer.

use gauge_common::{Pacer, TickCounter};

/// Advances the tick counter one tick period at a time instead of sleeping,
/// standing in for the firmware's tick task.
pub struct VirtualPacer<'t> {
    ticks: &'t TickCounter,
    tick_period_ms: u32,
}

impl<'t> VirtualPacer<'t> {
    pub fn new(
        ticks: &'t TickCounter,
        tick_period_ms: u32,
    ) -> Self {
        Self {
            ticks,
            tick_period_ms: tick_period_ms.max(1),
        }
    }
}

impl Pacer for VirtualPacer<'_> {
    async fn sleep_ms(
        &mut self,
        ms: u32,
    ) {
        let mut left = ms;
        while left > 0 {
            let step = left.min(self.tick_period_ms);
            self.ticks.advance(step);
            left -= step;
        }
    }
}
