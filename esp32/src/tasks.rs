//! Embassy tasks and the glue that connects them to the render loop.
//!
//! - `tick_task`: advances the shared tick counter every tick period
//! - `render_task`: runs the guarded render loop forever

use embassy_executor::Spawner;
use embassy_time::{Duration, Ticker, Timer};
use gauge_common::{LoopTiming, Pacer, RenderLoop, SetupError, SharedGui, TickCounter, TickSource};

use crate::panel::PanelSink;

/// Tick source backed by an embassy ticker task.
pub struct EmbassyTickSource {
    spawner: Spawner,
}

impl EmbassyTickSource {
    pub fn new(spawner: Spawner) -> Self { Self { spawner } }
}

impl TickSource<'static> for EmbassyTickSource {
    fn start(
        &mut self,
        ticks: &'static TickCounter,
        period_ms: u32,
    ) -> Result<(), SetupError> {
        self.spawner.spawn(tick_task(ticks, period_ms)).map_err(|_| SetupError::TickSource)
    }
}

/// Sleeps on the embassy timer.
pub struct EmbassyPacer;

impl Pacer for EmbassyPacer {
    async fn sleep_ms(
        &mut self,
        ms: u32,
    ) {
        Timer::after_millis(u64::from(ms)).await;
    }
}

#[embassy_executor::task]
async fn tick_task(
    ticks: &'static TickCounter,
    period_ms: u32,
) {
    let mut ticker = Ticker::every(Duration::from_millis(u64::from(period_ms)));
    loop {
        ticker.next().await;
        ticks.advance(period_ms);
    }
}

/// Guarded render loop; every other context reaches the GUI through `gui`.
#[embassy_executor::task]
pub async fn render_task(
    gui: &'static SharedGui,
    sink: PanelSink,
    ticks: &'static TickCounter,
    timing: LoopTiming,
) {
    let mut render = RenderLoop::new(gui, sink, EmbassyPacer, ticks, &timing);
    render.run().await
}
