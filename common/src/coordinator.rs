//! Render loop coordinator.
//!
//! # Lifecycle
//!
//! [`setup`] runs once and performs, in order:
//!
//! 1. panel and transport initialization (board-supplied closure)
//! 2. stripe buffer allocation
//! 3. flush registration: the initialized panel becomes the loop's sink
//! 4. tick source start
//! 5. scene construction and animation start
//!
//! Any failure is returned as a [`SetupError`]; the firmware treats them all
//! as fatal.
//!
//! [`RenderLoop`] then runs forever. Each cycle reads the tick counter, runs
//! the engine's handler with the panel sink and sleeps for the loop period.
//! The sleep is the only suspension point.
//!
//! # Access to the engine
//!
//! How the loop reaches the engine depends on the board's render mode:
//!
//! - **Single context**: the loop owns the [`Gui`]; nothing else can touch
//!   it, so no lock is taken.
//! - **Guarded**: the engine lives in a [`SharedGui`]. The loop and every
//!   other context go through [`GuiAccess::with_gui`], which holds the one
//!   mutex for the whole call and releases it when the call returns.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};

use crate::buffer::{BufferAllocator, DrawBuffers};
use crate::config::{BoardProfile, DisplayConfig, LoopTiming, RenderMode};
use crate::engine::{CycleReport, Gui, SceneHandles, SceneSpec};
use crate::error::SetupError;
use crate::flush::FlushSink;
use crate::stats::LoopStats;
use crate::tick::{TickCounter, TickSource};

// =============================================================================
// Setup
// =============================================================================

/// Result of a successful [`setup`].
pub struct Prepared<P> {
    pub gui: Gui,
    /// The initialized panel, ready to be handed to the loop as its sink.
    pub sink: P,
    pub handles: SceneHandles,
    pub timing: LoopTiming,
    pub mode: RenderMode,
}

/// Bring up the display pipeline for `profile` and build `scene`.
pub fn setup<'t, P, E, A, T>(
    profile: &BoardProfile,
    ticks: &'t TickCounter,
    init_panel: impl FnOnce(&DisplayConfig) -> Result<P, E>,
    allocator: &mut A,
    tick_source: &mut T,
    scene: &SceneSpec<'_>,
) -> Result<Prepared<P>, SetupError>
where
    P: FlushSink,
    A: BufferAllocator,
    T: TickSource<'t>,
{
    profile.validate()?;
    let timing = profile.timing();

    let sink = init_panel(&profile.display).map_err(|_| {
        error!("panel initialization failed");
        SetupError::PanelInit
    })?;
    info!("panel ready: {}x{}", profile.display.width, profile.display.height);

    let buffers = DrawBuffers::allocate(allocator, &profile.buffers, &profile.display).inspect_err(|_| {
        error!("stripe buffer allocation failed");
    })?;

    let mut gui = Gui::new(profile.display, timing, buffers);

    tick_source.start(ticks, timing.tick_period_ms)?;
    info!("tick source started, period {} ms", timing.tick_period_ms);

    let handles = gui.build_scene(scene, ticks.now())?;

    Ok(Prepared {
        gui,
        sink,
        handles,
        timing,
        mode: profile.mode,
    })
}

// =============================================================================
// Guarded Access
// =============================================================================

/// Engine behind the one GUI mutex.
pub struct SharedGui {
    inner: Mutex<CriticalSectionRawMutex, Gui>,
}

impl SharedGui {
    pub const fn new(gui: Gui) -> Self { Self { inner: Mutex::new(gui) } }

    /// Hold the lock until the guard is dropped.
    pub async fn lock(&self) -> MutexGuard<'_, CriticalSectionRawMutex, Gui> { self.inner.lock().await }

    pub fn into_inner(self) -> Gui { self.inner.into_inner() }
}

/// Way to run a closure with exclusive access to the engine.
#[allow(async_fn_in_trait)]
pub trait GuiAccess {
    async fn with_gui<R>(
        &mut self,
        f: impl FnOnce(&mut Gui) -> R,
    ) -> R;
}

/// Single context: the owner calls straight in.
impl GuiAccess for Gui {
    async fn with_gui<R>(
        &mut self,
        f: impl FnOnce(&mut Gui) -> R,
    ) -> R {
        f(self)
    }
}

/// Guarded: every call takes the mutex.
impl GuiAccess for &SharedGui {
    async fn with_gui<R>(
        &mut self,
        f: impl FnOnce(&mut Gui) -> R,
    ) -> R {
        let mut gui = self.inner.lock().await;
        f(&mut gui)
    }
}

// =============================================================================
// Render Loop
// =============================================================================

/// Something that suspends the loop between cycles.
#[allow(async_fn_in_trait)]
pub trait Pacer {
    async fn sleep_ms(
        &mut self,
        ms: u32,
    );
}

/// The periodic phase.
pub struct RenderLoop<'t, G, S, P> {
    gui: G,
    sink: S,
    pacer: P,
    ticks: &'t TickCounter,
    period_ms: u32,
}

impl<'t, G, S, P> RenderLoop<'t, G, S, P>
where
    G: GuiAccess,
    S: FlushSink,
    P: Pacer,
{
    pub fn new(
        gui: G,
        sink: S,
        pacer: P,
        ticks: &'t TickCounter,
        timing: &LoopTiming,
    ) -> Self {
        Self {
            gui,
            sink,
            pacer,
            ticks,
            period_ms: timing.loop_period_ms,
        }
    }

    /// Run the handler once, then sleep one loop period.
    pub async fn cycle(&mut self) -> CycleReport {
        let ticks = self.ticks;
        let sink = &mut self.sink;
        let report = self
            .gui
            .with_gui(|gui| {
                let now = ticks.now();
                let report = gui.timer_handler(now, sink);
                gui.record_cycle(&report, ticks.elapsed_since(now));
                report
            })
            .await;

        self.pacer.sleep_ms(self.period_ms).await;
        report
    }

    /// Run `cycles` iterations.
    pub async fn run_cycles(
        &mut self,
        cycles: u32,
    ) {
        for _ in 0..cycles {
            self.cycle().await;
        }
    }

    /// Run forever.
    pub async fn run(&mut self) -> ! {
        info!("render loop running, period {} ms", self.period_ms);
        loop {
            self.cycle().await;
        }
    }

    /// Run `f` on the engine between two cycles.
    pub async fn with_gui<R>(
        &mut self,
        f: impl FnOnce(&mut Gui) -> R,
    ) -> R {
        self.gui.with_gui(f).await
    }

    /// Snapshot of the loop counters.
    pub async fn stats(&mut self) -> LoopStats { self.with_gui(|gui| *gui.stats()).await }

    #[inline]
    pub fn sink(&self) -> &S { &self.sink }

    pub fn into_parts(self) -> (G, S, P) { (self.gui, self.sink, self.pacer) }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use core::cell::RefCell;
    use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::vec::Vec;

    use embassy_futures::block_on;
    use embedded_graphics::geometry::Point;
    use embedded_graphics::pixelcolor::Rgb565;

    use super::*;
    use crate::anim::{Animation, Repeat};
    use crate::buffer::BudgetAllocator;
    use crate::colors::{GREY, SCREEN_BG};
    use crate::config::{BufferConfig, M5_CORE2};
    use crate::engine::{GaugeSpec, IndicatorAnimation};
    use crate::error::{DisplayError, GuiError};
    use crate::flush::{FlushReady, FlushRequest};
    use crate::tick::ManualTicks;
    use crate::widgets::{Align, Indicator, IndicatorRef, MeterSpec, ScaleSpec};

    const NEEDLE: [Indicator; 1] = [Indicator::needle(4, GREY, -10, 0)];

    const SWEEP: [IndicatorAnimation; 1] = [IndicatorAnimation {
        indicator: 0,
        animation: Animation::new(0, 100, 2_000)
            .with_playback(500, 100)
            .with_repeat(Repeat::Infinite, 100),
    }];

    const GAUGES: [GaugeSpec<'static>; 1] = [GaugeSpec {
        meter: MeterSpec {
            align: Align::Center,
            offset: Point::zero(),
            size: 120,
            scale: ScaleSpec::new(),
            indicators: &NEEDLE,
        },
        animations: &SWEEP,
    }];

    const SCENE: SceneSpec<'static> = SceneSpec {
        background: SCREEN_BG,
        gauges: &GAUGES,
        labels: &[],
    };

    /// Sink that counts requests and acknowledgments.
    #[derive(Default)]
    struct CountingSink {
        requests: u32,
        acked: u32,
        fail: bool,
    }

    impl FlushSink for CountingSink {
        fn flush(
            &mut self,
            request: FlushRequest<'_>,
        ) -> FlushReady {
            self.requests += 1;
            assert_eq!(request.pixels().len() as u32, request.area().size.width * request.area().size.height);
            self.acked += 1;
            if self.fail {
                request.failed(DisplayError::Timeout)
            } else {
                request.ready()
            }
        }
    }

    /// Advances the tick counter 1 ms at a time while "sleeping".
    struct VirtualPacer<'t> {
        ticks: &'t TickCounter,
        slept: Vec<u32>,
    }

    impl Pacer for VirtualPacer<'_> {
        async fn sleep_ms(
            &mut self,
            ms: u32,
        ) {
            for _ in 0..ms {
                self.ticks.advance(1);
            }
            self.slept.push(ms);
        }
    }

    fn prepare(
        ticks: &TickCounter,
        profile: &BoardProfile,
    ) -> Prepared<CountingSink> {
        let mut alloc = BudgetAllocator::new(1 << 20);
        setup(profile, ticks, |_| Ok::<_, ()>(CountingSink::default()), &mut alloc, &mut ManualTicks, &SCENE)
            .expect("setup")
    }

    // -------------------------------------------------------------------------
    // Setup
    // -------------------------------------------------------------------------

    /// Records the order of setup steps.
    struct StepAllocator<'a> {
        log: &'a RefCell<Vec<&'static str>>,
        inner: BudgetAllocator,
    }

    impl BufferAllocator for StepAllocator<'_> {
        fn available(&self) -> usize { self.inner.available() }

        fn allocate(
            &mut self,
            pixels: usize,
            dma_capable: bool,
        ) -> Result<alloc::vec::Vec<Rgb565>, SetupError> {
            self.log.borrow_mut().push("alloc");
            self.inner.allocate(pixels, dma_capable)
        }
    }

    struct StepTicks<'a> {
        log: &'a RefCell<Vec<&'static str>>,
        fail: bool,
    }

    impl<'t> TickSource<'t> for StepTicks<'_> {
        fn start(
            &mut self,
            ticks: &'t TickCounter,
            period_ms: u32,
        ) -> Result<(), SetupError> {
            self.log.borrow_mut().push("tick");
            if self.fail {
                return Err(SetupError::TickSource);
            }
            ticks.advance(period_ms * 7);
            Ok(())
        }
    }

    #[test]
    fn test_setup_steps_run_in_order() {
        let log = RefCell::new(Vec::new());
        let ticks = TickCounter::new();
        let mut alloc = StepAllocator {
            log: &log,
            inner: BudgetAllocator::new(1 << 20),
        };
        let mut source = StepTicks { log: &log, fail: false };

        let prepared = setup(
            &M5_CORE2,
            &ticks,
            |_| {
                log.borrow_mut().push("panel");
                Ok::<_, ()>(CountingSink::default())
            },
            &mut alloc,
            &mut source,
            &SCENE,
        )
        .expect("setup");

        assert_eq!(log.borrow().as_slice(), &["panel", "alloc", "alloc", "tick"]);
        assert_eq!(prepared.mode, RenderMode::Guarded);
        assert_eq!(prepared.timing.loop_period_ms, 10);
        assert_eq!(prepared.handles.gauges.len(), 1);
        assert_eq!(prepared.gui.animation_count(), 1);
        // The scene is built after the tick source started
        assert_eq!(ticks.now(), 7);
    }

    #[test]
    fn test_panel_failure_is_fatal_and_allocates_nothing() {
        let ticks = TickCounter::new();
        let mut alloc = BudgetAllocator::new(1 << 20);
        let result = setup(
            &M5_CORE2,
            &ticks,
            |_| Err::<CountingSink, _>("no ack"),
            &mut alloc,
            &mut ManualTicks,
            &SCENE,
        );
        assert_eq!(result.err(), Some(SetupError::PanelInit));
        assert_eq!(alloc.available(), 1 << 20);
    }

    #[test]
    fn test_out_of_memory_reported() {
        let ticks = TickCounter::new();
        let mut alloc = BudgetAllocator::new(4_000);
        let result = setup(
            &M5_CORE2,
            &ticks,
            |_| Ok::<_, ()>(CountingSink::default()),
            &mut alloc,
            &mut ManualTicks,
            &SCENE,
        );
        assert_eq!(
            result.err(),
            Some(SetupError::OutOfMemory {
                requested: 6_400,
                available: 4_000,
            })
        );
    }

    #[test]
    fn test_tick_source_failure_reported() {
        let log = RefCell::new(Vec::new());
        let ticks = TickCounter::new();
        let mut alloc = BudgetAllocator::new(1 << 20);
        let mut source = StepTicks { log: &log, fail: true };
        let result = setup(
            &M5_CORE2,
            &ticks,
            |_| Ok::<_, ()>(CountingSink::default()),
            &mut alloc,
            &mut source,
            &SCENE,
        );
        assert_eq!(result.err(), Some(SetupError::TickSource));
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let ticks = TickCounter::new();
        let mut profile = M5_CORE2;
        profile.display.height = 0;
        let mut alloc = BudgetAllocator::new(1 << 20);
        let result = setup(
            &profile,
            &ticks,
            |_| Ok::<_, ()>(CountingSink::default()),
            &mut alloc,
            &mut ManualTicks,
            &SCENE,
        );
        assert!(matches!(result.err(), Some(SetupError::InvalidConfig(_))));
    }

    #[test]
    fn test_scene_over_capacity_reported() {
        let ticks = TickCounter::new();
        let mut alloc = BudgetAllocator::new(1 << 20);
        let gauges = [GAUGES[0]; crate::widgets::MAX_WIDGETS + 1];
        let scene = SceneSpec { gauges: &gauges, ..SCENE };
        let result = setup(
            &M5_CORE2,
            &ticks,
            |_| Ok::<_, ()>(CountingSink::default()),
            &mut alloc,
            &mut ManualTicks,
            &scene,
        );
        assert_eq!(result.err(), Some(SetupError::Gui(GuiError::Capacity)));
    }

    // -------------------------------------------------------------------------
    // Single context
    // -------------------------------------------------------------------------

    #[test]
    fn test_single_context_loop_animates_needle() {
        let ticks = TickCounter::new();
        let mut profile = M5_CORE2;
        profile.mode = RenderMode::SingleContext;
        let prepared = prepare(&ticks, &profile);
        let needle = IndicatorRef {
            meter: prepared.handles.gauges[0],
            index: 0,
        };
        let pacer = VirtualPacer {
            ticks: &ticks,
            slept: Vec::new(),
        };
        let mut render = RenderLoop::new(prepared.gui, prepared.sink, pacer, &ticks, &prepared.timing);

        // 200 cycles of 5 ms: the handler last ran at 995 ms
        block_on(render.run_cycles(200));
        assert_eq!(ticks.now(), 1_000);
        block_on(render.cycle());

        let stats = block_on(render.stats());
        let (gui, sink, pacer) = render.into_parts();
        assert_eq!(gui.tree().indicator_value(needle), Ok(50));
        assert!(pacer.slept.iter().all(|&ms| ms == 5));
        assert_eq!(stats.cycles, 201);
        assert_eq!(sink.requests, sink.acked);
        assert_eq!(stats.flushes, sink.acked);
    }

    #[test]
    fn test_failed_flushes_do_not_stop_the_loop() {
        let ticks = TickCounter::new();
        let prepared = prepare(&ticks, &M5_CORE2);
        let sink = CountingSink {
            fail: true,
            ..CountingSink::default()
        };
        let pacer = VirtualPacer {
            ticks: &ticks,
            slept: Vec::new(),
        };
        let mut render = RenderLoop::new(prepared.gui, sink, pacer, &ticks, &prepared.timing);

        block_on(render.run_cycles(10));
        let stats = block_on(render.stats());
        assert_eq!(stats.cycles, 10);
        assert_eq!(stats.flushes, 0);
        assert!(stats.failed_flushes > 0);
        assert_eq!(stats.failed_flushes, stats.retries + stats.dropped);
        assert_eq!(ticks.now(), 100);
    }

    // -------------------------------------------------------------------------
    // Guarded
    // -------------------------------------------------------------------------

    /// Flags the GUI as entered for the duration of every flush.
    struct GuardedSink<'a> {
        inside: &'a AtomicBool,
        requests: u32,
    }

    impl FlushSink for GuardedSink<'_> {
        fn flush(
            &mut self,
            request: FlushRequest<'_>,
        ) -> FlushReady {
            assert!(!self.inside.swap(true, Ordering::AcqRel), "GUI entered twice");
            std::thread::yield_now();
            self.inside.store(false, Ordering::Release);
            self.requests += 1;
            request.ready()
        }
    }

    #[test]
    fn test_guarded_access_never_overlaps() {
        let ticks = TickCounter::new();
        let prepared = prepare(&ticks, &M5_CORE2);
        let needle = IndicatorRef {
            meter: prepared.handles.gauges[0],
            index: 0,
        };
        let shared = SharedGui::new(prepared.gui);
        let inside = AtomicBool::new(false);
        let mutations = AtomicU32::new(0);
        let flushed = AtomicU32::new(0);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                let sink = GuardedSink {
                    inside: &inside,
                    requests: 0,
                };
                let pacer = VirtualPacer {
                    ticks: &ticks,
                    slept: Vec::new(),
                };
                let mut render = RenderLoop::new(&shared, sink, pacer, &ticks, &prepared.timing);
                block_on(render.run_cycles(300));
                let (_, sink, pacer) = render.into_parts();
                assert!(pacer.slept.iter().all(|&ms| ms == 10));
                flushed.store(sink.requests, Ordering::Relaxed);
            });

            scope.spawn(|| {
                let mut gui = &shared;
                for _ in 0..300 {
                    block_on(gui.with_gui(|gui| {
                        assert!(!inside.swap(true, Ordering::AcqRel), "GUI entered twice");
                        let _ = gui.tree().indicator_value(needle);
                        gui.invalidate_all();
                        std::thread::yield_now();
                        inside.store(false, Ordering::Release);
                    }));
                    mutations.fetch_add(1, Ordering::Relaxed);
                }
            });
        });

        assert_eq!(mutations.load(Ordering::Relaxed), 300);
        assert!(flushed.load(Ordering::Relaxed) > 0);
        let gui = shared.into_inner();
        assert_eq!(gui.stats().cycles, 300);
        assert_eq!(gui.stats().flushes, flushed.load(Ordering::Relaxed));
    }

    #[test]
    fn test_guarded_loop_matches_single_context() {
        // Same ticks, same scene: the lock changes nothing about the result
        let run = |guarded: bool| {
            let ticks = TickCounter::new();
            let prepared = prepare(&ticks, &M5_CORE2);
            let needle = IndicatorRef {
                meter: prepared.handles.gauges[0],
                index: 0,
            };
            let pacer = VirtualPacer {
                ticks: &ticks,
                slept: Vec::new(),
            };
            if guarded {
                let shared = SharedGui::new(prepared.gui);
                let mut render = RenderLoop::new(&shared, prepared.sink, pacer, &ticks, &prepared.timing);
                block_on(render.run_cycles(150));
                drop(render);
                shared.into_inner().tree().indicator_value(needle)
            } else {
                let mut render = RenderLoop::new(prepared.gui, prepared.sink, pacer, &ticks, &prepared.timing);
                block_on(render.run_cycles(150));
                render.into_parts().0.tree().indicator_value(needle)
            }
        };
        let guarded = run(true);
        assert!(guarded.is_ok());
        assert_eq!(guarded, run(false));
    }

    #[test]
    fn test_buffer_config_used_by_setup() {
        let ticks = TickCounter::new();
        let mut profile = M5_CORE2;
        profile.buffers = BufferConfig {
            stripe_rows: 240,
            count: 1,
            dma_capable: false,
        };
        let mut prepared = prepare(&ticks, &profile);
        let report = prepared.gui.timer_handler(0, &mut prepared.sink);
        // One full-screen stripe
        assert_eq!(report.flushes, 1);
    }
}
