//! Gauge demo simulator for the desktop.
//!
//! Runs the firmware's setup and render loop against an in-memory
//! `SimulatorDisplay` on virtual time and writes PNG snapshots of the panel.
//!
//! ```text
//! simulator [board] [duration_ms]
//! ```
//!
//! `board` is a preset name (`atom-display`, `m5-core2`); the default is the
//! ATOM Display.

// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

mod pacer;
mod profiling;
mod sink;
mod timing;

use std::convert::Infallible;
use std::path::PathBuf;
use std::time::Instant;
use std::{env, fs, process};

use critical_section as _;
use embassy_futures::block_on;
use gauge_common::buffer::BudgetAllocator;
use gauge_common::demo::demo_gauges;
use gauge_common::stats::{LoopStats, uptime_string};
use gauge_common::tick::ManualTicks;
use gauge_common::{
    ATOM_DISPLAY,
    BoardProfile,
    GuiAccess,
    RenderLoop,
    RenderMode,
    SharedGui,
    TickCounter,
    profile_by_name,
    setup,
};

use crate::pacer::VirtualPacer;
use crate::profiling::CycleTimer;
use crate::sink::SimulatorSink;
use crate::timing::{DEFAULT_RUN_MS, SNAPSHOT_DIR, SNAPSHOT_INTERVAL_MS, STATS_INTERVAL_MS};

/// Heap budget handed to the stripe allocator, roughly the internal DRAM
/// left for buffers on an ESP32.
const HEAP_BUDGET: usize = 96 * 1024;

fn main() {
    let mut args = env::args().skip(1);
    let profile = match args.next() {
        Some(name) => profile_by_name(&name).unwrap_or_else(|| {
            eprintln!("unknown board '{name}', expected one of: atom-display, m5-core2");
            process::exit(2);
        }),
        None => ATOM_DISPLAY,
    };
    let run_ms = match args.next() {
        Some(arg) => arg.parse().unwrap_or_else(|_| {
            eprintln!("invalid duration '{arg}', expected milliseconds");
            process::exit(2);
        }),
        None => DEFAULT_RUN_MS,
    };

    println!(
        "board {}: {}x{} @ {} Hz, {:?}, {} x {}-row stripes",
        profile.name,
        profile.display.width,
        profile.display.height,
        profile.display.refresh_rate,
        profile.mode,
        profile.buffers.count,
        profile.buffers.stripe_rows
    );

    let ticks = TickCounter::new();
    let demo = demo_gauges(&profile.display);
    let gauges = demo.gauges();
    let scene = demo.scene(&gauges);

    let mut allocator = BudgetAllocator::new(HEAP_BUDGET);
    let prepared = match setup(
        &profile,
        &ticks,
        |display| Ok::<_, Infallible>(SimulatorSink::new(display)),
        &mut allocator,
        &mut ManualTicks,
        &scene,
    ) {
        Ok(prepared) => prepared,
        Err(err) => {
            eprintln!("setup failed: {err}");
            process::exit(1);
        }
    };

    let out_dir = PathBuf::from(SNAPSHOT_DIR);
    if let Err(err) = fs::create_dir_all(&out_dir) {
        eprintln!("cannot create {}: {err}", out_dir.display());
        process::exit(1);
    }

    let pacer = VirtualPacer::new(&ticks, prepared.timing.tick_period_ms);
    match prepared.mode {
        RenderMode::SingleContext => {
            let mut render = RenderLoop::new(prepared.gui, prepared.sink, pacer, &ticks, &prepared.timing);
            run(&mut render, &ticks, &profile, &out_dir, run_ms);
        }
        RenderMode::Guarded => {
            let shared = SharedGui::new(prepared.gui);
            let mut render = RenderLoop::new(&shared, prepared.sink, pacer, &ticks, &prepared.timing);
            run(&mut render, &ticks, &profile, &out_dir, run_ms);
        }
    }
}

/// Drive the loop until `run_ms` of virtual time passed.
fn run<G: GuiAccess>(
    render: &mut RenderLoop<'_, G, SimulatorSink, VirtualPacer<'_>>,
    ticks: &TickCounter,
    profile: &BoardProfile,
    out_dir: &std::path::Path,
    run_ms: u32,
) {
    let mut timer = CycleTimer::new();
    let mut next_snapshot = 0;
    let mut next_stats = STATS_INTERVAL_MS;
    let mut snapshots = 0u32;

    while ticks.now() < run_ms {
        let now = ticks.now();
        let start = Instant::now();
        block_on(render.cycle());
        timer.record(start.elapsed());

        if now >= next_snapshot {
            let path = out_dir.join(format!("{}-{:06}.png", profile.name, now));
            match render.sink().save_png(&path) {
                Ok(()) => snapshots += 1,
                Err(err) => eprintln!("snapshot {} failed: {err}", path.display()),
            }
            next_snapshot += SNAPSHOT_INTERVAL_MS;
        }

        if ticks.now() >= next_stats {
            let stats = block_on(render.stats());
            print_stats(ticks.now(), &stats);
            next_stats += STATS_INTERVAL_MS;
        }
    }

    let stats = block_on(render.stats());
    let sink = render.sink();
    println!("--- done ---");
    print_stats(ticks.now(), &stats);
    println!(
        "panel: {} stripes, {} pixels; {} snapshots in {}",
        sink.stripes(),
        sink.pixels(),
        snapshots,
        out_dir.display()
    );
    println!(
        "host: {} cycles in {:.2?}, cycle avg {} us, min {} us, max {} us",
        timer.total_cycles,
        timer.wall_time(),
        timer.cycle_avg_us(),
        timer.cycle_min_us,
        timer.cycle_max_us
    );
}

fn print_stats(
    now_ms: u32,
    stats: &LoopStats,
) {
    println!(
        "[{}] cycles={} refreshes={} flushes={} failed={} retries={} dropped={} handler avg={}ms max={}ms",
        uptime_string(now_ms),
        stats.cycles,
        stats.refreshes,
        stats.flushes,
        stats.failed_flushes,
        stats.retries,
        stats.dropped,
        stats.handler_avg_ms(),
        stats.handler_max_ms
    );
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use gauge_common::M5_CORE2;

    use super::*;

    #[test]
    fn test_guarded_loop_renders_on_virtual_time() {
        let ticks = TickCounter::new();
        let demo = demo_gauges(&M5_CORE2.display);
        let gauges = demo.gauges();
        let scene = demo.scene(&gauges);
        let mut allocator = BudgetAllocator::new(HEAP_BUDGET);
        let prepared = setup(
            &M5_CORE2,
            &ticks,
            |display| Ok::<_, Infallible>(SimulatorSink::new(display)),
            &mut allocator,
            &mut ManualTicks,
            &scene,
        )
        .expect("setup");
        assert_eq!(prepared.mode, RenderMode::Guarded);

        let shared = SharedGui::new(prepared.gui);
        let pacer = VirtualPacer::new(&ticks, prepared.timing.tick_period_ms);
        let mut render = RenderLoop::new(&shared, prepared.sink, pacer, &ticks, &prepared.timing);
        block_on(render.run_cycles(50));

        let stats = block_on(render.stats());
        assert_eq!(stats.cycles, 50);
        assert!(stats.flushes > 0);
        assert_eq!(stats.failed_flushes, 0);
        assert_eq!(ticks.now(), 50 * prepared.timing.loop_period_ms);
        assert!(render.sink().stripes() > 0);
    }
}
