//! Gauge demo firmware for the M5Stack Core2 (ESP32).
//!
//! Two animated meters and a label on the 320x240 ILI9342C.
//!
//! # Architecture
//!
//! - Main task: brings up the AXP192, runs the setup sequence, spawns the
//!   tasks below, then logs loop statistics every few seconds
//! - Tick task: advances the shared millisecond counter every 1 ms
//! - Render task: runs the guarded render loop (animations, invalidation,
//!   stripe rendering and blocking SPI flushes) every 10 ms
//!
//! The main task reads statistics through the same mutex the render task
//! holds while it renders, so the two never touch the GUI at the same time.

#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

mod board;
mod panel;
mod tasks;

use defmt::{error, info};
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::spi::master::Spi;
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use gauge_common::buffer::BudgetAllocator;
use gauge_common::demo::demo_gauges;
use gauge_common::power::{AXP192_ADDR, CORE2_POWER_SEQUENCE, apply_power_sequence};
use gauge_common::stats::uptime_string;
use gauge_common::{RenderLoop, RenderMode, SharedGui, TickCounter, setup};
use {esp_backtrace as _, esp_println as _};

use crate::board::{I2C_FREQUENCY_KHZ, PROFILE, SPI_BATCH_BYTES};
use crate::tasks::{EmbassyPacer, EmbassyTickSource, render_task};

extern crate alloc;

esp_bootloader_esp_idf::esp_app_desc!();

macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write(($val));
        x
    }};
}

/// Heap for the stripe buffers and the widget tree.
const HEAP_SIZE: usize = 72 * 1024;

/// Seconds between two statistics lines.
const STATS_INTERVAL_S: u64 = 5;

/// Millisecond counter shared by the tick task and the render loop.
static TICKS: TickCounter = TickCounter::new();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let peripherals = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::max()));

    esp_alloc::heap_allocator!(size: HEAP_SIZE);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("gauge demo starting on {}", PROFILE.name);

    // Power rails and LCD reset
    if PROFILE.pmu_bring_up {
        let mut i2c = I2c::new(
            peripherals.I2C0,
            I2cConfig::default().with_frequency(Rate::from_khz(I2C_FREQUENCY_KHZ)),
        )
        .expect("I2C config")
        .with_sda(peripherals.GPIO21)
        .with_scl(peripherals.GPIO22);

        if let Err(err) = apply_power_sequence(&mut i2c, AXP192_ADDR, &CORE2_POWER_SEQUENCE, &mut Delay::new()) {
            error!("AXP192 bring-up failed: {}", err);
            panic!("PMU bring-up failed");
        }
    }

    // LCD transport
    let spi = Spi::new(peripherals.SPI2, board::lcd_spi_config())
        .expect("SPI config")
        .with_sck(peripherals.GPIO18)
        .with_mosi(peripherals.GPIO23)
        .with_miso(peripherals.GPIO38);
    let cs = Output::new(peripherals.GPIO5, Level::High, OutputConfig::default());
    let dc = Output::new(peripherals.GPIO15, Level::Low, OutputConfig::default());
    let spi_device = ExclusiveDevice::new(spi, cs, Delay::new()).expect("SPI device");
    let spi_buffer = mk_static!([u8; SPI_BATCH_BYTES], [0; SPI_BATCH_BYTES]);

    // Setup: panel, buffers, flush sink, tick task, scene
    let demo = demo_gauges(&PROFILE.display);
    let gauges = demo.gauges();
    let scene = demo.scene(&gauges);
    let mut allocator = BudgetAllocator::new(esp_alloc::HEAP.free());
    let mut tick_source = EmbassyTickSource::new(spawner);

    let prepared = match setup(
        &PROFILE,
        &TICKS,
        |display| board::init_panel(spi_device, dc, spi_buffer, display),
        &mut allocator,
        &mut tick_source,
        &scene,
    ) {
        Ok(prepared) => prepared,
        Err(err) => {
            error!("setup failed: {}", err);
            panic!("setup failed");
        }
    };
    info!("setup done, heap free: {} bytes", esp_alloc::HEAP.free());

    match prepared.mode {
        RenderMode::Guarded => {
            let gui = &*mk_static!(SharedGui, SharedGui::new(prepared.gui));
            spawner
                .spawn(render_task(gui, prepared.sink, &TICKS, prepared.timing))
                .expect("render task");

            loop {
                Timer::after(Duration::from_secs(STATS_INTERVAL_S)).await;
                let stats = *gui.lock().await.stats();
                info!("[{}] {}", uptime_string(TICKS.now()).as_str(), stats);
            }
        }
        RenderMode::SingleContext => {
            let mut render = RenderLoop::new(prepared.gui, prepared.sink, EmbassyPacer, &TICKS, &prepared.timing);
            render.run().await
        }
    }
}
