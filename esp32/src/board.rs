//! M5Stack Core2 wiring and panel bring-up.
//!
//! Pin mapping:
//! - LCD (ILI9342C, SPI): SCK GPIO18, MOSI GPIO23, MISO GPIO38, CS GPIO5,
//!   DC GPIO15
//! - LCD reset: AXP192 GPIO4 (handled by the power sequence)
//! - Internal I2C (AXP192, touch, RTC): SDA GPIO21, SCL GPIO22

use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::Blocking;
use esp_hal::delay::Delay;
use esp_hal::gpio::Output;
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::spi::Mode;
use esp_hal::time::Rate;
use gauge_common::{BoardProfile, DisplayConfig, M5_CORE2, SetupError};
use mipidsi::interface::SpiInterface;
use mipidsi::models::ILI9342CRgb565;
use mipidsi::options::{ColorInversion, ColorOrder};
use mipidsi::{Builder, NoResetPin};

use crate::panel::PanelSink;

/// Board this firmware is built for.
pub const PROFILE: BoardProfile = M5_CORE2;

/// Internal I2C bus clock.
pub const I2C_FREQUENCY_KHZ: u32 = 400;

/// LCD SPI clock. The ILI9342C is specified for 40 MHz writes.
pub const LCD_SPI_FREQUENCY_MHZ: u32 = 40;

/// Bytes batched by the SPI interface before a transfer.
pub const SPI_BATCH_BYTES: usize = 512;

pub type LcdSpi = ExclusiveDevice<Spi<'static, Blocking>, Output<'static>, Delay>;

/// ILI9342C on the Core2; reset is driven by the PMU.
pub type Core2Display = mipidsi::Display<SpiInterface<'static, LcdSpi, Output<'static>>, ILI9342CRgb565, NoResetPin>;

pub fn lcd_spi_config() -> SpiConfig {
    SpiConfig::default()
        .with_frequency(Rate::from_mhz(LCD_SPI_FREQUENCY_MHZ))
        .with_mode(Mode::_0)
}

/// Initialize the panel for `config`.
///
/// Runs as the first setup step, after the power sequence released the
/// LCD from reset.
pub fn init_panel(
    spi: LcdSpi,
    dc: Output<'static>,
    buffer: &'static mut [u8],
    config: &DisplayConfig,
) -> Result<PanelSink, SetupError> {
    let di = SpiInterface::new(spi, dc, buffer);
    let mut delay = Delay::new();
    let display = Builder::new(ILI9342CRgb565, di)
        .display_size(config.width, config.height)
        .color_order(ColorOrder::Bgr)
        .invert_colors(ColorInversion::Inverted)
        .init(&mut delay)
        .map_err(|_| SetupError::PanelInit)?;
    Ok(PanelSink::new(display))
}
