//! PMU bring-up as data.
//!
//! A board that powers its panel through a PMU describes the bring-up as a
//! list of [`PowerStep`]s. [`apply_power_sequence`] walks the list over any
//! `embedded-hal` I2C bus, in order, waiting each step's settle delay before
//! the next one. The first failing transaction stops the sequence.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::error::PowerError;

/// I2C address of the AXP192 on the M5Stack Core2.
pub const AXP192_ADDR: u8 = 0x34;

/// What to do with one register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegOp {
    /// Write the value as is.
    Write(u8),
    /// Read the register, keep the bits in `keep`, OR in `set`, write back.
    Update { keep: u8, set: u8 },
}

impl RegOp {
    /// Value to write given the current register contents.
    #[inline]
    pub const fn apply(
        self,
        current: u8,
    ) -> u8 {
        match self {
            Self::Write(value) => value,
            Self::Update { keep, set } => (current & keep) | set,
        }
    }
}

/// One register operation and the time to wait after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerStep {
    pub reg: u8,
    pub op: RegOp,
    pub delay_ms: u32,
}

impl PowerStep {
    pub const fn write(
        reg: u8,
        value: u8,
    ) -> Self {
        Self {
            reg,
            op: RegOp::Write(value),
            delay_ms: 0,
        }
    }

    pub const fn update(
        reg: u8,
        keep: u8,
        set: u8,
    ) -> Self {
        Self {
            reg,
            op: RegOp::Update { keep, set },
            delay_ms: 0,
        }
    }

    pub const fn set_bits(
        reg: u8,
        mask: u8,
    ) -> Self {
        Self::update(reg, 0xFF, mask)
    }

    pub const fn clear_bits(
        reg: u8,
        mask: u8,
    ) -> Self {
        Self::update(reg, !mask, 0)
    }

    /// Wait `delay_ms` after this step.
    pub const fn then_wait(
        mut self,
        delay_ms: u32,
    ) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

// =============================================================================
// M5Stack Core2
// =============================================================================

/// Settle time on each side of the LCD reset edge.
pub const LCD_RESET_SETTLE_MS: u32 = 100;

/// AXP192 bring-up for the M5Stack Core2.
///
/// Rails: DCDC1 3.35 V (ESP32), DCDC3 2.8 V (backlight), LDO2 3.3 V (LCD
/// logic), LDO3 off (vibration motor). GPIO4 drives the LCD reset line.
pub const CORE2_POWER_SEQUENCE: [PowerStep; 20] = [
    // VBUS path without current limit
    PowerStep::update(0x30, 0x04, 0x02),
    // GPIO1 (LED) and GPIO2 (speaker enable) as open-drain outputs
    PowerStep::clear_bits(0x92, 0x07),
    PowerStep::clear_bits(0x93, 0x07),
    // Backup battery charging, 3.0 V / 200 uA
    PowerStep::update(0x35, 0x1C, 0xA2),
    // DCDC1 = 3.35 V, DCDC3 = 2.8 V (25 mV steps from 0.7 V)
    PowerStep::write(0x26, 0x6A),
    PowerStep::write(0x27, 0x54),
    // LDO2 = 3.3 V in the high nibble, LDO3 = 2.0 V in the low one
    PowerStep::update(0x28, 0x0F, 0xF0),
    PowerStep::update(0x28, 0xF0, 0x02),
    // LDO2 and DCDC3 on
    PowerStep::set_bits(0x12, 0x04),
    PowerStep::set_bits(0x12, 0x02),
    // Power LED on
    PowerStep::clear_bits(0x94, 0x02),
    // Vibration motor off
    PowerStep::clear_bits(0x12, 0x08),
    // GPIO4 as NMOS open-drain output
    PowerStep::update(0x95, 0x72, 0x84),
    // Power key timing and all ADCs on
    PowerStep::write(0x36, 0x4C),
    PowerStep::write(0x82, 0xFF).then_wait(LCD_RESET_SETTLE_MS),
    // LCD reset pulse
    PowerStep::clear_bits(0x96, 0x02).then_wait(LCD_RESET_SETTLE_MS),
    PowerStep::set_bits(0x96, 0x02).then_wait(LCD_RESET_SETTLE_MS),
    // GPIO0 as 3.3 V LDO for the M-Bus, EXTEN (5 V boost) on
    PowerStep::update(0x91, 0x0F, 0xF0),
    PowerStep::update(0x90, 0xF8, 0x02),
    PowerStep::set_bits(0x12, 0x40),
];

// =============================================================================
// Sequence Runner
// =============================================================================

/// Apply `steps` to the device at `addr`, in order.
pub fn apply_power_sequence<I, D>(
    i2c: &mut I,
    addr: u8,
    steps: &[PowerStep],
    delay: &mut D,
) -> Result<(), PowerError<I::Error>>
where
    I: I2c,
    D: DelayNs,
{
    for step in steps {
        let reg = step.reg;
        let bus = |source| PowerError::Bus { reg, source };

        let value = match step.op {
            RegOp::Write(value) => value,
            RegOp::Update { .. } => {
                let mut current = [0u8];
                i2c.write_read(addr, &[reg], &mut current).map_err(bus)?;
                step.op.apply(current[0])
            }
        };
        i2c.write(addr, &[reg, value]).map_err(bus)?;
        debug!("pmu reg {=u8:#x} <- {=u8:#x}", reg, value);

        if step.delay_ms > 0 {
            delay.delay_ms(step.delay_ms);
        }
    }

    info!("pmu bring-up done: {} steps", steps.len());
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
