//! Board profiles.
//!
//! A [`BoardProfile`] bundles everything that differs between the supported
//! boards: panel geometry, how the render loop is hosted, how many stripe
//! buffers to allocate and whether the PMU needs a bring-up sequence. The
//! firmware picks one profile at startup and passes it down; nothing else
//! branches on the board.

use embedded_graphics::geometry::Size;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::prelude::Point;

use super::timing::{
    BYTES_PER_PIXEL,
    FLUSH_RETRIES,
    GUARDED_LOOP_MS,
    REFRESH_PERIOD_MS,
    SINGLE_CONTEXT_LOOP_MS,
    STRIPE_ROWS,
    TICK_PERIOD_MS,
};
use crate::error::SetupError;

// =============================================================================
// Display
// =============================================================================

/// Panel geometry and capabilities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayConfig {
    /// Horizontal resolution in pixels.
    pub width: u16,
    /// Vertical resolution in pixels.
    pub height: u16,
    /// Panel refresh rate in Hz.
    pub refresh_rate: u8,
    /// Reduce every color to black/white before it reaches the buffer.
    pub monochrome: bool,
    /// The board has a touch controller.
    pub touch_enabled: bool,
}

impl DisplayConfig {
    /// Check the geometry is usable.
    pub const fn validate(&self) -> Result<(), SetupError> {
        if self.width == 0 || self.height == 0 {
            return Err(SetupError::InvalidConfig("display size must be non-zero"));
        }
        if self.refresh_rate == 0 {
            return Err(SetupError::InvalidConfig("refresh rate must be non-zero"));
        }
        Ok(())
    }

    /// Display size for embedded-graphics.
    pub const fn size(&self) -> Size { Size::new(self.width as u32, self.height as u32) }

    /// The whole screen as a rectangle at the origin.
    pub const fn screen(&self) -> Rectangle { Rectangle::new(Point::zero(), self.size()) }
}

// =============================================================================
// Render Mode
// =============================================================================

/// How the render loop is hosted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderMode {
    /// The loop runs in the same context that built the GUI; nothing else
    /// touches it, so no lock is taken.
    SingleContext,
    /// The loop runs in its own task and every GUI call, from any context,
    /// goes through one mutex.
    Guarded,
}

impl RenderMode {
    /// Sleep between two loop iterations.
    pub const fn loop_period_ms(self) -> u32 {
        match self {
            Self::SingleContext => SINGLE_CONTEXT_LOOP_MS,
            Self::Guarded => GUARDED_LOOP_MS,
        }
    }
}

// =============================================================================
// Buffers
// =============================================================================

/// Stripe buffer layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferConfig {
    /// Display rows held by one buffer.
    pub stripe_rows: u16,
    /// Number of buffers (1 or 2).
    pub count: u8,
    /// Buffers must come from DMA-capable memory.
    pub dma_capable: bool,
}

impl BufferConfig {
    /// Check the layout against the display.
    pub const fn validate(
        &self,
        display: &DisplayConfig,
    ) -> Result<(), SetupError> {
        if self.count == 0 || self.count > 2 {
            return Err(SetupError::InvalidConfig("buffer count must be 1 or 2"));
        }
        if self.stripe_rows == 0 || self.stripe_rows > display.height {
            return Err(SetupError::InvalidConfig("stripe rows must be within the display height"));
        }
        Ok(())
    }

    /// Pixels held by one buffer on `display`.
    pub const fn pixels(
        &self,
        display: &DisplayConfig,
    ) -> usize {
        display.width as usize * self.stripe_rows as usize
    }

    /// Bytes needed by one buffer on `display`.
    pub const fn bytes(
        &self,
        display: &DisplayConfig,
    ) -> usize {
        self.pixels(display) * BYTES_PER_PIXEL
    }
}

// =============================================================================
// Loop Timing
// =============================================================================

/// Cadence of the tick source, the loop and the redraw throttle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopTiming {
    /// Tick source period.
    pub tick_period_ms: u32,
    /// Sleep between loop iterations.
    pub loop_period_ms: u32,
    /// Minimum time between redraws.
    pub refresh_period_ms: u32,
    /// Retries for a failed stripe write.
    pub flush_retries: u8,
}

impl LoopTiming {
    /// Default timing for a render mode.
    pub const fn for_mode(mode: RenderMode) -> Self {
        Self {
            tick_period_ms: TICK_PERIOD_MS,
            loop_period_ms: mode.loop_period_ms(),
            refresh_period_ms: REFRESH_PERIOD_MS,
            flush_retries: FLUSH_RETRIES,
        }
    }
}

// =============================================================================
// Board Profiles
// =============================================================================

/// Everything board-specific, selected once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardProfile {
    /// Human-readable board name.
    pub name: &'static str,
    /// Panel geometry.
    pub display: DisplayConfig,
    /// Render loop hosting.
    pub mode: RenderMode,
    /// Stripe buffer layout.
    pub buffers: BufferConfig,
    /// The board powers its panel through a PMU that needs a bring-up
    /// sequence before the panel can be initialized.
    pub pmu_bring_up: bool,
}

impl BoardProfile {
    /// Loop timing for this board.
    pub const fn timing(&self) -> LoopTiming { LoopTiming::for_mode(self.mode) }

    /// Validate display and buffer configuration together.
    pub const fn validate(&self) -> Result<(), SetupError> {
        if let Err(err) = self.display.validate() {
            return Err(err);
        }
        self.buffers.validate(&self.display)
    }
}

/// M5Stack ATOM Display: 1280x720 HDMI output at 60 Hz, one 10-row stripe,
/// render loop in the setup context.
pub const ATOM_DISPLAY: BoardProfile = BoardProfile {
    name: "atom-display",
    display: DisplayConfig {
        width: 1280,
        height: 720,
        refresh_rate: 60,
        monochrome: false,
        touch_enabled: false,
    },
    mode: RenderMode::SingleContext,
    buffers: BufferConfig {
        stripe_rows: STRIPE_ROWS,
        count: 1,
        dma_capable: false,
    },
    pmu_bring_up: false,
};

/// M5Stack Core2: 320x240 ILI9342C over SPI with touch, AXP192 PMU, two
/// DMA-capable stripes, render loop in its own guarded task.
pub const M5_CORE2: BoardProfile = BoardProfile {
    name: "m5-core2",
    display: DisplayConfig {
        width: 320,
        height: 240,
        refresh_rate: 60,
        monochrome: false,
        touch_enabled: true,
    },
    mode: RenderMode::Guarded,
    buffers: BufferConfig {
        stripe_rows: STRIPE_ROWS,
        count: 2,
        dma_capable: true,
    },
    pmu_bring_up: true,
};

/// Look up a preset by name.
pub fn profile_by_name(name: &str) -> Option<BoardProfile> {
    [ATOM_DISPLAY, M5_CORE2].into_iter().find(|profile| profile.name == name)
}

// =============================================================================
// Tests
// =============================================================================
