//! Flush sink backed by an in-memory simulator display.

use std::path::Path;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay};
use gauge_common::{DisplayConfig, FlushReady, FlushRequest, FlushSink};

/// Plays the panel: every flushed stripe is copied into the display image.
pub struct SimulatorSink {
    display: SimulatorDisplay<Rgb565>,
    stripes: u32,
    pixels: u64,
}

impl SimulatorSink {
    pub fn new(config: &DisplayConfig) -> Self {
        Self {
            display: SimulatorDisplay::new(config.size()),
            stripes: 0,
            pixels: 0,
        }
    }

    /// Stripes written so far.
    #[inline]
    pub fn stripes(&self) -> u32 { self.stripes }

    /// Pixels written so far.
    #[inline]
    pub fn pixels(&self) -> u64 { self.pixels }

    /// Write the current panel contents to `path` as a PNG.
    pub fn save_png(
        &self,
        path: &Path,
    ) -> Result<(), String> {
        let settings = OutputSettingsBuilder::new().scale(1).build();
        self.display
            .to_rgb_output_image(&settings)
            .save_png(path)
            .map_err(|err| err.to_string())
    }
}

impl FlushSink for SimulatorSink {
    fn flush(
        &mut self,
        request: FlushRequest<'_>,
    ) -> FlushReady {
        let area = request.area();
        self.display.fill_contiguous(&area, request.pixels().iter().copied()).ok();
        self.stripes += 1;
        self.pixels += request.pixels().len() as u64;
        request.ready()
    }
}
