//! Flush sink writing stripes to the ILI9342C.

use defmt::warn;
use gauge_common::{DisplayError, FlushReady, FlushRequest, FlushSink};

use crate::board::Core2Display;

/// The panel as seen by the render loop.
///
/// Writes are blocking: when `flush` returns, the pixels have left the
/// buffer and the request is acknowledged with the transfer result.
pub struct PanelSink {
    display: Core2Display,
}

impl PanelSink {
    pub fn new(display: Core2Display) -> Self { Self { display } }
}

impl FlushSink for PanelSink {
    fn flush(
        &mut self,
        request: FlushRequest<'_>,
    ) -> FlushReady {
        let area = request.area();
        let Some(bottom_right) = area.bottom_right() else {
            return request.ready();
        };

        let result = self.display.set_pixels(
            area.top_left.x as u16,
            area.top_left.y as u16,
            bottom_right.x as u16,
            bottom_right.y as u16,
            request.pixels().iter().copied(),
        );
        match result {
            Ok(()) => request.ready(),
            Err(_) => {
                warn!("SPI write failed for stripe seq {}", request.seq());
                request.failed(DisplayError::Transport)
            }
        }
    }
}
