//! Flush contract between the engine and the panel.
//!
//! The engine hands a rendered stripe to a [`FlushSink`] as a
//! [`FlushRequest`]. The request borrows the stripe buffer, so the sink can
//! only read the pixels for the duration of the call. The sink answers with
//! a [`FlushReady`] token, which can only be produced by consuming the
//! request: every request is acknowledged exactly once, success or failure.
//!
//! Sinks return after the transport has taken all pixels (blocking write).
//! The engine reuses the buffer as soon as it has the token.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::primitives::Rectangle;

use crate::error::DisplayError;

/// One rendered stripe waiting to be written to the panel.
#[derive(Debug)]
pub struct FlushRequest<'p> {
    area: Rectangle,
    pixels: &'p [Rgb565],
    seq: u32,
}

impl<'p> FlushRequest<'p> {
    /// Request for `pixels`, row-major over `area`.
    pub fn new(
        area: Rectangle,
        pixels: &'p [Rgb565],
        seq: u32,
    ) -> Self {
        Self { area, pixels, seq }
    }

    /// Screen area covered by the pixels.
    #[inline]
    pub fn area(&self) -> Rectangle { self.area }

    /// Pixels in row-major order, `area.size.width` per row.
    #[inline]
    pub fn pixels(&self) -> &'p [Rgb565] { self.pixels }

    /// Sequence number assigned by the engine.
    #[inline]
    pub fn seq(&self) -> u32 { self.seq }

    /// The pixels were handed off to the panel.
    pub fn ready(self) -> FlushReady {
        FlushReady {
            seq: self.seq,
            result: Ok(()),
        }
    }

    /// The write failed; the engine may retry with a new request.
    pub fn failed(
        self,
        err: DisplayError,
    ) -> FlushReady {
        FlushReady {
            seq: self.seq,
            result: Err(err),
        }
    }
}

/// Acknowledgment for exactly one [`FlushRequest`].
#[must_use = "the engine needs the acknowledgment to reuse the buffer"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlushReady {
    seq: u32,
    result: Result<(), DisplayError>,
}

impl FlushReady {
    /// Sequence number of the acknowledged request.
    #[inline]
    pub fn seq(&self) -> u32 { self.seq }

    /// Outcome of the write.
    #[inline]
    pub fn result(&self) -> Result<(), DisplayError> { self.result }
}

/// Something that writes stripes to a panel.
pub trait FlushSink {
    /// Write `request` and acknowledge it.
    fn flush(
        &mut self,
        request: FlushRequest<'_>,
    ) -> FlushReady;
}

impl<S: FlushSink + ?Sized> FlushSink for &mut S {
    fn flush(
        &mut self,
        request: FlushRequest<'_>,
    ) -> FlushReady {
        (**self).flush(request)
    }
}

// =============================================================================
// Tests
// =============================================================================
