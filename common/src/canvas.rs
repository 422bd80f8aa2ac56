//! Draw target over one stripe buffer.
//!
//! A [`StripeCanvas`] maps absolute screen coordinates onto a stripe buffer
//! that holds only `area`. Widgets draw in screen coordinates as if the
//! whole display were available; everything outside the stripe is clipped.

use core::convert::Infallible;

use embedded_graphics::Pixel;
use embedded_graphics::geometry::Dimensions;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::{DrawTarget, Point};
use embedded_graphics::primitives::{PointsIter, Rectangle};

use crate::area::is_empty;
use crate::colors::to_monochrome;

/// Stripe buffer seen as a draw target positioned at `area`.
pub struct StripeCanvas<'a> {
    pixels: &'a mut [Rgb565],
    area: Rectangle,
    monochrome: bool,
}

impl<'a> StripeCanvas<'a> {
    /// Wrap the first `area` pixels of `pixels`.
    ///
    /// `pixels` must hold at least `area.size.width * area.size.height`
    /// pixels; the rest of the slice is left untouched.
    pub fn new(
        pixels: &'a mut [Rgb565],
        area: Rectangle,
        monochrome: bool,
    ) -> Self {
        let len = (area.size.width * area.size.height) as usize;
        let len = len.min(pixels.len());
        Self {
            pixels: &mut pixels[..len],
            area,
            monochrome,
        }
    }

    /// Rendered pixels, row-major over `area`.
    #[inline]
    pub fn pixels(&self) -> &[Rgb565] { self.pixels }

    #[inline]
    fn convert(
        &self,
        color: Rgb565,
    ) -> Rgb565 {
        if self.monochrome { to_monochrome(color) } else { color }
    }

    #[inline]
    fn index(
        &self,
        point: Point,
    ) -> Option<usize> {
        let x = point.x - self.area.top_left.x;
        let y = point.y - self.area.top_left.y;
        if x < 0 || y < 0 || x >= self.area.size.width as i32 || y >= self.area.size.height as i32 {
            return None;
        }
        let idx = y as usize * self.area.size.width as usize + x as usize;
        (idx < self.pixels.len()).then_some(idx)
    }
}

impl Dimensions for StripeCanvas<'_> {
    fn bounding_box(&self) -> Rectangle { self.area }
}

impl DrawTarget for StripeCanvas<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(idx) = self.index(point) {
                self.pixels[idx] = self.convert(color);
            }
        }
        Ok(())
    }

    fn fill_contiguous<I>(
        &mut self,
        area: &Rectangle,
        colors: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        // Colors are ordered over the unclipped area, so walk all of it
        let mut colors = colors.into_iter();
        for point in area.points() {
            let Some(color) = colors.next() else {
                break;
            };
            if let Some(idx) = self.index(point) {
                self.pixels[idx] = self.convert(color);
            }
        }
        Ok(())
    }

    fn fill_solid(
        &mut self,
        area: &Rectangle,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        let drawable = area.intersection(&self.area);
        if is_empty(&drawable) {
            return Ok(());
        }
        let color = self.convert(color);
        let stride = self.area.size.width as usize;
        let x0 = (drawable.top_left.x - self.area.top_left.x) as usize;
        let y0 = (drawable.top_left.y - self.area.top_left.y) as usize;
        let width = drawable.size.width as usize;

        for row in y0..y0 + drawable.size.height as usize {
            let start = row * stride + x0;
            if let Some(span) = self.pixels.get_mut(start..start + width) {
                span.fill(color);
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
