//! Round meter with a tick scale and value indicators.
//!
//! # Geometry
//!
//! The meter is a square card. The scale is drawn on a circle of radius
//! `size / 2 - PAD` around the card centre. Angles are in degrees,
//! clockwise from 3 o'clock (screen y grows downwards):
//!
//! ```text
//! angle(v) = rotation + (v - min) * angle_range / (max - min)
//! ```
//!
//! With the default rotation of 135 and range of 270 the scale starts at
//! the lower left, passes through 12 o'clock and ends at the lower right.
//!
//! # Indicators
//!
//! - **Arc**: a stroke along the scale between two values
//! - **Scale lines**: recolors the ticks whose value lies in a range
//! - **Needle**: a line from the centre to one value
//!
//! Draw order is card, arcs, ticks (with scale-line colors), major labels,
//! needles, then the centre knob.

use core::f32::consts::PI;
use core::fmt::Write;

use embedded_graphics::Drawable;
use embedded_graphics::geometry::{Angle, Point, Size};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::{DrawTarget, Primitive, RgbColor};
use embedded_graphics::primitives::{
    Arc,
    Circle,
    Line,
    PrimitiveStyle,
    PrimitiveStyleBuilder,
    Rectangle,
    RoundedRectangle,
    StrokeAlignment,
};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use heapless::{String, Vec};
use micromath::F32;

use super::geometry::Align;
use super::label::LabelFont;
use crate::area::{expand, spanning};
use crate::colors::{BLACK, CARD_BORDER, GREY, PINK, WHITE};
use crate::error::GuiError;
use crate::invalidate::InvalidAreas;

/// Most indicators on one meter.
pub const MAX_INDICATORS: usize = 8;

/// Inner padding between the card edge and the scale.
const PAD: u32 = 10;

/// Card corner radius.
const CARD_RADIUS: u32 = 12;

/// Card border width.
const CARD_BORDER_WIDTH: u32 = 2;

/// Diameter of the knob covering the needle pivot.
const KNOB_DIAMETER: u32 = 15;

// =============================================================================
// Scale
// =============================================================================

/// Evenly spaced small ticks along the whole scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MinorTicks {
    pub count: u16,
    pub width: u32,
    pub length: u32,
    pub color: Rgb565,
}

/// Every `every`-th tick drawn larger and labelled with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MajorTicks {
    pub every: u16,
    pub width: u32,
    pub length: u32,
    pub color: Rgb565,
    /// Distance between the tick's inner end and its label centre.
    pub label_gap: u32,
    pub label_font: LabelFont,
}

/// Value range, angular layout and ticks of a meter scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScaleSpec {
    pub min: i32,
    pub max: i32,
    /// Degrees covered by the scale.
    pub angle_range: u16,
    /// Angle of `min`, clockwise from 3 o'clock.
    pub rotation: u16,
    pub minor: MinorTicks,
    pub major: Option<MajorTicks>,
}

impl ScaleSpec {
    /// 0..100 over 270 degrees with plain pink ticks.
    pub const fn new() -> Self {
        Self {
            min: 0,
            max: 100,
            angle_range: 270,
            rotation: 135,
            minor: MinorTicks {
                count: 41,
                width: 2,
                length: 10,
                color: PINK,
            },
            major: None,
        }
    }

    /// Angle of `value`, clamped to the scale.
    pub fn angle_of(
        &self,
        value: i32,
    ) -> f32 {
        let min = self.min as i64;
        let span = (self.max as i64 - min).max(1);
        let value = (value as i64).max(min).min(min + span);
        self.rotation as f32 + (value - min) as f32 * self.angle_range as f32 / span as f32
    }

    /// Value represented by minor tick `index`.
    pub fn tick_value(
        &self,
        index: u16,
    ) -> i32 {
        let steps = self.minor.count.saturating_sub(1).max(1) as i64;
        let min = self.min as i64;
        let value = min + (self.max as i64 - min) * index as i64 / steps;
        value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }

    /// Angle of minor tick `index`.
    fn tick_angle(
        &self,
        index: u16,
    ) -> f32 {
        let steps = self.minor.count.saturating_sub(1).max(1) as f32;
        self.rotation as f32 + index as f32 * self.angle_range as f32 / steps
    }
}

impl Default for ScaleSpec {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Indicators
// =============================================================================

/// How an indicator is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndicatorKind {
    /// Stroke of `width` whose outer edge sits `r_mod` outside the scale.
    Arc { width: u32, color: Rgb565, r_mod: i32 },
    /// Recolor ticks in range, blending from `color_start` to `color_end`.
    ScaleLines { color_start: Rgb565, color_end: Rgb565 },
    /// Line to the value, ending `r_mod` outside the scale.
    Needle { width: u32, color: Rgb565, r_mod: i32 },
}

/// An indicator and the values it currently shows.
///
/// Needles use `end`; arcs and scale lines cover `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Indicator {
    pub kind: IndicatorKind,
    pub start: i32,
    pub end: i32,
}

impl Indicator {
    /// Arc over `start..=end`.
    pub const fn arc(
        width: u32,
        color: Rgb565,
        r_mod: i32,
        start: i32,
        end: i32,
    ) -> Self {
        Self {
            kind: IndicatorKind::Arc { width, color, r_mod },
            start,
            end,
        }
    }

    /// Single-color scale lines over `start..=end`.
    pub const fn scale_lines(
        color: Rgb565,
        start: i32,
        end: i32,
    ) -> Self {
        Self {
            kind: IndicatorKind::ScaleLines {
                color_start: color,
                color_end: color,
            },
            start,
            end,
        }
    }

    /// Needle pointing at `value`.
    pub const fn needle(
        width: u32,
        color: Rgb565,
        r_mod: i32,
        value: i32,
    ) -> Self {
        Self {
            kind: IndicatorKind::Needle { width, color, r_mod },
            start: value,
            end: value,
        }
    }

    #[inline]
    pub const fn is_needle(&self) -> bool { matches!(self.kind, IndicatorKind::Needle { .. }) }
}

// =============================================================================
// Meter
// =============================================================================

/// Declarative description of a meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterSpec<'a> {
    pub align: Align,
    pub offset: Point,
    /// Edge length of the square card.
    pub size: u32,
    pub scale: ScaleSpec,
    pub indicators: &'a [Indicator],
}

/// A placed meter.
#[derive(Debug, Clone)]
pub struct Meter {
    bounds: Rectangle,
    scale: ScaleSpec,
    indicators: Vec<Indicator, MAX_INDICATORS>,
}

impl Meter {
    /// Create and lay out a meter inside `parent`.
    pub fn new(
        spec: &MeterSpec<'_>,
        parent: &Rectangle,
    ) -> Result<Self, GuiError> {
        let indicators = Vec::from_slice(spec.indicators).map_err(|_| GuiError::Capacity)?;
        Ok(Self {
            bounds: spec.align.resolve(parent, Size::new(spec.size, spec.size), spec.offset),
            scale: spec.scale,
            indicators,
        })
    }

    /// Screen area covered by the card.
    #[inline]
    pub fn bounds(&self) -> Rectangle { self.bounds }

    #[inline]
    pub fn scale(&self) -> &ScaleSpec { &self.scale }

    #[inline]
    pub fn indicators(&self) -> &[Indicator] { &self.indicators }

    /// Centre of the scale circle.
    #[inline]
    pub fn center(&self) -> Point { self.bounds.center() }

    /// Radius of the scale circle.
    pub fn radius(&self) -> i32 {
        let size = self.bounds.size.width.min(self.bounds.size.height);
        (size / 2).saturating_sub(PAD) as i32
    }

    /// Current value of indicator `index`.
    pub fn indicator(
        &self,
        index: usize,
    ) -> Result<&Indicator, GuiError> {
        self.indicators.get(index).ok_or(GuiError::IndicatorOutOfRange)
    }

    /// Point both ends of indicator `index` at `value`.
    ///
    /// A moved needle invalidates only its old and new extent; any other
    /// indicator invalidates the whole meter.
    pub fn set_indicator_value(
        &mut self,
        index: usize,
        value: i32,
        invalid: &mut InvalidAreas,
    ) -> Result<(), GuiError> {
        self.update_indicator(index, value, value, invalid)
    }

    /// Set the range covered by an arc or scale-line indicator.
    pub fn set_indicator_range(
        &mut self,
        index: usize,
        start: i32,
        end: i32,
        invalid: &mut InvalidAreas,
    ) -> Result<(), GuiError> {
        self.update_indicator(index, start, end, invalid)
    }

    fn update_indicator(
        &mut self,
        index: usize,
        start: i32,
        end: i32,
        invalid: &mut InvalidAreas,
    ) -> Result<(), GuiError> {
        let indicator = *self.indicator(index)?;
        if indicator.start == start && indicator.end == end {
            return Ok(());
        }

        if indicator.is_needle() {
            invalid.add(self.needle_bounds(&indicator));
        }
        if let Some(slot) = self.indicators.get_mut(index) {
            slot.start = start;
            slot.end = end;
        }
        match self.indicators.get(index) {
            Some(updated) if updated.is_needle() => invalid.add(self.needle_bounds(updated)),
            _ => invalid.add(self.bounds),
        }
        Ok(())
    }

    /// Point on the circle of `radius` at `angle_deg`.
    fn polar(
        &self,
        radius: i32,
        angle_deg: f32,
    ) -> Point {
        let rad = angle_deg * (PI / 180.0);
        let x = F32(rad).cos().0 * radius as f32;
        let y = F32(rad).sin().0 * radius as f32;
        self.center() + Point::new(F32(x).round().0 as i32, F32(y).round().0 as i32)
    }

    /// Screen area a needle occupies, knob included.
    fn needle_bounds(
        &self,
        indicator: &Indicator,
    ) -> Rectangle {
        let (width, r_mod) = match indicator.kind {
            IndicatorKind::Needle { width, r_mod, .. } => (width, r_mod),
            _ => (1, 0),
        };
        let tip = self.polar(self.radius() + r_mod, self.scale.angle_of(indicator.end));
        let margin = (width / 2).max(KNOB_DIAMETER / 2) + 2;
        expand(&spanning(self.center(), tip), margin)
    }

    /// Color of the tick at `value`, taking scale-line indicators into
    /// account; later indicators win.
    fn tick_color(
        &self,
        value: i32,
        base: Rgb565,
    ) -> Rgb565 {
        let mut color = base;
        for indicator in &self.indicators {
            if let IndicatorKind::ScaleLines { color_start, color_end } = indicator.kind {
                let (lo, hi) = (indicator.start.min(indicator.end), indicator.start.max(indicator.end));
                if (lo..=hi).contains(&value) {
                    color = blend(color_start, color_end, value as i64 - lo as i64, hi as i64 - lo as i64);
                }
            }
        }
        color
    }

    /// Draw the whole meter.
    pub fn draw<D>(
        &self,
        display: &mut D,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        self.draw_card(display);
        for indicator in &self.indicators {
            if let IndicatorKind::Arc { width, color, r_mod } = indicator.kind {
                self.draw_arc(display, indicator, width, color, r_mod);
            }
        }
        self.draw_ticks(display);
        for indicator in &self.indicators {
            if let IndicatorKind::Needle { width, color, r_mod } = indicator.kind {
                let tip = self.polar(self.radius() + r_mod, self.scale.angle_of(indicator.end));
                Line::new(self.center(), tip)
                    .into_styled(PrimitiveStyle::with_stroke(color, width))
                    .draw(display)
                    .ok();
            }
        }
        Circle::with_center(self.center(), KNOB_DIAMETER)
            .into_styled(PrimitiveStyle::with_fill(GREY))
            .draw(display)
            .ok();
    }

    fn draw_card<D>(
        &self,
        display: &mut D,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        let style = PrimitiveStyleBuilder::new()
            .fill_color(WHITE)
            .stroke_color(CARD_BORDER)
            .stroke_width(CARD_BORDER_WIDTH)
            .stroke_alignment(StrokeAlignment::Inside)
            .build();
        RoundedRectangle::with_equal_corners(self.bounds, Size::new(CARD_RADIUS, CARD_RADIUS))
            .into_styled(style)
            .draw(display)
            .ok();
    }

    fn draw_arc<D>(
        &self,
        display: &mut D,
        indicator: &Indicator,
        width: u32,
        color: Rgb565,
        r_mod: i32,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        let outer = self.radius() + r_mod;
        if outer <= 0 {
            return;
        }
        let start = self.scale.angle_of(indicator.start.min(indicator.end));
        let end = self.scale.angle_of(indicator.start.max(indicator.end));
        let style = PrimitiveStyleBuilder::new()
            .stroke_color(color)
            .stroke_width(width)
            .stroke_alignment(StrokeAlignment::Inside)
            .build();
        Arc::with_center(
            self.center(),
            outer as u32 * 2,
            Angle::from_degrees(start),
            Angle::from_degrees(end - start),
        )
        .into_styled(style)
        .draw(display)
        .ok();
    }

    fn draw_ticks<D>(
        &self,
        display: &mut D,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        let radius = self.radius();
        for index in 0..self.scale.minor.count {
            let value = self.scale.tick_value(index);
            let angle = self.scale.tick_angle(index);
            let major = self
                .scale
                .major
                .filter(|major| major.every > 0 && index % major.every == 0);

            let (width, length, base) = match major {
                Some(major) => (major.width, major.length, major.color),
                None => (self.scale.minor.width, self.scale.minor.length, self.scale.minor.color),
            };
            let color = self.tick_color(value, base);

            let outer = self.polar(radius, angle);
            let inner = self.polar(radius - length as i32, angle);
            Line::new(inner, outer)
                .into_styled(PrimitiveStyle::with_stroke(color, width))
                .draw(display)
                .ok();

            if let Some(major) = major {
                let at = self.polar(radius - length as i32 - major.label_gap as i32, angle);
                draw_value_label(display, value, at, major.label_font, major.color);
            }
        }
    }
}

/// Linear blend from `from` to `to` at `pos` of `span`.
fn blend(
    from: Rgb565,
    to: Rgb565,
    pos: i64,
    span: i64,
) -> Rgb565 {
    if span <= 0 || from == to {
        return from;
    }
    let mix = |a: u8, b: u8| (a as i64 + (b as i64 - a as i64) * pos / span) as u8;
    Rgb565::new(mix(from.r(), to.r()), mix(from.g(), to.g()), mix(from.b(), to.b()))
}

/// Numeric tick label centred on `at`.
fn draw_value_label<D>(
    display: &mut D,
    value: i32,
    at: Point,
    font: LabelFont,
    color: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    let mut text: String<12> = String::new();
    if write!(text, "{value}").is_err() {
        return;
    }
    let text_style = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build();
    Text::with_text_style(&text, at, MonoTextStyle::new(font.mono(), color), text_style)
        .draw(display)
        .ok();
}

/// Default major tick style.
pub const MAJOR_TICKS: MajorTicks = MajorTicks {
    every: 8,
    width: 4,
    length: 15,
    color: BLACK,
    label_gap: 10,
    label_font: LabelFont::Pt12,
};

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::{contains, pixel_count};
    use crate::canvas::StripeCanvas;
    use crate::colors::{BLUE, RED};

    const INDICATORS: [Indicator; 3] = [
        Indicator::scale_lines(BLUE, 0, 20),
        Indicator::arc(3, RED, 0, 80, 100),
        Indicator::needle(4, GREY, -10, 0),
    ];

    /// Never produced by the meter palette.
    const UNTOUCHED: Rgb565 = Rgb565::new(1, 1, 1);

    fn screen() -> Rectangle { Rectangle::new(Point::zero(), Size::new(320, 240)) }

    fn meter() -> Meter {
        let spec = MeterSpec {
            align: Align::Center,
            offset: Point::zero(),
            size: 200,
            scale: ScaleSpec {
                major: Some(MAJOR_TICKS),
                ..ScaleSpec::new()
            },
            indicators: &INDICATORS,
        };
        Meter::new(&spec, &screen()).expect("meter")
    }

    fn render(m: &Meter) -> std::vec::Vec<Rgb565> {
        let mut pixels = std::vec![UNTOUCHED; pixel_count(&screen()) as usize];
        let mut canvas = StripeCanvas::new(&mut pixels, screen(), false);
        m.draw(&mut canvas);
        pixels
    }

    fn at(
        pixels: &[Rgb565],
        p: Point,
    ) -> Rgb565 {
        pixels[p.y as usize * 320 + p.x as usize]
    }

    #[test]
    fn test_scale_angles() {
        let scale = ScaleSpec::new();
        assert_eq!(scale.angle_of(0), 135.0);
        assert_eq!(scale.angle_of(50), 270.0);
        assert_eq!(scale.angle_of(100), 405.0);
        // Out of range values are clamped
        assert_eq!(scale.angle_of(150), 405.0);
        assert_eq!(scale.tick_value(40), 100);
        assert_eq!(scale.tick_value(8), 20);
    }

    #[test]
    fn test_full_i32_scale() {
        let scale = ScaleSpec {
            min: i32::MIN,
            max: i32::MAX,
            ..ScaleSpec::new()
        };
        assert!((scale.angle_of(0) - 270.0).abs() < 0.01);
        assert_eq!(scale.angle_of(i32::MIN), 135.0);
        assert_eq!(scale.angle_of(i32::MAX), 405.0);
        assert_eq!(scale.tick_value(0), i32::MIN);
        assert_eq!(scale.tick_value(20), -1);
        assert_eq!(scale.tick_value(40), i32::MAX);

        // Inverted range holds at the minimum instead of panicking
        let inverted = ScaleSpec {
            min: 100,
            max: 0,
            ..ScaleSpec::new()
        };
        assert_eq!(inverted.angle_of(50), 135.0);
    }

    #[test]
    fn test_layout() {
        let m = meter();
        assert_eq!(m.bounds().top_left, Point::new(60, 20));
        assert_eq!(m.bounds().size, Size::new(200, 200));
        assert_eq!(m.radius(), 90);
    }

    #[test]
    fn test_scale_lines_recolor_ticks() {
        let m = meter();
        assert_eq!(m.tick_color(10, PINK), BLUE);
        assert_eq!(m.tick_color(20, BLACK), BLUE);
        assert_eq!(m.tick_color(50, PINK), PINK);
    }

    #[test]
    fn test_blend() {
        assert_eq!(blend(BLUE, BLUE, 3, 10), BLUE);
        assert_eq!(blend(Rgb565::BLACK, Rgb565::new(30, 60, 30), 5, 10), Rgb565::new(15, 30, 15));
        assert_eq!(
            blend(Rgb565::BLACK, Rgb565::new(30, 60, 30), i32::MAX as i64, u32::MAX as i64),
            Rgb565::new(15, 30, 15)
        );
    }

    #[test]
    fn test_needle_move_invalidates_old_and_new_extent() {
        let mut m = meter();
        let mut invalid = InvalidAreas::new(screen());
        m.set_indicator_value(2, 100, &mut invalid).expect("needle");

        assert_eq!(m.indicator(2).map(|i| i.end), Ok(100));
        assert!(!invalid.is_empty());
        for area in invalid.areas() {
            assert!(contains(&m.bounds(), area));
        }
        // Both extents together stay well below the whole card
        let covered: u32 = invalid.areas().iter().map(pixel_count).sum();
        assert!(covered < pixel_count(&m.bounds()));
    }

    #[test]
    fn test_unchanged_value_invalidates_nothing() {
        let mut m = meter();
        let mut invalid = InvalidAreas::new(screen());
        m.set_indicator_value(2, 0, &mut invalid).expect("needle");
        assert!(invalid.is_empty());
    }

    #[test]
    fn test_arc_change_invalidates_meter() {
        let mut m = meter();
        let mut invalid = InvalidAreas::new(screen());
        m.set_indicator_range(1, 70, 100, &mut invalid).expect("arc");
        assert_eq!(invalid.areas(), &[m.bounds()]);
    }

    #[test]
    fn test_bad_indicator_index() {
        let mut m = meter();
        let mut invalid = InvalidAreas::new(screen());
        assert_eq!(m.set_indicator_value(7, 1, &mut invalid), Err(GuiError::IndicatorOutOfRange));
    }

    #[test]
    fn test_too_many_indicators() {
        let many = [Indicator::needle(1, GREY, 0, 0); MAX_INDICATORS + 1];
        let spec = MeterSpec {
            align: Align::Center,
            offset: Point::zero(),
            size: 100,
            scale: ScaleSpec::new(),
            indicators: &many,
        };
        assert_eq!(Meter::new(&spec, &screen()).err(), Some(GuiError::Capacity));
    }

    #[test]
    fn test_draw_stays_inside_card() {
        let m = meter();
        let pixels = render(&m);
        for y in 0..240 {
            for x in 0..320 {
                let p = Point::new(x, y);
                if at(&pixels, p) != UNTOUCHED {
                    assert!(contains(&m.bounds(), &Rectangle::new(p, Size::new(1, 1))), "drawn outside at {p:?}");
                }
            }
        }
        assert_eq!(at(&pixels, m.center()), GREY);
        // Inside the border, above the scale
        assert_eq!(at(&pixels, m.bounds().top_left + Point::new(100, 5)), WHITE);
    }

    #[test]
    fn test_needle_points_lower_left_at_minimum() {
        let m = meter();
        let pixels = render(&m);
        assert_eq!(at(&pixels, m.center() + Point::new(-30, 30)), GREY);
        assert_ne!(at(&pixels, m.center() + Point::new(30, 30)), GREY);
    }
}
