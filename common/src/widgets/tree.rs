//! The screen and its widgets.
//!
//! Widgets are added once while the scene is built and addressed by
//! [`WidgetId`] afterwards. Every mutation records the affected screen
//! area in the tree's [`InvalidAreas`]; the engine takes that list on the
//! next refresh and redraws only what changed.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::DrawTarget;
use embedded_graphics::primitives::Rectangle;
use heapless::Vec;

use super::label::{Label, LabelSpec};
use super::meter::{Indicator, Meter, MeterSpec};
use crate::area::overlaps;
use crate::error::GuiError;
use crate::invalidate::{InvalidAreas, MAX_INVALID_AREAS};

/// Most widgets on one screen.
pub const MAX_WIDGETS: usize = 8;

/// Handle of a widget in a [`WidgetTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WidgetId(u8);

impl WidgetId {
    #[inline]
    pub const fn index(self) -> usize { self.0 as usize }
}

/// Handle of one indicator on one meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IndicatorRef {
    pub meter: WidgetId,
    pub index: u8,
}

/// Widget kinds.
#[derive(Debug, Clone)]
pub enum Widget {
    Meter(Meter),
    Label(Label),
}

impl Widget {
    /// Screen area covered by the widget.
    pub fn bounds(&self) -> Rectangle {
        match self {
            Self::Meter(meter) => meter.bounds(),
            Self::Label(label) => label.bounds(),
        }
    }

    fn draw<D>(
        &self,
        display: &mut D,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        match self {
            Self::Meter(meter) => meter.draw(display),
            Self::Label(label) => label.draw(display),
        }
    }
}

/// Screen background plus widgets, drawn in insertion order.
#[derive(Debug, Clone)]
pub struct WidgetTree {
    screen: Rectangle,
    background: Rgb565,
    widgets: Vec<Widget, MAX_WIDGETS>,
    invalid: InvalidAreas,
}

impl WidgetTree {
    /// Empty screen of `screen` bounds. The whole screen starts dirty.
    pub fn new(
        screen: Rectangle,
        background: Rgb565,
    ) -> Self {
        let mut invalid = InvalidAreas::new(screen);
        invalid.add_screen();
        Self {
            screen,
            background,
            widgets: Vec::new(),
            invalid,
        }
    }

    #[inline]
    pub fn screen(&self) -> Rectangle { self.screen }

    #[inline]
    pub fn widgets(&self) -> &[Widget] { &self.widgets }

    fn push(
        &mut self,
        widget: Widget,
    ) -> Result<WidgetId, GuiError> {
        let id = WidgetId(self.widgets.len() as u8);
        let bounds = widget.bounds();
        self.widgets.push(widget).map_err(|_| GuiError::Capacity)?;
        self.invalid.add(bounds);
        Ok(id)
    }

    pub fn add_meter(
        &mut self,
        spec: &MeterSpec<'_>,
    ) -> Result<WidgetId, GuiError> {
        let meter = Meter::new(spec, &self.screen)?;
        self.push(Widget::Meter(meter))
    }

    pub fn add_label(
        &mut self,
        spec: &LabelSpec<'_>,
    ) -> Result<WidgetId, GuiError> {
        let label = Label::new(spec, &self.screen)?;
        self.push(Widget::Label(label))
    }

    /// Current state of an indicator.
    pub fn indicator(
        &self,
        target: IndicatorRef,
    ) -> Result<Indicator, GuiError> {
        match self.widgets.get(target.meter.index()) {
            Some(Widget::Meter(meter)) => meter.indicator(target.index as usize).copied(),
            Some(_) => Err(GuiError::WrongKind),
            None => Err(GuiError::InvalidHandle),
        }
    }

    /// Value shown by an indicator (its end value).
    pub fn indicator_value(
        &self,
        target: IndicatorRef,
    ) -> Result<i32, GuiError> {
        self.indicator(target).map(|indicator| indicator.end)
    }

    /// Point an indicator at `value`.
    pub fn set_indicator_value(
        &mut self,
        target: IndicatorRef,
        value: i32,
    ) -> Result<(), GuiError> {
        meter_mut(&mut self.widgets, target.meter)?.set_indicator_value(
            target.index as usize,
            value,
            &mut self.invalid,
        )
    }

    /// Set the range of an arc or scale-line indicator.
    pub fn set_indicator_range(
        &mut self,
        target: IndicatorRef,
        start: i32,
        end: i32,
    ) -> Result<(), GuiError> {
        meter_mut(&mut self.widgets, target.meter)?.set_indicator_range(
            target.index as usize,
            start,
            end,
            &mut self.invalid,
        )
    }

    /// Replace a label's text.
    pub fn set_label_text(
        &mut self,
        id: WidgetId,
        text: &str,
    ) -> Result<(), GuiError> {
        let screen = self.screen;
        let label = match self.widgets.get_mut(id.index()) {
            Some(Widget::Label(label)) => label,
            Some(_) => return Err(GuiError::WrongKind),
            None => return Err(GuiError::InvalidHandle),
        };
        if label.text() == text {
            return Ok(());
        }
        let old = label.bounds();
        label.set_text(text, &screen)?;
        let new = label.bounds();
        self.invalid.add(old);
        self.invalid.add(new);
        Ok(())
    }

    /// Mark the whole screen dirty.
    pub fn invalidate_all(&mut self) { self.invalid.add_screen(); }

    /// `true` when a refresh has something to draw.
    #[inline]
    pub fn has_invalid(&self) -> bool { !self.invalid.is_empty() }

    /// Take the pending dirty areas.
    pub fn take_invalid(&mut self) -> Vec<Rectangle, MAX_INVALID_AREAS> { self.invalid.take() }

    /// Draw everything that intersects `clip`.
    ///
    /// The target is expected to clip to `clip` itself; widgets outside it
    /// are skipped entirely.
    pub fn draw<D>(
        &self,
        display: &mut D,
        clip: &Rectangle,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        display.fill_solid(clip, self.background).ok();
        for widget in self.widgets.iter().filter(|widget| overlaps(&widget.bounds(), clip)) {
            widget.draw(display);
        }
    }
}

fn meter_mut(
    widgets: &mut [Widget],
    id: WidgetId,
) -> Result<&mut Meter, GuiError> {
    match widgets.get_mut(id.index()) {
        Some(Widget::Meter(meter)) => Ok(meter),
        Some(_) => Err(GuiError::WrongKind),
        None => Err(GuiError::InvalidHandle),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_graphics::geometry::{Point, Size};
    use embedded_graphics::prelude::RgbColor;

    use super::*;
    use crate::colors::{GREY, SCREEN_BG};
    use crate::widgets::{Align, LabelFont, ScaleSpec};

    const NEEDLE: [Indicator; 1] = [Indicator::needle(4, GREY, -10, 0)];

    fn screen() -> Rectangle { Rectangle::new(Point::zero(), Size::new(320, 240)) }

    fn meter_spec() -> MeterSpec<'static> {
        MeterSpec {
            align: Align::LeftMid,
            offset: Point::new(10, 0),
            size: 120,
            scale: ScaleSpec::new(),
            indicators: &NEEDLE,
        }
    }

    fn label_spec() -> LabelSpec<'static> {
        LabelSpec {
            text: "LOOP",
            align: Align::BottomMid,
            offset: Point::new(0, -10),
            width: 100,
            font: LabelFont::Pt12,
            color: Rgb565::BLACK,
        }
    }

    #[test]
    fn test_new_tree_is_fully_dirty() {
        let mut tree = WidgetTree::new(screen(), SCREEN_BG);
        assert!(tree.has_invalid());
        assert_eq!(tree.take_invalid().as_slice(), &[screen()]);
        assert!(!tree.has_invalid());
    }

    #[test]
    fn test_handles_and_kinds() {
        let mut tree = WidgetTree::new(screen(), SCREEN_BG);
        let meter = tree.add_meter(&meter_spec()).expect("meter");
        let label = tree.add_label(&label_spec()).expect("label");
        let needle = IndicatorRef { meter, index: 0 };

        assert_eq!(tree.indicator_value(needle), Ok(0));
        tree.set_indicator_value(needle, 42).expect("set");
        assert_eq!(tree.indicator_value(needle), Ok(42));

        let on_label = IndicatorRef { meter: label, index: 0 };
        assert_eq!(tree.set_indicator_value(on_label, 1), Err(GuiError::WrongKind));
        assert_eq!(tree.set_label_text(meter, "x"), Err(GuiError::WrongKind));

        let missing = IndicatorRef {
            meter: WidgetId(7),
            index: 0,
        };
        assert_eq!(tree.indicator_value(missing), Err(GuiError::InvalidHandle));
        assert_eq!(
            tree.set_indicator_value(IndicatorRef { meter, index: 3 }, 1),
            Err(GuiError::IndicatorOutOfRange)
        );
    }

    #[test]
    fn test_mutation_invalidates_widget_area_only() {
        let mut tree = WidgetTree::new(screen(), SCREEN_BG);
        let meter = tree.add_meter(&meter_spec()).expect("meter");
        tree.take_invalid();

        tree.set_indicator_value(IndicatorRef { meter, index: 0 }, 60).expect("set");
        let bounds = tree.widgets()[0].bounds();
        let dirty = tree.take_invalid();
        assert!(!dirty.is_empty());
        assert!(dirty.iter().all(|area| crate::area::contains(&bounds, area)));
    }

    #[test]
    fn test_label_text_change() {
        let mut tree = WidgetTree::new(screen(), SCREEN_BG);
        let label = tree.add_label(&label_spec()).expect("label");
        tree.take_invalid();

        tree.set_label_text(label, "LOOP").expect("same text");
        assert!(!tree.has_invalid());

        tree.set_label_text(label, "RUN").expect("text");
        assert!(tree.has_invalid());
    }

    #[test]
    fn test_capacity() {
        let mut tree = WidgetTree::new(screen(), SCREEN_BG);
        for _ in 0..MAX_WIDGETS {
            tree.add_label(&label_spec()).expect("label");
        }
        assert_eq!(tree.add_label(&label_spec()), Err(GuiError::Capacity));
    }
}
