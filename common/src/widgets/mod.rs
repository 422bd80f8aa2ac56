//! Widget layer for the gauge screen.
//!
//! All widgets draw through `DrawTarget<Color = Rgb565>` in absolute screen
//! coordinates, so the same code renders into a stripe buffer on the device
//! and into the simulator window on the desktop.

mod geometry;
mod label;
mod meter;
mod tree;

pub use geometry::Align;
pub use label::{Label, LabelFont, LabelSpec, MAX_LABEL_LEN, MAX_LABEL_LINES, wrap_lines};
pub use meter::{
    Indicator,
    IndicatorKind,
    MAJOR_TICKS,
    MAX_INDICATORS,
    MajorTicks,
    Meter,
    MeterSpec,
    MinorTicks,
    ScaleSpec,
};
pub use tree::{IndicatorRef, MAX_WIDGETS, Widget, WidgetId, WidgetTree};
