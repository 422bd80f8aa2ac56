//! The demo scene: two animated meters and a label.
//!
//! Geometry is laid out for the 1280x720 ATOM Display (300 px meters, 25 px
//! margins) and scaled down for smaller panels so both meters still fit side
//! by side above the label.

use embedded_graphics::geometry::Point;

use crate::anim::{Animation, Repeat};
use crate::colors::{BLUE, GREY, RED, SCREEN_BG, TEXT};
use crate::config::DisplayConfig;
use crate::engine::{GaugeSpec, IndicatorAnimation, SceneSpec};
use crate::widgets::{Align, Indicator, LabelFont, LabelSpec, MAJOR_TICKS, MajorTicks, MeterSpec, ScaleSpec};

/// Largest meter diameter.
pub const MAX_METER_SIZE: u32 = 300;

/// Index of the needle in [`DemoScene::indicators`].
pub const NEEDLE_INDEX: u8 = 4;

/// Text of the bottom label. The ProFont faces carry no loop-arrow symbol
/// glyph, so the label spells the word.
pub const LABEL_TEXT: &str = "LOOP";

const SWEEP_MS: u32 = 2_000;
const PLAYBACK_MS: u32 = 500;
const PLAYBACK_DELAY_MS: u32 = 100;
const REPEAT_DELAY_MS: u32 = 100;

const fn sweep(
    start: i32,
    end: i32,
) -> Animation {
    Animation::new(start, end, SWEEP_MS)
        .with_playback(PLAYBACK_MS, PLAYBACK_DELAY_MS)
        .with_repeat(Repeat::Infinite, REPEAT_DELAY_MS)
}

/// Left needle: 0 -> 100 and back.
pub const RISING: [IndicatorAnimation; 1] = [IndicatorAnimation {
    indicator: NEEDLE_INDEX,
    animation: sweep(0, 100),
}];

/// Right needle: 100 -> 0 and back.
pub const FALLING: [IndicatorAnimation; 1] = [IndicatorAnimation {
    indicator: NEEDLE_INDEX,
    animation: sweep(100, 0),
}];

/// Demo widgets sized for one display.
///
/// Scene specs borrow their indicator lists, so the scene is assembled in
/// two steps:
///
/// ```ignore
/// let demo = demo_gauges(&profile.display);
/// let gauges = demo.gauges();
/// let scene = demo.scene(&gauges);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoScene {
    pub size: u32,
    pub margin: i32,
    pub scale: ScaleSpec,
    pub indicators: [Indicator; 5],
    pub label: LabelSpec<'static>,
}

impl DemoScene {
    /// Left and right meter with their needle animations.
    pub fn gauges(&self) -> [GaugeSpec<'_>; 2] {
        let meter = |align, x| MeterSpec {
            align,
            offset: Point::new(x, -self.margin),
            size: self.size,
            scale: self.scale,
            indicators: &self.indicators,
        };
        [
            GaugeSpec {
                meter: meter(Align::LeftMid, self.margin),
                animations: &RISING,
            },
            GaugeSpec {
                meter: meter(Align::RightMid, -self.margin),
                animations: &FALLING,
            },
        ]
    }

    /// Full scene over `gauges`.
    pub fn scene<'a>(
        &'a self,
        gauges: &'a [GaugeSpec<'a>],
    ) -> SceneSpec<'a> {
        SceneSpec {
            background: SCREEN_BG,
            gauges,
            labels: core::slice::from_ref(&self.label),
        }
    }
}

/// Lay out the demo for `display`.
pub fn demo_gauges(display: &DisplayConfig) -> DemoScene {
    let width = display.width as u32;
    let height = display.height as u32;
    let size = MAX_METER_SIZE
        .min(width.saturating_sub(75) / 2)
        .min(height.saturating_sub(80))
        .max(40);
    let large = size >= 200;

    let mut scale = ScaleSpec::new();
    scale.minor.length = size / 30;
    scale.major = Some(MajorTicks {
        length: size / 20,
        label_font: if large { LabelFont::Pt12 } else { LabelFont::Pt9 },
        ..MAJOR_TICKS
    });

    let indicators = [
        Indicator::arc(3, BLUE, 0, 0, 20),
        Indicator::scale_lines(BLUE, 0, 20),
        Indicator::arc(3, RED, 0, 80, 100),
        Indicator::scale_lines(RED, 80, 100),
        Indicator::needle(4, GREY, -10, 0),
    ];

    let label = LabelSpec {
        text: LABEL_TEXT,
        align: Align::BottomMid,
        offset: Point::new(0, -(size as i32 * 2 / 15)),
        width: 150.min(width),
        font: if large { LabelFont::Pt18 } else { LabelFont::Pt12 },
        color: TEXT,
    };

    DemoScene {
        size,
        margin: size as i32 / 12,
        scale,
        indicators,
        label,
    }
}

// =============================================================================
// Tests
// =============================================================================
