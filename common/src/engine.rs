//! GUI engine: animations, invalidation and stripe rendering.
//!
//! [`Gui`] owns the widget tree, the running animations and the stripe
//! buffers. The render loop calls [`Gui::timer_handler`] once per cycle with
//! the current tick value and the panel's [`FlushSink`]. One call:
//!
//! 1. Evaluates every animation at `now` and writes the values to their
//!    indicators. Finished animations are dropped after their final value.
//! 2. Returns early if the last refresh was less than the refresh period
//!    ago, or nothing is dirty.
//! 3. Renders each dirty area in stripes of at most one buffer and hands
//!    each stripe to the sink. A failed stripe is retried up to
//!    `flush_retries` times, then dropped with a warning; the next change of
//!    that area redraws it.
//!
//! All flushing happens synchronously inside the call; the buffer is reused
//! as soon as the sink has acknowledged the request.

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::primitives::Rectangle;
use heapless::Vec;

use crate::anim::Animation;
use crate::buffer::DrawBuffers;
use crate::canvas::StripeCanvas;
use crate::colors::SCREEN_BG;
use crate::config::{DisplayConfig, LoopTiming};
use crate::error::GuiError;
use crate::flush::{FlushRequest, FlushSink};
use crate::stats::LoopStats;
use crate::widgets::{IndicatorRef, LabelSpec, MAX_WIDGETS, MeterSpec, WidgetId, WidgetTree};

/// Most animations running at once.
pub const MAX_ANIMATIONS: usize = 8;

// =============================================================================
// Scene Description
// =============================================================================

/// Animation bound to one indicator of the meter it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorAnimation {
    /// Index into the meter's indicators.
    pub indicator: u8,
    pub animation: Animation,
}

/// A meter and the animations that drive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaugeSpec<'a> {
    pub meter: MeterSpec<'a>,
    pub animations: &'a [IndicatorAnimation],
}

/// Everything on the screen at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneSpec<'a> {
    pub background: Rgb565,
    pub gauges: &'a [GaugeSpec<'a>],
    pub labels: &'a [LabelSpec<'a>],
}

/// Handles of the widgets created for a scene, in scene order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneHandles {
    pub gauges: Vec<WidgetId, MAX_WIDGETS>,
    pub labels: Vec<WidgetId, MAX_WIDGETS>,
}

// =============================================================================
// Cycle Report
// =============================================================================

/// What one [`Gui::timer_handler`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// At least one area was redrawn.
    pub refreshed: bool,
    /// Dirty areas redrawn.
    pub areas: u32,
    /// Stripes acknowledged as written.
    pub flushes: u32,
    /// Stripes acknowledged as failed.
    pub failures: u32,
    /// Failed stripes written again.
    pub retries: u32,
    /// Stripes given up on after the last retry.
    pub dropped: u32,
    /// Animations evaluated.
    pub animations: u32,
}

// =============================================================================
// Engine
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct AnimationSlot {
    target: IndicatorRef,
    animation: Animation,
    started_at: u32,
}

/// Widget tree, animations and stripe buffers.
pub struct Gui {
    display: DisplayConfig,
    timing: LoopTiming,
    tree: WidgetTree,
    animations: Vec<AnimationSlot, MAX_ANIMATIONS>,
    buffers: DrawBuffers,
    last_refresh: Option<u32>,
    seq: u32,
    stats: LoopStats,
}

impl Gui {
    /// Engine for `display` rendering through `buffers`.
    pub fn new(
        display: DisplayConfig,
        timing: LoopTiming,
        buffers: DrawBuffers,
    ) -> Self {
        Self {
            display,
            timing,
            tree: WidgetTree::new(display.screen(), SCREEN_BG),
            animations: Vec::new(),
            buffers,
            last_refresh: None,
            seq: 0,
            stats: LoopStats::new(),
        }
    }

    #[inline]
    pub fn display(&self) -> &DisplayConfig { &self.display }

    #[inline]
    pub fn tree(&self) -> &WidgetTree { &self.tree }

    #[inline]
    pub fn tree_mut(&mut self) -> &mut WidgetTree { &mut self.tree }

    /// Render loop counters, updated by the loop after every cycle.
    #[inline]
    pub fn stats(&self) -> &LoopStats { &self.stats }

    /// Record a finished cycle that took `handler_ms` ticks.
    pub fn record_cycle(
        &mut self,
        report: &CycleReport,
        handler_ms: u32,
    ) {
        self.stats.record_cycle(report, handler_ms);
    }

    /// Number of running animations.
    #[inline]
    pub fn animation_count(&self) -> usize { self.animations.len() }

    /// Build the widgets of `scene` and start their animations at `now`.
    pub fn build_scene(
        &mut self,
        scene: &SceneSpec<'_>,
        now: u32,
    ) -> Result<SceneHandles, GuiError> {
        self.tree = WidgetTree::new(self.display.screen(), scene.background);
        self.animations.clear();

        let mut handles = SceneHandles::default();
        for gauge in scene.gauges {
            let meter = self.tree.add_meter(&gauge.meter)?;
            handles.gauges.push(meter).map_err(|_| GuiError::Capacity)?;
            for anim in gauge.animations {
                let target = IndicatorRef {
                    meter,
                    index: anim.indicator,
                };
                self.start_animation(target, anim.animation, now)?;
            }
        }
        for label in scene.labels {
            let id = self.tree.add_label(label)?;
            handles.labels.push(id).map_err(|_| GuiError::Capacity)?;
        }

        info!(
            "scene built: {} gauges, {} labels, {} animations",
            handles.gauges.len(),
            handles.labels.len(),
            self.animations.len()
        );
        Ok(handles)
    }

    /// Drive `target` with `animation`, starting at `now`.
    ///
    /// The start value is applied immediately.
    pub fn start_animation(
        &mut self,
        target: IndicatorRef,
        animation: Animation,
        now: u32,
    ) -> Result<(), GuiError> {
        self.tree.set_indicator_value(target, animation.value_at(0))?;
        self.animations
            .push(AnimationSlot {
                target,
                animation,
                started_at: now,
            })
            .map_err(|_| GuiError::Capacity)
    }

    /// Stop every animation driving `target`. Returns how many were stopped.
    pub fn stop_animations(
        &mut self,
        target: IndicatorRef,
    ) -> usize {
        let before = self.animations.len();
        self.animations.retain(|slot| slot.target != target);
        before - self.animations.len()
    }

    /// Point an indicator at `value`.
    pub fn set_indicator_value(
        &mut self,
        target: IndicatorRef,
        value: i32,
    ) -> Result<(), GuiError> {
        self.tree.set_indicator_value(target, value)
    }

    /// Replace a label's text.
    pub fn set_label_text(
        &mut self,
        id: WidgetId,
        text: &str,
    ) -> Result<(), GuiError> {
        self.tree.set_label_text(id, text)
    }

    /// Redraw the whole screen on the next refresh.
    pub fn invalidate_all(&mut self) { self.tree.invalidate_all(); }

    /// Run one cycle of GUI work at tick `now`.
    pub fn timer_handler<S: FlushSink>(
        &mut self,
        now: u32,
        sink: &mut S,
    ) -> CycleReport {
        let mut report = CycleReport {
            animations: self.animate(now),
            ..CycleReport::default()
        };

        let period = self.timing.refresh_period_ms;
        if self.last_refresh.is_some_and(|last| now.wrapping_sub(last) < period) {
            return report;
        }
        self.last_refresh = Some(now);

        if !self.tree.has_invalid() {
            return report;
        }
        for area in self.tree.take_invalid() {
            self.render_area(area, sink, &mut report);
            report.areas += 1;
        }
        report.refreshed = report.areas > 0;
        report
    }

    /// Apply every animation's value at `now`; returns how many ran.
    fn animate(
        &mut self,
        now: u32,
    ) -> u32 {
        let mut evaluated = 0;
        for slot in &self.animations {
            let elapsed = now.wrapping_sub(slot.started_at);
            if let Err(err) = self.tree.set_indicator_value(slot.target, slot.animation.value_at(elapsed)) {
                warn!("animation target rejected value: {}", err);
            }
            evaluated += 1;
        }
        self.animations
            .retain(|slot| !slot.animation.is_finished(now.wrapping_sub(slot.started_at)));
        evaluated
    }

    /// Render `area` stripe by stripe and flush each stripe.
    fn render_area<S: FlushSink>(
        &mut self,
        area: Rectangle,
        sink: &mut S,
        report: &mut CycleReport,
    ) {
        let width = area.size.width.max(1);
        let rows = (self.buffers.capacity() as u32 / width).clamp(1, area.size.height.max(1));
        let bottom = area.top_left.y + area.size.height as i32;

        let mut y = area.top_left.y;
        while y < bottom {
            let height = rows.min((bottom - y) as u32);
            let stripe = Rectangle::new(Point::new(area.top_left.x, y), Size::new(area.size.width, height));

            let mut canvas = StripeCanvas::new(self.buffers.next_mut(), stripe, self.display.monochrome);
            self.tree.draw(&mut canvas, &stripe);

            let mut attempt = 0;
            loop {
                let seq = self.seq;
                self.seq = self.seq.wrapping_add(1);

                let ready = sink.flush(FlushRequest::new(stripe, canvas.pixels(), seq));
                debug_assert_eq!(ready.seq(), seq);
                match ready.result() {
                    Ok(()) => {
                        report.flushes += 1;
                        break;
                    }
                    Err(err) => {
                        report.failures += 1;
                        if attempt < self.timing.flush_retries {
                            warn!("flush of stripe at y={} failed: {}, retrying", y, err);
                            attempt += 1;
                            report.retries += 1;
                        } else {
                            error!("flush of stripe at y={} failed: {}, dropping it", y, err);
                            report.dropped += 1;
                            break;
                        }
                    }
                }
            }

            y += height as i32;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
