//! Dirty-region tracking.
//!
//! Widgets report the screen areas that changed; the engine redraws only
//! those areas on the next refresh. The list is kept small:
//!
//! - areas are clipped to the screen and empty results dropped
//! - an area already covered by a listed one is ignored
//! - listed areas covered by a new one are replaced
//! - two areas are joined when their union is no larger than the two apart
//! - when the table is full everything collapses into one bounding box

use embedded_graphics::primitives::Rectangle;
use heapless::Vec;

use crate::area::{contains, is_empty, pixel_count, union};

/// Maximum number of separate dirty areas per refresh.
pub const MAX_INVALID_AREAS: usize = 16;

/// Pending dirty areas for one screen.
#[derive(Clone, Debug)]
pub struct InvalidAreas {
    screen: Rectangle,
    areas: Vec<Rectangle, MAX_INVALID_AREAS>,
}

impl InvalidAreas {
    /// Create an empty list for a screen of the given bounds.
    pub const fn new(screen: Rectangle) -> Self {
        Self {
            screen,
            areas: Vec::new(),
        }
    }

    /// Mark `area` as needing a redraw.
    pub fn add(
        &mut self,
        area: Rectangle,
    ) {
        let area = area.intersection(&self.screen);
        if is_empty(&area) {
            return;
        }
        if self.areas.iter().any(|listed| contains(listed, &area)) {
            return;
        }
        self.areas.retain(|listed| !contains(&area, listed));

        if self.areas.push(area).is_err() {
            let all = self.areas.iter().fold(area, |acc, listed| union(&acc, listed));
            self.areas.clear();
            // Capacity is at least one, so this cannot fail
            let _ = self.areas.push(all);
            return;
        }
        self.join();
    }

    /// Mark the whole screen dirty.
    pub fn add_screen(&mut self) {
        self.areas.clear();
        let _ = self.areas.push(self.screen);
    }

    /// `true` when nothing needs redrawing.
    #[inline]
    pub fn is_empty(&self) -> bool { self.areas.is_empty() }

    /// Pending areas, in insertion order.
    #[inline]
    pub fn areas(&self) -> &[Rectangle] { &self.areas }

    /// Take all pending areas, leaving the list empty.
    pub fn take(&mut self) -> Vec<Rectangle, MAX_INVALID_AREAS> { core::mem::take(&mut self.areas) }

    /// Merge pairs whose union costs no more pixels than drawing both.
    fn join(&mut self) {
        let mut merged = true;
        while merged {
            merged = false;
            'outer: for i in 0..self.areas.len() {
                for j in (i + 1)..self.areas.len() {
                    let joined = union(&self.areas[i], &self.areas[j]);
                    if pixel_count(&joined) <= pixel_count(&self.areas[i]) + pixel_count(&self.areas[j]) {
                        self.areas[i] = joined;
                        self.areas.swap_remove(j);
                        merged = true;
                        break 'outer;
                    }
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
