//! Rectangle helpers on top of embedded-graphics' [`Rectangle`].

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::primitives::Rectangle;

/// Number of pixels covered by `rect`.
#[inline]
pub const fn pixel_count(rect: &Rectangle) -> u32 { rect.size.width * rect.size.height }

/// `true` if `rect` covers no pixels.
#[inline]
pub const fn is_empty(rect: &Rectangle) -> bool { rect.size.width == 0 || rect.size.height == 0 }

/// Smallest rectangle containing both `a` and `b`.
pub fn union(
    a: &Rectangle,
    b: &Rectangle,
) -> Rectangle {
    if is_empty(a) {
        return *b;
    }
    if is_empty(b) {
        return *a;
    }
    let left = a.top_left.x.min(b.top_left.x);
    let top = a.top_left.y.min(b.top_left.y);
    let right = (a.top_left.x + a.size.width as i32).max(b.top_left.x + b.size.width as i32);
    let bottom = (a.top_left.y + a.size.height as i32).max(b.top_left.y + b.size.height as i32);
    Rectangle::new(Point::new(left, top), Size::new((right - left) as u32, (bottom - top) as u32))
}

/// `true` if every pixel of `inner` lies inside `outer`.
pub fn contains(
    outer: &Rectangle,
    inner: &Rectangle,
) -> bool {
    if is_empty(inner) {
        return true;
    }
    inner.top_left.x >= outer.top_left.x
        && inner.top_left.y >= outer.top_left.y
        && inner.top_left.x + inner.size.width as i32 <= outer.top_left.x + outer.size.width as i32
        && inner.top_left.y + inner.size.height as i32 <= outer.top_left.y + outer.size.height as i32
}

/// `true` if `a` and `b` share at least one pixel.
#[inline]
pub fn overlaps(
    a: &Rectangle,
    b: &Rectangle,
) -> bool {
    !is_empty(&a.intersection(b))
}

/// Grow `rect` by `by` pixels on every side.
pub fn expand(
    rect: &Rectangle,
    by: u32,
) -> Rectangle {
    Rectangle::new(
        rect.top_left - Point::new(by as i32, by as i32),
        rect.size + Size::new(by * 2, by * 2),
    )
}

/// Rectangle spanning two corner points (inclusive).
pub fn spanning(
    a: Point,
    b: Point,
) -> Rectangle {
    Rectangle::with_corners(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(
        x: i32,
        y: i32,
        w: u32,
        h: u32,
    ) -> Rectangle {
        Rectangle::new(Point::new(x, y), Size::new(w, h))
    }

    #[test]
    fn test_union() {
        assert_eq!(union(&rect(0, 0, 10, 10), &rect(5, 20, 10, 5)), rect(0, 0, 15, 25));
        assert_eq!(union(&Rectangle::zero(), &rect(3, 3, 2, 2)), rect(3, 3, 2, 2));
    }

    #[test]
    fn test_contains() {
        assert!(contains(&rect(0, 0, 10, 10), &rect(2, 2, 8, 8)));
        assert!(!contains(&rect(0, 0, 10, 10), &rect(2, 2, 9, 8)));
        assert!(contains(&rect(0, 0, 10, 10), &Rectangle::zero()));
    }

    #[test]
    fn test_overlaps() {
        assert!(overlaps(&rect(0, 0, 10, 10), &rect(9, 9, 5, 5)));
        assert!(!overlaps(&rect(0, 0, 10, 10), &rect(10, 0, 5, 5)));
    }

    #[test]
    fn test_expand_and_spanning() {
        assert_eq!(expand(&rect(10, 10, 4, 4), 2), rect(8, 8, 8, 8));
        assert_eq!(spanning(Point::new(5, 9), Point::new(1, 2)), rect(1, 2, 5, 8));
    }
}
