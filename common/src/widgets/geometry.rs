//! Parent-relative placement.

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::primitives::Rectangle;

/// Anchor of a child inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Align {
    TopLeft,
    TopMid,
    TopRight,
    LeftMid,
    #[default]
    Center,
    RightMid,
    BottomLeft,
    BottomMid,
    BottomRight,
}

impl Align {
    /// Place a child of `size` inside `parent`, then shift it by `offset`.
    pub fn resolve(
        self,
        parent: &Rectangle,
        size: Size,
        offset: Point,
    ) -> Rectangle {
        let free_w = parent.size.width as i32 - size.width as i32;
        let free_h = parent.size.height as i32 - size.height as i32;

        let x = match self {
            Self::TopLeft | Self::LeftMid | Self::BottomLeft => 0,
            Self::TopMid | Self::Center | Self::BottomMid => free_w / 2,
            Self::TopRight | Self::RightMid | Self::BottomRight => free_w,
        };
        let y = match self {
            Self::TopLeft | Self::TopMid | Self::TopRight => 0,
            Self::LeftMid | Self::Center | Self::RightMid => free_h / 2,
            Self::BottomLeft | Self::BottomMid | Self::BottomRight => free_h,
        };

        Rectangle::new(parent.top_left + Point::new(x, y) + offset, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Rectangle { Rectangle::new(Point::zero(), Size::new(1280, 720)) }

    #[test]
    fn test_left_and_right_middle() {
        let size = Size::new(300, 300);
        let left = Align::LeftMid.resolve(&screen(), size, Point::new(25, -25));
        let right = Align::RightMid.resolve(&screen(), size, Point::new(-25, -25));
        assert_eq!(left.top_left, Point::new(25, 185));
        assert_eq!(right.top_left, Point::new(955, 185));
    }

    #[test]
    fn test_bottom_mid() {
        let label = Align::BottomMid.resolve(&screen(), Size::new(150, 20), Point::new(0, -40));
        assert_eq!(label.top_left, Point::new(565, 660));
    }

    #[test]
    fn test_corners_and_center() {
        let size = Size::new(10, 10);
        assert_eq!(Align::TopLeft.resolve(&screen(), size, Point::zero()).top_left, Point::zero());
        assert_eq!(Align::BottomRight.resolve(&screen(), size, Point::zero()).top_left, Point::new(1270, 710));
        assert_eq!(Align::Center.resolve(&screen(), size, Point::zero()).top_left, Point::new(635, 355));
    }

    #[test]
    fn test_child_larger_than_parent() {
        let parent = Rectangle::new(Point::new(10, 10), Size::new(20, 20));
        let child = Align::Center.resolve(&parent, Size::new(40, 40), Point::zero());
        assert_eq!(child.top_left, Point::new(0, 0));
    }
}
