// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Smart scrolling: bring a step's anchor and its popover into view with one adjustment.
//!
//! Rectangles are in viewport coordinates: the origin is the top-left corner of the visible
//! area and `viewport` is its size. Margins shrink the usable area on each edge.
//!
//! If both rectangles already fit the usable area nothing happens. Otherwise the union of
//! the two is scrolled so that its overflowing edge lands on the margin. When the union
//! overflows both ends of an axis, the bottom (or right) edge wins.

use kurbo::{Insets, Rect, Size, Vec2};

fn fits(area: Rect, rect: Rect) -> bool {
    rect.x0 >= area.x0 && rect.y0 >= area.y0 && rect.x1 <= area.x1 && rect.y1 <= area.y1
}

/// The scroll offset that brings `target` and `popover` into view, or `None` if both are
/// visible.
///
/// `margins` uses Kurbo's inset convention: `x0` left, `y0` top, `x1` right, `y1` bottom.
pub fn scroll_delta(viewport: Size, target: Rect, popover: Rect, margins: Insets) -> Option<Vec2> {
    let area = Rect::new(
        margins.x0,
        margins.y0,
        viewport.width - margins.x1,
        viewport.height - margins.y1,
    );
    if fits(area, target) && fits(area, popover) {
        return None;
    }

    let union = target.union(popover);
    let dy = if union.y1 > area.y1 {
        union.y1 - area.y1
    } else if union.y0 < area.y0 {
        union.y0 - area.y0
    } else {
        0.0
    };
    let dx = if union.x1 > area.x1 {
        union.x1 - area.x1
    } else if union.x0 < area.x0 {
        union.x0 - area.x0
    } else {
        0.0
    };

    let delta = Vec2::new(dx, dy);
    (delta != Vec2::ZERO).then_some(delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size::new(1024.0, 768.0);
    const PADDED: Insets = Insets::uniform(100.0);

    /// A rectangle from its top, left, height, and width.
    fn element(top: f64, left: f64, height: f64, width: f64) -> Rect {
        Rect::new(left, top, left + width, top + height)
    }

    fn both_ways(target: Rect, popover: Rect, margins: Insets) -> Option<Vec2> {
        let forward = scroll_delta(VIEWPORT, target, popover, margins);
        let swapped = scroll_delta(VIEWPORT, popover, target, margins);
        assert_eq!(forward, swapped, "order of the rectangles does not matter");
        forward
    }

    #[test]
    fn visible_elements_need_no_scroll() {
        let target = element(0.0, 0.0, 100.0, 100.0);
        let popover = element(0.0, 120.0, 100.0, 100.0);
        assert_eq!(both_ways(target, popover, Insets::ZERO), None);
    }

    #[test]
    fn scrolls_up_to_an_element_above() {
        let target = element(-100.0, 0.0, 100.0, 100.0);
        let popover = element(0.0, 120.0, 100.0, 100.0);
        assert_eq!(both_ways(target, popover, Insets::ZERO), Some(Vec2::new(0.0, -100.0)));
    }

    #[test]
    fn scrolls_down_to_an_element_below() {
        let target = element(768.0, 0.0, 100.0, 100.0);
        let popover = element(668.0, 0.0, 100.0, 100.0);
        assert_eq!(both_ways(target, popover, Insets::ZERO), Some(Vec2::new(0.0, 100.0)));
    }

    #[test]
    fn scrolls_horizontally() {
        let left = both_ways(
            element(0.0, -100.0, 100.0, 100.0),
            element(0.0, 20.0, 100.0, 100.0),
            Insets::ZERO,
        );
        assert_eq!(left, Some(Vec2::new(-100.0, 0.0)));
        let right = both_ways(
            element(0.0, 1024.0, 100.0, 100.0),
            element(0.0, 800.0, 100.0, 100.0),
            Insets::ZERO,
        );
        assert_eq!(right, Some(Vec2::new(100.0, 0.0)));
    }

    #[test]
    fn margins_shrink_the_viewport() {
        let inside = both_ways(
            element(100.0, 100.0, 100.0, 100.0),
            element(100.0, 220.0, 100.0, 100.0),
            PADDED,
        );
        assert_eq!(inside, None, "inside the padded area");

        let above = both_ways(
            element(0.0, 100.0, 100.0, 100.0),
            element(0.0, 220.0, 100.0, 100.0),
            PADDED,
        );
        assert_eq!(above, Some(Vec2::new(0.0, -100.0)));

        let below = both_ways(
            element(668.0, 100.0, 100.0, 100.0),
            element(568.0, 100.0, 100.0, 100.0),
            PADDED,
        );
        assert_eq!(below, Some(Vec2::new(0.0, 100.0)));

        let left = both_ways(
            element(100.0, 0.0, 100.0, 100.0),
            element(100.0, 120.0, 100.0, 100.0),
            PADDED,
        );
        assert_eq!(left, Some(Vec2::new(-100.0, 0.0)));

        let right = both_ways(
            element(100.0, 924.0, 100.0, 100.0),
            element(100.0, 700.0, 100.0, 100.0),
            PADDED,
        );
        assert_eq!(right, Some(Vec2::new(100.0, 0.0)));
    }

    #[test]
    fn bottom_overflow_wins_over_top() {
        let tall = element(-50.0, 0.0, 900.0, 100.0);
        let popover = element(0.0, 0.0, 10.0, 10.0);
        assert_eq!(
            scroll_delta(VIEWPORT, tall, popover, Insets::ZERO),
            Some(Vec2::new(0.0, 82.0))
        );
    }
}
