// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator services driven by the tour.
//!
//! The tour does no drawing, scrolling, or layout of its own. The embedding UI provides:
//!
//! - a [`Backdrop`] that dims the page around the current step (optional);
//! - a [`ScrollService`] that brings a step and its popover into view (optional;
//!   [`SmartScroll`] implements it over any [`Viewport`]);
//! - a [`Positioner`] that lays out the popover next to its reference rectangle, driven
//!   through [`Tour::layout_popover`](crate::Tour::layout_popover).
//!
//! A missing backdrop or scroll service is not an error; the corresponding effects are
//! skipped.

use kurbo::{Insets, Point, Rect, Size, Vec2};

use crate::config::BackdropOptions;
use crate::popover::PopoverRequest;
use crate::scroll::scroll_delta;

/// Page-dimming overlay synchronised to the current step.
pub trait Backdrop {
    /// Make the overlay visible.
    fn show(&mut self);
    /// Hide the overlay.
    fn hide(&mut self);
    /// Cut out or highlight `target`.
    fn position(&mut self, target: Rect);
    /// Apply options before the next `show`.
    fn set_options(&mut self, options: &BackdropOptions);
}

/// Brings a step's anchor and popover into view.
pub trait ScrollService {
    /// Scroll so that `target` and `popover` are visible, keeping `margins` clear.
    fn scroll_into_view(&mut self, target: Rect, popover: Rect, margins: Insets);
}

/// A scrollable viewport.
pub trait Viewport {
    /// Size of the visible area.
    fn size(&self) -> Size;
    /// Scroll the content by `delta`.
    fn scroll_by(&mut self, delta: Vec2);
}

/// Lays out the popover.
pub trait Positioner {
    /// Compute the popover origin for `request`.
    ///
    /// Called on every [`Tour::layout_popover`](crate::Tour::layout_popover), so a moved
    /// anchor is picked up by laying out again.
    fn position(&mut self, request: &PopoverRequest) -> Point;
}

/// [`ScrollService`] that performs at most one [`Viewport::scroll_by`] per call, using
/// [`scroll_delta`].
#[derive(Clone, Debug, Default)]
pub struct SmartScroll<V> {
    viewport: V,
}

impl<V: Viewport> SmartScroll<V> {
    /// Scroll `viewport`.
    pub fn new(viewport: V) -> Self {
        Self { viewport }
    }

    /// The wrapped viewport.
    pub fn viewport(&self) -> &V {
        &self.viewport
    }
}

impl<V: Viewport> ScrollService for SmartScroll<V> {
    fn scroll_into_view(&mut self, target: Rect, popover: Rect, margins: Insets) {
        if let Some(delta) = scroll_delta(self.viewport.size(), target, popover, margins) {
            tracing::trace!(dx = delta.x, dy = delta.y, "scrolling step into view");
            self.viewport.scroll_by(delta);
        }
    }
}
