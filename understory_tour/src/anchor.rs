// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Measurable anchor handles.
//!
//! An [`Anchor`] is what [`Tour::register_step`](crate::Tour::register_step) hands back to
//! the rendering layer. The renderer attaches it to the on-screen element and reports that
//! element's viewport-space bounds; the tour only reads them when scrolling, positioning
//! the backdrop, or building a [popover request](crate::popover::PopoverRequest).
//!
//! The same type is used for the popover element itself (see
//! [`Tour::set_popover_ref`](crate::Tour::set_popover_ref)).

use core::cell::Cell;
use core::fmt;
use std::rc::Rc;

use kurbo::Rect;

/// A shared handle to an on-screen element whose bounds may or may not be known yet.
///
/// Clones share the same slot, so bounds reported through one clone are visible through all
/// of them. Equality is identity: two anchors are equal only if they share the slot.
#[derive(Clone, Default)]
pub struct Anchor {
    bounds: Rc<Cell<Option<Rect>>>,
}

impl Anchor {
    /// Create an anchor that is not attached to any element yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an anchor that is already measurable.
    pub fn with_bounds(bounds: Rect) -> Self {
        let anchor = Self::new();
        anchor.set_bounds(bounds);
        anchor
    }

    /// Report the element's bounds in viewport coordinates.
    pub fn set_bounds(&self, bounds: Rect) {
        self.bounds.set(Some(bounds));
    }

    /// Detach the element; the anchor stops being measurable.
    pub fn clear(&self) {
        self.bounds.set(None);
    }

    /// The last reported bounds, if the element is attached.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds.get()
    }

    /// Returns `true` if the element is attached and its bounds are finite.
    pub fn is_measurable(&self) -> bool {
        self.bounds().is_some_and(|r| r.is_finite())
    }
}

impl PartialEq for Anchor {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.bounds, &other.bounds)
    }
}

impl Eq for Anchor {}

impl fmt::Debug for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anchor")
            .field("bounds", &self.bounds.get())
            .finish()
    }
}
