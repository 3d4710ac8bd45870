// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Popover layout requests.
//!
//! The tour does not compute popover positions. It tells a [`Positioner`] what to lay out
//! against: the current step's anchor rectangle, or for modal steps a zero-size virtual
//! anchor at the origin, together with the resolved placement, offset, skid, and
//! positioning strategy. Modal steps are not positioned at all; they are centred on screen.

use kurbo::{Point, Rect};

use crate::Tour;
use crate::config::TourOptions;
use crate::services::Positioner;
use crate::step::Step;
use crate::types::{Placement, Strategy};

/// What a [`Positioner`] needs to lay out the popover of one step.
#[derive(Clone, Debug, PartialEq)]
pub struct PopoverRequest {
    /// Name of the step.
    pub step: String,
    /// Rectangle to place the popover against.
    pub reference: Rect,
    /// Preferred side of the reference.
    pub placement: Placement,
    /// Distance from the reference along the placement axis.
    pub offset: f64,
    /// Shift along the reference edge.
    pub skid: f64,
    /// Fixed for modal steps, absolute otherwise.
    pub strategy: Strategy,
    /// Class name for the popover container.
    pub class_name: String,
}

impl PopoverRequest {
    /// Build the request for `step` under `options`.
    ///
    /// Returns `None` if the step is not modal and its anchor cannot be measured.
    pub fn for_step(step: &Step, options: &TourOptions) -> Option<Self> {
        let settings = step.resolved_settings(options);
        let (reference, strategy) = if settings.is_modal {
            (Rect::ZERO, Strategy::Fixed)
        } else {
            let anchor = step.anchor.as_ref().filter(|a| a.is_measurable())?;
            (anchor.bounds()?, Strategy::Absolute)
        };
        Some(Self {
            step: step.name.clone(),
            reference,
            placement: settings.placement,
            offset: settings.offset,
            skid: settings.skid,
            strategy,
            class_name: settings.popover_class,
        })
    }

    /// Returns `true` for requests made for a modal step.
    pub fn is_modal(&self) -> bool {
        self.strategy == Strategy::Fixed
    }
}

/// Where the popover goes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PopoverStyle {
    /// Centred in the viewport.
    Centered,
    /// At `origin`, positioned with `strategy`.
    At {
        /// Top-left corner of the popover.
        origin: Point,
        /// Positioning strategy.
        strategy: Strategy,
    },
}

impl PopoverStyle {
    /// Lay out `request`: modal requests are centred, others are handed to `positioner`.
    pub fn layout(request: &PopoverRequest, positioner: &mut dyn Positioner) -> Self {
        if request.is_modal() {
            Self::Centered
        } else {
            Self::At {
                origin: positioner.position(request),
                strategy: request.strategy,
            }
        }
    }
}

impl Tour {
    /// The layout request for the current step.
    pub fn popover_request(&self) -> Option<PopoverRequest> {
        self.read(|s| {
            let step = s.current_step()?;
            PopoverRequest::for_step(step, s.options())
        })
    }

    /// Lay out the current step's popover.
    pub fn layout_popover(&self, positioner: &mut dyn Positioner) -> Option<PopoverStyle> {
        let request = self.popover_request()?;
        Some(PopoverStyle::layout(&request, positioner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::Anchor;

    struct Below;

    impl Positioner for Below {
        fn position(&mut self, request: &PopoverRequest) -> Point {
            Point::new(
                request.reference.x0 + request.skid,
                request.reference.y1 + request.offset,
            )
        }
    }

    #[test]
    fn anchored_steps_use_their_bounds() {
        let anchor = Anchor::with_bounds(Rect::new(10.0, 20.0, 110.0, 60.0));
        let step = Step::new("menu").anchor(anchor).offset(8.0);
        let request = PopoverRequest::for_step(&step, &TourOptions::named("t")).unwrap();
        assert_eq!(request.reference, Rect::new(10.0, 20.0, 110.0, 60.0));
        assert_eq!(request.strategy, Strategy::Absolute);
        assert_eq!(request.class_name, "tour-popover");
        assert_eq!(
            PopoverStyle::layout(&request, &mut Below),
            PopoverStyle::At {
                origin: Point::new(10.0, 68.0),
                strategy: Strategy::Absolute,
            }
        );
    }

    #[test]
    fn modal_steps_use_a_virtual_anchor() {
        let step = Step::new("welcome").modal(true);
        let request = PopoverRequest::for_step(&step, &TourOptions::named("t")).unwrap();
        assert_eq!(request.reference, Rect::ZERO);
        assert!(request.is_modal(), "modal requests are fixed");
        assert_eq!(PopoverStyle::layout(&request, &mut Below), PopoverStyle::Centered);
    }

    #[test]
    fn unmeasured_anchor_has_no_request() {
        let step = Step::new("menu").anchor(Anchor::new());
        assert_eq!(PopoverRequest::for_step(&step, &TourOptions::named("t")), None);
        assert_eq!(
            PopoverRequest::for_step(&Step::new("bare"), &TourOptions::named("t")),
            None
        );
    }

    #[test]
    fn tour_settings_fill_in() {
        let mut options = TourOptions::named("t");
        options.settings.placement = Some(Placement::TopStart);
        options.settings.popover_class = Some("intro".into());
        let step = Step::new("a").modal(true).skid(4.0);
        let request = PopoverRequest::for_step(&step, &options).unwrap();
        assert_eq!(request.placement, Placement::TopStart);
        assert_eq!(request.skid, 4.0);
        assert_eq!(request.class_name, "intro");
    }
}
