// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tour basics.
//!
//! Configure a tour from JSON, register three steps, and walk through them with a backdrop,
//! smart scrolling, and a skipped step.
//!
//! Run:
//! - `cargo run -p understory_tour_demos --example tour_basics`
//! - `RUST_LOG=understory_tour=debug cargo run -p understory_tour_demos --example tour_basics`

use core::cell::RefCell;
use std::rc::Rc;

use futures::executor::block_on;
use kurbo::{Point, Rect, Size, Vec2};
use serde_json::json;
use tracing_subscriber::EnvFilter;
use understory_tour::anchor::Anchor;
use understory_tour::config::{BackdropOptions, TourConfig, TourOptions};
use understory_tour::hooks::Hook;
use understory_tour::observer::TracingObserver;
use understory_tour::popover::{PopoverRequest, PopoverStyle};
use understory_tour::services::{Backdrop, Positioner, SmartScroll, Viewport};
use understory_tour::step::Step;
use understory_tour::types::TourStatus;
use understory_tour::{Services, Tour, TourError};

/// A 800x600 window that records how far it was scrolled.
struct Window {
    scrolled: Rc<RefCell<Vec2>>,
}

impl Viewport for Window {
    fn size(&self) -> Size {
        Size::new(800.0, 600.0)
    }

    fn scroll_by(&mut self, delta: Vec2) {
        println!("scroll by {delta:?}");
        *self.scrolled.borrow_mut() += delta;
    }
}

struct PrintBackdrop;

impl Backdrop for PrintBackdrop {
    fn show(&mut self) {
        println!("backdrop: show");
    }

    fn hide(&mut self) {
        println!("backdrop: hide");
    }

    fn position(&mut self, target: Rect) {
        println!("backdrop: around {target:?}");
    }

    fn set_options(&mut self, options: &BackdropOptions) {
        println!(
            "backdrop: full_screen={} prefix={:?}",
            options.full_screen, options.class_prefix
        );
    }
}

/// Puts the popover right below its reference.
struct Below;

impl Positioner for Below {
    fn position(&mut self, request: &PopoverRequest) -> Point {
        Point::new(
            request.reference.x0 + request.skid,
            request.reference.y1 + request.offset,
        )
    }
}

fn main() -> Result<(), TourError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = TourOptions::from_json(
        r#"{
            "name": "intro",
            "offset": 8,
            "has_backdrop": true,
            "scroll_margins": { "top": 20, "bottom": 20 },
            "backdrop": { "class_prefix": "intro-dim" }
        }"#,
    )?;
    let config = TourConfig::from_options(options)
        .step(Step::new("welcome").title("Welcome!").modal(true))
        .step(
            Step::new("search")
                .title("Search")
                .skip_when(|custom| custom.get("searched") == Some(&json!(true))),
        )
        .step(Step::new("settings").title("Settings"))
        .on_end(Hook::sync(|cx| {
            println!("tour `{}` finished", cx.tour);
            Ok(())
        }));

    let scrolled = Rc::new(RefCell::new(Vec2::ZERO));
    let services = Services::new()
        .with_backdrop(PrintBackdrop)
        .with_scroll(SmartScroll::new(Window {
            scrolled: scrolled.clone(),
        }))
        .with_observer(TracingObserver);
    let tour = Tour::with_services(config, services)?;

    block_on(async {
        // The renderer registers steps as their elements mount and reports their bounds.
        let welcome = tour.register_step("welcome").await?;
        welcome.set_bounds(Rect::new(300.0, 250.0, 500.0, 350.0));
        let search = tour.register_step("search").await?;
        search.set_bounds(Rect::new(20.0, 20.0, 220.0, 60.0));
        let settings = tour.register_step("settings").await?;
        settings.set_bounds(Rect::new(20.0, 700.0, 220.0, 740.0));

        // The user already searched, so the search step is skipped.
        let mut custom = serde_json::Map::new();
        custom.insert("searched".into(), json!(true));
        tour.set_custom_state(custom);

        tour.start().await?;
        let style = tour.layout_popover(&mut Below);
        println!("{:?}: {style:?}", tour.current_step().map(|s| s.name.clone()));
        assert_eq!(style, Some(PopoverStyle::Centered), "welcome is modal");

        // The popover element is measured once it is on screen; it hangs below the fold.
        let popover = Anchor::with_bounds(Rect::new(20.0, 748.0, 260.0, 848.0));
        tour.set_popover_ref(Some(popover));

        tour.next().await?;
        let step = tour.current_step().map(|s| s.name.clone());
        let style = tour.layout_popover(&mut Below);
        println!("{step:?}: {style:?}");
        assert_eq!(step.as_deref(), Some("settings"), "search was skipped");
        assert!(!tour.has_next_step(), "settings is the last step");

        tour.end().await
    })?;

    assert_eq!(tour.status(), TourStatus::Off);
    assert_eq!(*scrolled.borrow(), Vec2::new(0.0, 268.0), "one scroll to reveal settings");
    Ok(())
}
