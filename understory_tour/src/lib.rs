// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Tour: a guided product-tour engine for UI.
//!
//! ## Overview
//!
//! A tour walks the user through an ordered list of steps. Each step is anchored to an
//! on-screen element and shown with a popover and, optionally, a backdrop that dims the rest
//! of the page. This crate is the engine behind that: it owns the tour's state, decides which
//! step is current, and drives the collaborators that draw, scroll, and position.
//! It does not render anything.
//!
//! ## Layering
//!
//! - [`state`]: the [`TourState`](state::TourState) record and a pure reducer over
//!   [`Action`](state::Action)s.
//! - [`selectors`]: read access, including the skip-aware next/previous lookahead.
//! - [`actions`]: the operations callers use (`start`, `next`, `register_step`, ...), each
//!   guarded by the tour status and preceded by its lifecycle [`hooks`].
//! - [`sequencer`]: the effect protocol run after every state change: hide the old step,
//!   resolve the new one (fetching it if it is loaded lazily), show it, scroll it into view,
//!   and update the backdrop.
//! - [`services`]: traits for the backdrop, scrolling, and popover positioning.
//!
//! ## Steps
//!
//! The step order is fixed when the tour is built. Entries are bare names, inline
//! descriptors, or async entries with a fetch callback (see [`step`]). The rendering layer
//! registers steps as their elements mount, through [`Tour::register_step`], and receives an
//! [`Anchor`](anchor::Anchor) to report the element's bounds through.
//!
//! ## Workflow
//!
//! 1) Build a [`TourConfig`](config::TourConfig): a name, the step order, hooks, and
//!    tour-wide settings (optionally parsed from JSON).
//! 2) Create the [`Tour`], installing a backdrop, scroll service, and observer as needed.
//! 3) Register steps as they appear on screen and report their bounds.
//! 4) Drive navigation from the popover's buttons; read the current step to render it.
//!
//! ```
//! use futures::executor::block_on;
//! use kurbo::Rect;
//! use understory_tour::Tour;
//! use understory_tour::config::TourConfig;
//! use understory_tour::step::Step;
//! use understory_tour::types::TourStatus;
//!
//! let config = TourConfig::new("intro")
//!     .step(Step::new("welcome").title("Welcome!").modal(true))
//!     .step("menu");
//! let tour = Tour::new(config).unwrap();
//!
//! block_on(async {
//!     tour.register_step("welcome").await?;
//!     let menu = tour.register_step(Step::new("menu").title("The menu")).await?;
//!     menu.set_bounds(Rect::new(0.0, 0.0, 200.0, 40.0));
//!
//!     tour.start().await?;
//!     assert_eq!(tour.current_step().unwrap().title.as_deref(), Some("Welcome!"));
//!     assert!(tour.has_next_step());
//!
//!     tour.next().await?;
//!     assert_eq!(tour.current_step().unwrap().name, "menu");
//!     tour.end().await
//! })
//! .unwrap();
//! assert_eq!(tour.status(), TourStatus::Off);
//! ```
//!
//! ## Async steps
//!
//! An async entry's fetch callback receives a [`FetchHandle`](step::FetchHandle) instead of
//! the tour. While it is pending the tour is [`Waiting`](types::TourStatus::Waiting);
//! resolving the handle registers the step, and the tour shows it if the pointer still
//! targets it. Completions that arrive after the triggering call returned are picked up by
//! the next operation or by [`Tour::process_pending`].
//!
//! This crate requires `std`. The tour is single-threaded and its futures are `!Send`.

pub mod actions;
pub mod anchor;
pub mod config;
pub mod error;
pub mod hooks;
pub mod observer;
pub mod popover;
pub mod scroll;
pub mod selectors;
pub mod sequencer;
pub mod services;
pub mod state;
pub mod step;
pub mod tour;
pub mod types;

pub use error::TourError;
pub use tour::{Services, Tour};
