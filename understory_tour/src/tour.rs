// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The tour controller.
//!
//! [`Tour`] owns one [`TourState`] and the services it drives. It is a cheap, clonable
//! handle: clones share the same tour, so a renderer, a step's fetch callback, and the code
//! driving navigation can each hold one.
//!
//! All mutation goes through a single dispatch path that applies the
//! [reducer](crate::state::reduce), logs the transition, and notifies the
//! [observer](crate::observer). Operations live in [`actions`](crate::actions); the effect
//! protocol that runs after them lives in [`sequencer`](crate::sequencer).
//!
//! The tour is single-threaded. Futures returned by its operations are `!Send` and are
//! meant to be driven by the UI's local executor.

use core::cell::{Cell, RefCell};
use core::fmt;
use std::rc::Rc;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use serde_json::Value;

use crate::config::TourConfig;
use crate::error::TourError;
use crate::observer::{NoopObserver, TourObserver};
use crate::sequencer::Snapshot;
use crate::services::{Backdrop, ScrollService};
use crate::state::{Action, CustomState, TourState, reduce};
use crate::step::{FetchOutcome, Step};
use crate::types::{NavAction, TourStatus};

/// The services a tour drives; all optional.
pub struct Services {
    pub(crate) backdrop: Option<Box<dyn Backdrop>>,
    pub(crate) scroll: Option<Box<dyn ScrollService>>,
    pub(crate) observer: Box<dyn TourObserver>,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            backdrop: None,
            scroll: None,
            observer: Box::new(NoopObserver),
        }
    }
}

impl Services {
    /// No backdrop, no scrolling, no observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a backdrop.
    pub fn with_backdrop(mut self, backdrop: impl Backdrop + 'static) -> Self {
        self.backdrop = Some(Box::new(backdrop));
        self
    }

    /// Install a scroll service.
    pub fn with_scroll(mut self, scroll: impl ScrollService + 'static) -> Self {
        self.scroll = Some(Box::new(scroll));
        self
    }

    /// Install an observer.
    ///
    /// Observers run inside dispatch and must not call back into the tour's operations.
    pub fn with_observer(mut self, observer: impl TourObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("backdrop", &self.backdrop.is_some())
            .field("scroll", &self.scroll.is_some())
            .finish_non_exhaustive()
    }
}

pub(crate) struct Inner {
    pub(crate) state: RefCell<TourState>,
    pub(crate) backdrop: RefCell<Option<Box<dyn Backdrop>>>,
    pub(crate) scroll: RefCell<Option<Box<dyn ScrollService>>>,
    pub(crate) observer: Box<dyn TourObserver>,
    /// Incremented by every sequencer run; a run that sees a newer value was superseded.
    pub(crate) generation: Cell<u64>,
    /// The snapshot the sequencer last reacted to.
    pub(crate) last_seen: RefCell<Snapshot>,
    pub(crate) fetch_tx: UnboundedSender<FetchOutcome>,
    pub(crate) fetch_rx: RefCell<UnboundedReceiver<FetchOutcome>>,
}

/// A guided tour.
///
/// ```
/// use futures::executor::block_on;
/// use understory_tour::Tour;
/// use understory_tour::config::TourConfig;
/// use understory_tour::step::Step;
/// use understory_tour::types::TourStatus;
///
/// let tour = Tour::new(TourConfig::new("intro").steps(["welcome", "menu"])).unwrap();
/// block_on(async {
///     tour.register_step(Step::new("welcome").title("Hi")).await?;
///     tour.register_step(Step::new("menu")).await?;
///     tour.start().await?;
///     assert_eq!(tour.status(), TourStatus::On);
///     assert_eq!(tour.current_step().unwrap().name, "welcome");
///     tour.next().await
/// })
/// .unwrap();
/// assert_eq!(tour.current_step().unwrap().name, "menu");
/// ```
#[derive(Clone)]
pub struct Tour {
    pub(crate) inner: Rc<Inner>,
}

impl Tour {
    /// Build a tour with no services.
    ///
    /// Fails with [`TourError::StepConfigurationInvalid`] if an entry of the step order is
    /// not a valid step.
    pub fn new(config: TourConfig) -> Result<Self, TourError> {
        Self::with_services(config, Services::default())
    }

    /// Build a tour driving `services`.
    pub fn with_services(config: TourConfig, services: Services) -> Result<Self, TourError> {
        let state = TourState::new(config)?;
        let (fetch_tx, fetch_rx) = mpsc::unbounded();
        let Services {
            backdrop,
            scroll,
            observer,
        } = services;
        tracing::debug!(
            tour = %state.options().name,
            steps = state.step_order().len(),
            "tour created"
        );
        Ok(Self {
            inner: Rc::new(Inner {
                last_seen: RefCell::new(Snapshot::of(&state)),
                state: RefCell::new(state),
                backdrop: RefCell::new(backdrop),
                scroll: RefCell::new(scroll),
                observer,
                generation: Cell::new(0),
                fetch_tx,
                fetch_rx: RefCell::new(fetch_rx),
            }),
        })
    }

    /// Apply `action` and notify the observer.
    pub(crate) fn dispatch(&self, action: Action) {
        let state = self.inner.state.take();
        let next = reduce(state, &action);
        tracing::trace!(
            tour = %next.options().name,
            action = action.kind(),
            status = ?next.status(),
            pointer = next.step_pointer(),
            "dispatch"
        );
        *self.inner.state.borrow_mut() = next;
        self.inner
            .observer
            .on_transition(&action, &self.inner.state.borrow());
    }

    /// Run `f` against the current state.
    ///
    /// The state is borrowed for the duration of `f`; do not call tour operations from it.
    pub fn read<R>(&self, f: impl FnOnce(&TourState) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Name of the tour.
    pub fn name(&self) -> String {
        self.read(|s| s.options().name.clone())
    }

    /// Current status.
    pub fn status(&self) -> TourStatus {
        self.read(TourState::status)
    }

    /// The step on screen, if any.
    pub fn current_step(&self) -> Option<Rc<Step>> {
        self.read(|s| s.current_step().cloned())
    }

    /// The step shown before the current one.
    pub fn previously_shown_step(&self) -> Option<Rc<Step>> {
        self.read(|s| s.previously_shown_step().cloned())
    }

    /// Whether [`next`](Self::next) would move.
    pub fn has_next_step(&self) -> bool {
        self.read(TourState::has_next_step)
    }

    /// Whether [`prev`](Self::prev) would move.
    pub fn has_previous_step(&self) -> bool {
        self.read(TourState::has_previous_step)
    }

    /// Cause of the last status or pointer change.
    pub fn navigation_action(&self) -> NavAction {
        self.read(TourState::navigation_action)
    }

    /// Position in the step order.
    pub fn step_pointer(&self) -> usize {
        self.read(TourState::step_pointer)
    }

    /// Name of the async step the tour is waiting for.
    pub fn waiting_for(&self) -> Option<String> {
        self.read(|s| s.waiting_for().map(Into::into))
    }

    /// A copy of the custom state.
    pub fn custom_state(&self) -> CustomState {
        self.read(|s| s.custom_state().clone())
    }

    /// Resolve a free-form setting for the current step, falling back to `default`.
    pub fn get_config(&self, key: &str, default: Value) -> Value {
        self.read(|s| s.config_value(key)).unwrap_or(default)
    }

    /// Apply fetch completions that arrived since the last operation and run the effect
    /// protocol for any resulting change.
    pub async fn process_pending(&self) -> Result<(), TourError> {
        self.settle().await
    }
}

impl fmt::Debug for Tour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tour")
            .field("state", &self.inner.state.borrow())
            .field("generation", &self.inner.generation.get())
            .finish_non_exhaustive()
    }
}
