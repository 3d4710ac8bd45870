// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transition observers.
//!
//! A [`TourObserver`] is told about every dispatched [`Action`] together with the state it
//! produced, and about fetches that failed. The tour uses [`NoopObserver`] unless one is
//! installed with [`Services::with_observer`](crate::tour::Services::with_observer).
//!
//! Any `Fn(&Action, &TourState)` closure is an observer:
//!
//! ```
//! use core::cell::RefCell;
//! use std::rc::Rc;
//!
//! use understory_tour::observer::TourObserver;
//! use understory_tour::state::{Action, TourState};
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = seen.clone();
//! let observer = move |action: &Action, _: &TourState| log.borrow_mut().push(action.kind());
//! observer.on_transition(&Action::Start, &TourState::default());
//! assert_eq!(*seen.borrow(), ["START"]);
//! ```

use core::error::Error;

use crate::state::{Action, TourState};

/// Receives tour transitions.
pub trait TourObserver {
    /// Called after `action` was applied; `state` is the result.
    fn on_transition(&self, action: &Action, state: &TourState) {
        let _ = (action, state);
    }

    /// Called when the fetch of the async step `step` was rejected.
    fn on_fetch_rejected(&self, step: &str, error: &(dyn Error + 'static)) {
        let _ = (step, error);
    }
}

/// Observer that ignores everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopObserver;

impl TourObserver for NoopObserver {}

/// Observer that forwards transitions to `tracing` at debug level.
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingObserver;

impl TourObserver for TracingObserver {
    fn on_transition(&self, action: &Action, state: &TourState) {
        tracing::debug!(
            tour = %state.options().name,
            action = action.kind(),
            status = ?state.status(),
            pointer = state.step_pointer(),
            current = state.current_step().map(|s| s.name.as_str()),
            "tour transition"
        );
    }

    fn on_fetch_rejected(&self, step: &str, error: &(dyn Error + 'static)) {
        tracing::warn!(step, %error, "async step fetch rejected");
    }
}

impl<F> TourObserver for F
where
    F: Fn(&Action, &TourState),
{
    fn on_transition(&self, action: &Action, state: &TourState) {
        self(action, state);
    }
}
