// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The transition effect sequencer.
//!
//! ## Overview
//!
//! The sequencer reacts to changes of the tour's [`Snapshot`]: the previously shown step,
//! the current step, the pointer, and the status. Each change starts one run of the effect
//! protocol, in this order:
//!
//! 1. **Hide.** If the previously shown step changed and nothing is current yet, await the
//!    old step's `hide` hook.
//! 2. **Backdrop off.** If the step that was current had a backdrop and the new current step
//!    has none (or there is none), hide the backdrop.
//! 3. **Resolve.** If the tour is on and nothing is current, look at the step order entry
//!    under the pointer. A registered step becomes current. An unregistered async entry parks
//!    the tour in [`Waiting`](TourStatus::Waiting) and starts its fetch; the fetch is not
//!    awaited.
//! 4. **Show.** If a step is current and the tour is on, await its `show` hook, scroll the
//!    step and the popover into view when both are measurable, and when the step asks for a
//!    backdrop, configure it, position it over the anchor, and show it.
//! 5. **Backdrop off.** If the tour is not on, hide the backdrop.
//!
//! ## Settling
//!
//! Operations call `settle` after dispatching. Settling applies pending fetch completions,
//! then runs the protocol once per observed snapshot change until the snapshot is stable.
//! A fetch that resolves synchronously is therefore registered and shown before the
//! operation that reached it returns.
//!
//! ## Overlapping runs
//!
//! Every run takes a new generation number. After each await the run compares it against
//! the tour's latest generation; if a newer run started in the meantime (for example, a
//! `jump_to` issued while a `show` hook was pending), the older run stops without
//! performing its remaining side effects.

use std::rc::Rc;

use futures::{FutureExt, StreamExt};

use crate::Tour;
use crate::anchor::Anchor;
use crate::error::TourError;
use crate::hooks::{HookContext, LifecycleEvent, fire};
use crate::state::{Action, TourState};
use crate::step::{Fetch, FetchHandle, FetchOutcome, Step, StepOrderEntry};
use crate::types::{SnapshotChanges, TourStatus};

/// The part of the state the sequencer reacts to. Steps compare by identity.
#[derive(Clone, Debug, Default)]
pub(crate) struct Snapshot {
    previous: Option<Rc<Step>>,
    current: Option<Rc<Step>>,
    pointer: usize,
    status: TourStatus,
}

fn same_step(a: Option<&Rc<Step>>, b: Option<&Rc<Step>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

impl Snapshot {
    pub(crate) fn of(state: &TourState) -> Self {
        Self {
            previous: state.previously_shown_step().cloned(),
            current: state.current_step().cloned(),
            pointer: state.step_pointer(),
            status: state.status(),
        }
    }

    /// Which parts differ from `newer`.
    pub(crate) fn changes(&self, newer: &Self) -> SnapshotChanges {
        let mut changes = SnapshotChanges::empty();
        changes.set(
            SnapshotChanges::PREVIOUS_STEP,
            !same_step(self.previous.as_ref(), newer.previous.as_ref()),
        );
        changes.set(
            SnapshotChanges::CURRENT_STEP,
            !same_step(self.current.as_ref(), newer.current.as_ref()),
        );
        changes.set(SnapshotChanges::POINTER, self.pointer != newer.pointer);
        changes.set(SnapshotChanges::STATUS, self.status != newer.status);
        changes
    }
}

/// What the entry under the pointer resolves to.
enum Resolution {
    Show(Rc<Step>),
    Fetch { name: String, fetch: Fetch },
    Nothing,
}

impl Tour {
    /// Run the effect protocol until the snapshot stops changing.
    pub(crate) async fn settle(&self) -> Result<(), TourError> {
        loop {
            self.drain_fetch_outcomes().await?;
            let now = Snapshot::of(&self.inner.state.borrow());
            let changes = self.inner.last_seen.borrow().changes(&now);
            if changes.is_empty() {
                return Ok(());
            }
            let before = self.inner.last_seen.replace(now.clone());
            self.run_transition(before, now, changes).await?;
        }
    }

    /// Apply fetch completions queued on the completion channel.
    async fn drain_fetch_outcomes(&self) -> Result<(), TourError> {
        loop {
            let outcome = self.inner.fetch_rx.borrow_mut().next().now_or_never();
            match outcome {
                Some(Some(FetchOutcome::Resolved(step))) => {
                    tracing::debug!(step = %step.name, "async step resolved");
                    self.add_step_inner(step).await?;
                }
                Some(Some(FetchOutcome::Rejected { name, error })) => {
                    tracing::warn!(
                        step = %name,
                        %error,
                        "async step fetch rejected; still waiting"
                    );
                    self.inner.observer.on_fetch_rejected(&name, &*error);
                }
                Some(None) | None => return Ok(()),
            }
        }
    }

    fn superseded(&self, generation: u64) -> bool {
        let latest = self.inner.generation.get();
        if latest != generation {
            tracing::debug!(generation, latest, "transition superseded");
            return true;
        }
        false
    }

    async fn run_transition(
        &self,
        before: Snapshot,
        now: Snapshot,
        changes: SnapshotChanges,
    ) -> Result<(), TourError> {
        let generation = self.inner.generation.get() + 1;
        self.inner.generation.set(generation);
        let tour = self.name();
        tracing::debug!(
            tour = %tour,
            generation,
            pointer = now.pointer,
            status = ?now.status,
            changes = ?changes,
            "transition"
        );

        // 1. Hide the step that was retired.
        if changes.contains(SnapshotChanges::PREVIOUS_STEP)
            && now.current.is_none()
            && let Some(previous) = &now.previous
        {
            let cx = HookContext::new(
                LifecycleEvent::Hide,
                tour.as_str(),
                Some(previous.name.as_str()),
            );
            fire(&cx, previous.hooks.on_hide.clone()).await?;
            if self.superseded(generation) {
                return Ok(());
            }
        }

        // 2. Backdrop off when leaving a backdrop step.
        let mut backdrop_hidden = false;
        let had_backdrop = before.current.as_deref().is_some_and(|s| self.wants_backdrop(s));
        let has_backdrop = now.current.as_deref().is_some_and(|s| self.wants_backdrop(s));
        if had_backdrop && !has_backdrop {
            backdrop_hidden = self.hide_backdrop();
        }

        // 3. Resolve the entry under the pointer.
        if now.status.is_on() && now.current.is_none() {
            match self.resolve_pointer() {
                Resolution::Show(step) => self.set_current_step(step),
                Resolution::Fetch { name, fetch } => {
                    tracing::debug!(tour = %tour, step = %name, "fetching async step");
                    self.wait_for_step(&name);
                    // Mark the waiting snapshot as seen, so that a fetch resolving right away
                    // reads as a change on the next pass.
                    self.inner
                        .last_seen
                        .replace(Snapshot::of(&self.inner.state.borrow()));
                    if !backdrop_hidden {
                        backdrop_hidden = self.hide_backdrop();
                    }
                    fetch(FetchHandle::new(name, self.inner.fetch_tx.clone()));
                }
                Resolution::Nothing => {
                    tracing::debug!(
                        tour = %tour,
                        pointer = now.pointer,
                        "nothing to show under the pointer"
                    );
                }
            }
        }

        // 4. Show the current step.
        if now.status.is_on()
            && let Some(current) = &now.current
        {
            let cx = HookContext::new(
                LifecycleEvent::Show,
                tour.as_str(),
                Some(current.name.as_str()),
            );
            fire(&cx, current.hooks.on_show.clone()).await?;
            if self.superseded(generation) {
                return Ok(());
            }
            self.present(current);
        }

        // 5. Backdrop off while the tour is not on.
        if !now.status.is_on() && !backdrop_hidden {
            self.hide_backdrop();
        }
        Ok(())
    }

    fn wants_backdrop(&self, step: &Step) -> bool {
        self.read(|s| step.resolved_settings(s.options()).has_backdrop)
    }

    /// Returns `true` if a backdrop is installed.
    fn hide_backdrop(&self) -> bool {
        match self.inner.backdrop.borrow_mut().as_mut() {
            Some(backdrop) => {
                backdrop.hide();
                true
            }
            None => false,
        }
    }

    fn resolve_pointer(&self) -> Resolution {
        self.read(|state| {
            let Some(entry) = state.step_order().get(state.step_pointer()) else {
                return Resolution::Nothing;
            };
            if let Some(step) = state.registered(entry.name()) {
                return Resolution::Show(step.clone());
            }
            match entry {
                StepOrderEntry::Async { name, fetch, .. } => Resolution::Fetch {
                    name: name.clone(),
                    fetch: fetch.clone(),
                },
                _ => Resolution::Nothing,
            }
        })
    }

    /// Scroll and backdrop effects for a step that was just shown.
    fn present(&self, step: &Step) {
        let measure = |anchor: Option<&Anchor>| {
            anchor
                .filter(|anchor| anchor.is_measurable())
                .and_then(Anchor::bounds)
        };
        let (settings, popover) = self.read(|s| {
            (
                step.resolved_settings(s.options()),
                measure(s.popover_ref()),
            )
        });
        let target = measure(step.anchor.as_ref());

        if let (Some(target), Some(popover)) = (target, popover)
            && let Some(scroll) = self.inner.scroll.borrow_mut().as_mut()
        {
            scroll.scroll_into_view(target, popover, settings.scroll_margins.to_insets());
        }

        if settings.has_backdrop
            && let Some(backdrop) = self.inner.backdrop.borrow_mut().as_mut()
        {
            backdrop.set_options(&settings.backdrop);
            if let Some(target) = target {
                backdrop.position(target);
            }
            backdrop.show();
        }
    }

    pub(crate) fn set_current_step(&self, step: Rc<Step>) {
        self.dispatch(Action::SetCurrentStep(step));
    }

    pub(crate) fn wait_for_step(&self, name: &str) {
        self.dispatch(Action::WaitFor(name.into()));
    }
}
