// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read access to [`TourState`].
//!
//! ## Skip-aware lookahead
//!
//! [`TourState::next_index`] and [`TourState::prev_index`] scan the step order away from the
//! pointer and return the first entry the tour can land on:
//!
//! - a name or inline entry lands if a step by that name is registered and neither the entry
//!   nor the registered step asks to be skipped;
//! - an async entry lands unless it, or an already registered step of the same name, asks to
//!   be skipped. It will be fetched on arrival.
//!
//! Skip predicates see the current custom state.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;

use crate::anchor::Anchor;
use crate::config::{Settings, TourOptions};
use crate::state::{CustomState, TourState};
use crate::step::{Step, StepOrderEntry};
use crate::types::{NavAction, TourStatus};

impl TourState {
    /// Current status.
    pub fn status(&self) -> TourStatus {
        self.status
    }

    /// The step on screen, if any.
    pub fn current_step(&self) -> Option<&Rc<Step>> {
        self.current_step.as_ref()
    }

    /// The step shown before the current one.
    pub fn previously_shown_step(&self) -> Option<&Rc<Step>> {
        self.previously_shown_step.as_ref()
    }

    /// Whether `next` would move.
    pub fn has_next_step(&self) -> bool {
        self.has_next_step
    }

    /// Whether `prev` would move.
    pub fn has_previous_step(&self) -> bool {
        self.has_prev_step
    }

    /// Cause of the last status or pointer change.
    pub fn navigation_action(&self) -> NavAction {
        self.nav_action
    }

    /// Caller-defined state.
    pub fn custom_state(&self) -> &CustomState {
        &self.custom_state
    }

    /// Registered steps by name.
    pub fn steps(&self) -> &BTreeMap<String, Rc<Step>> {
        &self.steps
    }

    /// The validated step order.
    pub fn step_order(&self) -> &[StepOrderEntry] {
        &self.step_order
    }

    /// Position in the step order.
    pub fn step_pointer(&self) -> usize {
        self.step_pointer
    }

    /// Anchor of the popover element, if the renderer set one.
    pub fn popover_ref(&self) -> Option<&Anchor> {
        self.popover_ref.as_ref()
    }

    /// Name of the async step the tour is parked on.
    pub fn waiting_for(&self) -> Option<&str> {
        self.waiting_for.as_deref()
    }

    /// Tour options.
    pub fn options(&self) -> &TourOptions {
        &self.options
    }

    /// The registered step called `name`.
    pub fn registered(&self, name: &str) -> Option<&Rc<Step>> {
        self.steps.get(name)
    }

    /// What the tour knows about `name`: the registered step, else the inline descriptor
    /// from the step order.
    pub fn predefined(&self, name: &str) -> Option<&Rc<Step>> {
        self.registered(name).or_else(|| {
            self.step_order
                .iter()
                .filter_map(StepOrderEntry::inline)
                .find(|step| step.name == name)
        })
    }

    /// Position of `name` in the step order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.step_order.iter().position(|entry| entry.name() == name)
    }

    /// Resolve a setting by name: current step first, then tour. The tour's `name` is
    /// available too.
    pub fn config_value(&self, key: &str) -> Option<Value> {
        let value = match &self.current_step {
            Some(step) => step.config_value(&self.options, key),
            None => Settings::value(&[&self.options.settings], key),
        };
        value.or_else(|| (key == "name").then(|| Value::from(self.options.name.as_str())))
    }

    /// First landable entry after the pointer.
    pub fn next_index(&self) -> Option<usize> {
        let start = self.step_pointer.checked_add(1)?;
        (start..self.step_order.len()).find(|&i| self.is_landing(i))
    }

    /// First landable entry before the pointer.
    pub fn prev_index(&self) -> Option<usize> {
        let end = self.step_pointer.min(self.step_order.len());
        (0..end).rev().find(|&i| self.is_landing(i))
    }

    /// Whether the tour can land on the entry at `index`.
    pub fn is_landing(&self, index: usize) -> bool {
        let Some(entry) = self.step_order.get(index) else {
            return false;
        };
        if entry.is_skipped(&self.custom_state) {
            return false;
        }
        match self.registered(entry.name()) {
            Some(step) => !step.is_skipped(&self.custom_state),
            None => entry.is_async(),
        }
    }
}
