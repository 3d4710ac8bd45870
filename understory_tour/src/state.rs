// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The tour state record and its reducer.
//!
//! ## Overview
//!
//! [`TourState`] is owned by the [`Tour`](crate::Tour) and only ever replaced through
//! [`reduce`], a pure transition function over an [`Action`]. Read access goes through the
//! [selectors](crate::selectors).
//!
//! ## Invariants
//!
//! - Step names are unique keys of the step map; adding an existing name replaces it.
//! - The current step is only ever a step from the step map, set by
//!   [`Action::SetCurrentStep`] after the sequencer resolved the pointer.
//! - `has_next_step` / `has_prev_step` reflect the skip-aware lookahead from the pointer
//!   (see [`TourState::next_index`]). They are recomputed whenever the pointer, the step map,
//!   or the custom state changes while the tour is active.
//! - [`Waiting`](TourStatus::Waiting) is left only when the awaited step is added.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::anchor::Anchor;
use crate::config::{TourConfig, TourOptions};
use crate::error::TourError;
use crate::hooks::TourHooks;
use crate::step::{Step, StepKind, StepOrderEntry, classify};
use crate::types::{NavAction, TourStatus};

/// Free-form state bag for caller-defined flags, merged shallowly on update.
pub type CustomState = Map<String, Value>;

/// The complete state of one tour.
#[derive(Clone, Debug, Default)]
pub struct TourState {
    pub(crate) status: TourStatus,
    pub(crate) steps: BTreeMap<String, Rc<Step>>,
    pub(crate) step_order: Vec<StepOrderEntry>,
    pub(crate) step_pointer: usize,
    pub(crate) current_step: Option<Rc<Step>>,
    pub(crate) previously_shown_step: Option<Rc<Step>>,
    pub(crate) has_next_step: bool,
    pub(crate) has_prev_step: bool,
    pub(crate) nav_action: NavAction,
    pub(crate) waiting_for: Option<String>,
    pub(crate) popover_ref: Option<Anchor>,
    pub(crate) options: TourOptions,
    pub(crate) hooks: TourHooks,
    pub(crate) custom_state: CustomState,
}

impl TourState {
    /// Build the initial state from a configuration.
    ///
    /// Every step order entry is validated; an invalid one fails with
    /// [`TourError::StepConfigurationInvalid`]. Inline descriptors that already carry an
    /// anchor are registered immediately.
    pub fn new(config: TourConfig) -> Result<Self, TourError> {
        let TourConfig {
            options,
            step_order,
            hooks,
        } = config;
        let mut steps = BTreeMap::new();
        let mut order = Vec::with_capacity(step_order.len());
        for (index, spec) in step_order.into_iter().enumerate() {
            let full = classify(&spec) == StepKind::Full;
            let entry = StepOrderEntry::parse(index, spec)?;
            if full && let Some(step) = entry.inline() {
                steps.insert(step.name.clone(), step.clone());
            }
            order.push(entry);
        }
        Ok(Self {
            steps,
            step_order: order,
            options,
            hooks,
            ..Self::default()
        })
    }

    fn refresh_lookahead(&mut self) {
        self.has_next_step = self.next_index().is_some();
        self.has_prev_step = self.prev_index().is_some();
    }
}

/// A state transition request.
#[derive(Clone, Debug)]
pub enum Action {
    /// Upsert a step; releases a tour waiting for it.
    AddStep(Rc<Step>),
    /// Delete a step by name; no-op if absent.
    RemoveStep(String),
    /// Turn the tour on.
    Start,
    /// Turn the tour off.
    End,
    /// Pause the tour.
    Pause,
    /// Resume a paused tour.
    Resume,
    /// Move the pointer, retiring the current step.
    SetStepPointer {
        /// New position in the step order.
        index: usize,
        /// Cause of the move.
        nav: NavAction,
    },
    /// Make a registered step current.
    SetCurrentStep(Rc<Step>),
    /// Merge keys into the custom state.
    SetCustomState(CustomState),
    /// Park the tour until the named step is added.
    WaitFor(String),
    /// Set or clear the popover anchor.
    SetPopoverRef(Option<Anchor>),
}

impl Action {
    /// Stable name of the action, for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AddStep(_) => "ADD_STEP",
            Self::RemoveStep(_) => "REMOVE_STEP",
            Self::Start => "START",
            Self::End => "END",
            Self::Pause => "PAUSE",
            Self::Resume => "RESUME",
            Self::SetStepPointer { .. } => "SET_STEP_POINTER",
            Self::SetCurrentStep(_) => "SET_CURRENT_STEP",
            Self::SetCustomState(_) => "SET_CUSTOM_STATE",
            Self::WaitFor(_) => "WAIT_FOR",
            Self::SetPopoverRef(_) => "SET_POPOVER_REF",
        }
    }
}

/// Apply `action` to `state`, returning the next state.
pub fn reduce(mut state: TourState, action: &Action) -> TourState {
    match action {
        Action::AddStep(step) => {
            state.steps.insert(step.name.clone(), step.clone());
            if state.waiting_for.as_deref() == Some(step.name.as_str()) {
                state.waiting_for = None;
                state.status = TourStatus::On;
            }
            if state.status.is_active() {
                state.refresh_lookahead();
            }
        }
        Action::RemoveStep(name) => {
            if state.steps.remove(name).is_some() && state.status.is_active() {
                state.refresh_lookahead();
            }
        }
        Action::Start => {
            state.status = TourStatus::On;
            state.waiting_for = None;
            state.nav_action = NavAction::Start;
        }
        Action::End => {
            state.status = TourStatus::Off;
            state.previously_shown_step = state.current_step.take();
            state.has_next_step = false;
            state.has_prev_step = false;
            state.waiting_for = None;
            state.nav_action = NavAction::End;
        }
        Action::Pause => {
            state.status = TourStatus::Paused;
            state.nav_action = NavAction::Pause;
        }
        Action::Resume => {
            state.status = TourStatus::On;
            state.nav_action = NavAction::Resume;
        }
        Action::SetStepPointer { index, nav } => {
            state.step_pointer = *index;
            state.previously_shown_step = state.current_step.take();
            state.nav_action = *nav;
            state.refresh_lookahead();
        }
        Action::SetCurrentStep(step) => {
            state.current_step = Some(step.clone());
        }
        Action::SetCustomState(partial) => {
            state
                .custom_state
                .extend(partial.iter().map(|(k, v)| (k.clone(), v.clone())));
            if state.status.is_active() {
                state.refresh_lookahead();
            }
        }
        Action::WaitFor(name) => {
            state.status = TourStatus::Waiting;
            state.waiting_for = Some(name.clone());
        }
        Action::SetPopoverRef(anchor) => {
            state.popover_ref = anchor.clone();
        }
    }
    state
}
