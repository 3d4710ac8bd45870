// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Navigation and mutation operations.
//!
//! ## Guards
//!
//! Navigation operations only act in the status they make sense in and are otherwise
//! no-ops returning `Ok(())`:
//!
//! | Operation | Acts when |
//! |---|---|
//! | [`start`](Tour::start) | off |
//! | [`end`](Tour::end) | not off |
//! | [`pause`](Tour::pause) | on |
//! | [`resume`](Tour::resume) | paused |
//! | [`next`](Tour::next) / [`prev`](Tour::prev) | on, and a landable step exists in that direction |
//! | [`jump_to`](Tour::jump_to) | on, and the name is in the step order |
//!
//! ## Hooks
//!
//! Each operation awaits its lifecycle hooks before dispatching: the tour-level hook first,
//! then the hook of the same name on the current step (for step registration, on the step
//! being added or removed). A failing hook aborts the operation before anything is
//! dispatched. Once dispatched, the operation settles the [sequencer](crate::sequencer), so
//! failures of `hide`/`show` hooks surface here too; those do not roll back the dispatch.

use std::rc::Rc;

use crate::Tour;
use crate::anchor::Anchor;
use crate::error::TourError;
use crate::hooks::{Hook, HookContext, LifecycleEvent, fire};
use crate::state::{Action, CustomState};
use crate::step::{Step, StepSpec, prepare_registration};
use crate::types::{NavAction, TourStatus};

impl Tour {
    /// Start the tour at the first entry of the step order.
    pub async fn start(&self) -> Result<(), TourError> {
        if self.status() != TourStatus::Off {
            tracing::trace!(status = ?self.status(), "start ignored");
            return Ok(());
        }
        self.fire_lifecycle(LifecycleEvent::Start, None).await?;
        self.dispatch(Action::SetStepPointer {
            index: 0,
            nav: NavAction::Start,
        });
        self.dispatch(Action::Start);
        self.settle().await
    }

    /// End the tour. The current step becomes the previously shown step.
    pub async fn end(&self) -> Result<(), TourError> {
        if self.status() == TourStatus::Off {
            tracing::trace!("end ignored");
            return Ok(());
        }
        let current = self.current_step();
        self.fire_lifecycle(LifecycleEvent::End, current.as_deref()).await?;
        self.dispatch(Action::End);
        self.settle().await
    }

    /// Pause a running tour.
    pub async fn pause(&self) -> Result<(), TourError> {
        if self.status() != TourStatus::On {
            tracing::trace!(status = ?self.status(), "pause ignored");
            return Ok(());
        }
        let current = self.current_step();
        self.fire_lifecycle(LifecycleEvent::Pause, current.as_deref()).await?;
        self.dispatch(Action::Pause);
        self.settle().await
    }

    /// Resume a paused tour. A tour waiting for an async step is not paused.
    pub async fn resume(&self) -> Result<(), TourError> {
        if self.status() != TourStatus::Paused {
            tracing::trace!(status = ?self.status(), "resume ignored");
            return Ok(());
        }
        let current = self.current_step();
        self.fire_lifecycle(LifecycleEvent::Resume, current.as_deref()).await?;
        self.dispatch(Action::Resume);
        self.settle().await
    }

    /// Move to the next landable step.
    pub async fn next(&self) -> Result<(), TourError> {
        self.navigate(LifecycleEvent::Next, NavAction::Next).await
    }

    /// Move to the previous landable step.
    pub async fn prev(&self) -> Result<(), TourError> {
        self.navigate(LifecycleEvent::Prev, NavAction::Prev).await
    }

    async fn navigate(&self, event: LifecycleEvent, nav: NavAction) -> Result<(), TourError> {
        let target = |tour: &Self| {
            tour.read(|s| {
                if !s.status().is_on() {
                    return None;
                }
                if nav == NavAction::Prev {
                    s.prev_index()
                } else {
                    s.next_index()
                }
            })
        };
        if target(self).is_none() {
            tracing::trace!(nav = %nav, "navigation ignored");
            return Ok(());
        }
        let current = self.current_step();
        self.fire_lifecycle(event, current.as_deref()).await?;
        // Hooks may have changed the custom state or the status.
        let Some(index) = target(self) else {
            tracing::debug!(nav = %nav, "navigation target vanished while hooks ran");
            return Ok(());
        };
        self.dispatch(Action::SetStepPointer { index, nav });
        self.settle().await
    }

    /// Move to the step called `name` without firing `next`/`prev` hooks.
    pub async fn jump_to(&self, name: &str) -> Result<(), TourError> {
        let index = self.read(|s| s.status().is_on().then(|| s.index_of(name)).flatten());
        let Some(index) = index else {
            tracing::trace!(step = name, "jump ignored");
            return Ok(());
        };
        self.dispatch(Action::SetStepPointer {
            index,
            nav: NavAction::Jump,
        });
        self.settle().await
    }

    /// Add or replace a step, firing `step_added` hooks first.
    ///
    /// A tour waiting for this step resumes and shows it.
    pub async fn add_step(&self, step: Step) -> Result<(), TourError> {
        self.add_step_inner(step).await?;
        self.settle().await
    }

    /// Add without settling; used while draining fetch completions.
    pub(crate) async fn add_step_inner(&self, step: Step) -> Result<(), TourError> {
        if step.name.is_empty() {
            return Err(TourError::InvalidStepConfig);
        }
        self.fire_lifecycle(LifecycleEvent::StepAdded, Some(&step)).await?;
        self.dispatch(Action::AddStep(Rc::new(step)));
        Ok(())
    }

    /// Remove the registered step called `name`, firing `step_removed` hooks first.
    ///
    /// Removing an unknown name does nothing.
    pub async fn remove_step(&self, name: &str) -> Result<(), TourError> {
        let Some(step) = self.read(|s| s.registered(name).cloned()) else {
            tracing::trace!(step = name, "remove ignored; not registered");
            return Ok(());
        };
        self.fire_lifecycle(LifecycleEvent::StepRemoved, Some(&*step)).await?;
        self.dispatch(Action::RemoveStep(name.into()));
        self.settle().await
    }

    /// Register a step from the rendering layer and return the anchor to measure it with.
    ///
    /// A bare name registers the descriptor predefined in the step order. A descriptor is
    /// merged over the predefined one, its own fields winning.
    ///
    /// # Errors
    ///
    /// - [`TourError::UnknownStep`] for a bare name nothing is known about.
    /// - [`TourError::AlreadyRegistered`] for a descriptor that already has an anchor.
    /// - [`TourError::AsyncNotRegistrable`] for a descriptor with a fetch callback.
    /// - [`TourError::InvalidStepConfig`] for an unnamed descriptor.
    pub async fn register_step(&self, spec: impl Into<StepSpec>) -> Result<Anchor, TourError> {
        let spec = spec.into();
        let existing = self.read(|s| s.predefined(spec.name()).map(|step| (**step).clone()));
        let mut step = prepare_registration(spec, existing.as_ref())?;
        let anchor = Anchor::new();
        step.anchor = Some(anchor.clone());
        self.add_step(step).await?;
        Ok(anchor)
    }

    /// Teardown paired with [`register_step`](Self::register_step): remove the step and
    /// forget its measurement.
    ///
    /// If a `step_removed` hook fails, the step stays registered and keeps its bounds.
    pub async fn unregister_step(&self, name: &str) -> Result<(), TourError> {
        let anchor = self.read(|s| s.registered(name).and_then(|step| step.anchor.clone()));
        let result = self.remove_step(name).await;
        if let Some(anchor) = anchor
            && self.read(|s| s.registered(name).is_none())
        {
            anchor.clear();
        }
        result
    }

    /// Merge `partial` into the custom state.
    pub fn set_custom_state(&self, partial: CustomState) {
        self.dispatch(Action::SetCustomState(partial));
    }

    /// Set the anchor of the popover element, used for scrolling it into view.
    pub fn set_popover_ref(&self, anchor: Option<Anchor>) {
        self.dispatch(Action::SetPopoverRef(anchor));
    }

    /// Fire the tour-level hook for `event`, then `step`'s hook of the same name.
    async fn fire_lifecycle(
        &self,
        event: LifecycleEvent,
        step: Option<&Step>,
    ) -> Result<(), TourError> {
        let (cx, hooks) = self.read(|s| {
            let cx = HookContext::new(
                event,
                s.options().name.as_str(),
                step.map(|step| step.name.as_str()),
            );
            let hooks: Vec<Hook> = s
                .hooks
                .get(event)
                .into_iter()
                .chain(step.and_then(|step| step.hooks.get(event)))
                .cloned()
                .collect();
            (cx, hooks)
        });
        fire(&cx, hooks).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TourConfig;
    use core::cell::RefCell;
    use futures::executor::block_on;
    use serde_json::{Value, json};

    type Log = Rc<RefCell<Vec<String>>>;

    fn record(log: &Log, entry: &str) -> Hook {
        let log = log.clone();
        let entry = entry.to_owned();
        Hook::sync(move |_| {
            log.borrow_mut().push(entry.clone());
            Ok(())
        })
    }

    fn current(tour: &Tour) -> Option<String> {
        tour.current_step().map(|s| s.name.clone())
    }

    async fn register_all(tour: &Tour, names: &[&str]) -> Result<(), TourError> {
        for name in names {
            tour.register_step(Step::new(*name)).await?;
        }
        Ok(())
    }

    fn tour_of(names: &[&str]) -> Tour {
        let tour = Tour::new(TourConfig::new("t").steps(names.iter().copied())).unwrap();
        block_on(register_all(&tour, names)).unwrap();
        tour
    }

    fn custom(value: Value) -> CustomState {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn welcome_then_menu() {
        let tour = tour_of(&["welcome", "menu"]);
        block_on(async {
            tour.start().await?;
            assert_eq!(current(&tour).as_deref(), Some("welcome"));
            assert!(tour.has_next_step() && !tour.has_previous_step(), "at the start");

            tour.next().await?;
            assert_eq!(current(&tour).as_deref(), Some("menu"));
            assert!(!tour.has_next_step() && tour.has_previous_step(), "at the end");

            tour.prev().await?;
            assert_eq!(current(&tour).as_deref(), Some("welcome"));
            assert_eq!(tour.navigation_action(), NavAction::Prev);

            tour.end().await
        })
        .unwrap();
        assert_eq!(tour.status(), TourStatus::Off);
        assert_eq!(current(&tour), None);
        assert_eq!(
            tour.previously_shown_step().map(|s| s.name.clone()).as_deref(),
            Some("welcome")
        );
    }

    #[test]
    fn start_twice_is_a_no_op() {
        let log = Log::default();
        let config = TourConfig::new("t")
            .steps(["a", "b"])
            .on_start(record(&log, "start"));
        let tour = Tour::new(config).unwrap();
        block_on(async {
            register_all(&tour, &["a", "b"]).await?;
            tour.start().await?;
            tour.next().await?;
            tour.start().await
        })
        .unwrap();
        assert_eq!(*log.borrow(), ["start"], "second start fires nothing");
        assert_eq!(tour.step_pointer(), 1, "second start does not rewind");
    }

    #[test]
    fn next_passes_over_skipped_steps() {
        let config = TourConfig::new("t")
            .step("a")
            .step(Step::new("b").skip_when(|_| true))
            .step("c");
        let tour = Tour::new(config).unwrap();
        block_on(async {
            register_all(&tour, &["a", "b", "c"]).await?;
            tour.start().await?;
            assert!(tour.has_next_step(), "c is reachable past b");
            tour.next().await
        })
        .unwrap();
        assert_eq!(current(&tour).as_deref(), Some("c"));
        assert_eq!(tour.step_pointer(), 2);
    }

    #[test]
    fn navigation_guards() {
        let tour = tour_of(&["a", "b"]);
        block_on(async {
            tour.next().await?;
            tour.pause().await?;
            tour.end().await?;
            tour.jump_to("b").await
        })
        .unwrap();
        assert_eq!(tour.status(), TourStatus::Off, "nothing acts while off");
        assert_eq!(current(&tour), None);

        block_on(async {
            tour.start().await?;
            tour.prev().await?;
            tour.resume().await?;
            tour.jump_to("ghost").await
        })
        .unwrap();
        assert_eq!(current(&tour).as_deref(), Some("a"), "still on the first step");
        assert_eq!(tour.navigation_action(), NavAction::Start);
    }

    #[test]
    fn pause_and_resume() {
        let log = Log::default();
        let config = TourConfig::new("t")
            .step("a")
            .on_pause(record(&log, "pause"))
            .on_resume(record(&log, "resume"));
        let tour = Tour::new(config).unwrap();
        block_on(async {
            register_all(&tour, &["a"]).await?;
            tour.start().await?;
            tour.pause().await?;
            assert_eq!(tour.status(), TourStatus::Paused);
            tour.next().await?;
            tour.resume().await
        })
        .unwrap();
        assert_eq!(tour.status(), TourStatus::On);
        assert_eq!(*log.borrow(), ["pause", "resume"]);
        assert_eq!(current(&tour).as_deref(), Some("a"));
    }

    #[test]
    fn next_hooks_fire_tour_first_then_step() {
        let log = Log::default();
        let config = TourConfig::new("t")
            .step(Step::new("a").on_next(record(&log, "step:next")))
            .step("b")
            .on_next(record(&log, "tour:next"));
        let tour = Tour::new(config).unwrap();
        block_on(async {
            register_all(&tour, &["a", "b"]).await?;
            tour.start().await?;
            tour.next().await
        })
        .unwrap();
        assert_eq!(*log.borrow(), ["tour:next", "step:next"]);
    }

    #[test]
    fn failing_hook_aborts_navigation() {
        let log = Log::default();
        let config = TourConfig::new("t")
            .step(Step::new("a").on_next(record(&log, "step:next")))
            .step("b")
            .on_next(Hook::sync(|_| Err("no".into())));
        let tour = Tour::new(config).unwrap();
        block_on(async {
            register_all(&tour, &["a", "b"]).await?;
            tour.start().await
        })
        .unwrap();

        let err = block_on(tour.next()).unwrap_err();
        assert!(
            matches!(err, TourError::Hook { event: LifecycleEvent::Next, .. }),
            "next hook failure propagates"
        );
        assert!(log.borrow().is_empty(), "step hook never ran");
        assert_eq!(current(&tour).as_deref(), Some("a"), "nothing dispatched");
    }

    #[test]
    fn jump_skips_navigation_hooks() {
        let log = Log::default();
        let config = TourConfig::new("t")
            .steps(["a", "b", "c"])
            .on_next(record(&log, "next"));
        let tour = Tour::new(config).unwrap();
        block_on(async {
            register_all(&tour, &["a", "b", "c"]).await?;
            tour.start().await?;
            tour.jump_to("c").await
        })
        .unwrap();
        assert_eq!(current(&tour).as_deref(), Some("c"));
        assert_eq!(tour.navigation_action(), NavAction::Jump);
        assert!(log.borrow().is_empty(), "jump fires no next hook");
    }

    #[test]
    fn custom_state_merges() {
        let tour = tour_of(&["a"]);
        tour.set_custom_state(custom(json!({ "a": 1 })));
        tour.set_custom_state(custom(json!({ "b": 2 })));
        assert_eq!(Value::Object(tour.custom_state()), json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn registration_merges_predefined_and_returns_an_anchor() {
        let config = TourConfig::new("t")
            .step(Step::new("menu").title("Menu").content("old"))
            .step("other");
        let tour = Tour::new(config).unwrap();
        let anchor = block_on(tour.register_step(Step::new("menu").content("new"))).unwrap();
        let menu = tour.read(|s| s.registered("menu").cloned()).unwrap();
        assert_eq!(menu.title.as_deref(), Some("Menu"));
        assert_eq!(menu.content.as_deref(), Some("new"));
        assert_eq!(menu.anchor.as_ref(), Some(&anchor), "stored step carries the anchor");

        let by_name = block_on(tour.register_step("menu")).unwrap();
        assert_ne!(by_name, anchor, "every registration gets a fresh anchor");
    }

    #[test]
    fn registration_errors() {
        let config = TourConfig::new("t")
            .step("a")
            .step(Step::new("lazy").fetch(|_| {}));
        let tour = Tour::new(config).unwrap();
        let register = |spec: StepSpec| block_on(tour.register_step(spec));

        assert!(matches!(
            register("a".into()),
            Err(TourError::UnknownStep { name }) if name == "a"
        ));
        assert!(matches!(
            register(Step::new("lazy").fetch(|_| {}).into()),
            Err(TourError::AsyncNotRegistrable { .. })
        ));
        assert!(matches!(
            register(Step::new("a").anchor(Anchor::new()).into()),
            Err(TourError::AlreadyRegistered { .. })
        ));
        assert!(matches!(
            register(Step::new("").into()),
            Err(TourError::InvalidStepConfig)
        ));
        assert!(tour.read(|s| s.steps().is_empty()), "nothing was registered");
    }

    #[test]
    fn add_and_remove_hooks_fire_tour_first() {
        let log = Log::default();
        let config = TourConfig::new("t")
            .step("a")
            .on_step_added(record(&log, "tour:added"))
            .on_step_removed(record(&log, "tour:removed"));
        let tour = Tour::new(config).unwrap();
        let step = Step::new("a")
            .on_step_added(record(&log, "step:added"))
            .on_step_removed(record(&log, "step:removed"));
        block_on(async {
            tour.add_step(step).await?;
            tour.remove_step("a").await?;
            tour.remove_step("a").await
        })
        .unwrap();
        assert_eq!(
            *log.borrow(),
            ["tour:added", "step:added", "tour:removed", "step:removed"],
            "second removal is a no-op"
        );
    }

    #[test]
    fn unregister_detaches_the_anchor() {
        let tour = Tour::new(TourConfig::new("t").step("a")).unwrap();
        let anchor = block_on(tour.register_step(Step::new("a"))).unwrap();
        anchor.set_bounds(kurbo::Rect::new(0.0, 0.0, 10.0, 10.0));
        block_on(tour.unregister_step("a")).unwrap();
        assert!(!anchor.is_measurable(), "bounds are forgotten");
        assert!(tour.read(|s| s.registered("a").is_none()), "step is gone");
    }

    #[test]
    fn failed_unregister_keeps_the_anchor() {
        let config = TourConfig::new("t")
            .step("a")
            .on_step_removed(Hook::sync(|_| Err("busy".into())));
        let tour = Tour::new(config).unwrap();
        let anchor = block_on(tour.register_step(Step::new("a"))).unwrap();
        anchor.set_bounds(kurbo::Rect::new(0.0, 0.0, 10.0, 10.0));

        let err = block_on(tour.unregister_step("a")).unwrap_err();
        assert!(
            matches!(err, TourError::Hook { event: LifecycleEvent::StepRemoved, .. }),
            "removal hook failure propagates"
        );
        assert!(tour.read(|s| s.registered("a").is_some()), "step is still registered");
        assert!(anchor.is_measurable(), "bounds survive a failed removal");
    }

    #[test]
    fn adding_an_unnamed_step_fails() {
        let tour = Tour::new(TourConfig::new("t")).unwrap();
        let err = block_on(tour.add_step(Step::default())).unwrap_err();
        assert!(matches!(err, TourError::InvalidStepConfig), "name is required");
    }

    #[test]
    fn hooks_see_the_tour_and_step() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let hook = Hook::sync(move |cx| {
            sink.borrow_mut().push(cx.clone());
            Ok(())
        });
        let tour = Tour::new(TourConfig::new("intro").step("a").on_step_added(hook)).unwrap();
        block_on(tour.register_step(Step::new("a"))).unwrap();
        assert_eq!(
            *seen.borrow(),
            [HookContext::new(LifecycleEvent::StepAdded, "intro", Some("a"))]
        );
    }
}
