// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Step descriptors, classification, and registration.
//!
//! ## Overview
//!
//! A [`Step`] describes one stop of the tour. Callers hand steps to the tour as a
//! [`StepSpec`]: either a bare name referring to a step defined elsewhere, or a full
//! descriptor. [`classify`] sorts a spec into a [`StepKind`] using these rules, checked in
//! order:
//!
//! 1. An empty name with no fetch is [`Invalid`](StepKind::Invalid).
//! 2. A bare name is a [`Name`](StepKind::Name) reference.
//! 3. A descriptor with a fetch callback is [`Async`](StepKind::Async), whatever else it sets.
//! 4. A descriptor that already carries an anchor is [`Full`](StepKind::Full).
//! 5. A descriptor with a name is [`Predefined`](StepKind::Predefined).
//!
//! Step order entries are classified once, when the tour is built, into the
//! [`StepOrderEntry`] tagged union. Registrations go through [`prepare_registration`], which
//! merges late registration data over the predefined descriptor.
//!
//! ## Async steps
//!
//! An async step's fetch callback receives a [`FetchHandle`]: a minimal capability with
//! [`resolve`](FetchHandle::resolve) and [`reject`](FetchHandle::reject). The tour does not
//! await the fetch; it parks in [`Waiting`](crate::types::TourStatus::Waiting) until the step
//! is registered, either through the handle or through
//! [`Tour::register_step`](crate::Tour::register_step).

use core::fmt;
use std::rc::Rc;

use futures::channel::mpsc::UnboundedSender;
use serde_json::Value;

use crate::anchor::Anchor;
use crate::config::{ResolvedSettings, ScrollMargins, Settings, TourOptions};
use crate::error::TourError;
use crate::hooks::{Hook, HookError, StepHooks};
use crate::state::CustomState;
use crate::types::Placement;

/// Predicate deciding whether navigation should pass over a step.
pub type SkipPredicate = Rc<dyn Fn(&CustomState) -> bool>;

/// Callback that starts loading an async step.
pub type Fetch = Rc<dyn Fn(FetchHandle)>;

/// A step descriptor.
///
/// Built fluently:
///
/// ```
/// use understory_tour::step::Step;
/// use understory_tour::types::Placement;
///
/// let step = Step::new("menu")
///     .title("Menu")
///     .content("Everything lives here.")
///     .placement(Placement::Right)
///     .backdrop(true);
/// assert_eq!(step.name, "menu");
/// ```
#[derive(Clone, Default)]
pub struct Step {
    /// Unique key of the step.
    pub name: String,
    /// Popover title, opaque to the tour.
    pub title: Option<String>,
    /// Popover body, opaque to the tour.
    pub content: Option<String>,
    /// Step-level settings layered over the tour's.
    pub settings: Settings,
    /// Step-level lifecycle hooks.
    pub hooks: StepHooks,
    /// Navigation passes over the step while this returns `true`.
    pub should_skip: Option<SkipPredicate>,
    /// Loader for lazily registered steps.
    pub fetch: Option<Fetch>,
    /// Handle to the on-screen element, set once the step is registered.
    pub anchor: Option<Anchor>,
}

impl Step {
    /// A step with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the popover placement.
    pub fn placement(mut self, placement: Placement) -> Self {
        self.settings.placement = Some(placement);
        self
    }

    /// Set the offset along the placement axis.
    pub fn offset(mut self, offset: f64) -> Self {
        self.settings.offset = Some(offset);
        self
    }

    /// Set the shift along the anchor edge.
    pub fn skid(mut self, skid: f64) -> Self {
        self.settings.skid = Some(skid);
        self
    }

    /// Present the step as a centred modal.
    pub fn modal(mut self, is_modal: bool) -> Self {
        self.settings.is_modal = Some(is_modal);
        self
    }

    /// Dim the page behind the step.
    pub fn backdrop(mut self, has_backdrop: bool) -> Self {
        self.settings.has_backdrop = Some(has_backdrop);
        self
    }

    /// Set the scroll margins.
    pub fn scroll_margins(mut self, margins: ScrollMargins) -> Self {
        self.settings.scroll_margins = Some(margins);
        self
    }

    /// Set a free-form setting.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.extra.insert(key.into(), value.into());
        self
    }

    /// Set the `show` hook.
    pub fn on_show(mut self, hook: Hook) -> Self {
        self.hooks.on_show = Some(hook);
        self
    }

    /// Set the `hide` hook.
    pub fn on_hide(mut self, hook: Hook) -> Self {
        self.hooks.on_hide = Some(hook);
        self
    }

    /// Set the `next` hook.
    pub fn on_next(mut self, hook: Hook) -> Self {
        self.hooks.on_next = Some(hook);
        self
    }

    /// Set the `prev` hook.
    pub fn on_prev(mut self, hook: Hook) -> Self {
        self.hooks.on_prev = Some(hook);
        self
    }

    /// Set the `step_added` hook.
    pub fn on_step_added(mut self, hook: Hook) -> Self {
        self.hooks.on_step_added = Some(hook);
        self
    }

    /// Set the `step_removed` hook.
    pub fn on_step_removed(mut self, hook: Hook) -> Self {
        self.hooks.on_step_removed = Some(hook);
        self
    }

    /// Skip the step while `predicate` holds.
    pub fn skip_when(mut self, predicate: impl Fn(&CustomState) -> bool + 'static) -> Self {
        self.should_skip = Some(Rc::new(predicate));
        self
    }

    /// Load the step lazily with `fetch`.
    pub fn fetch(mut self, fetch: impl Fn(FetchHandle) + 'static) -> Self {
        self.fetch = Some(Rc::new(fetch));
        self
    }

    /// Attach an anchor.
    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Returns `true` if the skip predicate is set and holds.
    pub fn is_skipped(&self, custom: &CustomState) -> bool {
        self.should_skip.as_ref().is_some_and(|skip| skip(custom))
    }

    /// Resolve this step's settings over the tour's.
    pub fn resolved_settings(&self, tour: &TourOptions) -> ResolvedSettings {
        Settings::resolve(&[&self.settings, &tour.settings])
    }

    /// Resolve a setting by name, step first, then tour.
    pub fn config_value(&self, tour: &TourOptions, key: &str) -> Option<Value> {
        Settings::value(&[&self.settings, &tour.settings], key)
    }

    /// Shallow merge: fields set on `self` win, the rest come from `base`.
    pub fn layered_over(&self, base: &Self) -> Self {
        Self {
            name: self.name.clone(),
            title: self.title.clone().or_else(|| base.title.clone()),
            content: self.content.clone().or_else(|| base.content.clone()),
            settings: self.settings.layered_over(&base.settings),
            hooks: self.hooks.layered_over(&base.hooks),
            should_skip: self
                .should_skip
                .clone()
                .or_else(|| base.should_skip.clone()),
            fetch: self.fetch.clone().or_else(|| base.fetch.clone()),
            anchor: self.anchor.clone().or_else(|| base.anchor.clone()),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("content", &self.content)
            .field("settings", &self.settings)
            .field("hooks", &self.hooks)
            .field("should_skip", &self.should_skip.is_some())
            .field("fetch", &self.fetch.is_some())
            .field("anchor", &self.anchor)
            .finish()
    }
}

/// A step as handed to the tour: a bare name or a descriptor.
#[derive(Clone, Debug)]
pub enum StepSpec {
    /// Reference to a step defined elsewhere.
    Name(String),
    /// A descriptor.
    Step(Step),
}

impl StepSpec {
    /// The name the spec refers to or defines.
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Step(step) => &step.name,
        }
    }
}

impl From<&str> for StepSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.into())
    }
}

impl From<String> for StepSpec {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Step> for StepSpec {
    fn from(step: Step) -> Self {
        Self::Step(step)
    }
}

/// Shape of a [`StepSpec`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StepKind {
    /// A bare name.
    Name,
    /// A named descriptor without an anchor.
    Predefined,
    /// A descriptor that already carries an anchor.
    Full,
    /// A descriptor with a fetch callback.
    Async,
    /// Nothing usable.
    Invalid,
}

/// Classify a spec. See the [module docs](self) for the rules.
pub fn classify(spec: &StepSpec) -> StepKind {
    match spec {
        StepSpec::Name(name) if name.is_empty() => StepKind::Invalid,
        StepSpec::Name(_) => StepKind::Name,
        StepSpec::Step(step) if step.fetch.is_some() => StepKind::Async,
        StepSpec::Step(step) if step.name.is_empty() => StepKind::Invalid,
        StepSpec::Step(step) if step.anchor.is_some() => StepKind::Full,
        StepSpec::Step(_) => StepKind::Predefined,
    }
}

/// One validated entry of the step order.
#[derive(Clone)]
pub enum StepOrderEntry {
    /// Refers to a step that is registered separately.
    Name(String),
    /// An inline descriptor: predefined data for a later registration, or an already
    /// registered step when it carries an anchor.
    Inline(Rc<Step>),
    /// A step that is fetched when the tour reaches it.
    Async {
        /// Name the fetched step will be registered under.
        name: String,
        /// Loader.
        fetch: Fetch,
        /// Skip predicate declared on the entry itself.
        should_skip: Option<SkipPredicate>,
    },
}

impl StepOrderEntry {
    /// Validate the spec at `index` of the step order.
    pub fn parse(index: usize, spec: StepSpec) -> Result<Self, TourError> {
        match (classify(&spec), spec) {
            (StepKind::Name, StepSpec::Name(name)) => Ok(Self::Name(name)),
            (StepKind::Async, StepSpec::Step(step)) => match step.fetch {
                Some(fetch) if !step.name.is_empty() => Ok(Self::Async {
                    name: step.name,
                    fetch,
                    should_skip: step.should_skip,
                }),
                _ => Err(TourError::StepConfigurationInvalid { index }),
            },
            (StepKind::Predefined | StepKind::Full, StepSpec::Step(step)) => {
                Ok(Self::Inline(Rc::new(step)))
            }
            _ => Err(TourError::StepConfigurationInvalid { index }),
        }
    }

    /// Name of the step this entry refers to.
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Async { name, .. } => name,
            Self::Inline(step) => &step.name,
        }
    }

    /// Returns `true` for async entries.
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async { .. })
    }

    /// Returns `true` if the entry's own skip predicate holds.
    pub fn is_skipped(&self, custom: &CustomState) -> bool {
        match self {
            Self::Name(_) => false,
            Self::Inline(step) => step.is_skipped(custom),
            Self::Async { should_skip, .. } => {
                should_skip.as_ref().is_some_and(|skip| skip(custom))
            }
        }
    }

    /// The inline descriptor, if this entry has one.
    pub fn inline(&self) -> Option<&Rc<Step>> {
        match self {
            Self::Inline(step) => Some(step),
            Self::Name(_) | Self::Async { .. } => None,
        }
    }
}

impl fmt::Debug for StepOrderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Inline(step) => f.debug_tuple("Inline").field(&step.name).finish(),
            Self::Async {
                name, should_skip, ..
            } => f
                .debug_struct("Async")
                .field("name", name)
                .field("should_skip", &should_skip.is_some())
                .finish_non_exhaustive(),
        }
    }
}

/// Turn a registration call into the descriptor to store.
///
/// `existing` is what the tour already knows under the spec's name: a registered step or an
/// inline descriptor from the step order.
pub fn prepare_registration(spec: StepSpec, existing: Option<&Step>) -> Result<Step, TourError> {
    match (classify(&spec), spec) {
        (StepKind::Name, StepSpec::Name(name)) => {
            existing.cloned().ok_or(TourError::UnknownStep { name })
        }
        (StepKind::Predefined, StepSpec::Step(step)) => Ok(match existing {
            Some(base) => step.layered_over(base),
            None => step,
        }),
        (StepKind::Full, StepSpec::Step(step)) => {
            Err(TourError::AlreadyRegistered { name: step.name })
        }
        (StepKind::Async, StepSpec::Step(step)) => {
            Err(TourError::AsyncNotRegistrable { name: step.name })
        }
        _ => Err(TourError::InvalidStepConfig),
    }
}

/// Completion of a fetch, delivered to the tour over its completion channel.
#[derive(Debug)]
pub(crate) enum FetchOutcome {
    Resolved(Step),
    Rejected { name: String, error: HookError },
}

/// Capability handed to an async step's fetch callback.
///
/// Resolving registers the step, which releases a tour waiting for it. The handle may be
/// kept and resolved later; outcomes that arrive after the triggering operation returned
/// are applied by the next operation or by
/// [`Tour::process_pending`](crate::Tour::process_pending).
#[derive(Debug)]
pub struct FetchHandle {
    name: String,
    completion: UnboundedSender<FetchOutcome>,
}

impl FetchHandle {
    pub(crate) fn new(name: String, completion: UnboundedSender<FetchOutcome>) -> Self {
        Self { name, completion }
    }

    /// Name of the step being fetched.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register the fetched step. An unnamed step takes the fetched name.
    pub fn resolve(self, mut step: Step) {
        if step.name.is_empty() {
            step.name = self.name.clone();
        }
        self.send(FetchOutcome::Resolved(step));
    }

    /// Report that the step could not be loaded. The tour keeps waiting.
    pub fn reject(self, error: impl Into<HookError>) {
        let name = self.name.clone();
        self.send(FetchOutcome::Rejected {
            name,
            error: error.into(),
        });
    }

    fn send(self, outcome: FetchOutcome) {
        if self.completion.unbounded_send(outcome).is_err() {
            tracing::debug!(step = %self.name, "tour dropped before fetch completed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{FutureExt, StreamExt};
    use kurbo::Rect;
    use serde_json::json;

    fn lazy() -> Step {
        Step::new("lazy").fetch(|_handle| {})
    }

    #[test]
    fn classify_follows_precedence() {
        assert_eq!(classify(&"".into()), StepKind::Invalid);
        assert_eq!(classify(&"welcome".into()), StepKind::Name);
        assert_eq!(classify(&Step::new("").into()), StepKind::Invalid);
        assert_eq!(classify(&Step::new("a").into()), StepKind::Predefined);
        let anchored = Step::new("a").anchor(Anchor::with_bounds(Rect::ZERO));
        assert_eq!(classify(&anchored.clone().into()), StepKind::Full);
        // A fetch wins over everything else, even an anchor.
        assert_eq!(classify(&anchored.fetch(|_| {}).into()), StepKind::Async);
        assert_eq!(classify(&lazy().into()), StepKind::Async);
    }

    #[test]
    fn parse_rejects_invalid_entries() {
        assert!(matches!(
            StepOrderEntry::parse(3, "".into()),
            Err(TourError::StepConfigurationInvalid { index: 3 })
        ));
        assert!(matches!(
            StepOrderEntry::parse(1, Step::new("").fetch(|_| {}).into()),
            Err(TourError::StepConfigurationInvalid { index: 1 })
        ));
    }

    #[test]
    fn parse_builds_tagged_entries() {
        let name = StepOrderEntry::parse(0, "a".into()).unwrap();
        assert_eq!(name.name(), "a");
        assert!(name.inline().is_none(), "bare names carry no descriptor");

        let inline = StepOrderEntry::parse(1, Step::new("b").title("B").into()).unwrap();
        assert_eq!(inline.inline().and_then(|s| s.title.as_deref()), Some("B"));

        let lazy = StepOrderEntry::parse(2, lazy().into()).unwrap();
        assert!(lazy.is_async(), "fetch makes an async entry");
        assert_eq!(lazy.name(), "lazy");
    }

    #[test]
    fn entry_skip_predicates_see_custom_state() {
        let entry = StepOrderEntry::parse(
            0,
            Step::new("b")
                .skip_when(|custom| custom.get("done") == Some(&json!(true)))
                .into(),
        )
        .unwrap();
        let mut custom = CustomState::new();
        assert!(!entry.is_skipped(&custom), "not done yet");
        custom.insert("done".into(), json!(true));
        assert!(entry.is_skipped(&custom), "done steps are skipped");
    }

    #[test]
    fn registration_merges_over_predefined() {
        let predefined = Step::new("menu").title("Menu").offset(10.0).content("old");
        let late = Step::new("menu").content("new");
        let merged = prepare_registration(late.into(), Some(&predefined)).unwrap();
        assert_eq!(merged.title.as_deref(), Some("Menu"));
        assert_eq!(merged.content.as_deref(), Some("new"));
        assert_eq!(merged.settings.offset, Some(10.0));
    }

    #[test]
    fn registration_errors() {
        assert!(matches!(
            prepare_registration("ghost".into(), None),
            Err(TourError::UnknownStep { name }) if name == "ghost"
        ));
        assert!(matches!(
            prepare_registration(lazy().into(), None),
            Err(TourError::AsyncNotRegistrable { name }) if name == "lazy"
        ));
        let full = Step::new("a").anchor(Anchor::new());
        assert!(matches!(
            prepare_registration(full.into(), None),
            Err(TourError::AlreadyRegistered { name }) if name == "a"
        ));
        assert!(matches!(
            prepare_registration(Step::new("").into(), None),
            Err(TourError::InvalidStepConfig)
        ));
    }

    #[test]
    fn bare_name_registration_uses_existing_descriptor() {
        let existing = Step::new("title").title("Title");
        let step = prepare_registration("title".into(), Some(&existing)).unwrap();
        assert_eq!(step.title.as_deref(), Some("Title"));
    }

    #[test]
    fn fetch_handle_names_unnamed_steps() {
        let (tx, mut rx) = futures::channel::mpsc::unbounded();
        FetchHandle::new("lazy".into(), tx).resolve(Step::default().title("Late"));
        match rx.next().now_or_never() {
            Some(Some(FetchOutcome::Resolved(step))) => assert_eq!(step.name, "lazy"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn resolved_settings_layer_step_over_tour() {
        let mut tour = TourOptions::named("t");
        tour.settings.offset = Some(12.0);
        tour.settings.placement = Some(Placement::Top);
        let step = Step::new("a").placement(Placement::Left).extra("width", 200);
        let resolved = step.resolved_settings(&tour);
        assert_eq!(resolved.placement, Placement::Left);
        assert_eq!(resolved.offset, 12.0);
        assert_eq!(step.config_value(&tour, "width"), Some(json!(200)));
    }
}
