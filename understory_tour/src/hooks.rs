// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifecycle hooks.
//!
//! ## Overview
//!
//! A [`Hook`] is an asynchronous, fallible callback attached either to the tour
//! ([`TourHooks`]) or to a single step ([`StepHooks`]).
//!
//! ## Ordering
//!
//! For any [`LifecycleEvent`], the tour-level hook fires first, then the step-level hook of
//! the same name. Hooks are awaited one after the other, never concurrently, and the first
//! failure aborts the rest of the sequence and propagates to the caller as
//! [`TourError::Hook`](crate::TourError::Hook).
//!
//! ```
//! use understory_tour::hooks::{Hook, HookContext, LifecycleEvent};
//!
//! let hook = Hook::sync(|cx: &HookContext| {
//!     assert_eq!(cx.event, LifecycleEvent::Start);
//!     Ok(())
//! });
//! let cx = HookContext::new(LifecycleEvent::Start, "intro", None);
//! futures::executor::block_on(hook.call(&cx)).unwrap();
//! ```

use core::fmt;
use core::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, ready};

use crate::error::TourError;

/// Error type returned by hooks.
pub type HookError = Box<dyn core::error::Error + Send + Sync>;

/// Future returned by a [`Hook`].
pub type HookFuture = LocalBoxFuture<'static, Result<(), HookError>>;

/// Names of the lifecycle events a hook can be attached to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LifecycleEvent {
    /// The tour is starting.
    Start,
    /// The tour is ending.
    End,
    /// The tour is pausing.
    Pause,
    /// The tour is resuming.
    Resume,
    /// Forward navigation.
    Next,
    /// Backward navigation.
    Prev,
    /// A step is being registered.
    StepAdded,
    /// A step is being removed.
    StepRemoved,
    /// A step became current and is about to be positioned.
    Show,
    /// A step stopped being current.
    Hide,
}

impl LifecycleEvent {
    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Next => "next",
            Self::Prev => "prev",
            Self::StepAdded => "step_added",
            Self::StepRemoved => "step_removed",
            Self::Show => "show",
            Self::Hide => "hide",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a hook is told about the event it handles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HookContext {
    /// The event being handled.
    pub event: LifecycleEvent,
    /// Name of the tour.
    pub tour: String,
    /// The step the event concerns, if any.
    pub step: Option<String>,
}

impl HookContext {
    /// Build a context.
    pub fn new(event: LifecycleEvent, tour: impl Into<String>, step: Option<&str>) -> Self {
        Self {
            event,
            tour: tour.into(),
            step: step.map(Into::into),
        }
    }
}

/// An asynchronous, fallible lifecycle callback.
///
/// Cheap to clone; clones share the callback.
#[derive(Clone)]
pub struct Hook(Rc<dyn Fn(&HookContext) -> HookFuture>);

impl Hook {
    /// Wrap an async callback.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(&HookContext) -> Fut + 'static,
        Fut: Future<Output = Result<(), HookError>> + 'static,
    {
        Self(Rc::new(move |cx| f(cx).boxed_local()))
    }

    /// Wrap a synchronous callback.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&HookContext) -> Result<(), HookError> + 'static,
    {
        Self(Rc::new(move |cx| ready(f(cx)).boxed_local()))
    }

    /// Invoke the callback.
    pub fn call(&self, cx: &HookContext) -> HookFuture {
        (self.0)(cx)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").finish_non_exhaustive()
    }
}

/// Tour-level hooks, all optional.
#[derive(Clone, Debug, Default)]
pub struct TourHooks {
    /// Fired before the tour starts.
    pub on_start: Option<Hook>,
    /// Fired before the tour ends.
    pub on_end: Option<Hook>,
    /// Fired before the tour pauses.
    pub on_pause: Option<Hook>,
    /// Fired before the tour resumes.
    pub on_resume: Option<Hook>,
    /// Fired before moving forward.
    pub on_next: Option<Hook>,
    /// Fired before moving backward.
    pub on_prev: Option<Hook>,
    /// Fired before a step is added.
    pub on_step_added: Option<Hook>,
    /// Fired before a step is removed.
    pub on_step_removed: Option<Hook>,
}

impl TourHooks {
    /// The hook for `event`, if set. Tours have no show/hide hooks.
    pub fn get(&self, event: LifecycleEvent) -> Option<&Hook> {
        match event {
            LifecycleEvent::Start => self.on_start.as_ref(),
            LifecycleEvent::End => self.on_end.as_ref(),
            LifecycleEvent::Pause => self.on_pause.as_ref(),
            LifecycleEvent::Resume => self.on_resume.as_ref(),
            LifecycleEvent::Next => self.on_next.as_ref(),
            LifecycleEvent::Prev => self.on_prev.as_ref(),
            LifecycleEvent::StepAdded => self.on_step_added.as_ref(),
            LifecycleEvent::StepRemoved => self.on_step_removed.as_ref(),
            LifecycleEvent::Show | LifecycleEvent::Hide => None,
        }
    }
}

/// Step-level hooks, all optional.
#[derive(Clone, Debug, Default)]
pub struct StepHooks {
    /// Fired when the step becomes current, before scrolling and backdrop updates.
    pub on_show: Option<Hook>,
    /// Fired when the step stops being current.
    pub on_hide: Option<Hook>,
    /// Fired when moving forward from this step.
    pub on_next: Option<Hook>,
    /// Fired when moving backward from this step.
    pub on_prev: Option<Hook>,
    /// Fired when this step is added.
    pub on_step_added: Option<Hook>,
    /// Fired when this step is removed.
    pub on_step_removed: Option<Hook>,
}

impl StepHooks {
    /// The hook for `event`, if set. Steps have no start/end/pause/resume hooks.
    pub fn get(&self, event: LifecycleEvent) -> Option<&Hook> {
        match event {
            LifecycleEvent::Show => self.on_show.as_ref(),
            LifecycleEvent::Hide => self.on_hide.as_ref(),
            LifecycleEvent::Next => self.on_next.as_ref(),
            LifecycleEvent::Prev => self.on_prev.as_ref(),
            LifecycleEvent::StepAdded => self.on_step_added.as_ref(),
            LifecycleEvent::StepRemoved => self.on_step_removed.as_ref(),
            LifecycleEvent::Start
            | LifecycleEvent::End
            | LifecycleEvent::Pause
            | LifecycleEvent::Resume => None,
        }
    }

    /// Shallow merge: hooks set on `self` win, the rest come from `base`.
    pub fn layered_over(&self, base: &Self) -> Self {
        Self {
            on_show: self.on_show.clone().or_else(|| base.on_show.clone()),
            on_hide: self.on_hide.clone().or_else(|| base.on_hide.clone()),
            on_next: self.on_next.clone().or_else(|| base.on_next.clone()),
            on_prev: self.on_prev.clone().or_else(|| base.on_prev.clone()),
            on_step_added: self
                .on_step_added
                .clone()
                .or_else(|| base.on_step_added.clone()),
            on_step_removed: self
                .on_step_removed
                .clone()
                .or_else(|| base.on_step_removed.clone()),
        }
    }
}

/// Await `hooks` in order, stopping at the first failure.
pub(crate) async fn fire(
    cx: &HookContext,
    hooks: impl IntoIterator<Item = Hook>,
) -> Result<(), TourError> {
    for hook in hooks {
        hook.call(cx)
            .await
            .map_err(|source| TourError::Hook {
                event: cx.event,
                source,
            })?;
    }
    Ok(())
}
