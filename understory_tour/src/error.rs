// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error taxonomy.
//!
//! Configuration and registration errors are programmer errors: they are returned at the
//! point of misuse and never retried. Hook failures are wrapped in [`TourError::Hook`] and
//! propagate to the caller of the operation that triggered them; state that was already
//! dispatched is not rolled back.

use crate::hooks::{HookError, LifecycleEvent};

/// Errors returned by tour construction, registration, and navigation.
#[derive(Debug, thiserror::Error)]
pub enum TourError {
    /// A step passed at registration has no usable name.
    #[error("invalid step configuration: a step needs a non-empty name")]
    InvalidStepConfig,
    /// A lazily fetched step was passed to the registration call directly.
    #[error("step `{name}` is fetched lazily and cannot be registered directly")]
    AsyncNotRegistrable {
        /// Name of the offending step.
        name: String,
    },
    /// The step already carries an anchor, so it was registered before.
    #[error("step `{name}` is already registered")]
    AlreadyRegistered {
        /// Name of the offending step.
        name: String,
    },
    /// A bare name was registered but nothing by that name is known.
    #[error("no step named `{name}` is known to the tour")]
    UnknownStep {
        /// The unknown name.
        name: String,
    },
    /// An entry of the step order is not a valid step.
    #[error("step order entry {index} is not a valid step")]
    StepConfigurationInvalid {
        /// Position of the entry in the step order.
        index: usize,
    },
    /// A lifecycle hook failed.
    #[error("`{event}` hook failed")]
    Hook {
        /// The lifecycle event whose hook failed.
        event: LifecycleEvent,
        /// The hook's error.
        #[source]
        source: HookError,
    },
    /// Tour options could not be parsed.
    #[error("invalid tour options")]
    Options(#[from] serde_json::Error),
}
