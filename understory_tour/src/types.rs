// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for the tour: status, navigation causes, placement, and snapshot changes.
//!
//! ## Overview
//!
//! These types describe the tour protocol and are shared by the [state](crate::state),
//! the [sequencer](crate::sequencer), and downstream renderers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a tour.
///
/// Drives which [operations](crate::actions) are permitted:
/// - `start` only from [`Off`](Self::Off).
/// - `end` from anything but [`Off`](Self::Off).
/// - `pause`, `next`, `prev`, and `jump_to` only from [`On`](Self::On).
/// - `resume` only from [`Paused`](Self::Paused).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourStatus {
    /// Not running.
    #[default]
    Off,
    /// Running; the current step is (or is about to be) shown.
    On,
    /// Paused by the user.
    Paused,
    /// Parked until an asynchronously fetched step is registered.
    Waiting,
}

impl TourStatus {
    /// Returns `true` if the tour is running.
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    /// Returns `true` for every status except [`Off`](Self::Off).
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Off)
    }
}

/// The most recent navigation cause.
///
/// Recorded by the [reducer](crate::state::reduce) so that observers can tell
/// which directional transition produced the current pointer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavAction {
    /// No navigation has happened yet.
    #[default]
    None,
    /// The tour was started.
    Start,
    /// The tour was ended.
    End,
    /// The tour was paused.
    Pause,
    /// The tour was resumed.
    Resume,
    /// Forward navigation.
    Next,
    /// Backward navigation.
    Prev,
    /// Direct jump to a named step.
    Jump,
}

impl NavAction {
    /// Stable lowercase name, suitable for logs and serialized snapshots.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Start => "start",
            Self::End => "end",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Next => "next",
            Self::Prev => "prev",
            Self::Jump => "jump",
        }
    }
}

impl fmt::Display for NavAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preferred popover placement relative to the step anchor.
///
/// Passed through to the [positioning service](crate::services::Positioner); the
/// tour itself performs no placement math.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    /// Let the positioner choose the side with the most room.
    Auto,
    /// Automatic side, aligned to the start edge.
    AutoStart,
    /// Automatic side, aligned to the end edge.
    AutoEnd,
    /// Above the anchor.
    Top,
    /// Above the anchor, start-aligned.
    TopStart,
    /// Above the anchor, end-aligned.
    TopEnd,
    /// Below the anchor.
    #[default]
    Bottom,
    /// Below the anchor, start-aligned.
    BottomStart,
    /// Below the anchor, end-aligned.
    BottomEnd,
    /// Right of the anchor.
    Right,
    /// Right of the anchor, start-aligned.
    RightStart,
    /// Right of the anchor, end-aligned.
    RightEnd,
    /// Left of the anchor.
    Left,
    /// Left of the anchor, start-aligned.
    LeftStart,
    /// Left of the anchor, end-aligned.
    LeftEnd,
}

/// Positioning strategy for the popover.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Positioned in document space, scrolling with the page.
    #[default]
    Absolute,
    /// Positioned in viewport space; used for modal steps.
    Fixed,
}

bitflags::bitflags! {
    /// Fields of the transition snapshot that differ between two observations.
    ///
    /// The [sequencer](crate::sequencer) runs its protocol whenever this set is non-empty.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct SnapshotChanges: u8 {
        /// The previously shown step changed.
        const PREVIOUS_STEP = 0b0000_0001;
        /// The current step changed.
        const CURRENT_STEP  = 0b0000_0010;
        /// The step pointer moved.
        const POINTER       = 0b0000_0100;
        /// The tour status changed.
        const STATUS        = 0b0000_1000;
    }
}
