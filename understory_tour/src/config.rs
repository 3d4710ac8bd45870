// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tour configuration and layered settings.
//!
//! ## Overview
//!
//! Presentation settings (placement, offsets, modal/backdrop flags, scroll margins, and
//! backdrop options) live in a [`Settings`] layer. A [`Step`](crate::step::Step) carries one
//! layer and the tour's [`TourOptions`] carries another. Nothing walks an implicit lookup
//! chain: [`Settings::resolve`] takes an explicit, ordered list of layers (step first, then
//! tour) and the first layer that sets a field wins, falling back to the built-in default.
//!
//! Options are plain data and deserialize with `serde`:
//!
//! ```
//! use understory_tour::config::TourOptions;
//! use understory_tour::types::Placement;
//!
//! let options = TourOptions::from_json(
//!     r#"{ "name": "intro", "placement": "top", "offset": 8, "theme": "dark" }"#,
//! )
//! .unwrap();
//! assert_eq!(options.settings.placement, Some(Placement::Top));
//! assert_eq!(options.settings.extra["theme"], "dark");
//! ```
//!
//! [`TourConfig`] bundles the options with the step order and the tour-level hooks.

use kurbo::Insets;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TourError;
use crate::hooks::{Hook, TourHooks};
use crate::step::StepSpec;
use crate::types::Placement;

/// Popover class used when neither the step nor the tour sets one.
pub const DEFAULT_POPOVER_CLASS: &str = "tour-popover";

/// Margins kept clear around the viewport edges when scrolling a step into view.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollMargins {
    /// Clearance from the top edge.
    pub top: f64,
    /// Clearance from the left edge.
    pub left: f64,
    /// Clearance from the bottom edge.
    pub bottom: f64,
    /// Clearance from the right edge.
    pub right: f64,
}

impl ScrollMargins {
    /// No margins.
    pub const ZERO: Self = Self {
        top: 0.0,
        left: 0.0,
        bottom: 0.0,
        right: 0.0,
    };

    /// Convert to Kurbo insets (`x0` left, `y0` top, `x1` right, `y1` bottom).
    pub fn to_insets(self) -> Insets {
        Insets::new(self.left, self.top, self.right, self.bottom)
    }
}

/// Options passed to the backdrop service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropOptions {
    /// Dim the whole page instead of cutting out the anchor.
    ///
    /// Always overwritten with the step's resolved modal flag before it reaches the backdrop.
    pub full_screen: bool,
    /// Class prefix for the backdrop elements.
    pub class_prefix: Option<String>,
    /// Backend-specific options, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One layer of presentation settings; every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Popover placement.
    pub placement: Option<Placement>,
    /// Distance between anchor and popover along the placement axis.
    pub offset: Option<f64>,
    /// Shift of the popover along the anchor edge.
    pub skid: Option<f64>,
    /// Show the popover centred on screen instead of next to the anchor.
    pub is_modal: Option<bool>,
    /// Dim the page behind the step.
    pub has_backdrop: Option<bool>,
    /// Viewport margins used when scrolling into view.
    pub scroll_margins: Option<ScrollMargins>,
    /// Backdrop options.
    pub backdrop: Option<BackdropOptions>,
    /// Class name for the popover container.
    pub popover_class: Option<String>,
    /// Free-form keys, resolved with [`Settings::value`].
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Settings after resolution: every field has a value.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedSettings {
    /// Popover placement.
    pub placement: Placement,
    /// Distance between anchor and popover along the placement axis.
    pub offset: f64,
    /// Shift of the popover along the anchor edge.
    pub skid: f64,
    /// Modal presentation.
    pub is_modal: bool,
    /// Backdrop requested.
    pub has_backdrop: bool,
    /// Viewport margins used when scrolling into view.
    pub scroll_margins: ScrollMargins,
    /// Backdrop options, with `full_screen` set from `is_modal`.
    pub backdrop: BackdropOptions,
    /// Class name for the popover container.
    pub popover_class: String,
}

/// Resolve a setting from an ordered list of sources; the first source that is set wins.
///
/// ```
/// use understory_tour::config::resolve;
///
/// let step = None;
/// let tour = Some(&12.0);
/// assert_eq!(resolve(&[step, tour]), Some(12.0));
/// ```
pub fn resolve<T: Clone>(sources: &[Option<&T>]) -> Option<T> {
    sources.iter().copied().flatten().next().cloned()
}

fn first<'a, T: Clone + 'a>(
    layers: &[&'a Settings],
    field: impl Fn(&'a Settings) -> Option<&'a T>,
) -> Option<T> {
    let sources: Vec<Option<&T>> = layers.iter().map(|&layer| field(layer)).collect();
    resolve(&sources)
}

impl Settings {
    /// Resolve `layers` (highest precedence first) into concrete settings.
    pub fn resolve(layers: &[&Self]) -> ResolvedSettings {
        let is_modal = first(layers, |s| s.is_modal.as_ref()).unwrap_or(false);
        let mut backdrop: BackdropOptions =
            first(layers, |s| s.backdrop.as_ref()).unwrap_or_default();
        backdrop.full_screen = is_modal;
        ResolvedSettings {
            placement: first(layers, |s| s.placement.as_ref()).unwrap_or_default(),
            offset: first(layers, |s| s.offset.as_ref()).unwrap_or(0.0),
            skid: first(layers, |s| s.skid.as_ref()).unwrap_or(0.0),
            is_modal,
            has_backdrop: first(layers, |s| s.has_backdrop.as_ref()).unwrap_or(false),
            scroll_margins: first(layers, |s| s.scroll_margins.as_ref())
                .unwrap_or(ScrollMargins::ZERO),
            backdrop,
            popover_class: first(layers, |s| s.popover_class.as_ref())
                .unwrap_or_else(|| DEFAULT_POPOVER_CLASS.into()),
        }
    }

    /// Resolve `key` across `layers` (highest precedence first).
    ///
    /// Typed fields answer to their own names (`"offset"`, `"placement"`, ...) in their
    /// serialized form; any other key is looked up in [`extra`](Self::extra).
    pub fn value(layers: &[&Self], key: &str) -> Option<Value> {
        layers.iter().find_map(|&layer| layer.own_value(key))
    }

    fn own_value(&self, key: &str) -> Option<Value> {
        let typed = match key {
            "placement" => self.placement.as_ref().map(serde_json::to_value),
            "offset" => self.offset.as_ref().map(serde_json::to_value),
            "skid" => self.skid.as_ref().map(serde_json::to_value),
            "is_modal" => self.is_modal.as_ref().map(serde_json::to_value),
            "has_backdrop" => self.has_backdrop.as_ref().map(serde_json::to_value),
            "scroll_margins" => self.scroll_margins.as_ref().map(serde_json::to_value),
            "backdrop" => self.backdrop.as_ref().map(serde_json::to_value),
            "popover_class" => self.popover_class.as_ref().map(serde_json::to_value),
            _ => None,
        };
        match typed {
            Some(Ok(value)) => Some(value),
            Some(Err(error)) => {
                tracing::debug!(key, %error, "setting does not serialize");
                None
            }
            None => self.extra.get(key).cloned(),
        }
    }

    /// Shallow merge: fields set on `self` win, the rest come from `base`.
    pub fn layered_over(&self, base: &Self) -> Self {
        let mut extra = base.extra.clone();
        extra.extend(self.extra.clone());
        Self {
            placement: self.placement.or(base.placement),
            offset: self.offset.or(base.offset),
            skid: self.skid.or(base.skid),
            is_modal: self.is_modal.or(base.is_modal),
            has_backdrop: self.has_backdrop.or(base.has_backdrop),
            scroll_margins: self.scroll_margins.or(base.scroll_margins),
            backdrop: self.backdrop.clone().or_else(|| base.backdrop.clone()),
            popover_class: self
                .popover_class
                .clone()
                .or_else(|| base.popover_class.clone()),
            extra,
        }
    }
}

/// The data part of a tour configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TourOptions {
    /// Name of the tour, reported to hooks and logs.
    pub name: String,
    /// Tour-wide defaults for every step.
    #[serde(flatten)]
    pub settings: Settings,
}

impl TourOptions {
    /// Options with a name and no overrides.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: Settings::default(),
        }
    }

    /// Parse options from JSON.
    pub fn from_json(json: &str) -> Result<Self, TourError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Everything needed to construct a [`Tour`](crate::Tour).
///
/// The step order is fixed here; entries are validated by [`Tour::new`](crate::Tour::new).
#[derive(Clone, Debug, Default)]
pub struct TourConfig {
    /// Data options.
    pub options: TourOptions,
    /// Intended traversal order.
    pub step_order: Vec<StepSpec>,
    /// Tour-level lifecycle hooks.
    pub hooks: TourHooks,
}

impl TourConfig {
    /// A named tour with no steps.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_options(TourOptions::named(name))
    }

    /// A tour built from already parsed options.
    pub fn from_options(options: TourOptions) -> Self {
        Self {
            options,
            step_order: Vec::new(),
            hooks: TourHooks::default(),
        }
    }

    /// Append an entry to the step order.
    pub fn step(mut self, spec: impl Into<StepSpec>) -> Self {
        self.step_order.push(spec.into());
        self
    }

    /// Append several entries to the step order.
    pub fn steps<S: Into<StepSpec>>(mut self, specs: impl IntoIterator<Item = S>) -> Self {
        self.step_order.extend(specs.into_iter().map(Into::into));
        self
    }

    /// Replace the tour-wide settings.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.options.settings = settings;
        self
    }

    /// Set the `start` hook.
    pub fn on_start(mut self, hook: Hook) -> Self {
        self.hooks.on_start = Some(hook);
        self
    }

    /// Set the `end` hook.
    pub fn on_end(mut self, hook: Hook) -> Self {
        self.hooks.on_end = Some(hook);
        self
    }

    /// Set the `pause` hook.
    pub fn on_pause(mut self, hook: Hook) -> Self {
        self.hooks.on_pause = Some(hook);
        self
    }

    /// Set the `resume` hook.
    pub fn on_resume(mut self, hook: Hook) -> Self {
        self.hooks.on_resume = Some(hook);
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_takes_first_set_source() {
        assert_eq!(resolve::<u32>(&[None, None]), None);
        assert_eq!(resolve(&[None, Some(&2), Some(&3)]), Some(2));
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let r = Settings::resolve(&[&Settings::default(), &Settings::default()]);
        assert_eq!(r.placement, Placement::Bottom);
        assert_eq!(r.offset, 0.0);
        assert!(!r.is_modal && !r.has_backdrop, "modal and backdrop are opt-in");
        assert_eq!(r.scroll_margins, ScrollMargins::ZERO);
        assert_eq!(r.popover_class, DEFAULT_POPOVER_CLASS);
    }

    #[test]
    fn step_layer_overrides_tour_layer() {
        let step = Settings {
            offset: Some(4.0),
            ..Default::default()
        };
        let tour = Settings {
            offset: Some(10.0),
            placement: Some(Placement::Left),
            ..Default::default()
        };
        let r = Settings::resolve(&[&step, &tour]);
        assert_eq!(r.offset, 4.0);
        assert_eq!(r.placement, Placement::Left);
    }

    #[test]
    fn value_answers_typed_fields_by_name() {
        let layer = Settings {
            placement: Some(Placement::RightEnd),
            scroll_margins: Some(ScrollMargins {
                top: 20.0,
                ..ScrollMargins::ZERO
            }),
            ..Default::default()
        };
        assert_eq!(Settings::value(&[&layer], "placement"), Some(json!("right-end")));
        assert_eq!(
            Settings::value(&[&layer], "scroll_margins"),
            Some(json!({ "top": 20.0, "left": 0.0, "bottom": 0.0, "right": 0.0 }))
        );
        assert_eq!(Settings::value(&[&layer], "offset"), None);
    }

    #[test]
    fn backdrop_full_screen_follows_modal_flag() {
        let step = Settings {
            is_modal: Some(true),
            backdrop: Some(BackdropOptions {
                class_prefix: Some("my-backdrop".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let r = Settings::resolve(&[&step]);
        assert!(r.backdrop.full_screen, "modal steps dim the whole page");
        assert_eq!(r.backdrop.class_prefix.as_deref(), Some("my-backdrop"));
    }

    #[test]
    fn free_form_values_resolve_step_first() {
        let mut step = Settings::default();
        step.extra.insert("theme".into(), json!("light"));
        let mut tour = Settings::default();
        tour.extra.insert("theme".into(), json!("dark"));
        tour.extra.insert("width".into(), json!(320));
        assert_eq!(Settings::value(&[&step, &tour], "theme"), Some(json!("light")));
        assert_eq!(Settings::value(&[&step, &tour], "width"), Some(json!(320)));
        assert_eq!(Settings::value(&[&step, &tour], "missing"), None);
    }

    #[test]
    fn layered_over_is_a_shallow_merge() {
        let base = Settings {
            placement: Some(Placement::Top),
            offset: Some(1.0),
            ..Default::default()
        };
        let over = Settings {
            offset: Some(2.0),
            ..Default::default()
        };
        let merged = over.layered_over(&base);
        assert_eq!(merged.placement, Some(Placement::Top));
        assert_eq!(merged.offset, Some(2.0));
    }

    #[test]
    fn options_parse_from_json() {
        let options = TourOptions::from_json(
            r#"{
                "name": "intro",
                "has_backdrop": true,
                "scroll_margins": { "top": 64 },
                "backdrop": { "class_prefix": "dim", "opacity": 0.5 }
            }"#,
        )
        .unwrap();
        assert_eq!(options.name, "intro");
        assert_eq!(options.settings.has_backdrop, Some(true));
        let margins = options.settings.scroll_margins.unwrap();
        assert_eq!((margins.top, margins.bottom), (64.0, 0.0));
        let backdrop = options.settings.backdrop.unwrap();
        assert_eq!(backdrop.class_prefix.as_deref(), Some("dim"));
        assert_eq!(backdrop.extra["opacity"], json!(0.5));
    }

    #[test]
    fn malformed_options_are_rejected() {
        let err = TourOptions::from_json(r#"{ "placement": "sideways" }"#).unwrap_err();
        assert!(matches!(err, TourError::Options(_)), "unknown placement fails");
    }
}
