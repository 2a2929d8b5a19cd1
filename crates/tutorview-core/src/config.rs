#![forbid(unsafe_code)]

//! Tunable values for tutorial blocks.
//!
//! Every field defaults to the values the documentation theme ships with,
//! so `TutorialConfig::default()` needs no configuration file. With the
//! `config` feature the whole table can be loaded from TOML or JSON:
//!
//! ```toml
//! breakpoint_px = 1036.0
//! anchor_fraction = 0.25
//! preference_key = "tutorview.mode"
//!
//! [classes]
//! content = "tutorial-content"
//! ```

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Viewport width below which the dynamic layout is never used.
pub const DEFAULT_BREAKPOINT_PX: f64 = 1036.0;

/// Reading anchor as a fraction of viewport height.
pub const DEFAULT_ANCHOR_FRACTION: f64 = 0.25;

pub const DEFAULT_PREFERENCE_KEY: &str = "tutorview.mode";

/// Configuration shared by every tutorial block on a page.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct TutorialConfig {
    /// Minimum viewport width (logical px) for the dynamic layout.
    pub breakpoint_px: f64,
    /// Active-step anchor, measured from the viewport top.
    pub anchor_fraction: f64,
    /// Key under which the view mode is persisted.
    pub preference_key: String,
    /// Text shown next to the view-mode switch.
    pub toggle_label: String,
    pub classes: TutorialClasses,
}

impl Default for TutorialConfig {
    fn default() -> Self {
        Self {
            breakpoint_px: DEFAULT_BREAKPOINT_PX,
            anchor_fraction: DEFAULT_ANCHOR_FRACTION,
            preference_key: DEFAULT_PREFERENCE_KEY.to_owned(),
            toggle_label: "Dynamic view".to_owned(),
            classes: TutorialClasses::default(),
        }
    }
}

/// Class names of the markup convention, both consumed and emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct TutorialClasses {
    /// Tutorial block container.
    pub root: String,
    /// Child that becomes a compound step.
    pub admonition: String,
    pub title: String,
    pub content: String,
    pub toggle: String,
    pub body: String,
    pub step: String,
    pub comment_step: String,
    pub compound_step: String,
    pub dynamic: String,
    pub steps_column: String,
    pub display_column: String,
    pub display_item: String,
    pub active: String,
    /// Scrollable code viewport inside a content block.
    pub code_viewport: String,
    /// Highlighted line inside a code viewport.
    pub highlighted: String,
    pub tab_group: String,
    pub tab_panel: String,
}

impl Default for TutorialClasses {
    fn default() -> Self {
        Self {
            root: "tutorial".to_owned(),
            admonition: "admonition".to_owned(),
            title: "admonition-title".to_owned(),
            content: "tutorial-content".to_owned(),
            toggle: "tutorial-toggle".to_owned(),
            body: "tutorial-body".to_owned(),
            step: "tutorial-step".to_owned(),
            comment_step: "tutorial-step-comment".to_owned(),
            compound_step: "tutorial-step-compound".to_owned(),
            dynamic: "tutorial-dynamic".to_owned(),
            steps_column: "tutorial-steps".to_owned(),
            display_column: "tutorial-display".to_owned(),
            display_item: "tutorial-display-item".to_owned(),
            active: "active".to_owned(),
            code_viewport: "highlight".to_owned(),
            highlighted: "hll".to_owned(),
            tab_group: "sphinx-tabs".to_owned(),
            tab_panel: "sphinx-tab".to_owned(),
        }
    }
}

impl TutorialClasses {
    fn entries(&self) -> [(&'static str, &str); 18] {
        [
            ("root", self.root.as_str()),
            ("admonition", self.admonition.as_str()),
            ("title", self.title.as_str()),
            ("content", self.content.as_str()),
            ("toggle", self.toggle.as_str()),
            ("body", self.body.as_str()),
            ("step", self.step.as_str()),
            ("comment_step", self.comment_step.as_str()),
            ("compound_step", self.compound_step.as_str()),
            ("dynamic", self.dynamic.as_str()),
            ("steps_column", self.steps_column.as_str()),
            ("display_column", self.display_column.as_str()),
            ("display_item", self.display_item.as_str()),
            ("active", self.active.as_str()),
            ("code_viewport", self.code_viewport.as_str()),
            ("highlighted", self.highlighted.as_str()),
            ("tab_group", self.tab_group.as_str()),
            ("tab_panel", self.tab_panel.as_str()),
        ]
    }
}

impl TutorialConfig {
    /// Load from a TOML string. The result is validated.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    /// Load from a JSON string. The result is validated.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validated()
    }

    /// Check every parameter. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.breakpoint_px.is_finite() || self.breakpoint_px <= 0.0 {
            errors.push(format!(
                "breakpoint_px must be a positive number, got {}",
                self.breakpoint_px
            ));
        }

        if !(0.0..=1.0).contains(&self.anchor_fraction) {
            errors.push(format!(
                "anchor_fraction must be in [0, 1], got {}",
                self.anchor_fraction
            ));
        }

        if self.preference_key.is_empty() {
            errors.push("preference_key must not be empty".into());
        }

        for (name, value) in self.classes.entries() {
            if value.trim().is_empty() {
                errors.push(format!("classes.{name} must not be empty"));
            }
        }

        errors
    }

    /// Return `self` if valid, otherwise the collected validation errors.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}
