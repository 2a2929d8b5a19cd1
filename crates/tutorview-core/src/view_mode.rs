#![forbid(unsafe_code)]

//! View-mode enumeration and the load/resize resolver.

use core::fmt;
use core::str::FromStr;

/// How a tutorial block lays out its steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewMode {
    /// Each step's description and content inline, one after another.
    Static,
    /// Step descriptions scroll on the left; the active step's content is
    /// pinned on the right.
    Dynamic,
}

impl ViewMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Static => "Static",
            Self::Dynamic => "Dynamic",
        }
    }

    /// Mode bound to the toggle's checked state.
    #[must_use]
    pub const fn from_checked(checked: bool) -> Self {
        if checked { Self::Dynamic } else { Self::Static }
    }

    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        matches!(self, Self::Dynamic)
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown view-mode string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseViewModeError(pub String);

impl fmt::Display for ParseViewModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown view mode: {:?}", self.0)
    }
}

impl std::error::Error for ParseViewModeError {}

impl FromStr for ViewMode {
    type Err = ParseViewModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Static" => Ok(Self::Static),
            "Dynamic" => Ok(Self::Dynamic),
            other => Err(ParseViewModeError(other.to_owned())),
        }
    }
}

/// Effective view mode for a stored preference and viewport width.
///
/// A stored `Static` always wins. Otherwise viewports narrower than
/// `breakpoint_px` fall back to `Static`, and everything else is `Dynamic`.
#[must_use]
pub fn resolve_view_mode(
    stored: Option<ViewMode>,
    viewport_width: f64,
    breakpoint_px: f64,
) -> ViewMode {
    if stored == Some(ViewMode::Static) {
        return ViewMode::Static;
    }
    if viewport_width < breakpoint_px {
        return ViewMode::Static;
    }
    ViewMode::Dynamic
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_display() {
        for mode in [ViewMode::Static, ViewMode::Dynamic] {
            assert_eq!(mode.to_string().parse::<ViewMode>(), Ok(mode));
        }
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!("static".parse::<ViewMode>().is_err());
        assert!("".parse::<ViewMode>().is_err());
    }

    #[test]
    fn stored_static_wins_on_wide_viewports() {
        assert_eq!(
            resolve_view_mode(Some(ViewMode::Static), 4000.0, 1036.0),
            ViewMode::Static
        );
    }

    #[test]
    fn narrow_viewport_overrides_dynamic_preference() {
        assert_eq!(
            resolve_view_mode(Some(ViewMode::Dynamic), 1035.9, 1036.0),
            ViewMode::Static
        );
        assert_eq!(resolve_view_mode(None, 800.0, 1036.0), ViewMode::Static);
    }

    #[test]
    fn breakpoint_is_inclusive_for_dynamic() {
        assert_eq!(resolve_view_mode(None, 1036.0, 1036.0), ViewMode::Dynamic);
        assert_eq!(
            resolve_view_mode(Some(ViewMode::Dynamic), 1200.0, 1036.0),
            ViewMode::Dynamic
        );
    }

    #[test]
    fn checked_maps_to_dynamic() {
        assert_eq!(ViewMode::from_checked(true), ViewMode::Dynamic);
        assert_eq!(ViewMode::from_checked(false), ViewMode::Static);
    }
}
