#![forbid(unsafe_code)]

//! Browser host for tutorview.
//!
//! The `wasm32` build exports [`mountTutorials`](wasm::mount_tutorials) and
//! [`applyPageEnhancements`](wasm::apply_page_enhancements), which bind
//! `tutorview-core` to the DOM, `localStorage`, `IntersectionObserver` and
//! `requestAnimationFrame`.
//!
//! Everything that does not need a browser (option parsing, the
//! cross-instance event payload, selectors) lives here so it can be tested
//! natively.

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{
    AnimationFrameLoop, LocalStoragePreferences, PageEnhancements, TutorialHost, WebDocument,
    WebViewportObserver, WindowModeChannel, apply_page_enhancements, mount_tutorials,
};

use serde_json::{Value, json};
use tutorview_core::{BlockId, ConfigError, ModeChange, TutorialConfig, ViewMode};

/// `CustomEvent` type used to share mode changes across every instance on
/// the page.
pub const MODE_CHANGE_EVENT: &str = "tutorview:mode-change";

/// Tab menu items and tab panels that take part in tab synchronization.
pub const TAB_NODES_SELECTOR: &str = ".sphinx-menu.menu .item, .sphinx-tab.tab";

/// Clickable tab menu items.
pub const TAB_MENU_ITEM_SELECTOR: &str = ".sphinx-menu.menu .item";

/// Class-reference links in the sidebar that get line-break suggestions.
pub const CLASS_REFERENCE_LINK_SELECTOR: &str =
    ".wy-menu-vertical > ul:last-of-type .reference.internal";

/// `<pre>` blocks of highlighted code in the article body.
pub const CODE_BLOCK_SELECTOR: &str = ".rst-content div[class^=\"highlight\"] pre";

/// Parse the optional JSON options string handed to `mountTutorials`.
///
/// `None`, an empty string, or whitespace yields the default configuration.
pub fn parse_config(options: Option<&str>) -> Result<TutorialConfig, ConfigError> {
    match options.map(str::trim) {
        None | Some("") => Ok(TutorialConfig::default()),
        Some(json) => TutorialConfig::from_json_str(json),
    }
}

/// Serialize a mode change as the event payload.
#[must_use]
pub fn encode_mode_change(change: &ModeChange) -> String {
    json!({
        "mode": change.mode.as_str(),
        "source": change.source.0,
    })
    .to_string()
}

/// Parse an event payload. Anything malformed yields `None`.
#[must_use]
pub fn decode_mode_change(payload: &str) -> Option<ModeChange> {
    let value: Value = serde_json::from_str(payload).ok()?;
    let mode: ViewMode = value.get("mode")?.as_str()?.parse().ok()?;
    let source = u32::try_from(value.get("source")?.as_u64()?).ok()?;
    Some(ModeChange {
        mode,
        source: BlockId(source),
    })
}
