#![forbid(unsafe_code)]

//! Synchronized tab groups.
//!
//! Every tab menu item and panel carries a `data-tab` key. Selecting a key
//! activates it in every group on the page that offers it; groups without
//! that key keep whatever they had.
//!
//! # Invariants
//!
//! 1. A node is only deactivated when its own group offers the selected key.
//! 2. After [`select_tab`], the clicked item sits at the same viewport
//!    offset it had before the switch.

use crate::markup::Document;

/// Attribute carrying a tab's key.
pub const TAB_KEY_ATTR: &str = "data-tab";

/// Class prefix the page generator uses to encode tab keys.
pub const TAB_KEY_CLASS_PREFIX: &str = "sphinx-data-";

/// Copy class-encoded keys (`sphinx-data-<key>`) into [`TAB_KEY_ATTR`].
///
/// When a node carries several prefixed classes the last one wins.
/// Returns how many nodes were tagged.
pub fn normalize_tab_keys<D: Document>(doc: &mut D, nodes: &[D::Node]) -> usize {
    let mut tagged = 0;
    for node in nodes {
        let key = doc
            .class_list(node)
            .into_iter()
            .filter_map(|class| class.strip_prefix(TAB_KEY_CLASS_PREFIX).map(str::to_owned))
            .last();
        if let Some(key) = key {
            doc.set_attribute(node, TAB_KEY_ATTR, &key);
            tagged += 1;
        }
    }
    tagged
}

/// Whether `node` has `ancestor` somewhere above it.
fn is_within<D: Document>(doc: &D, node: &D::Node, ancestor: &D::Node) -> bool {
    let mut current = doc.parent(node);
    while let Some(parent) = current {
        if &parent == ancestor {
            return true;
        }
        current = doc.parent(&parent);
    }
    false
}

/// Activate `key` across `nodes`. Returns the number of nodes now active
/// for that key.
pub fn activate_tab<D: Document>(
    doc: &mut D,
    nodes: &[D::Node],
    key: &str,
    active_class: &str,
) -> usize {
    let keyed: Vec<&D::Node> = nodes
        .iter()
        .filter(|n| doc.attribute(n, TAB_KEY_ATTR).as_deref() == Some(key))
        .collect();

    let mut activated = 0;
    for node in nodes {
        if keyed.contains(&node) {
            doc.add_class(node, active_class);
            activated += 1;
            continue;
        }
        let group_offers_key = doc
            .parent(node)
            .is_some_and(|group| keyed.iter().any(|k| is_within(doc, k, &group)));
        if group_offers_key {
            doc.remove_class(node, active_class);
        }
    }

    tracing::debug!(
        target: "tutorview.tabs",
        key,
        activated,
        "tab activated"
    );
    activated
}

/// Handle a click on a tab menu item.
///
/// Activates the item's key everywhere and scrolls the window so the item
/// keeps its on-screen position. Returns the scroll delta, or `None` when
/// the item has no key.
pub fn select_tab<D: Document>(
    doc: &mut D,
    clicked: &D::Node,
    nodes: &[D::Node],
    active_class: &str,
) -> Option<f64> {
    let key = doc.attribute(clicked, TAB_KEY_ATTR)?;
    let before = doc.bounding_rect(clicked).top;
    activate_tab(doc, nodes, &key, active_class);
    let delta = doc.bounding_rect(clicked).top - before;
    if delta != 0.0 {
        doc.scroll_window_by(delta);
    }
    Some(delta)
}
