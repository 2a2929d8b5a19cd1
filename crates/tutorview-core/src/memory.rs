#![forbid(unsafe_code)]

//! In-memory [`Document`] for native tests and headless harnesses.
//!
//! Elements live in an arena and are addressed by [`MemoryNode`] indices.
//! Layout values (`rect`, `client_height`) are whatever the caller set;
//! nothing is computed.

use std::collections::BTreeMap;

use crate::markup::{Document, Rect};

/// Handle into a [`MemoryDocument`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemoryNode(usize);

impl MemoryNode {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
struct Element {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    text: String,
    parent: Option<usize>,
    children: Vec<usize>,
    rect: Rect,
    scroll_top: f64,
    client_height: f64,
    checked: bool,
}

/// Layout shift replayed when a class is added, standing in for the
/// reflow a browser would do.
#[derive(Debug, Clone)]
struct Reflow {
    trigger: usize,
    class: String,
    target: usize,
    dy: f64,
}

/// Arena-backed element tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    elements: Vec<Element>,
    window_scroll: f64,
    centered: Vec<MemoryNode>,
    reflows: Vec<Reflow>,
}

impl MemoryDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element with the given classes.
    pub fn element(&mut self, tag: &str, classes: &[&str]) -> MemoryNode {
        self.elements.push(Element {
            tag: tag.to_owned(),
            classes: classes.iter().map(|c| (*c).to_owned()).collect(),
            ..Element::default()
        });
        MemoryNode(self.elements.len() - 1)
    }

    /// Create an element with classes and append it to `parent`.
    pub fn child(&mut self, parent: MemoryNode, tag: &str, classes: &[&str]) -> MemoryNode {
        let node = self.element(tag, classes);
        self.append_child(&parent, &node);
        node
    }

    pub fn set_rect(&mut self, node: MemoryNode, rect: Rect) {
        self.elements[node.0].rect = rect;
    }

    pub fn set_client_height(&mut self, node: MemoryNode, height: f64) {
        self.elements[node.0].client_height = height;
    }

    /// Move `target` down by `dy` each time `trigger` gains `class`.
    pub fn shift_on_class(
        &mut self,
        trigger: MemoryNode,
        class: &str,
        target: MemoryNode,
        dy: f64,
    ) {
        self.reflows.push(Reflow {
            trigger: trigger.0,
            class: class.to_owned(),
            target: target.0,
            dy,
        });
    }

    #[must_use]
    pub fn tag(&self, node: MemoryNode) -> &str {
        &self.elements[node.0].tag
    }

    #[must_use]
    pub fn text(&self, node: MemoryNode) -> &str {
        &self.elements[node.0].text
    }

    #[must_use]
    pub fn classes(&self, node: MemoryNode) -> &[String] {
        &self.elements[node.0].classes
    }

    #[must_use]
    pub fn is_checked(&self, node: MemoryNode) -> bool {
        self.elements[node.0].checked
    }

    /// Total vertical window scroll applied through `scroll_window_by`.
    #[must_use]
    pub fn window_scroll(&self) -> f64 {
        self.window_scroll
    }

    /// Nodes passed to `scroll_into_view_centered`, oldest first.
    #[must_use]
    pub fn centered_nodes(&self) -> &[MemoryNode] {
        &self.centered
    }

    /// Whether `node` sits somewhere below `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, node: MemoryNode, ancestor: MemoryNode) -> bool {
        let mut current = self.elements[node.0].parent;
        while let Some(idx) = current {
            if idx == ancestor.0 {
                return true;
            }
            current = self.elements[idx].parent;
        }
        false
    }

    fn collect_descendants(&self, idx: usize, class: &str, out: &mut Vec<MemoryNode>) {
        for &child in &self.elements[idx].children {
            if self.elements[child].classes.iter().any(|c| c == class) {
                out.push(MemoryNode(child));
            }
            self.collect_descendants(child, class, out);
        }
    }
}

impl Document for MemoryDocument {
    type Node = MemoryNode;

    fn children(&self, node: &MemoryNode) -> Vec<MemoryNode> {
        self.elements[node.0]
            .children
            .iter()
            .map(|&idx| MemoryNode(idx))
            .collect()
    }

    fn parent(&self, node: &MemoryNode) -> Option<MemoryNode> {
        self.elements[node.0].parent.map(MemoryNode)
    }

    fn has_class(&self, node: &MemoryNode, class: &str) -> bool {
        self.elements[node.0].classes.iter().any(|c| c == class)
    }

    fn class_list(&self, node: &MemoryNode) -> Vec<String> {
        self.elements[node.0].classes.clone()
    }

    fn add_class(&mut self, node: &MemoryNode, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        self.elements[node.0].classes.push(class.to_owned());
        for reflow in &self.reflows {
            if reflow.trigger == node.0 && reflow.class == class {
                self.elements[reflow.target].rect.top += reflow.dy;
            }
        }
    }

    fn remove_class(&mut self, node: &MemoryNode, class: &str) {
        self.elements[node.0].classes.retain(|c| c != class);
    }

    fn attribute(&self, node: &MemoryNode, name: &str) -> Option<String> {
        self.elements[node.0].attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, node: &MemoryNode, name: &str, value: &str) {
        self.elements[node.0]
            .attributes
            .insert(name.to_owned(), value.to_owned());
    }

    fn remove_attribute(&mut self, node: &MemoryNode, name: &str) {
        self.elements[node.0].attributes.remove(name);
    }

    fn create_element(&mut self, tag: &str) -> MemoryNode {
        self.element(tag, &[])
    }

    fn set_text(&mut self, node: &MemoryNode, text: &str) {
        text.clone_into(&mut self.elements[node.0].text);
    }

    fn append_child(&mut self, parent: &MemoryNode, child: &MemoryNode) {
        self.detach(child);
        self.elements[parent.0].children.push(child.0);
        self.elements[child.0].parent = Some(parent.0);
    }

    fn detach(&mut self, node: &MemoryNode) {
        if let Some(parent) = self.elements[node.0].parent.take() {
            self.elements[parent].children.retain(|&idx| idx != node.0);
        }
    }

    fn find_descendants(&self, node: &MemoryNode, class: &str) -> Vec<MemoryNode> {
        let mut out = Vec::new();
        self.collect_descendants(node.0, class, &mut out);
        out
    }

    fn bounding_rect(&self, node: &MemoryNode) -> Rect {
        self.elements[node.0].rect
    }

    fn scroll_top(&self, node: &MemoryNode) -> f64 {
        self.elements[node.0].scroll_top
    }

    fn set_scroll_top(&mut self, node: &MemoryNode, value: f64) {
        self.elements[node.0].scroll_top = value;
    }

    fn client_height(&self, node: &MemoryNode) -> f64 {
        self.elements[node.0].client_height
    }

    fn set_checked(&mut self, node: &MemoryNode, checked: bool) {
        self.elements[node.0].checked = checked;
    }

    fn scroll_into_view_centered(&mut self, node: &MemoryNode) {
        self.centered.push(*node);
    }

    fn scroll_window_by(&mut self, dy: f64) {
        self.window_scroll += dy;
    }
}
