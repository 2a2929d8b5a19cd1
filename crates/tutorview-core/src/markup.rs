#![forbid(unsafe_code)]

//! Element-tree abstraction the tutorial logic runs against.
//!
//! The browser DOM is only one implementation of [`Document`]. Native tests
//! and headless harnesses use [`crate::memory::MemoryDocument`], which keeps
//! the same ownership rules: an element has at most one parent, and
//! appending it somewhere else moves it.

use core::fmt::Debug;

/// Axis-aligned bounding rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Vertical midpoint.
    #[must_use]
    pub fn mid_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    /// Smallest rectangle covering both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let top = self.top.min(other.top);
        let left = self.left.min(other.left);
        let bottom = self.bottom().max(other.bottom());
        let right = (self.left + self.width).max(other.left + other.width);
        Self::new(top, left, right - left, bottom - top)
    }
}

/// Visible area of the browser window, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Mutable element tree.
///
/// Node handles are cheap to clone and compare by identity. Methods that
/// read layout (`bounding_rect`, `scroll_top`, `client_height`) reflect the
/// host's last layout pass.
pub trait Document {
    type Node: Clone + PartialEq + Debug;

    /// Direct element children, in document order.
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    /// Every class on `node`, in attribute order.
    fn class_list(&self, node: &Self::Node) -> Vec<String>;

    fn add_class(&mut self, node: &Self::Node, class: &str);

    fn remove_class(&mut self, node: &Self::Node, class: &str);

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

    fn remove_attribute(&mut self, node: &Self::Node, name: &str);

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> Self::Node;

    /// Replace the text content of `node`.
    fn set_text(&mut self, node: &Self::Node, text: &str);

    /// Append `child` as the last child of `parent`, detaching it from its
    /// previous parent first.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Remove `node` from its parent. No-op for detached nodes.
    fn detach(&mut self, node: &Self::Node);

    /// Detach every child of `node`.
    fn clear_children(&mut self, node: &Self::Node) {
        for child in self.children(node) {
            self.detach(&child);
        }
    }

    /// All descendants of `node` carrying `class`, in document order.
    fn find_descendants(&self, node: &Self::Node, class: &str) -> Vec<Self::Node>;

    /// First descendant of `node` carrying `class`.
    fn find_descendant(&self, node: &Self::Node, class: &str) -> Option<Self::Node> {
        self.find_descendants(node, class).into_iter().next()
    }

    fn bounding_rect(&self, node: &Self::Node) -> Rect;

    fn scroll_top(&self, node: &Self::Node) -> f64;

    fn set_scroll_top(&mut self, node: &Self::Node, value: f64);

    fn client_height(&self, node: &Self::Node) -> f64;

    /// Set the checked state of a checkbox input.
    fn set_checked(&mut self, node: &Self::Node, checked: bool);

    /// Smooth-scroll the window so that `node` sits in the vertical center.
    fn scroll_into_view_centered(&mut self, node: &Self::Node);

    /// Scroll the window vertically by `dy` pixels.
    fn scroll_window_by(&mut self, dy: f64);
}
