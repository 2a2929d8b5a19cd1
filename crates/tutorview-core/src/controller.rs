#![forbid(unsafe_code)]

//! Lifecycle of one tutorial block.
//!
//! A [`TutorialController`] parses the block once at mount, then rebuilds
//! its body whenever the view mode changes. In dynamic mode it owns the
//! intersection bookkeeping that decides which compound step is active.
//!
//! # Invariants
//!
//! 1. The step list never changes after mount.
//! 2. Every rebuild disconnects the observer and clears the selector before
//!    the new layout exists; only dynamic builds observe again.
//! 3. At most one left block and one display item carry the active class,
//!    and they belong to the same step.
//! 4. A content block is auto-scrolled at most once per controller.

use std::rc::Rc;

use crate::active_step::{ActiveChange, ActiveStepSelector};
use crate::channel::BlockId;
use crate::config::{TutorialClasses, TutorialConfig};
use crate::error::Result;
use crate::layout::{DynamicLayout, StaticLayout, build_dynamic, build_static};
use crate::markup::{Document, Viewport};
use crate::observer::ViewportObserver;
use crate::step::{Step, parse_steps};
use crate::view_mode::ViewMode;

/// Layout currently rendered in a block body.
#[derive(Debug, Clone, PartialEq)]
pub enum Layout<N> {
    Static(StaticLayout<N>),
    Dynamic(DynamicLayout<N>),
}

impl<N> Layout<N> {
    #[must_use]
    pub fn mode(&self) -> ViewMode {
        match self {
            Self::Static(_) => ViewMode::Static,
            Self::Dynamic(_) => ViewMode::Dynamic,
        }
    }
}

/// Outcome of centering the highlighted region of one content block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutoScroll {
    Centered {
        scroll_top: f64,
    },
    /// The host already restored a nonzero scroll position.
    Restored,
    NoViewport,
    NoHighlight,
}

/// Scroll the code viewport inside `content` so the highlighted lines sit
/// in its vertical middle.
///
/// When `content` holds a tab group, only the active tab is searched.
pub fn center_highlight<D: Document>(
    doc: &mut D,
    content: &D::Node,
    classes: &TutorialClasses,
) -> AutoScroll {
    let scope = doc
        .find_descendant(content, &classes.tab_group)
        .and_then(|group| {
            doc.find_descendants(&group, &classes.tab_panel)
                .into_iter()
                .find(|panel| doc.has_class(panel, &classes.active))
        })
        .unwrap_or_else(|| content.clone());

    let viewport = if doc.has_class(&scope, &classes.code_viewport) {
        Some(scope)
    } else {
        doc.find_descendant(&scope, &classes.code_viewport)
    };
    let Some(viewport) = viewport else {
        return AutoScroll::NoViewport;
    };

    // Browsers restore scroll offsets on reload; a nonzero value means the
    // visitor already has a position we must not override.
    if doc.scroll_top(&viewport) != 0.0 {
        return AutoScroll::Restored;
    }

    let Some(region) = doc
        .find_descendants(&viewport, &classes.highlighted)
        .iter()
        .map(|line| doc.bounding_rect(line))
        .reduce(|acc, rect| acc.union(&rect))
    else {
        return AutoScroll::NoHighlight;
    };

    let frame = doc.bounding_rect(&viewport);
    let mid = region.mid_y() - frame.top;
    let scroll_top = (mid - doc.client_height(&viewport) / 2.0).max(0.0);
    doc.set_scroll_top(&viewport, scroll_top);
    AutoScroll::Centered { scroll_top }
}

pub struct TutorialController<D: Document, O: ViewportObserver<D::Node>> {
    id: BlockId,
    config: Rc<TutorialConfig>,
    root: D::Node,
    toggle: D::Node,
    toggle_input: D::Node,
    body: D::Node,
    steps: Vec<Step<D::Node>>,
    mode: ViewMode,
    layout: Layout<D::Node>,
    observer: O,
    selector: ActiveStepSelector<D::Node>,
    auto_scrolled: Vec<bool>,
    pending_scrolls: Vec<usize>,
}

impl<D: Document, O: ViewportObserver<D::Node>> core::fmt::Debug for TutorialController<D, O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TutorialController")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("steps", &self.steps.len())
            .field("active", &self.selector.active())
            .finish_non_exhaustive()
    }
}

impl<D: Document, O: ViewportObserver<D::Node>> TutorialController<D, O> {
    /// Parse `root`, add the view-mode switch and build the `mode` layout.
    ///
    /// Fails with [`crate::TutorialError::MalformedTemplate`] if an
    /// admonition lacks its title or content; `root` is left untouched.
    pub fn mount(
        id: BlockId,
        doc: &mut D,
        root: D::Node,
        observer: O,
        config: Rc<TutorialConfig>,
        mode: ViewMode,
    ) -> Result<Self> {
        let classes = &config.classes;
        let steps = parse_steps(doc, &root, classes, id)?;

        let toggle = doc.create_element("label");
        doc.add_class(&toggle, &classes.toggle);
        let toggle_input = doc.create_element("input");
        doc.set_attribute(&toggle_input, "type", "checkbox");
        doc.append_child(&toggle, &toggle_input);
        let caption = doc.create_element("span");
        doc.set_text(&caption, &config.toggle_label);
        doc.append_child(&toggle, &caption);
        doc.append_child(&root, &toggle);

        let body = doc.create_element("div");
        doc.add_class(&body, &classes.body);
        doc.append_child(&root, &body);

        let step_count = steps.len();
        let mut controller = Self {
            id,
            root,
            toggle,
            toggle_input,
            body,
            steps,
            mode,
            layout: Layout::Static(StaticLayout { blocks: Vec::new() }),
            observer,
            selector: ActiveStepSelector::new(),
            auto_scrolled: vec![false; step_count],
            pending_scrolls: Vec::new(),
            config,
        };
        controller.rebuild(doc);

        tracing::debug!(
            target: "tutorview.controller",
            block = %id,
            steps = step_count,
            mode = %mode,
            "mounted tutorial block"
        );
        Ok(controller)
    }

    #[must_use]
    pub fn id(&self) -> BlockId {
        self.id
    }

    #[must_use]
    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    #[must_use]
    pub fn steps(&self) -> &[Step<D::Node>] {
        &self.steps
    }

    #[must_use]
    pub fn layout(&self) -> &Layout<D::Node> {
        &self.layout
    }

    #[must_use]
    pub fn active_step(&self) -> Option<usize> {
        self.selector.active()
    }

    /// Step indices with a live intersection entry.
    #[must_use]
    pub fn intersecting_steps(&self) -> Vec<usize> {
        self.selector.intersecting().collect()
    }

    #[must_use]
    pub fn root(&self) -> &D::Node {
        &self.root
    }

    #[must_use]
    pub fn body(&self) -> &D::Node {
        &self.body
    }

    /// The `<label>` wrapping the switch.
    #[must_use]
    pub fn toggle(&self) -> &D::Node {
        &self.toggle
    }

    /// The checkbox bound to the view mode.
    #[must_use]
    pub fn toggle_input(&self) -> &D::Node {
        &self.toggle_input
    }

    /// Switch to `mode`, rebuilding the body. Returns `false` when the
    /// block already shows `mode`.
    pub fn set_mode(&mut self, doc: &mut D, mode: ViewMode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.rebuild(doc);
        true
    }

    /// Apply a user flip of the switch and bring the switch back into view.
    ///
    /// The checkbox is re-synced even when `mode` is already shown, since
    /// the flip may have been refused.
    pub fn toggle_to(&mut self, doc: &mut D, mode: ViewMode) -> bool {
        let changed = self.set_mode(doc, mode);
        doc.set_checked(&self.toggle_input, self.mode.is_dynamic());
        doc.scroll_into_view_centered(&self.toggle);
        changed
    }

    /// Disable the switch on viewports too narrow for the dynamic layout.
    pub fn set_toggle_enabled(&mut self, doc: &mut D, enabled: bool) {
        if enabled {
            doc.remove_attribute(&self.toggle_input, "disabled");
        } else {
            doc.set_attribute(&self.toggle_input, "disabled", "");
        }
    }

    /// Tear the current layout down and build the one for the current mode.
    pub fn rebuild(&mut self, doc: &mut D) {
        self.observer.disconnect();
        self.selector.clear();
        self.pending_scrolls.clear();

        doc.set_checked(&self.toggle_input, self.mode.is_dynamic());
        let classes = &self.config.classes;

        self.layout = match self.mode {
            ViewMode::Static => Layout::Static(build_static(doc, &self.body, &self.steps, classes)),
            ViewMode::Dynamic => {
                let layout = build_dynamic(doc, &self.body, &self.steps, classes);
                for (_, block) in &layout.observed {
                    self.observer.observe(block);
                }
                self.pending_scrolls = layout.observed.iter().map(|(index, _)| *index).collect();
                Layout::Dynamic(layout)
            }
        };

        tracing::debug!(
            target: "tutorview.controller",
            block = %self.id,
            mode = %self.mode,
            "rebuilt tutorial layout"
        );
    }

    /// Fold queued intersection records into the selector.
    pub fn take_intersections(&mut self) {
        let records = self.observer.take_records();
        let Layout::Dynamic(layout) = &self.layout else {
            return;
        };
        for record in records {
            if let Some(index) = layout.step_of(&record.target) {
                self.selector
                    .record(index, record.target, record.is_intersecting);
            }
        }
    }

    /// Per-frame active-step recomputation. No-op in static mode.
    pub fn tick(&mut self, doc: &mut D, viewport: Viewport) -> Option<ActiveChange> {
        if !self.mode.is_dynamic() {
            return None;
        }
        self.take_intersections();
        let change = self.selector.evaluate(
            |node| doc.bounding_rect(node),
            viewport.height,
            self.config.anchor_fraction,
        )?;
        self.apply_active_change(doc, change);
        Some(change)
    }

    fn apply_active_change(&self, doc: &mut D, change: ActiveChange) {
        let Layout::Dynamic(layout) = &self.layout else {
            return;
        };
        let active = &self.config.classes.active;
        if let Some(previous) = change.previous {
            for node in layout.step_nodes(previous) {
                doc.remove_class(node, active);
            }
        }
        for node in layout.step_nodes(change.next) {
            doc.add_class(node, active);
        }
        tracing::trace!(
            target: "tutorview.controller",
            block = %self.id,
            previous = ?change.previous,
            next = change.next,
            "active step changed"
        );
    }

    /// Run the auto-scrolls queued by the last dynamic build.
    pub fn run_deferred_scrolls(&mut self, doc: &mut D) {
        for index in std::mem::take(&mut self.pending_scrolls) {
            if self.auto_scrolled[index] {
                continue;
            }
            let Some(content) = self.steps[index].content() else {
                continue;
            };
            let outcome = center_highlight(doc, content, &self.config.classes);
            if matches!(outcome, AutoScroll::Centered { .. }) {
                self.auto_scrolled[index] = true;
            }
            tracing::trace!(
                target: "tutorview.controller",
                block = %self.id,
                step = index,
                outcome = ?outcome,
                "content auto-scroll"
            );
        }
    }

    /// Whether auto-scrolls are queued for the next frame.
    #[must_use]
    pub fn has_pending_scrolls(&self) -> bool {
        !self.pending_scrolls.is_empty()
    }

    /// Release the observer and intersection state.
    pub fn teardown(&mut self) {
        self.observer.disconnect();
        self.selector.clear();
        self.pending_scrolls.clear();
    }
}

impl<D: Document, O: ViewportObserver<D::Node>> Drop for TutorialController<D, O> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::Rect;
    use crate::memory::{MemoryDocument, MemoryNode};
    use crate::observer::{ManualObserver, ManualObserverHandle};

    type Controller = TutorialController<MemoryDocument, ManualObserver<MemoryNode>>;

    fn block(doc: &mut MemoryDocument) -> MemoryNode {
        let root = doc.element("div", &["tutorial"]);
        doc.child(root, "p", &[]);
        for _ in 0..2 {
            let adm = doc.child(root, "div", &["admonition"]);
            doc.child(adm, "p", &["admonition-title"]);
            let content = doc.child(adm, "div", &["tutorial-content"]);
            let code = doc.child(content, "div", &["highlight"]);
            doc.set_client_height(code, 100.0);
            doc.set_rect(code, Rect::new(1000.0, 0.0, 400.0, 100.0));
            let line = doc.child(code, "span", &["hll"]);
            doc.set_rect(line, Rect::new(1290.0, 0.0, 400.0, 20.0));
        }
        root
    }

    fn mount(
        doc: &mut MemoryDocument,
        mode: ViewMode,
    ) -> (Controller, ManualObserverHandle<MemoryNode>) {
        let root = block(doc);
        let (observer, handle) = ManualObserver::new();
        let controller = Controller::mount(
            BlockId(0),
            doc,
            root,
            observer,
            Rc::new(TutorialConfig::default()),
            mode,
        )
        .expect("valid block");
        (controller, handle)
    }

    #[test]
    fn mount_adds_toggle_and_body() {
        let mut doc = MemoryDocument::new();
        let (controller, _) = mount(&mut doc, ViewMode::Static);

        let children = doc.children(controller.root());
        assert_eq!(children, vec![*controller.toggle(), *controller.body()]);
        assert_eq!(
            doc.attribute(controller.toggle_input(), "type").as_deref(),
            Some("checkbox")
        );
        assert!(!doc.is_checked(*controller.toggle_input()));
        assert_eq!(doc.tag(*controller.toggle()), "label");
        assert_eq!(doc.tag(*controller.toggle_input()), "input");
        assert_eq!(doc.tag(*controller.body()), "div");
    }

    #[test]
    fn dynamic_mount_observes_compound_blocks_only() {
        let mut doc = MemoryDocument::new();
        let (controller, handle) = mount(&mut doc, ViewMode::Dynamic);

        let Layout::Dynamic(layout) = controller.layout() else {
            panic!("expected dynamic layout");
        };
        assert_eq!(handle.observed(), vec![layout.blocks[1], layout.blocks[2]]);
        assert!(doc.is_checked(*controller.toggle_input()));
        assert!(controller.has_pending_scrolls());
    }

    #[test]
    fn set_mode_to_current_mode_is_noop() {
        let mut doc = MemoryDocument::new();
        let (mut controller, handle) = mount(&mut doc, ViewMode::Dynamic);
        let disconnects = handle.disconnects();

        assert!(!controller.set_mode(&mut doc, ViewMode::Dynamic));
        assert_eq!(handle.disconnects(), disconnects);
    }

    #[test]
    fn rebuild_clears_intersection_state() {
        let mut doc = MemoryDocument::new();
        let (mut controller, handle) = mount(&mut doc, ViewMode::Dynamic);
        let Layout::Dynamic(layout) = controller.layout().clone() else {
            panic!("expected dynamic layout");
        };
        doc.set_rect(layout.blocks[1], Rect::new(150.0, 0.0, 300.0, 100.0));
        handle.push(layout.blocks[1], true, Rect::default());
        controller.tick(&mut doc, Viewport::new(1280.0, 800.0));
        assert_eq!(controller.active_step(), Some(1));

        assert!(controller.set_mode(&mut doc, ViewMode::Static));
        assert_eq!(controller.active_step(), None);
        assert!(controller.intersecting_steps().is_empty());
        assert!(handle.observed().is_empty());

        assert!(controller.set_mode(&mut doc, ViewMode::Dynamic));
        assert_eq!(controller.active_step(), None);
        assert!(controller.intersecting_steps().is_empty());
    }

    #[test]
    fn active_classes_follow_the_selected_step() {
        let mut doc = MemoryDocument::new();
        let (mut controller, handle) = mount(&mut doc, ViewMode::Dynamic);
        let Layout::Dynamic(layout) = controller.layout().clone() else {
            panic!("expected dynamic layout");
        };
        let viewport = Viewport::new(1280.0, 800.0);

        doc.set_rect(layout.blocks[1], Rect::new(150.0, 0.0, 300.0, 100.0));
        doc.set_rect(layout.blocks[2], Rect::new(600.0, 0.0, 300.0, 100.0));
        handle.push(layout.blocks[1], true, Rect::default());
        handle.push(layout.blocks[2], true, Rect::default());
        controller.tick(&mut doc, viewport);

        assert!(doc.has_class(&layout.blocks[1], "active"));
        assert!(doc.has_class(&layout.display_items[0].1, "active"));

        doc.set_rect(layout.blocks[1], Rect::new(-200.0, 0.0, 300.0, 100.0));
        doc.set_rect(layout.blocks[2], Rect::new(170.0, 0.0, 300.0, 100.0));
        let change = controller.tick(&mut doc, viewport);

        assert_eq!(
            change,
            Some(ActiveChange {
                previous: Some(1),
                next: 2
            })
        );
        assert!(!doc.has_class(&layout.blocks[1], "active"));
        assert!(!doc.has_class(&layout.display_items[0].1, "active"));
        assert!(doc.has_class(&layout.blocks[2], "active"));
        assert!(doc.has_class(&layout.display_items[1].1, "active"));
    }

    #[test]
    fn static_mode_ignores_ticks() {
        let mut doc = MemoryDocument::new();
        let (mut controller, _) = mount(&mut doc, ViewMode::Static);
        assert_eq!(
            controller.tick(&mut doc, Viewport::new(1280.0, 800.0)),
            None
        );
    }

    #[test]
    fn deferred_scroll_centers_highlight_once() {
        let mut doc = MemoryDocument::new();
        let (mut controller, _) = mount(&mut doc, ViewMode::Dynamic);
        let content = *controller.steps()[1].content().unwrap();
        let code = doc.find_descendant(&content, "highlight").unwrap();

        controller.run_deferred_scrolls(&mut doc);
        // Highlight midpoint is 300px into the viewport; half the viewport is 50px.
        assert_eq!(doc.scroll_top(&code), 250.0);

        doc.set_scroll_top(&code, 0.0);
        controller.set_mode(&mut doc, ViewMode::Static);
        controller.set_mode(&mut doc, ViewMode::Dynamic);
        controller.run_deferred_scrolls(&mut doc);
        assert_eq!(doc.scroll_top(&code), 0.0);
    }

    #[test]
    fn toggle_scrolls_switch_into_view() {
        let mut doc = MemoryDocument::new();
        let (mut controller, _) = mount(&mut doc, ViewMode::Static);

        assert!(controller.toggle_to(&mut doc, ViewMode::Dynamic));
        assert_eq!(controller.mode(), ViewMode::Dynamic);
        assert_eq!(doc.centered_nodes(), [*controller.toggle()]);
    }

    #[test]
    fn center_highlight_respects_restored_scroll() {
        let mut doc = MemoryDocument::new();
        let content = doc.element("div", &["tutorial-content"]);
        let code = doc.child(content, "div", &["highlight"]);
        doc.child(code, "span", &["hll"]);
        doc.set_scroll_top(&code, 42.0);

        let outcome = center_highlight(&mut doc, &content, &TutorialClasses::default());
        assert_eq!(outcome, AutoScroll::Restored);
        assert_eq!(doc.scroll_top(&code), 42.0);
    }

    #[test]
    fn center_highlight_short_circuits_without_markup() {
        let mut doc = MemoryDocument::new();
        let classes = TutorialClasses::default();
        let image = doc.element("div", &["tutorial-content"]);
        doc.child(image, "img", &[]);
        assert_eq!(
            center_highlight(&mut doc, &image, &classes),
            AutoScroll::NoViewport
        );

        let plain = doc.element("div", &["tutorial-content"]);
        doc.child(plain, "div", &["highlight"]);
        assert_eq!(
            center_highlight(&mut doc, &plain, &classes),
            AutoScroll::NoHighlight
        );
    }

    #[test]
    fn center_highlight_uses_active_tab() {
        let mut doc = MemoryDocument::new();
        let classes = TutorialClasses::default();
        let content = doc.element("div", &["tutorial-content"]);
        let group = doc.child(content, "div", &["sphinx-tabs"]);
        let hidden = doc.child(group, "div", &["sphinx-tab"]);
        let hidden_code = doc.child(hidden, "div", &["highlight"]);
        doc.child(hidden_code, "span", &["hll"]);
        let shown = doc.child(group, "div", &["sphinx-tab", "active"]);
        let shown_code = doc.child(shown, "div", &["highlight"]);
        doc.set_client_height(shown_code, 40.0);
        let line = doc.child(shown_code, "span", &["hll"]);
        doc.set_rect(line, Rect::new(100.0, 0.0, 10.0, 10.0));

        let outcome = center_highlight(&mut doc, &content, &classes);

        assert_eq!(outcome, AutoScroll::Centered { scroll_top: 85.0 });
        assert_eq!(doc.scroll_top(&hidden_code), 0.0);
    }
}
