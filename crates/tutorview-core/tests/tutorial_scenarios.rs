//! End-to-end tutorial block scenarios driven through [`TutorialPage`].
//!
//! Frames come from a [`ManualClock`], intersection reports from
//! [`ManualObserverHandle`]s, so every run is deterministic.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use tutorview_core::layout::STEP_INDEX_ATTR;
use tutorview_core::{
    BlockId, Document, Layout, LocalModeChannel, ManualClock, ManualObserver, ManualObserverHandle,
    MemoryDocument, MemoryNode, MemoryPreferenceStore, PreferenceStore, Rect, StepKind, TickSource,
    TutorialConfig, TutorialError, TutorialPage, ViewMode, Viewport,
};

type Page = TutorialPage<
    MemoryDocument,
    ManualObserver<MemoryNode>,
    MemoryPreferenceStore,
    LocalModeChannel,
>;

const WIDE: Viewport = Viewport::new(1400.0, 800.0);
const NARROW: Viewport = Viewport::new(720.0, 800.0);

struct Harness {
    page: Rc<RefCell<Page>>,
    clock: ManualClock,
}

impl Harness {
    fn new(store: MemoryPreferenceStore, viewport: Viewport) -> Self {
        let page = Rc::new(RefCell::new(Page::new(
            MemoryDocument::new(),
            store,
            LocalModeChannel::new(),
            TutorialConfig::default(),
            viewport,
        )));
        let mut clock = ManualClock::new();
        let driven = Rc::clone(&page);
        clock.on_tick(Box::new(move |info| driven.borrow_mut().frame(info.viewport)));
        Self { page, clock }
    }

    /// Comment paragraph followed by two compound steps.
    fn mount_tutorial(&self) -> (BlockId, ManualObserverHandle<MemoryNode>) {
        let mut page = self.page.borrow_mut();
        let doc = page.document_mut();
        let root = doc.element("div", &["tutorial"]);
        let intro = doc.child(root, "p", &[]);
        doc.set_text(&intro, "Before you start");
        for title in ["Step 1", "Step 2"] {
            let adm = doc.child(root, "div", &["admonition"]);
            let heading = doc.child(adm, "p", &["admonition-title"]);
            doc.set_text(&heading, title);
            doc.child(adm, "p", &[]);
            let content = doc.child(adm, "div", &["tutorial-content"]);
            doc.child(content, "div", &["highlight"]);
        }
        let (observer, handle) = ManualObserver::new();
        let id = page.mount_block(root, observer)
            .expect("well-formed tutorial");
        (id, handle)
    }

    fn dynamic_layout(&self, id: BlockId) -> tutorview_core::DynamicLayout<MemoryNode> {
        let page = self.page.borrow();
        match page.controller(id).expect("mounted").layout() {
            Layout::Dynamic(layout) => layout.clone(),
            Layout::Static(_) => panic!("expected dynamic layout"),
        }
    }

    fn set_rect(&self, node: MemoryNode, top: f64, height: f64) {
        self.page
            .borrow_mut()
            .document_mut()
            .set_rect(node, Rect::new(top, 0.0, 400.0, height));
    }

    fn active(&self, id: BlockId) -> Option<usize> {
        self.page
            .borrow()
            .controller(id)
            .expect("mounted")
            .active_step()
    }

    fn mode(&self, id: BlockId) -> ViewMode {
        self.page.borrow().controller(id).expect("mounted").mode()
    }
}

#[test]
fn dynamic_layout_matches_step_structure() {
    let h = Harness::new(MemoryPreferenceStore::new(), WIDE);
    let (id, handle) = h.mount_tutorial();

    let layout = h.dynamic_layout(id);
    let page = h.page.borrow();
    let doc = page.document();

    assert_eq!(doc.children(&layout.steps_column).len(), 3);
    assert_eq!(doc.children(&layout.display_column).len(), 2);
    let tags: Vec<Option<String>> = layout
        .display_items
        .iter()
        .map(|(_, item)| doc.attribute(item, STEP_INDEX_ATTR))
        .collect();
    assert_eq!(tags, vec![Some("1".to_owned()), Some("2".to_owned())]);
    for (_, item) in &layout.display_items {
        assert!(!doc.has_class(item, "active"));
    }
    assert_eq!(handle.observed(), vec![layout.blocks[1], layout.blocks[2]]);

    let steps = page.controller(id).expect("mounted").steps();
    assert!(matches!(steps[0].kind, StepKind::Comment { .. }));
    let StepKind::Compound { title, .. } = &steps[2].kind else {
        panic!("expected compound step");
    };
    assert_eq!(doc.text(*title), "Step 2");
}

#[test]
fn step_nearest_quarter_anchor_becomes_active() {
    let mut h = Harness::new(MemoryPreferenceStore::new(), WIDE);
    let (id, handle) = h.mount_tutorial();
    let layout = h.dynamic_layout(id);

    // Anchor at 200px: step 1's midpoint is 10px away, step 2's 250px.
    h.set_rect(layout.blocks[1], 150.0, 120.0);
    h.set_rect(layout.blocks[2], 400.0, 100.0);
    handle.push(layout.blocks[1], true, Rect::default());
    handle.push(layout.blocks[2], true, Rect::default());
    h.clock.advance(WIDE);

    assert_eq!(h.active(id), Some(1));
    {
        let page = h.page.borrow();
        let doc = page.document();
        assert!(doc.has_class(&layout.blocks[1], "active"));
        assert!(doc.has_class(&layout.display_items[0].1, "active"));
        assert!(!doc.has_class(&layout.display_items[1].1, "active"));
    }

    // Scroll down: step 1 leaves the viewport, step 2 moves under the anchor.
    h.set_rect(layout.blocks[2], 150.0, 100.0);
    handle.push(layout.blocks[1], false, Rect::default());
    h.clock.advance(WIDE);

    assert_eq!(h.active(id), Some(2));
    let page = h.page.borrow();
    let doc = page.document();
    assert!(!doc.has_class(&layout.blocks[1], "active"));
    assert!(doc.has_class(&layout.display_items[1].1, "active"));
}

#[test]
fn equal_distances_prefer_the_earlier_step() {
    let mut h = Harness::new(MemoryPreferenceStore::new(), WIDE);
    let (id, handle) = h.mount_tutorial();
    let layout = h.dynamic_layout(id);

    h.set_rect(layout.blocks[1], 90.0, 20.0);
    h.set_rect(layout.blocks[2], 290.0, 20.0);
    handle.push(layout.blocks[2], true, Rect::default());
    handle.push(layout.blocks[1], true, Rect::default());
    h.clock.advance(WIDE);

    assert_eq!(h.active(id), Some(1));
}

#[test]
fn active_step_is_kept_when_nothing_intersects() {
    let mut h = Harness::new(MemoryPreferenceStore::new(), WIDE);
    let (id, handle) = h.mount_tutorial();
    let layout = h.dynamic_layout(id);

    h.set_rect(layout.blocks[1], 150.0, 100.0);
    handle.push(layout.blocks[1], true, Rect::default());
    h.clock.advance(WIDE);
    handle.push(layout.blocks[1], false, Rect::default());
    h.clock.advance(WIDE);

    assert_eq!(h.active(id), Some(1));
}

#[test]
fn mode_round_trip_preserves_every_node_once() {
    let mut h = Harness::new(MemoryPreferenceStore::new(), WIDE);
    let (id, handle) = h.mount_tutorial();
    let layout = h.dynamic_layout(id);
    h.set_rect(layout.blocks[1], 150.0, 100.0);
    handle.push(layout.blocks[1], true, Rect::default());
    h.clock.advance(WIDE);

    h.page.borrow_mut().toggle(id, false).expect("known block");
    h.page.borrow_mut().toggle(id, true).expect("known block");

    let page = h.page.borrow();
    let controller = page.controller(id).expect("mounted");
    assert_eq!(controller.mode(), ViewMode::Dynamic);
    assert_eq!(controller.active_step(), None);
    assert!(controller.intersecting_steps().is_empty());

    let Layout::Dynamic(rebuilt) = controller.layout() else {
        panic!("expected dynamic layout");
    };
    let doc = page.document();
    for (step, wrapper) in controller.steps().iter().zip(&rebuilt.blocks) {
        match &step.kind {
            StepKind::Comment { body } => assert_eq!(doc.parent(body), Some(*wrapper)),
            StepKind::Compound { title, content, .. } => {
                assert_eq!(doc.parent(title), Some(*wrapper));
                let item = rebuilt.display_item(step.index).expect("display item");
                assert_eq!(doc.parent(content), Some(*item));
            }
        }
    }
    assert_eq!(
        handle.observed(),
        vec![rebuilt.blocks[1], rebuilt.blocks[2]]
    );
}

#[test]
fn toggle_broadcast_is_idempotent() {
    let h = Harness::new(MemoryPreferenceStore::new(), WIDE);
    let (a, _) = h.mount_tutorial();
    let (b, _) = h.mount_tutorial();

    h.page.borrow_mut().toggle(a, false).expect("known block");
    let before = h.page.borrow().document().clone();
    h.page.borrow_mut().toggle(b, false).expect("known block");

    assert_eq!(h.mode(a), ViewMode::Static);
    assert_eq!(h.mode(b), ViewMode::Static);
    let page = h.page.borrow();
    let body = *page.controller(a).expect("mounted").body();
    assert_eq!(page.document().children(&body), before.children(&body));
    assert_eq!(
        page.store().load("tutorview.mode").as_deref(),
        Some("Static")
    );
}

#[test]
fn narrow_viewport_forces_static_and_disables_switch() {
    let mut h = Harness::new(MemoryPreferenceStore::new(), NARROW);
    let (id, _) = h.mount_tutorial();

    assert_eq!(h.mode(id), ViewMode::Static);
    {
        let page = h.page.borrow();
        let input = page.controller(id).expect("mounted").toggle_input();
        assert_eq!(
            page.document().attribute(input, "disabled").as_deref(),
            Some("")
        );
    }

    h.clock.advance(WIDE);
    assert_eq!(h.mode(id), ViewMode::Dynamic);
}

#[test]
fn stored_static_preference_wins_on_wide_viewports() {
    let store = MemoryPreferenceStore::with("tutorview.mode", "Static");
    let h = Harness::new(store, WIDE);
    let (id, _) = h.mount_tutorial();
    assert_eq!(h.mode(id), ViewMode::Static);
}

#[test]
fn malformed_template_reports_block_and_child() {
    let h = Harness::new(MemoryPreferenceStore::new(), WIDE);
    h.mount_tutorial();

    let mut page = h.page.borrow_mut();
    let doc = page.document_mut();
    let root = doc.element("div", &["tutorial"]);
    doc.child(root, "p", &[]);
    let adm = doc.child(root, "div", &["admonition"]);
    doc.child(adm, "p", &["admonition-title"]);
    let (observer, _) = ManualObserver::new();

    let err = page.mount_block(root, observer).unwrap_err();
    assert!(matches!(err, TutorialError::MalformedTemplate { child: 1, .. }));
    assert_eq!(page.document().children(&root).len(), 2);
}
