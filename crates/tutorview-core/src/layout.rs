#![forbid(unsafe_code)]

//! Static and dynamic layout builders.
//!
//! Both builders start by clearing the block body, then move the step
//! markup into freshly created wrappers. Step nodes are never cloned, so
//! rebuilding in either direction preserves every node exactly once.
//!
//! Static layout:
//!
//! ```text
//! body
//! ├── div.tutorial-step.tutorial-step-comment   [body]
//! └── div.tutorial-step.tutorial-step-compound  [title, description…, content]
//! ```
//!
//! Dynamic layout:
//!
//! ```text
//! body.tutorial-dynamic
//! ├── div.tutorial-steps
//! │   ├── div.tutorial-step.tutorial-step-comment   [body]
//! │   └── div.tutorial-step.tutorial-step-compound  [title, description…]
//! └── div.tutorial-display
//!     └── div.tutorial-display-item[data-step-index]  [content]
//! ```

use crate::config::TutorialClasses;
use crate::markup::Document;
use crate::step::{Step, StepKind};

/// Attribute carrying the originating step index.
pub const STEP_INDEX_ATTR: &str = "data-step-index";

/// Result of [`build_static`].
#[derive(Debug, Clone, PartialEq)]
pub struct StaticLayout<N> {
    /// One wrapper per step, in step order.
    pub blocks: Vec<N>,
}

/// Result of [`build_dynamic`].
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicLayout<N> {
    pub steps_column: N,
    pub display_column: N,
    /// Left-column wrapper per step, in step order.
    pub blocks: Vec<N>,
    /// `(step index, left wrapper)` for every compound step.
    pub observed: Vec<(usize, N)>,
    /// `(step index, display item)` for every compound step.
    pub display_items: Vec<(usize, N)>,
}

impl<N: PartialEq> DynamicLayout<N> {
    /// Step index of an observed left-column wrapper.
    #[must_use]
    pub fn step_of(&self, node: &N) -> Option<usize> {
        self.observed
            .iter()
            .find(|(_, n)| n == node)
            .map(|(index, _)| *index)
    }

    #[must_use]
    pub fn left_block(&self, step_index: usize) -> Option<&N> {
        find_indexed(&self.observed, step_index)
    }

    #[must_use]
    pub fn display_item(&self, step_index: usize) -> Option<&N> {
        find_indexed(&self.display_items, step_index)
    }

    /// Left block and display item of one step, whichever exist.
    pub fn step_nodes(&self, step_index: usize) -> impl Iterator<Item = &N> {
        self.left_block(step_index)
            .into_iter()
            .chain(self.display_item(step_index))
    }
}

fn find_indexed<N>(pairs: &[(usize, N)], step_index: usize) -> Option<&N> {
    pairs
        .iter()
        .find(|(index, _)| *index == step_index)
        .map(|(_, n)| n)
}

fn step_wrapper<D: Document>(
    doc: &mut D,
    parent: &D::Node,
    step: &Step<D::Node>,
    classes: &TutorialClasses,
) -> D::Node {
    let wrapper = doc.create_element("div");
    doc.add_class(&wrapper, &classes.step);
    let kind_class = if step.is_compound() {
        &classes.compound_step
    } else {
        &classes.comment_step
    };
    doc.add_class(&wrapper, kind_class);
    doc.set_attribute(&wrapper, STEP_INDEX_ATTR, &step.index.to_string());
    doc.append_child(parent, &wrapper);
    wrapper
}

/// Lay every step out inline, description followed by content.
pub fn build_static<D: Document>(
    doc: &mut D,
    body: &D::Node,
    steps: &[Step<D::Node>],
    classes: &TutorialClasses,
) -> StaticLayout<D::Node> {
    doc.clear_children(body);
    doc.remove_class(body, &classes.dynamic);

    let blocks = steps
        .iter()
        .map(|step| {
            let wrapper = step_wrapper(doc, body, step, classes);
            for node in step.nodes() {
                doc.append_child(&wrapper, node);
            }
            wrapper
        })
        .collect();

    StaticLayout { blocks }
}

/// Split steps into a scrolling description column and a content display.
pub fn build_dynamic<D: Document>(
    doc: &mut D,
    body: &D::Node,
    steps: &[Step<D::Node>],
    classes: &TutorialClasses,
) -> DynamicLayout<D::Node> {
    doc.clear_children(body);
    doc.add_class(body, &classes.dynamic);

    let steps_column = doc.create_element("div");
    doc.add_class(&steps_column, &classes.steps_column);
    doc.append_child(body, &steps_column);

    let display_column = doc.create_element("div");
    doc.add_class(&display_column, &classes.display_column);
    doc.append_child(body, &display_column);

    let mut blocks = Vec::with_capacity(steps.len());
    let mut observed = Vec::new();
    let mut display_items = Vec::new();

    for step in steps {
        let wrapper = step_wrapper(doc, &steps_column, step, classes);
        match &step.kind {
            StepKind::Comment { body: comment } => doc.append_child(&wrapper, comment),
            StepKind::Compound {
                title,
                description,
                content,
            } => {
                doc.append_child(&wrapper, title);
                for node in description {
                    doc.append_child(&wrapper, node);
                }

                let item = doc.create_element("div");
                doc.add_class(&item, &classes.display_item);
                doc.set_attribute(&item, STEP_INDEX_ATTR, &step.index.to_string());
                doc.append_child(&item, content);
                doc.append_child(&display_column, &item);

                observed.push((step.index, wrapper.clone()));
                display_items.push((step.index, item));
            }
        }
        blocks.push(wrapper);
    }

    DynamicLayout {
        steps_column,
        display_column,
        blocks,
        observed,
        display_items,
    }
}
