#![forbid(unsafe_code)]

//! Step records and the markup parser that produces them.
//!
//! A tutorial block's direct children map one-to-one onto steps. Children
//! carrying the admonition class become [`StepKind::Compound`]; everything
//! else is a [`StepKind::Comment`]. Inside an admonition:
//!
//! - the first child with the title class is the title,
//! - the last child with the content class is the content,
//! - every remaining child, in order, is the description.
//!
//! Each markup node ends up owned by exactly one step part. The admonition
//! wrapper itself is discarded.

use crate::channel::BlockId;
use crate::config::TutorialClasses;
use crate::error::{MissingPart, Result, TutorialError};
use crate::markup::Document;

/// Kind of a step with the markup it owns.
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind<N> {
    /// Free-form explanation without paired content.
    Comment {
        body: N,
    },
    /// Title and description paired with content such as code or an image.
    Compound {
        title: N,
        description: Vec<N>,
        content: N,
    },
}

/// One instructional unit of a tutorial block.
#[derive(Debug, Clone, PartialEq)]
pub struct Step<N> {
    /// Zero-based position within the block.
    pub index: usize,
    pub kind: StepKind<N>,
}

impl<N> Step<N> {
    #[must_use]
    pub fn is_compound(&self) -> bool {
        matches!(self.kind, StepKind::Compound { .. })
    }

    /// Content node of a compound step.
    #[must_use]
    pub fn content(&self) -> Option<&N> {
        match &self.kind {
            StepKind::Compound { content, .. } => Some(content),
            StepKind::Comment { .. } => None,
        }
    }

    /// Every markup node this step owns, in reading order.
    #[must_use]
    pub fn nodes(&self) -> Vec<&N> {
        match &self.kind {
            StepKind::Comment { body } => vec![body],
            StepKind::Compound {
                title,
                description,
                content,
            } => {
                let mut nodes = Vec::with_capacity(description.len() + 2);
                nodes.push(title);
                nodes.extend(description);
                nodes.push(content);
                nodes
            }
        }
    }
}

/// Parse the children of `root` into steps and detach them from `root`.
///
/// Every child is validated before anything is detached, so a malformed
/// admonition leaves the source markup untouched.
pub fn parse_steps<D: Document>(
    doc: &mut D,
    root: &D::Node,
    classes: &TutorialClasses,
    block: BlockId,
) -> Result<Vec<Step<D::Node>>> {
    let children = doc.children(root);
    let mut steps = Vec::with_capacity(children.len());

    for (index, child) in children.iter().enumerate() {
        let kind = if doc.has_class(child, &classes.admonition) {
            split_admonition(doc, child, classes).map_err(|missing| {
                tracing::warn!(
                    target: "tutorview.step",
                    block = %block,
                    child = index,
                    missing = %missing,
                    "malformed tutorial admonition"
                );
                TutorialError::MalformedTemplate {
                    block,
                    child: index,
                    missing,
                }
            })?
        } else {
            StepKind::Comment {
                body: child.clone(),
            }
        };
        steps.push(Step { index, kind });
    }

    for step in &steps {
        for node in step.nodes() {
            doc.detach(node);
        }
    }
    doc.clear_children(root);

    tracing::debug!(
        target: "tutorview.step",
        block = %block,
        steps = steps.len(),
        compound = steps.iter().filter(|s| s.is_compound()).count(),
        "parsed tutorial steps"
    );
    Ok(steps)
}

fn split_admonition<D: Document>(
    doc: &D,
    admonition: &D::Node,
    classes: &TutorialClasses,
) -> core::result::Result<StepKind<D::Node>, MissingPart> {
    let parts = doc.children(admonition);
    let title_idx = parts
        .iter()
        .position(|n| doc.has_class(n, &classes.title))
        .ok_or(MissingPart::Title)?;
    let content_idx = parts
        .iter()
        .rposition(|n| doc.has_class(n, &classes.content))
        .filter(|&idx| idx != title_idx)
        .ok_or(MissingPart::Content)?;

    let description = parts
        .iter()
        .enumerate()
        .filter(|&(idx, _)| idx != title_idx && idx != content_idx)
        .map(|(_, n)| n.clone())
        .collect();

    Ok(StepKind::Compound {
        title: parts[title_idx].clone(),
        description,
        content: parts[content_idx].clone(),
    })
}
