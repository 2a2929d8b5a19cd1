#![forbid(unsafe_code)]

//! Intersection-driven active-step selection for the dynamic layout.
//!
//! The selector keeps one entry per left-column block that is currently
//! intersecting the viewport, ordered by step index. Once per frame the
//! entry whose bounding-box midpoint lies closest to the reading anchor
//! (a fixed fraction of the viewport height) becomes active.
//!
//! # Invariants
//!
//! 1. At most one step is active.
//! 2. Ties go to the entry encountered first, i.e. the lower step index.
//! 3. With no intersecting entries the previous active step is kept.
//! 4. [`ActiveStepSelector::clear`] empties the entries and the active step.

use std::collections::BTreeMap;

use crate::markup::Rect;

/// Active step before and after one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveChange {
    pub previous: Option<usize>,
    pub next: usize,
}

/// Index of the rect whose midpoint is closest to `anchor_y`.
///
/// Strict comparison keeps the first of equally distant candidates.
#[must_use]
pub fn closest_to_anchor<I>(candidates: I, anchor_y: f64) -> Option<usize>
where
    I: IntoIterator<Item = (usize, Rect)>,
{
    let mut best: Option<(usize, f64)> = None;
    for (index, rect) in candidates {
        let distance = (rect.mid_y() - anchor_y).abs();
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((index, distance)),
        }
    }
    best.map(|(index, _)| index)
}

#[derive(Debug, Clone)]
pub struct ActiveStepSelector<N> {
    intersecting: BTreeMap<usize, N>,
    active: Option<usize>,
}

impl<N> Default for ActiveStepSelector<N> {
    fn default() -> Self {
        Self {
            intersecting: BTreeMap::new(),
            active: None,
        }
    }
}

impl<N: Clone> ActiveStepSelector<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one intersection change for the block of `step_index`.
    pub fn record(&mut self, step_index: usize, node: N, is_intersecting: bool) {
        if is_intersecting {
            self.intersecting.insert(step_index, node);
        } else {
            self.intersecting.remove(&step_index);
        }
    }

    /// Drop every entry and forget the active step.
    pub fn clear(&mut self) {
        self.intersecting.clear();
        self.active = None;
    }

    #[must_use]
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intersecting.is_empty()
    }

    /// Step indices currently intersecting, ascending.
    pub fn intersecting(&self) -> impl Iterator<Item = usize> + '_ {
        self.intersecting.keys().copied()
    }

    /// Re-rank the intersecting entries using fresh rects from `rect_of`.
    ///
    /// Returns the change when the winner differs from the active step.
    pub fn evaluate(
        &mut self,
        rect_of: impl Fn(&N) -> Rect,
        viewport_height: f64,
        anchor_fraction: f64,
    ) -> Option<ActiveChange> {
        if self.intersecting.is_empty() {
            return None;
        }
        let anchor_y = viewport_height * anchor_fraction;
        let winner = closest_to_anchor(
            self.intersecting
                .iter()
                .map(|(&index, node)| (index, rect_of(node))),
            anchor_y,
        )?;
        if self.active == Some(winner) {
            return None;
        }
        let change = ActiveChange {
            previous: self.active,
            next: winner,
        };
        self.active = Some(winner);
        Some(change)
    }
}
