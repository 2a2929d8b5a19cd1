#![forbid(unsafe_code)]

//! Viewport intersection observation.
//!
//! A [`ViewportObserver`] is owned by exactly one tutorial controller. The
//! controller observes its left-column blocks after a dynamic build and
//! disconnects before every rebuild, so records queued for a torn-down
//! layout never reach the active-step selector.

use std::cell::RefCell;
use std::rc::Rc;

use crate::markup::Rect;

/// Intersection change for one observed element.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionRecord<N> {
    pub target: N,
    pub is_intersecting: bool,
    pub rect: Rect,
}

pub trait ViewportObserver<N> {
    fn observe(&mut self, node: &N);

    /// Stop observing everything and drop queued records.
    fn disconnect(&mut self);

    /// Drain records queued since the last call.
    fn take_records(&mut self) -> Vec<IntersectionRecord<N>>;
}

#[derive(Debug)]
struct ManualObserverState<N> {
    observed: Vec<N>,
    queued: Vec<IntersectionRecord<N>>,
    disconnects: usize,
}

/// [`ViewportObserver`] fed by hand. Keep a [`ManualObserverHandle`] to push
/// records and inspect what is observed after the observer moves into a
/// controller.
#[derive(Debug)]
pub struct ManualObserver<N> {
    state: Rc<RefCell<ManualObserverState<N>>>,
}

/// Shared view of a [`ManualObserver`].
#[derive(Debug)]
pub struct ManualObserverHandle<N> {
    state: Rc<RefCell<ManualObserverState<N>>>,
}

impl<N> Clone for ManualObserverHandle<N> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<N: Clone + PartialEq> ManualObserver<N> {
    #[must_use]
    pub fn new() -> (Self, ManualObserverHandle<N>) {
        let state = Rc::new(RefCell::new(ManualObserverState {
            observed: Vec::new(),
            queued: Vec::new(),
            disconnects: 0,
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            ManualObserverHandle { state },
        )
    }
}

impl<N: Clone + PartialEq> ManualObserverHandle<N> {
    /// Queue a record. Records for unobserved nodes are dropped, as a
    /// disconnected browser observer would.
    pub fn push(&self, target: N, is_intersecting: bool, rect: Rect) {
        let mut state = self.state.borrow_mut();
        if state.observed.contains(&target) {
            state.queued.push(IntersectionRecord {
                target,
                is_intersecting,
                rect,
            });
        }
    }

    #[must_use]
    pub fn observed(&self) -> Vec<N> {
        self.state.borrow().observed.clone()
    }

    #[must_use]
    pub fn disconnects(&self) -> usize {
        self.state.borrow().disconnects
    }
}

impl<N: Clone + PartialEq> ViewportObserver<N> for ManualObserver<N> {
    fn observe(&mut self, node: &N) {
        let mut state = self.state.borrow_mut();
        if !state.observed.contains(node) {
            state.observed.push(node.clone());
        }
    }

    fn disconnect(&mut self) {
        let mut state = self.state.borrow_mut();
        state.observed.clear();
        state.queued.clear();
        state.disconnects += 1;
    }

    fn take_records(&mut self) -> Vec<IntersectionRecord<N>> {
        std::mem::take(&mut self.state.borrow_mut().queued)
    }
}
