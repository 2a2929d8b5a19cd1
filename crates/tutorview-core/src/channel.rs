#![forbid(unsafe_code)]

//! Page-wide view-mode notifications.
//!
//! # Design
//!
//! [`ModeChannel`] is the seam between tutorial blocks: one block publishes
//! a [`ModeChange`], every subscriber on the page receives it synchronously.
//! Changes carry the originating [`BlockId`] so a block can skip its own
//! broadcast.
//!
//! [`LocalModeChannel`] keeps subscribers as weak references, the same way
//! an observable value does. Dropping the [`ChannelSubscription`] guard
//! stops delivery; dead entries are pruned on the next publish.
//!
//! # Failure Modes
//!
//! - **Re-entrant publish**: a handler may publish again; callbacks are
//!   collected before any of them runs, so no borrow is held.

use core::fmt;
use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::view_mode::ViewMode;

/// Identity of one tutorial block on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One broadcast view-mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    pub mode: ViewMode,
    pub source: BlockId,
}

pub type ModeHandler = Rc<dyn Fn(&ModeChange)>;

/// Guard returned by [`ModeChannel::subscribe`]; dropping it unsubscribes.
pub struct ChannelSubscription {
    _guard: Box<dyn Any>,
}

impl ChannelSubscription {
    /// Wrap any value whose drop ends the subscription.
    #[must_use]
    pub fn new(guard: impl Any) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }
}

impl fmt::Debug for ChannelSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSubscription")
            .finish_non_exhaustive()
    }
}

/// Same-process publish/subscribe for view-mode changes.
pub trait ModeChannel {
    fn publish(&self, change: ModeChange);

    #[must_use]
    fn subscribe(&self, handler: ModeHandler) -> ChannelSubscription;
}

/// In-process [`ModeChannel`] with synchronous fan-out.
///
/// Cloning yields another handle to the same subscriber list.
#[derive(Clone, Default)]
pub struct LocalModeChannel {
    subscribers: Rc<RefCell<Vec<Weak<dyn Fn(&ModeChange)>>>>,
}

impl LocalModeChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

impl fmt::Debug for LocalModeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalModeChannel")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

impl ModeChannel for LocalModeChannel {
    fn publish(&self, change: ModeChange) {
        let live: Vec<ModeHandler> = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|w| w.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        tracing::debug!(
            target: "tutorview.channel",
            mode = %change.mode,
            source = %change.source,
            subscribers = live.len(),
            "publishing view mode"
        );
        for handler in live {
            handler(&change);
        }
    }

    fn subscribe(&self, handler: ModeHandler) -> ChannelSubscription {
        self.subscribers.borrow_mut().push(Rc::downgrade(&handler));
        ChannelSubscription::new(handler)
    }
}
