#![forbid(unsafe_code)]

//! Every tutorial block on one page, kept on a single view mode.
//!
//! [`TutorialPage`] owns the document, the preference store and the mode
//! channel, and drives each [`TutorialController`]. Mode changes made by one
//! block are published on the channel; each block's subscription queues the
//! change in its inbox and the page drains the inboxes before the
//! publishing call returns, so the broadcast completes in the same turn.
//!
//! # Frame ordering
//!
//! [`TutorialPage::frame`] runs, in order:
//! 1. auto-scrolls queued by builds in earlier frames,
//! 2. resize handling when the viewport changed,
//! 3. active-step recomputation for every dynamic block.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::channel::{BlockId, ChannelSubscription, ModeChange, ModeChannel};
use crate::config::TutorialConfig;
use crate::controller::TutorialController;
use crate::error::{Result, TutorialError};
use crate::markup::{Document, Viewport};
use crate::observer::ViewportObserver;
use crate::preference::{PreferenceStore, load_view_mode, store_view_mode};
use crate::view_mode::{ViewMode, resolve_view_mode};

struct MountedBlock<D: Document, O: ViewportObserver<D::Node>> {
    controller: TutorialController<D, O>,
    inbox: Rc<RefCell<VecDeque<ViewMode>>>,
    _subscription: ChannelSubscription,
}

pub struct TutorialPage<D, O, S, C>
where
    D: Document,
    O: ViewportObserver<D::Node>,
    S: PreferenceStore,
    C: ModeChannel,
{
    doc: D,
    store: S,
    channel: C,
    config: Rc<TutorialConfig>,
    viewport: Viewport,
    next_id: u32,
    blocks: Vec<MountedBlock<D, O>>,
}

impl<D, O, S, C> core::fmt::Debug for TutorialPage<D, O, S, C>
where
    D: Document,
    O: ViewportObserver<D::Node>,
    S: PreferenceStore,
    C: ModeChannel,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TutorialPage")
            .field("viewport", &self.viewport)
            .field("blocks", &self.blocks.len())
            .finish_non_exhaustive()
    }
}

impl<D, O, S, C> TutorialPage<D, O, S, C>
where
    D: Document,
    O: ViewportObserver<D::Node>,
    S: PreferenceStore,
    C: ModeChannel,
{
    #[must_use]
    pub fn new(doc: D, store: S, channel: C, config: TutorialConfig, viewport: Viewport) -> Self {
        Self {
            doc,
            store,
            channel,
            config: Rc::new(config),
            viewport,
            next_id: 0,
            blocks: Vec::new(),
        }
    }

    #[must_use]
    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &TutorialConfig {
        &self.config
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Mode a block mounted now would start in.
    #[must_use]
    pub fn resolved_mode(&self) -> ViewMode {
        let stored = load_view_mode(&self.store, &self.config.preference_key);
        resolve_view_mode(stored, self.viewport.width, self.config.breakpoint_px)
    }

    fn toggle_allowed(&self) -> bool {
        self.viewport.width >= self.config.breakpoint_px
    }

    /// Parse and lay out one tutorial block.
    ///
    /// A malformed block is rejected without affecting blocks already
    /// mounted.
    pub fn mount_block(&mut self, root: D::Node, observer: O) -> Result<BlockId> {
        let id = BlockId(self.next_id);
        self.next_id += 1;

        let mode = self.resolved_mode();
        let allowed = self.toggle_allowed();
        let mut controller = TutorialController::mount(
            id,
            &mut self.doc,
            root,
            observer,
            Rc::clone(&self.config),
            mode,
        )?;
        controller.set_toggle_enabled(&mut self.doc, allowed);

        let inbox = Rc::new(RefCell::new(VecDeque::new()));
        let sink = Rc::clone(&inbox);
        let subscription = self.channel.subscribe(Rc::new(move |change: &ModeChange| {
            if change.source != id {
                sink.borrow_mut().push_back(change.mode);
            }
        }));

        self.blocks.push(MountedBlock {
            controller,
            inbox,
            _subscription: subscription,
        });
        Ok(id)
    }

    #[must_use]
    pub fn block_ids(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|b| b.controller.id()).collect()
    }

    #[must_use]
    pub fn controller(&self, id: BlockId) -> Option<&TutorialController<D, O>> {
        self.blocks
            .iter()
            .find(|b| b.controller.id() == id)
            .map(|b| &b.controller)
    }

    fn position(&self, id: BlockId) -> Result<usize> {
        self.blocks
            .iter()
            .position(|b| b.controller.id() == id)
            .ok_or(TutorialError::UnknownBlock(id))
    }

    /// Handle a user flip of one block's switch.
    ///
    /// Stores the chosen mode, rebuilds the block, recenters its switch and
    /// brings every other block onto the same mode. Below the breakpoint the
    /// choice is only stored; blocks stay on the resolved (static) mode.
    pub fn toggle(&mut self, id: BlockId, checked: bool) -> Result<()> {
        let idx = self.position(id)?;
        let chosen = ViewMode::from_checked(checked);
        store_view_mode(&mut self.store, &self.config.preference_key, chosen);
        let mode = if self.toggle_allowed() {
            chosen
        } else {
            self.resolved_mode()
        };
        self.blocks[idx].controller.toggle_to(&mut self.doc, mode);
        self.broadcast(ModeChange { mode, source: id });
        Ok(())
    }

    /// Re-resolve every block's mode for a new viewport.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let mode = self.resolved_mode();
        let allowed = self.toggle_allowed();

        let mut changed_by = None;
        for block in &mut self.blocks {
            block.controller.set_toggle_enabled(&mut self.doc, allowed);
            if block.controller.set_mode(&mut self.doc, mode) && changed_by.is_none() {
                changed_by = Some(block.controller.id());
            }
        }
        if let Some(source) = changed_by {
            tracing::debug!(
                target: "tutorview.page",
                width = viewport.width,
                mode = %mode,
                "viewport resize changed view mode"
            );
            self.broadcast(ModeChange { mode, source });
        }
    }

    /// One rendered frame.
    pub fn frame(&mut self, viewport: Viewport) {
        for block in &mut self.blocks {
            block.controller.run_deferred_scrolls(&mut self.doc);
        }
        if viewport != self.viewport {
            self.resize(viewport);
        }
        for block in &mut self.blocks {
            block.controller.tick(&mut self.doc, self.viewport);
        }
    }

    fn broadcast(&mut self, change: ModeChange) {
        self.channel.publish(change);
        self.deliver_inboxes();
    }

    /// Apply queued mode changes from the channel.
    ///
    /// Hosts whose channel also carries changes from outside this page call
    /// this after such deliveries.
    pub fn deliver_inboxes(&mut self) {
        for block in &mut self.blocks {
            let latest = block.inbox.borrow_mut().drain(..).last();
            if let Some(mode) = latest {
                if block.controller.set_mode(&mut self.doc, mode) {
                    tracing::debug!(
                        target: "tutorview.page",
                        block = %block.controller.id(),
                        mode = %mode,
                        "applied broadcast view mode"
                    );
                }
            }
        }
    }

    /// Disconnect every observer and drop every block.
    pub fn teardown(&mut self) {
        for block in &mut self.blocks {
            block.controller.teardown();
        }
        self.blocks.clear();
    }
}
