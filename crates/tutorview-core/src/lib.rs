#![forbid(unsafe_code)]

//! Tutorview core
//!
//! Host-independent logic behind the documentation site's tutorial blocks:
//! a tutorial is a run of steps that can be read inline (static view) or as
//! a two-column layout where the code panel follows the step being read
//! (dynamic view).
//!
//! # Key Components
//!
//! - [`parse_steps`] - Classify a block's children into comment and compound steps
//! - [`resolve_view_mode`] - Pick the initial view from preference and width
//! - [`TutorialController`] - One mounted block: toggle, layout, active step
//! - [`TutorialPage`] - Every block on a page, kept in sync through a [`ModeChannel`]
//! - [`ActiveStepSelector`] - Nearest-to-anchor selection over intersecting steps
//!
//! # How it fits
//! Nothing here touches a browser. The element tree, preference storage,
//! the broadcast channel, frame ticks and intersection reports all come in
//! through traits ([`Document`], [`PreferenceStore`], [`ModeChannel`],
//! [`TickSource`], [`ViewportObserver`]). `tutorview-web` implements them
//! over `web-sys`; [`MemoryDocument`] and the manual sources implement them
//! for tests.

pub mod active_step;
pub mod channel;
pub mod config;
pub mod controller;
pub mod error;
pub mod layout;
pub mod markup;
pub mod memory;
pub mod observer;
pub mod page;
pub mod preference;
pub mod step;
pub mod tabs;
pub mod text;
pub mod tick;
pub mod view_mode;

pub use active_step::{ActiveChange, ActiveStepSelector};
pub use channel::{BlockId, ChannelSubscription, LocalModeChannel, ModeChange, ModeChannel};
pub use config::{TutorialClasses, TutorialConfig};
pub use controller::{AutoScroll, Layout, TutorialController};
pub use error::{ConfigError, MissingPart, Result, TutorialError};
pub use layout::{DynamicLayout, StaticLayout};
pub use markup::{Document, Rect, Viewport};
pub use memory::{MemoryDocument, MemoryNode};
pub use observer::{IntersectionRecord, ManualObserver, ManualObserverHandle, ViewportObserver};
pub use page::TutorialPage;
pub use preference::{MemoryPreferenceStore, PreferenceStore};
pub use step::{Step, StepKind, parse_steps};
pub use tick::{FrameInfo, ManualClock, TickCallback, TickSource};
pub use view_mode::{ViewMode, resolve_view_mode};
