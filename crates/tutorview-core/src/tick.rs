#![forbid(unsafe_code)]

//! Per-frame tick sources.
//!
//! The browser host re-arms `requestAnimationFrame`; tests drive a
//! [`ManualClock`] one frame at a time.

use crate::markup::Viewport;

/// What a tick callback learns about the frame being rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Monotonic frame counter, starting at 1.
    pub frame: u64,
    pub viewport: Viewport,
}

pub type TickCallback = Box<dyn FnMut(FrameInfo)>;

/// Something that calls back once per rendered frame.
pub trait TickSource {
    fn on_tick(&mut self, callback: TickCallback);
}

/// Deterministic [`TickSource`] advanced explicitly by the caller.
#[derive(Default)]
pub struct ManualClock {
    frame: u64,
    callbacks: Vec<TickCallback>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every callback for one new frame. Returns the frame number.
    pub fn advance(&mut self, viewport: Viewport) -> u64 {
        self.frame += 1;
        let info = FrameInfo {
            frame: self.frame,
            viewport,
        };
        for callback in &mut self.callbacks {
            callback(info);
        }
        self.frame
    }

    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl core::fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ManualClock")
            .field("frame", &self.frame)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl TickSource for ManualClock {
    fn on_tick(&mut self, callback: TickCallback) {
        self.callbacks.push(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn advance_fires_callbacks_in_order() {
        let mut clock = ManualClock::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        for tag in ["a", "b"] {
            let seen = Rc::clone(&seen);
            clock.on_tick(Box::new(move |info| seen.borrow_mut().push((tag, info.frame))));
        }

        clock.advance(Viewport::new(1280.0, 720.0));
        clock.advance(Viewport::new(1280.0, 720.0));

        assert_eq!(
            *seen.borrow(),
            vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]
        );
        assert_eq!(clock.frame(), 2);
    }
}
