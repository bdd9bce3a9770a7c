//! A deterministic, in-memory host.
//!
//! `ManualHost` implements every host capability with state the caller
//! controls: a clock that only moves when told to, a fixed viewport, a
//! listener registry events can be dispatched into, and a queue of pending
//! frame callbacks that run when a repaint is simulated. Used by tests and by
//! the headless `bench` command.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::Result;
use crate::host::{
    Clock, EventHandler, EventKind, EventSource, FrameHandle, FrameQueue, FrameRequester,
    ListenerRegistry, RawEvent, ViewportQuery,
};

pub struct ManualHost {
    now_ms: Cell<f64>,
    size: Cell<(f64, f64)>,
    pixel_ratio: Cell<f64>,
    listeners: ListenerRegistry,
    frames: FrameQueue,
}

impl ManualHost {
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Rc<Self> {
        Rc::new(Self {
            now_ms: Cell::new(0.0),
            size: Cell::new((width, height)),
            pixel_ratio: Cell::new(pixel_ratio),
            listeners: ListenerRegistry::new(),
            frames: FrameQueue::new(),
        })
    }

    /// Move the clock forward.
    pub fn advance(&self, ms: f64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }

    /// Change the viewport without notifying anyone; follow with
    /// `dispatch(RawEvent::Resize)` to simulate a real resize.
    pub fn set_viewport(&self, width: f64, height: f64, pixel_ratio: f64) {
        self.size.set((width, height));
        self.pixel_ratio.set(pixel_ratio);
    }

    /// Deliver an event to every subscribed handler of its kind.
    pub fn dispatch(&self, event: RawEvent) -> usize {
        self.listeners.dispatch(&event)
    }

    /// Simulate one repaint: run every pending frame callback.
    pub fn fire_frames(&self) -> usize {
        self.frames.fire()
    }

    /// Advance the clock by `ms`, then simulate a repaint.
    pub fn step(&self, ms: f64) -> usize {
        self.advance(ms);
        self.fire_frames()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.count(kind)
    }

    pub fn total_listeners(&self) -> usize {
        self.listeners.total()
    }
}

impl EventSource for ManualHost {
    fn subscribe(&self, kind: EventKind, handler: &EventHandler) -> Result<()> {
        self.listeners.add(kind, handler);
        Ok(())
    }

    fn unsubscribe(&self, kind: EventKind, handler: &EventHandler) -> Result<()> {
        if !self.listeners.remove(kind, handler) {
            log::debug!("unsubscribe: no {kind:?} listener matched");
        }
        Ok(())
    }
}

impl ViewportQuery for ManualHost {
    fn inner_size(&self) -> (f64, f64) {
        self.size.get()
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.pixel_ratio.get()
    }
}

impl Clock for ManualHost {
    fn now_ms(&self) -> f64 {
        self.now_ms.get()
    }
}

impl FrameRequester for ManualHost {
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Result<FrameHandle> {
        Ok(self.frames.request(callback))
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.frames.cancel(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_moves_only_when_advanced() {
        let host = ManualHost::new(800.0, 600.0, 1.0);
        assert_eq!(host.now_ms(), 0.0);
        host.advance(16.5);
        host.advance(0.25);
        assert_eq!(host.now_ms(), 16.75);
    }

    #[test]
    fn test_set_viewport() {
        let host = ManualHost::new(800.0, 600.0, 1.0);
        host.set_viewport(1024.0, 768.0, 2.0);
        assert_eq!(host.inner_size(), (1024.0, 768.0));
        assert_eq!(host.device_pixel_ratio(), 2.0);
    }

    #[test]
    fn test_step_fires_pending_frames() {
        let host = ManualHost::new(800.0, 600.0, 1.0);
        host.request_frame(Box::new(|| {})).unwrap();
        assert_eq!(host.pending_frames(), 1);
        assert_eq!(host.step(10.0), 1);
        assert_eq!(host.pending_frames(), 0);
        assert_eq!(host.now_ms(), 10.0);
    }
}
