//! Host environment contracts.
//!
//! The core never talks to a window, a document or a terminal directly.
//! Everything it needs from the outside world comes through the four traits
//! in this module, bundled into a [`Host`]. The browser runtime, the terminal
//! CLI and the in-memory [`ManualHost`](crate::manual::ManualHost) each
//! provide one.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::handle::HandleStore;

/// Button code of the primary (usually left) pointer button.
pub const PRIMARY_BUTTON: i16 = 0;

/// The seven raw event categories the input aggregator listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerDown,
    PointerUp,
    PointerMove,
    Resize,
    KeyDown,
    KeyUp,
    KeyPress,
}

impl EventKind {
    pub const ALL: &'static [EventKind] = &[
        EventKind::PointerDown,
        EventKind::PointerUp,
        EventKind::PointerMove,
        EventKind::Resize,
        EventKind::KeyDown,
        EventKind::KeyUp,
        EventKind::KeyPress,
    ];

    /// DOM event name for this category.
    pub fn dom_name(&self) -> &'static str {
        match self {
            Self::PointerDown => "mousedown",
            Self::PointerUp => "mouseup",
            Self::PointerMove => "mousemove",
            Self::Resize => "resize",
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::KeyPress => "keypress",
        }
    }
}

/// A raw, host-agnostic input notification.
///
/// Pointer coordinates are client (viewport) coordinates in logical pixels.
/// `Resize` carries no payload; the current viewport is queried separately.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEvent {
    PointerDown { button: i16, x: f64, y: f64 },
    PointerUp { button: i16, x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    Resize,
    KeyDown { key: String },
    KeyUp { key: String },
    KeyPress { key: String },
}

impl RawEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PointerDown { .. } => EventKind::PointerDown,
            Self::PointerUp { .. } => EventKind::PointerUp,
            Self::PointerMove { .. } => EventKind::PointerMove,
            Self::Resize => EventKind::Resize,
            Self::KeyDown { .. } => EventKind::KeyDown,
            Self::KeyUp { .. } => EventKind::KeyUp,
            Self::KeyPress { .. } => EventKind::KeyPress,
        }
    }
}

/// A bound event handler. Sources identify handlers by `Rc::ptr_eq`, so the
/// same `Rc` must be passed to `subscribe` and `unsubscribe`.
pub type EventHandler = Rc<dyn Fn(&RawEvent)>;

/// Subscribe/unsubscribe to named event categories.
pub trait EventSource {
    fn subscribe(&self, kind: EventKind, handler: &EventHandler) -> Result<()>;
    fn unsubscribe(&self, kind: EventKind, handler: &EventHandler) -> Result<()>;
}

/// On-demand query of the current viewport.
pub trait ViewportQuery {
    /// Viewport (width, height) in logical pixels.
    fn inner_size(&self) -> (f64, f64);
    /// Device pixel density.
    fn device_pixel_ratio(&self) -> f64;
}

/// Monotonic clock with sub-millisecond resolution.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Handle of a scheduled before-next-repaint callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Schedules callbacks to run before the next repaint.
pub trait FrameRequester {
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Result<FrameHandle>;
    fn cancel_frame(&self, handle: FrameHandle);
}

/// The capabilities the core consumes, bundled for construction.
#[derive(Clone)]
pub struct Host {
    pub events: Rc<dyn EventSource>,
    pub viewport: Rc<dyn ViewportQuery>,
    pub clock: Rc<dyn Clock>,
    pub frames: Rc<dyn FrameRequester>,
}

impl Host {
    /// Build a `Host` from one object that provides every capability.
    pub fn from_shared<T>(host: Rc<T>) -> Self
    where
        T: EventSource + ViewportQuery + Clock + FrameRequester + 'static,
    {
        Self {
            events: host.clone(),
            viewport: host.clone(),
            clock: host.clone(),
            frames: host,
        }
    }
}

// ─── Building blocks for in-process hosts ────────────────────────────

struct Listener {
    kind: EventKind,
    handler: EventHandler,
}

/// Listener bookkeeping for hosts that deliver events themselves.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RefCell<HandleStore<Listener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, kind: EventKind, handler: &EventHandler) {
        self.listeners.borrow_mut().insert(Listener {
            kind,
            handler: handler.clone(),
        });
    }

    /// Remove the listener registered with this exact handler. Returns
    /// whether one was found.
    pub fn remove(&self, kind: EventKind, handler: &EventHandler) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let found = listeners.find(|l| l.kind == kind && Rc::ptr_eq(&l.handler, handler));
        match found {
            Some(handle) => listeners.remove(handle).is_some(),
            None => false,
        }
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(_, l)| l.kind == kind)
            .count()
    }

    pub fn total(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Deliver `event` to every listener of its kind, in subscription order.
    /// Returns the number of handlers invoked.
    pub fn dispatch(&self, event: &RawEvent) -> usize {
        let kind = event.kind();
        // Handlers may (un)subscribe while running, so don't hold the borrow.
        let handlers: Vec<EventHandler> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, l)| l.kind == kind)
            .map(|(_, l)| l.handler.clone())
            .collect();
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }
}

/// Pending before-next-repaint callbacks for hosts that drive repaints
/// themselves.
#[derive(Default)]
pub struct FrameQueue {
    pending: RefCell<HandleStore<Box<dyn FnOnce()>>>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, callback: Box<dyn FnOnce()>) -> FrameHandle {
        FrameHandle(self.pending.borrow_mut().insert(callback))
    }

    pub fn cancel(&self, handle: FrameHandle) -> bool {
        self.pending.borrow_mut().remove(handle.0).is_some()
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Run every callback pending at the time of the call, in request order.
    /// Callbacks requested while firing wait for the next call. Returns the
    /// number of callbacks run.
    pub fn fire(&self) -> usize {
        let batch = self.pending.borrow_mut().drain();
        let count = batch.len();
        for (_, callback) in batch {
            callback();
        }
        count
    }
}
