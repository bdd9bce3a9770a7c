//! Input aggregation: raw pointer, keyboard and resize events folded into a
//! single continuously readable state record.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::host::{EventHandler, EventKind, EventSource, RawEvent, ViewportQuery, PRIMARY_BUTTON};

/// Tuning for the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Reserved: accepted and validated, not applied to any tracked field.
    pub scroll_smoothing: f64,
    /// Exponential smoothing factor for `movement_x/movement_y` while dragging.
    /// `1.0` reports raw deltas, `0.0` freezes movement at zero.
    pub drag_smoothing: f64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            scroll_smoothing: 0.2,
            drag_smoothing: 0.1,
        }
    }
}

impl InputConfig {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("scroll_smoothing", self.scroll_smoothing),
            ("drag_smoothing", self.drag_smoothing),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig { field, value });
            }
        }
        Ok(())
    }
}

/// What the user is currently doing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    pub dragging: bool,
    pub pointer_x: f64,
    pub pointer_y: f64,
    pub movement_x: f64,
    pub movement_y: f64,
    pub button: Option<i16>,
    pub key: Option<String>,
}

impl InputState {
    pub fn pointer(&self) -> DVec2 {
        DVec2::new(self.pointer_x, self.pointer_y)
    }

    pub fn movement(&self) -> DVec2 {
        DVec2::new(self.movement_x, self.movement_y)
    }
}

/// Viewport size, center and pixel density.
///
/// The center is derived in [`ViewportState::new`] and cannot be set on its
/// own.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportState {
    width: f64,
    height: f64,
    center_x: f64,
    center_y: f64,
    pixel_ratio: f64,
}

impl ViewportState {
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            center_x: width / 2.0,
            center_y: height / 2.0,
            pixel_ratio,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn center_x(&self) -> f64 {
        self.center_x
    }

    pub fn center_y(&self) -> f64 {
        self.center_y
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.center_x, self.center_y)
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Backing-store size in device pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.width * self.pixel_ratio).round().max(0.0) as u32,
            (self.height * self.pixel_ratio).round().max(0.0) as u32,
        )
    }
}

/// Pointer and keyboard state machine, independent of any event source.
#[derive(Debug, Default)]
struct InputTracker {
    input: InputState,
    anchor: Option<DVec2>,
    last_sample: Option<DVec2>,
}

impl InputTracker {
    fn press(&mut self, button: i16, pos: DVec2) {
        if button == PRIMARY_BUTTON {
            self.input.dragging = true;
        }
        self.input.button = Some(button);
        self.anchor = Some(pos);
        self.last_sample = Some(pos);
        self.input.movement_x = 0.0;
        self.input.movement_y = 0.0;
    }

    fn release(&mut self, button: i16) {
        if button == PRIMARY_BUTTON {
            self.input.dragging = false;
        }
        self.input.button = Some(button);
        self.anchor = None;
        self.last_sample = None;
        self.input.movement_x = 0.0;
        self.input.movement_y = 0.0;
    }

    /// Returns false when no drag anchor exists and nothing changed.
    fn drag_to(&mut self, pos: DVec2, drag_smoothing: f64) -> bool {
        if self.anchor.is_none() {
            return false;
        }
        let raw = pos - self.last_sample.unwrap_or(pos);
        let movement = self.input.movement();
        let smoothed = movement + (raw - movement) * drag_smoothing;
        self.input.movement_x = smoothed.x;
        self.input.movement_y = smoothed.y;
        self.input.pointer_x = pos.x;
        self.input.pointer_y = pos.y;
        self.last_sample = Some(pos);
        true
    }

    fn key_press(&mut self, key: &str) {
        self.input.key = Some(key.to_owned());
    }
}

pub type InputCallback = Box<dyn FnMut(&InputState, &RawEvent)>;
pub type ViewportCallback = Box<dyn FnMut(&ViewportState, &RawEvent)>;

/// Observers notified synchronously after each handled event.
///
/// Both receive an immutable copy of the record as it was right after the
/// event was applied.
pub struct InputCallbacks {
    pub on_input: InputCallback,
    pub on_viewport_change: ViewportCallback,
}

struct Shared {
    config: InputConfig,
    viewport_query: Rc<dyn ViewportQuery>,
    tracker: RefCell<InputTracker>,
    viewport: Cell<ViewportState>,
    on_input: RefCell<InputCallback>,
    on_viewport_change: RefCell<ViewportCallback>,
}

impl Shared {
    fn handle(&self, event: &RawEvent) {
        match event {
            RawEvent::PointerDown { button, x, y } => {
                self.tracker.borrow_mut().press(*button, DVec2::new(*x, *y));
                self.notify_input(event);
            }
            RawEvent::PointerUp { button, .. } => {
                self.tracker.borrow_mut().release(*button);
                self.notify_input(event);
            }
            RawEvent::PointerMove { x, y } => {
                let moved = self
                    .tracker
                    .borrow_mut()
                    .drag_to(DVec2::new(*x, *y), self.config.drag_smoothing);
                if moved {
                    self.notify_input(event);
                }
            }
            RawEvent::KeyDown { .. } | RawEvent::KeyUp { .. } => self.notify_input(event),
            RawEvent::KeyPress { key } => {
                self.tracker.borrow_mut().key_press(key);
                self.notify_input(event);
            }
            RawEvent::Resize => {
                let viewport = self.query_viewport();
                self.viewport.set(viewport);
                self.notify_viewport(&viewport, event);
            }
        }
    }

    fn query_viewport(&self) -> ViewportState {
        let (width, height) = self.viewport_query.inner_size();
        ViewportState::new(width, height, self.viewport_query.device_pixel_ratio())
    }

    fn notify_input(&self, event: &RawEvent) {
        let snapshot = self.tracker.borrow().input.clone();
        match self.on_input.try_borrow_mut() {
            Ok(mut callback) => callback(&snapshot, event),
            Err(_) => log::warn!(
                "on_input re-entered; dropping {:?} notification",
                event.kind()
            ),
        }
    }

    fn notify_viewport(&self, viewport: &ViewportState, event: &RawEvent) {
        match self.on_viewport_change.try_borrow_mut() {
            Ok(mut callback) => callback(viewport, event),
            Err(_) => log::warn!("on_viewport_change re-entered; dropping resize notification"),
        }
    }
}

/// Maintains [`InputState`] and [`ViewportState`] from an [`EventSource`].
///
/// Subscribes to all seven [`EventKind`]s on construction and unsubscribes
/// on [`detach`](Self::detach) or drop. One handler is bound per category
/// and reused for both calls, so unsubscription always finds it.
pub struct InputAggregator {
    shared: Rc<Shared>,
    source: Rc<dyn EventSource>,
    bindings: Vec<(EventKind, EventHandler)>,
    attached: Cell<bool>,
}

impl InputAggregator {
    pub fn new(
        config: InputConfig,
        callbacks: InputCallbacks,
        source: Rc<dyn EventSource>,
        viewport_query: Rc<dyn ViewportQuery>,
    ) -> Result<Self> {
        config.validate()?;

        let (width, height) = viewport_query.inner_size();
        let initial = ViewportState::new(width, height, viewport_query.device_pixel_ratio());

        let shared = Rc::new(Shared {
            config,
            viewport_query,
            tracker: RefCell::new(InputTracker::default()),
            viewport: Cell::new(initial),
            on_input: RefCell::new(callbacks.on_input),
            on_viewport_change: RefCell::new(callbacks.on_viewport_change),
        });

        let bindings = EventKind::ALL
            .iter()
            .map(|&kind| (kind, bind(&shared, kind)))
            .collect();

        let aggregator = Self {
            shared,
            source,
            bindings,
            attached: Cell::new(false),
        };
        aggregator.attach()?;
        Ok(aggregator)
    }

    fn attach(&self) -> Result<()> {
        for (i, (kind, handler)) in self.bindings.iter().enumerate() {
            if let Err(err) = self.source.subscribe(*kind, handler) {
                for (kind, handler) in &self.bindings[..i] {
                    let _ = self.source.unsubscribe(*kind, handler);
                }
                return Err(err);
            }
        }
        self.attached.set(true);
        log::debug!(
            "input aggregator attached to {} event categories",
            self.bindings.len()
        );
        Ok(())
    }

    /// Unsubscribe from every category. Idempotent.
    pub fn detach(&self) {
        if !self.attached.replace(false) {
            return;
        }
        for (kind, handler) in &self.bindings {
            if let Err(err) = self.source.unsubscribe(*kind, handler) {
                log::warn!("failed to unsubscribe {kind:?}: {err}");
            }
        }
        log::debug!("input aggregator detached");
    }

    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    /// Copy of the current input record.
    pub fn input(&self) -> InputState {
        self.shared.tracker.borrow().input.clone()
    }

    pub fn viewport(&self) -> ViewportState {
        self.shared.viewport.get()
    }

    /// Position recorded by the last press, if a pointer interaction is active.
    pub fn drag_anchor(&self) -> Option<DVec2> {
        self.shared.tracker.borrow().anchor
    }

    pub fn config(&self) -> &InputConfig {
        &self.shared.config
    }
}

impl Drop for InputAggregator {
    fn drop(&mut self) {
        self.detach();
    }
}

fn bind(shared: &Rc<Shared>, kind: EventKind) -> EventHandler {
    let weak = Rc::downgrade(shared);
    Rc::new(move |event: &RawEvent| {
        if event.kind() != kind {
            log::warn!("{kind:?} handler received a {:?} event", event.kind());
            return;
        }
        if let Some(shared) = weak.upgrade() {
            shared.handle(event);
        }
    })
}
