use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, KeyboardEvent, MouseEvent, Window};

use canvasloop_core::{
    Clock, Error, EventHandler, EventKind, EventSource, FrameHandle, FrameRequester, RawEvent,
    Result, ViewportQuery,
};

pub(crate) fn js_error(err: JsValue) -> Error {
    Error::Host(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

/// A DOM listener: the core's handler and the JS function wrapping it.
/// `removeEventListener` needs the very same function object, so the
/// closure lives here until unsubscribe.
struct Listener {
    kind: EventKind,
    handler: EventHandler,
    closure: Closure<dyn FnMut(Event)>,
}

/// The browser window as a canvasloop host.
pub struct BrowserHost {
    window: Window,
    listeners: RefCell<Vec<Listener>>,
    // Closures removed from the DOM, kept until the next subscribe in case
    // the removal happened from inside one of them.
    retired: RefCell<Vec<Closure<dyn FnMut(Event)>>>,
}

impl BrowserHost {
    pub fn new() -> Result<Rc<Self>> {
        let window = web_sys::window().ok_or_else(|| Error::Host("no global window".into()))?;
        Ok(Rc::new(Self {
            window,
            listeners: RefCell::new(Vec::new()),
            retired: RefCell::new(Vec::new()),
        }))
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

fn translate(kind: EventKind, event: &Event) -> Option<RawEvent> {
    match kind {
        EventKind::PointerDown | EventKind::PointerUp | EventKind::PointerMove => {
            let mouse = event.dyn_ref::<MouseEvent>()?;
            let (x, y) = (f64::from(mouse.client_x()), f64::from(mouse.client_y()));
            let button = mouse.button();
            Some(match kind {
                EventKind::PointerDown => RawEvent::PointerDown { button, x, y },
                EventKind::PointerUp => RawEvent::PointerUp { button, x, y },
                _ => RawEvent::PointerMove { x, y },
            })
        }
        EventKind::Resize => Some(RawEvent::Resize),
        EventKind::KeyDown | EventKind::KeyUp | EventKind::KeyPress => {
            let key = event.dyn_ref::<KeyboardEvent>()?.key();
            Some(match kind {
                EventKind::KeyDown => RawEvent::KeyDown { key },
                EventKind::KeyUp => RawEvent::KeyUp { key },
                _ => RawEvent::KeyPress { key },
            })
        }
    }
}

impl EventSource for BrowserHost {
    fn subscribe(&self, kind: EventKind, handler: &EventHandler) -> Result<()> {
        self.retired.borrow_mut().clear();

        let forward = handler.clone();
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            match translate(kind, &event) {
                Some(raw) => forward(&raw),
                None => log::warn!("unexpected payload for '{}'", kind.dom_name()),
            }
        });
        self.window
            .add_event_listener_with_callback(kind.dom_name(), closure.as_ref().unchecked_ref())
            .map_err(js_error)?;
        self.listeners.borrow_mut().push(Listener {
            kind,
            handler: handler.clone(),
            closure,
        });
        Ok(())
    }

    fn unsubscribe(&self, kind: EventKind, handler: &EventHandler) -> Result<()> {
        let listener = {
            let mut listeners = self.listeners.borrow_mut();
            let index = listeners
                .iter()
                .position(|l| l.kind == kind && Rc::ptr_eq(&l.handler, handler));
            match index {
                Some(index) => listeners.remove(index),
                None => return Ok(()),
            }
        };
        let removed = self
            .window
            .remove_event_listener_with_callback(
                kind.dom_name(),
                listener.closure.as_ref().unchecked_ref(),
            )
            .map_err(js_error);
        self.retired.borrow_mut().push(listener.closure);
        removed
    }
}

impl ViewportQuery for BrowserHost {
    fn inner_size(&self) -> (f64, f64) {
        let width = self.window.inner_width().ok().and_then(|v| v.as_f64());
        let height = self.window.inner_height().ok().and_then(|v| v.as_f64());
        (width.unwrap_or(0.0), height.unwrap_or(0.0))
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window.device_pixel_ratio()
    }
}

impl Clock for BrowserHost {
    fn now_ms(&self) -> f64 {
        match self.window.performance() {
            Some(performance) => performance.now(),
            None => js_sys::Date::now(),
        }
    }
}

impl FrameRequester for BrowserHost {
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Result<FrameHandle> {
        // Ownership passes to JS and is freed after the call. A cancelled
        // request leaks its closure.
        let js = Closure::once_into_js(move || callback());
        let id = self
            .window
            .request_animation_frame(js.unchecked_ref())
            .map_err(js_error)?;
        Ok(FrameHandle(id as u64))
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        if let Err(err) = self.window.cancel_animation_frame(handle.0 as i32) {
            log::error!("cancelAnimationFrame failed: {err:?}");
        }
    }
}
