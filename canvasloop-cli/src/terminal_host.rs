//! The terminal as a render-loop host.
//!
//! Crossterm events stand in for DOM events, the repaint tick of the run
//! loop stands in for `requestAnimationFrame`, and the canvas pane is sized
//! in virtual pixels so the HUD geometry means the same thing it does in a
//! browser.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};

use canvasloop_core::host::{FrameQueue, ListenerRegistry};
use canvasloop_core::{
    Clock, EventHandler, EventKind, EventSource, FrameHandle, FrameRequester, RawEvent, Result,
    ViewportQuery,
};

/// Virtual pixels per terminal cell.
pub const CELL_WIDTH_PX: f64 = 8.0;
pub const CELL_HEIGHT_PX: f64 = 16.0;

/// Rows reserved under the canvas for the log panel.
pub const LOG_PANEL_ROWS: u16 = 8;

/// Inner size, in cells, of the bordered canvas pane for a terminal of the
/// given size.
pub fn canvas_cells(cols: u16, rows: u16) -> (u16, u16) {
    (
        cols.saturating_sub(2).max(1),
        rows.saturating_sub(LOG_PANEL_ROWS + 2).max(1),
    )
}

pub struct TerminalHost {
    started: Instant,
    canvas: Cell<(u16, u16)>,
    listeners: ListenerRegistry,
    frames: FrameQueue,
}

impl TerminalHost {
    pub fn new(cols: u16, rows: u16) -> Rc<Self> {
        Rc::new(Self {
            started: Instant::now(),
            canvas: Cell::new(canvas_cells(cols, rows)),
            listeners: ListenerRegistry::new(),
            frames: FrameQueue::new(),
        })
    }

    /// Translate and deliver a terminal event. A resize updates the canvas
    /// size before listeners hear about it.
    pub fn dispatch(&self, event: &Event) -> usize {
        if let Event::Resize(cols, rows) = *event {
            self.canvas.set(canvas_cells(cols, rows));
        }
        translate(event)
            .iter()
            .map(|raw| self.listeners.dispatch(raw))
            .sum()
    }

    /// Run every pending frame callback.
    pub fn repaint(&self) -> usize {
        self.frames.fire()
    }

    #[cfg(test)]
    fn total_listeners(&self) -> usize {
        self.listeners.total()
    }
}

impl EventSource for TerminalHost {
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

impl ViewportQuery for TerminalHost {
    fn inner_size(&self) -> (f64, f64) {
        let (cols, rows) = self.canvas.get();
        (f64::from(cols) * CELL_WIDTH_PX, f64::from(rows) * CELL_HEIGHT_PX)
    }

    fn device_pixel_ratio(&self) -> f64 {
        1.0
    }
}

impl Clock for TerminalHost {
    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }
}

impl FrameRequester for TerminalHost {
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Result<FrameHandle> {
        Ok(self.frames.request(callback))
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.frames.cancel(handle);
    }
}

/// Map a terminal event onto the raw events a browser would have fired.
/// Scroll wheel, focus and paste events have no counterpart.
pub fn translate(event: &Event) -> Vec<RawEvent> {
    match event {
        Event::Mouse(MouseEvent {
            kind, column, row, ..
        }) => {
            let (x, y) = cell_center(*column, *row);
            match kind {
                MouseEventKind::Down(button) => vec![RawEvent::PointerDown {
                    button: button_code(*button),
                    x,
                    y,
                }],
                MouseEventKind::Up(button) => vec![RawEvent::PointerUp {
                    button: button_code(*button),
                    x,
                    y,
                }],
                MouseEventKind::Drag(_) | MouseEventKind::Moved => {
                    vec![RawEvent::PointerMove { x, y }]
                }
                _ => Vec::new(),
            }
        }
        Event::Key(KeyEvent { code, kind, .. }) => {
            let key = key_name(*code);
            match kind {
                KeyEventKind::Press | KeyEventKind::Repeat => {
                    let mut out = vec![RawEvent::KeyDown { key }];
                    if let KeyCode::Char(c) = code {
                        out.push(RawEvent::KeyPress { key: c.to_string() });
                    }
                    out
                }
                KeyEventKind::Release => vec![RawEvent::KeyUp { key }],
            }
        }
        Event::Resize(..) => vec![RawEvent::Resize],
        _ => Vec::new(),
    }
}

/// Virtual pixel position of a cell's center, relative to the canvas pane's
/// inner origin (one cell in from the border).
fn cell_center(column: u16, row: u16) -> (f64, f64) {
    let col = f64::from(column.saturating_sub(1));
    let row = f64::from(row.saturating_sub(1));
    ((col + 0.5) * CELL_WIDTH_PX, (row + 0.5) * CELL_HEIGHT_PX)
}

/// DOM `MouseEvent.button` numbering.
fn button_code(button: MouseButton) -> i16 {
    match button {
        MouseButton::Left => 0,
        MouseButton::Middle => 1,
        MouseButton::Right => 2,
    }
}

/// DOM `KeyboardEvent.key` names for the keys that have one.
fn key_name(code: KeyCode) -> String {
    match code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".into(),
        KeyCode::Esc => "Escape".into(),
        KeyCode::Backspace => "Backspace".into(),
        KeyCode::Tab | KeyCode::BackTab => "Tab".into(),
        KeyCode::Delete => "Delete".into(),
        KeyCode::Insert => "Insert".into(),
        KeyCode::Home => "Home".into(),
        KeyCode::End => "End".into(),
        KeyCode::PageUp => "PageUp".into(),
        KeyCode::PageDown => "PageDown".into(),
        KeyCode::Left => "ArrowLeft".into(),
        KeyCode::Right => "ArrowRight".into(),
        KeyCode::Up => "ArrowUp".into(),
        KeyCode::Down => "ArrowDown".into(),
        KeyCode::F(n) => format!("F{n}"),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvasloop_core::{InputAggregator, InputCallbacks, InputConfig, InputState};
    use crossterm::event::KeyModifiers;
    use std::cell::RefCell;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_canvas_cells_reserve_border_and_log() {
        assert_eq!(canvas_cells(80, 24), (78, 24 - LOG_PANEL_ROWS - 2));
        assert_eq!(canvas_cells(1, 1), (1, 1));
    }

    #[test]
    fn test_translate_mouse_buttons() {
        let events = translate(&mouse(MouseEventKind::Down(MouseButton::Right), 1, 1));
        assert_eq!(
            events,
            vec![RawEvent::PointerDown {
                button: 2,
                x: 4.0,
                y: 8.0
            }]
        );
        let events = translate(&mouse(MouseEventKind::Up(MouseButton::Left), 3, 2));
        assert_eq!(
            events,
            vec![RawEvent::PointerUp {
                button: 0,
                x: 20.0,
                y: 24.0
            }]
        );
    }

    #[test]
    fn test_translate_drag_and_move_are_pointer_moves() {
        for kind in [MouseEventKind::Drag(MouseButton::Left), MouseEventKind::Moved] {
            assert_eq!(
                translate(&mouse(kind, 2, 1)),
                vec![RawEvent::PointerMove { x: 12.0, y: 8.0 }]
            );
        }
        assert!(translate(&mouse(MouseEventKind::ScrollDown, 2, 1)).is_empty());
    }

    #[test]
    fn test_translate_char_key_press() {
        let event = Event::Key(KeyEvent::new(KeyCode::Char('w'), KeyModifiers::NONE));
        assert_eq!(
            translate(&event),
            vec![
                RawEvent::KeyDown { key: "w".into() },
                RawEvent::KeyPress { key: "w".into() },
            ]
        );
    }

    #[test]
    fn test_translate_named_keys() {
        let event = Event::Key(KeyEvent::new(KeyCode::Left, KeyModifiers::NONE));
        assert_eq!(
            translate(&event),
            vec![RawEvent::KeyDown {
                key: "ArrowLeft".into()
            }]
        );
        let event = Event::Key(KeyEvent::new_with_kind(
            KeyCode::Esc,
            KeyModifiers::NONE,
            KeyEventKind::Release,
        ));
        assert_eq!(
            translate(&event),
            vec![RawEvent::KeyUp {
                key: "Escape".into()
            }]
        );
    }

    #[test]
    fn test_translate_resize_and_ignored() {
        assert_eq!(translate(&Event::Resize(100, 40)), vec![RawEvent::Resize]);
        assert!(translate(&Event::FocusGained).is_empty());
    }

    #[test]
    fn test_dispatch_resize_updates_viewport_first() {
        let host = TerminalHost::new(80, 24);
        let seen: Rc<RefCell<Vec<(f64, f64)>>> = Rc::default();
        let handler: EventHandler = {
            let seen = seen.clone();
            let host = Rc::downgrade(&host);
            Rc::new(move |_| {
                if let Some(host) = host.upgrade() {
                    seen.borrow_mut().push(host.inner_size());
                }
            })
        };
        host.subscribe(EventKind::Resize, &handler).unwrap();

        assert_eq!(host.dispatch(&Event::Resize(42, 30)), 1);
        assert_eq!(*seen.borrow(), vec![(320.0, 320.0)]);
    }

    #[test]
    fn test_frames_fire_on_repaint() {
        let host = TerminalHost::new(80, 24);
        let fired = Rc::new(Cell::new(0));
        let f = fired.clone();
        host.request_frame(Box::new(move || f.set(f.get() + 1)))
            .unwrap();
        let cancelled = host
            .request_frame(Box::new(|| panic!("cancelled frame ran")))
            .unwrap();
        host.cancel_frame(cancelled);

        assert_eq!(host.repaint(), 1);
        assert_eq!(fired.get(), 1);
        assert_eq!(host.repaint(), 0);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let host = TerminalHost::new(80, 24);
        let a = host.now_ms();
        let b = host.now_ms();
        assert!(a >= 0.0);
        assert!(b >= a);
    }

    #[test]
    fn test_drives_input_aggregator() {
        let host = TerminalHost::new(80, 24);
        let states: Rc<RefCell<Vec<InputState>>> = Rc::default();
        let callbacks = InputCallbacks {
            on_input: {
                let states = states.clone();
                Box::new(move |state, _| states.borrow_mut().push(state.clone()))
            },
            on_viewport_change: Box::new(|_, _| {}),
        };
        let aggregator = InputAggregator::new(
            InputConfig::default(),
            callbacks,
            host.clone(),
            host.clone(),
        )
        .unwrap();
        assert_eq!(aggregator.viewport().width(), 78.0 * CELL_WIDTH_PX);

        host.dispatch(&mouse(MouseEventKind::Down(MouseButton::Left), 5, 5));
        // A press records the anchor; only moves update the pointer.
        assert_eq!(aggregator.drag_anchor(), Some(glam::DVec2::new(36.0, 72.0)));
        assert_eq!(aggregator.input().pointer(), glam::DVec2::ZERO);

        host.dispatch(&mouse(MouseEventKind::Drag(MouseButton::Left), 7, 6));
        host.dispatch(&Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));

        let states = states.borrow();
        let last = states.last().unwrap();
        assert!(last.dragging);
        assert_eq!(last.button, Some(0));
        assert_eq!(last.pointer(), glam::DVec2::new(52.0, 88.0));
        assert_eq!(last.key.as_deref(), Some("q"));

        drop(states);
        aggregator.detach();
        assert_eq!(host.total_listeners(), 0);
    }
}
