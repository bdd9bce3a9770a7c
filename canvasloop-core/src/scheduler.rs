//! Refresh-synchronized frame loop with delta time and rolling FPS.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::host::{Clock, FrameHandle, FrameRequester};

/// Length of the FPS averaging window, in seconds of accumulated frame time.
pub const FPS_WINDOW_SECS: f64 = 1.0;

/// Timing handed to the render step each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Seconds since the previous frame (or since `start` for the first one).
    pub delta: f64,
    /// Last completed rolling average; 0 until the first window closes.
    pub fps: f64,
    /// Frames counted so far in the current window, this one included.
    pub frame_count: u32,
    /// Frames run since the scheduler was created.
    pub frame_index: u64,
}

pub type RenderStep = Box<dyn FnMut(&FrameInfo) -> Result<()>>;

/// Frame timing accumulators.
#[derive(Debug, Default)]
struct FrameClock {
    previous_timestamp_ms: f64,
    accumulated_interval: f64,
    frame_count: u32,
    current_fps: f64,
    frame_index: u64,
    windows: u64,
    running: bool,
    pending: Option<FrameHandle>,
    epoch: u64,
}

impl FrameClock {
    /// Enter Running. The FPS window restarts; the last FPS value stays.
    fn begin(&mut self, now_ms: f64) -> u64 {
        self.previous_timestamp_ms = now_ms;
        self.accumulated_interval = 0.0;
        self.frame_count = 0;
        self.running = true;
        self.epoch += 1;
        self.epoch
    }

    fn tick(&mut self, now_ms: f64) -> FrameInfo {
        let delta = ((now_ms - self.previous_timestamp_ms) / 1000.0).max(0.0);
        self.previous_timestamp_ms = now_ms;
        self.accumulated_interval += delta;
        self.frame_count += 1;
        self.frame_index += 1;
        FrameInfo {
            delta,
            fps: self.current_fps,
            frame_count: self.frame_count,
            frame_index: self.frame_index,
        }
    }

    /// Close the averaging window once a full second has accumulated.
    fn roll_window(&mut self) -> Option<f64> {
        if self.accumulated_interval < FPS_WINDOW_SECS {
            return None;
        }
        self.current_fps = f64::from(self.frame_count) / self.accumulated_interval;
        self.accumulated_interval = 0.0;
        self.frame_count = 0;
        self.windows += 1;
        Some(self.current_fps)
    }
}

struct Shared {
    clock: Rc<dyn Clock>,
    frames: Rc<dyn FrameRequester>,
    state: RefCell<FrameClock>,
    render: RefCell<RenderStep>,
}

/// Drives a render step once per host repaint until stopped.
///
/// ```text
/// Stopped --start()--> Running --stop()--> Stopped
/// ```
///
/// `start` runs the first frame immediately; each frame then asks the host
/// for the next one. `stop` cancels the outstanding request.
pub struct FrameScheduler {
    shared: Rc<Shared>,
}

impl FrameScheduler {
    pub fn new(
        clock: Rc<dyn Clock>,
        frames: Rc<dyn FrameRequester>,
        render: impl FnMut(&FrameInfo) -> Result<()> + 'static,
    ) -> Self {
        Self {
            shared: Rc::new(Shared {
                clock,
                frames,
                state: RefCell::new(FrameClock::default()),
                render: RefCell::new(Box::new(render)),
            }),
        }
    }

    pub fn start(&self) {
        let now = self.shared.clock.now_ms();
        {
            let mut state = self.shared.state.borrow_mut();
            if state.running {
                log::warn!("frame loop is already running");
                return;
            }
            let epoch = state.begin(now);
            log::debug!("frame loop started (run {epoch})");
        }
        run_cycle(&self.shared);
    }

    pub fn stop(&self) {
        let pending = {
            let mut state = self.shared.state.borrow_mut();
            if !state.running {
                log::warn!("can't stop a loop that is not running");
                return;
            }
            state.running = false;
            state.pending.take()
        };
        if let Some(handle) = pending {
            self.shared.frames.cancel_frame(handle);
        }
        log::debug!("frame loop stopped");
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.borrow().running
    }

    /// Rolling frames-per-second average, 0 until one second has elapsed.
    pub fn fps(&self) -> f64 {
        self.shared.state.borrow().current_fps
    }

    pub fn frame_index(&self) -> u64 {
        self.shared.state.borrow().frame_index
    }

    /// Number of FPS windows closed so far.
    pub fn fps_windows(&self) -> u64 {
        self.shared.state.borrow().windows
    }
}

fn run_cycle(shared: &Rc<Shared>) {
    let now = shared.clock.now_ms();
    let info = shared.state.borrow_mut().tick(now);

    match shared.render.try_borrow_mut() {
        Ok(mut render) => {
            if let Err(err) = render(&info) {
                log::error!("frame {} failed: {err}", info.frame_index);
            }
        }
        Err(_) => log::warn!("render step re-entered; skipping frame {}", info.frame_index),
    }

    let epoch = {
        let mut state = shared.state.borrow_mut();
        if let Some(fps) = state.roll_window() {
            log::trace!("fps window closed: {fps:.2}");
        }
        if !state.running {
            return;
        }
        state.epoch
    };

    let weak = Rc::downgrade(shared);
    let requested = shared.frames.request_frame(Box::new(move || {
        if let Some(shared) = weak.upgrade() {
            on_scheduled(&shared, epoch);
        }
    }));

    let mut state = shared.state.borrow_mut();
    match requested {
        Ok(handle) => state.pending = Some(handle),
        Err(err) => {
            log::error!("failed to schedule next frame, stopping: {err}");
            state.running = false;
            state.pending = None;
        }
    }
}

fn on_scheduled(shared: &Rc<Shared>, epoch: u64) {
    {
        let mut state = shared.state.borrow_mut();
        if !state.running || state.epoch != epoch {
            return;
        }
        state.pending = None;
    }
    run_cycle(shared);
}
