//! Wires an [`InputAggregator`] and a [`FrameScheduler`] to a drawing
//! surface.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::host::{Host, RawEvent};
use crate::input::{InputAggregator, InputCallbacks, InputConfig, InputState, ViewportState};
use crate::scheduler::{FrameInfo, FrameScheduler};
use crate::surface::{DrawingSurface, Rect, Rgba};

const HUD_TEXT_PX: f64 = 48.0;
const POINTER_MARKER_PX: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Draw the FPS panel.
    pub hud: bool,
    pub input: InputConfig,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            hud: true,
            input: InputConfig::default(),
        }
    }
}

/// The orchestrator: owns the surface, keeps the latest input snapshot and
/// renders it every frame.
pub struct Stage<S: DrawingSurface + 'static> {
    surface: Rc<RefCell<S>>,
    latest_input: Rc<RefCell<Option<InputState>>>,
    input: InputAggregator,
    scheduler: FrameScheduler,
}

impl<S: DrawingSurface + 'static> Stage<S> {
    /// Size the surface to the current viewport, subscribe to input and
    /// prepare the frame loop. Nothing runs until [`start`](Self::start).
    pub fn new(surface: S, host: Host, config: StageConfig) -> Result<Self> {
        let (width, height) = host.viewport.inner_size();
        let ratio = host.viewport.device_pixel_ratio();

        let mut surface = surface;
        surface.resize(&ViewportState::new(width, height, ratio))?;
        let surface = Rc::new(RefCell::new(surface));
        let latest_input: Rc<RefCell<Option<InputState>>> = Rc::default();
        let drag_marker: Rc<Cell<Option<DVec2>>> = Rc::default();

        let callbacks = InputCallbacks {
            on_input: {
                let latest = latest_input.clone();
                let marker = drag_marker.clone();
                Box::new(move |state, event| {
                    marker.set(next_marker(marker.get(), state, event));
                    *latest.borrow_mut() = Some(state.clone());
                })
            },
            on_viewport_change: {
                let surface = surface.clone();
                Box::new(move |viewport, _| resize_surface(&surface, viewport))
            },
        };
        let input = InputAggregator::new(
            config.input,
            callbacks,
            host.events.clone(),
            host.viewport.clone(),
        )?;

        let scheduler = {
            let surface = surface.clone();
            let latest = latest_input.clone();
            let drag_marker = drag_marker.clone();
            FrameScheduler::new(host.clock.clone(), host.frames.clone(), move |frame| {
                let input = latest.borrow().clone();
                let mut surface = surface
                    .try_borrow_mut()
                    .map_err(|_| Error::Draw("surface is busy".into()))?;
                draw_frame(
                    &mut *surface,
                    frame,
                    input.as_ref(),
                    drag_marker.get(),
                    config.hud,
                )
            })
        };

        log::info!("stage ready: {width}x{height} @ {ratio}x");
        Ok(Self {
            surface,
            latest_input,
            input,
            scheduler,
        })
    }

    pub fn start(&self) {
        self.scheduler.start();
    }

    pub fn stop(&self) {
        self.scheduler.stop();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn fps(&self) -> f64 {
        self.scheduler.fps()
    }

    pub fn frame_index(&self) -> u64 {
        self.scheduler.frame_index()
    }

    /// Number of FPS windows closed so far.
    pub fn fps_windows(&self) -> u64 {
        self.scheduler.fps_windows()
    }

    /// The snapshot from the most recent input notification, if any.
    pub fn latest_input(&self) -> Option<InputState> {
        self.latest_input.borrow().clone()
    }

    pub fn viewport(&self) -> ViewportState {
        self.input.viewport()
    }

    pub fn input(&self) -> &InputAggregator {
        &self.input
    }

    /// Stop the loop if it runs and unsubscribe from all input.
    pub fn detach(&self) {
        if self.scheduler.is_running() {
            self.scheduler.stop();
        }
        self.input.detach();
    }

    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.surface.borrow())
    }
}

fn resize_surface<S: DrawingSurface>(surface: &RefCell<S>, viewport: &ViewportState) {
    match surface.try_borrow_mut() {
        Ok(mut surface) => {
            if let Err(err) = surface.resize(viewport) {
                log::error!("surface resize failed: {err}");
            }
        }
        Err(_) => log::warn!("surface busy; skipping resize"),
    }
}

/// Where the drag marker sits after `event`: at the press point until the
/// drag's first move, then under the pointer. `None` outside a drag.
fn next_marker(current: Option<DVec2>, state: &InputState, event: &RawEvent) -> Option<DVec2> {
    if !state.dragging {
        return None;
    }
    match *event {
        RawEvent::PointerDown { x, y, .. } => Some(DVec2::new(x, y)),
        RawEvent::PointerMove { .. } => Some(state.pointer()),
        _ => current,
    }
}

/// One frame of the HUD: a red panel with the rolling FPS and the frame
/// count of the current window, the last typed key, and the drag marker.
pub fn draw_frame(
    surface: &mut dyn DrawingSurface,
    frame: &FrameInfo,
    input: Option<&InputState>,
    marker: Option<DVec2>,
    hud: bool,
) -> Result<()> {
    surface.clear()?;
    if hud {
        surface.fill_rect(Rect::new(10.0, 10.0, 300.0, 400.0), Rgba::RED)?;
        surface.fill_text(
            &format!("{:.2}", frame.fps),
            DVec2::new(110.0, 150.0),
            HUD_TEXT_PX,
            Rgba::BLACK,
        )?;
        surface.fill_text(
            &frame.frame_count.to_string(),
            DVec2::new(110.0, 200.0),
            HUD_TEXT_PX,
            Rgba::BLACK,
        )?;
        if let Some(key) = input.and_then(|i| i.key.as_deref()) {
            surface.fill_text(key, DVec2::new(110.0, 250.0), HUD_TEXT_PX, Rgba::BLACK)?;
        }
    }
    if let Some(at) = marker {
        surface.fill_rect(Rect::centered(at, POINTER_MARKER_PX), Rgba::BLACK)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::EventKind;
    use crate::manual::ManualHost;
    use crate::surface::{DisplayList, DrawCommand};

    const STEP_MS: f64 = 15.625;

    fn stage(host: &Rc<ManualHost>) -> Stage<DisplayList> {
        Stage::new(
            DisplayList::new(),
            Host::from_shared(host.clone()),
            StageConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_sizes_surface_and_waits_for_start() {
        let host = ManualHost::new(640.0, 480.0, 2.0);
        let stage = stage(&host);
        assert_eq!(
            stage.with_surface(|s| s.viewport().physical_size()),
            (1280, 960)
        );
        assert!(!stage.is_running());
        assert_eq!(host.pending_frames(), 0);
        assert_eq!(host.total_listeners(), EventKind::ALL.len());
    }

    #[test]
    fn test_renders_hud_each_frame() {
        let host = ManualHost::new(640.0, 480.0, 1.0);
        let stage = stage(&host);
        stage.start();
        let texts: Vec<String> = stage.with_surface(|s| s.texts().map(String::from).collect());
        assert_eq!(texts, vec!["0.00", "1"]);

        for _ in 0..64 {
            host.step(STEP_MS);
        }
        host.step(STEP_MS);
        let texts: Vec<String> = stage.with_surface(|s| s.texts().map(String::from).collect());
        assert_eq!(texts, vec!["65.00", "1"]);
        assert_eq!(stage.with_surface(|s| s.clears()), 66);
    }

    #[test]
    fn test_input_reaches_render() {
        let host = ManualHost::new(640.0, 480.0, 1.0);
        let stage = stage(&host);
        stage.start();
        host.dispatch(RawEvent::PointerDown {
            button: 0,
            x: 50.0,
            y: 60.0,
        });
        host.dispatch(RawEvent::PointerMove { x: 70.0, y: 80.0 });
        host.dispatch(RawEvent::KeyPress { key: "k".into() });
        host.step(STEP_MS);

        let latest = stage.latest_input().unwrap();
        assert!(latest.dragging);
        assert_eq!(latest.key.as_deref(), Some("k"));

        let commands = stage.with_surface(|s| s.commands().to_vec());
        assert!(commands.contains(&DrawCommand::FillRect {
            rect: Rect::centered(DVec2::new(70.0, 80.0), POINTER_MARKER_PX),
            color: Rgba::BLACK,
        }));
        assert!(stage.with_surface(|s| s.texts().any(|t| t == "k")));
    }

    #[test]
    fn test_marker_at_press_point_before_first_move() {
        let host = ManualHost::new(640.0, 480.0, 1.0);
        let stage = stage(&host);
        stage.start();
        host.dispatch(RawEvent::PointerDown {
            button: 0,
            x: 300.0,
            y: 300.0,
        });
        host.step(STEP_MS);
        let marker = |at: DVec2| DrawCommand::FillRect {
            rect: Rect::centered(at, POINTER_MARKER_PX),
            color: Rgba::BLACK,
        };
        let commands = stage.with_surface(|s| s.commands().to_vec());
        assert!(commands.contains(&marker(DVec2::new(300.0, 300.0))));
        assert!(!commands.contains(&marker(DVec2::ZERO)));

        host.dispatch(RawEvent::PointerMove { x: 320.0, y: 310.0 });
        host.step(STEP_MS);
        let commands = stage.with_surface(|s| s.commands().to_vec());
        assert!(commands.contains(&marker(DVec2::new(320.0, 310.0))));

        host.dispatch(RawEvent::PointerUp {
            button: 0,
            x: 320.0,
            y: 310.0,
        });
        host.step(STEP_MS);
        let rects = stage.with_surface(|s| {
            s.commands()
                .iter()
                .filter(|c| {
                    matches!(c, DrawCommand::FillRect { color, .. } if *color == Rgba::BLACK)
                })
                .count()
        });
        assert_eq!(rects, 0);
    }

    #[test]
    fn test_second_drag_does_not_reuse_old_pointer() {
        let host = ManualHost::new(640.0, 480.0, 1.0);
        let stage = stage(&host);
        stage.start();
        host.dispatch(RawEvent::PointerDown {
            button: 0,
            x: 10.0,
            y: 10.0,
        });
        host.dispatch(RawEvent::PointerMove { x: 50.0, y: 60.0 });
        host.dispatch(RawEvent::PointerUp {
            button: 0,
            x: 50.0,
            y: 60.0,
        });
        host.dispatch(RawEvent::PointerDown {
            button: 0,
            x: 200.0,
            y: 100.0,
        });
        host.step(STEP_MS);
        let commands = stage.with_surface(|s| s.commands().to_vec());
        assert!(commands.contains(&DrawCommand::FillRect {
            rect: Rect::centered(DVec2::new(200.0, 100.0), POINTER_MARKER_PX),
            color: Rgba::BLACK,
        }));
        assert!(!commands.contains(&DrawCommand::FillRect {
            rect: Rect::centered(DVec2::new(50.0, 60.0), POINTER_MARKER_PX),
            color: Rgba::BLACK,
        }));
    }

    #[test]
    fn test_resize_reaches_surface() {
        let host = ManualHost::new(640.0, 480.0, 1.0);
        let stage = stage(&host);
        host.set_viewport(300.0, 200.0, 3.0);
        host.dispatch(RawEvent::Resize);
        assert_eq!(stage.with_surface(|s| s.viewport().physical_size()), (900, 600));
        assert_eq!(stage.viewport().center(), DVec2::new(150.0, 100.0));
    }

    #[test]
    fn test_hud_disabled_draws_only_marker() {
        let host = ManualHost::new(640.0, 480.0, 1.0);
        let stage = Stage::new(
            DisplayList::new(),
            Host::from_shared(host.clone()),
            StageConfig {
                hud: false,
                ..Default::default()
            },
        )
        .unwrap();
        stage.start();
        assert!(stage.with_surface(|s| s.commands().is_empty()));
    }

    #[test]
    fn test_detach_stops_loop_and_input() {
        let host = ManualHost::new(640.0, 480.0, 1.0);
        let stage = stage(&host);
        stage.start();
        stage.detach();
        assert!(!stage.is_running());
        assert_eq!(host.total_listeners(), 0);
        assert_eq!(host.pending_frames(), 0);
        host.dispatch(RawEvent::KeyPress { key: "x".into() });
        assert_eq!(stage.latest_input(), None);
    }

    struct BrokenSurface;

    impl DrawingSurface for BrokenSurface {
        fn resize(&mut self, _viewport: &ViewportState) -> Result<()> {
            Err(Error::ContextUnsupported("2d".into()))
        }

        fn clear(&mut self) -> Result<()> {
            Ok(())
        }

        fn fill_rect(&mut self, _rect: Rect, _color: Rgba) -> Result<()> {
            Ok(())
        }

        fn fill_text(&mut self, _: &str, _: DVec2, _: f64, _: Rgba) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_surface_failure_aborts_construction() {
        let host = ManualHost::new(640.0, 480.0, 1.0);
        let result = Stage::new(
            BrokenSurface,
            Host::from_shared(host.clone()),
            StageConfig::default(),
        );
        assert!(matches!(result, Err(Error::ContextUnsupported(_))));
        assert_eq!(host.total_listeners(), 0);
    }
}
