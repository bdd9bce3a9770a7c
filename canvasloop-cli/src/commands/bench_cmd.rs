use std::f64::consts::TAU;

use glam::DVec2;

use canvasloop_core::{
    DisplayList, Host, InputState, ManualHost, RawEvent, Stage, PRIMARY_BUTTON,
};

use crate::config::CliConfig;

const BENCH_WIDTH: f64 = 1280.0;
const BENCH_HEIGHT: f64 = 720.0;
const DRAG_RADIUS: f64 = 120.0;

/// Outcome of a headless run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchReport {
    pub frames: u64,
    pub simulated_secs: f64,
    /// FPS of every window that closed, in order.
    pub windows: Vec<f64>,
    pub final_fps: f64,
    /// Input as the last rendered frame saw it.
    pub last_input: Option<InputState>,
}

pub fn run(config: CliConfig, frames: u32, frame_ms: f64, drag: bool) -> anyhow::Result<()> {
    let report = simulate(config, frames, frame_ms, drag)?;

    for (i, fps) in report.windows.iter().enumerate() {
        println!("window {:>3}: {fps:>8.2} fps", i + 1);
    }
    println!(
        "{} frames over {:.3}s simulated, rolling average {:.2} fps",
        report.frames, report.simulated_secs, report.final_fps
    );
    if let Some(input) = report.last_input.as_ref().filter(|i| i.dragging) {
        let movement = input.movement();
        println!(
            "pointer ({:.1}, {:.1}), smoothed movement ({:.2}, {:.2})",
            input.pointer_x, input.pointer_y, movement.x, movement.y
        );
    }
    Ok(())
}

/// Run `frames` frames on a [`ManualHost`], advancing its clock by
/// `frame_ms` before every repaint. With `drag`, the primary button is held
/// while the pointer circles the viewport center.
pub fn simulate(
    config: CliConfig,
    frames: u32,
    frame_ms: f64,
    drag: bool,
) -> anyhow::Result<BenchReport> {
    if frames == 0 {
        anyhow::bail!("--frames must be at least 1");
    }
    if !frame_ms.is_finite() || frame_ms <= 0.0 {
        anyhow::bail!("--frame-ms must be a positive number of milliseconds, got {frame_ms}");
    }

    let host = ManualHost::new(BENCH_WIDTH, BENCH_HEIGHT, 1.0);
    let stage = Stage::new(
        DisplayList::new(),
        Host::from_shared(host.clone()),
        config.stage,
    )?;
    let center = stage.viewport().center();
    let orbit = |i: u32| {
        let angle = f64::from(i) / f64::from(frames) * TAU;
        center + DVec2::from_angle(angle) * DRAG_RADIUS
    };

    if drag {
        let start = orbit(0);
        host.dispatch(RawEvent::PointerDown {
            button: PRIMARY_BUTTON,
            x: start.x,
            y: start.y,
        });
    }

    stage.start();
    let mut windows = Vec::new();
    for i in 1..frames {
        if drag {
            let p = orbit(i);
            host.dispatch(RawEvent::PointerMove { x: p.x, y: p.y });
        }
        let closed = stage.fps_windows();
        host.step(frame_ms);
        if stage.fps_windows() > closed {
            windows.push(stage.fps());
            log::info!("fps window {}: {:.2}", windows.len(), stage.fps());
        }
    }

    let last_input = stage.latest_input();
    if drag {
        let end = orbit(frames);
        host.dispatch(RawEvent::PointerUp {
            button: PRIMARY_BUTTON,
            x: end.x,
            y: end.y,
        });
    }
    stage.detach();

    Ok(BenchReport {
        frames: stage.frame_index(),
        simulated_secs: f64::from(frames - 1) * frame_ms / 1000.0,
        windows,
        final_fps: stage.fps(),
        last_input,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_exact_window() {
        let report = simulate(CliConfig::default(), 65, 15.625, false).unwrap();
        assert_eq!(report.frames, 65);
        assert_eq!(report.windows, vec![65.0]);
        assert_eq!(report.final_fps, 65.0);
        assert_eq!(report.simulated_secs, 1.0);
        assert_eq!(report.last_input, None);
    }

    #[test]
    fn test_steady_sixteen_ms() {
        let report = simulate(CliConfig::default(), 300, 16.0, false).unwrap();
        assert_eq!(report.frames, 300);
        assert_eq!(report.windows.len(), 4);
        // The first window also counts the frame run by start().
        assert!(approx_eq(report.windows[0], 64.0 / 1.008));
        for fps in &report.windows[1..] {
            assert!(approx_eq(*fps, 62.5));
        }
    }

    #[test]
    fn test_no_window_before_one_second() {
        let report = simulate(CliConfig::default(), 10, 16.0, false).unwrap();
        assert!(report.windows.is_empty());
        assert_eq!(report.final_fps, 0.0);
    }

    #[test]
    fn test_drag_reaches_input() {
        let report = simulate(CliConfig::default(), 120, 16.0, true).unwrap();
        let input = report.last_input.unwrap();
        assert!(input.dragging);
        assert_eq!(input.button, Some(PRIMARY_BUTTON));
        assert!(input.movement().length() > 0.0);
        let center = DVec2::new(BENCH_WIDTH / 2.0, BENCH_HEIGHT / 2.0);
        assert!(approx_eq(input.pointer().distance(center), DRAG_RADIUS));
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(simulate(CliConfig::default(), 0, 16.0, false).is_err());
        assert!(simulate(CliConfig::default(), 10, 0.0, false).is_err());
        assert!(simulate(CliConfig::default(), 10, f64::NAN, false).is_err());
    }
}
