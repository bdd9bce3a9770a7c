//! Rasterizes the stage's display list onto a braille canvas.

use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Context, Rectangle};
use ratatui::widgets::{Block, Borders};

use canvasloop_core::{DisplayList, DrawCommand, DrawingSurface, Rgba, Stage};

/// What the pane title shows about the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub running: bool,
    pub fps: f64,
    pub frame_index: u64,
    pub dragging: bool,
}

impl Status {
    pub fn of<S: DrawingSurface>(stage: &Stage<S>) -> Self {
        Self {
            running: stage.is_running(),
            fps: stage.fps(),
            frame_index: stage.frame_index(),
            dragging: stage.latest_input().is_some_and(|i| i.dragging),
        }
    }

    fn title(&self) -> String {
        let state = if self.running { "running" } else { "stopped" };
        let drag = if self.dragging { " | dragging" } else { "" };
        format!(
            " canvasloop | {state} | {:.2} fps | frame {}{drag} ",
            self.fps, self.frame_index
        )
    }
}

pub fn render(frame: &mut Frame, list: &DisplayList, status: &Status, area: Rect) {
    let viewport = list.viewport();
    let height = viewport.height();
    let border = if status.running {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(status.title())
                .border_style(Style::default().fg(border)),
        )
        .marker(Marker::Braille)
        .x_bounds([0.0, viewport.width()])
        .y_bounds([0.0, height])
        .paint(|ctx| paint(ctx, list.commands(), height));
    frame.render_widget(canvas, area);
}

/// Canvas y grows upward; surface y grows downward.
fn paint(ctx: &mut Context, commands: &[DrawCommand], height: f64) {
    for command in commands {
        match command {
            DrawCommand::FillRect { rect, color } => ctx.draw(&Rectangle {
                x: rect.origin.x,
                y: height - rect.origin.y - rect.size.y,
                width: rect.size.x,
                height: rect.size.y,
                color: terminal_color(*color),
            }),
            DrawCommand::FillText {
                text,
                origin,
                color,
                ..
            } => ctx.print(
                origin.x,
                height - origin.y,
                Line::styled(text.clone(), Style::default().fg(terminal_color(*color))),
            ),
        }
    }
}

/// Black ink uses the terminal's own foreground so it stays readable on
/// dark themes.
fn terminal_color(color: Rgba) -> Color {
    if color == Rgba::BLACK {
        Color::Reset
    } else {
        Color::Rgb(color.0, color.1, color.2)
    }
}
