pub mod canvas_view;
pub mod log_panel;

use std::sync::Mutex;

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use canvasloop_core::{DisplayList, Stage};

use crate::state::{LogBuffer, ViewState};
use crate::terminal_host::LOG_PANEL_ROWS;

pub fn render(
    frame: &mut Frame,
    stage: &Stage<DisplayList>,
    view: &ViewState,
    log: &Mutex<LogBuffer>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(LOG_PANEL_ROWS)])
        .split(frame.area());

    let status = canvas_view::Status::of(stage);
    stage.with_surface(|list| canvas_view::render(frame, list, &status, chunks[0]));

    if let Ok(log) = log.lock() {
        log_panel::render(frame, &log, chunks[1], " Log ");
    }

    if view.show_help {
        render_help(frame);
    }
}

fn render_help(frame: &mut Frame) {
    let lines = vec![
        Line::styled("Keys", Style::default().bold().fg(Color::Cyan)),
        Line::raw(""),
        Line::raw("[drag]      Move the pointer marker"),
        Line::raw("[F2]        Start/stop the frame loop"),
        Line::raw("[PgUp/PgDn] Scroll the log"),
        Line::raw("[Home/End]  Log top/bottom"),
        Line::raw("[F1]        Toggle this help"),
        Line::raw("[Esc/^C]    Quit"),
    ];
    let area = centered(frame.area(), 40, lines.len() as u16 + 2);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .border_style(Style::default().fg(Color::Cyan)),
        ),
        area,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
