use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::state::{LogBuffer, LogLine};

pub fn render(frame: &mut Frame, log: &LogBuffer, area: Rect, title: &str) {
    let height = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = log.visible(height).iter().map(format_line).collect();

    let hint = if log.auto_scroll { "" } else { " [scrolled] " };
    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_bottom(Line::from(hint).right_aligned())
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(widget, area);
}

fn format_line(line: &LogLine) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            line.timestamp.format("%H:%M:%S%.3f ").to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(format!("{:<5} ", line.level), level_style(line.level)),
        Span::raw(line.text.clone()),
    ])
}

fn level_style(level: log::Level) -> Style {
    match level {
        log::Level::Error => Style::default().fg(Color::Red).bold(),
        log::Level::Warn => Style::default().fg(Color::Yellow),
        log::Level::Info => Style::default().fg(Color::Green),
        log::Level::Debug | log::Level::Trace => Style::default().fg(Color::DarkGray),
    }
}
