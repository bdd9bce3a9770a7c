use chrono::{DateTime, Local};

// ─── Log Buffer ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LogLine {
    pub timestamp: DateTime<Local>,
    pub level: log::Level,
    pub text: String,
}

pub struct LogBuffer {
    pub lines: Vec<LogLine>,
    pub scroll_offset: usize,
    pub auto_scroll: bool,
    max_lines: usize,
}

impl LogBuffer {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: Vec::new(),
            scroll_offset: 0,
            auto_scroll: true,
            max_lines: max_lines.max(1),
        }
    }

    pub fn push(&mut self, text: String, level: log::Level) {
        if self.lines.len() >= self.max_lines {
            self.lines.remove(0);
            self.scroll_offset = self.scroll_offset.saturating_sub(1);
        }
        self.lines.push(LogLine {
            timestamp: chrono::Local::now(),
            level,
            text,
        });
        if self.auto_scroll {
            self.scroll_to_bottom();
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.lines.len().saturating_sub(1);
        self.auto_scroll = true;
    }

    pub fn scroll_up(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
        self.auto_scroll = false;
    }

    pub fn scroll_down(&mut self, amount: usize) {
        self.scroll_offset = (self.scroll_offset + amount).min(self.lines.len().saturating_sub(1));
        if self.scroll_offset >= self.lines.len().saturating_sub(1) {
            self.auto_scroll = true;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
        self.auto_scroll = false;
    }

    /// The `height` lines ending at the scroll offset.
    pub fn visible(&self, height: usize) -> &[LogLine] {
        if self.lines.is_empty() || height == 0 {
            return &[];
        }
        let end = (self.scroll_offset + 1).min(self.lines.len());
        &self.lines[end.saturating_sub(height)..end]
    }
}

// ─── View State ──────────────────────────────────────────────────────

/// Terminal-only state that the render loop knows nothing about.
#[derive(Debug, Default)]
pub struct ViewState {
    pub show_help: bool,
    pub should_quit: bool,
}
