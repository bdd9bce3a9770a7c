//! Drawing surface contract and an in-memory display list implementation.

use glam::DVec2;

use crate::error::Result;
use crate::input::ViewportState;

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const BLACK: Rgba = Rgba(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba(255, 255, 255, 255);
    pub const RED: Rgba = Rgba(255, 0, 0, 255);

    /// CSS `rgba(...)` notation.
    pub fn css(&self) -> String {
        format!(
            "rgba({}, {}, {}, {})",
            self.0,
            self.1,
            self.2,
            f64::from(self.3) / 255.0
        )
    }
}

/// Axis-aligned rectangle in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub origin: DVec2,
    pub size: DVec2,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: DVec2::new(x, y),
            size: DVec2::new(width, height),
        }
    }

    /// Square of side `size` centered on `center`.
    pub fn centered(center: DVec2, size: f64) -> Self {
        Self {
            origin: center - DVec2::splat(size / 2.0),
            size: DVec2::splat(size),
        }
    }

    pub fn contains(&self, point: DVec2) -> bool {
        let max = self.origin + self.size;
        point.x >= self.origin.x && point.y >= self.origin.y && point.x <= max.x && point.y <= max.y
    }
}

/// What the render step draws on. Coordinates are logical pixels; the
/// surface applies the device pixel ratio itself.
pub trait DrawingSurface {
    /// Match the backing store to the viewport (logical size x pixel ratio).
    fn resize(&mut self, viewport: &ViewportState) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
    fn fill_rect(&mut self, rect: Rect, color: Rgba) -> Result<()>;
    /// Draw `text` with its baseline-left corner at `origin`.
    fn fill_text(&mut self, text: &str, origin: DVec2, size_px: f64, color: Rgba) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect {
        rect: Rect,
        color: Rgba,
    },
    FillText {
        text: String,
        origin: DVec2,
        size_px: f64,
        color: Rgba,
    },
}

/// Surface that records the draw calls of the current frame.
///
/// `clear` starts a new frame. Used by the terminal front end, which
/// rasterizes the list itself, and by tests.
#[derive(Debug, Default)]
pub struct DisplayList {
    viewport: ViewportState,
    commands: Vec<DrawCommand>,
    clears: u64,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    /// Number of frames started (clears) so far.
    pub fn clears(&self) -> u64 {
        self.clears
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::FillText { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl DrawingSurface for DisplayList {
    fn resize(&mut self, viewport: &ViewportState) -> Result<()> {
        self.viewport = *viewport;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.commands.clear();
        self.clears += 1;
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) -> Result<()> {
        self.commands.push(DrawCommand::FillRect { rect, color });
        Ok(())
    }

    fn fill_text(&mut self, text: &str, origin: DVec2, size_px: f64, color: Rgba) -> Result<()> {
        self.commands.push(DrawCommand::FillText {
            text: text.to_owned(),
            origin,
            size_px,
            color,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_color() {
        assert_eq!(Rgba::RED.css(), "rgba(255, 0, 0, 1)");
        assert_eq!(Rgba(0, 0, 0, 0).css(), "rgba(0, 0, 0, 0)");
    }

    #[test]
    fn test_rect_centered_and_contains() {
        let rect = Rect::centered(DVec2::new(10.0, 10.0), 4.0);
        assert_eq!(rect.origin, DVec2::new(8.0, 8.0));
        assert!(rect.contains(DVec2::new(12.0, 12.0)));
        assert!(!rect.contains(DVec2::new(12.5, 10.0)));
    }

    #[test]
    fn test_display_list_clear_starts_frame() {
        let mut list = DisplayList::new();
        list.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Rgba::RED).unwrap();
        list.fill_text("hi", DVec2::ZERO, 12.0, Rgba::BLACK).unwrap();
        assert_eq!(list.commands().len(), 2);
        assert_eq!(list.texts().collect::<Vec<_>>(), vec!["hi"]);
        list.clear().unwrap();
        assert!(list.commands().is_empty());
        assert_eq!(list.clears(), 1);
    }

    #[test]
    fn test_display_list_tracks_viewport() {
        let mut list = DisplayList::new();
        list.resize(&ViewportState::new(320.0, 200.0, 2.0)).unwrap();
        assert_eq!(list.viewport().physical_size(), (640, 400));
    }
}
