use glam::DVec2;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use canvasloop_core::{DrawingSurface, Error, Rect, Result, Rgba, ViewportState};

use crate::browser::js_error;

/// A `<canvas>` element with its 2D context.
///
/// Drawing happens in logical pixels; the context transform is reset to the
/// device pixel ratio at every clear.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    pen: CanvasRenderingContext2d,
    viewport: ViewportState,
}

impl CanvasSurface {
    pub fn from_element_id(document: &Document, id: &str) -> Result<Self> {
        let canvas = document
            .get_element_by_id(id)
            .ok_or_else(|| Error::SurfaceMissing(format!("#{id}")))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| Error::SurfaceMissing(format!("#{id} is not a canvas")))?;

        let pen = canvas
            .get_context("2d")
            .map_err(js_error)?
            .ok_or_else(|| Error::ContextUnsupported("2d".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| Error::ContextUnsupported("2d".into()))?;

        Ok(Self {
            canvas,
            pen,
            viewport: ViewportState::default(),
        })
    }
}

fn draw_error(err: wasm_bindgen::JsValue) -> Error {
    Error::Draw(format!("{err:?}"))
}

impl DrawingSurface for CanvasSurface {
    fn resize(&mut self, viewport: &ViewportState) -> Result<()> {
        let style = self.canvas.style();
        style
            .set_property("width", &format!("{}px", viewport.width()))
            .map_err(js_error)?;
        style
            .set_property("height", &format!("{}px", viewport.height()))
            .map_err(js_error)?;

        let (width, height) = viewport.physical_size();
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.viewport = *viewport;
        log::debug!("canvas resized to {width}x{height}");
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let ratio = self.viewport.pixel_ratio();
        self.pen
            .set_transform(ratio, 0.0, 0.0, ratio, 0.0, 0.0)
            .map_err(draw_error)?;
        self.pen
            .clear_rect(0.0, 0.0, self.viewport.width(), self.viewport.height());
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) -> Result<()> {
        self.pen.set_fill_style_str(&color.css());
        self.pen
            .fill_rect(rect.origin.x, rect.origin.y, rect.size.x, rect.size.y);
        Ok(())
    }

    fn fill_text(&mut self, text: &str, origin: DVec2, size_px: f64, color: Rgba) -> Result<()> {
        self.pen.set_font(&format!("{size_px}px Arial"));
        self.pen.set_fill_style_str(&color.css());
        self.pen
            .fill_text(text, origin.x, origin.y)
            .map_err(draw_error)
    }
}
