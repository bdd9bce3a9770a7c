use wasm_bindgen::prelude::*;

use canvasloop_core::{Host, InputConfig, Stage, StageConfig};

use crate::browser::BrowserHost;
use crate::canvas::CanvasSurface;

fn to_js(err: canvasloop_core::Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// A canvas driven by browser input and `requestAnimationFrame`.
#[wasm_bindgen]
pub struct App {
    stage: Stage<CanvasSurface>,
}

impl App {
    fn build(canvas_id: &str, config: StageConfig) -> Result<App, JsValue> {
        let host = BrowserHost::new().map_err(to_js)?;
        let document = host.window().document().ok_or("No document")?;
        let surface = CanvasSurface::from_element_id(&document, canvas_id).map_err(to_js)?;
        let stage = Stage::new(surface, Host::from_shared(host), config).map_err(to_js)?;
        Ok(App { stage })
    }
}

#[wasm_bindgen]
impl App {
    /// Bind to the `<canvas>` with the given id using default smoothing.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<App, JsValue> {
        Self::build(canvas_id, StageConfig::default())
    }

    /// Bind to the `<canvas>` with explicit smoothing coefficients.
    #[wasm_bindgen(js_name = withOptions)]
    pub fn with_options(
        canvas_id: &str,
        scroll_smoothing: f64,
        drag_smoothing: f64,
        hud: bool,
    ) -> Result<App, JsValue> {
        Self::build(
            canvas_id,
            StageConfig {
                input: InputConfig {
                    scroll_smoothing,
                    drag_smoothing,
                },
                hud,
            },
        )
    }

    pub fn start(&self) {
        self.stage.start();
    }

    pub fn stop(&self) {
        self.stage.stop();
    }

    /// Rolling frames-per-second average.
    #[wasm_bindgen(js_name = getFPS)]
    pub fn fps(&self) -> f64 {
        self.stage.fps()
    }

    #[wasm_bindgen(getter)]
    pub fn running(&self) -> bool {
        self.stage.is_running()
    }

    /// Stop the loop and remove every DOM listener.
    pub fn dispose(&self) {
        self.stage.detach();
    }
}
