//! canvasloop WASM web runtime
//!
//! Binds the core render loop to the browser: window events feed the input
//! aggregator, `requestAnimationFrame` paces the frame scheduler and a
//! `<canvas>` 2D context is the drawing surface.

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod browser;
#[cfg(target_arch = "wasm32")]
mod canvas;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
pub use app::App;

/// Entry point, called when the WASM module loads.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).expect("Failed to init logger");
    log::info!("canvasloop web runtime initialized");
}

/// Create an app on the canvas with the given id and start its loop.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn create_app(canvas_id: &str) -> Result<App, JsValue> {
    let app = App::new(canvas_id)?;
    app.start();
    Ok(app)
}
