//! Web bindings for the CRT scene.
//!
//! This module provides JavaScript-friendly APIs via wasm-bindgen. The page
//! drives [`CrtSceneApp::frame`] from `requestAnimationFrame` and forwards
//! pointer and resize events in CSS pixels.

use wasm_bindgen::prelude::*;
use web_sys::{window, HtmlCanvasElement};

use crate::app::App;
use crate::config::SceneConfig;
use crate::loaders::FetchSource;

/// Render statistics exposed to JavaScript.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy)]
pub struct RenderStats {
    /// Number of draw calls.
    pub draw_calls: u32,
    /// Number of triangles rendered.
    pub triangles: u32,
    /// Current frame number.
    pub frame: u64,
}

/// The CRT scene application for web environments.
#[wasm_bindgen]
pub struct CrtSceneApp {
    app: App,
    stats: RenderStats,
}

#[wasm_bindgen]
impl CrtSceneApp {
    /// Create the application on the canvas with id `canvas_id`.
    ///
    /// `config_json` is an optional `SceneConfig` document; omitted fields
    /// take their defaults.
    #[wasm_bindgen]
    pub async fn new(canvas_id: &str, config_json: Option<String>) -> Result<CrtSceneApp, JsValue> {
        init_logging();

        let window = window().ok_or_else(|| JsValue::from_str("No window object"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("No document"))?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("Canvas '{}' not found", canvas_id)))?
            .dyn_into()
            .map_err(|_| JsValue::from_str("Element is not a canvas"))?;

        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let config = match config_json {
            Some(json) => SceneConfig::from_json_str(&json).map_err(to_js)?,
            None => SceneConfig::default(),
        };
        let source = FetchSource::new(config.assets.base_path.clone());

        let app = App::new(wgpu::SurfaceTarget::Canvas(canvas), width, height, config, &source)
            .await
            .map_err(to_js)?;

        log::info!("CRT scene ready ({}x{})", width, height);

        Ok(Self {
            app,
            stats: RenderStats {
                draw_calls: 0,
                triangles: 0,
                frame: 0,
            },
        })
    }

    /// Render one frame.
    #[wasm_bindgen]
    pub fn frame(&mut self) -> Result<(), JsValue> {
        let info = self.app.frame().map_err(to_js)?;
        self.stats = RenderStats {
            draw_calls: info.draw_calls,
            triangles: info.triangles,
            frame: info.frame,
        };
        Ok(())
    }

    /// Resize to `width` x `height` CSS pixels.
    #[wasm_bindgen]
    pub fn resize(&mut self, width: u32, height: u32) {
        let dpr = device_pixel_ratio();
        let width = (width as f64 * dpr) as u32;
        let height = (height as f64 * dpr) as u32;
        self.app.resize(width, height);
    }

    /// Pointer moved to client position (`x`, `y`) in CSS pixels.
    #[wasm_bindgen]
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        let dpr = device_pixel_ratio() as f32;
        self.app.state_mut().pointer_move(x * dpr, y * dpr);
    }

    /// Click at client position (`x`, `y`) in CSS pixels. Returns whether
    /// the clickable object was hit.
    #[wasm_bindgen]
    pub fn on_click(&mut self, x: f32, y: f32) -> bool {
        let dpr = device_pixel_ratio() as f32;
        self.app.state_mut().click(x * dpr, y * dpr).is_some()
    }

    /// Reset the fly-through and start it again.
    #[wasm_bindgen]
    pub fn restart_animation(&mut self) {
        self.app.state_mut().restart_animation();
    }

    /// Fly-through progress in percent.
    #[wasm_bindgen]
    pub fn animation_progress(&self) -> f32 {
        self.app.state().status().progress_percent
    }

    /// Whether the fly-through is running.
    #[wasm_bindgen]
    pub fn is_animating(&self) -> bool {
        self.app.state().status().is_animating
    }

    /// Whether the fly-through has finished.
    #[wasm_bindgen]
    pub fn has_completed(&self) -> bool {
        self.app.state().status().has_completed
    }

    /// Turn the CRT filter on or off.
    #[wasm_bindgen]
    pub fn set_crt_enabled(&mut self, enabled: bool) {
        self.app.filter_mut().set_enabled(enabled);
    }

    /// Whether the model or skybox is still loading.
    #[wasm_bindgen]
    pub fn is_loading(&self) -> bool {
        self.app.state().is_loading()
    }

    /// Statistics from the last rendered frame.
    #[wasm_bindgen]
    pub fn stats(&self) -> RenderStats {
        self.stats
    }
}

fn device_pixel_ratio() -> f64 {
    window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0)
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            log::Level::Debug => web_sys::console::log_1(&line),
            log::Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

/// Route `log` records to the browser console. Safe to call repeatedly.
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }
}
