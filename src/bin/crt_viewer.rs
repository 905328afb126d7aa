//! Native viewer for the CRT scene.
//!
//! Usage: `crt-viewer [config.json]`. `R` restarts the fly-through, `C`
//! toggles the CRT filter, and `Esc` quits.

use std::sync::Arc;

use crt_scene::app::App;
use crt_scene::config::SceneConfig;
use crt_scene::loaders::FileSource;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

struct Viewer {
    config: SceneConfig,
    window: Option<Arc<Window>>,
    app: Option<App>,
    cursor: (f32, f32),
}

impl Viewer {
    fn new(config: SceneConfig) -> Self {
        Self {
            config,
            window: None,
            app: None,
            cursor: (0.0, 0.0),
        }
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title("CRT Scene")
            .with_inner_size(PhysicalSize::new(1280u32, 720u32))
            .with_resizable(true);

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        let size = window.inner_size();
        let source = FileSource::new(self.config.assets.base_path.clone());
        let app = pollster::block_on(App::new(
            window.clone(),
            size.width.max(1),
            size.height.max(1),
            self.config.clone(),
            &source,
        ))
        .expect("Failed to initialize renderer");

        window.request_redraw();
        self.app = Some(app);
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(app) = self.app.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => app.resize(size.width, size.height),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as f32, position.y as f32);
                app.state_mut().pointer_move(self.cursor.0, self.cursor.1);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(hit) = app.state_mut().click(self.cursor.0, self.cursor.1) {
                    log::debug!("Clicked node {:?} at distance {:.2}", hit.node, hit.distance);
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
                    PhysicalKey::Code(KeyCode::KeyR) => app.state_mut().restart_animation(),
                    PhysicalKey::Code(KeyCode::KeyC) => {
                        let enabled = app.filter().enabled();
                        app.filter_mut().set_enabled(!enabled);
                    }
                    _ => {}
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = app.frame() {
                    log::error!("Frame failed: {err}");
                    event_loop.exit();
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => SceneConfig::from_file(&path).unwrap_or_else(|err| {
            log::error!("{err}; using defaults");
            SceneConfig::default()
        }),
        None => SceneConfig::default(),
    };

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut viewer = Viewer::new(config);
    if let Err(err) = event_loop.run_app(&mut viewer) {
        log::error!("Event loop error: {err}");
    }
}
