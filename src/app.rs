//! Application context: owns the scene, camera, animator, picker, render
//! targets, and in-flight loads, and drives one frame per host callback.

use crate::animation::{AnimationStatus, CameraPathAnimator};
use crate::camera::PerspectiveCamera;
use crate::config::{ConfigError, SceneConfig};
use crate::controls::{PickHit, Picker};
use crate::core::{Context, ContextError, RenderInfo, SceneRenderer};
use crate::loaders::{AssetSource, GltfLoader, LoadEvent, LoadTask, Loader, ModelAsset, TextureLoader};
use crate::postprocessing::CrtFilter;
use crate::scene::{Node, NodeId, Scene};
use crate::texture::EquirectImage;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced to hosts.
#[derive(Debug, Error)]
pub enum AppError {
    /// GPU setup failed.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The configuration was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The surface could not provide a frame.
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// Drain a task, logging progress and failures. Returns the asset if it
/// arrived and whether the task is done.
fn drain<T>(task: &mut LoadTask<T>) -> (Option<T>, bool) {
    let mut asset = None;
    while let Some(event) = task.poll() {
        match event {
            LoadEvent::Progress(progress) => match progress.percentage() {
                Some(pct) => log::info!("{}: {}% loaded", task.path(), pct),
                None => log::info!("{}: {} bytes loaded", task.path(), progress.loaded),
            },
            LoadEvent::Loaded(loaded) => asset = Some(loaded),
            LoadEvent::Failed(err) => log::error!("Error loading {}: {}", task.path(), err),
        }
    }
    (asset, task.is_finished())
}

/// Everything except the GPU: scene, camera, animation, input, and loads.
pub struct SceneState {
    config: SceneConfig,
    scene: Scene,
    camera: PerspectiveCamera,
    animator: CameraPathAnimator,
    picker: Picker,
    model_load: Option<LoadTask<ModelAsset>>,
    skybox_load: Option<LoadTask<EquirectImage>>,
    model_root: Option<NodeId>,
    width: u32,
    height: u32,
}

impl SceneState {
    /// Set up lights and camera for a `width`×`height` viewport.
    pub fn new(config: SceneConfig, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let mut scene = Scene::new();
        for (name, light) in ["AmbientLight", "DirectionalLight"].into_iter().zip(config.lights.lights()) {
            scene.add(Node::light(name, light));
        }

        Self {
            camera: config.camera.build(width as f32 / height as f32),
            animator: CameraPathAnimator::from_settings(&config.path),
            picker: Picker::new(config.clickable.clone()),
            config,
            scene,
            model_load: None,
            skybox_load: None,
            model_root: None,
            width,
            height,
        }
    }

    /// Start fetching the model and skybox from `source`.
    pub fn begin_loading(&mut self, source: &dyn AssetSource) {
        log::info!("Loading {} and {}", self.config.assets.model, self.config.assets.skybox);
        self.model_load = Some(GltfLoader::new().load(source, &self.config.assets.model));
        self.skybox_load = Some(TextureLoader::new().load(source, &self.config.assets.skybox));
    }

    /// True while a load is in flight.
    pub fn is_loading(&self) -> bool {
        self.model_load.is_some() || self.skybox_load.is_some()
    }

    /// Apply finished loads to the scene.
    pub fn poll_loads(&mut self) {
        if let Some(task) = self.model_load.as_mut() {
            let (model, done) = drain(task);
            if let Some(model) = model {
                let root = self.scene.root();
                let model_root = model.instantiate(&mut self.scene, root);
                log::info!(
                    "Model '{}' added: {} nodes, {} triangles",
                    model.name,
                    model.nodes.len(),
                    model.triangle_count()
                );
                self.model_root = Some(model_root);
                self.picker.resolve_target(&self.scene);
            }
            if done {
                self.model_load = None;
            }
        }

        if let Some(task) = self.skybox_load.as_mut() {
            let (image, done) = drain(task);
            if let Some(image) = image {
                log::info!("Skybox loaded: {}x{}", image.width(), image.height());
                let image = Arc::new(image);
                self.scene.set_background(Some(Arc::clone(&image)));
                self.scene.set_environment(Some(image));
            }
            if done {
                self.skybox_load = None;
            }
        }
    }

    /// Advance the fly-through by one step and refresh world matrices.
    pub fn update(&mut self) {
        self.animator.update(&mut self.camera);
        self.scene.update_matrix_world();
    }

    /// Track a new viewport size. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.width = width;
        self.height = height;
        self.camera.set_viewport(width, height);
        true
    }

    /// Pointer moved, in client pixels.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.picker.pointer_move(x, y, self.width as f32, self.height as f32);
    }

    /// Pointer clicked, in client pixels.
    pub fn click(&mut self, x: f32, y: f32) -> Option<PickHit> {
        self.picker.click(
            x,
            y,
            self.width as f32,
            self.height as f32,
            &mut self.scene,
            &self.camera,
            &mut self.animator,
        )
    }

    /// Play the fly-through again from the start.
    pub fn restart_animation(&mut self) {
        self.animator.restart();
    }

    /// Fly-through status.
    pub fn status(&self) -> AnimationStatus {
        self.animator.status()
    }

    /// Configuration in use.
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// The scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The scene, mutably.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// The camera.
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// The animator.
    pub fn animator(&self) -> &CameraPathAnimator {
        &self.animator
    }

    /// The picker, for designating the clickable mesh by ID.
    pub fn picker_mut(&mut self) -> &mut Picker {
        &mut self.picker
    }

    /// Root group of the loaded model.
    pub fn model_root(&self) -> Option<NodeId> {
        self.model_root
    }

    /// Viewport size.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// The running application bound to a display surface.
pub struct App {
    context: Context,
    renderer: SceneRenderer,
    filter: CrtFilter,
    state: SceneState,
}

impl App {
    /// Create the GPU context for `target` and start loading assets.
    pub async fn new<W>(
        target: W,
        width: u32,
        height: u32,
        config: SceneConfig,
        source: &dyn AssetSource,
    ) -> Result<Self, AppError>
    where
        W: Into<wgpu::SurfaceTarget<'static>>,
    {
        let context = Context::new(target, width, height, &config.render).await?;
        let (width, height) = (context.width(), context.height());
        let format = context.surface_format();

        let renderer = SceneRenderer::new(
            &context.device,
            &context.queue,
            format,
            context.depth_format,
            width,
            height,
            &config.render,
        );
        let filter = CrtFilter::new(&context.device, format, width, height, config.crt, config.time_step);

        let mut state = SceneState::new(config, width, height);
        state.begin_loading(source);

        Ok(Self {
            context,
            renderer,
            filter,
            state,
        })
    }

    /// Poll loads, advance the animation, and present one frame.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn frame(&mut self) -> Result<RenderInfo, AppError> {
        self.state.poll_loads();
        self.state.update();

        let output = match self.context.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated; reconfiguring");
                self.context.reconfigure();
                return Ok(RenderInfo::default());
            }
            Err(err) => return Err(err.into()),
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.context.create_command_encoder();
        let info = self.filter.render(
            &self.context.device,
            &self.context.queue,
            &mut encoder,
            &mut self.renderer,
            &self.state.scene,
            &self.state.camera,
            &view,
        );
        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(info)
    }

    /// Resize the surface, depth buffer, offscreen buffer, and camera.
    /// Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.state.resize(width, height) {
            return;
        }
        self.context.resize(width, height);
        self.renderer.resize(&self.context.device, width, height);
        self.filter.resize(&self.context.device, width, height);
    }

    /// Application state.
    pub fn state(&self) -> &SceneState {
        &self.state
    }

    /// Application state, mutably.
    pub fn state_mut(&mut self) -> &mut SceneState {
        &mut self.state
    }

    /// The CRT filter.
    pub fn filter(&self) -> &CrtFilter {
        &self.filter
    }

    /// The CRT filter, mutably.
    pub fn filter_mut(&mut self) -> &mut CrtFilter {
        &mut self.filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationState;
    use crate::config::CameraSettings;
    use crate::loaders::{MemorySource, TRIANGLE_GLTF};
    use std::io::Cursor;

    fn skybox_png() -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(4, 2, image::Rgba([20, 40, 80, 255]));
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png).unwrap();
        bytes
    }

    fn config() -> SceneConfig {
        SceneConfig {
            camera: CameraSettings {
                position: [1.3, 0.3, 5.0],
                yaw: 0.0,
                ..Default::default()
            },
            clickable: Some("Screen".to_string()),
            ..Default::default()
        }
    }

    fn loaded_state() -> SceneState {
        let config = config();
        let source = MemorySource::new()
            .with(config.assets.model.clone(), TRIANGLE_GLTF.as_bytes().to_vec())
            .with(config.assets.skybox.clone(), skybox_png());

        let mut state = SceneState::new(config, 800, 600);
        state.begin_loading(&source);
        state.poll_loads();
        state
    }

    #[test]
    fn test_lights_present_from_start() {
        let state = SceneState::new(SceneConfig::default(), 800, 600);
        assert_eq!(state.scene().lights().count(), 2);
        assert_eq!(state.camera().position, crate::math::Vec3::new(-200.0, 50.0, 0.0));
    }

    #[test]
    fn test_loads_populate_scene() {
        let state = loaded_state();
        assert!(!state.is_loading());
        assert!(state.model_root().is_some());
        assert!(state.scene().find_by_name("Screen").is_some());
        assert!(state.scene().background().is_some());
        assert!(state.scene().environment().is_some());
    }

    #[test]
    fn test_update_applies_model_transforms() {
        let mut state = loaded_state();
        state.update();

        let meshes = state.scene().meshes();
        assert_eq!(meshes.len(), 1);
        let origin = meshes[0].2.transform_point3(crate::math::Vec3::ZERO);
        assert!(origin.abs_diff_eq(crate::math::Vec3::X, 1e-6));
    }

    #[test]
    fn test_multi_primitive_clickable_is_clickable() {
        let config = config();
        let primitive = r#"{ "attributes": { "POSITION": 0 }, "material": 0 }"#;
        let model = TRIANGLE_GLTF.replace(primitive, &format!("{primitive}, {primitive}"));
        let source = MemorySource::new().with(config.assets.model.clone(), model.into_bytes());

        let mut state = SceneState::new(config, 800, 600);
        state.begin_loading(&source);
        state.poll_loads();

        let screen = state.scene().find_by_name("Screen").unwrap();
        assert!(state.scene().node(screen).unwrap().as_mesh().is_none());
        assert_eq!(state.scene().meshes_under(screen).len(), 2);

        assert!(state.click(400.0, 300.0).is_some());
        assert_eq!(state.animator().state(), AnimationState::Animating);
    }

    #[test]
    fn test_missing_assets_leave_scene_untouched() {
        let mut state = SceneState::new(config(), 800, 600);
        let before = state.scene().len();
        state.begin_loading(&MemorySource::new());
        state.poll_loads();

        assert!(!state.is_loading());
        assert_eq!(state.scene().len(), before);
        assert!(state.model_root().is_none());
        assert!(state.scene().background().is_none());
        assert!(state.click(400.0, 300.0).is_none());
    }

    #[test]
    fn test_click_runs_fly_through_to_completion() {
        let mut state = loaded_state();
        state.pointer_move(10.0, 10.0);
        assert!(state.click(400.0, 300.0).is_some());
        assert_eq!(state.animator().state(), AnimationState::Animating);

        let mut last = state.status().progress_percent;
        let mut updates = 0;
        while state.status().is_animating && updates < 10_000 {
            state.update();
            let progress = state.status().progress_percent;
            assert!(progress >= last);
            last = progress;
            updates += 1;
        }

        let status = state.status();
        assert!(status.has_completed);
        assert_eq!(status.progress_percent, 100.0);
        assert_eq!(state.camera().position, state.animator().curve().end());

        state.restart_animation();
        assert!(state.status().is_animating);
        assert_eq!(state.status().progress_percent, 0.0);
    }

    #[test]
    fn test_resize_updates_camera_and_ignores_zero() {
        let mut state = SceneState::new(SceneConfig::default(), 800, 600);
        assert!(state.resize(1000, 500));
        assert_eq!(state.size(), (1000, 500));
        assert_eq!(state.camera().aspect, 2.0);

        assert!(!state.resize(0, 500));
        assert_eq!(state.size(), (1000, 500));
    }
}
