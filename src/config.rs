//! Scene configuration loaded from JSON.

use crate::animation::PathSettings;
use crate::camera::PerspectiveCamera;
use crate::core::{RenderConfig, TimeStep};
use crate::light::{color_from_hex, AmbientLight, DirectionalLight, Light};
use crate::math::Vec3;
use crate::postprocessing::CrtSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reading a [`SceneConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON was malformed or had wrong field types.
    #[error("invalid scene config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Where the model and skybox come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    /// Directory or URL prefix the other paths are relative to.
    pub base_path: String,
    /// Binary glTF model.
    pub model: String,
    /// Equirectangular skybox image.
    pub skybox: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            model: "3DModels/3dScene.glb".to_string(),
            skybox: "textures/SkyBox.jpg".to_string(),
        }
    }
}

/// Initial camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Near plane.
    pub near: f32,
    /// Far plane.
    pub far: f32,
    /// Start position.
    pub position: [f32; 3],
    /// Start rotation about the Y axis, in radians.
    pub yaw: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            position: [-200.0, 50.0, 0.0],
            yaw: -1.6,
        }
    }
}

impl CameraSettings {
    /// Build the camera for a viewport aspect ratio.
    pub fn build(&self, aspect: f32) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(self.fov, aspect, self.near, self.far);
        camera.set_position(Vec3::from(self.position));
        camera.set_yaw(self.yaw);
        camera
    }
}

/// Ambient plus one directional light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    /// Ambient color as `0xRRGGBB`.
    pub ambient_color: u32,
    /// Ambient intensity.
    pub ambient_intensity: f32,
    /// Directional color as `0xRRGGBB`.
    pub directional_color: u32,
    /// Directional intensity.
    pub directional_intensity: f32,
    /// Position the directional light shines from, toward the origin.
    pub directional_position: [f32; 3],
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            ambient_color: 0xffffff,
            ambient_intensity: 0.6,
            directional_color: 0xffffff,
            directional_intensity: 0.8,
            directional_position: [5.0, 10.0, 7.0],
        }
    }
}

impl LightSettings {
    /// The configured lights.
    pub fn lights(&self) -> [Light; 2] {
        [
            Light::Ambient(AmbientLight::new(color_from_hex(self.ambient_color), self.ambient_intensity)),
            Light::Directional(DirectionalLight::from_position(
                color_from_hex(self.directional_color),
                self.directional_intensity,
                Vec3::from(self.directional_position),
            )),
        ]
    }
}

/// Everything needed to set up the scene. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Asset locations.
    pub assets: AssetPaths,
    /// Initial camera.
    pub camera: CameraSettings,
    /// Lights.
    pub lights: LightSettings,
    /// CRT filter look.
    pub crt: CrtSettings,
    /// Camera fly-through path.
    pub path: PathSettings,
    /// Name of the mesh that starts the fly-through when clicked.
    pub clickable: Option<String>,
    /// How the filter clock advances.
    pub time_step: TimeStep,
    /// GPU and surface options.
    pub render: RenderConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            assets: AssetPaths::default(),
            camera: CameraSettings::default(),
            lights: LightSettings::default(),
            crt: CrtSettings::default(),
            path: PathSettings::default(),
            clickable: Some("Screen".to_string()),
            time_step: TimeStep::default(),
            render: RenderConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config = SceneConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SceneConfig::default());
        assert_eq!(config.assets.model, "3DModels/3dScene.glb");
        assert_eq!(config.time_step, TimeStep::Fixed(0.016));
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "assets": { "base_path": "public" },
            "crt": { "distortion": 0.3 },
            "path": { "speed": 0.01 },
            "clickable": "Monitor",
            "time_step": "real_time"
        }"#;
        let config = SceneConfig::from_json_str(json).unwrap();
        assert_eq!(config.assets.base_path, "public");
        assert_eq!(config.assets.skybox, "textures/SkyBox.jpg");
        assert_eq!(config.crt.distortion, 0.3);
        assert_eq!(config.crt.edge_warp, CrtSettings::default().edge_warp);
        assert_eq!(config.path.speed, 0.01);
        assert_eq!(config.clickable.as_deref(), Some("Monitor"));
        assert_eq!(config.time_step, TimeStep::RealTime);
    }

    #[test]
    fn test_fixed_time_step_json() {
        let config = SceneConfig::from_json_str(r#"{ "time_step": { "fixed": 0.02 } }"#).unwrap();
        assert_eq!(config.time_step, TimeStep::Fixed(0.02));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(SceneConfig::from_json_str("{ nope"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            SceneConfig::from_json_str(r#"{ "camera": { "fov": "wide" } }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = SceneConfig::from_file("/nonexistent/crt-scene.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_camera_and_lights() {
        let config = SceneConfig::default();
        let camera = config.camera.build(2.0);
        assert_eq!(camera.position, Vec3::new(-200.0, 50.0, 0.0));
        assert_eq!(camera.aspect, 2.0);

        let [ambient, directional] = config.lights.lights();
        assert!(matches!(ambient, Light::Ambient(l) if (l.intensity - 0.6).abs() < 1e-6));
        assert!(matches!(directional, Light::Directional(_)));
    }
}
