//! # Core Module
//!
//! wgpu context management, the scene renderer, and frame timing.

mod clock;
mod context;
mod id;
mod renderer;

pub use clock::{FrameClock, TimeStep, FIXED_TIME_STEP};
pub use context::{Context, ContextError};
pub use id::Id;
pub use renderer::{RenderInfo, SceneRenderer};

use serde::{Deserialize, Serialize};

/// Render configuration options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Prefer the discrete GPU when there is a choice.
    pub high_performance: bool,
    /// Synchronize presentation with the display refresh.
    pub vsync: bool,
    /// Clear color used when no skybox is loaded (linear RGB).
    pub clear_color: [f32; 3],
    /// How strongly the environment image lights meshes.
    pub environment_intensity: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            high_performance: true,
            vsync: true,
            clear_color: [0.0, 0.0, 0.0],
            environment_intensity: 0.5,
        }
    }
}

impl RenderConfig {
    /// Power preference for adapter selection.
    pub fn power_preference(&self) -> wgpu::PowerPreference {
        if self.high_performance {
            wgpu::PowerPreference::HighPerformance
        } else {
            wgpu::PowerPreference::LowPower
        }
    }

    /// Present mode for the surface.
    pub fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }

    /// Clear color as a wgpu color.
    pub fn wgpu_clear_color(&self) -> wgpu::Color {
        let [r, g, b] = self.clear_color;
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        }
    }
}
