//! Scripted camera motion along a spline.

mod camera_path;
mod curve;

pub use camera_path::{AnimationState, AnimationStatus, CameraPathAnimator, PathSettings};
pub use curve::CatmullRomCurve3;
