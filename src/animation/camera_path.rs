//! Click-triggered camera fly-through.

use super::CatmullRomCurve3;
use crate::camera::PerspectiveCamera;
use crate::math::Vec3;
use serde::{Deserialize, Serialize};

/// Default progress added per update.
pub const DEFAULT_SPEED: f32 = 0.002;
/// Default distance ahead on the curve the camera looks at.
pub const DEFAULT_LOOK_AHEAD: f32 = 0.01;

/// Path configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// The three control points, in order.
    pub points: [[f32; 3]; 3],
    /// Progress per update call.
    pub speed: f32,
    /// Look-ahead offset in curve parameter units.
    pub look_ahead: f32,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            points: [[-200.0, 50.0, 0.0], [-100.0, 30.0, 60.0], [-20.0, 10.0, 0.0]],
            speed: DEFAULT_SPEED,
            look_ahead: DEFAULT_LOOK_AHEAD,
        }
    }
}

/// Lifecycle of the fly-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    /// Not started.
    #[default]
    Idle,
    /// Moving along the path.
    Animating,
    /// Reached the end. Only `restart` leaves this state.
    Completed,
}

/// Snapshot for hosts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationStatus {
    /// True while the camera is moving.
    pub is_animating: bool,
    /// True once the end was reached.
    pub has_completed: bool,
    /// Progress in percent, `[0, 100]`.
    pub progress_percent: f32,
}

/// Drives a camera along a fixed curve, one fixed step per update.
#[derive(Debug, Clone)]
pub struct CameraPathAnimator {
    curve: CatmullRomCurve3,
    speed: f32,
    look_ahead: f32,
    progress: f32,
    state: AnimationState,
}

impl CameraPathAnimator {
    /// Create an idle animator. Non-positive speeds fall back to the default.
    pub fn new(curve: CatmullRomCurve3, speed: f32, look_ahead: f32) -> Self {
        let speed = if speed > 0.0 && speed.is_finite() {
            speed
        } else {
            log::warn!("Invalid camera path speed {}, using {}", speed, DEFAULT_SPEED);
            DEFAULT_SPEED
        };
        Self {
            curve,
            speed,
            look_ahead: look_ahead.max(0.0),
            progress: 0.0,
            state: AnimationState::Idle,
        }
    }

    /// Create an idle animator from settings.
    pub fn from_settings(settings: &PathSettings) -> Self {
        let curve = CatmullRomCurve3::through(settings.points.map(Vec3::from));
        Self::new(curve, settings.speed, settings.look_ahead)
    }

    /// Begin the fly-through from the start. Ignored once completed.
    pub fn start(&mut self) {
        if self.state == AnimationState::Completed {
            log::info!("Camera path already completed; restart to play it again");
            return;
        }
        self.progress = 0.0;
        self.state = AnimationState::Animating;
        log::info!("Camera path animation started");
    }

    /// Advance one step and pose the camera. No-op unless animating.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        if self.state != AnimationState::Animating {
            return;
        }

        self.progress += self.speed;
        if self.progress >= 1.0 {
            self.progress = 1.0;
            camera.set_position(self.curve.end());
            self.state = AnimationState::Completed;
            log::info!("Camera path animation completed");
            return;
        }

        camera.set_position(self.curve.point_at(self.progress));
        let target = self.curve.point_at((self.progress + self.look_ahead).min(1.0));
        // Keeps the previous orientation when the target coincides.
        camera.look_at(target);
    }

    /// Return to `Idle` and start again.
    pub fn restart(&mut self) {
        self.state = AnimationState::Idle;
        log::info!("Camera path animation restarted");
        self.start();
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Progress in `[0, 1]`.
    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// True while animating.
    #[inline]
    pub fn is_animating(&self) -> bool {
        self.state == AnimationState::Animating
    }

    /// True once completed.
    #[inline]
    pub fn has_completed(&self) -> bool {
        self.state == AnimationState::Completed
    }

    /// Host-facing snapshot.
    pub fn status(&self) -> AnimationStatus {
        AnimationStatus {
            is_animating: self.is_animating(),
            has_completed: self.has_completed(),
            progress_percent: self.progress * 100.0,
        }
    }

    /// The path.
    #[inline]
    pub fn curve(&self) -> &CatmullRomCurve3 {
        &self.curve
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animator() -> CameraPathAnimator {
        CameraPathAnimator::from_settings(&PathSettings::default())
    }

    fn assert_status_consistent(animator: &CameraPathAnimator) {
        let status = animator.status();
        assert!(!(status.is_animating && status.has_completed));
        let idle = animator.state() == AnimationState::Idle;
        assert_eq!(idle, !status.is_animating && !status.has_completed);
    }

    fn run_to_end(animator: &mut CameraPathAnimator, camera: &mut PerspectiveCamera) -> usize {
        let mut updates = 0;
        while animator.is_animating() && updates < 10_000 {
            animator.update(camera);
            updates += 1;
        }
        updates
    }

    #[test]
    fn test_initially_idle() {
        let animator = animator();
        assert_eq!(animator.state(), AnimationState::Idle);
        assert_eq!(animator.progress(), 0.0);
        assert_status_consistent(&animator);
    }

    #[test]
    fn test_update_while_idle_is_noop() {
        let mut animator = animator();
        let mut camera = PerspectiveCamera::default();
        let before = camera.position;
        animator.update(&mut camera);
        assert_eq!(camera.position, before);
        assert_eq!(animator.progress(), 0.0);
    }

    #[test]
    fn test_runs_monotonically_to_completion() {
        let mut animator = animator();
        let mut camera = PerspectiveCamera::default();
        animator.start();
        assert!(animator.is_animating());

        let mut last = animator.progress();
        while animator.is_animating() {
            animator.update(&mut camera);
            assert!(animator.progress() >= last);
            last = animator.progress();
            assert_status_consistent(&animator);
        }

        assert!(animator.has_completed());
        assert_eq!(animator.progress(), 1.0);
        assert_eq!(camera.position, animator.curve().end());
        assert_eq!(animator.status().progress_percent, 100.0);
    }

    #[test]
    fn test_camera_faces_along_path() {
        let mut animator = animator();
        let mut camera = PerspectiveCamera::default();
        animator.start();
        animator.update(&mut camera);

        let ahead = animator.curve().point_at(animator.progress() + DEFAULT_LOOK_AHEAD);
        let expected = (ahead - camera.position).normalize();
        assert!(camera.forward().abs_diff_eq(expected, 1e-4));
    }

    #[test]
    fn test_start_after_completion_is_ignored() {
        let mut animator = animator();
        let mut camera = PerspectiveCamera::default();
        animator.start();
        run_to_end(&mut animator, &mut camera);

        animator.start();
        assert_eq!(animator.state(), AnimationState::Completed);
        assert_eq!(animator.progress(), 1.0);
        assert_status_consistent(&animator);
    }

    #[test]
    fn test_restart() {
        let mut animator = animator();
        let mut camera = PerspectiveCamera::default();
        animator.start();
        run_to_end(&mut animator, &mut camera);

        animator.restart();
        let status = animator.status();
        assert!(status.is_animating);
        assert!(!status.has_completed);
        assert_eq!(animator.progress(), 0.0);
    }

    #[test]
    fn test_start_while_animating_resets_progress() {
        let mut animator = animator();
        let mut camera = PerspectiveCamera::default();
        animator.start();
        animator.update(&mut camera);
        animator.update(&mut camera);
        animator.start();
        assert_eq!(animator.progress(), 0.0);
        assert!(animator.is_animating());
    }

    #[test]
    fn test_update_count_matches_speed() {
        let mut animator = CameraPathAnimator::from_settings(&PathSettings {
            speed: 0.25,
            ..Default::default()
        });
        let mut camera = PerspectiveCamera::default();
        animator.start();
        assert_eq!(run_to_end(&mut animator, &mut camera), 4);
    }

    #[test]
    fn test_invalid_speed_falls_back() {
        let animator = CameraPathAnimator::from_settings(&PathSettings {
            speed: 0.0,
            ..Default::default()
        });
        assert_eq!(animator.speed, DEFAULT_SPEED);
    }
}
