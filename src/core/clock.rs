//! Frame clock driving shader time.

#[cfg(all(feature = "web", target_arch = "wasm32"))]
use web_sys::window;

#[cfg(not(all(feature = "web", target_arch = "wasm32")))]
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Nominal frame step in seconds (~60 Hz).
pub const FIXED_TIME_STEP: f32 = 0.016;

/// How a [`FrameClock`] advances on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeStep {
    /// Advance by a constant step per frame regardless of frame rate.
    Fixed(f32),
    /// Advance by measured wall-clock time.
    RealTime,
}

impl Default for TimeStep {
    fn default() -> Self {
        Self::Fixed(FIXED_TIME_STEP)
    }
}

/// Accumulates time across frames.
pub struct FrameClock {
    step: TimeStep,
    /// Total accumulated time in seconds.
    elapsed: f64,
    /// Wall-clock reading of the last tick, in seconds.
    last_wall: Option<f64>,

    #[cfg(not(all(feature = "web", target_arch = "wasm32")))]
    origin: Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(TimeStep::default())
    }
}

impl FrameClock {
    /// Create a clock at time zero.
    pub fn new(step: TimeStep) -> Self {
        Self {
            step,
            elapsed: 0.0,
            last_wall: None,
            #[cfg(not(all(feature = "web", target_arch = "wasm32")))]
            origin: Instant::now(),
        }
    }

    /// Current wall-clock reading in seconds.
    fn now(&self) -> f64 {
        #[cfg(all(feature = "web", target_arch = "wasm32"))]
        {
            window()
                .and_then(|w| w.performance())
                .map(|p| p.now() / 1000.0)
                .unwrap_or(0.0)
        }

        #[cfg(not(all(feature = "web", target_arch = "wasm32")))]
        {
            self.origin.elapsed().as_secs_f64()
        }
    }

    /// Advance one frame according to the configured step and return the
    /// delta that was applied.
    pub fn tick(&mut self) -> f32 {
        let delta = match self.step {
            TimeStep::Fixed(step) => step,
            TimeStep::RealTime => {
                let now = self.now();
                let delta = self.last_wall.map_or(0.0, |last| now - last);
                self.last_wall = Some(now);
                delta as f32
            }
        };
        self.tick_by(delta)
    }

    /// Advance by an explicit elapsed time. Negative deltas are ignored.
    pub fn tick_by(&mut self, delta: f32) -> f32 {
        let delta = delta.max(0.0);
        self.elapsed += delta as f64;
        delta
    }

    /// Total accumulated time in seconds.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed as f32
    }

    /// The configured step mode.
    #[inline]
    pub fn step(&self) -> TimeStep {
        self.step
    }

    /// Reset the accumulated time to zero.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.last_wall = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_ignores_wall_clock() {
        let mut clock = FrameClock::default();
        for _ in 0..10 {
            assert_eq!(clock.tick(), FIXED_TIME_STEP);
        }
        assert!((clock.elapsed() - 0.16).abs() < 1e-5);
    }

    #[test]
    fn test_first_real_time_tick_is_zero() {
        let mut clock = FrameClock::new(TimeStep::RealTime);
        assert_eq!(clock.tick(), 0.0);
        assert!(clock.tick() >= 0.0);
    }

    #[test]
    fn test_tick_by_rejects_negative() {
        let mut clock = FrameClock::default();
        clock.tick_by(1.0);
        clock.tick_by(-5.0);
        assert_eq!(clock.elapsed(), 1.0);
        clock.reset();
        assert_eq!(clock.elapsed(), 0.0);
    }
}
