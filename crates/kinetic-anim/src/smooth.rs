//! Damped virtual scrolling.
//!
//! [`SmoothScroll`] replaces native scroll physics: wheel input moves a
//! target offset and the visible offset eases toward it over a fixed
//! duration. The host advances it once per frame with [`SmoothScroll::raf`],
//! which reports whether the offset moved so observers can be updated.
//!
//! # Usage
//!
//! ```ignore
//! let mut smooth = SmoothScroll::new(SmoothScrollOptions::default());
//! smooth.set_limit(doc.max_scroll());
//! smooth.wheel(120.0);
//! if smooth.raf(now_ms) {
//!     observer.update(smooth.scroll());
//! }
//! ```

use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothScrollOptions {
    /// Seconds taken to ease toward a new target.
    pub duration: f64,
    pub orientation: Orientation,
    pub gesture_orientation: Orientation,
    pub smooth_wheel: bool,
    pub wheel_multiplier: f64,
    pub touch_multiplier: f64,
    /// Allow the target to run past either end of the document.
    pub infinite: bool,
}

impl Default for SmoothScrollOptions {
    fn default() -> Self {
        Self {
            duration: 1.2,
            orientation: Orientation::Vertical,
            gesture_orientation: Orientation::Vertical,
            smooth_wheel: true,
            wheel_multiplier: 1.0,
            touch_multiplier: 2.0,
            infinite: false,
        }
    }
}

/// `min(1, 1.001 - 2^(-10t))`
pub fn ease_out_expo(t: f64) -> f64 {
    (1.001 - 2f64.powf(-10.0 * t)).min(1.0)
}

#[derive(Debug, Clone, Copy)]
struct Animation {
    from: f64,
    to: f64,
    elapsed: f64,
}

#[derive(Debug, Clone)]
pub struct SmoothScroll {
    options: SmoothScrollOptions,
    scroll: f64,
    target: f64,
    limit: f64,
    animation: Option<Animation>,
    last_time_ms: Option<f64>,
    /// Offset as of the previous `raf`.
    reported: f64,
    velocity: f64,
    direction: i8,
    stopped: bool,
}

impl SmoothScroll {
    pub fn new(options: SmoothScrollOptions) -> Self {
        Self {
            options,
            scroll: 0.0,
            target: 0.0,
            limit: 0.0,
            animation: None,
            last_time_ms: None,
            reported: 0.0,
            velocity: 0.0,
            direction: 0,
            stopped: false,
        }
    }

    pub fn options(&self) -> &SmoothScrollOptions {
        &self.options
    }

    /// Current (animated) offset.
    pub fn scroll(&self) -> f64 {
        self.scroll
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }

    /// Offset change of the last frame.
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// `1` scrolling down, `-1` up, `0` before any movement.
    pub fn direction(&self) -> i8 {
        self.direction
    }

    /// Fraction of the scrollable extent covered.
    pub fn progress(&self) -> f64 {
        if self.limit <= 0.0 {
            0.0
        } else {
            (self.scroll / self.limit).clamp(0.0, 1.0)
        }
    }

    pub fn is_scrolling(&self) -> bool {
        self.animation.is_some()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn stop(&mut self) {
        self.stopped = true;
        self.animation = None;
        self.target = self.scroll;
    }

    pub fn start(&mut self) {
        self.stopped = false;
    }

    /// Update the maximum offset (document height minus viewport height).
    pub fn set_limit(&mut self, limit: f64) {
        self.limit = limit.max(0.0);
        if !self.options.infinite {
            self.target = self.target.clamp(0.0, self.limit);
            if self.animation.is_none() {
                self.scroll = self.scroll.clamp(0.0, self.limit);
            }
        }
    }

    fn clamp_target(&self, target: f64) -> f64 {
        if self.options.infinite {
            target
        } else {
            target.clamp(0.0, self.limit)
        }
    }

    pub fn wheel(&mut self, delta: f64) {
        if self.stopped || !delta.is_finite() {
            return;
        }
        let target = self.target + delta * self.options.wheel_multiplier;
        self.scroll_to(target, !self.options.smooth_wheel);
    }

    /// Touch input moves the offset directly (no easing).
    pub fn touch(&mut self, delta: f64) {
        if self.stopped || !delta.is_finite() {
            return;
        }
        let target = self.target + delta * self.options.touch_multiplier;
        self.scroll_to(target, true);
    }

    pub fn scroll_to(&mut self, target: f64, immediate: bool) {
        if !target.is_finite() {
            return;
        }
        self.target = self.clamp_target(target);
        if immediate {
            self.animation = None;
            self.set_scroll(self.target);
        } else {
            self.animation = Some(Animation {
                from: self.scroll,
                to: self.target,
                elapsed: 0.0,
            });
        }
    }

    fn set_scroll(&mut self, value: f64) {
        let previous = self.scroll;
        self.scroll = value;
        self.velocity = value - previous;
        if self.velocity > 0.0 {
            self.direction = 1;
        } else if self.velocity < 0.0 {
            self.direction = -1;
        }
    }

    /// Advance to the host timestamp `time_ms`. Returns whether the offset
    /// changed since the previous call, including immediate jumps made in
    /// between, which is when observers must be recomputed.
    pub fn raf(&mut self, time_ms: f64) -> bool {
        let dt = match self.last_time_ms {
            Some(last) => ((time_ms - last) / 1000.0).max(0.0),
            None => 0.0,
        };
        self.last_time_ms = Some(time_ms);

        if let Some(mut animation) = self.animation.take() {
            animation.elapsed += dt;
            let linear = if self.options.duration > 0.0 {
                (animation.elapsed / self.options.duration).clamp(0.0, 1.0)
            } else {
                1.0
            };
            let done = linear >= 1.0;
            let value = if done {
                animation.to
            } else {
                animation.from + (animation.to - animation.from) * ease_out_expo(linear)
            };
            self.set_scroll(value);
            if !done {
                self.animation = Some(animation);
            }
        } else {
            self.velocity = 0.0;
        }

        let changed = self.scroll != self.reported;
        self.reported = self.scroll;
        if changed {
            trace!(scroll = self.scroll, velocity = self.velocity, "smooth scroll moved");
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smooth(limit: f64) -> SmoothScroll {
        let mut smooth = SmoothScroll::new(SmoothScrollOptions::default());
        smooth.set_limit(limit);
        smooth
    }

    #[test]
    fn test_wheel_eases_toward_target() {
        let mut smooth = smooth(2000.0);
        smooth.raf(0.0);
        smooth.wheel(500.0);
        assert_eq!(smooth.target(), 500.0);
        assert!(smooth.raf(16.0));
        let early = smooth.scroll();
        assert!(early > 0.0 && early < 500.0);
        assert_eq!(smooth.direction(), 1);

        let mut time = 16.0;
        while smooth.is_scrolling() {
            time += 16.0;
            smooth.raf(time);
        }
        assert_eq!(smooth.scroll(), 500.0);
        assert!(time <= 16.0 * 80.0);
        assert!(!smooth.raf(time + 16.0));
    }

    #[test]
    fn test_target_clamped_to_limit() {
        let mut smooth = smooth(1000.0);
        smooth.wheel(5000.0);
        assert_eq!(smooth.target(), 1000.0);
        smooth.wheel(-9000.0);
        assert_eq!(smooth.target(), 0.0);
    }

    #[test]
    fn test_touch_is_immediate_with_multiplier() {
        let mut smooth = smooth(1000.0);
        smooth.touch(100.0);
        assert_eq!(smooth.scroll(), 200.0);
        assert!(!smooth.is_scrolling());
    }

    #[test]
    fn test_stop_ignores_input() {
        let mut smooth = smooth(1000.0);
        smooth.stop();
        smooth.wheel(300.0);
        assert_eq!(smooth.target(), 0.0);
        smooth.start();
        smooth.wheel(300.0);
        assert_eq!(smooth.target(), 300.0);
    }

    #[test]
    fn test_ease_out_expo_saturates() {
        assert_eq!(ease_out_expo(1.0), 1.0);
        assert!(ease_out_expo(0.0) < 0.01);
        assert!(ease_out_expo(0.5) > 0.9);
    }

    #[test]
    fn test_progress() {
        let mut smooth = smooth(1000.0);
        smooth.scroll_to(250.0, true);
        assert_eq!(smooth.progress(), 0.25);
    }
}
