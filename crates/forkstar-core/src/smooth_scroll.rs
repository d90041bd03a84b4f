//! Eased scrolling toward a target position.
//!
//! Each frame moves the current position a fixed fraction (`lerp`) of the
//! remaining distance, so motion decelerates as it approaches the target.

use crate::SmoothScrollConfig;

/// Remaining distance (px) below which the position snaps to the target.
pub const SNAP_EPSILON: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct SmoothScroller {
    current: f64,
    target: f64,
    lerp: f64,
    limit: Option<f64>,
}

impl SmoothScroller {
    pub fn new(lerp: f64) -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            lerp: lerp.clamp(0.01, 1.0),
            limit: None,
        }
    }

    pub fn from_config(config: &SmoothScrollConfig) -> Self {
        Self::new(config.lerp)
    }

    /// Upper bound for targets, typically the surface's max scroll.
    pub fn set_limit(&mut self, max_scroll: f64) {
        let limit = max_scroll.max(0.0);
        self.limit = Some(limit);
        self.target = self.clamp(self.target);
    }

    fn clamp(&self, position: f64) -> f64 {
        let lower = position.max(0.0);
        match self.limit {
            Some(limit) => lower.min(limit),
            None => lower,
        }
    }

    pub fn scroll_to(&mut self, target: f64) {
        self.target = self.clamp(target);
    }

    /// Move the target by `delta`, e.g. one wheel notch.
    pub fn scroll_by(&mut self, delta: f64) {
        self.scroll_to(self.target + delta);
    }

    /// Move instantly, without easing.
    pub fn jump_to(&mut self, position: f64) {
        self.target = self.clamp(position);
        self.current = self.target;
    }

    /// Advance one frame and return the new position.
    pub fn tick(&mut self) -> f64 {
        let remaining = self.target - self.current;
        if remaining.abs() < SNAP_EPSILON {
            self.current = self.target;
        } else {
            self.current += remaining * self.lerp;
        }
        self.current
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_animating(&self) -> bool {
        self.current != self.target
    }
}

impl Default for SmoothScroller {
    fn default() -> Self {
        Self::from_config(&SmoothScrollConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_covers_lerp_fraction() {
        let mut scroller = SmoothScroller::new(0.1);
        scroller.scroll_to(1000.0);
        assert!((scroller.tick() - 100.0).abs() < 1e-9);
        assert!((scroller.tick() - 190.0).abs() < 1e-9);
        assert!(scroller.is_animating());
    }

    #[test]
    fn settles_on_target() {
        let mut scroller = SmoothScroller::default();
        scroller.scroll_to(400.0);
        let mut frames = 0;
        while scroller.is_animating() {
            scroller.tick();
            frames += 1;
            assert!(frames < 200, "never settled");
        }
        assert_eq!(scroller.current(), 400.0);
    }

    #[test]
    fn targets_are_clamped_to_limit() {
        let mut scroller = SmoothScroller::new(0.5);
        scroller.set_limit(300.0);
        scroller.scroll_to(900.0);
        assert_eq!(scroller.target(), 300.0);
        scroller.scroll_by(-1_000.0);
        assert_eq!(scroller.target(), 0.0);
    }

    #[test]
    fn jump_skips_easing() {
        let mut scroller = SmoothScroller::new(0.1);
        scroller.jump_to(250.0);
        assert_eq!(scroller.current(), 250.0);
        assert!(!scroller.is_animating());
    }

    #[test]
    fn lerp_is_bounded() {
        let mut scroller = SmoothScroller::new(5.0);
        scroller.scroll_to(80.0);
        assert_eq!(scroller.tick(), 80.0);
    }
}
