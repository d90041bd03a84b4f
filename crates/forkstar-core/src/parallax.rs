use forkstar_schema::ScrollSnapshot;

/// Linearly map scroll progress onto `[from, to]`. Progress is clamped.
pub fn map_progress(progress: f64, from: f64, to: f64) -> f64 {
    let p = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    from + (to - from) * p
}

/// A layer that drifts relative to the page as it scrolls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParallaxLayer {
    /// Pixel offset per scrolled pixel.
    pub speed: f64,
    /// Translation, in percent of the layer size, at full progress.
    pub range_percent: f64,
}

impl ParallaxLayer {
    pub const BACKGROUND: Self = Self {
        speed: 0.5,
        range_percent: 50.0,
    };

    pub const TEXT: Self = Self {
        speed: 0.25,
        range_percent: 25.0,
    };

    pub fn offset_px(&self, snapshot: &ScrollSnapshot) -> f64 {
        snapshot.vertical_offset * self.speed
    }

    pub fn shift_percent(&self, snapshot: &ScrollSnapshot) -> f64 {
        map_progress(snapshot.progress, 0.0, self.range_percent)
    }
}
