use glam::{DMat4, DVec3, DVec4};

pub const NEAR: f64 = 1.0;
pub const FAR: f64 = 2.0;
pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 1.0;
pub const SNAP_EPSILON: f64 = 0.000_01;
const CAMERA_DISTANCE: f64 = 2.0;

/// Perspective with a fixed `[NEAR, FAR]` depth range mapped to `[0, 1]`.
///
/// `aspect_ratio` is height over width. Above 1 the Y axis is compressed,
/// otherwise the X axis is, so the globe keeps its shape in any window.
pub fn projection(aspect_ratio: f64) -> DMat4 {
    let interval = FAR - NEAR;
    let a = FAR / interval;
    let b = -FAR * NEAR / interval;
    let (sx, sy) = if aspect_ratio > 1.0 {
        (2.0, 2.0 / aspect_ratio)
    } else {
        (2.0 * aspect_ratio, 2.0)
    };
    DMat4::from_cols(
        DVec4::new(sx, 0.0, 0.0, 0.0),
        DVec4::new(0.0, sy, 0.0, 0.0),
        DVec4::new(0.0, 0.0, a, 1.0),
        DVec4::new(0.0, 0.0, b, 0.0),
    )
}

/// Euler rotation in degrees, applied X first, then Y, then Z.
pub fn rotation(degrees: DVec3) -> DMat4 {
    let radians = DVec3::new(
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    );
    DMat4::from_rotation_z(radians.z)
        * DMat4::from_rotation_y(radians.y)
        * DMat4::from_rotation_x(radians.x)
}

/// Globe-to-camera transform: dolly back with the zoom tension, spin, then scale.
pub fn model(zoom: &ZoomState, rotation_degrees: f64) -> DMat4 {
    let translation =
        DMat4::from_translation(DVec3::new(0.0, 0.0, -zoom.camera_distance()));
    translation.inverse()
        * rotation(DVec3::new(rotation_degrees, rotation_degrees, 0.0))
        * DMat4::from_scale(DVec3::splat(zoom.scale()))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransition {
    pub from: f64,
    pub to: f64,
}

/// Continuous scale within one zoom level plus the discrete logical radius.
///
/// Scroll input moves `scale` inside `[MIN_SCALE, MAX_SCALE]`. Only when it
/// saturates does the radius halve or double, and only if the result stays
/// within `[min_radius, max_radius]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomState {
    scale: f64,
    initial_scale: f64,
    radius: f64,
    min_radius: f64,
    max_radius: f64,
}

impl ZoomState {
    pub fn new(initial_scale: f64, min_radius: f64, max_radius: f64) -> Self {
        let initial_scale = initial_scale.clamp(MIN_SCALE, MAX_SCALE);
        let min_radius = min_radius.max(MIN_SCALE);
        Self {
            scale: initial_scale,
            initial_scale,
            radius: min_radius,
            min_radius,
            max_radius: max_radius.max(min_radius),
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn min_radius(&self) -> f64 {
        self.min_radius
    }

    pub fn initial_scale(&self) -> f64 {
        self.initial_scale
    }

    pub fn camera_distance(&self) -> f64 {
        CAMERA_DISTANCE + (self.scale - self.initial_scale)
    }

    /// Zoom level index, 0 at `min_radius`.
    pub fn level(&self) -> u32 {
        (self.radius / self.min_radius).log2().round().max(0.0) as u32
    }

    pub fn with_state(mut self, scale: f64, radius: f64) -> Self {
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        self.radius = radius.clamp(self.min_radius, self.max_radius);
        self
    }

    pub fn apply_scroll(&mut self, delta: f64) -> Option<ZoomTransition> {
        if !delta.is_finite() {
            return None;
        }
        self.scale += delta;
        let level = self.level() as i32;
        let candidate = if self.scale < MIN_SCALE {
            self.scale = MIN_SCALE;
            self.radius_at(level - 1)
        } else if self.scale > MAX_SCALE {
            self.scale = MAX_SCALE;
            self.radius_at(level + 1)
        } else {
            return None;
        };

        if !self.accepts(candidate) || (candidate - self.radius).abs() < SNAP_EPSILON {
            return None;
        }
        let transition = ZoomTransition {
            from: self.radius,
            to: candidate,
        };
        self.radius = candidate;
        tracing::debug!(from = transition.from, to = transition.to, "zoom level changed");
        Some(transition)
    }

    /// Radius of zoom level `level`, counted in doublings from `min_radius`.
    fn radius_at(&self, level: i32) -> f64 {
        self.min_radius * 2f64.powi(level)
    }

    fn accepts(&self, candidate: f64) -> bool {
        candidate > self.min_radius - SNAP_EPSILON && candidate < self.max_radius + SNAP_EPSILON
    }
}

impl Default for ZoomState {
    fn default() -> Self {
        Self::new(MAX_SCALE, 1.0, 2.0)
    }
}
