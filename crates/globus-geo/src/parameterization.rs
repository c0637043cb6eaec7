use glam::DVec3;

/// Point on a sphere centered at the origin for polar angle `u` and azimuth `v`.
pub fn position(u: f64, v: f64, radius: f64) -> DVec3 {
    let (sin_u, cos_u) = u.sin_cos();
    let (sin_v, cos_v) = v.sin_cos();
    DVec3::new(radius * sin_u * cos_v, radius * cos_u, radius * sin_u * sin_v)
}

/// Outward unit normal. `position` must not be the origin.
pub fn normal(position: DVec3) -> DVec3 {
    position.normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn equator_on_x_axis() {
        let p = position(FRAC_PI_2, 0.0, 1.0);
        assert!((p - DVec3::X).length() < 1e-12);
        let n = normal(p);
        assert!((n - DVec3::X).length() < 1e-12);
        assert!((n.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn poles_and_radius() {
        let north = position(0.0, 1.234, 2.5);
        assert!((north - DVec3::new(0.0, 2.5, 0.0)).length() < 1e-12);
        let south = position(PI, 0.0, 2.5);
        assert!((south.y + 2.5).abs() < 1e-12);
        let p = position(1.1, 4.2, 0.5);
        assert!((p.length() - 0.5).abs() < 1e-12);
        assert!((normal(p).length() - 1.0).abs() < 1e-12);
    }
}
