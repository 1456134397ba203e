use glam::Mat4;
use std::f32::consts::FRAC_PI_2;
use volray_common::Viewport;

/// Perspective projection, rebuilt whenever the viewport changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    aspect: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self::for_viewport(Viewport::default())
    }
}

impl Projection {
    /// 90° vertical field of view, near 0.01, far 1000.
    pub fn for_viewport(viewport: Viewport) -> Self {
        Self {
            fov_y: FRAC_PI_2,
            near: 0.01,
            far: 1000.0,
            aspect: viewport.aspect(),
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.aspect = viewport.aspect();
        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            aspect = self.aspect,
            "projection resized"
        );
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Right-handed, depth mapped to `[0, 1]`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn resize_updates_aspect() {
        let mut p = Projection::for_viewport(Viewport::new(800, 800));
        assert_eq!(p.aspect(), 1.0);
        p.resize(Viewport::new(1920, 960));
        assert_eq!(p.aspect(), 2.0);
        assert_eq!(p.fov_y, FRAC_PI_2);
    }

    #[test]
    fn near_and_far_planes_map_to_depth_range() {
        let m = Projection::for_viewport(Viewport::new(100, 100)).matrix();
        let near = m.project_point3(Vec3::new(0.0, 0.0, -0.01));
        let far = m.project_point3(Vec3::new(0.0, 0.0, -1000.0));
        assert!(near.z.abs() < 1e-4);
        assert!((far.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn square_viewport_has_unit_focal_scale() {
        // tan(45°) = 1, so x and y scales are both 1.
        let m = Projection::for_viewport(Viewport::new(512, 512)).matrix();
        assert!((m.x_axis.x - 1.0).abs() < 1e-6);
        assert!((m.y_axis.y - 1.0).abs() < 1e-6);
    }
}
