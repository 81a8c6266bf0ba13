//! Pinhole camera for primary ray generation.
//!
//! Deliberately deterministic: every frame shoots the same ray through a
//! pixel's center, which is what lets temporal reuse treat identically
//! addressed pixels as the same sampling domain.

use lumen_math::{Ray, Vec3};

/// Camera for generating primary rays into the scene.
#[derive(Clone, Debug)]
pub struct Camera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    /// Vertical field of view in degrees
    vfov: f32,

    // Cached computed values (set by initialize())
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self {
            image_width: 800,
            image_height: 450,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            pixel00_loc: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
        }
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set vertical field of view in degrees.
    pub fn with_vfov(mut self, vfov: f32) -> Self {
        self.vfov = vfov;
        self
    }

    /// Compute the cached pixel-grid vectors. Must be called after the
    /// builder methods and before `primary_ray`.
    pub fn initialize(&mut self) {
        let focal_length = (self.look_from - self.look_at).length();
        let theta = self.vfov.to_radians();
        let viewport_height = 2.0 * (theta / 2.0).tan() * focal_length;
        let viewport_width =
            viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Orthonormal camera frame
        let w = (self.look_from - self.look_at).normalize();
        let u = self.vup.cross(w).normalize();
        let v = w.cross(u);

        let viewport_u = viewport_width * u;
        let viewport_v = viewport_height * -v;
        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;

        let viewport_upper_left =
            self.look_from - (focal_length * w) - viewport_u / 2.0 - viewport_v / 2.0;
        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);
    }

    /// Generate the primary ray through the center of pixel (x, y).
    pub fn primary_ray(&self, x: u32, y: u32) -> Ray {
        let pixel_center =
            self.pixel00_loc + (x as f32 * self.pixel_delta_u) + (y as f32 * self.pixel_delta_v);
        Ray::new_infinite(self.look_from, (pixel_center - self.look_from).normalize())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> Camera {
        let mut camera = Camera::new()
            .with_resolution(9, 9)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_vfov(90.0);
        camera.initialize();
        camera
    }

    #[test]
    fn test_center_pixel_looks_forward() {
        let camera = test_camera();
        let ray = camera.primary_ray(4, 4);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-5);
        assert_eq!(ray.origin, Vec3::ZERO);
        assert_eq!(ray.t, f32::MAX);
    }

    #[test]
    fn test_rays_are_deterministic() {
        let camera = test_camera();
        assert_eq!(camera.primary_ray(2, 7), camera.primary_ray(2, 7));
    }

    #[test]
    fn test_image_x_increases_right() {
        let camera = test_camera();
        let left = camera.primary_ray(0, 4);
        let right = camera.primary_ray(8, 4);
        assert!(left.direction.x < 0.0);
        assert!(right.direction.x > 0.0);
    }

    #[test]
    fn test_image_y_increases_down() {
        let camera = test_camera();
        let top = camera.primary_ray(4, 0);
        let bottom = camera.primary_ray(4, 8);
        assert!(top.direction.y > 0.0);
        assert!(bottom.direction.y < 0.0);
    }
}
