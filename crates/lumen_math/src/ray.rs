use crate::Vec3;

/// A ray in 3D space with origin, direction, and current best hit distance.
///
/// Rays are used for raytracing - they represent a line starting at `origin`
/// and traveling in `direction`. The `t` field holds the closest hit found so
/// far; intersection kernels only accept hits that are strictly closer and
/// update it in place.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub t: f32,
}

impl Ray {
    /// Create a new ray with an explicit hit bound.
    pub fn new(origin: Vec3, direction: Vec3, t: f32) -> Self {
        Self {
            origin,
            direction,
            t,
        }
    }

    /// Create a ray with no hit found yet (`t = f32::MAX`).
    pub fn new_infinite(origin: Vec3, direction: Vec3) -> Self {
        Self::new(origin, direction, f32::MAX)
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// The point at the current best hit distance.
    pub fn hit_position(&self) -> Vec3 {
        self.at(self.t)
    }

    /// Whether any intersection kernel has accepted a hit on this ray.
    pub fn has_hit(&self) -> bool {
        self.t != f32::MAX
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::Z,
            t: f32::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_creation() {
        let origin = Vec3::new(1.0, 2.0, 3.0);
        let direction = Vec3::new(0.0, 1.0, 0.0);
        let ray = Ray::new(origin, direction, 0.5);

        assert_eq!(ray.origin, origin);
        assert_eq!(ray.direction, direction);
        assert_eq!(ray.t, 0.5);
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new_infinite(Vec3::ZERO, Vec3::X);

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(1.0), Vec3::X);
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_ray_hit_position() {
        let mut ray = Ray::new_infinite(Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0));
        assert!(!ray.has_hit());

        ray.t = 1.5;
        assert!(ray.has_hit());
        assert_eq!(ray.hit_position(), Vec3::new(0.0, 0.0, 3.0));
    }
}
