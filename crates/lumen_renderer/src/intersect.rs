//! Ray intersection kernels for planes, triangles, spheres, and AABBs.
//!
//! All kernels share the same acceptance rule: a hit is only taken when its
//! parameter is strictly smaller than the ray's current best `t` and strictly
//! positive. On acceptance `ray.t` is updated in place; on rejection it is
//! left untouched.

use lumen_core::{Material, Sphere};
use lumen_math::{
    barycentric, in_range_inclusive, zero_within_epsilon, Plane, Ray, Vec2, Vec3,
};

/// Surface data for the closest accepted hit.
#[derive(Clone, Debug)]
pub struct HitInfo {
    pub normal: Vec3,
    pub barycentric: Vec3,
    pub tex_coord: Vec2,
    pub material: Material,
}

impl Default for HitInfo {
    fn default() -> Self {
        Self {
            normal: Vec3::Y,
            barycentric: Vec3::ZERO,
            tex_coord: Vec2::ZERO,
            material: Material::default(),
        }
    }
}

/// Compute the supporting plane of a triangle.
pub fn triangle_plane(v0: Vec3, v1: Vec3, v2: Vec3) -> Plane {
    let e0 = v0 - v2;
    let e1 = v1 - v2;
    let normal = e0.cross(e1).normalize();
    Plane::new(normal.dot(v0), normal)
}

/// Intersect a ray with an infinite plane, writing the parameter to `ray.t`.
///
/// A ray lying in (or parallel to) the plane is treated as a non-intersection.
pub fn intersect_ray_with_plane(plane: &Plane, ray: &mut Ray) -> bool {
    let denom = plane.normal.dot(ray.direction);
    if zero_within_epsilon(denom) {
        return false;
    }
    ray.t = (plane.d - ray.origin.dot(plane.normal)) / denom;
    true
}

/// Barycentric containment test; edges and vertices count as inside.
pub fn point_in_triangle(v0: Vec3, v1: Vec3, v2: Vec3, p: Vec3) -> bool {
    let bary = barycentric(v0, v1, v2, p);
    in_range_inclusive(bary.x, 0.0, 1.0)
        && in_range_inclusive(bary.y, 0.0, 1.0)
        && in_range_inclusive(bary.z, 0.0, 1.0)
}

/// Intersect a ray with a triangle via its supporting plane.
///
/// On acceptance, `ray.t` holds the hit parameter and `hit.normal` the flat
/// plane normal; smooth normal and texture interpolation are layered on by
/// the caller using barycentric coordinates.
pub fn intersect_ray_with_triangle(
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    ray: &mut Ray,
    hit: &mut HitInfo,
) -> bool {
    let t_old = ray.t;
    let plane = triangle_plane(v0, v1, v2);
    if !intersect_ray_with_plane(&plane, ray) {
        return false;
    }

    let intersection = ray.hit_position();
    if !point_in_triangle(v0, v1, v2, intersection) || t_old < ray.t || ray.t <= 0.0 {
        ray.t = t_old;
        return false;
    }

    hit.normal = plane.normal;
    true
}

/// Intersect a ray with a sphere via the quadratic formula.
///
/// Takes the smaller root when two exist; the degenerate single-root graze
/// counts as a hit. Sets the outward normal at the hit point.
pub fn intersect_ray_with_sphere(sphere: &Sphere, ray: &mut Ray, hit: &mut HitInfo) -> bool {
    let oc = ray.origin - sphere.center;
    let a = ray.direction.dot(ray.direction);
    let b = 2.0 * oc.dot(ray.direction);
    let c = oc.dot(oc) - sphere.radius * sphere.radius;

    let discriminant = (b * b) - (4.0 * a * c);
    if discriminant < 0.0 {
        return false;
    }
    let t_new = if zero_within_epsilon(discriminant) {
        -b / (2.0 * a)
    } else {
        (-b - discriminant.sqrt()) / (2.0 * a)
    };

    if ray.t < t_new || t_new <= 0.0 {
        return false;
    }
    ray.t = t_new;
    hit.normal = (ray.hit_position() - sphere.center) / sphere.radius;
    hit.barycentric = Vec3::ZERO;
    hit.tex_coord = Vec2::ZERO;
    hit.material = sphere.material.clone();
    true
}

/// Slab-method ray/box test, used purely for traversal pruning.
///
/// Face hits are inclusive. A ray starting inside the box hits at its exit
/// parameter. On acceptance `ray.t` is set to the entry (or exit) parameter;
/// callers that only want the yes/no verdict must save and restore `t`.
pub fn intersect_ray_with_aabb(lower: Vec3, upper: Vec3, ray: &mut Ray) -> bool {
    let mut t_in = f32::NEG_INFINITY;
    let mut t_out = f32::INFINITY;

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let dir = ray.direction[axis];
        if dir == 0.0 {
            // Parallel to this slab: either always inside it or never.
            if origin < lower[axis] || upper[axis] < origin {
                return false;
            }
            continue;
        }
        let t0 = (lower[axis] - origin) / dir;
        let t1 = (upper[axis] - origin) / dir;
        t_in = t_in.max(t0.min(t1));
        t_out = t_out.min(t0.max(t1));
    }

    let origin_in_box = lower.cmplt(ray.origin).all() && ray.origin.cmplt(upper).all();
    if origin_in_box {
        ray.t = t_out;
        return true;
    }

    if ray.t < t_in || t_in > t_out || t_out < 0.0 || t_in < 0.0 {
        return false;
    }
    ray.t = t_in;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::Aabb;

    #[test]
    fn test_triangle_plane() {
        let plane = triangle_plane(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 1.0),
        );
        assert!((plane.normal.abs() - Vec3::Y).length() < 1e-6);
        assert!((plane.d.abs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_plane_parallel_ray_misses() {
        let plane = Plane::new(0.0, Vec3::Y);
        let mut ray = Ray::new_infinite(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        assert!(!intersect_ray_with_plane(&plane, &mut ray));
        assert_eq!(ray.t, f32::MAX);
    }

    #[test]
    fn test_triangle_hit_updates_t_and_normal() {
        let mut ray = Ray::new_infinite(Vec3::new(0.2, 0.2, -1.0), Vec3::Z);
        let mut hit = HitInfo::default();
        let accepted = intersect_ray_with_triangle(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            &mut ray,
            &mut hit,
        );
        assert!(accepted);
        assert!((ray.t - 1.0).abs() < 1e-6);

        let bary = barycentric(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            ray.hit_position(),
        );
        assert!((bary.x + bary.y + bary.z - 1.0).abs() < 1e-5);
        assert!(bary.min_element() >= 0.0 && bary.max_element() <= 1.0);
    }

    #[test]
    fn test_triangle_edge_hit_is_inclusive() {
        let mut ray = Ray::new_infinite(Vec3::new(0.5, 0.0, -1.0), Vec3::Z);
        let mut hit = HitInfo::default();
        assert!(intersect_ray_with_triangle(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            &mut ray,
            &mut hit,
        ));
    }

    #[test]
    fn test_triangle_behind_origin_rejected() {
        let mut ray = Ray::new_infinite(Vec3::new(0.2, 0.2, -1.0), Vec3::NEG_Z);
        let mut hit = HitInfo::default();
        assert!(!intersect_ray_with_triangle(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            &mut ray,
            &mut hit,
        ));
        assert_eq!(ray.t, f32::MAX);
    }

    #[test]
    fn test_triangle_farther_hit_rejected() {
        let mut ray = Ray::new(Vec3::new(0.2, 0.2, -1.0), Vec3::Z, 0.5);
        let mut hit = HitInfo::default();
        assert!(!intersect_ray_with_triangle(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            &mut ray,
            &mut hit,
        ));
        assert_eq!(ray.t, 0.5);
    }

    #[test]
    fn test_sphere_hit_takes_near_root() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, 2.0), 1.0, Material::default());
        let mut ray = Ray::new_infinite(Vec3::ZERO, Vec3::Z);
        let mut hit = HitInfo::default();
        assert!(intersect_ray_with_sphere(&sphere, &mut ray, &mut hit));
        assert!((ray.t - 1.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = Sphere::new(Vec3::new(0.0, 5.0, 2.0), 1.0, Material::default());
        let mut ray = Ray::new_infinite(Vec3::ZERO, Vec3::Z);
        let mut hit = HitInfo::default();
        assert!(!intersect_ray_with_sphere(&sphere, &mut ray, &mut hit));
    }

    #[test]
    fn test_aabb_face_hit_is_inclusive() {
        // Ray grazing the x = 1 face of the unit box
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let mut ray = Ray::new_infinite(Vec3::new(1.0, 0.5, -1.0), Vec3::Z);
        assert!(intersect_ray_with_aabb(aabb.lower, aabb.upper, &mut ray));
    }

    #[test]
    fn test_aabb_zero_direction_outside_slab_misses() {
        // Direction is zero on x while the origin lies outside the x slab;
        // must be a clean miss, not a NaN artifact.
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let mut ray = Ray::new_infinite(Vec3::new(2.0, 0.5, -1.0), Vec3::Z);
        assert!(!intersect_ray_with_aabb(aabb.lower, aabb.upper, &mut ray));
        assert_eq!(ray.t, f32::MAX);
    }

    #[test]
    fn test_aabb_zero_direction_inside_slab_hits() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let mut ray = Ray::new_infinite(Vec3::new(0.5, 0.5, -1.0), Vec3::Z);
        assert!(intersect_ray_with_aabb(aabb.lower, aabb.upper, &mut ray));
        assert!((ray.t - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_aabb_origin_inside_returns_exit() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let mut ray = Ray::new_infinite(Vec3::splat(0.5), Vec3::Z);
        assert!(intersect_ray_with_aabb(aabb.lower, aabb.upper, &mut ray));
        assert!((ray.t - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_aabb_earlier_hit_wins() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let mut ray = Ray::new(Vec3::new(0.5, 0.5, -2.0), Vec3::Z, 1.0);
        // Box entry would be at t = 2, beyond the recorded best hit
        assert!(!intersect_ray_with_aabb(aabb.lower, aabb.upper, &mut ray));
        assert_eq!(ray.t, 1.0);
    }

    #[test]
    fn test_aabb_behind_origin_misses() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let mut ray = Ray::new_infinite(Vec3::new(0.5, 0.5, 3.0), Vec3::Z);
        assert!(!intersect_ray_with_aabb(aabb.lower, aabb.upper, &mut ray));
    }
}
