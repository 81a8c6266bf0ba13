use crate::{Vec2, Vec3};

/// Compute the barycentric coordinates of point `p` with respect to the
/// triangle `(v0, v1, v2)`.
///
/// Solves the standard 2x2 linear system over the triangle's edge vectors.
/// The returned coordinates `(alpha, beta, gamma)` satisfy
/// `alpha + beta + gamma = 1`; all three lie in [0, 1] iff `p` is inside the
/// triangle (edges included).
pub fn barycentric(v0: Vec3, v1: Vec3, v2: Vec3, p: Vec3) -> Vec3 {
    let e0 = v1 - v0;
    let e1 = v2 - v0;
    let e2 = p - v0;

    let d00 = e0.dot(e0);
    let d01 = e0.dot(e1);
    let d11 = e1.dot(e1);
    let d20 = e2.dot(e0);
    let d21 = e2.dot(e1);

    let denom = (d00 * d11) - (d01 * d01);
    let beta = (d11 * d20 - d01 * d21) / denom;
    let gamma = (d00 * d21 - d01 * d20) / denom;
    Vec3::new(1.0 - (beta + gamma), beta, gamma)
}

/// Interpolate vertex normals over barycentric coordinates.
pub fn interpolate_normal(n0: Vec3, n1: Vec3, n2: Vec3, bary: Vec3) -> Vec3 {
    (n0 * bary.x) + (n1 * bary.y) + (n2 * bary.z)
}

/// Interpolate texture coordinates over barycentric coordinates.
pub fn interpolate_tex_coord(t0: Vec2, t1: Vec2, t2: Vec2, bary: Vec3) -> Vec2 {
    (t0 * bary.x) + (t1 * bary.y) + (t2 * bary.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    const V0: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    const V1: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    const V2: Vec3 = Vec3::new(0.0, 1.0, 0.0);

    #[test]
    fn test_barycentric_vertices() {
        assert!((barycentric(V0, V1, V2, V0) - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
        assert!((barycentric(V0, V1, V2, V1) - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
        assert!((barycentric(V0, V1, V2, V2) - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_barycentric_sums_to_one() {
        let bary = barycentric(V0, V1, V2, Vec3::new(0.2, 0.3, 0.0));
        assert!((bary.x + bary.y + bary.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_barycentric_outside_triangle() {
        let bary = barycentric(V0, V1, V2, Vec3::new(2.0, 2.0, 0.0));
        assert!(bary.min_element() < 0.0);
    }

    #[test]
    fn test_interpolate_normal() {
        let centroid = barycentric(V0, V1, V2, Vec3::new(1.0 / 3.0, 1.0 / 3.0, 0.0));
        let n = interpolate_normal(Vec3::X, Vec3::Y, Vec3::Z, centroid);
        assert!((n - Vec3::splat(1.0 / 3.0)).length() < 1e-5);
    }

    #[test]
    fn test_interpolate_tex_coord_midpoint() {
        let mid01 = barycentric(V0, V1, V2, Vec3::new(0.5, 0.0, 0.0));
        let t = interpolate_tex_coord(Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0), mid01);
        assert!((t - Vec2::new(0.5, 0.0)).length() < 1e-6);
    }
}
