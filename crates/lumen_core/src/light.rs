//! Light source definitions.

use lumen_math::Vec3;

/// A light source.
///
/// A closed sum type dispatched by variant at every sampling call site; area
/// lights carry per-endpoint or per-corner colors that samplers interpolate.
#[derive(Clone, Debug, PartialEq)]
pub enum Light {
    /// An idealized point emitter.
    Point { position: Vec3, color: Vec3 },

    /// A line segment with a color gradient between its endpoints.
    Segment {
        endpoint0: Vec3,
        endpoint1: Vec3,
        color0: Vec3,
        color1: Vec3,
    },

    /// A parallelogram spanned by two edges from `v0`, with bilinearly
    /// interpolated corner colors (c0 at v0, c1 along edge01, c2 along
    /// edge02, c3 at the far corner).
    Parallelogram {
        v0: Vec3,
        edge01: Vec3,
        edge02: Vec3,
        color0: Vec3,
        color1: Vec3,
        color2: Vec3,
        color3: Vec3,
    },

    /// A flat disk emitter with uniform color.
    Disk {
        center: Vec3,
        normal: Vec3,
        radius: f32,
        color: Vec3,
    },
}

impl Light {
    /// A white point light.
    pub fn point(position: Vec3) -> Self {
        Light::Point {
            position,
            color: Vec3::ONE,
        }
    }

    /// A parallelogram light with a single uniform color.
    pub fn parallelogram_uniform(v0: Vec3, edge01: Vec3, edge02: Vec3, color: Vec3) -> Self {
        Light::Parallelogram {
            v0,
            edge01,
            edge02,
            color0: color,
            color1: color,
            color2: color,
            color3: color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_light_helper() {
        let light = Light::point(Vec3::new(0.0, 2.0, 0.0));
        match light {
            Light::Point { position, color } => {
                assert_eq!(position, Vec3::new(0.0, 2.0, 0.0));
                assert_eq!(color, Vec3::ONE);
            }
            _ => panic!("expected point light"),
        }
    }
}
