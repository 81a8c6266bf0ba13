use crate::Vec3;

/// An infinite plane in constant-offset form: `dot(normal, p) = d`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Plane {
    pub d: f32,
    pub normal: Vec3,
}

impl Plane {
    pub fn new(d: f32, normal: Vec3) -> Self {
        Self { d, normal }
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self {
            d: 0.0,
            normal: Vec3::Y,
        }
    }
}
