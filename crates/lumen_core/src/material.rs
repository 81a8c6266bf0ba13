//! Surface material definition.

use std::sync::Arc;

use lumen_math::Vec3;

use crate::texture::Texture;

/// A Phong-style surface material.
#[derive(Clone, Debug)]
pub struct Material {
    /// Diffuse reflectance (RGB, 0-1)
    pub kd: Vec3,

    /// Specular reflectance (RGB, 0-1)
    pub ks: Vec3,

    /// Specular exponent
    pub shininess: f32,

    /// Transparency (0 = opaque)
    pub transparency: f32,

    /// Optional diffuse texture; overrides `kd` where present
    pub kd_texture: Option<Arc<Texture>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            kd: Vec3::splat(0.5), // Grey default
            ks: Vec3::ZERO,
            shininess: 1.0,
            transparency: 0.0,
            kd_texture: None,
        }
    }
}

impl Material {
    /// Create a purely diffuse material.
    pub fn diffuse(kd: Vec3) -> Self {
        Self {
            kd,
            ..Default::default()
        }
    }

    /// Create a diffuse + specular material.
    pub fn specular(kd: Vec3, ks: Vec3, shininess: f32) -> Self {
        Self {
            kd,
            ks,
            shininess,
            ..Default::default()
        }
    }

    /// Attach a diffuse texture.
    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.kd_texture = Some(texture);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_default_is_grey_diffuse() {
        let mat = Material::default();
        assert_eq!(mat.kd, Vec3::splat(0.5));
        assert_eq!(mat.ks, Vec3::ZERO);
        assert!(mat.kd_texture.is_none());
    }

    #[test]
    fn test_material_builders() {
        let mat = Material::specular(Vec3::X, Vec3::splat(0.2), 16.0);
        assert_eq!(mat.kd, Vec3::X);
        assert_eq!(mat.ks, Vec3::splat(0.2));
        assert_eq!(mat.shininess, 16.0);
    }
}
