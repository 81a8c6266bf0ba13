//! Texture storage and texel lookup for materials.

use std::path::Path;

use lumen_math::{Vec2, Vec3};
use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Texture has zero size: {0}x{1}")]
    ZeroSize(u32, u32),
}

/// A loaded texture with linear RGB pixel data, row-major order.
#[derive(Clone, Debug)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<Vec3>,
}

impl Texture {
    /// Create a texture from pixel data. `pixels.len()` must be `width * height`.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Vec3>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::ZeroSize(width, height));
        }
        assert_eq!(pixels.len(), (width * height) as usize);
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Load a texture from an image file, converting to linear RGB floats.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let img = image::open(path.as_ref())?.to_rgb32f();
        let (width, height) = (img.width(), img.height());
        log::debug!(
            "loaded texture {} ({}x{})",
            path.as_ref().display(),
            width,
            height
        );
        let pixels = img
            .pixels()
            .map(|p| Vec3::new(p.0[0], p.0[1], p.0[2]))
            .collect();
        Self::from_pixels(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Fetch the texel corresponding to a texture coordinate.
    ///
    /// Nearest-texel lookup with wrap addressing; the V axis is flipped to
    /// match image row order.
    pub fn acquire_texel(&self, tex_coord: Vec2) -> Vec3 {
        let u = tex_coord.x.rem_euclid(1.0);
        let v = tex_coord.y.rem_euclid(1.0);

        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = (((1.0 - v) * self.height as f32) as u32).min(self.height - 1);
        self.pixels[(y * self.width + x) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard() -> Texture {
        // 2x2: top row black/white, bottom row white/black
        Texture::from_pixels(
            2,
            2,
            vec![Vec3::ZERO, Vec3::ONE, Vec3::ONE, Vec3::ZERO],
        )
        .unwrap()
    }

    #[test]
    fn test_acquire_texel_corners() {
        let tex = checkerboard();

        // (0, 1) is the top-left image texel
        assert_eq!(tex.acquire_texel(Vec2::new(0.0, 0.99)), Vec3::ZERO);
        assert_eq!(tex.acquire_texel(Vec2::new(0.99, 0.99)), Vec3::ONE);
        assert_eq!(tex.acquire_texel(Vec2::new(0.0, 0.0)), Vec3::ONE);
        assert_eq!(tex.acquire_texel(Vec2::new(0.99, 0.0)), Vec3::ZERO);
    }

    #[test]
    fn test_acquire_texel_wraps() {
        let tex = checkerboard();
        let inside = tex.acquire_texel(Vec2::new(0.25, 0.25));
        let wrapped = tex.acquire_texel(Vec2::new(1.25, -0.75));
        assert_eq!(inside, wrapped);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            Texture::from_pixels(0, 4, Vec::new()),
            Err(TextureError::ZeroSize(0, 4))
        ));
    }
}
