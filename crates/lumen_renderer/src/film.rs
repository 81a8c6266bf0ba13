//! Output sink for rendered pixels.

use std::path::Path;

use lumen_math::Vec3;

/// A fixed-resolution RGB pixel grid that render passes write into.
pub struct Film {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec3>,
}

impl Film {
    /// Create a new film filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vec3::ZERO; (width * height) as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Vec3 {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Vec3) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Overwrite an entire row at once; used by row-parallel writers.
    pub fn set_row(&mut self, y: u32, row: &[Vec3]) {
        assert_eq!(row.len(), self.width as usize);
        let start = (y * self.width) as usize;
        self.pixels[start..start + row.len()].copy_from_slice(row);
    }

    /// Convert to RGBA bytes (for display or saving).
    ///
    /// Colors are clamped to [0, 1]; gamma is the tone mapper's concern.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((self.width * self.height * 4) as usize);
        for color in &self.pixels {
            let clamped = color.clamp(Vec3::ZERO, Vec3::ONE);
            bytes.push((255.0 * clamped.x) as u8);
            bytes.push((255.0 * clamped.y) as u8);
            bytes.push((255.0 * clamped.z) as u8);
            bytes.push(255);
        }
        bytes
    }

    /// Save the film as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
        image::save_buffer(
            path,
            &self.to_rgba(),
            self.width,
            self.height,
            image::ColorType::Rgba8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_film_starts_black() {
        let film = Film::new(4, 3);
        assert_eq!(film.pixels.len(), 12);
        assert!(film.pixels.iter().all(|&p| p == Vec3::ZERO));
    }

    #[test]
    fn test_set_and_get_pixel() {
        let mut film = Film::new(4, 3);
        film.set_pixel(2, 1, Vec3::X);
        assert_eq!(film.get(2, 1), Vec3::X);
        assert_eq!(film.get(1, 2), Vec3::ZERO);
    }

    #[test]
    fn test_to_rgba_clamps() {
        let mut film = Film::new(1, 1);
        film.set_pixel(0, 0, Vec3::new(2.0, -1.0, 0.5));
        let bytes = film.to_rgba();
        assert_eq!(bytes, vec![255, 0, 127, 255]);
    }
}
