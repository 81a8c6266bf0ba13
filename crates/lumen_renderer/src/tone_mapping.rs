//! Exposure-based tone mapping.

use lumen_math::Vec3;

/// Map linear radiance to display range: `(1 - e^(-exposure * c))^(1/gamma)`.
pub fn exposure_tone_map(color: Vec3, exposure: f32, gamma: f32) -> Vec3 {
    let mapped = Vec3::ONE - (-color * exposure).exp();
    mapped.powf(1.0 / gamma)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_stays_black() {
        assert_eq!(exposure_tone_map(Vec3::ZERO, 1.5, 1.0), Vec3::ZERO);
    }

    #[test]
    fn test_output_bounded_below_one() {
        let mapped = exposure_tone_map(Vec3::splat(100.0), 1.5, 1.0);
        assert!(mapped.max_element() <= 1.0);
        assert!(mapped.min_element() > 0.99);
    }

    #[test]
    fn test_monotonic_in_radiance() {
        let dim = exposure_tone_map(Vec3::splat(0.2), 1.5, 1.0);
        let bright = exposure_tone_map(Vec3::splat(0.8), 1.5, 1.0);
        assert!(bright.x > dim.x);
    }

    #[test]
    fn test_gamma_brightens_midtones() {
        let linear = exposure_tone_map(Vec3::splat(0.5), 1.5, 1.0);
        let corrected = exposure_tone_map(Vec3::splat(0.5), 1.5, 2.2);
        assert!(corrected.x > linear.x);
    }
}
