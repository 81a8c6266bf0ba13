//! Direct-light shading, albedo lookup, and shadow-ray visibility.

use lumen_math::{zero_within_epsilon, Ray, Vec3};

use crate::bvh::Intersector;
use crate::intersect::HitInfo;
use crate::reservoir::{LightSample, TargetFunction};

/// Offset applied along the shadow-ray direction to avoid self-shadowing.
const SHADOW_RAY_EPSILON: f32 = 1e-3;

/// Evaluates the local shading model; doubles as the resampling target
/// function via the magnitude of the shading contribution.
#[derive(Clone, Copy, Debug)]
pub struct Shader {
    shading_enabled: bool,
    texture_mapping: bool,
}

impl Default for Shader {
    fn default() -> Self {
        Self {
            shading_enabled: true,
            texture_mapping: true,
        }
    }
}

impl Shader {
    pub fn new(shading_enabled: bool, texture_mapping: bool) -> Self {
        Self {
            shading_enabled,
            texture_mapping,
        }
    }

    /// Diffuse reflectance at the hit point: the material's texel where a
    /// texture is mapped, its constant kd otherwise.
    pub fn diffuse_albedo(&self, hit: &HitInfo) -> Vec3 {
        match &hit.material.kd_texture {
            Some(texture) if self.texture_mapping => texture.acquire_texel(hit.tex_coord),
            _ => hit.material.kd,
        }
    }

    /// Radiance reflected toward the ray origin from a light at
    /// `light_position` with intensity `light_color`.
    ///
    /// Diffuse plus Phong specular with inverse-square falloff; any NaN term
    /// is replaced with zero before it is accumulated.
    pub fn compute_shading(
        &self,
        light_position: Vec3,
        light_color: Vec3,
        ray: &Ray,
        hit: &HitInfo,
    ) -> Vec3 {
        if !self.shading_enabled {
            return hit.material.kd;
        }

        let diffuse_color = self.diffuse_albedo(hit);
        let intersection = ray.hit_position();
        let to_light = (light_position - intersection).normalize();
        let dot_nl = hit.normal.dot(to_light);

        // Light behind the surface contributes nothing
        if dot_nl < 0.0 {
            return Vec3::ZERO;
        }

        let to_viewer = (ray.origin - intersection).normalize();
        let reflected = (2.0 * dot_nl * hit.normal - to_light).normalize();
        let cos_theta = reflected.dot(to_viewer);

        let mut diffuse = light_color * diffuse_color * dot_nl;
        let mut specular =
            light_color * hit.material.ks * cos_theta.powf(hit.material.shininess);
        if diffuse.is_nan() {
            diffuse = Vec3::ZERO;
        }
        if specular.is_nan() {
            specular = Vec3::ZERO;
        }

        let mut light_dist = intersection.distance(light_position);
        if zero_within_epsilon(light_dist) {
            light_dist = 1.0;
        }
        (diffuse + specular) / (light_dist * light_dist)
    }
}

impl TargetFunction for Shader {
    fn target_pdf(&self, sample: &LightSample, ray: &Ray, hit: &HitInfo) -> f32 {
        self.compute_shading(sample.position, sample.color, ray, hit)
            .length()
    }
}

/// Fire a shadow ray from the primary hit toward a light sample.
///
/// Returns true if the sample is visible from the hit point. The ray origin
/// is nudged toward the sample to avoid self-shadowing, and the query is
/// bounded by the distance to the sample so geometry behind the light cannot
/// occlude it.
pub fn test_visibility(
    sample_position: Vec3,
    intersector: &dyn Intersector,
    ray: &Ray,
    hit: &HitInfo,
) -> bool {
    let mut shading_point = ray.hit_position();
    let to_sample = (sample_position - shading_point).normalize();
    shading_point += to_sample * SHADOW_RAY_EPSILON;

    let mut shadow_ray = Ray::new(
        shading_point,
        to_sample,
        shading_point.distance(sample_position),
    );
    let mut shadow_hit = HitInfo::default();
    !intersector.intersect(&mut shadow_ray, &mut shadow_hit)
}
