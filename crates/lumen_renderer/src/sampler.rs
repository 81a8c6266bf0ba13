//! Light sampling and canonical per-pixel sample generation.

use rand::{Rng, RngCore};

use lumen_core::{Light, Scene};
use lumen_math::{Ray, Vec3};

use crate::bvh::Intersector;
use crate::config::RenderConfig;
use crate::intersect::HitInfo;
use crate::reservoir::{LightSample, Reservoir, TargetFunction};
use crate::shading::{test_visibility, Shader};

/// Draw a uniform sample (position + interpolated color) from a light.
pub fn sample_light(light: &Light, rng: &mut dyn RngCore) -> LightSample {
    match light {
        Light::Point { position, color } => LightSample {
            position: *position,
            color: *color,
        },
        Light::Segment {
            endpoint0,
            endpoint1,
            color0,
            color1,
        } => {
            let frac = rng.gen::<f32>();
            LightSample {
                position: endpoint0.lerp(*endpoint1, frac),
                color: color0.lerp(*color1, frac),
            }
        }
        Light::Parallelogram {
            v0,
            edge01,
            edge02,
            color0,
            color1,
            color2,
            color3,
        } => {
            let frac01 = rng.gen::<f32>();
            let frac02 = rng.gen::<f32>();
            let lerp01 = color0.lerp(*color1, frac01);
            let lerp23 = color2.lerp(*color3, frac01);
            LightSample {
                position: *v0 + (frac01 * *edge01) + (frac02 * *edge02),
                color: lerp01.lerp(lerp23, frac02),
            }
        }
        Light::Disk {
            center,
            normal,
            radius,
            color,
        } => {
            // Uniform over the disk area via the polar map, in the disk's
            // tangent frame
            let r = radius * rng.gen::<f32>().sqrt();
            let theta = 2.0 * std::f32::consts::PI * rng.gen::<f32>();
            let normal = normal.normalize();
            let seed = if normal.x.abs() > 0.9 { Vec3::Y } else { Vec3::X };
            let tangent = seed.cross(normal).normalize();
            let bitangent = normal.cross(tangent);
            LightSample {
                position: *center + r * (theta.cos() * tangent + theta.sin() * bitangent),
                color: *color,
            }
        }
    }
}

/// Generate a pixel's canonical reservoir from fresh light samples.
///
/// Lights are chosen uniformly; the selection probability (1/numLights) is
/// folded into each candidate's importance weight so uniform light selection
/// does not bias the resampled estimator. A missed primary ray or a lightless
/// scene yields an empty reservoir whose slots all carry zero output weight.
pub fn gen_canonical_samples(
    scene: &Scene,
    intersector: &dyn Intersector,
    shader: &Shader,
    config: &RenderConfig,
    camera_ray: Ray,
    hit: HitInfo,
    rng: &mut dyn RngCore,
) -> Reservoir {
    let mut reservoir = Reservoir::new(config.num_samples_in_reservoir, camera_ray, hit);

    // Nothing to light: either no surface under this pixel or no lights at all
    if !camera_ray.has_hit() || scene.lights.is_empty() {
        return reservoir;
    }

    let num_lights = scene.lights.len();
    for _ in 0..config.initial_light_samples {
        let light = &scene.lights[rng.gen_range(0..num_lights)];
        let sample = sample_light(light, rng);

        // Uniform light selection, so the source PDF is 1/numLights
        let weight = shader.target_pdf(&sample, &reservoir.camera_ray, &reservoir.hit)
            * num_lights as f32;
        reservoir.update(sample, weight, rng);
    }

    // Finalize per-slot output weights, optionally discarding occluded picks
    let (camera_ray, hit) = (reservoir.camera_ray, reservoir.hit.clone());
    for slot in &mut reservoir.slots {
        let sample = &slot.sample.light_sample;
        if config.initial_visibility_check
            && !test_visibility(sample.position, intersector, &camera_ray, &hit)
        {
            slot.sample.output_weight = 0.0;
            continue;
        }
        let pdf = shader.target_pdf(sample, &camera_ray, &hit);
        slot.sample.output_weight = if pdf == 0.0 || slot.sample_count == 0 {
            0.0
        } else {
            (1.0 / pdf) * (1.0 / slot.sample_count as f32) * slot.weight_sum
        };
    }

    reservoir
}
