//! The ReSTIR rendering pipeline: initial sampling, temporal reuse, spatial
//! reuse, and final shading.
//!
//! Every stage is a data-parallel loop over image rows. Within one pass each
//! thread owns exactly one pixel's reservoir, so no locking is needed; passes
//! that read neighbors always read the previous pass's complete grid
//! (ping-pong buffering). Randomness comes from per-row seeded generators.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;

use lumen_core::Scene;
use lumen_math::Vec3;

use crate::bvh::{Bvh, Intersector};
use crate::camera::Camera;
use crate::config::{ConfigError, RayTraceMode, RenderConfig};
use crate::film::Film;
use crate::intersect::HitInfo;
use crate::mis::{render_rmis, render_romis};
use crate::reservoir::{Reservoir, ReservoirGrid};
use crate::sampler::gen_canonical_samples;
use crate::shading::{test_visibility, Shader};
use crate::tone_mapping::exposure_tone_map;

/// Maximum fractional depth difference for a spatial neighbor to count as
/// similar under the biased-combination heuristic.
const MAX_DEPTH_FRACTION_DIFF: f32 = 0.1;

/// cos(25 degrees): minimum normal agreement for a similar neighbor.
const MIN_NORMAL_DOT: f32 = 0.906_307_8;

/// Rendering failures surfaced to the caller.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Derive the RNG for one image row of one pass. Distinct salts decorrelate
/// passes; distinct rows decorrelate threads.
pub(crate) fn row_rng(seed: u64, salt: u64, row: usize) -> StdRng {
    let mixed = seed
        ^ salt.wrapping_mul(0x9e37_79b9_7f4a_7c15)
        ^ (row as u64).wrapping_mul(0xd134_2543_de82_ef95);
    StdRng::seed_from_u64(mixed)
}

/// Per-pass salt values, spread apart per frame/iteration.
pub(crate) fn stage_salt(frame: u64, stage: u64) -> u64 {
    frame.wrapping_mul(256) + stage
}

/// Generate every pixel's canonical reservoir for one frame.
pub(crate) fn gen_initial_samples(
    scene: &Scene,
    intersector: &Bvh,
    shader: &Shader,
    camera: &Camera,
    config: &RenderConfig,
    salt: u64,
) -> ReservoirGrid {
    log::debug!("initial sample generation");
    let rows = (0..camera.image_height)
        .into_par_iter()
        .map(|y| {
            let mut rng = row_rng(config.seed, salt, y as usize);
            (0..camera.image_width)
                .map(|x| {
                    let mut ray = camera.primary_ray(x, y);
                    let mut hit = HitInfo::default();
                    intersector.intersect(&mut ray, &mut hit);
                    gen_canonical_samples(scene, intersector, shader, config, ray, hit, &mut rng)
                })
                .collect()
        })
        .collect();
    ReservoirGrid::from_rows(rows)
}

/// Fold the previous frame's reservoirs into the current grid.
///
/// History slot counts (and proportionally their weight sums) are clamped to
/// `temporal_clamp_m` times the current frame's total plus one, bounding
/// runaway confidence in stale samples. Combination is biased: the history
/// pixel shares this pixel's domain by construction.
pub(crate) fn temporal_reuse(
    grid: &mut ReservoirGrid,
    previous: &ReservoirGrid,
    shader: &Shader,
    config: &RenderConfig,
    salt: u64,
) {
    log::debug!("temporal reuse");
    grid.rows_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(y, row)| {
            let mut rng = row_rng(config.seed, salt, y);
            for (x, current) in row.iter_mut().enumerate() {
                let mut predecessor = previous.get(x, y).clone();
                let clamp_cap =
                    (config.temporal_clamp_m as u64 * current.total_sample_count()) + 1;
                if predecessor.total_sample_count() > clamp_cap {
                    for slot in &mut predecessor.slots {
                        // A slot may have processed nothing at all
                        if slot.sample_count == 0 {
                            continue;
                        }
                        slot.weight_sum *= clamp_cap as f32 / slot.sample_count as f32;
                        slot.sample_count = clamp_cap;
                    }
                }

                let mut combined =
                    Reservoir::new(current.slots.len(), current.camera_ray, current.hit.clone());
                let pixel_and_predecessor = [current.clone(), predecessor];
                Reservoir::combine_biased(&pixel_and_predecessor, &mut combined, shader, &mut rng);
                *current = combined;
            }
        });
}

/// Resample each pixel against randomly chosen neighbors.
///
/// Each pass reads the previous pass's complete grid and writes a fresh one,
/// so pass results are independent of pixel visitation order. Under biased
/// combination, neighbors with too different a depth or surface normal are
/// rejected heuristically; unbiased combination corrects for domain mismatch
/// directly and skips the heuristic.
pub(crate) fn spatial_reuse(
    grid: &mut ReservoirGrid,
    intersector: &Bvh,
    shader: &Shader,
    config: &RenderConfig,
    salt: u64,
) {
    let radius = config.spatial_resample_radius as i64;
    for pass in 0..config.spatial_resampling_passes {
        log::debug!("spatial reuse pass {}", pass + 1);
        let prev_pass = grid.clone();
        grid.rows_mut()
            .par_iter_mut()
            .enumerate()
            .for_each(|(y, row)| {
                let mut rng = row_rng(config.seed, salt + pass as u64, y);
                for (x, current) in row.iter_mut().enumerate() {
                    let mut selected =
                        Vec::with_capacity(config.num_neighbours_to_sample as usize + 1);
                    for _ in 0..config.num_neighbours_to_sample {
                        let neighbour_x = x as i64 + rng.gen_range(-radius..=radius);
                        let neighbour_y = y as i64 + rng.gen_range(-radius..=radius);
                        let neighbour = prev_pass.get_clamped(neighbour_x, neighbour_y);

                        if !config.unbiased_combination {
                            let depth_frac_diff =
                                (1.0 - (neighbour.camera_ray.t / current.camera_ray.t)).abs();
                            let normals_dot = neighbour.hit.normal.dot(current.hit.normal);
                            if depth_frac_diff > MAX_DEPTH_FRACTION_DIFF
                                || normals_dot < MIN_NORMAL_DOT
                            {
                                continue;
                            }
                        }
                        selected.push(neighbour.clone());
                    }

                    // The pixel's own reservoir always participates
                    selected.push(current.clone());

                    let mut combined = Reservoir::new(
                        current.slots.len(),
                        current.camera_ray,
                        current.hit.clone(),
                    );
                    if config.unbiased_combination {
                        Reservoir::combine_unbiased(
                            &selected,
                            &mut combined,
                            shader,
                            intersector,
                            config.spatial_visibility_check,
                            &mut rng,
                        );
                    } else {
                        Reservoir::combine_biased(&selected, &mut combined, shader, &mut rng);
                    }
                    *current = combined;
                }
            });
    }
}

/// Shade one pixel from its retained reservoir slots.
pub(crate) fn shade_reservoir(
    reservoir: &Reservoir,
    intersector: &dyn Intersector,
    shader: &Shader,
) -> Vec3 {
    if !reservoir.camera_ray.has_hit() {
        return Vec3::ZERO;
    }

    let mut color = Vec3::ZERO;
    for slot in &reservoir.slots {
        let sample = &slot.sample;
        let visible = test_visibility(
            sample.light_sample.position,
            intersector,
            &reservoir.camera_ray,
            &reservoir.hit,
        );
        let sample_color = if visible {
            shader.compute_shading(
                sample.light_sample.position,
                sample.light_sample.color,
                &reservoir.camera_ray,
                &reservoir.hit,
            )
        } else {
            Vec3::ZERO
        };
        color += sample_color * sample.output_weight;
    }
    color /= reservoir.slots.len() as f32;
    if color.is_nan() {
        color = Vec3::ZERO;
    }
    color
}

/// Shade every pixel of the grid and write the result to the film.
pub(crate) fn final_shading(
    grid: &ReservoirGrid,
    intersector: &Bvh,
    shader: &Shader,
    config: &RenderConfig,
    film: &mut Film,
) {
    log::debug!("final shading");
    let shaded: Vec<Vec<Vec3>> = grid
        .rows()
        .par_iter()
        .map(|row| {
            row.iter()
                .map(|reservoir| {
                    let mut color = shade_reservoir(reservoir, intersector, shader);
                    if config.tone_mapping {
                        color = exposure_tone_map(color, config.exposure, config.gamma);
                    }
                    color
                })
                .collect()
        })
        .collect();
    for (y, row) in shaded.iter().enumerate() {
        film.set_row(y as u32, row);
    }
}

/// Render one frame with the full ReSTIR pipeline and return the frame's
/// reservoir grid for the next frame's temporal reuse.
///
/// `previous` is read-only input; the caller performs the single-writer
/// handoff by replacing its retained grid with the returned one. A previous
/// grid of mismatched resolution is ignored.
pub fn render_restir(
    scene: &Scene,
    camera: &Camera,
    intersector: &Bvh,
    shader: &Shader,
    config: &RenderConfig,
    film: &mut Film,
    frame: u64,
    previous: Option<&ReservoirGrid>,
) -> ReservoirGrid {
    let mut grid = gen_initial_samples(
        scene,
        intersector,
        shader,
        camera,
        config,
        stage_salt(frame, 0),
    );

    if config.temporal_reuse {
        let usable = previous
            .filter(|prev| prev.width() == grid.width() && prev.height() == grid.height());
        if let Some(prev) = usable {
            temporal_reuse(&mut grid, prev, shader, config, stage_salt(frame, 1));
        }
    }
    if config.spatial_reuse {
        spatial_reuse(&mut grid, intersector, shader, config, stage_salt(frame, 2));
    }

    final_shading(&grid, intersector, shader, config, film);
    grid
}

/// Entry point for all ray-traced rendering modes.
///
/// Validates the configuration, dispatches on the configured mode, and - for
/// ReSTIR - returns the reservoir grid to feed forward into the next frame.
pub fn render(
    scene: &Scene,
    camera: &Camera,
    intersector: &Bvh,
    config: &RenderConfig,
    film: &mut Film,
    frame: u64,
    previous: Option<&ReservoirGrid>,
) -> Result<Option<ReservoirGrid>, RenderError> {
    config.validate()?;
    let shader = Shader::new(config.shading_enabled, config.texture_mapping);

    match config.ray_trace_mode {
        RayTraceMode::ReSTIR => Ok(Some(render_restir(
            scene,
            camera,
            intersector,
            &shader,
            config,
            film,
            frame,
            previous,
        ))),
        RayTraceMode::Rmis => {
            render_rmis(scene, camera, intersector, &shader, config, film);
            Ok(None)
        }
        RayTraceMode::Romis => {
            render_romis(scene, camera, intersector, &shader, config, film);
            Ok(None)
        }
    }
}
