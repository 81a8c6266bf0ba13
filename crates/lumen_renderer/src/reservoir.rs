//! Streaming weighted reservoir sampling over light candidates.
//!
//! A `Reservoir` holds R independent weighted-reservoir-sampling slots; each
//! slot performs classical streaming resampling over the (candidate, weight)
//! pairs routed to it. Reservoirs combine across pixels and frames in either
//! a biased fashion (no domain correction) or an unbiased one that counts, per
//! slot, how many source domains could actually have produced the chosen
//! sample.

use rand::{Rng, RngCore};

use lumen_math::{Ray, Vec3};

use crate::bvh::Intersector;
use crate::intersect::HitInfo;
use crate::shading::test_visibility;

/// A sampled position and interpolated color on a light source.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LightSample {
    pub position: Vec3,
    pub color: Vec3,
}

/// A chosen light sample together with its unbiased contribution weight.
#[derive(Clone, Copy, Debug, Default)]
pub struct SampleData {
    pub light_sample: LightSample,
    pub output_weight: f32,
}

/// One independent weighted-reservoir-sampling slot.
#[derive(Clone, Debug)]
pub struct ReservoirSlot {
    pub sample: SampleData,
    /// Number of candidates this slot has processed
    pub sample_count: u64,
    /// Running sum of candidate weights; floored above zero so the
    /// replacement probability never divides by zero
    pub weight_sum: f32,
    /// Weight the currently-held sample carried when it was chosen
    pub chosen_weight: f32,
}

impl Default for ReservoirSlot {
    fn default() -> Self {
        Self {
            sample: SampleData::default(),
            sample_count: 0,
            weight_sum: f32::MIN_POSITIVE,
            chosen_weight: 0.0,
        }
    }
}

/// The importance proxy that resampling weights candidates by.
///
/// Implementations must be deterministic and side-effect-free; resampling
/// correctness depends on repeatable evaluation of the same sample in the
/// same domain.
pub trait TargetFunction: Sync {
    fn target_pdf(&self, sample: &LightSample, ray: &Ray, hit: &HitInfo) -> f32;
}

/// Per-pixel reservoir: the pixel's camera ray and primary hit, plus R slots.
#[derive(Clone, Debug)]
pub struct Reservoir {
    pub camera_ray: Ray,
    pub hit: HitInfo,
    pub slots: Vec<ReservoirSlot>,
}

impl Reservoir {
    pub fn new(num_slots: usize, camera_ray: Ray, hit: HitInfo) -> Self {
        Self {
            camera_ray,
            hit,
            slots: vec![ReservoirSlot::default(); num_slots],
        }
    }

    /// Total number of candidates processed across all slots.
    pub fn total_sample_count(&self) -> u64 {
        self.slots.iter().map(|slot| slot.sample_count).sum()
    }

    /// Stream one weighted candidate into the reservoir.
    ///
    /// The slot with the smallest weight sum takes the candidate, which
    /// load-balances the incoming stream across slots instead of updating
    /// every slot with every candidate. Returns the index of the slot that
    /// processed the sample.
    pub fn update(&mut self, sample: LightSample, weight: f32, rng: &mut dyn RngCore) -> usize {
        let mut slot_idx = 0;
        let mut smallest = f32::MAX;
        for (idx, slot) in self.slots.iter().enumerate() {
            if slot.weight_sum < smallest {
                slot_idx = idx;
                smallest = slot.weight_sum;
            }
        }

        let slot = &mut self.slots[slot_idx];
        slot.sample_count += 1;
        slot.weight_sum += weight;
        if rng.gen::<f32>() < weight / slot.weight_sum {
            slot.sample.light_sample = sample;
            slot.chosen_weight = weight;
        }
        slot_idx
    }

    /// Combine a stream of reservoirs into `out` in a biased fashion.
    ///
    /// Each input slot's chosen sample is re-streamed into `out` with weight
    /// targetPDF(out's domain) x storedOutputWeight x slotSampleCount. Biased
    /// because a sample chosen as optimal under one pixel's domain is assumed
    /// equally likely under the output pixel's.
    pub fn combine_biased(
        inputs: &[Reservoir],
        out: &mut Reservoir,
        target: &dyn TargetFunction,
        rng: &mut dyn RngCore,
    ) {
        let mut total_counts = vec![0u64; out.slots.len()];
        for reservoir in inputs {
            for slot in &reservoir.slots {
                let pdf = target.target_pdf(&slot.sample.light_sample, &out.camera_ray, &out.hit);
                let updated_idx = out.update(
                    slot.sample.light_sample,
                    pdf * slot.sample.output_weight * slot.sample_count as f32,
                    rng,
                );
                total_counts[updated_idx] += slot.sample_count;
            }
        }
        for (slot, &count) in out.slots.iter_mut().zip(&total_counts) {
            slot.sample_count = count;
        }

        let (camera_ray, hit) = (out.camera_ray, out.hit.clone());
        for slot in &mut out.slots {
            let final_pdf = target.target_pdf(&slot.sample.light_sample, &camera_ray, &hit);
            slot.sample.output_weight = if final_pdf == 0.0 || slot.sample_count == 0 {
                0.0
            } else {
                (1.0 / final_pdf) * (1.0 / slot.sample_count as f32) * slot.weight_sum
            };
        }
    }

    /// Combine a stream of reservoirs into `out` without domain-mismatch bias.
    ///
    /// The resampling step is identical to the biased variant, but each output
    /// slot's normalizing denominator only counts the input reservoirs whose
    /// own domain gives the chosen sample a nonzero target PDF (optionally
    /// gated by a shadow-ray visibility test). Extra visibility rays buy an
    /// unbiased contribution-weight estimator.
    pub fn combine_unbiased(
        inputs: &[Reservoir],
        out: &mut Reservoir,
        target: &dyn TargetFunction,
        intersector: &dyn Intersector,
        visibility_check: bool,
        rng: &mut dyn RngCore,
    ) {
        let mut total_counts = vec![0u64; out.slots.len()];
        for reservoir in inputs {
            for slot in &reservoir.slots {
                let pdf = target.target_pdf(&slot.sample.light_sample, &out.camera_ray, &out.hit);
                let updated_idx = out.update(
                    slot.sample.light_sample,
                    pdf * slot.sample.output_weight * slot.sample_count as f32,
                    rng,
                );
                total_counts[updated_idx] += slot.sample_count;
            }
        }
        for (slot, &count) in out.slots.iter_mut().zip(&total_counts) {
            slot.sample_count = count;
        }

        // Count only the samples whose source domain could have produced each
        // chosen sample; this is the Z denominator of the unbiased estimator.
        let mut num_valid = vec![0u64; out.slots.len()];
        for reservoir in inputs {
            for (slot_idx, out_slot) in out.slots.iter().enumerate() {
                let sample = &out_slot.sample.light_sample;
                let mut pdf = target.target_pdf(sample, &reservoir.camera_ray, &reservoir.hit);
                if visibility_check
                    && pdf > 0.0
                    && !test_visibility(
                        sample.position,
                        intersector,
                        &reservoir.camera_ray,
                        &reservoir.hit,
                    )
                {
                    pdf = 0.0;
                }
                if pdf > 0.0 {
                    num_valid[slot_idx] += reservoir.total_sample_count();
                }
            }
        }

        let (camera_ray, hit) = (out.camera_ray, out.hit.clone());
        for (slot, &valid) in out.slots.iter_mut().zip(&num_valid) {
            let final_pdf = target.target_pdf(&slot.sample.light_sample, &camera_ray, &hit);
            slot.sample.output_weight = if final_pdf == 0.0 || valid == 0 {
                0.0
            } else {
                (1.0 / final_pdf) * (1.0 / valid as f32) * slot.weight_sum
            };
        }
    }
}

/// One reservoir per pixel; the unit of inter-frame and inter-pixel reuse.
#[derive(Clone, Debug)]
pub struct ReservoirGrid {
    width: usize,
    height: usize,
    rows: Vec<Vec<Reservoir>>,
}

impl ReservoirGrid {
    pub fn from_rows(rows: Vec<Vec<Reservoir>>) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        debug_assert!(rows.iter().all(|row| row.len() == width));
        Self {
            width,
            height,
            rows,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> &Reservoir {
        &self.rows[y][x]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut Reservoir {
        &mut self.rows[y][x]
    }

    /// Fetch with out-of-range coordinates clamped to the image bounds.
    pub fn get_clamped(&self, x: i64, y: i64) -> &Reservoir {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cy = y.clamp(0, self.height as i64 - 1) as usize;
        &self.rows[cy][cx]
    }

    pub fn rows(&self) -> &[Vec<Reservoir>] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Vec<Reservoir>] {
        &mut self.rows
    }
}
