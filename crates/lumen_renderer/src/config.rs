//! Render configuration record.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which rendering pipeline to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RayTraceMode {
    #[default]
    ReSTIR,
    Rmis,
    Romis,
}

/// MIS weighting strategy for R-MIS.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MisWeight {
    #[default]
    Equal,
    Balance,
}

/// Configuration validation failures; fatal, surfaced to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("reservoir must hold at least one sample slot")]
    EmptyReservoir,

    #[error("initial light sample count must be nonzero")]
    NoInitialSamples,

    #[error("iteration count must be nonzero for {0:?} rendering")]
    NoIterations(RayTraceMode),

    #[error("progressive update interval must be nonzero")]
    ZeroProgressiveInterval,
}

/// Read-only render settings, snapshotted per frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    // Base feature toggles
    pub shading_enabled: bool,
    pub normal_interp: bool,
    pub texture_mapping: bool,
    pub use_accel_structure: bool,

    // Shared R-MIS/ReSTIR parameters
    pub ray_trace_mode: RayTraceMode,
    pub initial_visibility_check: bool,
    /// Slots per reservoir (R)
    pub num_samples_in_reservoir: usize,
    pub initial_light_samples: u32,
    pub num_neighbours_to_sample: u32,
    pub spatial_resample_radius: u32,

    // R-MIS/R-OMIS parameters
    pub max_iterations: u32,
    pub mis_weight_rmis: MisWeight,
    pub use_progressive_romis: bool,
    pub progressive_update_mod: u32,

    // ReSTIR feature flags
    pub unbiased_combination: bool,
    pub spatial_reuse: bool,
    pub spatial_visibility_check: bool,
    pub temporal_reuse: bool,

    // ReSTIR parameters
    pub spatial_resampling_passes: u32,
    pub temporal_clamp_m: u32,

    // Post-processing
    pub tone_mapping: bool,
    pub gamma: f32,
    pub exposure: f32,

    /// Base seed for the per-row sampling streams
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            shading_enabled: true,
            normal_interp: true,
            texture_mapping: true,
            use_accel_structure: true,

            ray_trace_mode: RayTraceMode::ReSTIR,
            initial_visibility_check: false,
            num_samples_in_reservoir: 2,
            initial_light_samples: 32,
            num_neighbours_to_sample: 5,
            spatial_resample_radius: 10,

            max_iterations: 5,
            mis_weight_rmis: MisWeight::Equal,
            use_progressive_romis: false,
            progressive_update_mod: 1,

            unbiased_combination: false,
            spatial_reuse: true,
            spatial_visibility_check: false,
            temporal_reuse: true,

            spatial_resampling_passes: 2,
            temporal_clamp_m: 20,

            tone_mapping: true,
            gamma: 1.0,
            exposure: 1.5,

            seed: 0,
        }
    }
}

impl RenderConfig {
    /// Check option combinations that would make a render meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_samples_in_reservoir == 0 {
            return Err(ConfigError::EmptyReservoir);
        }
        if self.initial_light_samples == 0 {
            return Err(ConfigError::NoInitialSamples);
        }
        if self.ray_trace_mode != RayTraceMode::ReSTIR && self.max_iterations == 0 {
            return Err(ConfigError::NoIterations(self.ray_trace_mode));
        }
        if self.ray_trace_mode == RayTraceMode::Romis
            && self.use_progressive_romis
            && self.progressive_update_mod == 0
        {
            return Err(ConfigError::ZeroProgressiveInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(RenderConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_zero_slots_rejected() {
        let config = RenderConfig {
            num_samples_in_reservoir: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyReservoir));
    }

    #[test]
    fn test_zero_iterations_rejected_for_mis_modes() {
        let config = RenderConfig {
            ray_trace_mode: RayTraceMode::Rmis,
            max_iterations: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NoIterations(RayTraceMode::Rmis))
        );
    }

    #[test]
    fn test_zero_progressive_interval_rejected() {
        let config = RenderConfig {
            ray_trace_mode: RayTraceMode::Romis,
            use_progressive_romis: true,
            progressive_update_mod: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroProgressiveInterval));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = RenderConfig {
            ray_trace_mode: RayTraceMode::Romis,
            seed: 99,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: RenderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ray_trace_mode, RayTraceMode::Romis);
        assert_eq!(back.seed, 99);
    }
}
