//! Lumen Renderer - CPU light resampling
//!
//! A direct-lighting renderer built around reservoir-based spatiotemporal
//! importance resampling (ReSTIR), with two multiple-importance-sampling
//! alternatives (R-MIS and R-OMIS) and a flat-arena BVH ray intersector.

mod bvh;
mod camera;
mod config;
mod film;
mod intersect;
mod mis;
mod render;
mod reservoir;
mod sampler;
mod shading;
mod tone_mapping;

pub use bvh::{Bvh, Intersector, Node, Primitive};
pub use camera::Camera;
pub use config::{ConfigError, MisWeight, RayTraceMode, RenderConfig};
pub use film::Film;
pub use intersect::{
    intersect_ray_with_aabb, intersect_ray_with_plane, intersect_ray_with_sphere,
    intersect_ray_with_triangle, point_in_triangle, triangle_plane, HitInfo,
};
pub use mis::{render_rmis, render_romis};
pub use render::{render, render_restir, RenderError};
pub use reservoir::{
    LightSample, Reservoir, ReservoirGrid, ReservoirSlot, SampleData, TargetFunction,
};
pub use sampler::{gen_canonical_samples, sample_light};
pub use shading::{test_visibility, Shader};
pub use tone_mapping::exposure_tone_map;

/// Re-export common math and scene types
pub use lumen_core::{Light, Material, Mesh, Scene, Sphere, Texture, Vertex};
pub use lumen_math::{Aabb, Plane, Ray, Vec2, Vec3};
