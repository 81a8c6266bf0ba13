//! Lumen Core - scene model for the CPU renderer.
//!
//! This crate provides:
//!
//! - **Geometry**: `Mesh`, `Vertex`, `Sphere`
//! - **Appearance**: `Material`, `Texture`
//! - **Lighting**: the `Light` sum type (point, segment, parallelogram, disk)
//! - **Scene**: the aggregate `Scene` plus procedural builders used by tests
//!   and examples

pub mod light;
pub mod material;
pub mod mesh;
pub mod scene;
pub mod texture;

// Re-export commonly used types
pub use light::Light;
pub use material::Material;
pub use mesh::{Mesh, Vertex};
pub use scene::{Scene, Sphere};
pub use texture::{Texture, TextureError};
