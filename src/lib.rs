//! # ptscene
//!
//! Scene preparation core for a GPU path tracer.
//!
//! Takes triangle meshes, physically-based materials, textures and lights
//! as produced by a scene importer, and turns them into the flat,
//! fixed-layout buffers a path tracing shader indexes by integer
//! arithmetic alone:
//!
//! - a bounding-volume hierarchy over the merged triangle soup, flattened
//!   into 8-float node records,
//! - one interleaved 20-float vertex record per vertex, reordered to match
//!   the BVH's triangle permutation,
//! - 64-float material records and 8-float texture-info records,
//! - texture atlas arrays grouped by resolution,
//! - 8-float light records.
//!
//! How these buffers reach the GPU (data texture, uniform block, storage
//! buffer) is up to the consuming backend; this crate has no graphics API
//! dependency.
//!
//! ## Modules
//!
//! - [`util`] - Errors and math re-exports
//! - [`bvh`] - BVH construction over triangle streams
//! - [`scene`] - Mesh baking, material/texture encoding, buffer assembly
//!
//! ## Example
//!
//! ```ignore
//! use ptscene::prelude::*;
//!
//! let mesh = MeshData {
//!     positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
//!     ..Default::default()
//! };
//!
//! let buffers = assemble(
//!     &[mesh],
//!     &[1],
//!     &[Material::default()],
//!     &[],
//!     &AssemblerConfig::default(),
//! )?;
//!
//! upload(buffers.vertex_floats(), buffers.bvh_floats());
//! ```

pub mod util;
pub mod bvh;
pub mod scene;

// Re-export commonly used types
pub use util::{Error, Result};
pub use bvh::{Bvh, BvhConfig, BvhNode};
pub use scene::{assemble, AssemblerConfig, SceneBuffers};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result};
    pub use crate::util::math::{Mat4, Vec2, Vec3, Vec4};
    pub use crate::bvh::{Bvh, BvhConfig, BvhNode, TriangleStream};
    pub use crate::scene::{
        assemble, AssemblerConfig, Light, LightKind, Material, MeshData, SceneBuffers,
        TextureData,
    };
}
