//! Scene flattening: meshes, materials, textures and lights into flat
//! GPU-consumable buffers.
//!
//! ```text
//! MeshData* ─ bake ─ merge ─ tag materials ─ BVH ─ reorder ─ SceneBuffers
//! Material* ─ schema encode ─ texture atlas registration ──────┘
//! ```
//!
//! [`assemble`] is the single entry point; everything it returns is
//! fixed-stride and ready for upload by whatever backend consumes it.

pub mod buffers;
pub mod light;
pub mod material;
pub mod mesh;
pub mod texture;

pub use buffers::{
    assemble, AssemblerConfig, DataTextureLayout, SceneBuffers, SceneStats, VertexRecord,
    VERTEX_RECORD_FLOATS,
};
pub use light::{Light, LightKind, LightRecord, LIGHT_RECORD_FLOATS};
pub use material::{
    material_shader_defines, Material, MaterialField, MaterialRecord, MaterialTextures,
    MATERIAL_RECORD_FLOATS, MATERIAL_SCHEMA, NO_TEXTURE,
};
pub use mesh::MeshData;
pub use texture::{
    AtlasSet, TexInfoRecord, TextureAtlas, TextureData, TEX_INFO_FLOATS, TEX_SLOT_UNSET,
};
