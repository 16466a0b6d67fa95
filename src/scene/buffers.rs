//! Scene assembly into flat GPU buffers.
//!
//! Single synchronous entry point: meshes are baked, merged and tagged
//! with material indices, the BVH is built over the tagged triangle
//! stream, and every attribute channel is rewritten into interleaved
//! vertex records following the BVH's triangle permutation. Assembly
//! either completes fully or fails with a typed error; a partial buffer
//! set is never returned.

use bytemuck::{Pod, Zeroable};
use rayon::prelude::*;
use tracing::debug;

use crate::bvh::{self, BuildStats, BvhConfig, BvhNode, TriangleStream, BVH_NODE_FLOATS};
use crate::util::{Error, Result};

use super::light::{Light, LightRecord};
use super::material::{Material, MaterialRecord, MATERIAL_RECORD_FLOATS};
use super::mesh::{bake, BakedMesh, MeshData};
use super::texture::{AtlasSet, TexInfoRecord, TextureAtlas, TEX_INFO_FLOATS};

/// Floats per interleaved vertex record.
pub const VERTEX_RECORD_FLOATS: usize = 20;

/// Interleaved vertex record (20 floats). Three consecutive records form
/// one triangle, stored in BVH-permuted order.
///
/// Field order and width are a contract shared with shader-side fetch
/// code; change both sides atomically or not at all.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VertexRecord {
    pub position: [f32; 3],
    /// Material index of the owning triangle, replicated per vertex.
    pub material: f32,
    pub normal: [f32; 3],
    _pad: f32,
    pub uv0: [f32; 2],
    pub uv1: [f32; 2],
    pub tangent: [f32; 4],
    pub color: [f32; 4],
}

/// Assembly parameters.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssemblerConfig {
    pub bvh: BvhConfig,
    /// Largest data-texture dimension of the consuming backend; buffers
    /// that cannot be packed into `max_texture_dim²` RGBA texels are a
    /// capacity error, never truncated.
    pub max_texture_dim: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            bvh: BvhConfig::default(),
            max_texture_dim: 16384,
        }
    }
}

/// Shape of the RGBA32F data texture a float buffer packs into:
/// row-major texels, rows of `max_texture_dim` until the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataTextureLayout {
    pub width: usize,
    pub height: usize,
}

impl DataTextureLayout {
    /// Compute the packing shape for `float_count` floats, failing when
    /// the buffer exceeds the backend's addressable texel count.
    pub fn for_floats(
        resource: &'static str,
        float_count: usize,
        max_dim: usize,
    ) -> Result<Self> {
        let texels = float_count.div_ceil(4).max(1);
        if max_dim == 0 {
            return Err(Error::CapacityExceeded {
                resource,
                required: texels,
                limit: 0,
            });
        }
        let width = texels.min(max_dim);
        let height = texels.div_ceil(max_dim);
        if height > max_dim {
            return Err(Error::CapacityExceeded {
                resource,
                required: texels,
                limit: max_dim,
            });
        }
        Ok(Self { width, height })
    }
}

/// Counts logged and returned alongside the buffers.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SceneStats {
    pub triangles: usize,
    pub vertices: usize,
    pub materials: usize,
    pub textures: usize,
    pub atlases: usize,
    pub lights: usize,
    pub bvh: BuildStats,
}

/// Everything the GPU backend uploads for one scene.
pub struct SceneBuffers {
    /// Interleaved vertex records, triangle rows in BVH order.
    pub vertices: Vec<VertexRecord>,
    /// Flat BVH node records (root at 0).
    pub bvh_nodes: Vec<BvhNode>,
    pub materials: Vec<MaterialRecord>,
    pub texture_infos: Vec<TexInfoRecord>,
    /// One entry per distinct texture resolution.
    pub atlases: Vec<TextureAtlas>,
    pub lights: Vec<LightRecord>,
    pub stats: SceneStats,
}

impl SceneBuffers {
    /// Vertex records as raw floats (20 per vertex).
    pub fn vertex_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// BVH node records as raw floats (8 per node).
    pub fn bvh_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.bvh_nodes)
    }

    /// Material records as raw floats (64 per material).
    pub fn material_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.materials)
    }

    /// Texture-info records as raw floats (8 per record).
    pub fn texture_info_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.texture_infos)
    }

    /// Light records as raw floats (8 per light).
    pub fn light_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.lights)
    }
}

/// Assemble a scene into its flat buffer set.
///
/// `material_boundaries` is the cumulative triangle count at the end of
/// each material group, one entry per material; a zero-triangle group
/// repeats the previous value. The call is synchronous and must complete
/// before any GPU upload; concurrent calls against the same scene state
/// are not supported.
#[tracing::instrument(skip_all, fields(meshes = meshes.len(), materials = materials.len()))]
pub fn assemble(
    meshes: &[MeshData],
    material_boundaries: &[u32],
    materials: &[Material],
    lights: &[Light],
    config: &AssemblerConfig,
) -> Result<SceneBuffers> {
    // per-mesh baking is independent; fan out, keep order
    let baked: Vec<BakedMesh> = meshes
        .par_iter()
        .enumerate()
        .map(|(idx, mesh)| bake(mesh, idx))
        .collect::<Result<Vec<_>>>()?;

    let total_tris: usize = baked.iter().map(BakedMesh::triangle_count).sum();
    if total_tris == 0 {
        return Err(Error::EmptyScene);
    }

    let mat_index = material_column(total_tris, material_boundaries, materials.len())?;

    // merge all channels into one soup
    let merged = merge(baked, total_tris);

    // material-tagged position stream, 4 floats per vertex
    let mut tagged = Vec::with_capacity(total_tris * 12);
    for tri in 0..total_tris {
        let m = mat_index[tri] as f32;
        for corner in 0..3 {
            let p = merged.positions[tri * 3 + corner];
            tagged.extend_from_slice(&[p.x, p.y, p.z, m]);
        }
    }

    let bvh = bvh::build(TriangleStream::new(&tagged, 4)?, &config.bvh)?;

    // rewrite every channel into permuted interleaved records
    let mut vertices = Vec::with_capacity(total_tris * 3);
    for &src in &bvh.permutation {
        let src = src as usize;
        let material = mat_index[src] as f32;
        for corner in 0..3 {
            let v = src * 3 + corner;
            vertices.push(VertexRecord {
                position: merged.positions[v].to_array(),
                material,
                normal: merged.normals[v].to_array(),
                _pad: 0.0,
                uv0: merged.uv0[v].to_array(),
                uv1: merged.uv1[v].to_array(),
                tangent: merged.tangents[v].to_array(),
                color: merged.colors[v].to_array(),
            });
        }
    }

    let mut atlas = AtlasSet::new();
    let material_records: Vec<MaterialRecord> =
        materials.iter().map(|m| m.encode(&mut atlas)).collect();
    let (atlases, texture_infos) = atlas.into_parts();

    // backend addressing limits, checked before anything is handed out
    let max_dim = config.max_texture_dim;
    DataTextureLayout::for_floats("triangle data", vertices.len() * VERTEX_RECORD_FLOATS, max_dim)?;
    DataTextureLayout::for_floats("bvh nodes", bvh.nodes.len() * BVH_NODE_FLOATS, max_dim)?;
    DataTextureLayout::for_floats(
        "material data",
        material_records.len() * MATERIAL_RECORD_FLOATS,
        max_dim,
    )?;
    DataTextureLayout::for_floats("texture infos", texture_infos.len() * TEX_INFO_FLOATS, max_dim)?;
    for a in &atlases {
        let side = a.width.max(a.height) as usize;
        if side > max_dim {
            return Err(Error::CapacityExceeded {
                resource: "texture atlas",
                required: side,
                limit: max_dim,
            });
        }
    }

    let light_records: Vec<LightRecord> = lights.iter().map(Light::record).collect();

    let stats = SceneStats {
        triangles: total_tris,
        vertices: vertices.len(),
        materials: material_records.len(),
        textures: texture_infos.len(),
        atlases: atlases.len(),
        lights: light_records.len(),
        bvh: bvh.stats,
    };
    debug!(
        triangles = stats.triangles,
        materials = stats.materials,
        textures = stats.textures,
        atlases = stats.atlases,
        "scene assembled"
    );

    Ok(SceneBuffers {
        vertices,
        bvh_nodes: bvh.nodes,
        materials: material_records,
        texture_infos,
        atlases,
        lights: light_records,
        stats,
    })
}

/// Per-triangle material index from the cumulative boundary list.
///
/// Walks the boundaries once; a repeated value (zero-triangle group) is
/// stepped over without tagging any triangle with it.
fn material_column(
    total_tris: usize,
    boundaries: &[u32],
    material_count: usize,
) -> Result<Vec<u32>> {
    if boundaries.len() != material_count {
        return Err(Error::MaterialCount {
            boundaries: boundaries.len(),
            materials: material_count,
        });
    }
    if let Some(idx) = (1..boundaries.len()).find(|&i| boundaries[i] < boundaries[i - 1]) {
        return Err(Error::BoundaryOrder(idx));
    }
    let covered = boundaries.last().copied().unwrap_or(0);
    if covered as usize != total_tris {
        return Err(Error::BoundaryCoverage {
            expected: total_tris as u32,
            actual: covered,
        });
    }

    let mut column = Vec::with_capacity(total_tris);
    let mut mat = 0usize;
    for tri in 0..total_tris as u32 {
        while tri >= boundaries[mat] {
            mat += 1;
        }
        column.push(mat as u32);
    }
    Ok(column)
}

struct Merged {
    positions: Vec<glam::Vec3>,
    normals: Vec<glam::Vec3>,
    uv0: Vec<glam::Vec2>,
    uv1: Vec<glam::Vec2>,
    tangents: Vec<glam::Vec4>,
    colors: Vec<glam::Vec4>,
}

fn merge(baked: Vec<BakedMesh>, total_tris: usize) -> Merged {
    let mut merged = Merged {
        positions: Vec::with_capacity(total_tris * 3),
        normals: Vec::with_capacity(total_tris * 3),
        uv0: Vec::with_capacity(total_tris * 3),
        uv1: Vec::with_capacity(total_tris * 3),
        tangents: Vec::with_capacity(total_tris * 3),
        colors: Vec::with_capacity(total_tris * 3),
    };
    for mesh in baked {
        merged.positions.extend(mesh.positions);
        merged.normals.extend(mesh.normals);
        merged.uv0.extend(mesh.uv0);
        merged.uv1.extend(mesh.uv1);
        merged.tangents.extend(mesh.tangents);
        merged.colors.extend(mesh.colors);
    }
    merged
}
