//! Mesh intake: validation, transform baking and attribute completion.
//!
//! Downstream merging requires every mesh to carry the full attribute
//! set, so baking fills in whatever the importer left out: normals are
//! computed, tangents are computed when UVs exist, everything else is
//! zero-filled. Indexed meshes are expanded to a triangle soup in the
//! same pass.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::util::{Error, Result};

/// One mesh as delivered by the scene importer.
///
/// `positions` is required; every optional channel must match it in
/// length when present. With `indices` the mesh is indexed, otherwise
/// `positions` is already a triangle soup (length divisible by 3).
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// Local-to-world transform, baked into positions/normals/tangents.
    pub transform: Mat4,
    pub positions: Vec<[f32; 3]>,
    pub indices: Option<Vec<u32>>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub uv0: Option<Vec<[f32; 2]>>,
    pub uv1: Option<Vec<[f32; 2]>>,
    /// xyz direction + w handedness.
    pub tangents: Option<Vec<[f32; 4]>>,
    pub colors: Option<Vec<[f32; 4]>>,
}

/// World-space triangle soup with the complete attribute set.
#[derive(Debug, Clone)]
pub(crate) struct BakedMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uv0: Vec<Vec2>,
    pub uv1: Vec<Vec2>,
    pub tangents: Vec<Vec4>,
    pub colors: Vec<Vec4>,
}

impl BakedMesh {
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }
}

/// Bake one mesh: validate, transform to world space, complete the
/// attribute set, expand indices.
pub(crate) fn bake(mesh: &MeshData, mesh_idx: usize) -> Result<BakedMesh> {
    validate(mesh, mesh_idx)?;

    let vertex_count = mesh.positions.len();
    let indices: Vec<u32> = match &mesh.indices {
        Some(indices) => indices.clone(),
        None => (0..vertex_count as u32).collect(),
    };

    // world-space bake of everything the importer supplied
    let positions: Vec<Vec3> = mesh
        .positions
        .iter()
        .map(|&p| mesh.transform.transform_point3(Vec3::from(p)))
        .collect();

    let normal_matrix = mesh.transform.inverse().transpose();
    let mut normals: Option<Vec<Vec3>> = mesh.normals.as_ref().map(|ns| {
        ns.iter()
            .map(|&n| {
                normal_matrix
                    .transform_vector3(Vec3::from(n))
                    .normalize_or_zero()
            })
            .collect()
    });

    let mut tangents: Option<Vec<Vec4>> = mesh.tangents.as_ref().map(|ts| {
        ts.iter()
            .map(|&t| {
                let dir = mesh
                    .transform
                    .transform_vector3(Vec3::new(t[0], t[1], t[2]))
                    .normalize_or_zero();
                dir.extend(t[3])
            })
            .collect()
    });

    if normals.is_none() {
        normals = Some(smooth_normals(&positions, &indices));
    }
    let normals = normals.unwrap();

    if tangents.is_none() {
        tangents = Some(match &mesh.uv0 {
            Some(uv0) => generate_tangents(&positions, &normals, uv0, &indices),
            None => vec![Vec4::ZERO; vertex_count],
        });
    }
    let tangents = tangents.unwrap();

    let uv0: Vec<Vec2> = match &mesh.uv0 {
        Some(uv) => uv.iter().map(|&v| Vec2::from(v)).collect(),
        None => vec![Vec2::ZERO; vertex_count],
    };
    let uv1: Vec<Vec2> = match &mesh.uv1 {
        Some(uv) => uv.iter().map(|&v| Vec2::from(v)).collect(),
        None => vec![Vec2::ZERO; vertex_count],
    };
    let colors: Vec<Vec4> = match &mesh.colors {
        Some(cs) => cs.iter().map(|&c| Vec4::from(c)).collect(),
        None => vec![Vec4::ZERO; vertex_count],
    };

    // expand to a soup; all channels follow the same index walk
    let pick = |i: &u32| *i as usize;
    Ok(BakedMesh {
        positions: indices.iter().map(|i| positions[pick(i)]).collect(),
        normals: indices.iter().map(|i| normals[pick(i)]).collect(),
        uv0: indices.iter().map(|i| uv0[pick(i)]).collect(),
        uv1: indices.iter().map(|i| uv1[pick(i)]).collect(),
        tangents: indices.iter().map(|i| tangents[pick(i)]).collect(),
        colors: indices.iter().map(|i| colors[pick(i)]).collect(),
    })
}

fn validate(mesh: &MeshData, mesh_idx: usize) -> Result<()> {
    let vertex_count = mesh.positions.len();
    if vertex_count == 0 {
        return Err(Error::MissingPositions(mesh_idx));
    }

    let check = |name: &'static str, actual: usize| {
        if actual != vertex_count {
            Err(Error::AttributeMismatch {
                mesh: mesh_idx,
                attribute: name,
                expected: vertex_count,
                actual,
            })
        } else {
            Ok(())
        }
    };
    if let Some(ns) = &mesh.normals {
        check("normal", ns.len())?;
    }
    if let Some(uv) = &mesh.uv0 {
        check("uv0", uv.len())?;
    }
    if let Some(uv) = &mesh.uv1 {
        check("uv1", uv.len())?;
    }
    if let Some(ts) = &mesh.tangents {
        check("tangent", ts.len())?;
    }
    if let Some(cs) = &mesh.colors {
        check("color", cs.len())?;
    }

    match &mesh.indices {
        Some(indices) => {
            if indices.len() % 3 != 0 {
                return Err(Error::IndexCount {
                    mesh: mesh_idx,
                    count: indices.len(),
                });
            }
            if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(Error::IndexOutOfBounds {
                    mesh: mesh_idx,
                    index: bad,
                    vertex_count,
                });
            }
        }
        None => {
            if vertex_count % 3 != 0 {
                return Err(Error::VertexCount {
                    mesh: mesh_idx,
                    count: vertex_count,
                });
            }
        }
    }
    Ok(())
}

/// Smooth per-vertex normals: accumulate area-weighted face normals over
/// shared indices, then normalize. A soup (identity indices) degenerates
/// to flat face normals.
fn smooth_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let face = (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
        normals[i0] += face;
        normals[i1] += face;
        normals[i2] += face;
    }
    for n in &mut normals {
        *n = n.normalize_or_zero();
    }
    normals
}

/// Per-vertex tangents from UV derivatives: accumulate the triangle
/// tangent/bitangent directions, orthonormalize against the normal, and
/// store handedness in w.
fn generate_tangents(
    positions: &[Vec3],
    normals: &[Vec3],
    uv0: &[[f32; 2]],
    indices: &[u32],
) -> Vec<Vec4> {
    let mut tan = vec![Vec3::ZERO; positions.len()];
    let mut bitan = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let edge1 = positions[i1] - positions[i0];
        let edge2 = positions[i2] - positions[i0];
        let duv1 = Vec2::from(uv0[i1]) - Vec2::from(uv0[i0]);
        let duv2 = Vec2::from(uv0[i2]) - Vec2::from(uv0[i0]);

        let f = 1.0 / (duv1.x * duv2.y - duv2.x * duv1.y);
        if !f.is_finite() {
            // degenerate UV mapping contributes nothing
            continue;
        }

        let sdir = (edge1 * duv2.y - edge2 * duv1.y) * f;
        let tdir = (edge2 * duv1.x - edge1 * duv2.x) * f;
        for i in [i0, i1, i2] {
            tan[i] += sdir;
            bitan[i] += tdir;
        }
    }

    positions
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let n = normals[i];
            let t = tan[i];
            let dir = (t - n * n.dot(t)).normalize_or_zero();
            let w = if n.cross(t).dot(bitan[i]) < 0.0 {
                -1.0
            } else {
                1.0
            };
            dir.extend(w)
        })
        .collect()
}
