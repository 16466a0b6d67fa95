//! End-to-end assembly: meshes through BVH build into the full flat
//! buffer set a renderer would upload.

use std::sync::Arc;

use ptscene::prelude::*;
use ptscene::scene::material::{offset, MaterialTextures, NO_TEXTURE};
use ptscene::scene::{LightKind, TEX_INFO_FLOATS, VERTEX_RECORD_FLOATS};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .try_init();
}

/// `count` unit triangles in the z=`z` plane, marching along +x.
fn strip(count: usize, z: f32) -> MeshData {
    let mut positions = Vec::with_capacity(count * 3);
    for i in 0..count {
        let x = i as f32 * 2.0;
        positions.push([x, 0.0, z]);
        positions.push([x + 1.0, 0.0, z]);
        positions.push([x, 1.0, z]);
    }
    MeshData {
        positions,
        ..Default::default()
    }
}

fn checker(width: u32, height: u32, seed: u8) -> Arc<TextureData> {
    let pixels = (0..width as usize * height as usize * 4)
        .map(|i| (i as u8).wrapping_add(seed))
        .collect();
    Arc::new(TextureData::new(width, height, pixels).unwrap())
}

#[test]
fn test_full_scene_roundtrip() {
    init_tracing();

    // indexed quad with uvs under a transform, plus a plain soup
    let quad = MeshData {
        transform: Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)),
        positions: vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        indices: Some(vec![0, 1, 2, 0, 2, 3]),
        uv0: Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
        ..Default::default()
    };
    let soup = strip(10, -3.0);

    let albedo_map = checker(8, 8, 0);
    let normal_map = checker(8, 8, 64);
    let big_map = checker(16, 16, 0);

    let materials = [
        Material {
            albedo: [0.8, 0.2, 0.2],
            roughness: 0.4,
            textures: MaterialTextures {
                albedo: Some(Arc::clone(&albedo_map)),
                normal: Some(Arc::clone(&normal_map)),
                ..Default::default()
            },
            ..Default::default()
        },
        Material {
            metallic: 1.0,
            textures: MaterialTextures {
                // shares the first material's albedo map and adds a
                // differently-sized emission map
                albedo: Some(Arc::clone(&albedo_map)),
                emission: Some(Arc::clone(&big_map)),
                ..Default::default()
            },
            ..Default::default()
        },
    ];

    let lights = [Light {
        position: [0.0, 10.0, 0.0],
        kind: LightKind::Point,
        emission: [50.0, 50.0, 45.0],
    }];

    let buffers = assemble(
        &[quad, soup],
        &[2, 12],
        &materials,
        &lights,
        &AssemblerConfig::default(),
    )
    .unwrap();

    // 12 triangles, 36 vertex records, 20 floats each
    assert_eq!(buffers.stats.triangles, 12);
    assert_eq!(buffers.vertices.len(), 36);
    assert_eq!(
        buffers.vertex_floats().len(),
        36 * VERTEX_RECORD_FLOATS
    );

    // the transform moved the quad to z=5; those triangles carry
    // material 0, the strip at z=-3 carries material 1
    for rec in buffers.vertices.iter().step_by(3) {
        let expected = if rec.position[2] > 0.0 { 0.0 } else { 1.0 };
        assert_eq!(rec.material, expected);
    }

    // root node bounds the whole scene
    let root = &buffers.bvh_nodes[0];
    for rec in &buffers.vertices {
        for k in 0..3 {
            assert!(rec.position[k] >= root.min()[k] - 1e-5);
            assert!(rec.position[k] <= root.max()[k] + 1e-5);
        }
    }

    // texture packing: 8x8 group with two layers (albedo shared,
    // normal distinct), 16x16 group with one layer
    assert_eq!(buffers.atlases.len(), 2);
    assert_eq!(buffers.atlases[0].width, 8);
    assert_eq!(buffers.atlases[0].layer_count, 2);
    assert_eq!(buffers.atlases[1].width, 16);
    assert_eq!(buffers.atlases[1].layer_count, 1);

    // four registrations, four info records
    assert_eq!(buffers.texture_infos.len(), 4);
    assert_eq!(
        buffers.texture_info_floats().len(),
        4 * TEX_INFO_FLOATS
    );

    // material 0: albedo → info 0 (layer 0), normal → info 1 (layer 1)
    let m0 = &buffers.materials[0];
    assert_eq!(m0.get(offset::ALBEDO_TEXTURE), 0.0);
    assert_eq!(m0.get(offset::NORMAL_TEXTURE), 1.0);
    assert_eq!(m0.get(offset::EMISSION_TEXTURE), NO_TEXTURE);

    // material 1: shared albedo gets a fresh info record pointing at the
    // same layer; emission lands in the second atlas
    let m1 = &buffers.materials[1];
    let shared_info = buffers.texture_infos[m1.get(offset::ALBEDO_TEXTURE) as usize];
    let original_info = buffers.texture_infos[m0.get(offset::ALBEDO_TEXTURE) as usize];
    assert_ne!(
        m1.get(offset::ALBEDO_TEXTURE),
        m0.get(offset::ALBEDO_TEXTURE)
    );
    assert_eq!(shared_info.atlas, original_info.atlas);
    assert_eq!(shared_info.layer, original_info.layer);
    let emission_info = buffers.texture_infos[m1.get(offset::EMISSION_TEXTURE) as usize];
    assert_eq!(emission_info.atlas, 1.0);

    // light pass-through
    assert_eq!(buffers.lights.len(), 1);
    assert_eq!(buffers.lights[0].position, [0.0, 10.0, 0.0]);
    assert_eq!(buffers.lights[0].kind, 0.0);
    assert_eq!(buffers.lights[0].emission, [50.0, 50.0, 45.0]);
}

#[test]
fn test_uv_channels_survive_reordering() {
    init_tracing();

    // tag each triangle's uv0 with its original index so the permuted
    // buffer can be checked against the positions
    let count = 16;
    let mut mesh = strip(count, 0.0);
    mesh.uv0 = Some(
        (0..count * 3)
            .map(|v| [(v / 3) as f32, 0.0])
            .collect(),
    );

    let buffers = assemble(
        &[mesh],
        &[count as u32],
        &[Material::default()],
        &[],
        &AssemblerConfig {
            bvh: BvhConfig {
                max_leaf_tris: 2,
                max_depth: None,
            },
            ..Default::default()
        },
    )
    .unwrap();

    // every vertex of output triangle i must agree on the source
    // triangle, and that source must match the x position it was built at
    for tri in 0..count {
        let records = &buffers.vertices[tri * 3..tri * 3 + 3];
        let src = records[0].uv0[0];
        assert!(records.iter().all(|r| r.uv0[0] == src));
        assert_eq!(records[0].position[0], src * 2.0);
    }
}

#[test]
fn test_degenerate_cluster_assembles() {
    init_tracing();

    // 32 coincident triangles exercise the fallback split through the
    // public entry point
    let tri = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let mesh = MeshData {
        positions: (0..32).flat_map(|_| tri).collect(),
        ..Default::default()
    };

    let buffers = assemble(
        &[mesh],
        &[32],
        &[Material::default()],
        &[],
        &AssemblerConfig {
            bvh: BvhConfig {
                max_leaf_tris: 1,
                max_depth: None,
            },
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(buffers.stats.bvh.leaf_count, 32);
    assert_eq!(buffers.bvh_nodes.len(), 63);
    assert_eq!(buffers.vertices.len(), 96);
}

#[test]
fn test_shorter_material_list_fails_fast() {
    init_tracing();

    let err = assemble(
        &[strip(4, 0.0)],
        &[2, 4],
        &[Material::default()],
        &[],
        &AssemblerConfig::default(),
    );
    assert!(err.is_err());
}
