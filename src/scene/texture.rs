//! Texture data, texture-info records and atlas packing.
//!
//! Textures are grouped by exact resolution; each group becomes one
//! array of same-sized layers so the consumer binds a handful of array
//! textures instead of one resource per image. Layer assignment is
//! first-seen order, deduplicated by source-texture identity: the same
//! texture shared by several materials occupies a single layer.

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use smallvec::SmallVec;

use crate::util::{Error, Result};

/// Floats per texture-info record.
pub const TEX_INFO_FLOATS: usize = 8;

/// Marker for the atlas/layer/uv-set slots of an unregistered record.
pub const TEX_SLOT_UNSET: f32 = 255.0;

/// One decoded texture as delivered by the scene importer.
///
/// Pixels are tightly packed row-major RGBA8. `offset`/`scale` are the
/// UV transform baked into the info record. Share via [`Arc`]: the Arc
/// allocation is the identity the atlas packer dedupes on.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub offset: [f32; 2],
    pub scale: [f32; 2],
}

impl TextureData {
    /// Validate pixel data against the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::TextureSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            offset: [0.0, 0.0],
            scale: [1.0, 1.0],
        })
    }

    /// UV transform applied by the shader when sampling this texture.
    pub fn with_transform(mut self, offset: [f32; 2], scale: [f32; 2]) -> Self {
        self.offset = offset;
        self.scale = scale;
        self
    }
}

/// Flat texture-info record:
/// `[offset.xy, atlas, layer, scale.xy, uv_set, pad]`.
///
/// Field order and width are shared with shader-side lookup code.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TexInfoRecord {
    pub offset: [f32; 2],
    /// Index of the atlas array holding the texture.
    pub atlas: f32,
    /// Layer inside that atlas array.
    pub layer: f32,
    pub scale: [f32; 2],
    /// UV channel selector (0 or 1); always 0 for registered textures.
    pub uv_set: f32,
    _pad: f32,
}

impl Default for TexInfoRecord {
    fn default() -> Self {
        Self {
            offset: [0.0, 0.0],
            atlas: TEX_SLOT_UNSET,
            layer: TEX_SLOT_UNSET,
            scale: [1.0, 1.0],
            uv_set: TEX_SLOT_UNSET,
            _pad: 0.0,
        }
    }
}

/// One packed atlas array: `layer_count` same-sized RGBA8 images
/// concatenated in layer order.
#[derive(Debug, Clone)]
pub struct TextureAtlas {
    pub width: u32,
    pub height: u32,
    pub layer_count: u32,
    pub pixels: Vec<u8>,
}

/// Groups textures into atlas arrays and hands out texture-info indices.
///
/// Every [`register`](Self::register) call appends one info record, even
/// for an already-seen texture; only the atlas layer is shared.
#[derive(Default)]
pub struct AtlasSet {
    groups: Vec<AtlasGroup>,
    by_size: HashMap<(u32, u32), usize>,
    infos: Vec<TexInfoRecord>,
}

struct AtlasGroup {
    width: u32,
    height: u32,
    layers: SmallVec<[Arc<TextureData>; 4]>,
}

impl AtlasSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one texture reference; returns the texture-info index to
    /// store in the material record.
    pub fn register(&mut self, tex: &Arc<TextureData>) -> usize {
        let key = (tex.width, tex.height);
        let group_idx = match self.by_size.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.groups.len();
                self.groups.push(AtlasGroup {
                    width: tex.width,
                    height: tex.height,
                    layers: SmallVec::new(),
                });
                self.by_size.insert(key, idx);
                idx
            }
        };

        let group = &mut self.groups[group_idx];
        let layer = match group.layers.iter().position(|t| Arc::ptr_eq(t, tex)) {
            Some(layer) => layer,
            None => {
                group.layers.push(Arc::clone(tex));
                group.layers.len() - 1
            }
        };

        self.infos.push(TexInfoRecord {
            offset: tex.offset,
            atlas: group_idx as f32,
            layer: layer as f32,
            scale: tex.scale,
            uv_set: 0.0,
            _pad: 0.0,
        });
        self.infos.len() - 1
    }

    /// Registered info records so far.
    pub fn infos(&self) -> &[TexInfoRecord] {
        &self.infos
    }

    /// Number of distinct atlas arrays.
    pub fn atlas_count(&self) -> usize {
        self.groups.len()
    }

    /// Pack every group into its concatenated pixel buffer.
    pub fn into_parts(self) -> (Vec<TextureAtlas>, Vec<TexInfoRecord>) {
        let atlases = self
            .groups
            .into_iter()
            .map(|group| {
                let layer_bytes = group.width as usize * group.height as usize * 4;
                let mut pixels = Vec::with_capacity(layer_bytes * group.layers.len());
                for layer in &group.layers {
                    pixels.extend_from_slice(&layer.pixels);
                }
                TextureAtlas {
                    width: group.width,
                    height: group.height,
                    layer_count: group.layers.len() as u32,
                    pixels,
                }
            })
            .collect();
        (atlases, self.infos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tex(width: u32, height: u32, fill: u8) -> Arc<TextureData> {
        let pixels = vec![fill; width as usize * height as usize * 4];
        Arc::new(TextureData::new(width, height, pixels).unwrap())
    }

    #[test]
    fn test_pixel_size_validation() {
        assert!(matches!(
            TextureData::new(2, 2, vec![0; 15]),
            Err(Error::TextureSize {
                expected: 16,
                actual: 15,
                ..
            })
        ));
    }

    #[test]
    fn test_groups_by_resolution() {
        let mut set = AtlasSet::new();
        let a = tex(4, 4, 1);
        let b = tex(8, 8, 2);
        let c = tex(4, 4, 3);

        set.register(&a);
        set.register(&b);
        set.register(&c);

        assert_eq!(set.atlas_count(), 2);
        let infos = set.infos();
        // first-seen group order: 4x4 then 8x8
        assert_eq!(infos[0].atlas, 0.0);
        assert_eq!(infos[0].layer, 0.0);
        assert_eq!(infos[1].atlas, 1.0);
        assert_eq!(infos[1].layer, 0.0);
        assert_eq!(infos[2].atlas, 0.0);
        assert_eq!(infos[2].layer, 1.0);
    }

    #[test]
    fn test_dedupe_by_identity() {
        let mut set = AtlasSet::new();
        let shared = tex(4, 4, 9);
        let lookalike = tex(4, 4, 9);

        let first = set.register(&shared);
        let again = set.register(&shared);
        let other = set.register(&lookalike);

        // same layer for the shared object, distinct info records
        assert_eq!(set.infos()[first].layer, 0.0);
        assert_eq!(set.infos()[again].layer, 0.0);
        assert_ne!(first, again);
        // equal pixels but a different allocation gets its own layer
        assert_eq!(set.infos()[other].layer, 1.0);
    }

    #[test]
    fn test_uv_transform_in_record() {
        let mut set = AtlasSet::new();
        let t = Arc::new(
            TextureData::new(2, 2, vec![0; 16])
                .unwrap()
                .with_transform([0.25, 0.5], [2.0, 3.0]),
        );
        let idx = set.register(&t);
        let info = set.infos()[idx];
        assert_eq!(info.offset, [0.25, 0.5]);
        assert_eq!(info.scale, [2.0, 3.0]);
        assert_eq!(info.uv_set, 0.0);
    }

    #[test]
    fn test_atlas_concatenation() {
        let mut set = AtlasSet::new();
        let a = tex(2, 1, 10);
        let b = tex(2, 1, 20);
        set.register(&a);
        set.register(&b);

        let (atlases, infos) = set.into_parts();
        assert_eq!(atlases.len(), 1);
        assert_eq!(infos.len(), 2);

        let atlas = &atlases[0];
        assert_eq!(atlas.layer_count, 2);
        assert_eq!(atlas.pixels.len(), 16);
        assert!(atlas.pixels[..8].iter().all(|&p| p == 10));
        assert!(atlas.pixels[8..].iter().all(|&p| p == 20));
    }

    #[test]
    fn test_unset_record_defaults() {
        let d = TexInfoRecord::default();
        assert_eq!(d.atlas, TEX_SLOT_UNSET);
        assert_eq!(d.layer, TEX_SLOT_UNSET);
        assert_eq!(d.uv_set, TEX_SLOT_UNSET);
        assert_eq!(
            std::mem::size_of::<TexInfoRecord>(),
            TEX_INFO_FLOATS * std::mem::size_of::<f32>()
        );
    }
}
