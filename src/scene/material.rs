//! Material parameters and their fixed 64-float records.
//!
//! The record layout is a versioned contract shared with shader-side
//! lookup code. It is defined once, as the [`offset`] constants plus the
//! [`MATERIAL_SCHEMA`] field table; the record writer and the generated
//! shader defines both derive from that single source, so producer and
//! consumer cannot drift apart silently.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use super::texture::{AtlasSet, TextureData};

/// Floats per material record.
pub const MATERIAL_RECORD_FLOATS: usize = 64;

/// Sentinel for texture-valued fields with no texture bound.
pub const NO_TEXTURE: f32 = -1.0;

/// Record offsets. Single source of truth for the schema table, the
/// record writer and the generated shader defines.
pub mod offset {
    pub const ALBEDO: usize = 0;
    pub const METALLIC: usize = 3;
    pub const ROUGHNESS: usize = 4;
    pub const ANISOTROPY: usize = 5;
    pub const ANISOTROPY_ROTATION: usize = 6;
    pub const TRANSPARENCY: usize = 7;
    pub const CUTOUT_OPACITY: usize = 8;
    pub const DOUBLE_SIDED: usize = 9;
    pub const NORMAL_SCALE: usize = 10;
    pub const IOR: usize = 11;
    pub const SPECULAR_TINT: usize = 12;
    pub const SPECULAR: usize = 15;
    pub const SHEEN_COLOR: usize = 16;
    pub const SHEEN_ROUGHNESS: usize = 19;
    pub const EMISSION: usize = 20;
    pub const CLEARCOAT_NORMAL_SCALE: usize = 23;
    pub const CLEARCOAT: usize = 24;
    pub const CLEARCOAT_ROUGHNESS: usize = 25;
    pub const TRANSLUCENCY: usize = 26;
    pub const ALPHA_CUTOFF: usize = 27;
    pub const ATTENUATION_COLOR: usize = 28;
    pub const ATTENUATION_DISTANCE: usize = 31;
    pub const SUBSURFACE_COLOR: usize = 32;
    pub const THIN_WALLED: usize = 35;
    pub const ANISOTROPY_DIRECTION: usize = 36;
    pub const TRANSLUCENCY_TEXTURE: usize = 39;
    pub const IRIDESCENCE: usize = 40;
    pub const IRIDESCENCE_IOR: usize = 41;
    pub const IRIDESCENCE_THICKNESS_MIN: usize = 42;
    pub const IRIDESCENCE_THICKNESS_MAX: usize = 43;
    pub const ALBEDO_TEXTURE: usize = 44;
    pub const METALLIC_ROUGHNESS_TEXTURE: usize = 45;
    pub const NORMAL_TEXTURE: usize = 46;
    pub const EMISSION_TEXTURE: usize = 47;
    pub const SPECULAR_TEXTURE: usize = 48;
    pub const SPECULAR_COLOR_TEXTURE: usize = 49;
    pub const TRANSMISSION_TEXTURE: usize = 50;
    pub const CLEARCOAT_TEXTURE: usize = 51;
    pub const CLEARCOAT_ROUGHNESS_TEXTURE: usize = 52;
    pub const CLEARCOAT_NORMAL_TEXTURE: usize = 53;
    pub const SHEEN_COLOR_TEXTURE: usize = 54;
    pub const SHEEN_ROUGHNESS_TEXTURE: usize = 55;
    pub const ANISOTROPY_TEXTURE: usize = 56;
    pub const ANISOTROPY_DIRECTION_TEXTURE: usize = 57;
    pub const IRIDESCENCE_TEXTURE: usize = 58;
    pub const IRIDESCENCE_THICKNESS_TEXTURE: usize = 59;
    pub const TRANSLUCENCY_COLOR: usize = 60;
    pub const TRANSLUCENCY_COLOR_TEXTURE: usize = 63;
}

/// One named field of the material record.
#[derive(Debug, Clone, Copy)]
pub struct MaterialField {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
}

macro_rules! field {
    ($name:ident, $width:expr) => {
        MaterialField {
            name: stringify!($name),
            offset: offset::$name,
            width: $width,
        }
    };
}

/// Ordered field map of the material record.
pub const MATERIAL_SCHEMA: &[MaterialField] = &[
    field!(ALBEDO, 3),
    field!(METALLIC, 1),
    field!(ROUGHNESS, 1),
    field!(ANISOTROPY, 1),
    field!(ANISOTROPY_ROTATION, 1),
    field!(TRANSPARENCY, 1),
    field!(CUTOUT_OPACITY, 1),
    field!(DOUBLE_SIDED, 1),
    field!(NORMAL_SCALE, 1),
    field!(IOR, 1),
    field!(SPECULAR_TINT, 3),
    field!(SPECULAR, 1),
    field!(SHEEN_COLOR, 3),
    field!(SHEEN_ROUGHNESS, 1),
    field!(EMISSION, 3),
    field!(CLEARCOAT_NORMAL_SCALE, 1),
    field!(CLEARCOAT, 1),
    field!(CLEARCOAT_ROUGHNESS, 1),
    field!(TRANSLUCENCY, 1),
    field!(ALPHA_CUTOFF, 1),
    field!(ATTENUATION_COLOR, 3),
    field!(ATTENUATION_DISTANCE, 1),
    field!(SUBSURFACE_COLOR, 3),
    field!(THIN_WALLED, 1),
    field!(ANISOTROPY_DIRECTION, 3),
    field!(TRANSLUCENCY_TEXTURE, 1),
    field!(IRIDESCENCE, 1),
    field!(IRIDESCENCE_IOR, 1),
    field!(IRIDESCENCE_THICKNESS_MIN, 1),
    field!(IRIDESCENCE_THICKNESS_MAX, 1),
    field!(ALBEDO_TEXTURE, 1),
    field!(METALLIC_ROUGHNESS_TEXTURE, 1),
    field!(NORMAL_TEXTURE, 1),
    field!(EMISSION_TEXTURE, 1),
    field!(SPECULAR_TEXTURE, 1),
    field!(SPECULAR_COLOR_TEXTURE, 1),
    field!(TRANSMISSION_TEXTURE, 1),
    field!(CLEARCOAT_TEXTURE, 1),
    field!(CLEARCOAT_ROUGHNESS_TEXTURE, 1),
    field!(CLEARCOAT_NORMAL_TEXTURE, 1),
    field!(SHEEN_COLOR_TEXTURE, 1),
    field!(SHEEN_ROUGHNESS_TEXTURE, 1),
    field!(ANISOTROPY_TEXTURE, 1),
    field!(ANISOTROPY_DIRECTION_TEXTURE, 1),
    field!(IRIDESCENCE_TEXTURE, 1),
    field!(IRIDESCENCE_THICKNESS_TEXTURE, 1),
    field!(TRANSLUCENCY_COLOR, 3),
    field!(TRANSLUCENCY_COLOR_TEXTURE, 1),
];

/// Generate `#define` lines for shader-side record access, one per schema
/// field, plus the record width.
pub fn material_shader_defines() -> String {
    let mut out = String::with_capacity(MATERIAL_SCHEMA.len() * 32);
    out.push_str(&format!("#define MATERIAL_FLOATS {MATERIAL_RECORD_FLOATS}\n"));
    for field in MATERIAL_SCHEMA {
        out.push_str(&format!("#define MAT_{} {}\n", field.name, field.offset));
    }
    out
}

/// Optional texture references, one per textured material parameter.
#[derive(Debug, Clone, Default)]
pub struct MaterialTextures {
    pub albedo: Option<Arc<TextureData>>,
    pub metallic_roughness: Option<Arc<TextureData>>,
    pub normal: Option<Arc<TextureData>>,
    pub emission: Option<Arc<TextureData>>,
    pub specular: Option<Arc<TextureData>>,
    pub specular_color: Option<Arc<TextureData>>,
    pub transmission: Option<Arc<TextureData>>,
    pub clearcoat: Option<Arc<TextureData>>,
    pub clearcoat_roughness: Option<Arc<TextureData>>,
    pub clearcoat_normal: Option<Arc<TextureData>>,
    pub sheen_color: Option<Arc<TextureData>>,
    pub sheen_roughness: Option<Arc<TextureData>>,
    pub anisotropy: Option<Arc<TextureData>>,
    pub anisotropy_direction: Option<Arc<TextureData>>,
    pub iridescence: Option<Arc<TextureData>>,
    pub iridescence_thickness: Option<Arc<TextureData>>,
    pub translucency: Option<Arc<TextureData>>,
    pub translucency_color: Option<Arc<TextureData>>,
}

/// Physically-based material parameters as delivered by the importer.
///
/// Defaults are the values the record carries when the importer supplies
/// nothing; where zero would be physically wrong (index of refraction,
/// attenuation distance) the default is a plausible dielectric / an
/// effectively infinite distance instead.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub albedo: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub anisotropy: f32,
    pub anisotropy_rotation: f32,
    pub anisotropy_direction: [f32; 3],
    /// Transmission weight.
    pub transparency: f32,
    pub cutout_opacity: f32,
    pub double_sided: bool,
    pub normal_scale: f32,
    pub ior: f32,
    pub specular: f32,
    pub specular_tint: [f32; 3],
    pub sheen_color: [f32; 3],
    pub sheen_roughness: f32,
    pub emission: [f32; 3],
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub clearcoat_normal_scale: f32,
    pub translucency: f32,
    pub translucency_color: [f32; 3],
    pub alpha_cutoff: f32,
    pub attenuation_color: [f32; 3],
    /// Volume attenuation distance; 0 means "no attenuation" and encodes
    /// as the maximum representable value.
    pub attenuation_distance: f32,
    pub subsurface_color: [f32; 3],
    pub thin_walled: bool,
    pub iridescence: f32,
    pub iridescence_ior: f32,
    pub iridescence_thickness_range: [f32; 2],
    pub textures: MaterialTextures,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            albedo: [1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 0.0,
            anisotropy: 0.0,
            anisotropy_rotation: 0.0,
            anisotropy_direction: [1.0, 0.0, 0.0],
            transparency: 0.0,
            cutout_opacity: 1.0,
            double_sided: true,
            normal_scale: 1.0,
            ior: 1.49,
            specular: 1.0,
            specular_tint: [1.0, 1.0, 1.0],
            sheen_color: [0.0, 0.0, 0.0],
            sheen_roughness: 0.0,
            emission: [0.0, 0.0, 0.0],
            clearcoat: 0.0,
            clearcoat_roughness: 0.0,
            clearcoat_normal_scale: 1.0,
            translucency: 0.0,
            translucency_color: [1.0, 1.0, 1.0],
            alpha_cutoff: 0.0,
            attenuation_color: [1.0, 1.0, 1.0],
            attenuation_distance: f32::MAX,
            subsurface_color: [1.0, 1.0, 1.0],
            thin_walled: true,
            iridescence: 0.0,
            iridescence_ior: 1.3,
            iridescence_thickness_range: [100.0, 400.0],
            textures: MaterialTextures::default(),
        }
    }
}

impl Material {
    /// Encode into the fixed record, registering referenced textures and
    /// storing their texture-info indices.
    ///
    /// Textures register in record-offset order, so info indices are
    /// deterministic for a given material list.
    pub fn encode(&self, atlas: &mut AtlasSet) -> MaterialRecord {
        let mut rec = MaterialRecord::zeroed();

        rec.put3(offset::ALBEDO, self.albedo);
        rec.put(offset::METALLIC, self.metallic);
        rec.put(offset::ROUGHNESS, self.roughness);
        rec.put(offset::ANISOTROPY, self.anisotropy);
        rec.put(offset::ANISOTROPY_ROTATION, self.anisotropy_rotation);
        rec.put(offset::TRANSPARENCY, self.transparency);
        rec.put(offset::CUTOUT_OPACITY, self.cutout_opacity);
        rec.put(offset::DOUBLE_SIDED, flag(self.double_sided));
        rec.put(offset::NORMAL_SCALE, self.normal_scale);
        rec.put(offset::IOR, self.ior);
        rec.put3(offset::SPECULAR_TINT, self.specular_tint);
        rec.put(offset::SPECULAR, self.specular);
        rec.put3(offset::SHEEN_COLOR, self.sheen_color);
        rec.put(offset::SHEEN_ROUGHNESS, self.sheen_roughness);
        rec.put3(offset::EMISSION, self.emission);
        rec.put(offset::CLEARCOAT_NORMAL_SCALE, self.clearcoat_normal_scale);
        rec.put(offset::CLEARCOAT, self.clearcoat);
        rec.put(offset::CLEARCOAT_ROUGHNESS, self.clearcoat_roughness);
        rec.put(offset::TRANSLUCENCY, self.translucency);
        rec.put(offset::ALPHA_CUTOFF, self.alpha_cutoff);
        rec.put3(offset::ATTENUATION_COLOR, self.attenuation_color);
        // zero distance means no attenuation at all
        let attenuation = if self.attenuation_distance == 0.0 {
            f32::MAX
        } else {
            self.attenuation_distance
        };
        rec.put(offset::ATTENUATION_DISTANCE, attenuation);
        rec.put3(offset::SUBSURFACE_COLOR, self.subsurface_color);
        rec.put(offset::THIN_WALLED, flag(self.thin_walled));
        rec.put3(offset::ANISOTROPY_DIRECTION, self.anisotropy_direction);
        rec.put(offset::IRIDESCENCE, self.iridescence);
        rec.put(offset::IRIDESCENCE_IOR, self.iridescence_ior);
        rec.put(
            offset::IRIDESCENCE_THICKNESS_MIN,
            self.iridescence_thickness_range[0],
        );
        rec.put(
            offset::IRIDESCENCE_THICKNESS_MAX,
            self.iridescence_thickness_range[1],
        );
        rec.put3(offset::TRANSLUCENCY_COLOR, self.translucency_color);

        let t = &self.textures;
        for (off, tex) in [
            (offset::TRANSLUCENCY_TEXTURE, &t.translucency),
            (offset::ALBEDO_TEXTURE, &t.albedo),
            (offset::METALLIC_ROUGHNESS_TEXTURE, &t.metallic_roughness),
            (offset::NORMAL_TEXTURE, &t.normal),
            (offset::EMISSION_TEXTURE, &t.emission),
            (offset::SPECULAR_TEXTURE, &t.specular),
            (offset::SPECULAR_COLOR_TEXTURE, &t.specular_color),
            (offset::TRANSMISSION_TEXTURE, &t.transmission),
            (offset::CLEARCOAT_TEXTURE, &t.clearcoat),
            (offset::CLEARCOAT_ROUGHNESS_TEXTURE, &t.clearcoat_roughness),
            (offset::CLEARCOAT_NORMAL_TEXTURE, &t.clearcoat_normal),
            (offset::SHEEN_COLOR_TEXTURE, &t.sheen_color),
            (offset::SHEEN_ROUGHNESS_TEXTURE, &t.sheen_roughness),
            (offset::ANISOTROPY_TEXTURE, &t.anisotropy),
            (offset::ANISOTROPY_DIRECTION_TEXTURE, &t.anisotropy_direction),
            (offset::IRIDESCENCE_TEXTURE, &t.iridescence),
            (offset::IRIDESCENCE_THICKNESS_TEXTURE, &t.iridescence_thickness),
            (offset::TRANSLUCENCY_COLOR_TEXTURE, &t.translucency_color),
        ] {
            let id = match tex {
                Some(tex) => atlas.register(tex) as f32,
                None => NO_TEXTURE,
            };
            rec.put(off, id);
        }

        rec
    }
}

#[inline]
fn flag(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Flat material record (64 floats), written only through the schema
/// offsets.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialRecord([f32; MATERIAL_RECORD_FLOATS]);

impl MaterialRecord {
    /// The raw floats.
    pub fn floats(&self) -> &[f32; MATERIAL_RECORD_FLOATS] {
        &self.0
    }

    /// Read one float by schema offset.
    pub fn get(&self, offset: usize) -> f32 {
        self.0[offset]
    }

    fn put(&mut self, offset: usize, value: f32) {
        self.0[offset] = value;
    }

    fn put3(&mut self, offset: usize, value: [f32; 3]) {
        self.0[offset..offset + 3].copy_from_slice(&value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_schema_covers_record_exactly() {
        let mut fields: Vec<_> = MATERIAL_SCHEMA.to_vec();
        fields.sort_by_key(|f| f.offset);

        let mut cursor = 0;
        for f in &fields {
            assert_eq!(f.offset, cursor, "gap or overlap before field {}", f.name);
            cursor += f.width;
        }
        assert_eq!(cursor, MATERIAL_RECORD_FLOATS);
    }

    #[test]
    fn test_default_record_values() {
        let mut atlas = AtlasSet::new();
        let rec = Material::default().encode(&mut atlas);

        assert_eq!(rec.get(offset::ALBEDO), 1.0);
        assert_eq!(rec.get(offset::METALLIC), 0.0);
        assert_eq!(rec.get(offset::CUTOUT_OPACITY), 1.0);
        assert_eq!(rec.get(offset::DOUBLE_SIDED), 1.0);
        assert_eq!(rec.get(offset::IOR), 1.49);
        assert_eq!(rec.get(offset::ATTENUATION_DISTANCE), f32::MAX);
        assert_eq!(rec.get(offset::THIN_WALLED), 1.0);
        assert_eq!(rec.get(offset::ANISOTROPY_DIRECTION), 1.0);
        assert_eq!(rec.get(offset::IRIDESCENCE_IOR), 1.3);
        assert_eq!(rec.get(offset::IRIDESCENCE_THICKNESS_MIN), 100.0);
        assert_eq!(rec.get(offset::IRIDESCENCE_THICKNESS_MAX), 400.0);
        assert_eq!(rec.get(offset::TRANSLUCENCY_COLOR), 1.0);

        // no textures registered
        for f in MATERIAL_SCHEMA.iter().filter(|f| f.name.ends_with("_TEXTURE")) {
            assert_eq!(rec.get(f.offset), NO_TEXTURE, "field {}", f.name);
        }
        assert_eq!(atlas.infos().len(), 0);
    }

    #[test]
    fn test_attenuation_zero_remaps_to_max() {
        let mut atlas = AtlasSet::new();
        let rec = Material {
            attenuation_distance: 0.0,
            ..Default::default()
        }
        .encode(&mut atlas);
        assert_eq!(rec.get(offset::ATTENUATION_DISTANCE), f32::MAX);

        let rec = Material {
            attenuation_distance: 2.5,
            ..Default::default()
        }
        .encode(&mut atlas);
        assert_eq!(rec.get(offset::ATTENUATION_DISTANCE), 2.5);
    }

    #[test]
    fn test_texture_registration() {
        let mut atlas = AtlasSet::new();
        let tex = Arc::new(TextureData::new(2, 2, vec![0; 16]).unwrap());

        let rec = Material {
            textures: MaterialTextures {
                albedo: Some(Arc::clone(&tex)),
                normal: Some(Arc::clone(&tex)),
                ..Default::default()
            },
            ..Default::default()
        }
        .encode(&mut atlas);

        // two references, two info records, one shared atlas layer
        assert_eq!(rec.get(offset::ALBEDO_TEXTURE), 0.0);
        assert_eq!(rec.get(offset::NORMAL_TEXTURE), 1.0);
        assert_eq!(rec.get(offset::EMISSION_TEXTURE), NO_TEXTURE);
        assert_eq!(atlas.infos().len(), 2);
        assert_eq!(atlas.infos()[0].layer, atlas.infos()[1].layer);
        assert_eq!(atlas.atlas_count(), 1);
    }

    #[test]
    fn test_record_size() {
        assert_eq!(
            std::mem::size_of::<MaterialRecord>(),
            MATERIAL_RECORD_FLOATS * std::mem::size_of::<f32>()
        );
    }

    #[test]
    fn test_shader_defines_track_schema() {
        let defines = material_shader_defines();
        assert!(defines.contains("#define MATERIAL_FLOATS 64"));
        assert!(defines.contains("#define MAT_ALBEDO 0"));
        assert!(defines.contains("#define MAT_IOR 11"));
        assert!(defines.contains("#define MAT_TRANSLUCENCY_COLOR_TEXTURE 63"));
        assert_eq!(defines.lines().count(), MATERIAL_SCHEMA.len() + 1);
    }
}
