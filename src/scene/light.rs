//! Light descriptions and their flat records.
//!
//! Lights are carried through to the consumer as data; no sampling or
//! importance precomputation happens here. Current shader consumers read
//! only the first record.

use bytemuck::{Pod, Zeroable};

/// Floats per flat light record.
pub const LIGHT_RECORD_FLOATS: usize = 8;

/// Light category, stored numerically in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LightKind {
    /// Point light, the only kind the shader side evaluates.
    #[default]
    Point,
    /// Any other importer light, passed through untyped.
    Other,
}

impl LightKind {
    fn encode(self) -> f32 {
        match self {
            LightKind::Point => 0.0,
            LightKind::Other => 1.0,
        }
    }
}

/// One light as delivered by the scene importer.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Light {
    /// World-space position.
    pub position: [f32; 3],
    pub kind: LightKind,
    /// Color scaled by intensity.
    pub emission: [f32; 3],
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: [1.0, 1.0, 1.0],
            kind: LightKind::Point,
            emission: [1.0, 1.0, 1.0],
        }
    }
}

impl Light {
    /// Flatten into the 8-float record.
    pub fn record(&self) -> LightRecord {
        LightRecord {
            position: self.position,
            kind: self.kind.encode(),
            emission: self.emission,
            _pad: 0.0,
        }
    }
}

/// Flat light record: `[position, kind, emission, pad]`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightRecord {
    pub position: [f32; 3],
    pub kind: f32,
    pub emission: [f32; 3],
    _pad: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        assert_eq!(
            std::mem::size_of::<LightRecord>(),
            LIGHT_RECORD_FLOATS * std::mem::size_of::<f32>()
        );

        let l = Light {
            position: [1.0, 2.0, 3.0],
            kind: LightKind::Other,
            emission: [4.0, 5.0, 6.0],
        };
        let r = l.record();
        let f: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&r));
        assert_eq!(f, &[1.0, 2.0, 3.0, 1.0, 4.0, 5.0, 6.0, 0.0]);
    }

    #[test]
    fn test_default_light() {
        let r = Light::default().record();
        assert_eq!(r.kind, 0.0);
        assert_eq!(r.position, [1.0, 1.0, 1.0]);
        assert_eq!(r.emission, [1.0, 1.0, 1.0]);
    }
}
