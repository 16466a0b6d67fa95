//! Error types for scene preparation.

use thiserror::Error;

/// Main error type for BVH construction and scene assembly.
///
/// Input contract violations fail before any output buffer exists; a
/// partially-populated buffer set is never returned. Degenerate geometry
/// (coincident centroids, zero-extent boxes) is not an error and is
/// handled inside the BVH builder.
#[derive(Error, Debug)]
pub enum Error {
    /// Scene or triangle stream contains no triangles
    #[error("scene contains no triangles")]
    EmptyScene,

    /// Vertex stride below the 3 floats needed for a position
    #[error("vertex stride {0} too small (positions need 3 floats)")]
    InvalidStride(usize),

    /// Stream length is not a whole number of triangles
    #[error("stream of {len} floats is not a whole number of triangles at stride {stride}")]
    TruncatedStream { len: usize, stride: usize },

    /// Mesh has no position attribute
    #[error("mesh {0} has no position data")]
    MissingPositions(usize),

    /// Non-indexed mesh vertex count is not a multiple of 3
    #[error("mesh {mesh} has {count} vertices, not a whole number of triangles")]
    VertexCount { mesh: usize, count: usize },

    /// Optional attribute channel length differs from the position count
    #[error("mesh {mesh} attribute `{attribute}` has {actual} entries, expected {expected}")]
    AttributeMismatch {
        mesh: usize,
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Index buffer length is not a multiple of 3
    #[error("mesh {mesh} index count {count} is not divisible by 3")]
    IndexCount { mesh: usize, count: usize },

    /// Index references a vertex past the end of the mesh
    #[error("mesh {mesh} index {index} out of bounds (vertex count {vertex_count})")]
    IndexOutOfBounds {
        mesh: usize,
        index: u32,
        vertex_count: usize,
    },

    /// Material group boundary count differs from the material count
    #[error("{boundaries} material group boundaries for {materials} materials")]
    MaterialCount { boundaries: usize, materials: usize },

    /// Boundary list does not end at the scene triangle count
    #[error("material boundaries end at triangle {actual}, expected {expected}")]
    BoundaryCoverage { expected: u32, actual: u32 },

    /// Boundary list decreases at the given entry
    #[error("material boundaries must be non-decreasing (entry {0})")]
    BoundaryOrder(usize),

    /// Buffer does not fit the consuming backend's data-texture limits
    #[error("{resource} needs {required} texels, exceeds a {limit}x{limit} data texture")]
    CapacityExceeded {
        resource: &'static str,
        required: usize,
        limit: usize,
    },

    /// Decoded texture pixel data does not match its dimensions
    #[error("texture pixel data is {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    TextureSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Result type alias for scene preparation operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::EmptyScene;
        assert!(e.to_string().contains("no triangles"));

        let e = Error::IndexOutOfBounds {
            mesh: 2,
            index: 17,
            vertex_count: 9,
        };
        assert!(e.to_string().contains("17"));
        assert!(e.to_string().contains("9"));

        let e = Error::CapacityExceeded {
            resource: "triangle data",
            required: 1 << 30,
            limit: 16384,
        };
        assert!(e.to_string().contains("16384"));
    }
}
