//! Midpoint-split BVH builder.
//!
//! Splits at the center of the node bounds on the largest axis, swapping
//! entries of a triangle index permutation in place. Node records are
//! allocated directly in the output vector as the tree grows (record ids
//! are array offsets, two fresh ids per split, root at 0), so no
//! intermediate node graph exists and no separate flattening pass runs.

use bytemuck::Zeroable;
use glam::Vec3;
use tracing::{debug, trace, warn};

use crate::util::{Error, Result};

use super::{Aabb, BvhNode};

/// Build parameters.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BvhConfig {
    /// Ranges at or below this size become leaves.
    pub max_leaf_tris: usize,
    /// Optional depth limit; `None` leaves depth bounded by the leaf test
    /// alone.
    pub max_depth: Option<usize>,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            max_leaf_tris: 8,
            max_depth: None,
        }
    }
}

/// Borrowed triangle position stream.
///
/// `stride` is the float count per vertex; the first three floats of each
/// vertex are its position and the rest is opaque payload. Three
/// consecutive vertices form one triangle, so the triangle count is
/// `data.len() / (3 * stride)`.
#[derive(Clone, Copy)]
pub struct TriangleStream<'a> {
    data: &'a [f32],
    stride: usize,
}

impl<'a> TriangleStream<'a> {
    pub fn new(data: &'a [f32], stride: usize) -> Result<Self> {
        if stride < 3 {
            return Err(Error::InvalidStride(stride));
        }
        if data.len() % (stride * 3) != 0 {
            return Err(Error::TruncatedStream {
                len: data.len(),
                stride,
            });
        }
        Ok(Self { data, stride })
    }

    /// Number of triangles in the stream.
    pub fn triangle_count(&self) -> usize {
        self.data.len() / (self.stride * 3)
    }

    #[inline]
    fn triangle(&self, tri: usize) -> [Vec3; 3] {
        let base = tri * 3 * self.stride;
        let v = |corner: usize| {
            let at = base + corner * self.stride;
            Vec3::new(self.data[at], self.data[at + 1], self.data[at + 2])
        };
        [v(0), v(1), v(2)]
    }
}

/// Statistics recorded during a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildStats {
    /// Total node records, internal and leaf.
    pub node_count: usize,
    /// Leaf records only.
    pub leaf_count: usize,
    /// Deepest level reached (root = 0).
    pub depth: usize,
}

/// Built BVH: flat node records plus the triangle permutation.
///
/// `permutation[i]` names the original triangle whose data belongs at row
/// `i` of any per-triangle buffer consumed alongside the tree.
pub struct Bvh {
    /// Flat node array (index 0 = root).
    pub nodes: Vec<BvhNode>,
    /// Reordered triangle indices (leaf ranges index into this).
    pub permutation: Vec<u32>,
    /// Build statistics.
    pub stats: BuildStats,
}

impl Bvh {
    /// Node records viewed as raw floats (8 per node).
    pub fn node_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.nodes)
    }
}

/// Build a BVH over a triangle stream.
///
/// The stream is read-only; the returned permutation starts as identity
/// and is mutated by swaps only, so it stays a bijection on `[0, N)`.
/// Zero triangles violate the input contract and fail up front.
#[tracing::instrument(skip_all, fields(tri_count = stream.triangle_count()))]
pub fn build(stream: TriangleStream<'_>, config: &BvhConfig) -> Result<Bvh> {
    let n = stream.triangle_count();
    if n == 0 {
        return Err(Error::EmptyScene);
    }

    let mut builder = Builder {
        stream,
        config,
        permutation: (0..n as u32).collect(),
        nodes: vec![BvhNode::zeroed()],
        stats: BuildStats::default(),
    };

    let root_aabb = builder.range_aabb(0, n);
    builder.subdivide(0, 0, n, root_aabb, 0);

    let stats = BuildStats {
        node_count: builder.nodes.len(),
        ..builder.stats
    };
    debug!(
        nodes = stats.node_count,
        leaves = stats.leaf_count,
        depth = stats.depth,
        "bvh built"
    );

    Ok(Bvh {
        nodes: builder.nodes,
        permutation: builder.permutation,
        stats,
    })
}

struct Builder<'a> {
    stream: TriangleStream<'a>,
    config: &'a BvhConfig,
    permutation: Vec<u32>,
    nodes: Vec<BvhNode>,
    stats: BuildStats,
}

impl Builder<'_> {
    /// Tight bounds of the triangles in permutation range `[si, ei)`.
    fn range_aabb(&self, si: usize, ei: usize) -> Aabb {
        let mut aabb = Aabb::EMPTY;
        for &tri in &self.permutation[si..ei] {
            let [a, b, c] = self.stream.triangle(tri as usize);
            aabb.expand_triangle(a, b, c);
        }
        aabb
    }

    fn subdivide(&mut self, node: usize, si: usize, ei: usize, aabb: Aabb, depth: usize) {
        self.stats.depth = self.stats.depth.max(depth);

        if ei == si {
            // Caller contract violation; the leaf test below never
            // produces an empty range. Keep the tree valid instead of
            // recursing or crashing.
            warn!(node, si, "empty triangle range, emitting zero-length leaf");
            self.nodes[node] = BvhNode::leaf(
                &Aabb {
                    min: Vec3::ZERO,
                    max: Vec3::ZERO,
                },
                si,
                si,
            );
            self.stats.leaf_count += 1;
            return;
        }

        let count = ei - si;
        let depth_capped = self.config.max_depth.is_some_and(|limit| depth >= limit);
        if count <= self.config.max_leaf_tris || depth_capped {
            self.nodes[node] = BvhNode::leaf(&aabb, si, ei);
            self.stats.leaf_count += 1;
            return;
        }

        let axis = aabb.max_extent_axis();
        let split = aabb.center()[axis];

        // Two fresh records per split; their offsets are their ids.
        let left_id = self.nodes.len();
        let right_id = left_id + 1;
        self.nodes.push(BvhNode::zeroed());
        self.nodes.push(BvhNode::zeroed());

        // Two-pointer partition: triangles whose centroid lies below the
        // split stay in front, the rest are swapped toward the back.
        // Child bounds accumulate from full triangle extents as we go.
        let mut left_aabb = Aabb::EMPTY;
        let mut right_aabb = Aabb::EMPTY;
        let mut li = si;
        let mut ri = ei;
        for _ in 0..count {
            let [a, b, c] = self.stream.triangle(self.permutation[li] as usize);
            let centroid = (a + b + c) * (1.0 / 3.0);
            if centroid[axis] < split {
                left_aabb.expand_triangle(a, b, c);
                li += 1;
            } else {
                right_aabb.expand_triangle(a, b, c);
                ri -= 1;
                self.permutation.swap(li, ri);
            }
        }

        let mid = if li != si && li != ei {
            li
        } else {
            // Every centroid landed on one side (coincident centroids or a
            // zero-extent axis). Fall back to the numeric midpoint, which
            // strictly shrinks both children, and rebuild their bounds.
            trace!(node, count, "one-sided partition, splitting at midpoint");
            let mid = si + count / 2;
            left_aabb = self.range_aabb(si, mid);
            right_aabb = self.range_aabb(mid, ei);
            mid
        };

        self.nodes[node] = BvhNode::internal(&aabb, left_id, right_id);
        self.subdivide(left_id, si, mid, left_aabb, depth + 1);
        self.subdivide(right_id, mid, ei, right_aabb, depth + 1);
    }
}
