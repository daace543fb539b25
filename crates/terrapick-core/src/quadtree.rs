//! Quad-tree spatial index over terrain triangles.
//!
//! The tree partitions the terrain footprint in the XZ plane. Each leaf owns
//! a contiguous run of the tree's shared index buffer, grouped in triangles.
//! Leaf bounds are recomputed from the leaf's own triangles, so every leaf
//! fully contains its triangles while siblings may overlap.

use std::collections::BTreeMap;
use std::ops::Range;

use glam::Vec3;

use crate::error::{PickError, Result};
use crate::ray::Aabb;

/// Maximum depth of the tree to bound recursion on degenerate input.
const MAX_DEPTH: u32 = 16;

/// Payload of a quad-tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Internal node with child nodes.
    Internal(Vec<QuadNode>),
    /// Leaf node owning a range of the shared index buffer.
    Leaf(Range<usize>),
}

/// A single node of the quad-tree.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadNode {
    key: u32,
    bounds: Aabb,
    kind: NodeKind,
}

impl QuadNode {
    /// Creates a leaf owning `indices` of the shared index buffer.
    #[must_use]
    pub fn leaf(key: u32, bounds: Aabb, indices: Range<usize>) -> Self {
        Self {
            key,
            bounds,
            kind: NodeKind::Leaf(indices),
        }
    }

    /// Creates an internal node.
    #[must_use]
    pub fn internal(key: u32, bounds: Aabb, children: Vec<QuadNode>) -> Self {
        Self {
            key,
            bounds,
            kind: NodeKind::Internal(children),
        }
    }

    /// Returns the node's stable key.
    #[must_use]
    pub fn key(&self) -> u32 {
        self.key
    }

    /// Returns the node's bounding volume.
    #[must_use]
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Returns the node payload.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns true for leaves.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// Returns the children of an internal node, or an empty slice for a leaf.
    #[must_use]
    pub fn children(&self) -> &[QuadNode] {
        match &self.kind {
            NodeKind::Internal(children) => children,
            NodeKind::Leaf(_) => &[],
        }
    }
}

/// Static quad-tree over a terrain's triangles.
#[derive(Debug, Clone)]
pub struct QuadTree {
    root: QuadNode,
    indices: Vec<u32>,
    leaves: BTreeMap<u32, Range<usize>>,
    node_count: usize,
}

impl QuadTree {
    /// Builds the index from a triangle list.
    ///
    /// Nodes holding more than `leaf_triangle_budget` triangles are split into
    /// XZ quadrants around the center of their triangles' centroids. Keys are
    /// assigned in depth-first pre-order starting at 0.
    pub fn build(positions: &[Vec3], indices: &[u32], leaf_triangle_budget: usize) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(PickError::MalformedIndexRun {
                len: indices.len(),
                leaf_key: None,
            });
        }
        if indices.is_empty() {
            return Err(PickError::EmptyTree);
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(PickError::InvalidIndex {
                index,
                vertex_count: positions.len(),
                leaf_key: None,
            });
        }

        let triangles: Vec<[u32; 3]> = indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect();

        let mut builder = Builder {
            positions,
            budget: leaf_triangle_budget.max(1),
            next_key: 0,
            indices: Vec::with_capacity(indices.len()),
            leaves: BTreeMap::new(),
        };
        let root = builder.build_node(triangles, 0);
        let node_count = builder.next_key as usize;

        log::info!(
            "built terrain quad-tree: {} triangles, {} nodes, {} leaves",
            indices.len() / 3,
            node_count,
            builder.leaves.len()
        );

        Ok(Self {
            root,
            indices: builder.indices,
            leaves: builder.leaves,
            node_count,
        })
    }

    /// Wraps a hand-built node hierarchy and its shared index buffer.
    ///
    /// Checks that keys are unique and that every leaf range lies inside
    /// `indices` and covers whole triangles. Vertex bounds are not checked
    /// here; an out-of-range vertex index surfaces when the leaf is picked.
    pub fn from_root(root: QuadNode, indices: Vec<u32>) -> Result<Self> {
        let mut leaves = BTreeMap::new();
        let mut keys = std::collections::BTreeSet::new();
        let mut stack = vec![&root];

        while let Some(node) = stack.pop() {
            if !keys.insert(node.key) {
                return Err(PickError::DuplicateKey(node.key));
            }
            match &node.kind {
                NodeKind::Internal(children) => stack.extend(children.iter()),
                NodeKind::Leaf(range) => {
                    if range.start > range.end || range.end > indices.len() {
                        return Err(PickError::LeafRangeOutOfBounds {
                            leaf_key: node.key,
                            start: range.start,
                            end: range.end,
                            len: indices.len(),
                        });
                    }
                    if range.len() % 3 != 0 {
                        return Err(PickError::MalformedIndexRun {
                            len: range.len(),
                            leaf_key: Some(node.key),
                        });
                    }
                    leaves.insert(node.key, range.clone());
                }
            }
        }

        let node_count = keys.len();
        Ok(Self {
            root,
            indices,
            leaves,
            node_count,
        })
    }

    /// Returns the root node.
    #[must_use]
    pub fn root(&self) -> &QuadNode {
        &self.root
    }

    /// Returns the bounds of the whole tree.
    #[must_use]
    pub fn bounds(&self) -> &Aabb {
        self.root.bounds()
    }

    /// Returns the shared index buffer.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Returns the index run owned by a leaf.
    pub fn leaf_indices(&self, key: u32) -> Result<&[u32]> {
        let range = self.leaves.get(&key).ok_or(PickError::UnknownLeaf(key))?;
        Ok(&self.indices[range.clone()])
    }

    /// Returns leaf keys in ascending order.
    pub fn leaf_keys(&self) -> impl Iterator<Item = u32> + '_ {
        self.leaves.keys().copied()
    }

    /// Returns the number of leaves.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Returns the total number of nodes, leaves included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Returns the number of triangles across all leaves.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.leaves.values().map(|r| r.len() / 3).sum()
    }
}

struct Builder<'a> {
    positions: &'a [Vec3],
    budget: usize,
    next_key: u32,
    indices: Vec<u32>,
    leaves: BTreeMap<u32, Range<usize>>,
}

impl Builder<'_> {
    fn centroid(&self, tri: &[u32; 3]) -> Vec3 {
        tri.iter()
            .map(|&i| self.positions[i as usize])
            .sum::<Vec3>()
            / 3.0
    }

    fn build_node(&mut self, triangles: Vec<[u32; 3]>, depth: u32) -> QuadNode {
        let key = self.next_key;
        self.next_key += 1;

        if triangles.len() <= self.budget || depth >= MAX_DEPTH {
            return self.make_leaf(key, &triangles);
        }

        // Split around the middle of the centroid footprint. Unless every
        // centroid shares the same X and Z, at least two quadrants fill.
        let Some(footprint) = Aabb::from_points(triangles.iter().map(|t| self.centroid(t))) else {
            return self.make_leaf(key, &triangles);
        };
        let center = footprint.center();

        let mut quadrants: [Vec<[u32; 3]>; 4] = Default::default();
        for tri in triangles {
            let c = self.centroid(&tri);
            let quadrant = usize::from(c.x >= center.x) | (usize::from(c.z >= center.z) << 1);
            quadrants[quadrant].push(tri);
        }

        if quadrants.iter().filter(|q| !q.is_empty()).count() < 2 {
            let triangles: Vec<[u32; 3]> = quadrants.into_iter().flatten().collect();
            return self.make_leaf(key, &triangles);
        }

        let children: Vec<QuadNode> = quadrants
            .into_iter()
            .filter(|q| !q.is_empty())
            .map(|q| self.build_node(q, depth + 1))
            .collect();

        let bounds = children
            .iter()
            .skip(1)
            .fold(*children[0].bounds(), |acc, c| acc.union(c.bounds()));

        QuadNode::internal(key, bounds, children)
    }

    fn make_leaf(&mut self, key: u32, triangles: &[[u32; 3]]) -> QuadNode {
        let start = self.indices.len();
        for tri in triangles {
            self.indices.extend_from_slice(tri);
        }
        let range = start..self.indices.len();

        let bounds = Aabb::from_points(
            triangles
                .iter()
                .flatten()
                .map(|&i| self.positions[i as usize]),
        )
        .unwrap_or_else(|| Aabb::new(Vec3::ZERO, Vec3::ZERO));

        log::trace!("quad-tree leaf {key}: {} triangles", triangles.len());
        self.leaves.insert(key, range.clone());
        QuadNode::leaf(key, bounds, range)
    }
}
