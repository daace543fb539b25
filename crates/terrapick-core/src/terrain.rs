//! Terrain geometry as seen by picking.
//!
//! The vertex array and the quad-tree are built on terrain load and are
//! read-only from here on. Picking never mutates them.

use glam::{Mat4, Vec3, Vec4};

use crate::error::{PickError, Result};
use crate::quadtree::QuadTree;

/// A terrain vertex. Only the position matters for picking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainVertex {
    /// Position in terrain-local space.
    pub position: Vec3,
    /// Surface normal.
    pub normal: Vec3,
    /// Blend weights of up to four terrain textures.
    pub texture_weights: Vec4,
}

impl TerrainVertex {
    /// Creates an up-facing vertex fully weighted to the first texture.
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            normal: Vec3::Y,
            texture_weights: Vec4::X,
        }
    }
}

impl From<Vec3> for TerrainVertex {
    fn from(position: Vec3) -> Self {
        Self::new(position)
    }
}

/// Immutable terrain vertex array, spatial index and world transform.
#[derive(Debug, Clone)]
pub struct TerrainGeometry {
    vertices: Vec<TerrainVertex>,
    positions: Vec<Vec3>,
    tree: QuadTree,
    transform: Mat4,
    inverse_transform: Mat4,
}

impl TerrainGeometry {
    /// Wraps an existing vertex array and index with an identity transform.
    #[must_use]
    pub fn new(vertices: Vec<TerrainVertex>, tree: QuadTree) -> Self {
        let positions = vertices.iter().map(|v| v.position).collect();
        Self {
            vertices,
            positions,
            tree,
            transform: Mat4::IDENTITY,
            inverse_transform: Mat4::IDENTITY,
        }
    }

    /// Builds the quad-tree from a triangle list and wraps the result.
    pub fn build(
        vertices: Vec<TerrainVertex>,
        indices: &[u32],
        leaf_triangle_budget: usize,
    ) -> Result<Self> {
        let positions: Vec<Vec3> = vertices.iter().map(|v| v.position).collect();
        let tree = QuadTree::build(&positions, indices, leaf_triangle_budget)?;
        Ok(Self {
            vertices,
            positions,
            tree,
            transform: Mat4::IDENTITY,
            inverse_transform: Mat4::IDENTITY,
        })
    }

    /// Sets the terrain world transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self.inverse_transform = transform.inverse();
        self
    }

    /// Returns the vertex array.
    #[must_use]
    pub fn vertices(&self) -> &[TerrainVertex] {
        &self.vertices
    }

    /// Returns vertex positions, parallel to [`Self::vertices`].
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Returns the spatial index.
    #[must_use]
    pub fn tree(&self) -> &QuadTree {
        &self.tree
    }

    /// Returns the terrain-local to world transform.
    #[must_use]
    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    /// Returns the world to terrain-local transform.
    #[must_use]
    pub fn inverse_transform(&self) -> &Mat4 {
        &self.inverse_transform
    }

    /// Checks every leaf index against the vertex array.
    ///
    /// Picking performs the same check lazily on the leaves it visits; this
    /// is for loaders that want to reject a corrupt terrain up front.
    pub fn validate(&self) -> Result<()> {
        for key in self.tree.leaf_keys() {
            let run = self.tree.leaf_indices(key)?;
            if let Some(&index) = run.iter().find(|&&i| i as usize >= self.positions.len()) {
                return Err(PickError::InvalidIndex {
                    index,
                    vertex_count: self.positions.len(),
                    leaf_key: Some(key),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quadtree::QuadNode;
    use crate::ray::Aabb;

    fn triangle() -> Vec<TerrainVertex> {
        vec![
            Vec3::new(0.0, 0.0, 0.0).into(),
            Vec3::new(1.0, 0.0, 0.0).into(),
            Vec3::new(0.0, 0.0, 1.0).into(),
        ]
    }

    #[test]
    fn test_build_terrain() {
        let terrain = TerrainGeometry::build(triangle(), &[0, 1, 2], 16).unwrap();
        assert_eq!(terrain.positions().len(), 3);
        assert_eq!(terrain.tree().leaf_count(), 1);
        assert_eq!(*terrain.transform(), Mat4::IDENTITY);
        assert!(terrain.validate().is_ok());
    }

    #[test]
    fn test_transform_inverse() {
        let transform = Mat4::from_scale(Vec3::splat(10.0));
        let terrain = TerrainGeometry::build(triangle(), &[0, 1, 2], 16)
            .unwrap()
            .with_transform(transform);
        let roundtrip = *terrain.transform() * *terrain.inverse_transform();
        assert!(roundtrip.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn test_validate_detects_bad_index() {
        let bounds = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let tree = QuadTree::from_root(QuadNode::leaf(5, bounds, 0..3), vec![0, 1, 7]).unwrap();
        let terrain = TerrainGeometry::new(triangle(), tree);
        let err = terrain.validate().unwrap_err();
        assert!(matches!(
            err,
            PickError::InvalidIndex {
                index: 7,
                vertex_count: 3,
                leaf_key: Some(5)
            }
        ));
    }

    #[test]
    fn test_default_vertex_attributes() {
        let v = TerrainVertex::new(Vec3::ONE);
        assert_eq!(v.normal, Vec3::Y);
        assert_eq!(v.texture_weights, Vec4::X);
    }
}
