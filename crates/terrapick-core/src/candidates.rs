//! Coarse search: the two leaves whose bounds a ray reaches first.

use crate::quadtree::{NodeKind, QuadNode, QuadTree};
use crate::ray::Ray;

/// A leaf whose bounding volume the ray intersects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Key of the leaf.
    pub leaf_key: u32,
    /// Distance along the ray to the leaf's bounds (0 when the origin is inside).
    pub distance: f32,
}

/// Fixed-size accumulator keeping the two nearest candidates.
///
/// Slot 0 is always the nearer one. A later candidate only displaces an
/// earlier one when it is strictly closer, so ties keep discovery order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClosestTwo {
    slots: [Option<Candidate>; 2],
}

impl ClosestTwo {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties both slots.
    pub fn clear(&mut self) {
        self.slots = [None, None];
    }

    /// Offers a candidate, keeping it if it is among the two nearest so far.
    pub fn offer(&mut self, candidate: Candidate) {
        match self.slots {
            [None, _] => self.slots[0] = Some(candidate),
            [Some(first), _] if candidate.distance < first.distance => {
                self.slots = [Some(candidate), Some(first)];
            }
            [Some(_), None] => self.slots[1] = Some(candidate),
            [Some(_), Some(second)] if candidate.distance < second.distance => {
                self.slots[1] = Some(candidate);
            }
            _ => {}
        }
    }

    /// Returns the nearest candidate.
    #[must_use]
    pub fn primary(&self) -> Option<Candidate> {
        self.slots[0]
    }

    /// Returns the second-nearest candidate.
    #[must_use]
    pub fn secondary(&self) -> Option<Candidate> {
        self.slots[1]
    }

    /// Returns the number of filled slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Returns true when no leaf was intersected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots[0].is_none()
    }

    /// Iterates filled slots, nearest first.
    pub fn iter(&self) -> impl Iterator<Item = Candidate> + '_ {
        self.slots.iter().flatten().copied()
    }
}

/// Descends `tree` and fills `out` with the two nearest intersected leaves.
///
/// `out` is cleared first so it can be reused across frames.
pub fn select_candidates(ray: &Ray, tree: &QuadTree, out: &mut ClosestTwo) {
    out.clear();
    descend(ray, tree.root(), out);
}

/// Convenience wrapper around [`select_candidates`] with a fresh accumulator.
#[must_use]
pub fn select(ray: &Ray, tree: &QuadTree) -> ClosestTwo {
    let mut out = ClosestTwo::new();
    select_candidates(ray, tree, &mut out);
    out
}

/// Children lie inside their parent's bounds, so a node entered no nearer
/// than the current second candidate cannot improve on either slot.
fn descend(ray: &Ray, node: &QuadNode, out: &mut ClosestTwo) {
    let Some(distance) = node.bounds().ray_distance(ray) else {
        return;
    };
    if out.secondary().is_some_and(|second| second.distance <= distance) {
        log::trace!("pruned node {} at {distance}", node.key());
        return;
    }

    match node.kind() {
        NodeKind::Leaf(_) => {
            log::trace!("candidate leaf {} at {distance}", node.key());
            out.offer(Candidate {
                leaf_key: node.key(),
                distance,
            });
        }
        NodeKind::Internal(children) => {
            for child in children {
                descend(ray, child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ray::Aabb;
    use glam::Vec3;

    fn candidate(leaf_key: u32, distance: f32) -> Candidate {
        Candidate { leaf_key, distance }
    }

    /// Four leaves in a row along X, each a unit column, with increasing height.
    fn row_tree() -> QuadTree {
        let leaves = (0..4u32)
            .map(|i| {
                let x = i as f32;
                QuadNode::leaf(
                    i + 1,
                    Aabb::new(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 1.0 + x, 1.0)),
                    0..0,
                )
            })
            .collect();
        let root = QuadNode::internal(
            0,
            Aabb::new(Vec3::ZERO, Vec3::new(4.0, 4.0, 1.0)),
            leaves,
        );
        QuadTree::from_root(root, Vec::new()).unwrap()
    }

    #[test]
    fn test_offer_keeps_two_nearest_sorted() {
        let mut acc = ClosestTwo::new();
        acc.offer(candidate(1, 5.0));
        acc.offer(candidate(2, 3.0));
        acc.offer(candidate(3, 4.0));
        acc.offer(candidate(4, 9.0));
        assert_eq!(acc.len(), 2);
        assert_eq!(acc.primary(), Some(candidate(2, 3.0)));
        assert_eq!(acc.secondary(), Some(candidate(3, 4.0)));
    }

    #[test]
    fn test_offer_ties_keep_first() {
        let mut acc = ClosestTwo::new();
        acc.offer(candidate(1, 2.0));
        acc.offer(candidate(2, 2.0));
        acc.offer(candidate(3, 2.0));
        assert_eq!(acc.primary().unwrap().leaf_key, 1);
        assert_eq!(acc.secondary().unwrap().leaf_key, 2);
    }

    #[test]
    fn test_clear() {
        let mut acc = ClosestTwo::new();
        acc.offer(candidate(1, 2.0));
        acc.clear();
        assert!(acc.is_empty());
        assert_eq!(acc.iter().count(), 0);
    }

    #[test]
    fn test_select_no_candidate() {
        let tree = row_tree();
        let ray = Ray::new(Vec3::new(0.5, 10.0, 5.0), Vec3::NEG_Y).unwrap();
        assert!(select(&ray, &tree).is_empty());
    }

    #[test]
    fn test_select_single_candidate() {
        let tree = row_tree();
        let ray = Ray::new(Vec3::new(2.5, 10.0, 0.5), Vec3::NEG_Y).unwrap();
        let found = select(&ray, &tree);
        assert_eq!(found.len(), 1);
        assert_eq!(found.primary().unwrap().leaf_key, 3);
        assert!((found.primary().unwrap().distance - 7.0).abs() < 1e-5);
        assert!(found.secondary().is_none());
    }

    #[test]
    fn test_select_orders_by_distance() {
        let tree = row_tree();
        // Horizontal ray from the +X side at a height only the taller columns reach
        let ray = Ray::new(Vec3::new(10.0, 2.5, 0.5), Vec3::NEG_X).unwrap();
        let found = select(&ray, &tree);
        let keys: Vec<u32> = found.iter().map(|c| c.leaf_key).collect();
        assert_eq!(keys, vec![4, 3]);
        assert!(found.primary().unwrap().distance < found.secondary().unwrap().distance);
    }

    #[test]
    fn test_origin_inside_leaf() {
        let tree = row_tree();
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.5), Vec3::X).unwrap();
        let found = select(&ray, &tree);
        assert_eq!(found.primary(), Some(candidate(1, 0.0)));
        assert_eq!(found.secondary().unwrap().leaf_key, 2);
    }

    #[test]
    fn test_pruned_subtree_is_skipped() {
        let inner = Aabb::new(Vec3::ZERO, Vec3::ONE);
        // Child bounds outside the parent are never reached through it
        let stray = QuadNode::leaf(2, Aabb::new(Vec3::splat(5.0), Vec3::splat(6.0)), 0..0);
        let root = QuadNode::internal(0, inner, vec![QuadNode::leaf(1, inner, 0..0), stray]);
        let tree = QuadTree::from_root(root, Vec::new()).unwrap();

        let ray = Ray::new(Vec3::new(5.5, 10.0, 5.5), Vec3::NEG_Y).unwrap();
        assert!(select(&ray, &tree).is_empty());
    }

    #[test]
    fn test_subtree_beyond_second_candidate_is_pruned() {
        let near = |key, y: f32| {
            QuadNode::leaf(key, Aabb::new(Vec3::ZERO, Vec3::new(1.0, y, 1.0)), 0..0)
        };
        // The far subtree is entered at distance 9, past both near leaves. Its
        // child would be nearest of all, so finding it means no cut happened.
        let hidden = QuadNode::leaf(5, Aabb::new(Vec3::ZERO, Vec3::new(1.0, 9.5, 1.0)), 0..0);
        let far = QuadNode::internal(4, Aabb::new(Vec3::ZERO, Vec3::ONE), vec![hidden]);
        let root = QuadNode::internal(
            0,
            Aabb::new(Vec3::ZERO, Vec3::new(1.0, 10.0, 1.0)),
            vec![near(1, 8.0), near(2, 7.0), far],
        );
        let tree = QuadTree::from_root(root, Vec::new()).unwrap();

        let ray = Ray::new(Vec3::new(0.5, 10.0, 0.5), Vec3::NEG_Y).unwrap();
        let keys: Vec<u32> = select(&ray, &tree).iter().map(|c| c.leaf_key).collect();
        assert_eq!(keys, vec![1, 2]);
    }

    #[test]
    fn test_subtree_nearer_than_second_candidate_is_searched() {
        let column = |key, y: f32| {
            QuadNode::leaf(key, Aabb::new(Vec3::ZERO, Vec3::new(1.0, y, 1.0)), 0..0)
        };
        let tall = QuadNode::internal(
            4,
            Aabb::new(Vec3::ZERO, Vec3::new(1.0, 9.5, 1.0)),
            vec![column(5, 9.0)],
        );
        let root = QuadNode::internal(
            0,
            Aabb::new(Vec3::ZERO, Vec3::new(1.0, 10.0, 1.0)),
            vec![column(1, 8.0), column(2, 7.0), tall],
        );
        let tree = QuadTree::from_root(root, Vec::new()).unwrap();

        let ray = Ray::new(Vec3::new(0.5, 10.0, 0.5), Vec3::NEG_Y).unwrap();
        let found = select(&ray, &tree);
        assert_eq!(found.primary().unwrap().leaf_key, 5);
        assert_eq!(found.secondary().unwrap().leaf_key, 1);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_more_than_two_sorted(
                distances in proptest::collection::vec(0.0_f32..100.0, 0..32),
            ) {
                let mut acc = ClosestTwo::new();
                for (i, d) in distances.iter().enumerate() {
                    acc.offer(candidate(u32::try_from(i).unwrap(), *d));
                }
                prop_assert!(acc.len() <= 2);
                prop_assert_eq!(acc.len(), distances.len().min(2));

                let mut sorted = distances.clone();
                sorted.sort_by(f32::total_cmp);
                let kept: Vec<f32> = acc.iter().map(|c| c.distance).collect();
                prop_assert_eq!(kept, sorted.into_iter().take(2).collect::<Vec<_>>());
            }
        }
    }
}
