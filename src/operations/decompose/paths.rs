use tracing::trace;

use crate::math::Point3;
use crate::skeleton::Skeleton;

use super::graph::{connected_parts, Adjacency, SpanningTree};

/// Covers each connected component with root-to-leaf paths.
///
/// The root of a component is found by growing a spanning tree from an
/// arbitrary vertex and taking its deepest leaf. A second tree is grown from
/// that root and one path is emitted per leaf, root first. Paths of a
/// component share their prefix back to the root, so together they visit
/// every vertex but are not edge-disjoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraversalPaths;

impl TraversalPaths {
    /// Creates a new `TraversalPaths` operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Paths as coordinate sequences.
    #[must_use]
    pub fn execute(&self, skel: &Skeleton) -> Vec<Vec<Point3>> {
        self.indices(skel)
            .into_iter()
            .map(|path| path.iter().map(|&i| skel.vertices()[i]).collect())
            .collect()
    }

    /// Paths as sequences of vertex indices into `skel`.
    #[must_use]
    pub fn indices(&self, skel: &Skeleton) -> Vec<Vec<usize>> {
        let mut paths = Vec::new();
        for part in connected_parts(skel) {
            let adjacency = Adjacency::new(part.vertices.len(), &part.edges);
            let first = SpanningTree::grow(&adjacency, 0);
            let root = first.deepest_leaf().unwrap_or(0);
            let tree = SpanningTree::grow(&adjacency, root);
            trace!(
                root = part.vertices[root],
                leaves = tree.leaves.len(),
                "traversing component"
            );
            paths.extend(
                tree.leaves
                    .iter()
                    .map(|&leaf| part.to_original(&tree.path_to(leaf))),
            );
        }
        paths
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32, z: f32) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn chain_yields_one_end_to_end_path() {
        let skel = Skeleton::new(
            vec![p(1.0, 0.0, 0.0), p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(3.0, 0.0, 0.0)],
            vec![[1, 0], [0, 2], [2, 3]],
        )
        .unwrap();

        let paths = TraversalPaths::new().indices(&skel);
        assert_eq!(paths.len(), 1);
        let path = &paths[0];
        assert_eq!(path.len(), 4);
        let ends = [path[0], path[3]];
        assert!(ends.contains(&1) && ends.contains(&3));
    }

    #[test]
    fn star_yields_path_per_remaining_leaf() {
        let skel = Skeleton::new(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(0.0, 0.0, 1.0)],
            vec![[0, 1], [0, 2], [0, 3]],
        )
        .unwrap();

        let paths = TraversalPaths::new().indices(&skel);
        assert_eq!(paths.len(), 2);
        let root = paths[0][0];
        assert!(paths.iter().all(|path| path[0] == root && path.len() == 3));
        assert!(paths.iter().all(|path| path[1] == 0));
    }

    #[test]
    fn components_are_traversed_separately() {
        let skel = Skeleton::new(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(5.0, 0.0, 0.0), p(6.0, 0.0, 0.0)],
            vec![[0, 1], [2, 3]],
        )
        .unwrap();

        let paths = TraversalPaths::new().execute(&skel);
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|path| path.len() == 2));
    }

    #[test]
    fn every_vertex_is_visited() {
        let skel = Skeleton::new(
            vec![
                p(0.0, 0.0, 0.0),
                p(1.0, 0.0, 0.0),
                p(2.0, 0.0, 0.0),
                p(1.0, 1.0, 0.0),
                p(1.0, 2.0, 0.0),
                p(3.0, 0.0, 0.0),
            ],
            vec![[0, 1], [1, 2], [1, 3], [3, 4], [2, 5]],
        )
        .unwrap();

        let mut seen: Vec<usize> = TraversalPaths::new()
            .indices(&skel)
            .into_iter()
            .flatten()
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    }
}
