use std::cmp::Ordering;

use tracing::debug;

use crate::math::{cmp_points, Point3};
use crate::skeleton::{Edge, Skeleton};

use super::RemoveDisconnected;

/// Produces the canonical form of a skeleton.
///
/// Vertices with identical coordinates are merged, edges are remapped,
/// canonicalized as `(min, max)`, de-duplicated and stripped of self-loops.
/// Optionally chains into [`RemoveDisconnected`].
///
/// Vertices come out in lexicographic `(x, y, z)` order. Within a group of
/// identical coordinates the vertex with the lowest original index is the
/// representative, and its attribute rows are the ones that survive.
#[derive(Debug, Clone, Copy)]
pub struct Consolidate {
    remove_disconnected: bool,
}

impl Default for Consolidate {
    fn default() -> Self {
        Self {
            remove_disconnected: true,
        }
    }
}

impl Consolidate {
    /// Creates a new `Consolidate` operation that also drops unreferenced vertices.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether to drop vertices that no edge references.
    #[must_use]
    pub fn with_remove_disconnected(mut self, remove_disconnected: bool) -> Self {
        self.remove_disconnected = remove_disconnected;
        self
    }

    /// Executes the consolidation, returning a new skeleton.
    ///
    /// A skeleton without vertices or without edges yields an empty skeleton
    /// that keeps the id, space, transform and attribute schema.
    #[must_use]
    pub fn execute(&self, skel: &Skeleton) -> Skeleton {
        if skel.is_empty() {
            return skel.empty_like();
        }

        let (representatives, remap) = deduplicate(skel.vertices());
        let edges = canonical_edges(skel.edges().iter().map(|&[a, b]| [remap[a], remap[b]]));
        let consolidated = skel.select(&representatives, edges);

        debug!(
            vertices_in = skel.vertex_count(),
            edges_in = skel.edge_count(),
            vertices_out = consolidated.vertex_count(),
            edges_out = consolidated.edge_count(),
            "consolidated skeleton"
        );

        if self.remove_disconnected {
            RemoveDisconnected::new().execute(&consolidated)
        } else {
            consolidated
        }
    }
}

/// Groups identical coordinates.
///
/// Returns the representative original index of each group, in sorted
/// coordinate order, and the group number of every original vertex.
fn deduplicate(vertices: &[Point3]) -> (Vec<usize>, Vec<usize>) {
    let mut order: Vec<usize> = (0..vertices.len()).collect();
    order.sort_by(|&a, &b| cmp_points(&vertices[a], &vertices[b]).then(a.cmp(&b)));

    let mut representatives: Vec<usize> = Vec::new();
    let mut remap = vec![0_usize; vertices.len()];
    for &i in &order {
        let starts_group = representatives
            .last()
            .map_or(true, |&r| cmp_points(&vertices[r], &vertices[i]) != Ordering::Equal);
        if starts_group {
            representatives.push(i);
        }
        remap[i] = representatives.len() - 1;
    }
    (representatives, remap)
}

/// Orients each edge as `(min, max)`, drops self-loops, then sorts and
/// de-duplicates.
pub(crate) fn canonical_edges(edges: impl Iterator<Item = Edge>) -> Vec<Edge> {
    let mut out: Vec<Edge> = edges
        .filter(|e| e[0] != e[1])
        .map(|[a, b]| [a.min(b), a.max(b)])
        .collect();
    out.sort_unstable();
    out.dedup();
    out
}

/// Edges `(i - 1, i)` of a chain over `len` vertices.
pub(crate) fn chain_edges(len: usize) -> Vec<Edge> {
    (1..len).map(|i| [i - 1, i]).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::skeleton::AttributeData;

    fn p(x: f32, y: f32, z: f32) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn duplicate_point_collapses_and_self_loop_drops() {
        let skel = Skeleton::new(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)],
            vec![[0, 1], [1, 2], [2, 3]],
        )
        .unwrap();

        let out = Consolidate::new().execute(&skel);
        assert_eq!(
            out.vertices(),
            &[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)]
        );
        assert_eq!(out.edges(), &[[0, 1], [1, 2]]);
        assert_eq!(out.id(), skel.id());
    }

    #[test]
    fn lowest_index_representative_keeps_attributes() {
        let skel = Skeleton::new(
            vec![p(5.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(5.0, 0.0, 0.0)],
            vec![[0, 1], [1, 2]],
        )
        .unwrap()
        .with_radii(vec![10.0, 20.0, 30.0])
        .unwrap();

        let out = Consolidate::new().execute(&skel);
        assert_eq!(out.vertices(), &[p(1.0, 0.0, 0.0), p(5.0, 0.0, 0.0)]);
        assert_eq!(out.radii().unwrap(), &[20.0, 10.0]);
        assert_eq!(out.edges(), &[[0, 1]]);
    }

    #[test]
    fn signed_zeros_collapse_into_one_vertex() {
        let skel = Skeleton::new(
            vec![p(0.0, 0.0, 0.0), p(-0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)],
            vec![[0, 2], [1, 2]],
        )
        .unwrap()
        .with_radii(vec![1.0, 2.0, 3.0])
        .unwrap();

        let out = Consolidate::new().execute(&skel);
        assert_eq!(out.vertex_count(), 2);
        assert_eq!(out.edges(), &[[0, 1]]);
        assert_eq!(out.radii().unwrap(), &[1.0, 3.0]);
    }

    #[test]
    fn reversed_and_repeated_edges_collapse() {
        let skel = Skeleton::new(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)],
            vec![[1, 0], [0, 1], [1, 0]],
        )
        .unwrap();
        assert_eq!(Consolidate::new().execute(&skel).edges(), &[[0, 1]]);
    }

    #[test]
    fn disconnected_vertices_optionally_kept() {
        let skel = Skeleton::new(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(9.0, 9.0, 9.0)],
            vec![[0, 1]],
        )
        .unwrap();
        assert_eq!(Consolidate::new().execute(&skel).vertex_count(), 2);
        assert_eq!(
            Consolidate::new()
                .with_remove_disconnected(false)
                .execute(&skel)
                .vertex_count(),
            3
        );
    }

    #[test]
    fn empty_input_keeps_metadata() {
        let skel = Skeleton::new(vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)], vec![])
            .unwrap()
            .with_attribute("weight", 2, AttributeData::U16(vec![1, 2, 3, 4]))
            .unwrap();
        let out = Consolidate::new().execute(&skel);
        assert_eq!(out.vertex_count(), 0);
        assert_eq!(out.edge_count(), 0);
        assert_eq!(out.id(), skel.id());
        assert_eq!(out.attributes().schema(), skel.attributes().schema());
        assert_eq!(out.attribute("weight").unwrap().rows(), 0);
    }

    #[test]
    fn chain_edges_link_neighbours() {
        assert_eq!(chain_edges(3), vec![[0, 1], [1, 2]]);
        assert!(chain_edges(1).is_empty());
        assert!(chain_edges(0).is_empty());
    }
}
