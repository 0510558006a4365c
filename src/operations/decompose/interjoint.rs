use rustc_hash::FxHashSet;
use tracing::trace;

use crate::math::Point3;
use crate::skeleton::{Edge, Skeleton};

use super::graph::{connected_parts, Adjacency};

/// Splits a skeleton into paths running between critical points.
///
/// Critical points are terminals (degree 1) and branch points (degree 3 or
/// more). Every edge appears in exactly one path, so the paths partition the
/// edge set. Consecutive paths meet only at critical points. A component that
/// is a pure cycle is emitted as one closed path starting and ending at its
/// lowest vertex.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterjointPaths;

impl InterjointPaths {
    /// Creates a new `InterjointPaths` operation.
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
            let local = walk_component(&adjacency);
            trace!(
                vertices = part.vertices.len(),
                paths = local.len(),
                "split component at critical points"
            );
            paths.extend(local.iter().map(|path| part.to_original(path)));
        }
        paths
    }
}

fn undirected(a: usize, b: usize) -> Edge {
    [a.min(b), a.max(b)]
}

fn walk_component(adjacency: &Adjacency) -> Vec<Vec<usize>> {
    let n = adjacency.len();
    let mut critical: Vec<bool> = (0..n)
        .map(|v| {
            let degree = adjacency.degree(v);
            degree == 1 || degree >= 3
        })
        .collect();

    let start = (0..n)
        .find(|&v| adjacency.degree(v) == 1)
        .or_else(|| (0..n).find(|&v| adjacency.degree(v) >= 3))
        .unwrap_or(0);
    if n == 0 || adjacency.degree(start) == 0 {
        return Vec::new();
    }
    critical[start] = true;

    let mut used: FxHashSet<Edge> = FxHashSet::default();
    let mut expanded = vec![false; n];
    let mut pending: Vec<(usize, usize)> = Vec::new();
    let mut paths = Vec::new();

    expanded[start] = true;
    pending.extend(adjacency.neighbors(start).iter().rev().map(|&w| (start, w)));

    while let Some((from, next)) = pending.pop() {
        if !used.insert(undirected(from, next)) {
            continue;
        }
        let mut path = vec![from, next];
        let mut current = next;
        while !critical[current] {
            let step = adjacency
                .neighbors(current)
                .iter()
                .copied()
                .find(|&w| !used.contains(&undirected(current, w)));
            let Some(w) = step else { break };
            used.insert(undirected(current, w));
            path.push(w);
            current = w;
        }
        paths.push(path);

        if critical[current] && !expanded[current] {
            expanded[current] = true;
            pending.extend(
                adjacency
                    .neighbors(current)
                    .iter()
                    .rev()
                    .filter(|&&w| !used.contains(&undirected(current, w)))
                    .map(|&w| (current, w)),
            );
        }
    }
    paths
}
