use crate::skeleton::{Edge, Skeleton};

/// Undirected adjacency lists with duplicate edges and self-loops removed.
#[derive(Debug, Clone)]
pub(crate) struct Adjacency {
    neighbors: Vec<Vec<usize>>,
}

impl Adjacency {
    pub(crate) fn new(vertex_count: usize, edges: &[Edge]) -> Self {
        let mut neighbors = vec![Vec::new(); vertex_count];
        for &[a, b] in edges {
            if a != b {
                neighbors[a].push(b);
                neighbors[b].push(a);
            }
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }
        Self { neighbors }
    }

    pub(crate) fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// Sorted, distinct neighbors of `v`.
    pub(crate) fn neighbors(&self, v: usize) -> &[usize] {
        &self.neighbors[v]
    }

    pub(crate) fn degree(&self, v: usize) -> usize {
        self.neighbors[v].len()
    }

    pub(crate) fn has_edge(&self, a: usize, b: usize) -> bool {
        self.neighbors[a].binary_search(&b).is_ok()
    }
}

/// A connected piece of a skeleton.
#[derive(Debug, Clone)]
pub(crate) struct Part {
    /// Original vertex indices in ascending order.
    pub vertices: Vec<usize>,
    /// Edges in the part's local numbering (positions in `vertices`).
    pub edges: Vec<Edge>,
}

impl Part {
    /// Maps a local index sequence back to the original numbering.
    pub(crate) fn to_original(&self, local: &[usize]) -> Vec<usize> {
        local.iter().map(|&v| self.vertices[v]).collect()
    }
}

/// Splits the vertices referenced by at least one edge into connected parts.
///
/// Parts are ordered by their lowest vertex index. Unreferenced vertices
/// belong to no part.
pub(crate) fn connected_parts(skel: &Skeleton) -> Vec<Part> {
    const UNSEEN: usize = usize::MAX;

    let n = skel.vertex_count();
    let adjacency = Adjacency::new(n, skel.edges());
    let mut referenced = vec![false; n];
    for &[a, b] in skel.edges() {
        referenced[a] = true;
        referenced[b] = true;
    }

    let mut label = vec![UNSEEN; n];
    let mut count = 0;
    let mut stack = Vec::new();
    for start in 0..n {
        if !referenced[start] || label[start] != UNSEEN {
            continue;
        }
        stack.push(start);
        label[start] = count;
        while let Some(v) = stack.pop() {
            for &w in adjacency.neighbors(v) {
                if label[w] == UNSEEN {
                    label[w] = count;
                    stack.push(w);
                }
            }
        }
        count += 1;
    }

    let mut parts = vec![
        Part {
            vertices: Vec::new(),
            edges: Vec::new(),
        };
        count
    ];
    let mut local = vec![0_usize; n];
    for v in 0..n {
        if label[v] != UNSEEN {
            let part = &mut parts[label[v]];
            local[v] = part.vertices.len();
            part.vertices.push(v);
        }
    }
    for &[a, b] in skel.edges() {
        parts[label[a]].edges.push([local[a], local[b]]);
    }
    parts
}

/// Spanning tree grown from `root` over one connected part.
pub(crate) struct SpanningTree {
    pub parent: Vec<Option<usize>>,
    pub depth: Vec<usize>,
    /// Vertices without children, in discovery order.
    pub leaves: Vec<usize>,
}

impl SpanningTree {
    pub(crate) fn grow(adjacency: &Adjacency, root: usize) -> Self {
        let n = adjacency.len();
        let mut parent = vec![None; n];
        let mut depth = vec![0_usize; n];
        let mut visited = vec![false; n];
        let mut leaves = Vec::new();

        visited[root] = true;
        let mut stack = vec![root];
        while let Some(v) = stack.pop() {
            let mut has_child = false;
            for &w in adjacency.neighbors(v) {
                if !visited[w] {
                    visited[w] = true;
                    parent[w] = Some(v);
                    depth[w] = depth[v] + 1;
                    stack.push(w);
                    has_child = true;
                }
            }
            if !has_child {
                leaves.push(v);
            }
        }

        Self {
            parent,
            depth,
            leaves,
        }
    }

    /// The first leaf at maximum depth.
    pub(crate) fn deepest_leaf(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for &leaf in &self.leaves {
            if best.map_or(true, |b| self.depth[leaf] > self.depth[b]) {
                best = Some(leaf);
            }
        }
        best
    }

    /// Vertices from the root down to `leaf`.
    pub(crate) fn path_to(&self, leaf: usize) -> Vec<usize> {
        let mut path = vec![leaf];
        let mut current = leaf;
        while let Some(p) = self.parent[current] {
            path.push(p);
            current = p;
        }
        path.reverse();
        path
    }
}
