//! Graph isomorphism over a shared vertex count.
//!
//! Forests are compared exactly through canonical tree labels rooted at each
//! component's center. Other graphs go through color refinement followed by a
//! backtracking search that extends a partial vertex mapping in BFS order.

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::operations::decompose::Adjacency;
use crate::skeleton::Edge;

const NONE: usize = usize::MAX;
const REFINEMENT_ROUNDS: usize = 8;

struct Topology {
    adjacency: Adjacency,
    loops: Vec<bool>,
    edge_count: usize,
    components: Vec<Vec<usize>>,
}

impl Topology {
    fn new(vertex_count: usize, edges: &[Edge]) -> Self {
        let adjacency = Adjacency::new(vertex_count, edges);
        let mut loops = vec![false; vertex_count];
        for &[a, b] in edges {
            if a == b {
                loops[a] = true;
            }
        }
        let plain: usize = (0..vertex_count).map(|v| adjacency.degree(v)).sum::<usize>() / 2;
        let edge_count = plain + loops.iter().filter(|&&l| l).count();

        let mut seen = vec![false; vertex_count];
        let mut components = Vec::new();
        for start in 0..vertex_count {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut component = vec![start];
            let mut i = 0;
            while i < component.len() {
                let v = component[i];
                i += 1;
                for &w in adjacency.neighbors(v) {
                    if !seen[w] {
                        seen[w] = true;
                        component.push(w);
                    }
                }
            }
            components.push(component);
        }

        Self {
            adjacency,
            loops,
            edge_count,
            components,
        }
    }

    fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    fn is_forest(&self) -> bool {
        !self.loops.contains(&true) && self.edge_count + self.components.len() == self.vertex_count()
    }

    fn degree_sequence(&self) -> Vec<(usize, bool)> {
        let mut degrees: Vec<(usize, bool)> = (0..self.vertex_count())
            .map(|v| (self.adjacency.degree(v), self.loops[v]))
            .collect();
        degrees.sort_unstable();
        degrees
    }
}

/// Returns `true` if two graphs on `vertex_count` vertices are isomorphic.
///
/// Duplicate edges are ignored and edge orientation does not matter;
/// self-loops are significant.
pub(crate) fn isomorphic(vertex_count: usize, a: &[Edge], b: &[Edge]) -> bool {
    let a = Topology::new(vertex_count, a);
    let b = Topology::new(vertex_count, b);

    if a.edge_count != b.edge_count
        || a.components.len() != b.components.len()
        || a.degree_sequence() != b.degree_sequence()
    {
        return false;
    }

    if a.is_forest() {
        debug!(vertices = vertex_count, "comparing forests by canonical labels");
        let mut canon = TreeCanon::new(vertex_count);
        let left = canon.signature(&a);
        let right = canon.signature(&b);
        return left == right;
    }

    warn!(
        vertices = vertex_count,
        edges = a.edge_count,
        "graphs contain cycles, falling back to backtracking search"
    );
    match_general(&a, &b)
}

#[allow(clippy::cast_possible_truncation)]
fn intern(palette: &mut FxHashMap<Vec<u32>, u32>, key: Vec<u32>) -> u32 {
    let next = palette.len() as u32;
    *palette.entry(key).or_insert(next)
}

/// Canonical labelling of unrooted trees.
///
/// A rooted subtree is labelled by the sorted labels of its children; equal
/// labels mean isomorphic subtrees because the interner is shared by both
/// graphs under comparison.
struct TreeCanon {
    interner: FxHashMap<Vec<u32>, u32>,
    label: Vec<u32>,
    parent: Vec<usize>,
    degree: Vec<usize>,
}

impl TreeCanon {
    fn new(vertex_count: usize) -> Self {
        Self {
            interner: FxHashMap::default(),
            label: vec![0; vertex_count],
            parent: vec![NONE; vertex_count],
            degree: vec![0; vertex_count],
        }
    }

    /// Sorted per-component label pairs, one entry per component.
    fn signature(&mut self, topology: &Topology) -> Vec<(u32, u32)> {
        let mut signature: Vec<(u32, u32)> = topology
            .components
            .iter()
            .map(|component| {
                let centers = self.centers(&topology.adjacency, component);
                let first = self.rooted_label(&topology.adjacency, centers[0]);
                let second = centers
                    .get(1)
                    .map_or(first, |&c| self.rooted_label(&topology.adjacency, c));
                (first.min(second), first.max(second))
            })
            .collect();
        signature.sort_unstable();
        signature
    }

    /// One or two center vertices, found by repeatedly peeling leaves.
    fn centers(&mut self, adjacency: &Adjacency, component: &[usize]) -> Vec<usize> {
        if component.len() <= 2 {
            return component.to_vec();
        }
        for &v in component {
            self.degree[v] = adjacency.degree(v);
        }
        let mut layer: Vec<usize> = component
            .iter()
            .copied()
            .filter(|&v| self.degree[v] <= 1)
            .collect();
        let mut remaining = component.len();
        while remaining > 2 {
            remaining -= layer.len();
            let mut next = Vec::new();
            for &v in &layer {
                self.degree[v] = 0;
                for &w in adjacency.neighbors(v) {
                    if self.degree[w] > 0 {
                        self.degree[w] -= 1;
                        if self.degree[w] == 1 {
                            next.push(w);
                        }
                    }
                }
            }
            layer = next;
        }
        layer
    }

    fn rooted_label(&mut self, adjacency: &Adjacency, root: usize) -> u32 {
        self.parent[root] = NONE;
        let mut order = vec![root];
        let mut i = 0;
        while i < order.len() {
            let v = order[i];
            i += 1;
            for &w in adjacency.neighbors(v) {
                if w != self.parent[v] {
                    self.parent[w] = v;
                    order.push(w);
                }
            }
        }

        for &v in order.iter().rev() {
            let mut children: Vec<u32> = adjacency
                .neighbors(v)
                .iter()
                .filter(|&&w| w != self.parent[v])
                .map(|&w| self.label[w])
                .collect();
            children.sort_unstable();
            self.label[v] = intern(&mut self.interner, children);
        }
        self.label[root]
    }
}

#[allow(clippy::cast_possible_truncation)]
fn refine_colors(a: &Topology, b: &Topology) -> (Vec<u32>, Vec<u32>) {
    let mut palette = FxHashMap::default();
    let mut initial = |t: &Topology| -> Vec<u32> {
        (0..t.vertex_count())
            .map(|v| intern(&mut palette, vec![t.adjacency.degree(v) as u32, u32::from(t.loops[v])]))
            .collect()
    };
    let mut colors_a = initial(a);
    let mut colors_b = initial(b);
    let mut classes = palette.len();

    for _ in 0..REFINEMENT_ROUNDS {
        palette.clear();
        let next_a = recolor(a, &colors_a, &mut palette);
        let next_b = recolor(b, &colors_b, &mut palette);
        colors_a = next_a;
        colors_b = next_b;
        if palette.len() == classes {
            break;
        }
        classes = palette.len();
    }
    (colors_a, colors_b)
}

fn recolor(topology: &Topology, colors: &[u32], palette: &mut FxHashMap<Vec<u32>, u32>) -> Vec<u32> {
    (0..topology.vertex_count())
        .map(|v| {
            let mut key: Vec<u32> = topology
                .adjacency
                .neighbors(v)
                .iter()
                .map(|&w| colors[w])
                .collect();
            key.sort_unstable();
            key.insert(0, colors[v]);
            intern(palette, key)
        })
        .collect()
}

fn search_order(topology: &Topology) -> Vec<usize> {
    topology.components.iter().flatten().copied().collect()
}

struct Frame {
    candidates: Vec<usize>,
    cursor: usize,
}

fn match_general(a: &Topology, b: &Topology) -> bool {
    let (colors_a, colors_b) = refine_colors(a, b);
    let mut histogram_a = colors_a.clone();
    let mut histogram_b = colors_b.clone();
    histogram_a.sort_unstable();
    histogram_b.sort_unstable();
    if histogram_a != histogram_b {
        return false;
    }

    let mut by_color: FxHashMap<u32, Vec<usize>> = FxHashMap::default();
    for (v, &c) in colors_b.iter().enumerate() {
        by_color.entry(c).or_default().push(v);
    }

    let n = a.vertex_count();
    let order = search_order(a);
    let mut a_to_b = vec![NONE; n];
    let mut b_to_a = vec![NONE; n];
    let mut frames: Vec<Frame> = Vec::with_capacity(n);
    let mut depth = 0;

    let feasible = |v: usize, c: usize, a_to_b: &[usize], b_to_a: &[usize]| -> bool {
        if b_to_a[c] != NONE || colors_a[v] != colors_b[c] || a.loops[v] != b.loops[c] {
            return false;
        }
        let mut mapped = 0;
        for &w in a.adjacency.neighbors(v) {
            let image = a_to_b[w];
            if image != NONE {
                mapped += 1;
                if !b.adjacency.has_edge(c, image) {
                    return false;
                }
            }
        }
        let mapped_b = b
            .adjacency
            .neighbors(c)
            .iter()
            .filter(|&&x| b_to_a[x] != NONE)
            .count();
        mapped == mapped_b
    };

    loop {
        if depth == n {
            return true;
        }
        let v = order[depth];
        if frames.len() == depth {
            let anchor = a
                .adjacency
                .neighbors(v)
                .iter()
                .map(|&w| a_to_b[w])
                .find(|&image| image != NONE);
            let candidates = match anchor {
                Some(image) => b.adjacency.neighbors(image).to_vec(),
                None => by_color.get(&colors_a[v]).cloned().unwrap_or_default(),
            };
            frames.push(Frame {
                candidates,
                cursor: 0,
            });
        }

        if a_to_b[v] != NONE {
            b_to_a[a_to_b[v]] = NONE;
            a_to_b[v] = NONE;
        }

        let Some(frame) = frames.last_mut() else {
            return false;
        };
        let mut chosen = None;
        while frame.cursor < frame.candidates.len() {
            let c = frame.candidates[frame.cursor];
            frame.cursor += 1;
            if feasible(v, c, &a_to_b, &b_to_a) {
                chosen = Some(c);
                break;
            }
        }

        match chosen {
            Some(c) => {
                a_to_b[v] = c;
                b_to_a[c] = v;
                depth += 1;
            }
            None => {
                frames.pop();
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
        }
    }
}
