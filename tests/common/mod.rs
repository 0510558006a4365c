#![allow(dead_code, clippy::unwrap_used, clippy::cast_precision_loss)]

use skeletal::math::Point3;
use skeletal::Skeleton;
use tracing_subscriber::EnvFilter;

/// Routes library events to the test harness, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Deterministic branching tree with distinct coordinates and radii.
///
/// Vertices are laid down in runs of 3 to 8; each run grafts onto an earlier
/// vertex, so the tree mixes long unbranched chains with nested branch points.
/// Coordinates are multiples of 1/64 and survive six-decimal text exactly.
pub fn tree(n: usize) -> Skeleton {
    let vertices = (0..n)
        .map(|i| {
            Point3::new(
                i as f32,
                ((i * 7919) % 4099) as f32 / 64.0,
                ((i * 104_729) % 4111) as f32 / 64.0,
            )
        })
        .collect();

    let mut edges = Vec::with_capacity(n.saturating_sub(1));
    let mut run = 0;
    let mut left = 0;
    for i in 1..n {
        if left == 0 {
            run += 1;
            left = 3 + run % 6;
            edges.push([(run * 37) % i, i]);
        } else {
            edges.push([i - 1, i]);
        }
        left -= 1;
    }

    let radii = (0..n).map(|i| 1.0 + (i % 3) as f32).collect();
    Skeleton::new(vertices, edges).unwrap().with_radii(radii).unwrap()
}

/// A tree polluted with duplicated vertices, reversed and repeated edges,
/// a self-loop and an isolated vertex.
pub fn messy(n: usize) -> Skeleton {
    let clean = tree(n);
    let mut vertices = clean.vertices().to_vec();
    let mut edges = clean.edges().to_vec();
    let mut radii = clean.radii().unwrap().to_vec();

    for original in [3, 10] {
        vertices.push(vertices[original]);
        radii.push(radii[original] + 10.0);
    }
    edges.push([n, 4]);
    edges.push([n + 1, 10]);
    edges.push([5, 5]);
    edges.push([edges[0][1], edges[0][0]]);
    edges.push(edges[1]);

    vertices.push(Point3::new(1000.0, 0.0, 0.0));
    radii.push(1.0);

    Skeleton::new(vertices, edges).unwrap().with_radii(radii).unwrap()
}

/// Reverses vertex order, carrying edges and radii along.
pub fn reversed(skel: &Skeleton) -> Skeleton {
    let n = skel.vertex_count();
    let vertices = skel.vertices().iter().rev().copied().collect();
    let edges = skel
        .edges()
        .iter()
        .map(|&[a, b]| [n - 1 - b, n - 1 - a])
        .collect();
    let mut out = Skeleton::new(vertices, edges).unwrap();
    if let Some(radii) = skel.radii() {
        out = out.with_radii(radii.iter().rev().copied().collect()).unwrap();
    }
    out
}
