use tracing::debug;

use crate::math::Aabb;
use crate::operations::consolidate::Consolidate;
use crate::skeleton::Skeleton;

/// Keeps the part of a skeleton that lies inside an axis-aligned box.
///
/// An edge survives only if both endpoints are inside the box (bounds are
/// inclusive). Vertices left without edges are dropped and the result is
/// consolidated.
#[derive(Debug, Clone, Copy)]
pub struct Crop {
    bbox: Aabb,
}

impl Crop {
    /// Creates a new `Crop` operation.
    #[must_use]
    pub fn new(bbox: Aabb) -> Self {
        Self { bbox }
    }

    #[must_use]
    pub fn execute(&self, skel: &Skeleton) -> Skeleton {
        if skel.is_empty() {
            return skel.clone();
        }

        let inside: Vec<bool> = skel.vertices().iter().map(|p| self.bbox.contains(p)).collect();
        let kept: Vec<usize> = (0..skel.vertex_count()).filter(|&i| inside[i]).collect();
        if kept.is_empty() {
            return skel.empty_like();
        }

        let mut remap = vec![usize::MAX; skel.vertex_count()];
        for (new, &old) in kept.iter().enumerate() {
            remap[old] = new;
        }
        let edges = skel
            .edges()
            .iter()
            .filter(|&&[a, b]| inside[a] && inside[b])
            .map(|&[a, b]| [remap[a], remap[b]])
            .collect();

        let cropped = Consolidate::new().execute(&skel.select(&kept, edges));
        debug!(
            vertices_in = skel.vertex_count(),
            vertices_out = cropped.vertex_count(),
            "cropped skeleton"
        );
        cropped
    }
}
