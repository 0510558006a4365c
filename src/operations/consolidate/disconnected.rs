use tracing::debug;

use crate::skeleton::Skeleton;

/// Drops vertices that no edge references.
///
/// Retained vertices keep their relative order; edges and every attribute
/// array are remapped to the new numbering.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveDisconnected;

impl RemoveDisconnected {
    /// Creates a new `RemoveDisconnected` operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the operation, returning a new skeleton.
    #[must_use]
    pub fn execute(&self, skel: &Skeleton) -> Skeleton {
        if skel.is_empty() {
            return skel.empty_like();
        }

        let mut referenced = vec![false; skel.vertex_count()];
        for &[a, b] in skel.edges() {
            referenced[a] = true;
            referenced[b] = true;
        }
        if referenced.iter().all(|&r| r) {
            return skel.clone();
        }

        let kept: Vec<usize> = (0..skel.vertex_count()).filter(|&i| referenced[i]).collect();
        let mut remap = vec![usize::MAX; skel.vertex_count()];
        for (new, &old) in kept.iter().enumerate() {
            remap[old] = new;
        }
        let edges = skel
            .edges()
            .iter()
            .map(|&[a, b]| {
                let (a, b) = (remap[a], remap[b]);
                [a.min(b), a.max(b)]
            })
            .collect();

        debug!(
            dropped = skel.vertex_count() - kept.len(),
            "removed disconnected vertices"
        );
        skel.select(&kept, edges)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::skeleton::AttributeData;

    #[test]
    fn isolated_vertices_are_dropped_with_their_attributes() {
        let skel = Skeleton::new(
            vec![
                Point3::new(9.0, 9.0, 9.0),
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(7.0, 7.0, 7.0),
                Point3::new(1.0, 0.0, 0.0),
            ],
            vec![[3, 1]],
        )
        .unwrap()
        .with_attribute("label", 1, AttributeData::I32(vec![-1, 10, -1, 30]))
        .unwrap();

        let out = RemoveDisconnected::new().execute(&skel);
        assert_eq!(
            out.vertices(),
            &[Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)]
        );
        assert_eq!(out.edges(), &[[0, 1]]);
        assert_eq!(
            out.attribute("label").unwrap().data(),
            &AttributeData::I32(vec![10, 30])
        );
    }

    #[test]
    fn fully_connected_input_is_copied() {
        let skel = Skeleton::from_path(&[Point3::origin(), Point3::new(0.0, 1.0, 0.0)]);
        let out = RemoveDisconnected::new().execute(&skel);
        assert_eq!(out.vertices(), skel.vertices());
        assert_eq!(out.edges(), skel.edges());
    }

    #[test]
    fn edgeless_input_becomes_empty() {
        let skel = Skeleton::new(vec![Point3::origin()], vec![]).unwrap();
        assert_eq!(RemoveDisconnected::new().execute(&skel).vertex_count(), 0);
    }
}
