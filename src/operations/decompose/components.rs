use tracing::{debug, warn};

use crate::skeleton::Skeleton;

use super::graph::connected_parts;

/// Splits a skeleton into its connected components.
///
/// Each component keeps the id, space, transform and attribute schema of the
/// input, with vertices in ascending original order and edges renumbered.
/// Vertices that no edge references are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct Components;

impl Components {
    /// Creates a new `Components` operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the split.
    ///
    /// A skeleton without edges is returned whole as its only component, as
    /// is a skeleton that is already a single component covering every vertex.
    #[must_use]
    pub fn execute(&self, skel: &Skeleton) -> Vec<Skeleton> {
        if skel.edge_count() == 0 {
            if skel.vertex_count() > 0 {
                warn!(
                    vertices = skel.vertex_count(),
                    "skeleton has no edges, returning it as a single component"
                );
            }
            return vec![skel.clone()];
        }

        let parts = connected_parts(skel);
        if let [part] = parts.as_slice() {
            if part.vertices.len() == skel.vertex_count() {
                return vec![skel.clone()];
            }
        }

        debug!(components = parts.len(), "split skeleton into components");
        parts
            .into_iter()
            .map(|part| skel.select(&part.vertices, part.edges))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;

    fn p(x: f32, y: f32, z: f32) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn two_chains_become_two_components() {
        let skel = Skeleton::new(
            vec![
                p(0.0, 0.0, 0.0),
                p(10.0, 0.0, 0.0),
                p(1.0, 0.0, 0.0),
                p(11.0, 0.0, 0.0),
            ],
            vec![[0, 2], [1, 3]],
        )
        .unwrap()
        .with_radii(vec![1.0, 2.0, 3.0, 4.0])
        .unwrap();

        let components = Components::new().execute(&skel);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].vertices(), &[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)]);
        assert_eq!(components[0].radii().unwrap(), &[1.0, 3.0]);
        assert_eq!(components[1].edges(), &[[0, 1]]);
        assert_eq!(components[1].radii().unwrap(), &[2.0, 4.0]);
        assert!(components.iter().all(|c| c.id() == skel.id()));
    }

    #[test]
    fn single_component_is_returned_whole() {
        let skel = Skeleton::from_path(&[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)]);
        let components = Components::new().execute(&skel);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].edges(), skel.edges());
    }

    #[test]
    fn edgeless_skeleton_is_its_own_component() {
        let skel = Skeleton::new(vec![p(0.0, 0.0, 0.0), p(5.0, 0.0, 0.0)], vec![]).unwrap();
        let components = Components::new().execute(&skel);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].vertex_count(), 2);
    }

    #[test]
    fn stray_vertex_is_not_a_component() {
        let skel = Skeleton::new(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(7.0, 7.0, 7.0)],
            vec![[0, 1]],
        )
        .unwrap();
        let components = Components::new().execute(&skel);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].vertex_count(), 2);
    }
}
